use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// A book in the catalog, as materialized from a store document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
  /// Store-assigned document id
  pub id: String,
  pub name: String,
  pub publisher: String,
  pub genre: String,
  pub price: Price,
  #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author: Option<String>,
  // Any other document fields, carried along so cart copies stay complete
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl CatalogItem {
  /// Build an item from a document id and its decoded fields.
  ///
  /// The id always comes from the document, never from a field of the same name.
  pub fn from_document(id: &str, mut fields: Map<String, Value>) -> serde_json::Result<Self> {
    fields.insert("id".to_string(), Value::String(id.to_string()));
    serde_json::from_value(Value::Object(fields))
  }

  /// All fields as a flat map, `id` included as a plain field.
  pub fn to_fields(&self) -> serde_json::Result<Map<String, Value>> {
    match serde_json::to_value(self)? {
      Value::Object(map) => Ok(map),
      other => Err(serde::ser::Error::custom(format!(
        "catalog item serialized to non-object {}",
        other
      ))),
    }
  }
}

/// Price as it arrived on the wire: a number, or a string holding one.
#[derive(Debug, Clone, PartialEq)]
pub enum Price {
  Number(f64),
  Text(String),
}

impl Price {
  /// Numeric value, if there is one.
  pub fn amount(&self) -> Option<f64> {
    match self {
      Price::Number(n) => Some(*n).filter(|n| n.is_finite()),
      Price::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
    }
  }
}

impl fmt::Display for Price {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Price::Number(n) => f.write_str(&number_text(*n)),
      Price::Text(s) => f.write_str(s),
    }
  }
}

/// Render a number the way JavaScript's `Number#toString` does, so the price
/// text matched by search is the same one the web storefront shows.
fn number_text(n: f64) -> String {
  if n.is_nan() {
    return "NaN".to_string();
  }
  if n.is_infinite() {
    return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
  }
  if n == 0.0 {
    return "0".to_string();
  }
  if (1e-6..1e21).contains(&n.abs()) {
    return n.to_string();
  }
  // Shortest digits in exponent form, with an explicit sign on the exponent
  let text = format!("{:e}", n);
  match text.split_once('e') {
    Some((mantissa, exponent)) if !exponent.starts_with('-') => {
      format!("{}e+{}", mantissa, exponent)
    }
    _ => text,
  }
}

impl From<f64> for Price {
  fn from(n: f64) -> Self {
    Price::Number(n)
  }
}

impl From<&str> for Price {
  fn from(s: &str) -> Self {
    Price::Text(s.to_string())
  }
}

// 2^53, the largest range where f64 holds every integer exactly
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

impl Serialize for Price {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Price::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT => {
        serializer.serialize_i64(*n as i64)
      }
      Price::Number(n) => serializer.serialize_f64(*n),
      Price::Text(s) => serializer.serialize_str(s),
    }
  }
}

impl<'de> Deserialize<'de> for Price {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
      Number(f64),
      Text(String),
    }

    Ok(match Wire::deserialize(deserializer)? {
      Wire::Number(n) => Price::Number(n),
      Wire::Text(s) => Price::Text(s),
    })
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use serde_json::json;

  pub(crate) fn book(id: &str, name: &str, publisher: &str, genre: &str, price: f64) -> CatalogItem {
    CatalogItem {
      id: id.to_string(),
      name: name.to_string(),
      publisher: publisher.to_string(),
      genre: genre.to_string(),
      price: Price::Number(price),
      image_url: None,
      author: None,
      extra: Map::new(),
    }
  }

  fn fields(value: Value) -> Map<String, Value> {
    match value {
      Value::Object(map) => map,
      _ => panic!("expected object"),
    }
  }

  #[test]
  fn test_from_document_uses_document_id() {
    let item = CatalogItem::from_document(
      "abc",
      fields(json!({
        "id": "spoofed",
        "name": "Dune",
        "publisher": "Ace",
        "genre": "SciFi",
        "price": 15,
      })),
    )
    .unwrap();

    assert_eq!(item.id, "abc");
    assert_eq!(item.price, Price::Number(15.0));
    assert_eq!(item.image_url, None);
  }

  #[test]
  fn test_price_accepts_string() {
    let item = CatalogItem::from_document(
      "1",
      fields(json!({
        "name": "Emma",
        "publisher": "Penguin",
        "genre": "Classic",
        "price": "9.99",
        "imageUrl": "https://example.com/emma.jpg",
        "author": "Jane Austen",
      })),
    )
    .unwrap();

    assert_eq!(item.price, Price::Text("9.99".to_string()));
    assert_eq!(item.price.amount(), Some(9.99));
    assert_eq!(item.author.as_deref(), Some("Jane Austen"));
    assert_eq!(
      item.image_url.as_deref(),
      Some("https://example.com/emma.jpg")
    );
  }

  #[test]
  fn test_missing_name_is_an_error() {
    let result = CatalogItem::from_document(
      "1",
      fields(json!({ "publisher": "Ace", "genre": "SciFi", "price": 1 })),
    );
    assert!(result.is_err());
  }

  #[test]
  fn test_unknown_fields_survive_to_fields() {
    let item = CatalogItem::from_document(
      "7",
      fields(json!({
        "name": "Dune",
        "publisher": "Ace",
        "genre": "SciFi",
        "price": 15,
        "isbn": "978-0441013593",
      })),
    )
    .unwrap();

    let out = item.to_fields().unwrap();
    assert_eq!(out["id"], json!("7"));
    assert_eq!(out["isbn"], json!("978-0441013593"));
    assert_eq!(out["price"], json!(15));
    assert!(!out.contains_key("imageUrl"));
  }

  #[test]
  fn test_extreme_prices_use_exponent_form() {
    assert_eq!(Price::Number(1e21).to_string(), "1e+21");
    assert_eq!(Price::Number(2.5e22).to_string(), "2.5e+22");
    assert_eq!(Price::Number(1.5e-7).to_string(), "1.5e-7");
    assert_eq!(Price::Number(0.000001).to_string(), "0.000001");
    assert_eq!(Price::Number(1e20).to_string(), "100000000000000000000");
    assert_eq!(Price::Number(-0.0).to_string(), "0");
    assert_eq!(Price::Number(f64::INFINITY).to_string(), "Infinity");
  }

  #[test]
  fn test_price_display() {
    assert_eq!(Price::Number(15.0).to_string(), "15");
    assert_eq!(Price::Number(9.5).to_string(), "9.5");
    assert_eq!(Price::Text("12.00".to_string()).to_string(), "12.00");
  }

  #[test]
  fn test_unparseable_text_price_has_no_amount() {
    assert_eq!(Price::from("free").amount(), None);
    assert_eq!(Price::from(" 4 ").amount(), Some(4.0));
  }
}
