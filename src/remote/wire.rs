//! Serde types and value codecs for the document store's REST format.
//!
//! Document fields arrive as typed values (`{"stringValue": "Dune"}`,
//! `{"integerValue": "15"}`, ...). These helpers convert between that shape and
//! plain JSON so domain types can use ordinary serde derives.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiDocument {
  /// Full resource name, ending in the document id
  pub name: String,
  #[serde(default)]
  pub fields: Map<String, Value>,
}

impl ApiDocument {
  /// Store-assigned document id: the last segment of `name`.
  pub fn id(&self) -> &str {
    self.name.rsplit('/').next().unwrap_or(&self.name)
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiListResponse {
  // Omitted entirely when the collection is empty
  #[serde(default)]
  pub documents: Vec<ApiDocument>,
  pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
  pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
  #[serde(default)]
  pub message: String,
  #[serde(default)]
  pub status: String,
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiWriteRequest {
  pub fields: Map<String, Value>,
}

// ============================================================================
// Value codecs
// ============================================================================

/// Convert a map of typed values into plain JSON.
pub fn decode_fields(fields: Map<String, Value>) -> Map<String, Value> {
  fields
    .into_iter()
    .map(|(k, v)| (k, decode_value(v)))
    .collect()
}

/// Convert one typed value into plain JSON.
///
/// Unrecognized shapes are passed through untouched.
pub fn decode_value(value: Value) -> Value {
  let Value::Object(map) = value else {
    return value;
  };
  if map.len() != 1 {
    return Value::Object(map);
  }
  let Some((kind, inner)) = map.into_iter().next() else {
    return Value::Null;
  };

  match (kind.as_str(), inner) {
    ("nullValue", _) => Value::Null,
    ("booleanValue", v @ Value::Bool(_)) => v,
    // 64-bit integers travel as strings
    ("integerValue", Value::String(s)) => s
      .parse::<i64>()
      .map(Value::from)
      .unwrap_or(Value::String(s)),
    ("integerValue", v @ Value::Number(_)) => v,
    ("doubleValue", v @ Value::Number(_)) => v,
    // "NaN" and "Infinity" have no JSON form
    ("doubleValue", Value::String(_)) => Value::Null,
    ("stringValue" | "timestampValue" | "referenceValue" | "bytesValue", v) => v,
    ("mapValue", Value::Object(mut m)) => match m.remove("fields") {
      Some(Value::Object(fields)) => Value::Object(decode_fields(fields)),
      _ => Value::Object(Map::new()),
    },
    ("arrayValue", Value::Object(mut m)) => match m.remove("values") {
      Some(Value::Array(values)) => Value::Array(values.into_iter().map(decode_value).collect()),
      _ => Value::Array(Vec::new()),
    },
    ("geoPointValue", v) => v,
    (_, v) => {
      let mut passthrough = Map::new();
      passthrough.insert(kind.clone(), v);
      Value::Object(passthrough)
    }
  }
}

/// Convert a plain JSON map into typed values.
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
  fields
    .iter()
    .map(|(k, v)| (k.clone(), encode_value(v)))
    .collect()
}

/// Convert one plain JSON value into its typed form.
pub fn encode_value(value: &Value) -> Value {
  let (kind, inner) = match value {
    Value::Null => ("nullValue", Value::Null),
    Value::Bool(b) => ("booleanValue", Value::Bool(*b)),
    Value::Number(n) => match n.as_i64() {
      Some(i) => ("integerValue", Value::String(i.to_string())),
      None => ("doubleValue", value.clone()),
    },
    Value::String(s) => ("stringValue", Value::String(s.clone())),
    Value::Array(values) => {
      let mut array = Map::new();
      array.insert(
        "values".to_string(),
        Value::Array(values.iter().map(encode_value).collect()),
      );
      ("arrayValue", Value::Object(array))
    }
    Value::Object(fields) => {
      let mut map = Map::new();
      map.insert("fields".to_string(), Value::Object(encode_fields(fields)));
      ("mapValue", Value::Object(map))
    }
  };

  let mut typed = Map::new();
  typed.insert(kind.to_string(), inner);
  Value::Object(typed)
}
