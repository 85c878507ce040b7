//! Filtered and sorted projections of a catalog snapshot.

use feruca::Collator;
use std::cmp::Ordering;

use super::item::CatalogItem;

/// Which field the projection is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
  /// Keep filtered order
  #[default]
  None,
  Name,
  Price,
  Publisher,
  Genre,
}

impl SortKey {
  pub fn label(&self) -> &'static str {
    match self {
      SortKey::None => "unsorted",
      SortKey::Name => "name",
      SortKey::Price => "price",
      SortKey::Publisher => "publisher",
      SortKey::Genre => "genre",
    }
  }
}

/// Derive the list to display from a snapshot.
///
/// Works on a copy: the snapshot is never reordered or modified.
pub fn project(snapshot: &[CatalogItem], query: &str, sort: SortKey) -> Vec<CatalogItem> {
  let mut items: Vec<CatalogItem> = snapshot
    .iter()
    .filter(|item| matches_query(item, query))
    .cloned()
    .collect();
  sort_items(&mut items, sort);
  items
}

/// Case-insensitive match on name, publisher or genre, or a verbatim match on
/// the price text. The empty query matches everything.
pub fn matches_query(item: &CatalogItem, query: &str) -> bool {
  if query.is_empty() {
    return true;
  }
  let needle = query.to_lowercase();
  item.name.to_lowercase().contains(&needle)
    || item.publisher.to_lowercase().contains(&needle)
    || item.genre.to_lowercase().contains(&needle)
    || item.price.to_string().contains(query)
}

/// Stable ascending sort by `key`.
///
/// Items with an empty text sort field stay where they are; the rest are
/// sorted among the remaining positions.
pub fn sort_items(items: &mut [CatalogItem], key: SortKey) {
  match key {
    SortKey::None => {}
    SortKey::Price => items.sort_by(compare_price),
    SortKey::Name | SortKey::Publisher | SortKey::Genre => {
      let slots: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| !text_field(item, key).is_empty())
        .map(|(i, _)| i)
        .collect();

      let mut collator = Collator::default();
      let mut present: Vec<CatalogItem> = slots.iter().map(|&i| items[i].clone()).collect();
      present.sort_by(|a, b| locale_cmp(&mut collator, text_field(a, key), text_field(b, key)));

      for (slot, item) in slots.into_iter().zip(present) {
        items[slot] = item;
      }
    }
  }
}

fn text_field(item: &CatalogItem, key: SortKey) -> &str {
  match key {
    SortKey::Name => &item.name,
    SortKey::Publisher => &item.publisher,
    SortKey::Genre => &item.genre,
    SortKey::None | SortKey::Price => "",
  }
}

// Unreadable prices go last
fn compare_price(a: &CatalogItem, b: &CatalogItem) -> Ordering {
  match (a.price.amount(), b.price.amount()) {
    (Some(x), Some(y)) => x.total_cmp(&y),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

/// Unicode collation at the root locale, raw text as the final tiebreak.
fn locale_cmp(collator: &mut Collator, a: &str, b: &str) -> Ordering {
  collator.collate(a, b).then_with(|| a.cmp(b))
}
