use crate::catalog::SnapshotSource;
use ratatui::prelude::Rect;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Header badge for data that did not come from a live fetch
pub fn source_label(source: &SnapshotSource) -> Option<String> {
  match source {
    SnapshotSource::Offline { cached_at } => Some(format!(
      "offline, cached {}",
      cached_at.format("%Y-%m-%d %H:%M")
    )),
    SnapshotSource::Network { .. } | SnapshotSource::Empty => None,
  }
}

/// Rect of the given size centered in `area`, clamped to fit
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Les Misérables", 8), "Les M...");
    assert_eq!(truncate("Noël", 4), "Noël");
  }

  #[test]
  fn test_source_label_only_for_offline() {
    let cached_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    assert_eq!(
      source_label(&SnapshotSource::Offline { cached_at }).as_deref(),
      Some("offline, cached 2024-03-01 09:30")
    );
    assert!(source_label(&SnapshotSource::Empty).is_none());
    assert!(source_label(&SnapshotSource::Network {
      fetched_at: cached_at
    })
    .is_none());
  }

  #[test]
  fn test_centered_rect() {
    let area = Rect::new(0, 0, 100, 40);
    assert_eq!(centered_rect(50, 10, area), Rect::new(25, 15, 50, 10));
    assert_eq!(centered_rect(200, 80, area), area);
  }
}
