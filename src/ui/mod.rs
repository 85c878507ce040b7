mod catalog;
mod overlay;
mod utils;

use crate::app::{Mode, Screen};
use crate::catalog::{CatalogItem, SnapshotSource, SortKey};
use crate::commands::Command;
use crate::notify::Alert;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Snapshot of app state handed to the renderer for one frame
pub struct ViewModel<'a> {
  pub title: &'a str,
  pub screen: &'a Screen,
  /// Filtered and sorted rows
  pub items: &'a [CatalogItem],
  pub selected: usize,
  /// Item behind the detail screen, if it is still in the catalog
  pub detail: Option<&'a CatalogItem>,
  pub loading: bool,
  pub source: SnapshotSource,
  /// Size of the unfiltered snapshot
  pub total: usize,
  pub sort: SortKey,
  pub mode: &'a Mode,
  pub search_query: &'a str,
  pub command_input: &'a str,
  pub suggestions: Vec<&'static Command>,
  pub selected_suggestion: usize,
  pub alert: Option<&'a Alert>,
}

/// Main draw function
pub fn draw(frame: &mut Frame, view: &ViewModel) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Length(3), // Search box
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  draw_header(frame, chunks[0], view);
  catalog::draw_search(frame, chunks[1], view);

  match view.screen {
    Screen::List => catalog::draw_list(frame, chunks[2], view),
    Screen::Detail { id } => catalog::draw_detail(frame, chunks[2], id, view.detail),
  }

  draw_status_bar(frame, chunks[3], view);

  if *view.mode == Mode::Command {
    overlay::draw_command_overlay(
      frame,
      chunks[2],
      view.command_input,
      &view.suggestions,
      view.selected_suggestion,
    );
  }

  if let Some(alert) = view.alert {
    overlay::draw_alert(frame, frame.area(), alert);
  }
}

fn draw_header(frame: &mut Frame, area: Rect, view: &ViewModel) {
  let mut spans = vec![
    Span::styled(" bookstall ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", view.title), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" sort: {} ", view.sort.label()),
      Style::default().fg(Color::Yellow).bold(),
    ),
  ];

  if let Some(stale) = utils::source_label(&view.source) {
    spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(
      format!(" {} ", stale),
      Style::default().fg(Color::Black).bg(Color::Yellow),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, view: &ViewModel) {
  let (content, style) = match (view.mode, view.screen) {
    (Mode::Normal, Screen::List) => (
      " /search  0-4:sort  j/k:nav  Enter:details  a:add to cart  r:refresh  :command  q:quit"
        .to_string(),
      Style::default().fg(Color::DarkGray),
    ),
    (Mode::Normal, Screen::Detail { .. }) => (
      " a:add to cart  q/Esc:back".to_string(),
      Style::default().fg(Color::DarkGray),
    ),
    (Mode::Command, _) => (
      format!(":{}", view.command_input),
      Style::default().fg(Color::Yellow),
    ),
    (Mode::Search, _) => (
      format!("/{}", view.search_query),
      Style::default().fg(Color::Cyan),
    ),
  };

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}
