use super::utils::centered_rect;
use crate::commands::Command;
use crate::notify::Alert;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

/// Draw the command overlay with autocomplete
pub fn draw_command_overlay(
  frame: &mut Frame,
  area: Rect,
  input: &str,
  suggestions: &[&Command],
  selected_suggestion: usize,
) {
  let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
  let suggestion_count = suggestions.len().min(8);
  let height = (3 + suggestion_count as u16).min(area.height);

  // Top-left of content area with small margin
  let overlay_area = Rect::new(area.x + 1, area.y + 1, width.saturating_sub(1), height);
  frame.render_widget(Clear, overlay_area);

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow))
    .title(" Command ");

  let inner = block.inner(overlay_area);
  frame.render_widget(block, overlay_area);

  if inner.height == 0 {
    return;
  }

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Input line
      Constraint::Min(0),    // Suggestions
    ])
    .split(inner);

  let input_line = Line::from(vec![
    Span::styled(":", Style::default().fg(Color::Yellow)),
    Span::raw(input.to_string()),
    Span::styled("_", Style::default().fg(Color::Yellow)),
  ]);
  frame.render_widget(Paragraph::new(input_line), chunks[0]);

  if suggestions.is_empty() || chunks[1].height == 0 {
    return;
  }

  let items: Vec<ListItem> = suggestions
    .iter()
    .take(suggestion_count)
    .map(|cmd| {
      ListItem::new(Line::from(vec![
        Span::styled(format!("{:<10}", cmd.name), Style::default().fg(Color::White)),
        Span::styled(cmd.description, Style::default().fg(Color::DarkGray)),
      ]))
    })
    .collect();

  let list = List::new(items).highlight_style(Style::default().bg(Color::DarkGray).bold());
  let mut state = ListState::default().with_selected(Some(selected_suggestion));
  frame.render_stateful_widget(list, chunks[1], &mut state);
}

/// Draw a modal alert with its single action
pub fn draw_alert(frame: &mut Frame, area: Rect, alert: &Alert) {
  let width = (alert.message.chars().count() as u16 + 6).clamp(30, 60);
  let modal = centered_rect(width, 7, area);
  frame.render_widget(Clear, modal);

  let block = Block::default()
    .title(format!(" {} ", alert.title))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Red));

  let lines = vec![
    Line::from(alert.message.clone()),
    Line::default(),
    Line::from(Span::styled(
      format!("[ {} ]", alert.action),
      Style::default().fg(Color::Cyan).bold(),
    )),
  ];

  let paragraph = Paragraph::new(lines)
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(block);
  frame.render_widget(paragraph, modal);
}
