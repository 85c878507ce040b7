use super::utils::truncate;
use super::ViewModel;
use crate::app::Mode;
use crate::catalog::CatalogItem;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

/// Draw the search box; highlighted while typing
pub fn draw_search(frame: &mut Frame, area: Rect, view: &ViewModel) {
  let active = *view.mode == Mode::Search;
  let border = if active { Color::Cyan } else { Color::DarkGray };

  let content = if view.search_query.is_empty() && !active {
    Line::from(Span::styled("Search", Style::default().fg(Color::DarkGray)))
  } else {
    Line::from(view.search_query.to_string())
  };

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Draw the book list, or a loading / empty placeholder
pub fn draw_list(frame: &mut Frame, area: Rect, view: &ViewModel) {
  let title = if view.loading {
    " Books (loading...) ".to_string()
  } else if view.items.len() == view.total {
    format!(" Books ({}) ", view.total)
  } else {
    format!(" Books ({}/{}) ", view.items.len(), view.total)
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  // The indicator follows the catalog load only
  if view.loading && view.items.is_empty() {
    let paragraph = Paragraph::new("Loading...")
      .alignment(Alignment::Center)
      .block(block);
    frame.render_widget(paragraph, area);
    return;
  }

  if view.items.is_empty() {
    let content = if view.total == 0 {
      "No books available"
    } else {
      "No books match your search"
    };
    let paragraph = Paragraph::new(content)
      .style(Style::default().fg(Color::DarkGray))
      .alignment(Alignment::Center)
      .block(block);
    frame.render_widget(paragraph, area);
    return;
  }

  let name_width = (area.width as usize / 3).max(12);
  let items: Vec<ListItem> = view
    .items
    .iter()
    .map(|item| ListItem::new(list_row(item, name_width)))
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(Style::default().bg(Color::DarkGray).bold())
    .highlight_symbol("> ");

  let mut state = ListState::default().with_selected(Some(view.selected));
  frame.render_stateful_widget(list, area, &mut state);
}

fn list_row(item: &CatalogItem, name_width: usize) -> Line<'static> {
  Line::from(vec![
    Span::styled(
      format!("{:<width$}", truncate(&item.name, name_width), width = name_width),
      Style::default().fg(Color::White).bold(),
    ),
    Span::raw("  "),
    Span::styled(
      format!("{:>8}", item.price.to_string()),
      Style::default().fg(Color::Green),
    ),
    Span::raw("  "),
    Span::styled(
      truncate(&item.publisher, 20),
      Style::default().fg(Color::Yellow),
    ),
    Span::raw("  "),
    Span::styled(truncate(&item.genre, 16), Style::default().fg(Color::Cyan)),
  ])
}

/// Draw the detail view for one item
pub fn draw_detail(frame: &mut Frame, area: Rect, id: &str, item: Option<&CatalogItem>) {
  let block = Block::default()
    .title(format!(" {} ", id))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let Some(item) = item else {
    let paragraph = Paragraph::new("This book is no longer in the catalog")
      .style(Style::default().fg(Color::DarkGray))
      .alignment(Alignment::Center)
      .block(block);
    frame.render_widget(paragraph, area);
    return;
  };

  let label = Style::default().fg(Color::DarkGray);
  let missing = || "-".to_string();
  let mut lines = vec![
    Line::from(Span::styled(item.name.clone(), Style::default().bold())),
    Line::default(),
    Line::from(vec![
      Span::styled("Author:    ", label),
      Span::raw(item.author.clone().unwrap_or_else(missing)),
    ]),
    Line::from(vec![
      Span::styled("Publisher: ", label),
      Span::raw(item.publisher.clone()),
    ]),
    Line::from(vec![
      Span::styled("Genre:     ", label),
      Span::raw(item.genre.clone()),
    ]),
    Line::from(vec![
      Span::styled("Price:     ", label),
      Span::raw(item.price.to_string()),
    ]),
    Line::from(vec![
      Span::styled("Image:     ", label),
      Span::raw(item.image_url.clone().unwrap_or_else(missing)),
    ]),
  ];

  if !item.extra.is_empty() {
    lines.push(Line::default());
    for (key, value) in &item.extra {
      let value = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
      };
      lines.push(Line::from(vec![
        Span::styled(format!("{}: ", key), label),
        Span::raw(value),
      ]));
    }
  }

  let paragraph = Paragraph::new(lines)
    .block(block)
    .wrap(Wrap { trim: false });
  frame.render_widget(paragraph, area);
}
