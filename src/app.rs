use crate::cart::{CartSink, CartWriter};
use crate::catalog::{project, CatalogItem, CatalogSource, CatalogState, CatalogStore, SortKey};
use crate::cache::SnapshotCache;
use crate::commands::{self, Action, Command};
use crate::connectivity::{check_connectivity, ConnectivityProbe};
use crate::event::{Event, EventHandler};
use crate::notify::Alert;
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::collections::VecDeque;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
  Search,
}

/// Which screen is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
  List,
  /// Detail view for the item with this id
  Detail { id: String },
}

/// Main application state
pub struct App<R, S, C, P>
where
  R: CatalogSource + 'static,
  S: SnapshotCache + 'static,
  C: CartSink + 'static,
  P: ConnectivityProbe + 'static,
{
  title: String,

  store: Arc<CatalogStore<R, S>>,
  cart: Arc<CartWriter<C, mpsc::UnboundedSender<Event>>>,
  probe: Arc<P>,

  /// Subscription to catalog state, polled on tick
  catalog: watch::Receiver<CatalogState>,

  /// Last catalog state seen
  state: CatalogState,

  /// Projection of `state` currently on screen
  visible: Vec<CatalogItem>,

  screen: Screen,

  /// Current input mode
  mode: Mode,

  /// Search filter input (after pressing /)
  search_query: String,

  sort: SortKey,

  /// Selected row in `visible`
  selected: usize,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Alerts waiting to be acknowledged, oldest first
  alerts: VecDeque<Alert>,

  /// Background work bound to this screen; aborted when the app is dropped
  tasks: JoinSet<()>,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl<R, S, C, P> App<R, S, C, P>
where
  R: CatalogSource + 'static,
  S: SnapshotCache + 'static,
  C: CartSink + 'static,
  P: ConnectivityProbe + 'static,
{
  pub fn new(
    title: String,
    store: CatalogStore<R, S>,
    cart_sink: C,
    probe: P,
    request_timeout: Duration,
    event_tx: mpsc::UnboundedSender<Event>,
  ) -> Self {
    let catalog = store.subscribe();
    let state = catalog.borrow().clone();

    Self {
      title,
      store: Arc::new(store),
      cart: Arc::new(CartWriter::new(cart_sink, event_tx.clone(), request_timeout)),
      probe: Arc::new(probe),
      catalog,
      state,
      visible: Vec::new(),
      screen: Screen::List,
      mode: Mode::Normal,
      search_query: String::new(),
      sort: SortKey::None,
      selected: 0,
      command_input: String::new(),
      selected_suggestion: 0,
      alerts: VecDeque::new(),
      tasks: JoinSet::new(),
      event_tx,
      should_quit: false,
    }
  }

  /// Queue an alert raised before the screen existed.
  pub fn push_alert(&mut self, alert: Alert) {
    self.alerts.push_back(alert);
  }

  pub async fn run(mut self, mut events: EventHandler) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop(&mut events).await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self, events: &mut EventHandler) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    self.activate();

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, &self.view()))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    info!("quitting");
    Ok(())
  }

  /// Start the connectivity probe and the catalog load side by side.
  ///
  /// Neither waits on the other; the loading indicator follows the load alone.
  pub fn activate(&mut self) {
    let store = Arc::clone(&self.store);
    let probe = Arc::clone(&self.probe);
    let tx = self.event_tx.clone();

    self.tasks.spawn(async move {
      let (connected, outcome) =
        futures::future::join(check_connectivity(&*probe, &tx), store.load()).await;
      debug!(connected, ?outcome, "screen settled");
    });
  }

  fn refresh(&mut self) {
    let store = Arc::clone(&self.store);
    self.tasks.spawn(async move {
      store.load().await;
    });
  }

  fn add_to_cart(&mut self, item: CatalogItem) {
    let cart = Arc::clone(&self.cart);
    self.tasks.spawn(async move {
      // Outcome is already logged and alerted by the writer
      let _ = cart.add_to_cart(&item).await;
    });
  }

  pub fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.tick(),
      Event::Alert(alert) => self.alerts.push_back(alert),
    }
  }

  fn tick(&mut self) {
    if self.catalog.has_changed().unwrap_or(false) {
      self.state = self.catalog.borrow_and_update().clone();
      self.refresh_view();
    }

    while let Some(result) = self.tasks.try_join_next() {
      if let Err(e) = result {
        if e.is_panic() {
          error!(error = %e, "background task panicked");
        }
      }
    }
  }

  /// Recompute the visible list from the latest snapshot.
  fn refresh_view(&mut self) {
    self.visible = project(&self.state.items, &self.search_query, self.sort);
    if self.selected >= self.visible.len() {
      self.selected = self.visible.len().saturating_sub(1);
    }
  }

  fn set_sort(&mut self, sort: SortKey) {
    self.sort = sort;
    self.refresh_view();
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // An open alert swallows the key that acknowledges it
    if self.alerts.pop_front().is_some() {
      return;
    }

    match self.mode {
      Mode::Normal => match self.screen {
        Screen::List => self.handle_list_key(key),
        Screen::Detail { .. } => self.handle_detail_key(key),
      },
      Mode::Command => self.handle_command_mode_key(key),
      Mode::Search => self.handle_search_mode_key(key),
    }
  }

  fn handle_list_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
      KeyCode::Enter => {
        if let Some(item) = self.visible.get(self.selected) {
          self.screen = Screen::Detail {
            id: item.id.clone(),
          };
        }
      }
      KeyCode::Esc => {
        self.search_query.clear();
        self.refresh_view();
      }

      // Sorting
      KeyCode::Char('0') => self.set_sort(SortKey::None),
      KeyCode::Char('1') => self.set_sort(SortKey::Name),
      KeyCode::Char('2') => self.set_sort(SortKey::Price),
      KeyCode::Char('3') => self.set_sort(SortKey::Publisher),
      KeyCode::Char('4') => self.set_sort(SortKey::Genre),

      KeyCode::Char('a') => {
        if let Some(item) = self.visible.get(self.selected).cloned() {
          self.add_to_cart(item);
        }
      }
      KeyCode::Char('r') => self.refresh(),

      // Mode switches
      KeyCode::Char(':') => {
        self.mode = Mode::Command;
        self.command_input.clear();
      }
      KeyCode::Char('/') => self.mode = Mode::Search,

      _ => {}
    }
  }

  fn handle_detail_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => self.screen = Screen::List,
      KeyCode::Char('a') => {
        if let Some(item) = self.detail_item().cloned() {
          self.add_to_cart(item);
        }
      }
      _ => {}
    }
  }

  fn handle_command_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        // Navigate autocomplete suggestions
        let count = commands::get_suggestions(&self.command_input).len();
        if count > 0 {
          self.selected_suggestion = (self.selected_suggestion + 1) % count;
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let count = commands::get_suggestions(&self.command_input).len();
        if count > 0 {
          self.selected_suggestion = (self.selected_suggestion + count - 1) % count;
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0; // Reset selection on input change
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0;
      }
      _ => {}
    }
  }

  fn handle_search_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.search_query.clear();
        self.refresh_view();
      }
      KeyCode::Enter => {
        // Keep the filter and return to normal mode
        self.mode = Mode::Normal;
      }
      KeyCode::Backspace => {
        self.search_query.pop();
        self.refresh_view();
      }
      KeyCode::Char(c) => {
        self.search_query.push(c);
        self.refresh_view();
      }
      _ => {}
    }
  }

  fn execute_command(&mut self) {
    match commands::resolve(&self.command_input, self.selected_suggestion) {
      Some(cmd) => match cmd.action {
        Action::Sort(key) => self.set_sort(key),
        Action::Refresh => self.refresh(),
        Action::Quit => self.should_quit = true,
      },
      None => debug!(input = %self.command_input, "unknown command"),
    }
    self.command_input.clear();
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.visible.len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  /// Item behind the detail screen, looked up by id in the current snapshot.
  fn detail_item(&self) -> Option<&CatalogItem> {
    match &self.screen {
      Screen::Detail { id } => self.state.items.iter().find(|item| &item.id == id),
      Screen::List => None,
    }
  }

  /// Everything the renderer needs for one frame.
  pub fn view(&self) -> ui::ViewModel<'_> {
    ui::ViewModel {
      title: &self.title,
      screen: &self.screen,
      items: &self.visible,
      selected: self.selected,
      detail: self.detail_item(),
      loading: self.state.loading,
      source: self.state.source,
      total: self.state.items.len(),
      sort: self.sort,
      mode: &self.mode,
      search_query: &self.search_query,
      command_input: &self.command_input,
      suggestions: self.autocomplete_suggestions(),
      selected_suggestion: self.selected_suggestion,
      alert: self.alerts.front(),
    }
  }

  fn autocomplete_suggestions(&self) -> Vec<&'static Command> {
    if self.mode == Mode::Command {
      commands::get_suggestions(&self.command_input)
    } else {
      Vec::new()
    }
  }
}
