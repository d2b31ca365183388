//! Terminal picker state and key handling
//!
//! The app owns a [`ProjectTreeSelector`] and is its only writer. Fetches run
//! as tokio tasks and report back over an unbounded channel; the event loop
//! drains that channel before every frame.

mod navigation;

pub use navigation::TreeCursor;

use crate::project_tree::{
    DownloadSelection, FetchTicket, ProjectId, ProjectNode, ProjectTreeSelector, SelectAllState,
    SelectorMessage, TreeItem,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Which input receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Date,
    Tree,
}

/// What the picker is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerMode {
    /// Pick one project to link
    Single,
    /// Check sub-projects to export alongside a main project
    Download(DownloadSelection),
}

/// Printed on exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Outcome {
    Single { project: Option<ProjectNode> },
    Download { included_ids: Vec<ProjectId> },
}

pub struct App {
    selector: ProjectTreeSelector,
    mode: PickerMode,
    focus: Focus,
    cursor: TreeCursor,
    chosen: Option<ProjectNode>,
    confirmed: bool,
    should_quit: bool,
    in_flight: usize,
    runtime: Handle,
    sender: mpsc::UnboundedSender<SelectorMessage>,
    receiver: mpsc::UnboundedReceiver<SelectorMessage>,
}

impl App {
    pub fn new(selector: ProjectTreeSelector, mode: PickerMode, runtime: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let focus = if selector.options().show_search {
            Focus::Search
        } else {
            Focus::Tree
        };
        Self {
            selector,
            mode,
            focus,
            cursor: TreeCursor::new(),
            chosen: None,
            confirmed: false,
            should_quit: false,
            in_flight: 0,
            runtime,
            sender,
            receiver,
        }
    }

    pub fn selector(&self) -> &ProjectTreeSelector {
        &self.selector
    }

    pub fn mode(&self) -> &PickerMode {
        &self.mode
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn cursor(&self) -> &TreeCursor {
        &self.cursor
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Number of fetches whose results have not been applied yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.cursor.set_viewport_height(height);
        let rows = self.selector.rows();
        self.cursor.update_scroll_for_selection(&rows);
    }

    /// Fetch the roots (no-op for a picker seeded with its main project)
    pub fn start(&mut self) {
        if self.selector.tree().is_empty() {
            let ticket = self.selector.mount_request();
            self.dispatch(ticket);
        }
    }

    fn dispatch(&mut self, ticket: FetchTicket) {
        let manager = self.selector.manager().clone();
        let sender = self.sender.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            let message = ticket.run(&manager).await;
            if sender.send(message).is_err() {
                tracing::debug!("Picker closed, discarding fetch result");
            }
        });
    }

    /// Apply every fetch result that has arrived
    pub fn drain_messages(&mut self) {
        while let Ok(message) = self.receiver.try_recv() {
            self.apply(message);
        }
    }

    /// Wait until all dispatched fetches have been applied
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.receiver.recv().await {
                Some(message) => self.apply(message),
                None => break,
            }
        }
    }

    fn apply(&mut self, message: SelectorMessage) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if let Some(node) = self.selector.apply(message) {
            let mut selection = self.selector.selection().clone();
            selection.selected = Some(node.id.clone());
            self.selector.set_selection(selection);
            self.chosen = Some(node);
        }
        let rows = self.selector.rows();
        self.cursor.update_scroll_for_selection(&rows);
    }

    pub fn outcome(&self) -> Outcome {
        match &self.mode {
            PickerMode::Single => Outcome::Single {
                project: self.chosen.clone(),
            },
            PickerMode::Download(selection) => Outcome::Download {
                included_ids: if self.confirmed {
                    selection.included_ids()
                } else {
                    Vec::new()
                },
            },
        }
    }

    /// State of the "select all" checkbox in download mode
    pub fn select_all_state(&self) -> Option<SelectAllState> {
        match &self.mode {
            PickerMode::Download(selection) => {
                Some(selection.select_all_state(&self.selector.tree().forest()))
            }
            PickerMode::Single => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = self.next_focus();
                return;
            }
            KeyCode::BackTab => {
                self.focus = self.prev_focus();
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Search | Focus::Date => self.handle_input_key(key),
            Focus::Tree => self.handle_tree_key(key),
        }

        let rows = self.selector.rows();
        self.cursor.update_scroll_for_selection(&rows);
    }

    fn focus_order(&self) -> Vec<Focus> {
        let options = self.selector.options();
        let mut order = Vec::with_capacity(3);
        if options.show_search {
            order.push(Focus::Search);
        }
        if options.show_date_filter {
            order.push(Focus::Date);
        }
        order.push(Focus::Tree);
        order
    }

    fn next_focus(&self) -> Focus {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        order[(pos + 1) % order.len()]
    }

    fn prev_focus(&self) -> Focus {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        order[(pos + order.len() - 1) % order.len()]
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let mut value = match self.focus {
            Focus::Search => self.selector.search().to_string(),
            Focus::Date => self.selector.filter_date().to_string(),
            Focus::Tree => return,
        };

        match key.code {
            KeyCode::Char(c) if self.focus == Focus::Search => value.push(c),
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                if value.len() < DATE_INPUT_LEN {
                    value.push(c);
                }
            }
            KeyCode::Backspace => {
                value.pop();
            }
            KeyCode::Enter | KeyCode::Down | KeyCode::Esc => {
                self.focus = Focus::Tree;
                return;
            }
            _ => return,
        }

        match self.focus {
            Focus::Search => self.selector.set_search(&value),
            Focus::Date => self.selector.set_filter_date(&value),
            Focus::Tree => {}
        }
    }

    fn handle_tree_key(&mut self, key: KeyEvent) {
        let rows = self.selector.rows();
        let current = self.cursor.selected(&rows).cloned();

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('/') if self.selector.options().show_search => {
                self.focus = Focus::Search
            }
            KeyCode::Up | KeyCode::Char('k') => self.cursor.select_prev(&rows),
            KeyCode::Down | KeyCode::Char('j') => self.cursor.select_next(&rows),
            KeyCode::PageUp => self.cursor.select_page_up(&rows),
            KeyCode::PageDown => self.cursor.select_page_down(&rows),
            KeyCode::Home | KeyCode::Char('g') => self.cursor.select_first(&rows),
            KeyCode::End | KeyCode::Char('G') => self.cursor.select_last(&rows),
            KeyCode::Right | KeyCode::Char('l') => {
                if let Some(row) = current.filter(|r| !r.is_expanded()) {
                    self.toggle(&row);
                }
            }
            KeyCode::Left | KeyCode::Char('h') => match current {
                Some(row) if row.is_expanded() => self.toggle(&row),
                Some(_) => self.cursor.select_parent(&rows),
                None => {}
            },
            KeyCode::Char(' ') => {
                if let Some(row) = current {
                    if let PickerMode::Download(selection) = &mut self.mode {
                        if !selection.toggle(&row.id) {
                            tracing::debug!("Main project {} is always included", row.id);
                        }
                    } else {
                        self.toggle(&row);
                    }
                }
            }
            KeyCode::Char('a') => {
                let forest = self.selector.tree().forest();
                if let PickerMode::Download(selection) = &mut self.mode {
                    selection.toggle_all(&forest);
                }
            }
            KeyCode::Enter if self.mode == PickerMode::Single => {
                if let Some(row) = current {
                    self.select(&row);
                }
            }
            KeyCode::Enter => {
                self.confirmed = true;
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn toggle(&mut self, row: &TreeItem) {
        self.cursor.set_current(Some(row.id.clone()));
        if let Some(ticket) = self.selector.toggle_request(&row.id) {
            self.dispatch(ticket);
        }
    }

    fn select(&mut self, row: &TreeItem) {
        if !row.can_select() {
            return;
        }
        if let Some(ticket) = self.selector.select_request(&row.id) {
            self.dispatch(ticket);
        }
    }
}

/// Length of a full `YYYY-MM-DD` date
pub const DATE_INPUT_LEN: usize = 10;

/// Whether a date filter input is a usable prefix of `YYYY-MM-DD`.
///
/// Partial input is accepted while it can still become a valid date; a full
/// date must exist on the calendar.
pub fn is_valid_date_prefix(input: &str) -> bool {
    const TEMPLATE: &str = "2000-01-01";
    if input.len() > DATE_INPUT_LEN {
        return false;
    }

    let shape_ok = input.chars().zip(TEMPLATE.chars()).all(|(c, t)| {
        if t == '-' {
            c == '-'
        } else {
            c.is_ascii_digit()
        }
    });
    if !shape_ok {
        return false;
    }

    match input.len() {
        DATE_INPUT_LEN => chrono::NaiveDate::parse_from_str(input, "%Y-%m-%d").is_ok(),
        7 => chrono::NaiveDate::parse_from_str(&format!("{input}-01"), "%Y-%m-%d").is_ok(),
        _ => true,
    }
}
