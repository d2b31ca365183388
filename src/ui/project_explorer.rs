use crate::app::{is_valid_date_prefix, App, Focus, PickerMode};
use crate::project_tree::{DownloadSelection, NodeKind, TreeItem};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub struct ProjectExplorerRenderer;

impl ProjectExplorerRenderer {
    /// Render the whole picker into `area`
    pub fn render(app: &mut App, frame: &mut Frame, area: Rect) {
        let options = app.selector().options();
        let download = matches!(app.mode(), PickerMode::Download(_));

        let mut constraints = Vec::new();
        if options.show_search {
            constraints.push(Constraint::Length(3));
        }
        if options.show_date_filter {
            constraints.push(Constraint::Length(3));
        }
        if download {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Min(3));
        constraints.push(Constraint::Length(1));

        let chunks = Layout::vertical(constraints).split(area);
        let mut next = 0;

        if options.show_search {
            let search = app.selector().search().to_string();
            let is_focused = app.focus() == Focus::Search;
            Self::render_input(frame, chunks[next], " Search ", &search, is_focused, true);
            next += 1;
        }
        if options.show_date_filter {
            let date = app.selector().filter_date().to_string();
            let valid = is_valid_date_prefix(&date);
            let is_focused = app.focus() == Focus::Date;
            let title = " Created on (YYYY-MM-DD) ";
            Self::render_input(frame, chunks[next], title, &date, is_focused, valid);
            next += 1;
        }
        if download {
            Self::render_select_all(app, frame, chunks[next]);
            next += 1;
        }

        let list_area = chunks[next];
        // Borders take two lines
        app.set_viewport_height(list_area.height.saturating_sub(2) as usize);
        Self::render_tree(app, frame, list_area);

        Self::render_help(app, frame, chunks[next + 1]);
    }

    fn render_input(
        frame: &mut Frame,
        area: Rect,
        title: &str,
        value: &str,
        is_focused: bool,
        is_valid: bool,
    ) {
        let border_style = if !is_valid {
            Style::default().fg(Color::Red)
        } else if is_focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        let mut spans = vec![Span::raw(value.to_string())];
        if is_focused {
            spans.push(Span::styled("█", Style::default().fg(Color::Gray)));
        }

        let input = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .border_style(border_style),
        );
        frame.render_widget(input, area);
    }

    fn render_select_all(app: &App, frame: &mut Frame, area: Rect) {
        let Some(state) = app.select_all_state() else {
            return;
        };
        let line = Line::from(vec![
            Span::styled(state.checkbox(), Style::default().fg(Color::Yellow)),
            Span::raw(" Select all sub-projects"),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_tree(app: &App, frame: &mut Frame, area: Rect) {
        let rows = app.selector().rows();
        let is_focused = app.focus() == Focus::Tree;
        let show_dates = app.selector().options().show_date_filter;
        let checkboxes = match app.mode() {
            PickerMode::Download(selection) => Some(selection),
            PickerMode::Single => None,
        };
        // Borders take two columns
        let inner_width = area.width.saturating_sub(2) as usize;

        let items: Vec<ListItem> = rows
            .iter()
            .map(|row| Self::render_row(row, checkboxes, show_dates, inner_width))
            .collect();

        let title = if app.in_flight() > 0 {
            " Projects ⟳ "
        } else {
            " Projects "
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(if is_focused {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    }),
            )
            .highlight_style(if is_focused {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else {
                Style::default().bg(Color::DarkGray)
            });

        let scroll_offset = app.cursor().scroll_offset();
        let mut list_state = ListState::default().with_offset(scroll_offset);
        if let Some(selected) = app.cursor().selected_index(&rows) {
            list_state.select(Some(selected));
        }

        if rows.is_empty() {
            let empty = Paragraph::new(Span::styled(
                "No projects",
                Style::default().fg(Color::DarkGray),
            ))
            .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(empty, area);
        } else {
            frame.render_stateful_widget(list, area, &mut list_state);
        }
    }

    /// Render a single project row as a ListItem
    fn render_row(
        row: &TreeItem,
        checkboxes: Option<&DownloadSelection>,
        show_dates: bool,
        width: usize,
    ) -> ListItem<'static> {
        let mut spans = Vec::new();
        let mut used = 0;

        if row.depth > 0 {
            let indent = "  ".repeat(row.depth);
            used += indent.len();
            spans.push(Span::raw(indent));
        }

        if let Some(selection) = checkboxes {
            let checkbox = if selection.is_checked(&row.id) {
                "[x] "
            } else {
                "[ ] "
            };
            let style = if selection.is_main(&row.id) {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Yellow)
            };
            used += checkbox.len();
            spans.push(Span::styled(checkbox, style));
        }

        let indicator = row.indicator();
        used += indicator.width();
        spans.push(Span::styled(indicator, Style::default().fg(Color::Yellow)));

        // Right-hand annotations are built first so the name can be truncated to fit
        let mut suffix = Vec::new();
        if show_dates {
            if let Some(created_at) = &row.created_at {
                let day: String = created_at.chars().take(10).collect();
                suffix.push(Span::styled(
                    format!(" {day}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
        match checkboxes {
            Some(selection) if selection.is_main(&row.id) => {
                suffix.push(Span::styled(
                    " (Always Included)",
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Some(_) => {}
            None => {
                let style = if row.linked {
                    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                suffix.push(Span::styled(format!(" [{}]", row.select_label()), style));
            }
        }
        let suffix_width: usize = suffix.iter().map(|s| s.content.width()).sum();

        let name_style = if row.linked {
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
        } else if row.selected {
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD)
        } else if row.kind == NodeKind::Folder {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        };
        let available = width.saturating_sub(used + suffix_width);
        spans.push(Span::styled(truncate_to_width(&row.name, available), name_style));
        spans.extend(suffix);

        ListItem::new(Line::from(spans))
    }

    fn render_help(app: &App, frame: &mut Frame, area: Rect) {
        let help = match (app.focus(), app.mode()) {
            (Focus::Search | Focus::Date, _) => "type to filter · Tab/Enter: tree · Ctrl-C: quit",
            (Focus::Tree, PickerMode::Single) => {
                "↑↓ move · →/Space expand · ← collapse · Enter select · / search · q quit"
            }
            (Focus::Tree, PickerMode::Download(_)) => {
                "↑↓ move · →← expand · Space check · a all · Enter download · q cancel"
            }
        };
        frame.render_widget(
            Paragraph::new(Span::styled(help, Style::default().fg(Color::DarkGray))),
            area,
        );
    }
}

/// Cut `text` to at most `max_width` columns, marking the cut with `…`
fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
