use crate::project_tree::{ProjectId, TreeItem};

/// Cursor and scroll position over the visible rows.
///
/// Rows are recomputed on every frame (filters and lazy loads change them),
/// so the cursor is remembered by project id rather than by index.
#[derive(Debug)]
pub struct TreeCursor {
    /// Row under the cursor
    current: Option<ProjectId>,
    /// Index of the first row drawn
    scroll_offset: usize,
    /// Last known viewport height (for scrolling calculations)
    pub(crate) viewport_height: usize,
}

impl Default for TreeCursor {
    fn default() -> Self {
        Self {
            current: None,
            scroll_offset: 0,
            viewport_height: 10, // Updated during rendering
        }
    }
}

impl TreeCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height;
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn current(&self) -> Option<&ProjectId> {
        self.current.as_ref()
    }

    pub fn set_current(&mut self, id: Option<ProjectId>) {
        self.current = id;
    }

    /// Index of the cursor row; a cursor on a row that is no longer visible
    /// falls back to the first row
    pub fn selected_index(&self, rows: &[TreeItem]) -> Option<usize> {
        if rows.is_empty() {
            return None;
        }
        let pos = self
            .current
            .as_ref()
            .and_then(|id| rows.iter().position(|r| &r.id == id));
        Some(pos.unwrap_or(0))
    }

    /// Project under the cursor among `rows`
    pub fn selected<'a>(&self, rows: &'a [TreeItem]) -> Option<&'a TreeItem> {
        self.selected_index(rows).map(|idx| &rows[idx])
    }

    fn move_to(&mut self, rows: &[TreeItem], pos: usize) {
        if let Some(row) = rows.get(pos) {
            self.current = Some(row.id.clone());
        }
    }

    pub fn select_next(&mut self, rows: &[TreeItem]) {
        if let Some(pos) = self.selected_index(rows) {
            self.move_to(rows, (pos + 1).min(rows.len() - 1));
        }
    }

    pub fn select_prev(&mut self, rows: &[TreeItem]) {
        if let Some(pos) = self.selected_index(rows) {
            self.move_to(rows, pos.saturating_sub(1));
        }
    }

    pub fn select_page_up(&mut self, rows: &[TreeItem]) {
        if self.viewport_height == 0 {
            return;
        }
        if let Some(pos) = self.selected_index(rows) {
            self.move_to(rows, pos.saturating_sub(self.viewport_height));
        }
    }

    pub fn select_page_down(&mut self, rows: &[TreeItem]) {
        if self.viewport_height == 0 {
            return;
        }
        if let Some(pos) = self.selected_index(rows) {
            self.move_to(rows, (pos + self.viewport_height).min(rows.len() - 1));
        }
    }

    pub fn select_first(&mut self, rows: &[TreeItem]) {
        self.move_to(rows, 0);
    }

    pub fn select_last(&mut self, rows: &[TreeItem]) {
        if !rows.is_empty() {
            self.move_to(rows, rows.len() - 1);
        }
    }

    /// Move to the closest row above with a smaller depth
    pub fn select_parent(&mut self, rows: &[TreeItem]) {
        let Some(pos) = self.selected_index(rows) else {
            return;
        };
        let depth = rows[pos].depth;
        if let Some(parent) = rows[..pos].iter().rposition(|r| r.depth < depth) {
            self.move_to(rows, parent);
        }
    }

    /// Scroll only when the cursor leaves the viewport
    pub fn update_scroll_for_selection(&mut self, rows: &[TreeItem]) {
        if self.viewport_height == 0 {
            return;
        }
        let Some(pos) = self.selected_index(rows) else {
            self.scroll_offset = 0;
            return;
        };

        if pos < self.scroll_offset {
            self.scroll_offset = pos;
        } else if pos >= self.scroll_offset + self.viewport_height {
            self.scroll_offset = pos - self.viewport_height + 1;
        }

        // Rows can shrink under the cursor (filtering, collapse)
        let max_offset = rows.len().saturating_sub(self.viewport_height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }
}
