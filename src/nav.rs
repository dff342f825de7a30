//! Page history for the interactive session.
//!
//! The stack owns its pages and tracks which one is shown. Exactly one entry
//! is visible at a time, and the root entry is never removed.

use tracing::debug;

/// Name of the element that should receive input focus on a page.
pub type Focus = String;

#[derive(Debug, Clone)]
struct Entry<P> {
    page: P,
    focus: Option<Focus>,
    visible: bool,
}

#[derive(Debug, Clone)]
pub struct NavigationStack<P> {
    entries: Vec<Entry<P>>,
}

impl<P> Default for NavigationStack<P> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<P> NavigationStack<P> {
    pub fn new(root: P) -> Self {
        let mut stack = Self::default();
        stack.push_page(root, None);
        stack
    }

    pub fn push_page(&mut self, page: P, focus: Option<Focus>) {
        if let Some(top) = self.entries.last_mut() {
            top.visible = false;
        }
        self.entries.push(Entry {
            page,
            focus,
            visible: true,
        });
        debug!(depth = self.entries.len(), "page pushed");
    }

    /// Returns false when only the root is left.
    pub fn pop_page(&mut self, focus: Option<Focus>) -> bool {
        if self.entries.len() <= 1 {
            return false;
        }
        self.entries.pop();
        if let Some(top) = self.entries.last_mut() {
            top.visible = true;
            if focus.is_some() {
                top.focus = focus;
            }
        }
        debug!(depth = self.entries.len(), "page popped");
        true
    }

    /// Swaps the top page for `page` without showing what lies beneath.
    pub fn replace_top(&mut self, page: P, focus: Option<Focus>) {
        if self.entries.len() > 1 {
            self.entries.pop();
        }
        self.push_page(page, focus);
    }

    pub fn current(&self) -> Option<&P> {
        self.entries.last().map(|entry| &entry.page)
    }

    pub fn current_mut(&mut self) -> Option<&mut P> {
        self.entries.last_mut().map(|entry| &mut entry.page)
    }

    pub fn focus(&self) -> Option<&str> {
        self.entries.last().and_then(|entry| entry.focus.as_deref())
    }

    pub fn set_focus(&mut self, focus: Option<Focus>) {
        if let Some(top) = self.entries.last_mut() {
            top.focus = focus;
        }
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn visible_pages(&self) -> impl Iterator<Item = &P> {
        self.entries
            .iter()
            .filter(|entry| entry.visible)
            .map(|entry| &entry.page)
    }
}
