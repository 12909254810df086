//! Application context: the page index and the current selection.
//!
//! DESIGN
//! ======
//! `AppContext` is owned by the host and passed explicitly to sessions. It
//! keeps a snapshot of every page plus the key of the page being viewed.
//! Each selection change bumps a generation counter and hands out a
//! `LoadTicket`; an async load applies its result only while its ticket is
//! still current, so a slow load for a page the user already left is
//! dropped instead of overwriting the newer one.

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;

use canvas::doc::Meta;

use crate::category::Category;
use crate::page::Page;
use crate::store::PageSnapshot;

/// Identifies one selection so late async results can be discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub page_id: String,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct AppContext {
    pages: PageSnapshot,
    current: Option<String>,
    generation: u64,
}

impl AppContext {
    #[must_use]
    pub fn new(pages: PageSnapshot) -> Self {
        Self { pages, current: None, generation: 0 }
    }

    #[must_use]
    pub fn pages(&self) -> &PageSnapshot {
        &self.pages
    }

    #[must_use]
    pub fn page(&self, key: &str) -> Option<&Page> {
        self.pages.get(key)
    }

    /// Insert or replace one page.
    pub fn upsert(&mut self, key: &str, page: Page) {
        self.pages.insert(key.to_string(), page);
    }

    pub fn remove(&mut self, key: &str) -> Option<Page> {
        self.pages.remove(key)
    }

    /// Replace the whole index, e.g. from a store change event.
    pub fn replace_all(&mut self, pages: PageSnapshot) {
        self.pages = pages;
    }

    #[must_use]
    pub fn current_page(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Make `key` the current page and issue the ticket for its load.
    pub fn select(&mut self, key: &str) -> LoadTicket {
        self.generation += 1;
        self.current = Some(key.to_string());
        LoadTicket { page_id: key.to_string(), generation: self.generation }
    }

    /// Whether a load started with `ticket` may still be applied.
    #[must_use]
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation && self.current.as_deref() == Some(ticket.page_id.as_str())
    }

    /// Keys of pages in `category`, sorted.
    #[must_use]
    pub fn pages_in(&self, category: Category) -> Vec<String> {
        self.pages.iter().filter(|(_, page)| page.category() == category).map(|(key, _)| key.clone()).collect()
    }

    /// Character pages as relationship cards: `(key, meta)` in key order.
    #[must_use]
    pub fn character_cards(&self) -> Vec<(String, Meta)> {
        self.pages
            .iter()
            .filter(|(_, page)| page.category() == Category::Characters)
            .map(|(key, page)| (key.clone(), page.meta.clone()))
            .collect()
    }
}
