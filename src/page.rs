//! Wiki pages as stored in the document store.
//!
//! A page is `{ meta, content }`. `meta` is an open JSON object: every
//! category keeps its form fields there, and the three canvas editors keep
//! their scene document in a single field (`map`, `graph`, `system`) as a
//! JSON string.

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;

use canvas::doc::{Meta, RELATIONSHIPS_PAGE, SceneKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::category::Category;

/// One wiki page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub content: String,
}

impl Page {
    /// Empty page of `category` titled `title`.
    #[must_use]
    pub fn new(category: Category, title: &str) -> Self {
        let mut meta = Meta::new();
        meta.insert("category".into(), Value::String(category.label().into()));
        if !title.trim().is_empty() {
            meta.insert("title".into(), Value::String(title.trim().into()));
        }
        Self { meta, content: String::new() }
    }

    /// Page that will hold a scene document of `kind` under `key`.
    #[must_use]
    pub fn for_scene(kind: SceneKind, key: &str) -> Self {
        let category = Category::for_scene(kind);
        if key == RELATIONSHIPS_PAGE {
            return Self::new(category, "");
        }
        Self::new(category, &prettify_title(key))
    }

    /// String value of a meta field, if present and a string.
    #[must_use]
    pub fn meta_str(&self, field: &str) -> Option<&str> {
        self.meta.get(field).and_then(Value::as_str)
    }

    /// Stored category, falling back to `Encyclopedia` for unknown labels.
    #[must_use]
    pub fn category(&self) -> Category {
        Category::from_stored(self.meta_str("category"))
    }

    /// Display title: the `title` field, else the prettified key.
    #[must_use]
    pub fn title(&self, key: &str) -> String {
        match self.meta_str("title").map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => prettify_title(key),
        }
    }

    /// Overlay `update` onto this page the way the store's merge write does:
    /// meta fields are replaced one by one, content is replaced.
    pub fn merge_from(&mut self, update: &Page) {
        for (key, value) in &update.meta {
            self.meta.insert(key.clone(), value.clone());
        }
        self.content.clone_from(&update.content);
    }
}

/// Canonical page key: trimmed, lower-cased, whitespace runs become `_`.
#[must_use]
pub fn normalize_page_name(raw: &str) -> String {
    raw.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("_")
}

/// Page key for a newly created page: like [`normalize_page_name`] but
/// restricted to `[a-z0-9_-]`.
#[must_use]
pub fn slugify(name: &str) -> String {
    normalize_page_name(name)
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .collect()
}

/// `ana_de-vries` → `Ana De Vries`.
#[must_use]
pub fn prettify_title(raw: &str) -> String {
    raw.replace(['_', '-'], " ")
        .split(' ')
        .map(canvas::palette::capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}
