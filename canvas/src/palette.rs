//! Marker categories for the map editor: built-in and user-defined kinds,
//! their colour and icon, and which ones are currently visible.
//!
//! Hidden categories are neither drawn nor hit-tested. Custom categories and
//! visibility are persisted by the host in the local cache; this module only
//! exposes them as serialisable values.

#[cfg(test)]
#[path = "palette_test.rs"]
mod palette_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::doc::SceneError;

/// Colour used for markers whose category is unknown.
pub const FALLBACK_COLOR: &str = "#6b7280";

/// Icon used for markers whose category is unknown.
pub const FALLBACK_ICON: &str = "•";

/// A marker category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerCategory {
    pub key: String,
    pub label: String,
    pub color: String,
    pub icon: String,
}

impl MarkerCategory {
    fn builtin(key: &str, label: &str, color: &str, icon: &str) -> Self {
        Self { key: key.into(), label: label.into(), color: color.into(), icon: icon.into() }
    }
}

/// The set of marker categories for one map editor.
#[derive(Debug, Clone)]
pub struct Palette {
    categories: Vec<MarkerCategory>,
    builtin_count: usize,
    hidden: HashSet<String>,
}

impl Default for Palette {
    fn default() -> Self {
        let categories = vec![
            MarkerCategory::builtin("location", "Location", "#3b82f6", "📍"),
            MarkerCategory::builtin("home", "Home", "#f59e0b", "🏠"),
            MarkerCategory::builtin("feature", "Feature", "#10b981", "⭐"),
            MarkerCategory::builtin("character", "Character", "#ec4899", "👤"),
        ];
        let builtin_count = categories.len();
        Self { categories, builtin_count, hidden: HashSet::new() }
    }
}

impl Palette {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn a user-entered name into a category key: lowercase, spaces to
    /// `_`, anything outside `[a-z0-9_-]` dropped.
    #[must_use]
    pub fn normalize_key(label: &str) -> String {
        label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
            .collect()
    }

    /// All categories, built-ins first.
    #[must_use]
    pub fn categories(&self) -> &[MarkerCategory] {
        &self.categories
    }

    /// User-defined categories only, for persisting.
    #[must_use]
    pub fn custom_categories(&self) -> &[MarkerCategory] {
        &self.categories[self.builtin_count..]
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MarkerCategory> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Colour and icon for a marker kind, with a neutral fallback.
    #[must_use]
    pub fn style_for(&self, key: &str) -> (&str, &str) {
        match self.get(key) {
            Some(c) => (c.color.as_str(), c.icon.as_str()),
            None => (FALLBACK_COLOR, FALLBACK_ICON),
        }
    }

    /// Display label for a kind: the category label, else the key capitalised.
    #[must_use]
    pub fn label_for(&self, key: &str) -> String {
        match self.get(key) {
            Some(c) => c.label.clone(),
            None => capitalize(key),
        }
    }

    /// Register a custom category and return its key.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::InvalidCategory` when the name normalises to an
    /// empty key, and `SceneError::DuplicateCategory` when the key exists.
    pub fn add_custom(&mut self, label: &str, color: &str, icon: &str) -> Result<String, SceneError> {
        let key = Self::normalize_key(label);
        if key.is_empty() {
            return Err(SceneError::InvalidCategory(label.to_string()));
        }
        if self.get(&key).is_some() {
            return Err(SceneError::DuplicateCategory(key));
        }
        let icon = if icon.trim().is_empty() { FALLBACK_ICON } else { icon.trim() };
        self.categories.push(MarkerCategory {
            key: key.clone(),
            label: label.trim().to_string(),
            color: color.to_string(),
            icon: icon.to_string(),
        });
        Ok(key)
    }

    /// Replace custom categories with a previously persisted list. Entries
    /// that collide with a built-in key are skipped.
    pub fn restore_custom(&mut self, custom: Vec<MarkerCategory>) {
        self.categories.truncate(self.builtin_count);
        for category in custom {
            if category.key.is_empty() || self.get(&category.key).is_some() {
                log::warn!("skipping custom marker category {:?}", category.key);
                continue;
            }
            self.categories.push(category);
        }
    }

    #[must_use]
    pub fn is_visible(&self, key: &str) -> bool {
        !self.hidden.contains(key)
    }

    pub fn set_visible(&mut self, key: &str, visible: bool) {
        if visible {
            self.hidden.remove(key);
        } else {
            self.hidden.insert(key.to_string());
        }
    }

    /// Keys of categories currently shown, for persisting.
    #[must_use]
    pub fn visible_keys(&self) -> Vec<String> {
        self.categories.iter().filter(|c| self.is_visible(&c.key)).map(|c| c.key.clone()).collect()
    }

    /// Show exactly the listed categories.
    pub fn restore_visible(&mut self, visible: &[String]) {
        self.hidden = self
            .categories
            .iter()
            .filter(|c| !visible.contains(&c.key))
            .map(|c| c.key.clone())
            .collect();
    }
}

/// Uppercase the first character.
#[must_use]
pub fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
