use crate::record::{Record, SortDirection};

/// User-controlled search, filter and sort state for one collection.
///
/// Only the presentation layer writes it; the projection reads it. It lives
/// as long as the screen that owns it and is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria<R: Record> {
    pub search_text: String,
    pub status_filter: Option<R::Status>,
    pub preset: R::Preset,
    pub sort_field: R::SortField,
    pub sort_direction: SortDirection,
}

impl<R: Record> Default for Criteria<R> {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            status_filter: None,
            preset: R::Preset::default(),
            sort_field: R::SortField::default(),
            sort_direction: SortDirection::default(),
        }
    }
}

impl<R: Record> Criteria<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_status(mut self, status: Option<R::Status>) -> Self {
        self.status_filter = status;
        self
    }

    pub fn with_preset(mut self, preset: R::Preset) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_sort(mut self, field: R::SortField, direction: SortDirection) -> Self {
        self.sort_field = field;
        self.sort_direction = direction;
        self
    }

    /// Normalized needle for text matching; `None` when there is nothing to match.
    pub fn needle(&self) -> Option<String> {
        let trimmed = self.search_text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }

    pub fn is_filtering(&self) -> bool {
        self.needle().is_some()
            || self.status_filter.is_some()
            || self.preset != R::Preset::default()
    }
}
