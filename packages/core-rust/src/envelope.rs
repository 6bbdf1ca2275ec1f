//! Wire envelopes for panel API responses.
//!
//! Every resource the panel returns is wrapped in an object envelope
//! (`{"object": "...", "attributes": {...}}`); list endpoints wrap a page of
//! envelopes together with pagination metadata. Relationship blocks embedded
//! inside attributes reuse the same two shapes, so these types are generic
//! over the attribute record.

use serde::Deserialize;

/// Single-resource envelope: `{"object": "server", "attributes": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Resource discriminator as reported by the panel (e.g. `"server"`).
    #[serde(default)]
    pub object: String,
    /// The typed attribute record.
    pub attributes: T,
}

/// List envelope: `{"object": "list", "data": [...], "meta": {...}}`.
///
/// Also used for embedded list relationships, which carry no `meta` block --
/// `meta` is optional and defaults to `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListDocument<T> {
    #[serde(default)]
    pub object: String,
    /// Page of enveloped records, in the order the panel returned them.
    pub data: Vec<Envelope<T>>,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

impl<T> ListDocument<T> {
    /// Unwraps the page into bare attribute records, preserving order.
    pub fn into_records(self) -> Vec<T> {
        self.data.into_iter().map(|e| e.attributes).collect()
    }

    /// Pagination metadata, if the response carried any.
    #[must_use]
    pub fn pagination(&self) -> Option<&Pagination> {
        self.meta.as_ref().map(|m| &m.pagination)
    }
}

/// `meta` block of a paginated list response.
#[derive(Debug, Clone, Deserialize)]
pub struct ListMeta {
    pub pagination: Pagination,
}

/// Pagination cursor reported by list endpoints.
///
/// `current_page` / `total_pages` is the only termination signal the panel
/// provides; the paginator walks pages until `current_page >= total_pages`.
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub per_page: u64,
    pub current_page: u32,
    pub total_pages: u32,
}

impl Pagination {
    /// True when this page is the last one (or the backend reports none).
    #[must_use]
    pub fn is_last_page(&self) -> bool {
        self.current_page >= self.total_pages
    }
}
