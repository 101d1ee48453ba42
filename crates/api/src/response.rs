//! Shared response envelope types for API handlers.
//!
//! Single records use `{ "data": ... }`; list endpoints add a `meta` block
//! with the pagination window and total count.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Pagination metadata for list responses.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageMeta {
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
}

/// `{ "data": [...], "meta": { "limit", "offset", "total" } }`.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>, limit: i64, offset: i64, total: i64) -> Self {
        Self {
            data,
            meta: PageMeta {
                limit,
                offset,
                total,
            },
        }
    }
}
