use serde::{Deserialize, Serialize};

use crate::api::error;

/// Standard `{data, message}` wrapper the backend puts around single
/// resources and mutation results.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_data(self) -> Result<T, error::Error> {
        self.data.ok_or_else(|| error::Error::decode("response envelope carried no data"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
}

/// Page-numbered collection response: `{data: [...], pagination}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn has_more(&self) -> bool {
        self.pagination.page < self.pagination.total_pages
    }
}
