//! List response envelope: `{ "data": [...], "metadata"?: {...}, "pagination"?: {...} }`.

use serde::Serialize;
use utoipa::ToSchema;

use crate::filtering::{
    PaginationResponse, SearchDirective, SearchFieldInfo, SortDirective, SortFieldInfo,
};

/// Which optional envelope sections are included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseFlags {
    pub show_metadata: bool,
    pub show_pagination: bool,
}

/// What the client may filter and sort by, and what this request applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MetadataResponse {
    pub allowed_search: Vec<SearchFieldInfo>,
    pub allowed_sort: Vec<SortFieldInfo>,
    pub applied_search: Vec<SearchDirective>,
    pub applied_sort: Vec<SortDirective>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub metadata: Option<MetadataResponse>,
    pub pagination: Option<PaginationResponse>,
}

impl<T> ListResponse<T> {
    /// Disabled sections are dropped from the output, not serialized as null.
    #[must_use]
    pub fn build(
        data: Vec<T>,
        metadata: MetadataResponse,
        pagination: PaginationResponse,
        flags: ResponseFlags,
    ) -> Self {
        Self {
            data,
            metadata: flags.show_metadata.then_some(metadata),
            pagination: flags.show_pagination.then_some(pagination),
        }
    }
}

/// Wrapper for create responses: `{ "message": ..., "data": ... }`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DataResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
