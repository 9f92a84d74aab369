//! Wire-protocol DTOs for the client/backend boundary.
//!
//! DESIGN
//! ======
//! The backend speaks camelCase JSON and is loose about optional fields, so
//! most response fields default when absent instead of failing the decode.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

// =============================================================================
// AUTH
// =============================================================================

/// Identity of the signed-in reader.
///
/// The backend also sends `_id`, `createdAt` and `updatedAt`; they are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub alias: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterData {
    pub email: String,
    pub password: String,
    pub alias: String,
}

/// Successful login payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Session-check payload from `GET /auth/me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<User>,
}

// =============================================================================
// SEARCH
// =============================================================================

/// A search hit from the OpenLibrary-backed search endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub publish_year: String,
    pub cover_id: i64,
    pub cover_url: String,
    pub open_library_id: String,
    pub isbn: String,
    /// Whether the book is already saved in the reader's library.
    pub in_library: bool,
    pub has_fulltext: bool,
    pub edition_count: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchResponse {
    pub success: bool,
    pub message: String,
    pub books: Vec<Book>,
    pub total: u64,
    pub query: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchHistoryItem {
    pub query: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchHistoryResponse {
    pub success: bool,
    pub searches: Vec<SearchHistoryItem>,
    pub total: u64,
    pub user: String,
}

// =============================================================================
// LIBRARY
// =============================================================================

/// A book saved in the reader's personal library.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryBook {
    /// Storage document id; the key used by update/delete endpoints.
    #[serde(rename = "_id")]
    pub record_id: String,
    pub user_id: String,
    pub title: String,
    pub author: String,
    pub publish_year: String,
    pub cover_base64: String,
    pub review: String,
    pub rating: u8,
    pub open_library_id: String,
    pub isbn: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(rename = "coverSizeKB")]
    pub cover_size_kb: f64,
    pub id: String,
    /// Display cover; filled from `cover_base64` once loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryStats {
    pub total_books: u64,
    pub books_with_review: u64,
    pub books_without_review: u64,
    pub average_rating: f64,
    pub highest_rating: f64,
    pub lowest_rating: f64,
}

/// Filters echoed back by the library endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppliedFilters {
    pub search: Option<String>,
    pub sort_by: String,
    pub exclude_no_review: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryResponse {
    pub success: bool,
    pub books: Vec<LibraryBook>,
    pub total: u64,
    pub stats: Option<LibraryStats>,
    pub filters: AppliedFilters,
    pub user: String,
}

/// Client-side library query. Unset fields are omitted from the request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LibraryFilters {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub exclude_no_review: bool,
}

impl LibraryFilters {
    /// Query-string pairs for the set fields, in a stable order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_owned()));
        }
        if let Some(sort_by) = self.sort_by.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("sortBy", sort_by.to_owned()));
        }
        if self.exclude_no_review {
            pairs.push(("excludeNoReview", "true".to_owned()));
        }
        pairs
    }
}

/// Review edit sent to `PUT /books/my-library/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub review: String,
    pub rating: u8,
}
