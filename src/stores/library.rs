//! The reader's personal library: saved books, reviews, and ratings.

#[cfg(test)]
#[path = "library_test.rs"]
mod library_test;

use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::net::types::{BookUpdate, LibraryBook, LibraryFilters, LibraryStats};
use crate::net::{ApiError, BackendApi};
use crate::session::{SessionEvent, SessionListener, SessionStore};

pub const LOAD_FAILED_MESSAGE: &str = "Error loading library";
pub const UPDATE_FAILED_MESSAGE: &str = "Error updating book";
pub const DELETE_FAILED_MESSAGE: &str = "Error deleting book";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LibraryError {
    #[error("{0}")]
    Update(String),
    #[error("{0}")]
    Delete(String),
}

impl LibraryError {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Update(m) | Self::Delete(m) => m,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LibraryState {
    pub books: Vec<LibraryBook>,
    pub loading: bool,
    pub error: Option<String>,
    pub stats: Option<LibraryStats>,
    pub total: u64,
}

pub struct LibraryStore {
    api: Arc<dyn BackendApi>,
    session: Arc<SessionStore>,
    state: Mutex<LibraryState>,
}

impl LibraryStore {
    /// Create the store and subscribe it to `session` events.
    #[must_use]
    pub fn attach(api: Arc<dyn BackendApi>, session: Arc<SessionStore>) -> Arc<Self> {
        let store = Arc::new(Self { api, session: session.clone(), state: Mutex::new(LibraryState::default()) });
        let listener: Arc<dyn SessionListener> = store.clone();
        session.subscribe(&listener);
        store
    }

    #[must_use]
    pub fn snapshot(&self) -> LibraryState {
        self.with_state(|s| s.clone())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut LibraryState) -> R) -> R {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state)
    }

    /// Fetch the library, replacing the local copy.
    pub async fn load_library(&self, filters: &LibraryFilters) {
        self.with_state(|s| {
            s.loading = true;
            s.error = None;
        });
        let token = self.session.token();
        let generation = self.session.generation();
        let result = self.api.my_library(token.as_deref(), filters).await;

        if self.session.generation() != generation {
            tracing::debug!("session changed during library load; result discarded");
            self.with_state(|s| s.loading = false);
            return;
        }
        self.with_state(|s| {
            match result {
                Ok(resp) if resp.success => {
                    s.books = resp.books.into_iter().map(with_cover).collect();
                    s.total = resp.total;
                    s.stats = resp.stats;
                    tracing::debug!(total = s.total, "library loaded");
                }
                Ok(_) => {
                    s.error = Some(LOAD_FAILED_MESSAGE.to_owned());
                    s.books.clear();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "library load failed");
                    s.error = Some(failure_message(&e, LOAD_FAILED_MESSAGE));
                    s.books.clear();
                }
            }
            s.loading = false;
        });
    }

    /// Save a review and rating, then reload the library.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Update`] with the backend's message when the
    /// request fails. The local copy is left untouched in that case.
    pub async fn update_book(&self, book_id: &str, update: &BookUpdate) -> Result<(), LibraryError> {
        let token = self.session.token();
        if let Err(e) = self.api.update_library_book(token.as_deref(), book_id, update).await {
            tracing::warn!(%book_id, error = %e, "library update failed");
            let message = failure_message(&e, UPDATE_FAILED_MESSAGE);
            self.with_state(|s| s.error = Some(message.clone()));
            return Err(LibraryError::Update(message));
        }

        let updated_at = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        self.with_state(|s| {
            if let Some(book) = s.books.iter_mut().find(|b| b.record_id == book_id) {
                book.review.clone_from(&update.review);
                book.rating = update.rating;
                book.updated_at = updated_at;
            }
        });
        tracing::info!(%book_id, rating = update.rating, "library book updated");
        self.load_library(&LibraryFilters::default()).await;
        Ok(())
    }

    /// Remove a book, then reload the library.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Delete`] with the backend's message when the
    /// request fails.
    pub async fn delete_book(&self, book_id: &str) -> Result<(), LibraryError> {
        let token = self.session.token();
        if let Err(e) = self.api.delete_library_book(token.as_deref(), book_id).await {
            tracing::warn!(%book_id, error = %e, "library delete failed");
            let message = failure_message(&e, DELETE_FAILED_MESSAGE);
            self.with_state(|s| s.error = Some(message.clone()));
            return Err(LibraryError::Delete(message));
        }

        self.with_state(|s| {
            let before = s.books.len();
            s.books.retain(|b| b.record_id != book_id);
            if s.books.len() < before {
                s.total = s.total.saturating_sub(1);
            }
        });
        tracing::info!(%book_id, "library book deleted");
        self.load_library(&LibraryFilters::default()).await;
        Ok(())
    }

    pub fn clear_library(&self) {
        self.with_state(|s| *s = LibraryState::default());
    }
}

impl SessionListener for LibraryStore {
    fn on_session_event(&self, event: &SessionEvent) {
        if *event == SessionEvent::Ended {
            self.clear_library();
        }
    }
}

fn with_cover(mut book: LibraryBook) -> LibraryBook {
    book.cover_url = Some(book.cover_base64.clone());
    book
}

fn failure_message(err: &ApiError, fallback: &str) -> String {
    err.backend_message().unwrap_or(fallback).to_owned()
}
