//! Book search results and recent-search history.

#[cfg(test)]
#[path = "books_test.rs"]
mod books_test;

use std::sync::{Arc, Mutex};

use crate::net::BackendApi;
use crate::net::types::Book;
use crate::session::{SessionEvent, SessionListener, SessionStore};

pub const SEARCH_HISTORY_LIMIT: usize = 5;
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;
pub const SEARCH_FAILED_MESSAGE: &str = "Error searching books";

/// Placeholder cover shown when a book has none.
pub const DEFAULT_BOOK_COVER: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMjAwIiBoZWlnaHQ9IjI4MCIgdmlld0JveD0iMCAwIDIwMCAyODAiIGZpbGw9Im5vbmUiIHhtbG5zPSJodHRwOi8vd3d3LnczLm9yZy8yMDAwL3N2ZyI+CjxyZWN0IHdpZHRoPSIyMDAiIGhlaWdodD0iMjgwIiBmaWxsPSIjRjNGNEY2Ii8+CjxwYXRoIGQ9Ik04MCA5MEgxMjBWMTIwSDgwVjkwWiIgZmlsbD0iIzlDQTNBRiIvPgo8cGF0aCBkPSJNNzAgMTQwSDE3MFYxNTBINzBWMTQwWiIgZmlsbD0iIzlDQTNBRiIvPgo8cGF0aCBkPSJNODAgMTYwSDE0MFYxNzBIODBWMTYwWiIgZmlsbD0iIzlDQTNBRiIvPgo8L3N2Zz4K";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookSearchState {
    pub results: Vec<Book>,
    /// Most recent query first, at most [`SEARCH_HISTORY_LIMIT`] entries.
    pub history: Vec<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected: Option<Book>,
    pub total: u64,
    pub history_loaded: bool,
}

pub struct BookSearchStore {
    api: Arc<dyn BackendApi>,
    session: Arc<SessionStore>,
    state: Mutex<BookSearchState>,
}

impl BookSearchStore {
    /// Create the store and subscribe it to `session` events.
    #[must_use]
    pub fn attach(api: Arc<dyn BackendApi>, session: Arc<SessionStore>) -> Arc<Self> {
        let store = Arc::new(Self { api, session: session.clone(), state: Mutex::new(BookSearchState::default()) });
        let listener: Arc<dyn SessionListener> = store.clone();
        session.subscribe(&listener);
        store
    }

    #[must_use]
    pub fn snapshot(&self) -> BookSearchState {
        self.with_state(|s| s.clone())
    }

    #[must_use]
    pub fn default_book_cover(&self) -> &'static str {
        DEFAULT_BOOK_COVER
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut BookSearchState) -> R) -> R {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut state)
    }

    /// Fetch the server-side search history once per session.
    pub async fn load_search_history(&self) {
        if self.with_state(|s| s.history_loaded) {
            return;
        }
        let Some(token) = self.session.token() else {
            return;
        };
        let generation = self.session.generation();
        let result = self.api.last_searches(&token).await;
        if self.session.generation() != generation {
            tracing::debug!("session changed during history load; result discarded");
            return;
        }
        match result {
            Ok(resp) if resp.success => self.with_state(|s| {
                s.history = resp.searches.into_iter().map(|item| item.query).collect();
                s.history_loaded = true;
            }),
            Ok(_) => tracing::debug!("search history unavailable"),
            Err(e) => tracing::error!(error = %e, "failed to load search history"),
        }
    }

    /// Run a search and remember the query in the local history.
    pub async fn search_books(&self, query: &str, limit: u32) {
        self.with_state(|s| {
            s.loading = true;
            s.error = None;
        });
        let token = self.session.token();
        let generation = self.session.generation();
        let result = self.api.search_books(token.as_deref(), query, limit).await;

        if self.session.generation() != generation {
            tracing::debug!(%query, "session changed during search; result discarded");
            self.with_state(|s| s.loading = false);
            return;
        }
        self.with_state(|s| {
            match result {
                Ok(resp) => {
                    if resp.success {
                        s.results = resp.books;
                        s.total = resp.total;
                    } else {
                        s.results.clear();
                    }
                    s.error = None;
                    remember_query(&mut s.history, query);
                }
                Err(e) => {
                    tracing::warn!(%query, error = %e, "book search failed");
                    s.error = Some(e.backend_message().unwrap_or(SEARCH_FAILED_MESSAGE).to_owned());
                    s.results.clear();
                }
            }
            s.loading = false;
        });
    }

    pub fn select_book(&self, book: Book) {
        self.with_state(|s| s.selected = Some(book));
    }

    /// Reset results and selection, keeping history.
    pub fn clear_search(&self) {
        self.with_state(|s| {
            s.results.clear();
            s.selected = None;
            s.error = None;
            s.total = 0;
        });
    }

    /// Drop everything tied to the current user.
    pub fn clear_all_data(&self) {
        self.with_state(|s| *s = BookSearchState::default());
    }
}

impl SessionListener for BookSearchStore {
    fn on_session_event(&self, event: &SessionEvent) {
        if *event == SessionEvent::Ended {
            self.clear_all_data();
        }
    }
}

fn remember_query(history: &mut Vec<String>, query: &str) {
    if history.iter().any(|q| q == query) {
        return;
    }
    history.insert(0, query.to_owned());
    history.truncate(SEARCH_HISTORY_LIMIT);
}
