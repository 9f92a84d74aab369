//! In-memory backend and wiring helpers shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use crate::credential::{CookiePolicy, MemoryCookieJar};
use crate::net::types::{
    AuthResponse, Book, BookUpdate, LibraryBook, LibraryFilters, LibraryResponse, LibraryStats, LoginCredentials,
    MeResponse, RegisterData, SearchHistoryItem, SearchHistoryResponse, SearchResponse, User,
};
use crate::net::{ApiError, BackendApi};
use crate::routing::navigator::HistoryNavigator;
use crate::session::{SessionEvent, SessionListener, SessionSnapshot, SessionStore};

pub const ADA_EMAIL: &str = "ada@example.com";
pub const ADA_PASSWORD: &str = "analytical";
pub const ADA_TOKEN: &str = "tok-ada";

#[must_use]
pub fn ada() -> User {
    User { id: "u-ada".into(), email: ADA_EMAIL.into(), alias: "ada".into() }
}

#[must_use]
pub fn book(title: &str, author: &str) -> Book {
    Book { title: title.into(), author: author.into(), ..Book::default() }
}

#[must_use]
pub fn library_book(record_id: &str, title: &str, review: &str, rating: u8) -> LibraryBook {
    LibraryBook {
        record_id: record_id.into(),
        id: record_id.into(),
        user_id: "u-ada".into(),
        title: title.into(),
        author: "Anon".into(),
        cover_base64: format!("data:image/png;base64,{record_id}"),
        review: review.into(),
        rating,
        ..LibraryBook::default()
    }
}

fn rejected(status: u16, message: &str) -> ApiError {
    ApiError::from_status(status, json!({ "success": false, "error": message }).to_string())
}

// =============================================================================
// FAKE BACKEND
// =============================================================================

/// Behaves like the book tracker backend for one account, with switches to
/// inject failures and latency.
#[derive(Default)]
pub struct FakeBackend {
    accounts: Mutex<HashMap<String, (String, AuthResponse)>>,
    valid_tokens: Mutex<HashMap<String, User>>,
    catalog: Mutex<Vec<Book>>,
    history: Mutex<Vec<String>>,
    library: Mutex<Vec<LibraryBook>>,
    calls: Mutex<Vec<String>>,
    seen_tokens: Mutex<Vec<Option<String>>>,
    latency: Mutex<Duration>,
    pub offline: AtomicBool,
    pub soft_reject_me: AtomicBool,
    pub search_unsuccessful: AtomicBool,
    pub search_fails: AtomicBool,
    pub library_unsuccessful: AtomicBool,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Backend with Ada's account registered and `ADA_TOKEN` valid.
    #[must_use]
    pub fn with_ada() -> Arc<Self> {
        let backend = Self::new();
        backend.add_account(ADA_EMAIL, ADA_PASSWORD, ada(), ADA_TOKEN);
        backend
    }

    pub fn add_account(&self, email: &str, password: &str, user: User, token: &str) {
        let auth = AuthResponse { token: token.into(), user: user.clone() };
        lock(&self.accounts).insert(email.into(), (password.into(), auth));
        lock(&self.valid_tokens).insert(token.into(), user);
    }

    pub fn revoke(&self, token: &str) {
        lock(&self.valid_tokens).remove(token);
    }

    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    pub fn set_catalog(&self, books: Vec<Book>) {
        *lock(&self.catalog) = books;
    }

    pub fn set_history(&self, queries: &[&str]) {
        *lock(&self.history) = queries.iter().map(|q| (*q).to_owned()).collect();
    }

    pub fn set_library(&self, books: Vec<LibraryBook>) {
        *lock(&self.library) = books;
    }

    #[must_use]
    pub fn library(&self) -> Vec<LibraryBook> {
        lock(&self.library).clone()
    }

    /// Number of calls made to the named endpoint (`"login"`, `"me"`, ...).
    #[must_use]
    pub fn calls(&self, name: &str) -> usize {
        lock(&self.calls).iter().filter(|c| *c == name).count()
    }

    #[must_use]
    pub fn total_calls(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Bearer tokens presented to protected endpoints, in call order.
    #[must_use]
    pub fn seen_tokens(&self) -> Vec<Option<String>> {
        lock(&self.seen_tokens).clone()
    }

    async fn enter(&self, name: &str, token: Option<&str>) -> Result<(), ApiError> {
        lock(&self.calls).push(name.to_owned());
        if !matches!(name, "login" | "register" | "health") {
            lock(&self.seen_tokens).push(token.map(str::to_owned));
        }
        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("connection refused".into()));
        }
        Ok(())
    }

    fn authorize(&self, token: Option<&str>) -> Result<User, ApiError> {
        token
            .and_then(|t| lock(&self.valid_tokens).get(t).cloned())
            .ok_or_else(|| rejected(401, "Invalid or expired token"))
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait::async_trait]
impl BackendApi for FakeBackend {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        self.enter("login", None).await?;
        match lock(&self.accounts).get(&credentials.email) {
            Some((password, auth)) if *password == credentials.password => Ok(auth.clone()),
            _ => Err(rejected(401, "Invalid credentials")),
        }
    }

    async fn register(&self, data: &RegisterData) -> Result<serde_json::Value, ApiError> {
        self.enter("register", None).await?;
        if lock(&self.accounts).contains_key(&data.email) {
            return Err(rejected(409, "Email already registered"));
        }
        Ok(json!({ "success": true, "message": "User registered", "alias": data.alias }))
    }

    async fn current_user(&self, token: &str) -> Result<MeResponse, ApiError> {
        self.enter("me", Some(token)).await?;
        if self.soft_reject_me.load(Ordering::SeqCst) {
            return Ok(MeResponse { success: false, user: None });
        }
        let user = self.authorize(Some(token))?;
        Ok(MeResponse { success: true, user: Some(user) })
    }

    async fn search_books(&self, token: Option<&str>, query: &str, limit: u32) -> Result<SearchResponse, ApiError> {
        self.enter("search", token).await?;
        if self.search_fails.load(Ordering::SeqCst) {
            return Err(rejected(502, "OpenLibrary unavailable"));
        }
        if self.search_unsuccessful.load(Ordering::SeqCst) {
            return Ok(SearchResponse { success: false, query: query.into(), ..SearchResponse::default() });
        }
        let needle = query.to_lowercase();
        let books: Vec<Book> = lock(&self.catalog)
            .iter()
            .filter(|b| b.title.to_lowercase().contains(&needle))
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(SearchResponse {
            success: true,
            message: "ok".into(),
            total: books.len() as u64,
            books,
            query: query.into(),
            timestamp: "2024-01-01T00:00:00Z".into(),
        })
    }

    async fn last_searches(&self, token: &str) -> Result<SearchHistoryResponse, ApiError> {
        self.enter("last-search", Some(token)).await?;
        let user = self.authorize(Some(token))?;
        let searches: Vec<SearchHistoryItem> = lock(&self.history)
            .iter()
            .map(|q| SearchHistoryItem { query: q.clone(), created_at: String::new() })
            .collect();
        Ok(SearchHistoryResponse { success: true, total: searches.len() as u64, searches, user: user.id })
    }

    async fn my_library(&self, token: Option<&str>, filters: &LibraryFilters) -> Result<LibraryResponse, ApiError> {
        self.enter("my-library", token).await?;
        let user = self.authorize(token)?;
        if self.library_unsuccessful.load(Ordering::SeqCst) {
            return Ok(LibraryResponse { success: false, ..LibraryResponse::default() });
        }
        let needle = filters.search.as_deref().map(str::to_lowercase);
        let books: Vec<LibraryBook> = lock(&self.library)
            .iter()
            .filter(|b| needle.as_ref().is_none_or(|n| b.title.to_lowercase().contains(n)))
            .filter(|b| !filters.exclude_no_review || !b.review.is_empty())
            .cloned()
            .collect();
        let reviewed = books.iter().filter(|b| !b.review.is_empty()).count() as u64;
        let stats = LibraryStats {
            total_books: books.len() as u64,
            books_with_review: reviewed,
            books_without_review: books.len() as u64 - reviewed,
            ..LibraryStats::default()
        };
        Ok(LibraryResponse {
            success: true,
            total: books.len() as u64,
            books,
            stats: Some(stats),
            user: user.id,
            ..LibraryResponse::default()
        })
    }

    async fn update_library_book(
        &self,
        token: Option<&str>,
        book_id: &str,
        update: &BookUpdate,
    ) -> Result<(), ApiError> {
        self.enter("update", token).await?;
        self.authorize(token)?;
        let mut library = lock(&self.library);
        let book = library
            .iter_mut()
            .find(|b| b.record_id == book_id)
            .ok_or_else(|| rejected(404, "Book not found"))?;
        book.review.clone_from(&update.review);
        book.rating = update.rating;
        Ok(())
    }

    async fn delete_library_book(&self, token: Option<&str>, book_id: &str) -> Result<(), ApiError> {
        self.enter("delete", token).await?;
        self.authorize(token)?;
        let mut library = lock(&self.library);
        let before = library.len();
        library.retain(|b| b.record_id != book_id);
        if library.len() == before {
            return Err(rejected(404, "Book not found"));
        }
        Ok(())
    }

    async fn health(&self) -> Result<(), ApiError> {
        self.enter("health", None).await
    }
}

// =============================================================================
// WIRING
// =============================================================================

pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub jar: Arc<MemoryCookieJar>,
    pub navigator: Arc<HistoryNavigator>,
    pub session: Arc<SessionStore>,
}

/// Session wired to `backend`, an empty memory jar, and a recording navigator.
#[must_use]
pub fn harness(backend: Arc<FakeBackend>) -> Harness {
    harness_with_jar(backend, Arc::new(MemoryCookieJar::new(CookiePolicy::default())))
}

#[must_use]
pub fn harness_with_jar(backend: Arc<FakeBackend>, jar: Arc<MemoryCookieJar>) -> Harness {
    let navigator = Arc::new(HistoryNavigator::new());
    let session = Arc::new(SessionStore::new(backend.clone(), jar.clone(), navigator.clone()));
    Harness { backend, jar, navigator, session }
}

/// Harness whose jar already holds `token`, as if persisted by an earlier run.
#[must_use]
pub fn harness_with_cookie(backend: Arc<FakeBackend>, token: &str) -> Harness {
    let jar = Arc::new(MemoryCookieJar::new(CookiePolicy::default()));
    crate::credential::CredentialStore::save(jar.as_ref(), token).unwrap();
    harness_with_jar(backend, jar)
}

/// Records events and the session state visible at the moment each arrived.
pub struct RecordingListener {
    session: tokio::sync::watch::Receiver<SessionSnapshot>,
    pub seen: Mutex<Vec<(SessionEvent, SessionSnapshot)>>,
}

impl RecordingListener {
    #[must_use]
    pub fn attach(session: &SessionStore) -> Arc<Self> {
        let listener = Arc::new(Self { session: session.watch(), seen: Mutex::new(Vec::new()) });
        let as_dyn: Arc<dyn SessionListener> = listener.clone();
        session.subscribe(&as_dyn);
        listener
    }

    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        lock(&self.seen).iter().map(|(e, _)| e.clone()).collect()
    }
}

impl SessionListener for RecordingListener {
    fn on_session_event(&self, event: &SessionEvent) {
        let snapshot = self.session.borrow().clone();
        lock(&self.seen).push((event.clone(), snapshot));
    }
}
