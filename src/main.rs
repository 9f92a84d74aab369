use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use libris::bootstrap::Bootstrap;
use libris::config::{ClientConfig, ConfigError};
use libris::credential::{CookiePolicy, FileCookieJar};
use libris::keepalive::KeepAlive;
use libris::net::types::{BookUpdate, LibraryFilters, LoginCredentials, RegisterData};
use libris::net::{ApiError, BackendApi, HttpApi};
use libris::routing::{GuestRoute, HistoryNavigator, Navigation, ProtectedRoute, RenderContext, RouteTable};
use libris::session::SessionStore;
use libris::stores::{BookSearchStore, LibraryError, LibraryStore};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error("{from} requires a different session state; go to {to} first")]
    Redirected { from: String, to: String },
    #[error("{0}")]
    Store(String),
    #[error("rating must be between 0 and 5, got {0}")]
    InvalidRating(u8),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("signal handler failed: {0}")]
    Signal(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "libris", about = "Book tracker session and library CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session cookie.
    Login {
        email: String,
        #[arg(long, env = "LIBRIS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account. Does not sign in.
    Register {
        email: String,
        #[arg(long)]
        alias: String,
        #[arg(long, env = "LIBRIS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the signed-in user.
    Whoami,
    /// End the session and remove the cookie.
    Logout,
    /// Search the book catalogue.
    Search {
        query: String,
        #[arg(long, default_value_t = libris::stores::books::DEFAULT_SEARCH_LIMIT)]
        limit: u32,
    },
    /// Show recent searches.
    History,
    Library(LibraryCommand),
    /// Ping the backend health endpoint once.
    Ping,
    /// Ping the backend periodically until interrupted.
    Keepalive,
}

#[derive(Args, Debug)]
struct LibraryCommand {
    #[command(subcommand)]
    command: LibrarySubcommand,
}

#[derive(Subcommand, Debug)]
enum LibrarySubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long)]
        exclude_no_review: bool,
    },
    Update {
        book_id: String,
        #[arg(long, default_value = "")]
        review: String,
        #[arg(long)]
        rating: u8,
    },
    Delete {
        book_id: String,
    },
}

struct App {
    config: ClientConfig,
    api: Arc<HttpApi>,
    session: Arc<SessionStore>,
    routes: RouteTable,
    books: Arc<BookSearchStore>,
    library: Arc<LibraryStore>,
}

impl App {
    fn build(config: ClientConfig) -> Result<Self, CliError> {
        let api = Arc::new(HttpApi::new(config.api_base.clone(), config.timeouts)?);
        let policy = CookiePolicy { secure: config.cookie_secure, ..CookiePolicy::default() };
        let jar = Arc::new(FileCookieJar::new(config.cookie_path.clone(), policy));
        let navigator = Arc::new(HistoryNavigator::new());
        let session = Arc::new(SessionStore::new(api.clone(), jar, navigator.clone()));

        let protected = Arc::new(ProtectedRoute::new(session.clone()));
        let guest = Arc::new(GuestRoute::new(session.clone()));
        let routes = RouteTable::new(navigator)
            .route("/", protected)
            .route("/login", guest.clone())
            .route("/register", guest);

        let books = BookSearchStore::attach(api.clone(), session.clone());
        let library = LibraryStore::attach(api.clone(), session.clone());
        Ok(Self { config, api, session, routes, books, library })
    }

    async fn enter(&self, path: &str) -> Result<(), CliError> {
        match self.routes.navigate(RenderContext::Client, path).await {
            Navigation::Rendered(_) => Ok(()),
            Navigation::Redirected { from, to } => Err(CliError::Redirected { from, to }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = App::build(ClientConfig::from_env()?)?;
    Bootstrap::new().run(&app.session, RenderContext::Client).await;

    match cli.command {
        Command::Login { email, password } => run_login(&app, email, password).await,
        Command::Register { email, alias, password } => run_register(&app, email, alias, password).await,
        Command::Whoami => run_whoami(&app).await,
        Command::Logout => {
            app.session.logout().await;
            println!("signed out");
            Ok(())
        }
        Command::Search { query, limit } => run_search(&app, &query, limit).await,
        Command::History => run_history(&app).await,
        Command::Library(library) => run_library(&app, library.command).await,
        Command::Ping => {
            app.api.health().await?;
            println!("ok");
            Ok(())
        }
        Command::Keepalive => run_keepalive(&app).await,
    }
}

async fn run_login(app: &App, email: String, password: String) -> Result<(), CliError> {
    app.enter("/login").await?;
    let auth = app.session.login(&LoginCredentials { email, password }).await?;
    println!("signed in as {} <{}>", auth.user.alias, auth.user.email);
    Ok(())
}

async fn run_register(app: &App, email: String, alias: String, password: String) -> Result<(), CliError> {
    app.enter("/register").await?;
    let confirmation = app.session.register(&RegisterData { email, password, alias }).await?;
    println!("{}", serde_json::to_string_pretty(&confirmation)?);
    Ok(())
}

async fn run_whoami(app: &App) -> Result<(), CliError> {
    app.enter("/").await?;
    if let Some(user) = app.session.user() {
        println!("{} <{}> ({})", user.alias, user.email, user.id);
    }
    Ok(())
}

async fn run_search(app: &App, query: &str, limit: u32) -> Result<(), CliError> {
    app.enter("/search").await?;
    app.books.search_books(query, limit).await;
    let state = app.books.snapshot();
    if let Some(error) = state.error {
        return Err(CliError::Store(error));
    }
    for book in &state.results {
        let year = if book.publish_year.is_empty() { "?" } else { book.publish_year.as_str() };
        println!("{} by {} ({year})", book.title, book.author);
    }
    eprintln!("{} of {} results", state.results.len(), state.total);
    Ok(())
}

async fn run_history(app: &App) -> Result<(), CliError> {
    app.enter("/search/history").await?;
    app.books.load_search_history().await;
    for query in app.books.snapshot().history {
        println!("{query}");
    }
    Ok(())
}

async fn run_library(app: &App, command: LibrarySubcommand) -> Result<(), CliError> {
    app.enter("/library").await?;
    match command {
        LibrarySubcommand::List { search, sort_by, exclude_no_review } => {
            let filters = LibraryFilters { search, sort_by, exclude_no_review };
            app.library.load_library(&filters).await;
        }
        LibrarySubcommand::Update { book_id, review, rating } => {
            if rating > 5 {
                return Err(CliError::InvalidRating(rating));
            }
            app.library.update_book(&book_id, &BookUpdate { review, rating }).await?;
        }
        LibrarySubcommand::Delete { book_id } => {
            app.library.delete_book(&book_id).await?;
        }
    }

    let state = app.library.snapshot();
    if let Some(error) = state.error {
        return Err(CliError::Store(error));
    }
    for book in &state.books {
        let review = if book.review.is_empty() { "-" } else { book.review.as_str() };
        println!("{}  {} by {}  [{}/5] {review}", book.record_id, book.title, book.author, book.rating);
    }
    if let Some(stats) = &state.stats {
        eprintln!(
            "{} books, {} reviewed, average rating {:.1}",
            stats.total_books, stats.books_with_review, stats.average_rating
        );
    }
    Ok(())
}

async fn run_keepalive(app: &App) -> Result<(), CliError> {
    let keepalive = KeepAlive::new(app.api.clone(), Duration::from_secs(app.config.keepalive_interval_secs));
    keepalive.ping().await;
    keepalive.start();
    eprintln!("pinging every {}s; press Ctrl-C to stop", keepalive.interval().as_secs());
    tokio::signal::ctrl_c().await?;
    keepalive.stop();
    Ok(())
}
