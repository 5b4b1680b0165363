mod error;
mod server_config;

use std::{collections::HashMap, path::{Path, PathBuf}, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Form, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router
};
use log::info;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;

use balance_ledger::{
    backend::KeyValueStore,
    config::CorruptDataPolicy,
    page::{App, FormSubmission, Page, document::SEND_FORM_ID}};

use error::ServerError;
use server_config::ServerConfig;

const SERVER_CONFIG: &str = "resources/server.toml";

/// One store shared by every request; holding the lock for the whole
/// request makes each visit run to completion before the next starts.
struct AppState<S> {
    store: Mutex<S>,
    policy: CorruptDataPolicy
}

type SharedState<S> = Arc<AppState<S>>;

fn router<S: KeyValueStore + Send + 'static>(state: SharedState<S>, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(account_page::<S>))
        .route("/send", post(send_money::<S>))
        .route("/history", get(history_page::<S>))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found)
        .with_state(state)
}

async fn account_page<S: KeyValueStore + Send + 'static>(State(state): State<SharedState<S>>) -> Result<Html<String>, ServerError> {
    let mut store = state.store.lock().await;
    let mut app = App::account_page(&mut *store, Page::account(), state.policy);
    app.load()?;
    Ok(Html(app.into_document().to_html()))
}

async fn send_money<S: KeyValueStore + Send + 'static>(
    State(state): State<SharedState<S>>,
    Form(fields): Form<HashMap<String, String>>
) -> Result<Response, ServerError> {
    let mut store = state.store.lock().await;
    let mut app = App::account_page(&mut *store, Page::account(), state.policy);
    app.load()?;
    app.submit(FormSubmission::from_fields(SEND_FORM_ID, fields))?;

    let page = app.into_document();
    let status = if page.alerts().is_empty() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Html(page.to_html())).into_response())
}

async fn history_page<S: KeyValueStore + Send + 'static>(State(state): State<SharedState<S>>) -> Result<Html<String>, ServerError> {
    let mut store = state.store.lock().await;
    let mut app = App::history_page(&mut *store, Page::history(), state.policy);
    app.load()?;
    Ok(Html(app.into_document().to_html()))
}

async fn not_found(uri: Uri) -> ServerError {
    ServerError::NotFound(uri.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let config_path = std::env::args().nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(SERVER_CONFIG));
    let config = ServerConfig::read_or_default(&config_path)?;

    let store = config.store.open()
        .with_context(|| format!("failed to open store {}", config.store.path.display()))?;
    let state = Arc::new(AppState {
        store: Mutex::new(store),
        policy: config.store.on_corrupt
    });

    let listener = tokio::net::TcpListener::bind(config.address)
        .await
        .with_context(|| format!("failed to bind {}", config.address))?;
    info!("serving {} on http://{}", config.store.path.display(), config.address);

    axum::serve(listener, router(state, &config.static_dir)).await?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Arc};

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
        Router
    };
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    use balance_ledger::backend::{KeyValueStore, MemoryStore};
    use balance_ledger::config::CorruptDataPolicy;
    use balance_ledger::page::INVALID_INPUT_MESSAGE;

    use super::{router, AppState, SharedState};

    fn state(store: MemoryStore) -> SharedState<MemoryStore> {
        Arc::new(AppState { store: Mutex::new(store), policy: CorruptDataPolicy::Fail })
    }

    fn app(state: &SharedState<MemoryStore>) -> Router {
        router(state.clone(), Path::new("resources/static"))
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_form(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/send")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn index_shows_initial_balance() {
        let state = state(MemoryStore::new());
        let response = app(&state).oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("<span id=\"balance\">10000.00</span>"));
        assert!(body.contains("<ul id=\"history\">\n</ul>"));
    }

    #[tokio::test]
    async fn send_persists_and_renders() {
        let state = state(MemoryStore::new());
        let response = app(&state).oneshot(post_form("recipient=Alice&amount=100")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("<span id=\"balance\">9900.00</span>"));
        assert!(body.contains("Sent $100 to Alice</li>"));

        let store = state.store.lock().await;
        assert_eq!(store.get_item("balance").unwrap().as_deref(), Some("9900"));
    }

    #[tokio::test]
    async fn invalid_send_is_unprocessable() {
        let state = state(MemoryStore::new());
        let response = app(&state).oneshot(post_form("recipient=Alice&amount=20000")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains(INVALID_INPUT_MESSAGE));
        assert!(state.store.lock().await.is_empty());
    }

    #[tokio::test]
    async fn history_page_lists_transfers_without_balance() {
        let state = state(MemoryStore::new());
        app(&state).oneshot(post_form("recipient=Bob&amount=12.5")).await.unwrap();

        let response = app(&state).oneshot(get("/history")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Sent $12.5 to Bob</li>"));
        assert!(!body.contains("id=\"balance\""));
    }

    #[tokio::test]
    async fn corrupt_store_is_internal_error() {
        let store: MemoryStore = vec![("balance", "lots")].into_iter().collect();
        let response = app(&state(store)).oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("unreadable (balance)"));
    }

    #[tokio::test]
    async fn full_store_is_insufficient_storage() {
        let state = state(MemoryStore::with_quota(8));
        let response = app(&state).oneshot(post_form("recipient=Alice&amount=100")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INSUFFICIENT_STORAGE);
        assert!(body_text(response).await.contains("storage is full"));
        assert!(state.store.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let response = app(&state(MemoryStore::new())).oneshot(get("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn serves_stylesheet() {
        let response = app(&state(MemoryStore::new())).oneshot(get("/static/style.css")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
