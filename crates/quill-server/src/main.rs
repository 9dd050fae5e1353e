use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use quill_api::auth::{self, AppState, AppStateInner};
use quill_api::middleware::attach_actor;
use quill_api::{categories, comments, posts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("QUILL_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("QUILL_DB_PATH").unwrap_or_else(|_| "quill.db".into());
    let host = std::env::var("QUILL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("QUILL_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = quill_db::Database::open(&PathBuf::from(&db_path))?;

    // A fresh deployment gets a default admin account
    auth::ensure_admin(&db)?;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let content_routes = Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/category/{slug}", get(posts::list_by_category))
        .route(
            "/posts/{slug}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/{slug}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route("/comments", post(comments::create_comment))
        .route("/comments/post/{post_id}", get(comments::list_for_post))
        .route("/comments/admin", get(comments::list_admin))
        .route(
            "/comments/{id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/comments/{id}/status", patch(comments::set_status))
        .layer(middleware::from_fn(attach_actor))
        .with_state(app_state);

    let app = Router::new()
        .merge(auth_routes)
        .merge(content_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Quill server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
