use crate::adapters;
use crate::assets;
use crate::bot;
use crate::config;
use crate::session;
use crate::state;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;

mod admin;
mod auth;
mod chat;
mod orders;
mod products;
mod shop;

pub fn app(config: config::AppConfig) -> Router {
    let session = session::SessionState::from_config(&config)
        .unwrap_or_else(|err| panic!("invalid session configuration: {err}"));
    let (store, document) = adapters::JsonFileStore::open(config.data_path.clone())
        .unwrap_or_else(|err| panic!("failed to open document store: {err}"));
    let mirror = std::sync::Arc::new(std::sync::Mutex::new(document));
    let bot = bot::BotScheduler::new(
        adapters::TokioTimeProvider,
        store.clone(),
        std::sync::Arc::clone(&mirror),
        config.bot_reply_delay,
    );
    let state = state::AppState {
        config,
        session,
        store: store.clone(),
        mirror: std::sync::Arc::clone(&mirror),
        bot,
        bot_handles: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
    };
    // The reconciler task runs for the life of the process.
    let _ = state::spawn_mirror_sync(&store, mirror);
    Router::new()
        .route("/", get(shop::home))
        .route("/login", get(auth::login_form).post(auth::login_submit))
        .route(
            "/register",
            get(auth::register_form).post(auth::register_submit),
        )
        .route("/logout", post(auth::logout))
        .route("/profile", get(auth::profile))
        .route(
            "/order/{product_id}",
            get(shop::order_form).post(shop::order_submit),
        )
        .route("/orders", get(orders::my_orders))
        .route("/chat", get(chat::chat_view).post(chat::chat_send))
        .route("/admin", get(admin::dashboard))
        .route(
            "/admin/login",
            get(auth::admin_login_form).post(auth::admin_login_submit),
        )
        .route("/admin/logout", post(auth::admin_logout))
        .route("/admin/orders", get(orders::admin_orders))
        .route(
            "/admin/orders/{order_id}/status",
            post(orders::admin_order_status),
        )
        .route("/admin/users", get(admin::admin_users))
        .route("/admin/products", get(products::admin_products))
        .route(
            "/admin/products/new",
            get(products::product_new).post(products::product_create),
        )
        .route(
            "/admin/products/{product_id}/edit",
            get(products::product_edit).post(products::product_update),
        )
        .route(
            "/admin/products/{product_id}/delete",
            post(products::product_delete),
        )
        .route("/admin/chats", get(chat::admin_chats))
        .route("/admin/chats/{chat_id}", get(chat::admin_chat_view))
        .route("/admin/chats/{chat_id}/reply", post(chat::admin_chat_reply))
        .route(
            "/admin/chats/{chat_id}/resolve",
            post(chat::admin_chat_resolve),
        )
        .route(
            "/admin/settings",
            get(admin::settings_form).post(admin::settings_save),
        )
        .route("/api/debug/document", get(admin::document_debug))
        .route("/api/debug/bot/schedule", get(chat::bot_schedule_debug))
        .route("/static/style.css", get(assets::stylesheet))
        .route("/health", get(health))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state,
            auth::session_middleware,
        ))
}

pub(crate) async fn health() -> &'static str {
    "ok"
}
