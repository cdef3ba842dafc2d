use crate::ops;
use crate::state;
use crate::templates;
use crate::types::{AppDocument, OrderStatus, Settings, SupportChat};

use super::chat;
use super::orders;

use axum::Json;
use axum::extract::{Form, Query, State};
use axum::response::Redirect;
use serde::Deserialize;

const RECENT_LIMIT: usize = 5;

pub(crate) async fn dashboard(
    State(state): State<state::AppState>,
) -> templates::AdminDashboardTemplate {
    let document = state.snapshot();
    let count = |status: OrderStatus| {
        document
            .orders
            .iter()
            .filter(|order| order.status == status)
            .count()
    };

    let mut recent_chats: Vec<&SupportChat> = document.chats.iter().collect();
    recent_chats.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));

    templates::AdminDashboardTemplate {
        app_name: state.config.app_name.clone(),
        pending_count: count(OrderStatus::Pending),
        approved_count: count(OrderStatus::Approved),
        completed_count: count(OrderStatus::Completed),
        user_count: document.users.len(),
        recent_orders: document
            .orders
            .iter()
            .filter(|order| order.status == OrderStatus::Pending)
            .take(RECENT_LIMIT)
            .map(orders::order_row)
            .collect(),
        recent_chats: recent_chats
            .into_iter()
            .take(RECENT_LIMIT)
            .map(chat::chat_row)
            .collect(),
    }
}

pub(crate) async fn admin_users(
    State(state): State<state::AppState>,
) -> templates::AdminUsersTemplate {
    let document = state.snapshot();
    templates::AdminUsersTemplate {
        app_name: state.config.app_name,
        users: document
            .users
            .iter()
            .map(|user| templates::UserRow {
                id: user.id.clone(),
                name: user.name.clone(),
                email: user.email.clone(),
                register_date: templates::format_timestamp(user.register_date),
            })
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SettingsQuery {
    saved: Option<String>,
}

pub(crate) async fn settings_form(
    State(state): State<state::AppState>,
    Query(query): Query<SettingsQuery>,
) -> templates::AdminSettingsTemplate {
    let document = state.snapshot();
    templates::AdminSettingsTemplate {
        app_name: state.config.app_name,
        notice: document.settings.notice.clone(),
        bkash: document.settings.bkash.clone(),
        nagad: document.settings.nagad.clone(),
        whatsapp: document.settings.whatsapp.clone(),
        admin_password: document.settings.admin_password.clone(),
        is_maintenance: document.settings.is_maintenance,
        saved: query.saved.is_some(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SettingsForm {
    notice: String,
    bkash_number: String,
    nagad_number: String,
    whatsapp_number: String,
    admin_password: String,
    is_maintenance: Option<String>,
}

pub(crate) async fn settings_save(
    State(state): State<state::AppState>,
    Form(form): Form<SettingsForm>,
) -> Redirect {
    let settings = Settings {
        notice: form.notice.trim().to_string(),
        bkash: form.bkash_number.trim().to_string(),
        nagad: form.nagad_number.trim().to_string(),
        whatsapp: form.whatsapp_number.trim().to_string(),
        admin_password: form.admin_password.trim().to_string(),
        is_maintenance: form.is_maintenance.is_some(),
    };

    state.apply_infallible(|document| ops::save_settings(document, settings.clone()));

    Redirect::to("/admin/settings?saved=1")
}

pub(crate) async fn document_debug(State(state): State<state::AppState>) -> Json<AppDocument> {
    Json(state.snapshot())
}
