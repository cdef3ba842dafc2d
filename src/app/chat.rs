use crate::ops;
use crate::state;
use crate::templates;
use crate::types::{ChatMessage, ChatRole, SupportChat};

use super::auth;

use axum::Json;
use axum::extract::{Form, Path, State};
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::Redirect;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

fn message_row(message: &ChatMessage) -> templates::MessageRow {
    templates::MessageRow {
        role: message.role.to_string(),
        text: message.text.clone(),
        timestamp: templates::format_timestamp(message.timestamp),
    }
}

pub(crate) fn chat_row(chat: &SupportChat) -> templates::ChatRow {
    templates::ChatRow {
        id: chat.id.clone(),
        user_name: chat.user_name.clone(),
        status: chat.status.to_string(),
        last_message_at: templates::format_timestamp(chat.last_message_at),
        preview: chat
            .messages
            .last()
            .map(|message| message.text.clone())
            .unwrap_or_default(),
    }
}

pub(crate) async fn chat_view(
    State(state): State<state::AppState>,
    headers: HeaderMap,
) -> Result<templates::ChatTemplate, Redirect> {
    let user = auth::current_user(&state, &headers).ok_or_else(|| Redirect::to("/login"))?;
    let document = state.snapshot();
    let chat = document.chats.iter().find(|chat| chat.user_id == user.id);

    Ok(templates::ChatTemplate {
        app_name: state.config.app_name,
        messages: chat
            .map(|chat| chat.messages.iter().map(message_row).collect())
            .unwrap_or_default(),
        status: chat
            .map(|chat| chat.status.to_string())
            .unwrap_or_else(|| "Open".to_string()),
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatForm {
    text: String,
}

pub(crate) async fn chat_send(
    State(state): State<state::AppState>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Redirect {
    let Some(user) = auth::current_user(&state, &headers) else {
        return Redirect::to("/login");
    };
    let text = form.text.trim().to_string();
    if text.is_empty() {
        return Redirect::to("/chat");
    }

    state.apply_infallible(|document| {
        ops::append_message(
            document,
            &user.id,
            ChatRole::User,
            &text,
            ops::entity_id(),
            ops::entity_id(),
            OffsetDateTime::now_utc(),
        )
    });

    let handle = state.bot.schedule_reply(user.id, &text);
    let mut handles = state.bot_handles.lock().expect("bot handles lock");
    handles.retain(|handle| !handle.is_finished());
    handles.push(handle);

    Redirect::to("/chat")
}

pub(crate) async fn admin_chats(
    State(state): State<state::AppState>,
) -> templates::AdminChatsTemplate {
    let document = state.snapshot();
    let mut chats: Vec<&SupportChat> = document.chats.iter().collect();
    chats.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));

    templates::AdminChatsTemplate {
        app_name: state.config.app_name,
        chats: chats.into_iter().map(chat_row).collect(),
    }
}

pub(crate) async fn admin_chat_view(
    State(state): State<state::AppState>,
    Path(chat_id): Path<String>,
) -> Result<templates::AdminChatTemplate, (StatusCode, &'static str)> {
    let document = state.snapshot();
    let chat = document
        .chats
        .iter()
        .find(|chat| chat.id == chat_id)
        .ok_or((StatusCode::NOT_FOUND, "unknown chat"))?;

    Ok(templates::AdminChatTemplate {
        app_name: state.config.app_name,
        chat_id: chat.id.clone(),
        user_name: chat.user_name.clone(),
        user_email: chat.user_email.clone(),
        status: chat.status.to_string(),
        messages: chat.messages.iter().map(message_row).collect(),
    })
}

pub(crate) async fn admin_chat_reply(
    State(state): State<state::AppState>,
    Path(chat_id): Path<String>,
    Form(form): Form<ChatForm>,
) -> Result<Redirect, (StatusCode, &'static str)> {
    let user_id = state
        .snapshot()
        .chats
        .iter()
        .find(|chat| chat.id == chat_id)
        .map(|chat| chat.user_id.clone())
        .ok_or((StatusCode::NOT_FOUND, "unknown chat"))?;
    let text = form.text.trim().to_string();
    if !text.is_empty() {
        state.apply_infallible(|document| {
            ops::append_message(
                document,
                &user_id,
                ChatRole::Admin,
                &text,
                ops::entity_id(),
                ops::entity_id(),
                OffsetDateTime::now_utc(),
            )
        });
    }
    Ok(Redirect::to(&format!("/admin/chats/{chat_id}")))
}

pub(crate) async fn admin_chat_resolve(
    State(state): State<state::AppState>,
    Path(chat_id): Path<String>,
) -> Redirect {
    state.apply_infallible(|document| ops::resolve_chat(document, &chat_id));
    Redirect::to(&format!("/admin/chats/{chat_id}"))
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BotScheduleDebugResponse {
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) server_time: OffsetDateTime,
    pub(crate) scheduled: Vec<BotScheduleEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BotScheduleEntry {
    pub(crate) user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) scheduled_at: OffsetDateTime,
    pub(crate) finished: bool,
}

pub(crate) async fn bot_schedule_debug(
    State(state): State<state::AppState>,
) -> Json<BotScheduleDebugResponse> {
    let handles = state.bot_handles.lock().expect("bot handles lock");
    let scheduled = handles
        .iter()
        .map(|handle| BotScheduleEntry {
            user_id: handle.user_id.clone(),
            scheduled_at: handle.scheduled_at,
            finished: handle.is_finished(),
        })
        .collect();

    Json(BotScheduleDebugResponse {
        server_time: OffsetDateTime::now_utc(),
        scheduled,
    })
}
