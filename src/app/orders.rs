use crate::ops;
use crate::state;
use crate::templates;
use crate::types::{Order, OrderStatus};

use super::auth;

use axum::extract::{Form, Path, State};
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::Redirect;
use serde::Deserialize;

pub(crate) fn order_row(order: &Order) -> templates::OrderRow {
    templates::OrderRow {
        id: order.id.clone(),
        user_name: order.user_name.clone(),
        user_email: order.user_email.clone(),
        product_name: order.product_name.clone(),
        quantity: order.quantity,
        total_price: order.total_price,
        payment_method: order.payment_method.to_string(),
        sender_number: order.sender_number.clone(),
        trx_id: order.trx_id.clone(),
        status: order.status.to_string(),
        rejection_reason: order.rejection_reason.clone().unwrap_or_default(),
        order_date: templates::format_timestamp(order.order_date),
    }
}

pub(crate) async fn my_orders(
    State(state): State<state::AppState>,
    headers: HeaderMap,
) -> Result<templates::MyOrdersTemplate, Redirect> {
    let user = auth::current_user(&state, &headers).ok_or_else(|| Redirect::to("/login"))?;
    let document = state.snapshot();

    // Orders are stored newest-first already.
    Ok(templates::MyOrdersTemplate {
        app_name: state.config.app_name,
        orders: document
            .orders
            .iter()
            .filter(|order| order.user_id == user.id)
            .map(order_row)
            .collect(),
    })
}

pub(crate) async fn admin_orders(
    State(state): State<state::AppState>,
) -> templates::AdminOrdersTemplate {
    let document = state.snapshot();
    templates::AdminOrdersTemplate {
        app_name: state.config.app_name,
        orders: document.orders.iter().map(order_row).collect(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusForm {
    status: String,
    reason: Option<String>,
}

pub(crate) async fn admin_order_status(
    State(state): State<state::AppState>,
    Path(order_id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, (StatusCode, &'static str)> {
    let status = parse_status(&form.status)
        .ok_or((StatusCode::UNPROCESSABLE_ENTITY, "unknown order status"))?;
    let reason = form
        .reason
        .map(|reason| reason.trim().to_string())
        .filter(|reason| !reason.is_empty());

    state.apply_infallible(|document| {
        ops::update_order_status(document, &order_id, status, reason.clone())
    });

    Ok(Redirect::to("/admin/orders"))
}

fn parse_status(raw: &str) -> Option<OrderStatus> {
    match raw {
        "Pending" => Some(OrderStatus::Pending),
        "Approved" => Some(OrderStatus::Approved),
        "Completed" => Some(OrderStatus::Completed),
        "Rejected" => Some(OrderStatus::Rejected),
        _ => None,
    }
}
