use crate::ops;
use crate::state;
use crate::templates;
use crate::types::{PaymentMethod, Product, Settings};

use super::auth;

use axum::extract::{Form, Path, State};
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use time::OffsetDateTime;

pub(crate) fn product_card(product: &Product) -> templates::ProductCard {
    templates::ProductCard {
        id: product.id.clone(),
        name: product.name.clone(),
        description: product.description.clone(),
        price: product.price,
        duration: product.duration.clone(),
        stock: product.stock,
        image: product.image.clone(),
    }
}

fn whatsapp_link(settings: &Settings) -> String {
    format!("https://wa.me/{}", settings.whatsapp)
}

pub(crate) async fn home(
    State(state): State<state::AppState>,
    headers: HeaderMap,
) -> templates::HomeTemplate {
    let document = state.snapshot();
    let user = auth::current_user(&state, &headers);

    templates::HomeTemplate {
        app_name: state.config.app_name,
        notice: document.settings.notice.clone(),
        products: document.products.iter().map(product_card).collect(),
        logged_in: user.is_some(),
        user_name: user.map(|user| user.name).unwrap_or_default(),
    }
}

pub(crate) async fn order_form(
    State(state): State<state::AppState>,
    Path(product_id): Path<String>,
) -> Result<templates::OrderFormTemplate, (StatusCode, &'static str)> {
    let document = state.snapshot();
    let product = document
        .products
        .iter()
        .find(|product| product.id == product_id)
        .ok_or((StatusCode::NOT_FOUND, "unknown product"))?;

    Ok(templates::OrderFormTemplate {
        app_name: state.config.app_name,
        product: product_card(product),
        bkash: document.settings.bkash.clone(),
        nagad: document.settings.nagad.clone(),
        whatsapp_link: whatsapp_link(&document.settings),
        error: String::new(),
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderForm {
    quantity: u32,
    payment_method: String,
    sender_number: String,
    trx_id: String,
    whatsapp: String,
}

pub(crate) async fn order_submit(
    State(state): State<state::AppState>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<OrderForm>,
) -> Response {
    let Some(user) = auth::current_user(&state, &headers) else {
        return Redirect::to("/login").into_response();
    };

    let document = state.snapshot();
    let Some(product) = document
        .products
        .iter()
        .find(|product| product.id == product_id)
    else {
        return (StatusCode::NOT_FOUND, "unknown product").into_response();
    };
    let error_template = |error: String| templates::OrderFormTemplate {
        app_name: state.config.app_name.clone(),
        product: product_card(product),
        bkash: document.settings.bkash.clone(),
        nagad: document.settings.nagad.clone(),
        whatsapp_link: whatsapp_link(&document.settings),
        error,
    };

    let Some(payment_method) = parse_payment_method(&form.payment_method) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_template("Choose bKash or Nagad as the payment method.".to_string()),
        )
            .into_response();
    };

    let request = ops::OrderRequest {
        product_id,
        quantity: form.quantity,
        payment_method,
        sender_number: form.sender_number.trim().to_string(),
        trx_id: form.trx_id.trim().to_string(),
        whatsapp: form.whatsapp.trim().to_string(),
    };

    let result = state.apply(|document| {
        ops::place_order(
            document,
            &user,
            ops::order_id(),
            request,
            OffsetDateTime::now_utc(),
        )
    });

    match result {
        Ok(_order) => Redirect::to("/orders").into_response(),
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            error_template(err.to_string()),
        )
            .into_response(),
    }
}

fn parse_payment_method(raw: &str) -> Option<PaymentMethod> {
    match raw {
        "bKash" => Some(PaymentMethod::Bkash),
        "Nagad" => Some(PaymentMethod::Nagad),
        _ => None,
    }
}
