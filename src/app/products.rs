use crate::ops;
use crate::state;
use crate::templates;

use super::shop;

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

pub(crate) async fn admin_products(
    State(state): State<state::AppState>,
) -> templates::AdminProductsTemplate {
    let document = state.snapshot();
    templates::AdminProductsTemplate {
        app_name: state.config.app_name,
        products: document.products.iter().map(shop::product_card).collect(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductForm {
    name: String,
    description: String,
    price: String,
    duration: String,
    stock: String,
    image: String,
}

fn parse_fields(form: &ProductForm) -> Result<ops::ProductFields, String> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err("The product needs a name.".to_string());
    }
    let price: u32 = form
        .price
        .trim()
        .parse()
        .map_err(|_| "Price must be a whole number.".to_string())?;
    let stock: u32 = form
        .stock
        .trim()
        .parse()
        .map_err(|_| "Stock must be a whole number.".to_string())?;

    Ok(ops::ProductFields {
        name: name.to_string(),
        description: form.description.trim().to_string(),
        price,
        duration: form.duration.trim().to_string(),
        stock,
        image: form.image.trim().to_string(),
    })
}

fn form_template(
    app_name: String,
    heading: &str,
    action: String,
    form: &ProductForm,
    error: String,
) -> templates::ProductFormTemplate {
    templates::ProductFormTemplate {
        app_name,
        heading: heading.to_string(),
        action,
        name: form.name.clone(),
        description: form.description.clone(),
        price: form.price.clone(),
        duration: form.duration.clone(),
        stock: form.stock.clone(),
        image: form.image.clone(),
        error,
    }
}

pub(crate) async fn product_new(
    State(state): State<state::AppState>,
) -> templates::ProductFormTemplate {
    templates::ProductFormTemplate {
        app_name: state.config.app_name,
        heading: "Add product".to_string(),
        action: "/admin/products/new".to_string(),
        name: String::new(),
        description: String::new(),
        price: String::new(),
        duration: String::new(),
        stock: String::new(),
        image: String::new(),
        error: String::new(),
    }
}

pub(crate) async fn product_create(
    State(state): State<state::AppState>,
    Form(form): Form<ProductForm>,
) -> Response {
    let fields = match parse_fields(&form) {
        Ok(fields) => fields,
        Err(error) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                form_template(
                    state.config.app_name.clone(),
                    "Add product",
                    "/admin/products/new".to_string(),
                    &form,
                    error,
                ),
            )
                .into_response();
        }
    };

    state.apply_infallible(|document| {
        ops::save_product(document, None, ops::entity_id(), fields)
    });

    Redirect::to("/admin/products").into_response()
}

pub(crate) async fn product_edit(
    State(state): State<state::AppState>,
    Path(product_id): Path<String>,
) -> Result<templates::ProductFormTemplate, (StatusCode, &'static str)> {
    let document = state.snapshot();
    let product = document
        .products
        .iter()
        .find(|product| product.id == product_id)
        .ok_or((StatusCode::NOT_FOUND, "unknown product"))?;

    Ok(templates::ProductFormTemplate {
        app_name: state.config.app_name,
        heading: format!("Edit {}", product.name),
        action: format!("/admin/products/{}/edit", product.id),
        name: product.name.clone(),
        description: product.description.clone(),
        price: product.price.to_string(),
        duration: product.duration.clone(),
        stock: product.stock.to_string(),
        image: product.image.clone(),
        error: String::new(),
    })
}

pub(crate) async fn product_update(
    State(state): State<state::AppState>,
    Path(product_id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Response {
    let exists = state
        .snapshot()
        .products
        .iter()
        .any(|product| product.id == product_id);
    if !exists {
        return (StatusCode::NOT_FOUND, "unknown product").into_response();
    }

    let fields = match parse_fields(&form) {
        Ok(fields) => fields,
        Err(error) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                form_template(
                    state.config.app_name.clone(),
                    "Edit product",
                    format!("/admin/products/{product_id}/edit"),
                    &form,
                    error,
                ),
            )
                .into_response();
        }
    };

    state.apply_infallible(|document| {
        ops::save_product(document, Some(&product_id), ops::entity_id(), fields)
    });

    Redirect::to("/admin/products").into_response()
}

pub(crate) async fn product_delete(
    State(state): State<state::AppState>,
    Path(product_id): Path<String>,
) -> Redirect {
    state.apply_infallible(|document| ops::delete_product(document, &product_id));
    Redirect::to("/admin/products")
}
