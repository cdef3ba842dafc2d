//! Pure mutation operations over the shared document: each takes the
//! previous document plus user input and returns the next document.
//! Identifiers and timestamps are injected by the caller so the functions
//! stay deterministic.

use rand::Rng;
use rand::distributions::Alphanumeric;
use time::OffsetDateTime;

use crate::document;
use crate::types::{
    AppDocument, ChatMessage, ChatRole, ChatStatus, Order, OrderStatus, PaymentMethod, Product,
    Settings, SupportChat, User,
};

#[derive(Debug, PartialEq, Eq)]
pub enum RegisterError {
    DuplicateEmail,
}

impl std::fmt::Display for RegisterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterError::DuplicateEmail => f.write_str("an account with this email already exists"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginError {
    InvalidCredentials,
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginError::InvalidCredentials => f.write_str("wrong email or password"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PlaceOrderError {
    UnknownProduct,
    InsufficientStock,
}

impl std::fmt::Display for PlaceOrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceOrderError::UnknownProduct => f.write_str("unknown product"),
            PlaceOrderError::InsufficientStock => {
                f.write_str("ordering more than the available stock is not possible")
            }
        }
    }
}

pub fn entity_id() -> String {
    entity_id_with_rng(&mut rand::thread_rng())
}

pub(crate) fn entity_id_with_rng<R: Rng>(rng: &mut R) -> String {
    (0..9)
        .map(|_| (rng.sample(Alphanumeric) as char).to_ascii_lowercase())
        .collect()
}

pub fn order_id() -> String {
    order_id_with_rng(&mut rand::thread_rng())
}

pub(crate) fn order_id_with_rng<R: Rng>(rng: &mut R) -> String {
    let suffix: String = (0..6)
        .map(|_| (rng.sample(Alphanumeric) as char).to_ascii_uppercase())
        .collect();
    format!("ORD-{suffix}")
}

/// Fails when any existing user already holds the email (case-sensitive
/// exact match). Users are immutable once created.
pub fn register(
    document: &AppDocument,
    id: String,
    name: &str,
    email: &str,
    password: &str,
    now: OffsetDateTime,
) -> Result<(AppDocument, User), RegisterError> {
    if document.users.iter().any(|user| user.email == email) {
        return Err(RegisterError::DuplicateEmail);
    }

    let user = User {
        id,
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        register_date: now,
    };

    let mut next = document.clone();
    next.users.push(user.clone());
    Ok((next, user))
}

/// Plaintext comparison, exactly as the stored document expects.
pub fn login<'a>(
    document: &'a AppDocument,
    email: &str,
    password: &str,
) -> Result<&'a User, LoginError> {
    document
        .users
        .iter()
        .find(|user| user.email == email && user.password == password)
        .ok_or(LoginError::InvalidCredentials)
}

pub fn admin_login(document: &AppDocument, password: &str) -> bool {
    password == document.settings.admin_password
}

pub struct OrderRequest {
    pub product_id: String,
    pub quantity: u32,
    pub payment_method: PaymentMethod,
    pub sender_number: String,
    pub trx_id: String,
    pub whatsapp: String,
}

/// Creates a Pending order and decrements the product stock in the same
/// document. The stock check runs against the mirror only; two clients
/// racing for the last units is an accepted limitation of the design.
pub fn place_order(
    document: &AppDocument,
    customer: &User,
    id: String,
    request: OrderRequest,
    now: OffsetDateTime,
) -> Result<(AppDocument, Order), PlaceOrderError> {
    let product = document
        .products
        .iter()
        .find(|product| product.id == request.product_id)
        .ok_or(PlaceOrderError::UnknownProduct)?;

    if request.quantity > product.stock {
        return Err(PlaceOrderError::InsufficientStock);
    }

    let order = Order {
        id,
        user_id: customer.id.clone(),
        user_name: customer.name.clone(),
        user_email: customer.email.clone(),
        product_name: product.name.clone(),
        quantity: request.quantity,
        unit_price: product.price,
        total_price: u64::from(product.price) * u64::from(request.quantity),
        payment_method: request.payment_method,
        sender_number: request.sender_number,
        trx_id: request.trx_id,
        whatsapp: request.whatsapp,
        status: OrderStatus::Pending,
        rejection_reason: None,
        order_date: now,
    };

    let mut next = document.clone();
    // Prepend: order lists are newest-first by construction, not by sort.
    next.orders.insert(0, order.clone());
    for product in &mut next.products {
        if product.id == request.product_id {
            product.stock -= request.quantity;
        }
    }
    Ok((next, order))
}

/// Writes the status and replaces the rejection reason wholesale (clearing
/// it when none is given). Transition legality is enforced only by which
/// actions the admin views offer.
pub fn update_order_status(
    document: &AppDocument,
    order_id: &str,
    status: OrderStatus,
    reason: Option<String>,
) -> AppDocument {
    let mut next = document.clone();
    for order in &mut next.orders {
        if order.id == order_id {
            order.status = status;
            order.rejection_reason = reason.clone();
        }
    }
    next
}

pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: u32,
    pub duration: String,
    pub stock: u32,
    pub image: String,
}

/// Replaces the product in place when `existing_id` is given (identity
/// preserved), otherwise appends under the generated id. A blank image
/// field falls back to a generated placeholder.
pub fn save_product(
    document: &AppDocument,
    existing_id: Option<&str>,
    generated_id: String,
    fields: ProductFields,
) -> AppDocument {
    let id = existing_id.map(str::to_string).unwrap_or(generated_id);
    let image = if fields.image.trim().is_empty() {
        document::placeholder_image(&id)
    } else {
        fields.image
    };
    let product = Product {
        id: id.clone(),
        name: fields.name,
        description: fields.description,
        price: fields.price,
        duration: fields.duration,
        stock: fields.stock,
        image,
    };

    let mut next = document.clone();
    if existing_id.is_some() {
        for existing in &mut next.products {
            if existing.id == id {
                *existing = product.clone();
            }
        }
    } else {
        next.products.push(product);
    }
    next
}

/// Unconditional removal. Orders keep their denormalized product snapshot,
/// so dangling references cannot occur.
pub fn delete_product(document: &AppDocument, product_id: &str) -> AppDocument {
    let mut next = document.clone();
    next.products.retain(|product| product.id != product_id);
    next
}

/// Appends a message to the target user's thread, creating the thread
/// lazily. A customer message forces the thread Open (reopening a resolved
/// one); admin and bot messages never change the status.
pub fn append_message(
    document: &AppDocument,
    target_user_id: &str,
    role: ChatRole,
    text: &str,
    message_id: String,
    chat_id: String,
    now: OffsetDateTime,
) -> AppDocument {
    let message = ChatMessage {
        id: message_id,
        role,
        text: text.to_string(),
        timestamp: now,
    };

    let mut next = document.clone();
    if let Some(chat) = next
        .chats
        .iter_mut()
        .find(|chat| chat.user_id == target_user_id)
    {
        chat.messages.push(message.clone());
        chat.last_message_at = message.timestamp;
        if role == ChatRole::User {
            chat.status = ChatStatus::Open;
        }
    } else {
        let user = next.users.iter().find(|user| user.id == target_user_id);
        let (user_name, user_email) = match user {
            Some(user) => (user.name.clone(), user.email.clone()),
            None => ("Unknown".to_string(), "Unknown".to_string()),
        };
        next.chats.push(SupportChat {
            id: chat_id,
            user_id: target_user_id.to_string(),
            user_name,
            user_email,
            messages: vec![message.clone()],
            last_message_at: message.timestamp,
            status: ChatStatus::Open,
        });
    }
    next
}

pub fn resolve_chat(document: &AppDocument, chat_id: &str) -> AppDocument {
    let mut next = document.clone();
    for chat in &mut next.chats {
        if chat.id == chat_id {
            chat.status = ChatStatus::Resolved;
        }
    }
    next
}

/// The settings singleton is replaced wholesale from the admin form.
pub fn save_settings(document: &AppDocument, settings: Settings) -> AppDocument {
    let mut next = document.clone();
    next.settings = settings;
    next
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::document::default_document;
    use time::format_description::well_known::Rfc3339;

    fn test_now() -> OffsetDateTime {
        OffsetDateTime::parse("2026-01-05T10:00:00Z", &Rfc3339).expect("parse now")
    }

    fn registered_document() -> (AppDocument, User) {
        let document = default_document();
        let (document, user) = register(
            &document,
            "u1a2b3c4d".to_string(),
            "Rahim",
            "rahim@example.com",
            "secret",
            test_now(),
        )
        .expect("register");
        (document, user)
    }

    fn order_request(product_id: &str, quantity: u32) -> OrderRequest {
        OrderRequest {
            product_id: product_id.to_string(),
            quantity,
            payment_method: PaymentMethod::Bkash,
            sender_number: "01711111111".to_string(),
            trx_id: "TX123".to_string(),
            whatsapp: "8801711111111".to_string(),
        }
    }

    #[test]
    fn entity_id__should_be_nine_lowercase_alphanumerics() {
        // When
        let id = entity_id();

        // Then
        assert_eq!(id.len(), 9);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn order_id__should_use_the_ord_prefix() {
        // When
        let id = order_id();

        // Then
        assert_eq!(id.len(), 10);
        assert!(id.starts_with("ORD-"));
        assert!(
            id[4..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn register__should_append_user_and_keep_previous_document_untouched() {
        // Given
        let document = default_document();

        // When
        let (next, user) = register(
            &document,
            "u1a2b3c4d".to_string(),
            "Rahim",
            "rahim@example.com",
            "secret",
            test_now(),
        )
        .expect("register");

        // Then
        assert!(document.users.is_empty());
        assert_eq!(next.users.len(), 1);
        assert_eq!(next.users[0], user);
        assert_eq!(user.register_date, test_now());
    }

    #[test]
    fn register__should_reject_duplicate_email() {
        // Given
        let (document, _user) = registered_document();

        // When
        let result = register(
            &document,
            "u9z8y7x6w".to_string(),
            "Other",
            "rahim@example.com",
            "other",
            test_now(),
        );

        // Then
        assert_eq!(result.unwrap_err(), RegisterError::DuplicateEmail);
        assert_eq!(document.users.len(), 1);
    }

    #[test]
    fn register__should_treat_email_comparison_as_case_sensitive() {
        // Given
        let (document, _user) = registered_document();

        // When
        let result = register(
            &document,
            "u9z8y7x6w".to_string(),
            "Other",
            "Rahim@example.com",
            "other",
            test_now(),
        );

        // Then
        assert!(result.is_ok());
    }

    #[test]
    fn login__should_require_exact_email_and_password() {
        // Given
        let (document, user) = registered_document();

        // Then
        assert_eq!(
            login(&document, "rahim@example.com", "secret").expect("login").id,
            user.id
        );
        assert_eq!(
            login(&document, "rahim@example.com", "wrong").unwrap_err(),
            LoginError::InvalidCredentials
        );
        assert_eq!(
            login(&document, "other@example.com", "secret").unwrap_err(),
            LoginError::InvalidCredentials
        );
    }

    #[test]
    fn admin_login__should_compare_against_settings_password() {
        // Given
        let document = default_document();

        // Then
        assert!(admin_login(&document, "subshop2026"));
        assert!(!admin_login(&document, "wrong"));
    }

    #[test]
    fn place_order__should_decrement_stock_and_prepend_pending_order() {
        // Given
        let (document, user) = registered_document();
        let old_stock = document.products[0].stock;

        // When
        let (next, order) = place_order(
            &document,
            &user,
            "ORD-AB12CD".to_string(),
            order_request("1", 2),
            test_now(),
        )
        .expect("place order");

        // Then
        assert_eq!(next.products[0].stock, old_stock - 2);
        assert_eq!(next.orders.len(), 1);
        assert_eq!(next.orders[0], order);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_price, 2 * u64::from(document.products[0].price));
        assert_eq!(order.product_name, "Premium Subscription");
        assert_eq!(order.user_name, "Rahim");
        assert!(order.rejection_reason.is_none());
    }

    #[test]
    fn place_order__should_prepend_newest_order_first() {
        // Given
        let (document, user) = registered_document();
        let (document, _first) = place_order(
            &document,
            &user,
            "ORD-FIRST1".to_string(),
            order_request("1", 1),
            test_now(),
        )
        .expect("first order");

        // When
        let (document, _second) = place_order(
            &document,
            &user,
            "ORD-SECOND".to_string(),
            order_request("2", 1),
            test_now(),
        )
        .expect("second order");

        // Then
        assert_eq!(document.orders[0].id, "ORD-SECOND");
        assert_eq!(document.orders[1].id, "ORD-FIRST1");
    }

    #[test]
    fn place_order__should_reject_quantity_above_stock_and_leave_document_unchanged() {
        // Given
        let (document, user) = registered_document();
        let stock = document.products[2].stock;

        // When
        let result = place_order(
            &document,
            &user,
            "ORD-AB12CD".to_string(),
            order_request("3", stock + 1),
            test_now(),
        );

        // Then
        assert_eq!(result.unwrap_err(), PlaceOrderError::InsufficientStock);
        assert!(document.orders.is_empty());
        assert_eq!(document.products[2].stock, stock);
    }

    #[test]
    fn place_order__should_allow_ordering_the_entire_stock() {
        // Given
        let (document, user) = registered_document();
        let stock = document.products[2].stock;

        // When
        let (next, _order) = place_order(
            &document,
            &user,
            "ORD-AB12CD".to_string(),
            order_request("3", stock),
            test_now(),
        )
        .expect("place order");

        // Then
        assert_eq!(next.products[2].stock, 0);
    }

    #[test]
    fn place_order__should_reject_unknown_product() {
        // Given
        let (document, user) = registered_document();

        // When
        let result = place_order(
            &document,
            &user,
            "ORD-AB12CD".to_string(),
            order_request("missing", 1),
            test_now(),
        );

        // Then
        assert_eq!(result.unwrap_err(), PlaceOrderError::UnknownProduct);
    }

    #[test]
    fn update_order_status__should_store_rejection_reason_and_leave_other_orders_alone() {
        // Given
        let (document, user) = registered_document();
        let (document, _order) = place_order(
            &document,
            &user,
            "ORD-FIRST1".to_string(),
            order_request("1", 1),
            test_now(),
        )
        .expect("first order");
        let (document, _order) = place_order(
            &document,
            &user,
            "ORD-SECOND".to_string(),
            order_request("2", 1),
            test_now(),
        )
        .expect("second order");

        // When
        let next = update_order_status(
            &document,
            "ORD-FIRST1",
            OrderStatus::Rejected,
            Some("Invalid transaction id".to_string()),
        );

        // Then
        let rejected = next.orders.iter().find(|o| o.id == "ORD-FIRST1").expect("order");
        assert_eq!(rejected.status, OrderStatus::Rejected);
        assert_eq!(
            rejected.rejection_reason.as_deref(),
            Some("Invalid transaction id")
        );
        let untouched = next.orders.iter().find(|o| o.id == "ORD-SECOND").expect("order");
        assert_eq!(untouched.status, OrderStatus::Pending);
        assert!(untouched.rejection_reason.is_none());
    }

    #[test]
    fn update_order_status__should_clear_reason_when_none_is_given() {
        // Given
        let (document, user) = registered_document();
        let (document, order) = place_order(
            &document,
            &user,
            "ORD-AB12CD".to_string(),
            order_request("1", 1),
            test_now(),
        )
        .expect("place order");
        let document = update_order_status(
            &document,
            &order.id,
            OrderStatus::Rejected,
            Some("reason".to_string()),
        );

        // When
        let next = update_order_status(&document, &order.id, OrderStatus::Approved, None);

        // Then
        assert_eq!(next.orders[0].status, OrderStatus::Approved);
        assert!(next.orders[0].rejection_reason.is_none());
    }

    #[test]
    fn save_product__should_append_with_generated_id() {
        // Given
        let document = default_document();

        // When
        let next = save_product(
            &document,
            None,
            "p1a2b3c4d".to_string(),
            ProductFields {
                name: "Starter Pack".to_string(),
                description: "A starter pack.".to_string(),
                price: 100,
                duration: "3 Days".to_string(),
                stock: 10,
                image: "https://example.com/starter.png".to_string(),
            },
        );

        // Then
        assert_eq!(next.products.len(), 4);
        let added = &next.products[3];
        assert_eq!(added.id, "p1a2b3c4d");
        assert_eq!(added.image, "https://example.com/starter.png");
    }

    #[test]
    fn save_product__should_replace_in_place_and_preserve_identity() {
        // Given
        let document = default_document();

        // When
        let next = save_product(
            &document,
            Some("2"),
            "ignored-id".to_string(),
            ProductFields {
                name: "Basic Plan v2".to_string(),
                description: "Updated.".to_string(),
                price: 250,
                duration: "7 Days".to_string(),
                stock: 80,
                image: "https://example.com/basic.png".to_string(),
            },
        );

        // Then
        assert_eq!(next.products.len(), 3);
        assert_eq!(next.products[1].id, "2");
        assert_eq!(next.products[1].name, "Basic Plan v2");
        assert_eq!(next.products[1].price, 250);
    }

    #[test]
    fn save_product__should_fall_back_to_placeholder_image_when_blank() {
        // Given
        let document = default_document();

        // When
        let next = save_product(
            &document,
            None,
            "p1a2b3c4d".to_string(),
            ProductFields {
                name: "Starter Pack".to_string(),
                description: "A starter pack.".to_string(),
                price: 100,
                duration: "3 Days".to_string(),
                stock: 10,
                image: "  ".to_string(),
            },
        );

        // Then
        assert_eq!(
            next.products[3].image,
            "https://api.dicebear.com/7.x/shapes/svg?seed=p1a2b3c4d"
        );
    }

    #[test]
    fn delete_product__should_remove_unconditionally() {
        // Given
        let document = default_document();

        // When
        let next = delete_product(&document, "2");

        // Then
        assert_eq!(next.products.len(), 2);
        assert!(next.products.iter().all(|product| product.id != "2"));
    }

    #[test]
    fn append_message__should_create_thread_lazily_with_denormalized_user() {
        // Given
        let (document, user) = registered_document();

        // When
        let next = append_message(
            &document,
            &user.id,
            ChatRole::User,
            "hello",
            "m1".to_string(),
            "c1".to_string(),
            test_now(),
        );

        // Then
        assert_eq!(next.chats.len(), 1);
        let chat = &next.chats[0];
        assert_eq!(chat.id, "c1");
        assert_eq!(chat.user_name, "Rahim");
        assert_eq!(chat.user_email, "rahim@example.com");
        assert_eq!(chat.status, ChatStatus::Open);
        assert_eq!(chat.messages.len(), 1);
        assert_eq!(chat.last_message_at, test_now());
    }

    #[test]
    fn append_message__should_fall_back_to_unknown_for_missing_user() {
        // Given
        let document = default_document();

        // When
        let next = append_message(
            &document,
            "ghost",
            ChatRole::User,
            "hello",
            "m1".to_string(),
            "c1".to_string(),
            test_now(),
        );

        // Then
        assert_eq!(next.chats[0].user_name, "Unknown");
        assert_eq!(next.chats[0].user_email, "Unknown");
    }

    #[test]
    fn append_message__should_reopen_resolved_thread_on_customer_message() {
        // Given
        let (document, user) = registered_document();
        let document = append_message(
            &document,
            &user.id,
            ChatRole::User,
            "hello",
            "m1".to_string(),
            "c1".to_string(),
            test_now(),
        );
        let document = resolve_chat(&document, "c1");
        assert_eq!(document.chats[0].status, ChatStatus::Resolved);

        // When
        let later = test_now() + time::Duration::minutes(5);
        let next = append_message(
            &document,
            &user.id,
            ChatRole::User,
            "are you there?",
            "m2".to_string(),
            "unused".to_string(),
            later,
        );

        // Then
        assert_eq!(next.chats.len(), 1);
        assert_eq!(next.chats[0].status, ChatStatus::Open);
        assert_eq!(next.chats[0].messages.len(), 2);
        assert_eq!(next.chats[0].last_message_at, later);
    }

    #[test]
    fn append_message__should_not_reopen_resolved_thread_on_staff_or_bot_message() {
        // Given
        let (document, user) = registered_document();
        let document = append_message(
            &document,
            &user.id,
            ChatRole::User,
            "hello",
            "m1".to_string(),
            "c1".to_string(),
            test_now(),
        );
        let document = resolve_chat(&document, "c1");

        // When
        let after_admin = append_message(
            &document,
            &user.id,
            ChatRole::Admin,
            "resolved, closing",
            "m2".to_string(),
            "unused".to_string(),
            test_now(),
        );
        let after_bot = append_message(
            &after_admin,
            &user.id,
            ChatRole::Bot,
            "forwarded",
            "m3".to_string(),
            "unused".to_string(),
            test_now(),
        );

        // Then
        assert_eq!(after_admin.chats[0].status, ChatStatus::Resolved);
        assert_eq!(after_bot.chats[0].status, ChatStatus::Resolved);
        assert_eq!(after_bot.chats[0].messages.len(), 3);
    }

    #[test]
    fn save_settings__should_replace_the_singleton() {
        // Given
        let document = default_document();
        let settings = Settings {
            notice: "Maintenance tonight".to_string(),
            bkash: "01911111111".to_string(),
            nagad: "01611111111".to_string(),
            whatsapp: "8801911111111".to_string(),
            admin_password: "new-password".to_string(),
            is_maintenance: true,
        };

        // When
        let next = save_settings(&document, settings.clone());

        // Then
        assert_eq!(next.settings, settings);
        assert!(!document.settings.is_maintenance);
    }
}
