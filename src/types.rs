use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Wire shape of the shared document. Field names stay camelCase so the
/// serialized form matches what existing deployments already hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDocument {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub chats: Vec<SupportChat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(with = "time::serde::rfc3339")]
    pub register_date: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Smallest currency unit.
    pub price: u32,
    pub duration: String,
    pub stock: u32,
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Approved,
    Completed,
    Rejected,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => f.write_str("Pending"),
            OrderStatus::Approved => f.write_str("Approved"),
            OrderStatus::Completed => f.write_str("Completed"),
            OrderStatus::Rejected => f.write_str("Rejected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "bKash")]
    Bkash,
    Nagad,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Bkash => f.write_str("bKash"),
            PaymentMethod::Nagad => f.write_str("Nagad"),
        }
    }
}

/// Orders snapshot the user profile and product price at creation time and
/// never dereference either afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: u32,
    pub total_price: u64,
    pub payment_method: PaymentMethod,
    pub sender_number: String,
    pub trx_id: String,
    pub whatsapp: String,
    pub status: OrderStatus,
    pub rejection_reason: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub order_date: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Customer.
    User,
    Admin,
    Bot,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::User => f.write_str("user"),
            ChatRole::Admin => f.write_str("admin"),
            ChatRole::Bot => f.write_str("bot"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatStatus {
    Open,
    Resolved,
}

impl std::fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatStatus::Open => f.write_str("Open"),
            ChatStatus::Resolved => f.write_str("Resolved"),
        }
    }
}

/// One thread per customer; messages are append-only and `last_message_at`
/// mirrors the newest message timestamp for sorting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportChat {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub messages: Vec<ChatMessage>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_message_at: OffsetDateTime,
    pub status: ChatStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub notice: String,
    pub bkash: String,
    pub nagad: String,
    pub whatsapp: String,
    pub admin_password: String,
    #[serde(default)]
    pub is_maintenance: bool,
}
