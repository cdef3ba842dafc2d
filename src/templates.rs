use askama::Template;
use askama_web::WebTemplate;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub(crate) fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| timestamp.to_string())
}

pub(crate) struct ProductCard {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) price: u32,
    pub(crate) duration: String,
    pub(crate) stock: u32,
    pub(crate) image: String,
}

pub(crate) struct OrderRow {
    pub(crate) id: String,
    pub(crate) user_name: String,
    pub(crate) user_email: String,
    pub(crate) product_name: String,
    pub(crate) quantity: u32,
    pub(crate) total_price: u64,
    pub(crate) payment_method: String,
    pub(crate) sender_number: String,
    pub(crate) trx_id: String,
    pub(crate) status: String,
    /// Empty unless the order was rejected with a reason.
    pub(crate) rejection_reason: String,
    pub(crate) order_date: String,
}

pub(crate) struct MessageRow {
    pub(crate) role: String,
    pub(crate) text: String,
    pub(crate) timestamp: String,
}

pub(crate) struct ChatRow {
    pub(crate) id: String,
    pub(crate) user_name: String,
    pub(crate) status: String,
    pub(crate) last_message_at: String,
    pub(crate) preview: String,
}

pub(crate) struct UserRow {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) register_date: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub(crate) struct HomeTemplate {
    pub(crate) app_name: String,
    pub(crate) notice: String,
    pub(crate) products: Vec<ProductCard>,
    pub(crate) logged_in: bool,
    pub(crate) user_name: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "maintenance.html")]
pub(crate) struct MaintenanceTemplate {
    pub(crate) app_name: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub(crate) struct LoginTemplate {
    pub(crate) app_name: String,
    pub(crate) error: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub(crate) struct RegisterTemplate {
    pub(crate) app_name: String,
    pub(crate) error: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_login.html")]
pub(crate) struct AdminLoginTemplate {
    pub(crate) app_name: String,
    pub(crate) error: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "order_form.html")]
pub(crate) struct OrderFormTemplate {
    pub(crate) app_name: String,
    pub(crate) product: ProductCard,
    pub(crate) bkash: String,
    pub(crate) nagad: String,
    pub(crate) whatsapp_link: String,
    pub(crate) error: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "my_orders.html")]
pub(crate) struct MyOrdersTemplate {
    pub(crate) app_name: String,
    pub(crate) orders: Vec<OrderRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub(crate) struct ProfileTemplate {
    pub(crate) app_name: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) register_date: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "chat.html")]
pub(crate) struct ChatTemplate {
    pub(crate) app_name: String,
    pub(crate) messages: Vec<MessageRow>,
    pub(crate) status: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_dashboard.html")]
pub(crate) struct AdminDashboardTemplate {
    pub(crate) app_name: String,
    pub(crate) pending_count: usize,
    pub(crate) approved_count: usize,
    pub(crate) completed_count: usize,
    pub(crate) user_count: usize,
    pub(crate) recent_orders: Vec<OrderRow>,
    pub(crate) recent_chats: Vec<ChatRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_orders.html")]
pub(crate) struct AdminOrdersTemplate {
    pub(crate) app_name: String,
    pub(crate) orders: Vec<OrderRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_users.html")]
pub(crate) struct AdminUsersTemplate {
    pub(crate) app_name: String,
    pub(crate) users: Vec<UserRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_products.html")]
pub(crate) struct AdminProductsTemplate {
    pub(crate) app_name: String,
    pub(crate) products: Vec<ProductCard>,
}

#[derive(Template, WebTemplate)]
#[template(path = "product_form.html")]
pub(crate) struct ProductFormTemplate {
    pub(crate) app_name: String,
    pub(crate) heading: String,
    pub(crate) action: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) price: String,
    pub(crate) duration: String,
    pub(crate) stock: String,
    pub(crate) image: String,
    pub(crate) error: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_chats.html")]
pub(crate) struct AdminChatsTemplate {
    pub(crate) app_name: String,
    pub(crate) chats: Vec<ChatRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_chat.html")]
pub(crate) struct AdminChatTemplate {
    pub(crate) app_name: String,
    pub(crate) chat_id: String,
    pub(crate) user_name: String,
    pub(crate) user_email: String,
    pub(crate) status: String,
    pub(crate) messages: Vec<MessageRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin_settings.html")]
pub(crate) struct AdminSettingsTemplate {
    pub(crate) app_name: String,
    pub(crate) notice: String,
    pub(crate) bkash: String,
    pub(crate) nagad: String,
    pub(crate) whatsapp: String,
    pub(crate) admin_password: String,
    pub(crate) is_maintenance: bool,
    pub(crate) saved: bool,
}
