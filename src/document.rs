use crate::types::{AppDocument, Product, Settings};

pub const DEFAULT_ADMIN_PASSWORD: &str = "subshop2026";
pub const DEFAULT_NOTICE: &str = "Welcome to SubShop! Check out our newest products.";

const PLACEHOLDER_IMAGE_BASE: &str = "https://api.dicebear.com/7.x/shapes/svg?seed=";

/// Placeholder art for products saved without an image URL.
pub fn placeholder_image(seed: &str) -> String {
    format!("{PLACEHOLDER_IMAGE_BASE}{seed}")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notice: DEFAULT_NOTICE.to_string(),
            bkash: "01700000000".to_string(),
            nagad: "01800000000".to_string(),
            whatsapp: "8801700000000".to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            is_maintenance: false,
        }
    }
}

/// The document a fresh (empty or missing) store is seeded with.
pub fn default_document() -> AppDocument {
    AppDocument {
        users: Vec::new(),
        orders: Vec::new(),
        products: vec![
            Product {
                id: "1".to_string(),
                name: "Premium Subscription".to_string(),
                description: "Full access to all premium features.".to_string(),
                price: 500,
                duration: "30 Days".to_string(),
                stock: 50,
                image: placeholder_image("premium"),
            },
            Product {
                id: "2".to_string(),
                name: "Basic Plan".to_string(),
                description: "Essential features for starters.".to_string(),
                price: 200,
                duration: "7 Days".to_string(),
                stock: 100,
                image: placeholder_image("basic"),
            },
            Product {
                id: "3".to_string(),
                name: "Ultimate Bundle".to_string(),
                description: "The complete package for power users.".to_string(),
                price: 1200,
                duration: "90 Days".to_string(),
                stock: 20,
                image: placeholder_image("ultimate"),
            },
        ],
        settings: Settings::default(),
        chats: Vec::new(),
    }
}
