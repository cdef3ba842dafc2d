use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
    /// Path of the shared document JSON file.
    pub data_path: PathBuf,
    pub app_name: String,
    pub session: SessionConfig,
    /// Delay before the canned bot reply is appended to a chat.
    pub bot_reply_delay: Duration,
}

#[derive(Clone)]
pub struct SessionConfig {
    /// Base64-encoded HMAC key for the session cookies.
    pub key: String,
    pub token_ttl: time::Duration,
    pub cookie_secure: bool,
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: "subshop-data.json".into(),
            app_name: "SubShop".to_string(),
            session: SessionConfig {
                key: "dGVzdC1zZXNzaW9uLWtleQ".to_string(),
                token_ttl: time::Duration::days(1),
                cookie_secure: false,
            },
            bot_reply_delay: Duration::ZERO,
        }
    }
}
