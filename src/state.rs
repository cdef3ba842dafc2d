use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::adapters::{JsonFileStore, TokioTimeProvider};
use crate::bot;
use crate::config::AppConfig;
use crate::ports::DocumentStore;
use crate::session::SessionState;
use crate::types::AppDocument;

/// Shared application state: the config, the session signer, the document
/// store, and the in-memory mirror of the shared document. The mirror is
/// disposable; the store holds the only durable copy.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub(crate) session: SessionState,
    pub(crate) store: JsonFileStore,
    pub(crate) mirror: Arc<Mutex<AppDocument>>,
    pub(crate) bot: bot::BotScheduler<TokioTimeProvider, JsonFileStore>,
    pub(crate) bot_handles: Arc<Mutex<Vec<bot::BotReplyHandle>>>,
}

impl AppState {
    pub(crate) fn snapshot(&self) -> AppDocument {
        self.mirror.lock().expect("document mirror lock").clone()
    }

    /// Optimistic mutation path: apply the pure operation to the mirror,
    /// swap the result in, then write the whole document back. A failed
    /// write-back is logged and dropped; the mirror keeps the optimistic
    /// state until the next subscription echo reconciles it.
    pub(crate) fn apply<F, V, E>(&self, mutate: F) -> Result<V, E>
    where
        F: FnOnce(&AppDocument) -> Result<(AppDocument, V), E>,
    {
        let (document, value) = {
            let mut mirror = self.mirror.lock().expect("document mirror lock");
            let (next, value) = mutate(&mirror)?;
            *mirror = next.clone();
            (next, value)
        };
        if let Err(err) = self.store.write_all(&document) {
            eprintln!("document write-back failed: {err}");
        }
        Ok(value)
    }

    /// `apply` for operations that cannot fail.
    pub(crate) fn apply_infallible<F>(&self, mutate: F)
    where
        F: FnOnce(&AppDocument) -> AppDocument,
    {
        let _: Result<(), std::convert::Infallible> =
            self.apply(|document| Ok((mutate(document), ())));
    }
}

/// Keeps the mirror in sync with the store's subscription feed. Every write
/// echoes back here, including this process's own; last writer wins.
pub(crate) fn spawn_mirror_sync<S: DocumentStore>(
    store: &S,
    mirror: Arc<Mutex<AppDocument>>,
) -> JoinHandle<()> {
    let mut receiver = store.subscribe();
    tokio::spawn(async move {
        while receiver.changed().await.is_ok() {
            let document = receiver.borrow_and_update().clone();
            *mirror.lock().expect("document mirror lock") = document;
        }
    })
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::document::default_document;
    use crate::ops;
    use std::path::{Path, PathBuf};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    fn create_temp_data(test_name: &str) -> PathBuf {
        let mut root = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        root.push(format!("subshop-{}-{}", test_name, nanos));
        std::fs::create_dir_all(&root).expect("create temp dir");
        root.push("data.json");
        root
    }

    fn cleanup(path: &Path) {
        let dir = path.parent().expect("temp parent");
        std::fs::remove_dir_all(dir).expect("cleanup");
    }

    fn test_state(path: PathBuf) -> AppState {
        let config = AppConfig {
            data_path: path.clone(),
            ..AppConfig::default()
        };
        let session = SessionState::from_config(&config).expect("session state");
        let (store, document) = JsonFileStore::open(path).expect("open store");
        let mirror = Arc::new(Mutex::new(document));
        let bot = bot::BotScheduler::new(
            TokioTimeProvider,
            store.clone(),
            Arc::clone(&mirror),
            config.bot_reply_delay,
        );
        AppState {
            config,
            session,
            store,
            mirror,
            bot,
            bot_handles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[tokio::test]
    async fn apply__should_swap_mirror_and_persist_document() {
        // Given
        let path = create_temp_data("apply-persist");
        let state = test_state(path.clone());
        let now = OffsetDateTime::parse("2026-01-05T10:00:00Z", &Rfc3339).expect("parse now");

        // When
        let user = state
            .apply(|document| {
                ops::register(
                    document,
                    "u1a2b3c4d".to_string(),
                    "Rahim",
                    "rahim@example.com",
                    "secret",
                    now,
                )
            })
            .expect("register");

        // Then
        assert_eq!(state.snapshot().users, vec![user]);
        let written = std::fs::read_to_string(&path).expect("read file");
        let reparsed: AppDocument = serde_json::from_str(&written).expect("parse file");
        assert_eq!(reparsed, state.snapshot());

        cleanup(&path);
    }

    #[tokio::test]
    async fn apply__should_leave_mirror_untouched_on_operation_error() {
        // Given
        let path = create_temp_data("apply-error");
        let state = test_state(path.clone());
        let before = state.snapshot();

        // When
        let result: Result<(), ops::PlaceOrderError> =
            state.apply(|_| Err(ops::PlaceOrderError::InsufficientStock));

        // Then
        assert!(result.is_err());
        assert_eq!(state.snapshot(), before);

        cleanup(&path);
    }

    #[tokio::test]
    async fn spawn_mirror_sync__should_apply_subscription_echo_to_mirror() {
        // Given
        let path = create_temp_data("mirror-sync");
        let (store, document) = JsonFileStore::open(path.clone()).expect("open store");
        let mirror = Arc::new(Mutex::new(document));
        let _task = spawn_mirror_sync(&store, Arc::clone(&mirror));

        let mut next = default_document();
        next.products.clear();

        // When
        store.write_all(&next).expect("write document");
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        // Then
        assert_eq!(mirror.lock().expect("mirror lock").products.len(), 0);

        cleanup(&path);
    }
}
