use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::watch;

use crate::document;
use crate::ports;
use crate::types::AppDocument;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "document file error: {err}"),
            StoreError::Serialize(err) => write!(f, "document serialization error: {err}"),
        }
    }
}

/// Stand-in for the remote real-time store: one JSON file holding the whole
/// document, plus a broadcast channel that echoes every write back to all
/// subscribers. Serde maps absent optional fields to `null`, which is the
/// placeholder the remote store requires instead of `undefined`.
#[derive(Clone)]
pub struct JsonFileStore {
    path: Arc<PathBuf>,
    sender: Arc<watch::Sender<AppDocument>>,
}

impl JsonFileStore {
    /// Opens the document file, seeding it with the default document when it
    /// is missing or empty. Returns the store and the initial document.
    pub fn open(path: PathBuf) -> Result<(Self, AppDocument), StoreError> {
        let document = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().any(|b| !b.is_ascii_whitespace()) => {
                serde_json::from_slice(&bytes).map_err(StoreError::Serialize)?
            }
            Ok(_) => seed_document(&path)?,
            Err(err) if err.kind() == ErrorKind::NotFound => seed_document(&path)?,
            Err(err) => return Err(StoreError::Io(err)),
        };

        let (sender, _) = watch::channel(document.clone());
        Ok((
            Self {
                path: Arc::new(path),
                sender: Arc::new(sender),
            },
            document,
        ))
    }
}

fn seed_document(path: &Path) -> Result<AppDocument, StoreError> {
    let document = document::default_document();
    write_document(path, &document)?;
    Ok(document)
}

fn write_document(path: &Path, document: &AppDocument) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(document).map_err(StoreError::Serialize)?;
    std::fs::write(path, json).map_err(StoreError::Io)
}

impl ports::DocumentStore for JsonFileStore {
    type Error = StoreError;

    fn write_all(&self, document: &AppDocument) -> Result<(), StoreError> {
        write_document(&self.path, document)?;
        self.sender.send_replace(document.clone());
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<AppDocument> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::ports::DocumentStore;
    use crate::types::{ChatStatus, SupportChat};
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

    #[test]
    fn open__should_seed_default_document_when_file_missing() {
        // Given
        let path = create_temp_data("seed-missing");

        // When
        let (_store, document) = JsonFileStore::open(path.clone()).expect("open store");

        // Then
        assert_eq!(document, document::default_document());
        let written = std::fs::read_to_string(&path).expect("read seeded file");
        let reparsed: AppDocument = serde_json::from_str(&written).expect("parse seeded file");
        assert_eq!(reparsed, document);

        cleanup(&path);
    }

    #[test]
    fn open__should_seed_default_document_when_file_empty() {
        // Given
        let path = create_temp_data("seed-empty");
        std::fs::write(&path, "").expect("write empty file");

        // When
        let (_store, document) = JsonFileStore::open(path.clone()).expect("open store");

        // Then
        assert_eq!(document.products.len(), 3);

        cleanup(&path);
    }

    #[test]
    fn open__should_load_existing_document_without_reseeding() {
        // Given
        let path = create_temp_data("load-existing");
        let mut existing = document::default_document();
        existing.products.clear();
        let json = serde_json::to_string(&existing).expect("serialize");
        std::fs::write(&path, json).expect("write existing file");

        // When
        let (_store, document) = JsonFileStore::open(path.clone()).expect("open store");

        // Then
        assert!(document.products.is_empty());

        cleanup(&path);
    }

    #[tokio::test]
    async fn write_all__should_echo_document_to_subscribers() {
        // Given
        let path = create_temp_data("echo");
        let (store, _document) = JsonFileStore::open(path.clone()).expect("open store");
        let mut receiver = store.subscribe();

        let mut next = document::default_document();
        next.chats.push(SupportChat {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            user_name: "Rahim".to_string(),
            user_email: "rahim@example.com".to_string(),
            messages: Vec::new(),
            last_message_at: OffsetDateTime::parse("2026-01-05T10:00:00Z", &Rfc3339)
                .expect("parse"),
            status: ChatStatus::Open,
        });

        // When
        store.write_all(&next).expect("write document");

        // Then
        receiver.changed().await.expect("subscription change");
        let echoed = receiver.borrow_and_update().clone();
        assert_eq!(echoed, next);

        cleanup(&path);
    }

    #[test]
    fn write_all__should_round_trip_through_the_file() {
        // Given
        let path = create_temp_data("round-trip");
        let (store, document) = JsonFileStore::open(path.clone()).expect("open store");

        // When
        store.write_all(&document).expect("write document");

        // Then
        let written = std::fs::read_to_string(&path).expect("read file");
        let reparsed: AppDocument = serde_json::from_str(&written).expect("parse file");
        assert_eq!(reparsed, document);

        cleanup(&path);
    }
}
