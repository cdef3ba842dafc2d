use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::watch;

use crate::types::AppDocument;

pub trait TimeProvider: Clone + Send + Sync + 'static {
    type Sleep<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime;
    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a>;
}

/// The shared document lives behind this port. Writes always replace the
/// whole document; subscribers receive every new version, including the
/// echo of their own writes.
pub trait DocumentStore: Clone + Send + Sync + 'static {
    type Error: std::fmt::Display + Send + Sync + 'static;

    fn write_all(&self, document: &AppDocument) -> Result<(), Self::Error>;
    fn subscribe(&self) -> watch::Receiver<AppDocument>;
}
