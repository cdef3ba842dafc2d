//! Canned-response support bot: a deterministic keyword classifier plus the
//! one-shot deferred task that appends its reply after a fixed delay.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use time::OffsetDateTime;
use tokio::task::JoinHandle;

use crate::ops;
use crate::ports;
use crate::types::{AppDocument, ChatRole};

pub(crate) const GREETING_REPLY: &str =
    "Welcome to SubShop! How can I help you today?";
pub(crate) const ORDER_REPLY: &str =
    "To place an order, press the Buy button under a product. Your orders show up in the Orders tab.";
pub(crate) const PAYMENT_REPLY: &str =
    "We accept bKash and Nagad payments. You will see our payment numbers while placing an order.";
pub(crate) const STOCK_REPLY: &str =
    "Each product card shows the remaining stock. An out-of-stock product cannot be ordered.";
pub(crate) const FALLBACK_REPLY: &str =
    "Your message has been forwarded to our staff. Please wait a moment, a representative will contact you shortly.";

// Keyword groups in priority order; the first group with a hit wins.
const ORDER_KEYWORDS: &[&str] = &["order"];
const PAYMENT_KEYWORDS: &[&str] = &["payment", "bkash", "nagad"];
const STOCK_KEYWORDS: &[&str] = &["stock"];
const GREETING_KEYWORDS: &[&str] = &["hello", "hi", "salam"];

/// Maps a customer message to a canned reply. Stateless and deterministic.
pub fn reply(text: &str) -> &'static str {
    let text = text.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|keyword| text.contains(keyword));

    if matches(ORDER_KEYWORDS) {
        ORDER_REPLY
    } else if matches(PAYMENT_KEYWORDS) {
        PAYMENT_REPLY
    } else if matches(STOCK_KEYWORDS) {
        STOCK_REPLY
    } else if matches(GREETING_KEYWORDS) {
        GREETING_REPLY
    } else {
        FALLBACK_REPLY
    }
}

pub(crate) struct BotReplyHandle {
    pub(crate) user_id: String,
    pub(crate) scheduled_at: OffsetDateTime,
    handle: JoinHandle<()>,
}

impl BotReplyHandle {
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    #[cfg(test)]
    pub(crate) async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.handle.await
    }
}

/// Schedules the single deferred bot reply after a customer message. The
/// spawned task is fire-and-forget: it appends through the normal mutation
/// path even if the customer has navigated away, and nothing cancels it.
#[derive(Clone)]
pub(crate) struct BotScheduler<T, S> {
    time: T,
    store: S,
    mirror: Arc<Mutex<AppDocument>>,
    delay: Duration,
}

impl<T, S> BotScheduler<T, S>
where
    T: ports::TimeProvider,
    S: ports::DocumentStore,
{
    pub(crate) fn new(time: T, store: S, mirror: Arc<Mutex<AppDocument>>, delay: Duration) -> Self {
        Self {
            time,
            store,
            mirror,
            delay,
        }
    }

    pub(crate) fn schedule_reply(&self, user_id: String, text: &str) -> BotReplyHandle {
        let reply = reply(text);
        let time = self.time.clone();
        let store = self.store.clone();
        let mirror = Arc::clone(&self.mirror);
        let delay = self.delay;
        let scheduled_at = time.now();
        let task_user_id = user_id.clone();

        let handle = tokio::spawn(async move {
            time.sleep(delay).await;
            let next = {
                let mut mirror = mirror.lock().expect("document mirror lock");
                let next = ops::append_message(
                    &mirror,
                    &task_user_id,
                    ChatRole::Bot,
                    reply,
                    ops::entity_id(),
                    ops::entity_id(),
                    time.now(),
                );
                *mirror = next.clone();
                next
            };
            if let Err(err) = store.write_all(&next) {
                eprintln!("bot reply write-back failed: {err}");
            }
        });

        BotReplyHandle {
            user_id,
            scheduled_at,
            handle,
        }
    }
}
