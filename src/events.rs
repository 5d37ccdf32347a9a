//! Per-session notification channel for background indexing runs.
//!
//! Every session gets its own broadcast topic carrying exactly three event
//! kinds: `progress`, `completed` and `failed`.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::index::KeywordIndex;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IndexingEvent {
    Progress {
        current_page: usize,
        total_pages: usize,
        percentage: u8,
    },
    Completed {
        keywords: KeywordIndex,
        keyword_count: usize,
    },
    Failed {
        error_message: String,
    },
}

impl IndexingEvent {
    pub fn progress(current_page: usize, total_pages: usize) -> Self {
        let percentage = if total_pages == 0 {
            0
        } else {
            (current_page as f64 / total_pages as f64 * 100.0).round() as u8
        };

        Self::Progress {
            current_page,
            total_pages,
            percentage,
        }
    }

    pub fn completed(keywords: KeywordIndex) -> Self {
        let keyword_count = keywords.len();
        Self::Completed {
            keywords,
            keyword_count,
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Self::Failed {
            error_message: error_message.into(),
        }
    }

    /// `completed` and `failed` end a session's stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Broadcast hub addressed by session id.
#[derive(Debug, Default)]
pub struct Notifier {
    topics: DashMap<Uuid, broadcast::Sender<IndexingEvent>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a session's events. Subscribe before the job starts to
    /// see every event.
    ///
    /// Creates the topic if it doesn't exist yet, so whoever subscribes is
    /// responsible for the matching [`close`](Notifier::close).
    pub fn subscribe(&self, session_id: Uuid) -> broadcast::Receiver<IndexingEvent> {
        self.topics
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publishes an event; a session with no subscribers drops it.
    pub fn publish(&self, session_id: Uuid, event: IndexingEvent) {
        tracing::debug!(%session_id, event = event.name(), "publishing event");

        if let Some(sender) = self.topics.get(&session_id) {
            // Err only means nobody is listening right now.
            let _ = sender.send(event);
        }
    }

    /// Drops the session's topic; receivers see the channel close once drained.
    pub fn close(&self, session_id: Uuid) {
        self.topics.remove(&session_id);
    }
}

/// Next event on a session stream, or `None` once the topic is closed.
///
/// A receiver that fell more than the channel capacity behind loses the
/// oldest events but keeps reading, so the terminal event still arrives.
pub async fn next_event(rx: &mut broadcast::Receiver<IndexingEvent>) -> Option<IndexingEvent> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event subscriber lagged behind, oldest events dropped");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        assert_eq!(
            IndexingEvent::progress(1, 3),
            IndexingEvent::Progress {
                current_page: 1,
                total_pages: 3,
                percentage: 33
            }
        );
        assert!(matches!(IndexingEvent::progress(2, 3), IndexingEvent::Progress { percentage: 67, .. }));
        assert!(matches!(IndexingEvent::progress(1, 8), IndexingEvent::Progress { percentage: 13, .. }));
        assert!(matches!(IndexingEvent::progress(4, 4), IndexingEvent::Progress { percentage: 100, .. }));
    }

    #[test]
    fn test_event_wire_shapes() {
        let progress = serde_json::to_value(IndexingEvent::progress(1, 2)).unwrap();
        assert_eq!(
            progress,
            serde_json::json!({"event": "progress", "current_page": 1, "total_pages": 2, "percentage": 50})
        );

        let completed = serde_json::to_value(IndexingEvent::completed(KeywordIndex::default())).unwrap();
        assert_eq!(
            completed,
            serde_json::json!({"event": "completed", "keywords": {}, "keyword_count": 0})
        );

        let failed = serde_json::to_value(IndexingEvent::failed("boom")).unwrap();
        assert_eq!(failed, serde_json::json!({"event": "failed", "error_message": "boom"}));
    }

    #[test]
    fn test_is_terminal() {
        assert!(!IndexingEvent::progress(1, 1).is_terminal());
        assert!(IndexingEvent::failed("x").is_terminal());
        assert!(IndexingEvent::completed(KeywordIndex::default()).is_terminal());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let notifier = Notifier::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut rx_a = notifier.subscribe(a);
        let mut rx_b = notifier.subscribe(b);

        notifier.publish(a, IndexingEvent::failed("only a"));
        notifier.publish(b, IndexingEvent::progress(1, 1));

        assert_eq!(rx_a.recv().await.unwrap(), IndexingEvent::failed("only a"));
        assert_eq!(rx_b.recv().await.unwrap(), IndexingEvent::progress(1, 1));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let notifier = Notifier::new();
        notifier.publish(Uuid::new_v4(), IndexingEvent::failed("nobody listens"));
    }

    #[tokio::test]
    async fn test_close_ends_stream() {
        let notifier = Notifier::new();
        let id = Uuid::new_v4();
        let mut rx = notifier.subscribe(id);

        notifier.publish(id, IndexingEvent::progress(1, 2));
        notifier.close(id);

        assert!(rx.recv().await.is_ok());
        assert!(rx.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_still_sees_terminal_event() {
        let notifier = Notifier::new();
        let id = Uuid::new_v4();
        let mut rx = notifier.subscribe(id);

        let total = CHANNEL_CAPACITY + 40;
        for page in 1..=total {
            notifier.publish(id, IndexingEvent::progress(page, total));
        }
        notifier.publish(id, IndexingEvent::completed(KeywordIndex::default()));
        notifier.close(id);

        let mut events = Vec::new();
        while let Some(event) = next_event(&mut rx).await {
            events.push(event);
        }

        assert_eq!(events.len(), CHANNEL_CAPACITY);
        assert_eq!(events.last(), Some(&IndexingEvent::completed(KeywordIndex::default())));
        assert_eq!(events[events.len() - 2], IndexingEvent::progress(total, total));
    }
}
