use async_trait::async_trait;
use chrono::Utc;
use surety_core::{EventEnvelope, EventStore, EventStream, LedgerEvent};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryEventStore {
    log: RwLock<Vec<EventEnvelope>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: LedgerEvent) -> anyhow::Result<EventEnvelope> {
        let mut log = self.log.write().await;

        let envelope = EventEnvelope {
            sequence: log.len() as u64 + 1,
            stream: event.stream(),
            event,
            stored_at: Utc::now(),
        };
        log.push(envelope.clone());

        Ok(envelope)
    }

    async fn since(&self, after: u64, limit: usize) -> anyhow::Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        // Sequences are dense and start at 1, so `after` is also the slice offset.
        let start = usize::try_from(after).unwrap_or(usize::MAX).min(log.len());
        Ok(log[start..].iter().take(limit).cloned().collect())
    }

    async fn stream(&self, stream: EventStream) -> anyhow::Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        Ok(log
            .iter()
            .filter(|envelope| envelope.stream == stream)
            .cloned()
            .collect())
    }

    async fn latest_sequence(&self) -> anyhow::Result<u64> {
        Ok(self.log.read().await.len() as u64)
    }
}
