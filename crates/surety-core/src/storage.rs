use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::{EventStream, LedgerEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub sequence: u64,
    pub stream: EventStream,
    pub event: LedgerEvent,
    pub stored_at: DateTime<Utc>,
}

/// Durable log of ledger events for off-ledger observers.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append(&self, event: LedgerEvent) -> anyhow::Result<EventEnvelope>;

    /// Events with a sequence strictly greater than `after`, oldest first.
    async fn since(&self, after: u64, limit: usize) -> anyhow::Result<Vec<EventEnvelope>>;

    async fn stream(&self, stream: EventStream) -> anyhow::Result<Vec<EventEnvelope>>;

    async fn latest_sequence(&self) -> anyhow::Result<u64>;
}
