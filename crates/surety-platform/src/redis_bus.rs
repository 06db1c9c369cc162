use anyhow::{Context, Result};
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use surety_core::{EventEnvelope, EventStream};

/// Channel carrying every ledger event; each stream also gets `surety.events.<stream>`.
pub const EVENTS_CHANNEL: &str = "surety.events";

/// Fan-out of ledger events to off-ledger subscribers such as oracle agents.
/// Clones share one multiplexed connection that reconnects on its own.
#[derive(Clone)]
pub struct RedisBus {
    connection: ConnectionManager,
}

impl RedisBus {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).context("invalid REDIS_URL")?;
        let connection = ConnectionManager::new(client)
            .await
            .context("redis connection failed")?;
        Ok(Self { connection })
    }

    pub fn stream_channel(stream: EventStream) -> String {
        format!("{EVENTS_CHANNEL}.{}", stream.as_str())
    }

    pub async fn publish_event(&self, envelope: &EventEnvelope) -> Result<()> {
        let mut connection = self.connection.clone();
        let serialized = serde_json::to_string(envelope)?;

        let _: i64 = connection.publish(EVENTS_CHANNEL, &serialized).await?;
        let _: i64 = connection
            .publish(Self::stream_channel(envelope.stream), &serialized)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_channels_extend_the_base_channel() {
        assert_eq!(
            RedisBus::stream_channel(EventStream::Oracles),
            "surety.events.oracles"
        );
    }

    #[tokio::test]
    async fn rejects_malformed_url() {
        let err = RedisBus::connect("not a url").await.err().unwrap();
        assert!(err.to_string().contains("REDIS_URL"));
    }
}
