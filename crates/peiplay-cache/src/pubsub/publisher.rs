//! Redis Pub/Sub publisher.
//!
//! Services publish after their database work has committed. Delivery is best
//! effort: a failed publish is logged by the caller and never rolls anything
//! back.

use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use peiplay_core::DomainEvent;

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;

/// Envelope for every published message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubEvent {
    /// e.g. "BOOKING_CREATED", "MESSAGE_CREATE"
    pub event_type: String,
    pub data: serde_json::Value,
}

impl PubSubEvent {
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    pub fn from_domain(event: &DomainEvent) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event.event_type(), serde_json::to_value(event)?))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish to one channel; returns the number of receivers
    pub async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> RedisResult<u32> {
        self.publish_many(std::slice::from_ref(channel), event).await
    }

    /// Publish the same payload to several channels over one connection
    pub async fn publish_many(
        &self,
        channels: &[PubSubChannel],
        event: &PubSubEvent,
    ) -> RedisResult<u32> {
        if channels.is_empty() {
            return Ok(0);
        }

        let payload = event.to_json()?;
        let mut conn = self.pool.get().await?;
        let mut receivers = 0;
        for channel in channels {
            let n: u32 = conn.publish(channel.name(), &payload).await?;
            receivers += n;
        }

        tracing::debug!(
            channels = channels.len(),
            event_type = %event.event_type,
            receivers,
            "Published event"
        );

        Ok(receivers)
    }

    pub async fn publish_domain_event(
        &self,
        channels: &[PubSubChannel],
        event: &DomainEvent,
    ) -> RedisResult<u32> {
        let event = PubSubEvent::from_domain(event)?;
        self.publish_many(channels, &event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use peiplay_core::events::BookingCreatedEvent;
    use peiplay_core::Snowflake;

    #[test]
    fn test_event_from_domain() {
        let event = DomainEvent::BookingCreated(BookingCreatedEvent {
            booking_id: Snowflake::new(1),
            partner_id: Snowflake::new(2),
            customer_id: Snowflake::new(3),
            timestamp: Utc::now(),
        });

        let wrapped = PubSubEvent::from_domain(&event).unwrap();
        assert_eq!(wrapped.event_type, "BOOKING_CREATED");
        assert_eq!(wrapped.data["booking_id"], "1");

        let json = wrapped.to_json().unwrap();
        let parsed: PubSubEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_type, "BOOKING_CREATED");
    }
}
