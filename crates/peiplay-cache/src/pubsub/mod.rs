//! Redis Pub/Sub publishing for real-time client updates.

mod channels;
mod publisher;

pub use channels::{
    PubSubChannel, ADMIN_CHANNEL, BROADCAST_CHANNEL, ROOM_CHANNEL_PREFIX, USER_CHANNEL_PREFIX,
};
pub use publisher::{PubSubEvent, Publisher};
