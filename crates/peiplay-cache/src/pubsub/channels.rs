//! Pub/Sub channel naming.

use peiplay_core::Snowflake;

pub const USER_CHANNEL_PREFIX: &str = "user:";
pub const ROOM_CHANNEL_PREFIX: &str = "room:";
/// Every connected administrator
pub const ADMIN_CHANNEL: &str = "admin";
/// Every connected client
pub const BROADCAST_CHANNEL: &str = "broadcast";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    /// All sessions of one user
    User(Snowflake),
    /// Members of one chat room
    Room(Snowflake),
    Admin,
    Broadcast,
}

impl PubSubChannel {
    #[must_use]
    pub fn user(user_id: Snowflake) -> Self {
        Self::User(user_id)
    }

    #[must_use]
    pub fn room(room_id: Snowflake) -> Self {
        Self::Room(room_id)
    }

    /// Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::User(id) => format!("{USER_CHANNEL_PREFIX}{id}"),
            Self::Room(id) => format!("{ROOM_CHANNEL_PREFIX}{id}"),
            Self::Admin => ADMIN_CHANNEL.to_string(),
            Self::Broadcast => BROADCAST_CHANNEL.to_string(),
        }
    }

    /// Inverse of [`name`](Self::name); `None` for channels we do not publish to
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            ADMIN_CHANNEL => return Some(Self::Admin),
            BROADCAST_CHANNEL => return Some(Self::Broadcast),
            _ => {}
        }

        let id = |rest: &str| rest.parse::<i64>().ok().map(Snowflake::new);
        if let Some(rest) = name.strip_prefix(USER_CHANNEL_PREFIX) {
            return id(rest).map(Self::User);
        }
        if let Some(rest) = name.strip_prefix(ROOM_CHANNEL_PREFIX) {
            return id(rest).map(Self::Room);
        }
        None
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        assert_eq!(PubSubChannel::user(Snowflake::new(42)).name(), "user:42");
        assert_eq!(PubSubChannel::room(Snowflake::new(7)).name(), "room:7");
        assert_eq!(PubSubChannel::Admin.name(), "admin");
        assert_eq!(PubSubChannel::Broadcast.to_string(), "broadcast");
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!(
            PubSubChannel::parse("room:99"),
            Some(PubSubChannel::Room(Snowflake::new(99)))
        );
        assert_eq!(PubSubChannel::parse("admin"), Some(PubSubChannel::Admin));
        assert_eq!(PubSubChannel::parse("user:abc"), None);
        assert_eq!(PubSubChannel::parse("lobby:1"), None);
    }
}
