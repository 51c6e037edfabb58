//! User and customer entities

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Account role, re-read from storage on every privileged call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Customer,
    Partner,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Partner => "PARTNER",
            Self::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CUSTOMER" => Some(Self::Customer),
            "PARTNER" => Some(Self::Partner),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Marketplace account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Snowflake,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub is_suspended: bool,
    pub suspension_reason: Option<String>,
    pub suspension_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new customer account
    pub fn new(id: Snowflake, email: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            name,
            role: UserRole::Customer,
            email_verified: false,
            is_suspended: false,
            suspension_reason: None,
            suspension_ends_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// A suspension without an end date lasts until lifted
    pub fn is_suspended_at(&self, now: DateTime<Utc>) -> bool {
        self.is_suspended && self.suspension_ends_at.map_or(true, |ends| ends > now)
    }

    pub fn suspend(&mut self, reason: String, days: i64, now: DateTime<Utc>) {
        self.is_suspended = true;
        self.suspension_reason = Some(reason);
        self.suspension_ends_at = Some(now + Duration::days(days));
        self.updated_at = now;
    }

    pub fn lift_suspension(&mut self) {
        self.is_suspended = false;
        self.suspension_reason = None;
        self.suspension_ends_at = None;
        self.updated_at = Utc::now();
    }
}

/// Booking-side profile created alongside every account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: Snowflake,
    pub user_id: Snowflake,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(id: Snowflake, user_id: Snowflake) -> Self {
        Self {
            id,
            user_id,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            Snowflake::new(1),
            "gamer@example.com".to_string(),
            "Gamer".to_string(),
        )
    }

    #[test]
    fn test_new_user_is_customer() {
        let u = user();
        assert_eq!(u.role, UserRole::Customer);
        assert!(!u.is_admin());
        assert!(!u.is_suspended_at(Utc::now()));
    }

    #[test]
    fn test_suspension_expires() {
        let now = Utc::now();
        let mut u = user();
        u.suspend("spam".to_string(), 3, now);
        assert!(u.is_suspended_at(now + Duration::days(1)));
        assert!(!u.is_suspended_at(now + Duration::days(4)));

        u.lift_suspension();
        assert!(!u.is_suspended_at(now));
        assert!(u.suspension_reason.is_none());
    }

    #[test]
    fn test_open_ended_suspension() {
        let mut u = user();
        u.is_suspended = true;
        assert!(u.is_suspended_at(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn test_role_round_trip_strings() {
        for role in [UserRole::Customer, UserRole::Partner, UserRole::Admin] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("OWNER"), None);
    }
}
