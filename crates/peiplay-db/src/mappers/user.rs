//! User and customer mappers

use peiplay_core::{Customer, DomainError, Snowflake, User, UserRole};

use super::parse_column;
use crate::models::{CustomerModel, UserModel};

impl TryFrom<UserModel> for User {
    type Error = DomainError;

    fn try_from(model: UserModel) -> Result<Self, Self::Error> {
        Ok(User {
            id: Snowflake::new(model.id),
            email: model.email,
            name: model.name,
            role: parse_column(&model.role, "users.role", UserRole::parse)?,
            email_verified: model.email_verified,
            is_suspended: model.is_suspended,
            suspension_reason: model.suspension_reason,
            suspension_ends_at: model.suspension_ends_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<CustomerModel> for Customer {
    fn from(model: CustomerModel) -> Self {
        Customer {
            id: Snowflake::new(model.id),
            user_id: Snowflake::new(model.user_id),
            created_at: model.created_at,
        }
    }
}
