//! Payment records written from gateway callbacks

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Gateway return code `1` means the charge went through
    pub fn from_return_code(code: &str) -> Self {
        if code.trim() == "1" {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: Snowflake,
    pub booking_id: Snowflake,
    pub provider: String,
    /// Gateway trade number; one row per key
    pub idempotency_key: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub raw_payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub const PROVIDER_ECPAY: &'static str = "ECPAY";
    pub const CURRENCY_TWD: &'static str = "TWD";

    /// Whole-dollar TWD amount expressed in cents
    pub fn cents_from_amount(amount: i64) -> i64 {
        amount * 100
    }

    pub fn amount(&self) -> Decimal {
        Decimal::new(self.amount_cents, 2)
    }
}

/// A gateway callback, reduced to the fields the marketplace acts on
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentCallback {
    pub payment_id: Snowflake,
    pub order_number: String,
    pub trade_no: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub raw_payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_code() {
        assert_eq!(PaymentStatus::from_return_code("1"), PaymentStatus::Succeeded);
        assert_eq!(PaymentStatus::from_return_code("10100058"), PaymentStatus::Failed);
    }

    #[test]
    fn test_amount_from_cents() {
        assert_eq!(Payment::cents_from_amount(450), 45_000);
        let payment = Payment {
            id: Snowflake::new(1),
            booking_id: Snowflake::new(2),
            provider: Payment::PROVIDER_ECPAY.to_string(),
            idempotency_key: "T1".to_string(),
            amount_cents: 45_050,
            currency: Payment::CURRENCY_TWD.to_string(),
            status: PaymentStatus::Succeeded,
            raw_payload: serde_json::Value::Null,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(payment.amount(), Decimal::new(45_050, 2));
    }
}
