//! Model to entity mappers
//!
//! Rows whose enum columns hold an unknown value fail with
//! `DomainError::DatabaseError` instead of being silently coerced.

mod booking;
mod chat;
mod coin;
mod gift;
mod notification;
mod partner;
mod promo_code;
mod referral;
mod review;
mod user;
mod withdrawal;

use peiplay_core::DomainError;

pub(crate) fn parse_column<T>(
    value: &str,
    column: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, DomainError> {
    parse(value).ok_or_else(|| {
        DomainError::DatabaseError(format!("unexpected value {value:?} in column {column}"))
    })
}

/// Map every row, stopping at the first bad one
pub(crate) fn map_all<M, E>(rows: Vec<M>) -> Result<Vec<E>, DomainError>
where
    E: TryFrom<M, Error = DomainError>,
{
    rows.into_iter().map(E::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use peiplay_core::BookingStatus;

    #[test]
    fn test_parse_column() {
        assert_eq!(
            parse_column("CONFIRMED", "bookings.status", BookingStatus::parse).unwrap(),
            BookingStatus::Confirmed
        );
        assert!(matches!(
            parse_column("confirmed", "bookings.status", BookingStatus::parse),
            Err(DomainError::DatabaseError(_))
        ));
    }
}
