//! Domain events published to realtime subscribers

mod domain_event;

pub use domain_event::{
    BookingCreatedEvent, BookingStatusChangedEvent, DomainEvent, GiftReceivedEvent,
    MessageCreateEvent, MessagesReadEvent, NotificationCreateEvent,
    PartnerAvailabilityChangedEvent, WithdrawalRequestedEvent,
};
