//! Queue entry validation, push message construction, and the dispatcher
//! that ties them to the gateway and the document store.

mod dispatcher;
mod error;
mod message;
mod outcome;
mod types;

pub use dispatcher::{
    DispatchOutcome, DispatcherStats, DispatcherStatsSnapshot, NotificationDispatcher,
};
pub use error::DispatchError;
pub use message::{
    AndroidConfig, AndroidMessagePriority, AndroidNotification, AndroidNotificationPriority,
    ApnsConfig, ApnsPayload, Aps, PushMessage, APNS_IMMEDIATE_PRIORITY, DEFAULT_SOUND,
    EMERGENCY_CHANNEL_ID,
};
pub use outcome::{iso_timestamp, OutcomeRecord};
pub use types::{is_truthy, NotificationContent, QueueEntry, MISSING_DATA_MESSAGE};
