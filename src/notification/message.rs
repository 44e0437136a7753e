//! Cross-platform push message in the FCM HTTP v1 `message` shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{NotificationContent, QueueEntry};

/// Android delivery channel for queue notifications
pub const EMERGENCY_CHANNEL_ID: &str = "emergency_alerts";

/// Platform default alert sound
pub const DEFAULT_SOUND: &str = "default";

/// APNs priority for immediate delivery
pub const APNS_IMMEDIATE_PRIORITY: &str = "10";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Destination device token
    pub token: String,
    pub notification: NotificationContent,
    pub data: BTreeMap<String, String>,
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AndroidMessagePriority {
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AndroidNotificationPriority {
    PriorityDefault,
    PriorityHigh,
    PriorityMax,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidConfig {
    pub priority: AndroidMessagePriority,
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidNotification {
    pub channel_id: String,
    pub notification_priority: AndroidNotificationPriority,
    pub sound: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApnsConfig {
    pub headers: BTreeMap<String, String>,
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aps {
    pub sound: String,
}

impl AndroidConfig {
    /// High priority, max-importance notification on the emergency channel
    pub fn emergency() -> Self {
        Self {
            priority: AndroidMessagePriority::High,
            notification: AndroidNotification {
                channel_id: EMERGENCY_CHANNEL_ID.to_string(),
                notification_priority: AndroidNotificationPriority::PriorityMax,
                sound: DEFAULT_SOUND.to_string(),
            },
        }
    }
}

impl ApnsConfig {
    /// Immediate delivery with the default alert sound
    pub fn emergency() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("apns-priority".to_string(), APNS_IMMEDIATE_PRIORITY.to_string());

        Self {
            headers,
            payload: ApnsPayload {
                aps: Aps {
                    sound: DEFAULT_SOUND.to_string(),
                },
            },
        }
    }
}

impl PushMessage {
    /// Build the message for a queue entry. Pure and deterministic.
    pub fn from_entry(entry: &QueueEntry) -> Self {
        Self {
            token: entry.token.clone(),
            notification: entry.notification.clone(),
            data: entry.data.clone(),
            android: AndroidConfig::emergency(),
            apns: ApnsConfig::emergency(),
        }
    }
}
