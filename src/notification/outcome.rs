use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::store::DocumentFields;

/// Terminal status fields merged onto a queue document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeRecord {
    Sent {
        sent_at: DateTime<Utc>,
        fcm_response: String,
    },
    Error {
        error: String,
        error_at: DateTime<Utc>,
    },
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-10-19T08:15:30.123Z`
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl OutcomeRecord {
    pub fn sent(fcm_response: impl Into<String>) -> Self {
        Self::Sent {
            sent_at: Utc::now(),
            fcm_response: fcm_response.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
            error_at: Utc::now(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            OutcomeRecord::Sent { .. } => "sent",
            OutcomeRecord::Error { .. } => "error",
        }
    }

    /// The fields to merge, keyed by their document field names.
    pub fn fields(&self) -> DocumentFields {
        let mut fields = DocumentFields::new();
        fields.insert("status".to_string(), Value::from(self.status()));

        match self {
            OutcomeRecord::Sent {
                sent_at,
                fcm_response,
            } => {
                fields.insert("sentAt".to_string(), Value::from(iso_timestamp(*sent_at)));
                fields.insert("fcmResponse".to_string(), Value::from(fcm_response.as_str()));
            }
            OutcomeRecord::Error { error, error_at } => {
                fields.insert("error".to_string(), Value::from(error.as_str()));
                fields.insert("errorAt".to_string(), Value::from(iso_timestamp(*error_at)));
            }
        }

        fields
    }
}

impl Serialize for OutcomeRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sent_fields() {
        let record = OutcomeRecord::Sent {
            sent_at: Utc.with_ymd_and_hms(2026, 10, 19, 8, 15, 30).unwrap(),
            fcm_response: "projects/demo/messages/0:1".to_string(),
        };

        let fields = record.fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["status"], "sent");
        assert_eq!(fields["sentAt"], "2026-10-19T08:15:30.000Z");
        assert_eq!(fields["fcmResponse"], "projects/demo/messages/0:1");
    }

    #[test]
    fn test_error_fields() {
        let fields = OutcomeRecord::error("invalid-registration-token").fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["status"], "error");
        assert_eq!(fields["error"], "invalid-registration-token");

        let error_at = fields["errorAt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(error_at).is_ok());
        assert!(error_at.ends_with('Z'));
    }
}
