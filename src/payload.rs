//! Request envelope sent by every worker tick

use crate::error::LoadError;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timestamp layout on the wire: `YYYY-DD-MM HH:MM:SS.mmm` (day before month).
pub const TIME_FORMAT: &str = "%Y-%d-%m %H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Signed on the wire; the server accepts any integer.
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Uid")]
    pub uid: Uuid,
}

impl Envelope {
    pub fn new(worker_id: usize) -> Self {
        Self {
            id: i64::try_from(worker_id).unwrap_or(i64::MAX),
            time: now_formatted(),
            uid: Uuid::new_v4(),
        }
    }

    /// Parse the envelope's `Time` field back into a timestamp.
    pub fn parsed_time(&self) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(&self.time, TIME_FORMAT)
    }
}

/// Current local time in [`TIME_FORMAT`].
pub fn now_formatted() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

/// Build and serialize a fresh envelope for one tick of `worker_id`.
pub fn build_request_payload(worker_id: usize) -> Result<Vec<u8>, LoadError> {
    serde_json::to_vec(&Envelope::new(worker_id)).map_err(LoadError::EncodeError)
}

pub fn decode_envelope(body: &[u8]) -> Result<Envelope, LoadError> {
    serde_json::from_slice(body).map_err(LoadError::DecodeError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_wire_field_names() {
        let bytes = build_request_payload(7).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["Id"], 7);
        assert!(value["Time"].is_string());
        let uid = value["Uid"].as_str().unwrap();
        assert_eq!(Uuid::parse_str(uid).unwrap().get_version_num(), 4);
    }

    #[test]
    fn decoded_payload_keeps_id_and_uid() {
        let envelope = Envelope::new(3);
        let bytes = serde_json::to_vec(&envelope).unwrap();
        let decoded = decode_envelope(&bytes).unwrap();

        assert_eq!(decoded.id, envelope.id);
        assert_eq!(decoded.uid, envelope.uid);
        decoded.parsed_time().unwrap();
    }

    #[test]
    fn time_puts_day_before_month() {
        let parsed = NaiveDateTime::parse_from_str("2024-31-12 23:59:58.123", TIME_FORMAT).unwrap();
        assert_eq!(parsed.format("%m-%d").to_string(), "12-31");
        assert_eq!(parsed.and_utc().timestamp_subsec_millis(), 123);
    }

    #[test]
    fn uids_are_unique_per_envelope() {
        assert_ne!(Envelope::new(0).uid, Envelope::new(0).uid);
    }

    #[test]
    fn negative_ids_decode() {
        let body = format!(
            "{{\"Id\": -1, \"Time\": \"2024-31-12 23:59:58.123\", \"Uid\": \"{}\"}}",
            Uuid::new_v4()
        );
        assert_eq!(decode_envelope(body.as_bytes()).unwrap().id, -1);
    }

    #[test]
    fn non_uuid_uid_is_a_decode_error() {
        let body = b"{\"Id\": 1, \"Time\": \"2024-31-12 23:59:58.123\", \"Uid\": \"abc\"}";
        assert!(matches!(decode_envelope(body), Err(LoadError::DecodeError(_))));
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        assert!(matches!(
            decode_envelope(b"{\"Id\": \"seven\"}"),
            Err(LoadError::DecodeError(_))
        ));
    }
}
