//! The JSON header attached to every log event.

use serde::{Deserialize, Serialize};

/// Metadata describing one log event, carried alongside the opaque body.
///
/// `log_path` is the logical destination the producer would have written to
/// locally (the field name is standardized across the pipeline; older
/// producers that still emit `log_filename` are not supported).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogHeader {
    pub hostname: String,
    /// Hex-encoded 128-bit id, fixed for the lifetime of the producer.
    pub uuid: String,
    /// Monotonically increasing per producer instance, starting at 1.
    pub sequence: u64,
    pub pid: u32,
    /// Seconds since the Unix epoch, fractional.
    pub timestamp: f64,
    pub log_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodename: Option<String>,
}

impl LogHeader {
    /// `(uuid, sequence)` uniquely identifies this event within its producer.
    pub fn event_id(&self) -> (&str, u64) {
        (&self.uuid, self.sequence)
    }

    /// `(timestamp, uuid)` is the key used to detect duplicate archived copies
    /// of the same event. Bitwise-equal floats are required; see
    /// invariant 5 in the project test suite.
    pub fn dedup_key(&self) -> (u64, &str) {
        (self.timestamp.to_bits(), &self.uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LogHeader {
        LogHeader {
            hostname: "web-01".to_owned(),
            uuid: "0123456789abcdef0123456789abcdef".to_owned(),
            sequence: 7,
            pid: 4242,
            timestamp: 1_700_000_000.125,
            log_path: "/var/log/app/access.log".to_owned(),
            nodename: None,
        }
    }

    #[test]
    fn nodename_omitted_when_none() {
        let h = sample();
        let s = serde_json::to_string(&h).unwrap();
        assert!(!s.contains("nodename"));
    }

    #[test]
    fn nodename_present_when_some() {
        let mut h = sample();
        h.nodename = Some("edge-3".to_owned());
        let s = serde_json::to_string(&h).unwrap();
        assert!(s.contains("\"nodename\":\"edge-3\""));
    }

    #[test]
    fn round_trips_through_json() {
        let h = sample();
        let s = serde_json::to_string(&h).unwrap();
        let back: LogHeader = serde_json::from_str(&s).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn event_id_and_dedup_key() {
        let h = sample();
        assert_eq!(h.event_id(), (h.uuid.as_str(), 7));
        assert_eq!(h.dedup_key(), (h.timestamp.to_bits(), h.uuid.as_str()));
    }
}
