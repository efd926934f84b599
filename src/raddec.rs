//! Radio-decoding event types.
//!
//! A raddec describes the radio decodings of a single transmitting device,
//! possibly aggregating several receiver observations into one record. The
//! wire format is the camelCase JSON produced by the upstream decoding
//! pipeline; unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// One receiver's observation of a transmitter within a raddec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RssiSignatureEntry {
    /// Identifier of the observing receiver, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    /// Received signal strength in dBm, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i16>,
    /// Number of successful decodings behind this entry
    #[serde(default)]
    pub number_of_decodings: u64,
}

/// A radio-decoding event for a single transmitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raddec {
    /// Opaque transmitter identifier (e.g. "aa:bb:cc:dd:ee:ff")
    pub transmitter_id: String,
    /// Identifier type code from the upstream decoder, if present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmitter_id_type: Option<u8>,
    /// Per-receiver signal entries; may be empty
    #[serde(default)]
    pub rssi_signature: Vec<RssiSignatureEntry>,
    /// Event timestamp in epoch milliseconds, if present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Raddec {
    /// Total number of decodings across all signature entries.
    ///
    /// An empty signature contributes zero; such events are still valid.
    pub fn number_of_decodings(&self) -> u64 {
        self.rssi_signature
            .iter()
            .map(|entry| entry.number_of_decodings)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case_wire_format() {
        let json = r#"{
            "transmitterId": "aa:bb:cc:dd:ee:ff",
            "transmitterIdType": 2,
            "rssiSignature": [
                { "receiverId": "001bc50940810000", "rssi": -72, "numberOfDecodings": 3 },
                { "rssi": -80, "numberOfDecodings": 2 }
            ],
            "timestamp": 1693000000000
        }"#;

        let raddec: Raddec = serde_json::from_str(json).unwrap();
        assert_eq!(raddec.transmitter_id, "aa:bb:cc:dd:ee:ff");
        assert_eq!(raddec.rssi_signature.len(), 2);
        assert_eq!(raddec.number_of_decodings(), 5);
    }

    #[test]
    fn test_empty_signature_is_zero_decodings() {
        let json = r#"{ "transmitterId": "aa:bb:cc:dd:ee:ff" }"#;
        let raddec: Raddec = serde_json::from_str(json).unwrap();
        assert!(raddec.rssi_signature.is_empty());
        assert_eq!(raddec.number_of_decodings(), 0);
    }
}
