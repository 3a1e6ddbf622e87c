//! Wire codec
//!
//! Pure encode/decode functions for the mesh header and its two payload
//! kinds. Multi-byte payload fields are little-endian; the header field
//! order is fixed. No language-native struct layout is relied upon —
//! everything is serialized field by field, matching the Design Notes'
//! "Bit-exact wire framing" directive.

mod beacon;
mod full_report;
mod header;

pub use beacon::{
    decode_beacon, encode_beacon, Beacon, BEACON_FRAME_LEN, BEACON_LEGACY_FRAME_LEN,
    BEACON_PAYLOAD_LEN, DISTANCE_UNKNOWN,
};
pub use full_report::{
    decode_full_report, encode_full_report, FullReport, FULL_REPORT_FRAME_LEN,
    FULL_REPORT_PAYLOAD_LEN, STATUS_ALERT, STATUS_GPS_VALID, STATUS_LOW_BATTERY,
    STATUS_SENSORS_OK, STATUS_TIME_SRC_MASK, TIME_SRC_GPS, TIME_SRC_NET, TIME_SRC_NONE,
};
pub use header::{
    Flags, MeshHeader, MessageType, FLAG_IS_FORWARDED, FLAG_NEEDS_ACK, HEADER_LEN,
};

/// Codec error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Total frame length didn't match what the message type requires.
    Length,
    /// `messageType` in the header didn't match the decoder invoked.
    WrongType,
    /// Header `version` didn't match [`crate::config::WIRE_VERSION`].
    ///
    /// Warning-only: unlike the other two variants this is never returned
    /// from [`decode_beacon`]/[`decode_full_report`] themselves, which parse
    /// a mismatched-version frame exactly as they would a matching one. It
    /// exists so a caller can represent the condition with [`check_version`]
    /// instead of re-deriving it from [`MeshHeader::is_version_mismatch`] ad hoc.
    VersionMismatch,
}

/// Check a decoded header's wire version.
///
/// Never blocks decoding: the frame is parsed and processed either way, per
/// spec.md §4.A. Callers use this at the point they'd otherwise log/count the
/// mismatch, so the condition is represented as a value rather than an
/// inline `if header.is_version_mismatch() { .. }`.
pub fn check_version(header: &MeshHeader) -> Result<(), DecodeError> {
    if header.is_version_mismatch() {
        Err(DecodeError::VersionMismatch)
    } else {
        Ok(())
    }
}

/// Classify a raw frame by its second byte (the `messageType` header field).
///
/// Requires `bytes.len() >= 2`; a shorter slice is classified as
/// [`MessageType::FullReport`] so that the subsequent length-checked decode
/// rejects it rather than this function panicking on an out-of-bounds index.
pub fn classify(bytes: &[u8]) -> MessageType {
    if bytes.len() < 2 {
        return MessageType::FullReport;
    }
    MessageType::from_byte(bytes[1])
}
