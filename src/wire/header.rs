//! Mesh header: the 8 bytes common to every frame.

use crate::config::WIRE_VERSION;

/// Encoded size of [`MeshHeader`], in bytes.
pub const HEADER_LEN: usize = 8;

/// `flags` bit 0: NEEDS_ACK, reserved and unused by the core.
pub const FLAG_NEEDS_ACK: u8 = 0x01;
/// `flags` bit 1: set on first forward and preserved on subsequent forwards.
pub const FLAG_IS_FORWARDED: u8 = 0x02;

/// Named accessors for the `flags` header byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags(pub u8);

impl Flags {
    /// Bit 0: NEEDS_ACK, reserved for future use.
    pub fn needs_ack(self) -> bool {
        self.0 & FLAG_NEEDS_ACK != 0
    }

    /// Bit 1: IS_FORWARDED.
    pub fn is_forwarded(self) -> bool {
        self.0 & FLAG_IS_FORWARDED != 0
    }

    /// Return a copy with IS_FORWARDED set.
    pub fn with_forwarded(self) -> Self {
        Flags(self.0 | FLAG_IS_FORWARDED)
    }
}

/// Message type tag, read from the header's second byte.
///
/// A tagged sum with an explicit `Unknown` variant, per the Design Notes:
/// forward-compatible handling of legacy values is then a compile-time
/// pattern match instead of a magic-number `if`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// An originator's sensor report, first hop.
    FullReport,
    /// A report already relayed by at least one intermediate node.
    ///
    /// Reserved for wire compatibility; the core classifies it but assigns
    /// it no behavior beyond that of an unknown/legacy type.
    RoutedData,
    /// End-to-end acknowledgment.
    ///
    /// Reserved for wire compatibility; the core has no ack semantics
    /// (spec.md Non-goals: "no end-to-end acknowledgments").
    Ack,
    /// A beacon carrying distance-to-gateway and, optionally, wall-clock time.
    Beacon,
    /// A legacy or unrecognized message type, carrying the raw byte.
    Unknown(u8),
}

impl MessageType {
    /// Raw wire value for this message type.
    pub fn as_byte(self) -> u8 {
        match self {
            MessageType::FullReport => 0x01,
            MessageType::RoutedData => 0x02,
            MessageType::Ack => 0x03,
            MessageType::Beacon => 0x0A,
            MessageType::Unknown(b) => b,
        }
    }

    /// Parse a raw wire value.
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x01 => MessageType::FullReport,
            0x02 => MessageType::RoutedData,
            0x03 => MessageType::Ack,
            0x0A => MessageType::Beacon,
            other => MessageType::Unknown(other),
        }
    }
}

/// The 8-byte header present on every mesh frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHeader {
    /// Wire protocol version; `1` for this spec. Mismatches are a warning,
    /// not a decode failure.
    pub version: u8,
    /// Message type tag.
    pub message_type: MessageType,
    /// Originator's device id. Set once, never rewritten while forwarding.
    pub source_id: u8,
    /// Destination device id, or [`crate::config::BROADCAST_ID`]. Set once,
    /// never rewritten while forwarding.
    pub dest_id: u8,
    /// Device id of whoever put this frame on the air last. Rewritten to
    /// the local device id on every forward.
    pub sender_id: u8,
    /// Per-source monotone counter, modulo 256.
    pub message_id: u8,
    /// Hop budget; decremented by 1 on each forward. `ttl <= 1` is never
    /// forwarded.
    pub ttl: u8,
    /// Bitflags; see [`Flags`].
    pub flags: Flags,
}

impl MeshHeader {
    /// Serialize the header in its fixed field order.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        [
            self.version,
            self.message_type.as_byte(),
            self.source_id,
            self.dest_id,
            self.sender_id,
            self.message_id,
            self.ttl,
            self.flags.0,
        ]
    }

    /// Parse a header from its fixed field order.
    ///
    /// A version other than [`WIRE_VERSION`] is not an error here; the
    /// caller is expected to log the mismatch (see `crate::pipeline`) and
    /// continue parsing, per spec.md §4.A.
    pub fn decode(bytes: &[u8; HEADER_LEN]) -> Self {
        Self {
            version: bytes[0],
            message_type: MessageType::from_byte(bytes[1]),
            source_id: bytes[2],
            dest_id: bytes[3],
            sender_id: bytes[4],
            message_id: bytes[5],
            ttl: bytes[6],
            flags: Flags(bytes[7]),
        }
    }

    /// Whether `version` differs from the version this crate implements.
    pub fn is_version_mismatch(&self) -> bool {
        self.version != WIRE_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let h = MeshHeader {
            version: WIRE_VERSION,
            message_type: MessageType::FullReport,
            source_id: 3,
            dest_id: 0xFF,
            sender_id: 3,
            message_id: 17,
            ttl: 3,
            flags: Flags::default(),
        };
        let bytes = h.encode();
        assert_eq!(bytes.len(), HEADER_LEN);
        let back = MeshHeader::decode(&bytes);
        assert_eq!(back, h);
    }

    #[test]
    fn field_order_is_exact() {
        let h = MeshHeader {
            version: 1,
            message_type: MessageType::Beacon,
            source_id: 2,
            dest_id: 3,
            sender_id: 4,
            message_id: 5,
            ttl: 6,
            flags: Flags(7),
        };
        assert_eq!(h.encode(), [1, 0x0A, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn unknown_message_type_round_trips() {
        let mt = MessageType::from_byte(0x99);
        assert_eq!(mt, MessageType::Unknown(0x99));
        assert_eq!(mt.as_byte(), 0x99);
    }

    #[test]
    fn version_mismatch_is_not_fatal() {
        let mut bytes = [1u8; HEADER_LEN];
        bytes[0] = 9;
        bytes[1] = MessageType::FullReport.as_byte();
        let h = MeshHeader::decode(&bytes);
        assert!(h.is_version_mismatch());
    }

    #[test]
    fn flags_bits() {
        let f = Flags::default().with_forwarded();
        assert!(f.is_forwarded());
        assert!(!f.needs_ack());
        let f2 = Flags(FLAG_NEEDS_ACK);
        assert!(f2.needs_ack());
        assert!(!f2.is_forwarded());
    }
}
