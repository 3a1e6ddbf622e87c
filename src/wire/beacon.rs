//! BEACON payload: gradient routing distance plus optional GPS time relay.

use super::header::{MeshHeader, HEADER_LEN};
use super::DecodeError;
use crate::wire::header::MessageType;

/// Encoded size of the current (time-carrying) BEACON payload, in bytes.
pub const BEACON_PAYLOAD_LEN: usize = 8;
/// Encoded size of a full current BEACON frame (header + payload), in bytes.
pub const BEACON_FRAME_LEN: usize = HEADER_LEN + BEACON_PAYLOAD_LEN;
/// Encoded size of a legacy, routing-only BEACON payload, in bytes.
pub const BEACON_LEGACY_PAYLOAD_LEN: usize = 4;
/// Encoded size of a full legacy BEACON frame (header + payload), in bytes.
pub const BEACON_LEGACY_FRAME_LEN: usize = HEADER_LEN + BEACON_LEGACY_PAYLOAD_LEN;

/// Sentinel `distanceToGateway` meaning "unknown".
pub const DISTANCE_UNKNOWN: u8 = 255;

/// Decoded BEACON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beacon {
    /// Hops from the sender to the gateway; 0 means the sender is the gateway.
    pub distance_to_gateway: u8,
    /// Device id of the gateway this beacon advertises a route to.
    pub gateway_id: u8,
    /// Sender's beacon sequence number.
    pub sequence_number: u16,
    /// GPS hour-of-day, valid only when `gps_valid` is set.
    pub gps_hour: u8,
    /// GPS minute, valid only when `gps_valid` is set.
    pub gps_minute: u8,
    /// GPS second, valid only when `gps_valid` is set.
    pub gps_second: u8,
    /// Whether the GPS time block carries a valid fix.
    pub gps_valid: bool,
}

impl Beacon {
    /// Whether this beacon reports an unknown distance to the gateway.
    pub fn distance_unknown(&self) -> bool {
        self.distance_to_gateway == DISTANCE_UNKNOWN
    }
}

/// Encode the current 8-byte BEACON payload.
pub fn encode_beacon_payload(beacon: &Beacon) -> [u8; BEACON_PAYLOAD_LEN] {
    let mut buf = [0u8; BEACON_PAYLOAD_LEN];
    buf[0] = beacon.distance_to_gateway;
    buf[1] = beacon.gateway_id;
    buf[2..4].copy_from_slice(&beacon.sequence_number.to_le_bytes());
    buf[4] = beacon.gps_hour;
    buf[5] = beacon.gps_minute;
    buf[6] = beacon.gps_second;
    buf[7] = if beacon.gps_valid { 1 } else { 0 };
    buf
}

/// Encode a full 16-byte BEACON frame: header followed by payload.
pub fn encode_beacon(header: &MeshHeader, beacon: &Beacon) -> [u8; BEACON_FRAME_LEN] {
    let mut buf = [0u8; BEACON_FRAME_LEN];
    buf[..HEADER_LEN].copy_from_slice(&header.encode());
    buf[HEADER_LEN..].copy_from_slice(&encode_beacon_payload(beacon));
    buf
}

/// Decode a BEACON frame.
///
/// Accepts both the current 16-byte frame and, for backward compatibility, a
/// legacy 12-byte frame (header + 4-byte routing-only payload); the time
/// block of a legacy frame is treated as invalid (`gps_valid = false`,
/// `gps_hour/minute/second = 0`). Any other length is [`DecodeError::Length`];
/// a header `message_type` other than [`MessageType::Beacon`] is
/// [`DecodeError::WrongType`].
pub fn decode_beacon(bytes: &[u8]) -> Result<(MeshHeader, Beacon), DecodeError> {
    let payload_len = match bytes.len() {
        BEACON_FRAME_LEN => BEACON_PAYLOAD_LEN,
        BEACON_LEGACY_FRAME_LEN => BEACON_LEGACY_PAYLOAD_LEN,
        _ => return Err(DecodeError::Length),
    };

    let mut header_bytes = [0u8; HEADER_LEN];
    header_bytes.copy_from_slice(&bytes[..HEADER_LEN]);
    let header = MeshHeader::decode(&header_bytes);
    if header.message_type != MessageType::Beacon {
        return Err(DecodeError::WrongType);
    }

    let payload = &bytes[HEADER_LEN..HEADER_LEN + payload_len];
    let beacon = if payload_len == BEACON_PAYLOAD_LEN {
        Beacon {
            distance_to_gateway: payload[0],
            gateway_id: payload[1],
            sequence_number: u16::from_le_bytes([payload[2], payload[3]]),
            gps_hour: payload[4],
            gps_minute: payload[5],
            gps_second: payload[6],
            gps_valid: payload[7] != 0,
        }
    } else {
        Beacon {
            distance_to_gateway: payload[0],
            gateway_id: payload[1],
            sequence_number: u16::from_le_bytes([payload[2], payload[3]]),
            gps_hour: 0,
            gps_minute: 0,
            gps_second: 0,
            gps_valid: false,
        }
    };

    Ok((header, beacon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::header::Flags;

    fn sample_header() -> MeshHeader {
        MeshHeader {
            version: 1,
            message_type: MessageType::Beacon,
            source_id: 1,
            dest_id: 0xFF,
            sender_id: 1,
            message_id: 4,
            ttl: 3,
            flags: Flags::default(),
        }
    }

    fn sample_beacon() -> Beacon {
        Beacon {
            distance_to_gateway: 0,
            gateway_id: 1,
            sequence_number: 1000,
            gps_hour: 14,
            gps_minute: 30,
            gps_second: 5,
            gps_valid: true,
        }
    }

    #[test]
    fn round_trip() {
        let frame = encode_beacon(&sample_header(), &sample_beacon());
        assert_eq!(frame.len(), BEACON_FRAME_LEN);
        let (h, b) = decode_beacon(&frame).unwrap();
        assert_eq!(h, sample_header());
        assert_eq!(b, sample_beacon());
    }

    #[test]
    fn legacy_frame_has_invalid_time_block() {
        let header = sample_header();
        let mut frame = [0u8; BEACON_LEGACY_FRAME_LEN];
        frame[..HEADER_LEN].copy_from_slice(&header.encode());
        frame[HEADER_LEN] = 2; // distance
        frame[HEADER_LEN + 1] = 1; // gateway id
        frame[HEADER_LEN + 2..HEADER_LEN + 4].copy_from_slice(&77u16.to_le_bytes());

        let (h, b) = decode_beacon(&frame).unwrap();
        assert_eq!(h, header);
        assert_eq!(b.distance_to_gateway, 2);
        assert_eq!(b.gateway_id, 1);
        assert_eq!(b.sequence_number, 77);
        assert!(!b.gps_valid);
        assert_eq!((b.gps_hour, b.gps_minute, b.gps_second), (0, 0, 0));
    }

    #[test]
    fn rejects_bad_length() {
        let frame = encode_beacon(&sample_header(), &sample_beacon());
        assert_eq!(decode_beacon(&frame[..frame.len() - 2]), Err(DecodeError::Length));
    }

    #[test]
    fn rejects_wrong_type() {
        let mut header = sample_header();
        header.message_type = MessageType::FullReport;
        let frame = encode_beacon(&header, &sample_beacon());
        assert_eq!(decode_beacon(&frame), Err(DecodeError::WrongType));
    }

    #[test]
    fn distance_unknown_sentinel() {
        let mut b = sample_beacon();
        b.distance_to_gateway = DISTANCE_UNKNOWN;
        assert!(b.distance_unknown());
    }
}
