//! FULL_REPORT payload: environment, GPS, and status blocks.

use super::header::{MeshHeader, HEADER_LEN};
use super::DecodeError;
use crate::wire::header::MessageType;

/// Encoded size of the FULL_REPORT payload, in bytes.
pub const FULL_REPORT_PAYLOAD_LEN: usize = 31;
/// Encoded size of a full FULL_REPORT frame (header + payload), in bytes.
pub const FULL_REPORT_FRAME_LEN: usize = HEADER_LEN + FULL_REPORT_PAYLOAD_LEN;

/// `status_flags` bit 0: GPS fix was valid at capture time.
pub const STATUS_GPS_VALID: u8 = 0x01;
/// `status_flags` bit 1: sensor readings were valid at capture time.
pub const STATUS_SENSORS_OK: u8 = 0x02;
/// `status_flags` bit 2: battery below the low-battery threshold.
pub const STATUS_LOW_BATTERY: u8 = 0x04;
/// `status_flags` bit 3: an alert condition is active.
pub const STATUS_ALERT: u8 = 0x08;
/// `status_flags` bits 4-5 mask: time source.
pub const STATUS_TIME_SRC_MASK: u8 = 0x30;
/// `TIME_SRC` value: no time source.
pub const TIME_SRC_NONE: u8 = 0x00;
/// `TIME_SRC` value: GPS-derived time.
pub const TIME_SRC_GPS: u8 = 0x10;
/// `TIME_SRC` value: network-relayed time.
pub const TIME_SRC_NET: u8 = 0x20;

/// Decoded FULL_REPORT payload (environment + GPS + status blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullReport {
    /// Temperature in tenths of a degree Fahrenheit.
    pub temp_f_x10: i16,
    /// Relative humidity in tenths of a percent.
    pub humidity_x10: u16,
    /// Barometric pressure in hPa.
    pub pressure_hpa: u16,
    /// Altitude in meters (barometric estimate).
    pub altitude_m: i16,
    /// Latitude, millionths of a degree.
    pub lat_x1e6: i32,
    /// Longitude, millionths of a degree.
    pub lon_x1e6: i32,
    /// GPS-reported altitude in meters.
    pub gps_alt_m: i16,
    /// Satellites used in the GPS fix.
    pub satellites: u8,
    /// Horizontal dilution of precision, tenths.
    pub hdop_x10: u8,
    /// Seconds since boot.
    pub uptime_sec: u32,
    /// Frames transmitted by this node since boot.
    pub tx_count: u16,
    /// Frames received by this node since boot.
    pub rx_count: u16,
    /// Battery level, percent.
    pub battery_pct: u8,
    /// Active neighbor count at capture time.
    pub neighbor_count: u8,
    /// Status bitfield; see `STATUS_*` constants.
    pub status_flags: u8,
}

impl FullReport {
    /// Whether `STATUS_GPS_VALID` is set.
    pub fn gps_valid(&self) -> bool {
        self.status_flags & STATUS_GPS_VALID != 0
    }

    /// Whether `STATUS_SENSORS_OK` is set.
    pub fn sensors_ok(&self) -> bool {
        self.status_flags & STATUS_SENSORS_OK != 0
    }

    /// The `TIME_SRC` sub-field, one of `TIME_SRC_*`.
    pub fn time_src(&self) -> u8 {
        self.status_flags & STATUS_TIME_SRC_MASK
    }
}

/// Encode a [`FullReport`] payload (31 bytes, little-endian multi-byte fields).
pub fn encode_full_report_payload(report: &FullReport) -> [u8; FULL_REPORT_PAYLOAD_LEN] {
    let mut buf = [0u8; FULL_REPORT_PAYLOAD_LEN];
    buf[0..2].copy_from_slice(&report.temp_f_x10.to_le_bytes());
    buf[2..4].copy_from_slice(&report.humidity_x10.to_le_bytes());
    buf[4..6].copy_from_slice(&report.pressure_hpa.to_le_bytes());
    buf[6..8].copy_from_slice(&report.altitude_m.to_le_bytes());
    buf[8..12].copy_from_slice(&report.lat_x1e6.to_le_bytes());
    buf[12..16].copy_from_slice(&report.lon_x1e6.to_le_bytes());
    buf[16..18].copy_from_slice(&report.gps_alt_m.to_le_bytes());
    buf[18] = report.satellites;
    buf[19] = report.hdop_x10;
    buf[20..24].copy_from_slice(&report.uptime_sec.to_le_bytes());
    buf[24..26].copy_from_slice(&report.tx_count.to_le_bytes());
    buf[26..28].copy_from_slice(&report.rx_count.to_le_bytes());
    buf[28] = report.battery_pct;
    buf[29] = report.neighbor_count;
    buf[30] = report.status_flags;
    buf
}

/// Decode a FULL_REPORT payload.
pub fn decode_full_report_payload(
    bytes: &[u8; FULL_REPORT_PAYLOAD_LEN],
) -> FullReport {
    FullReport {
        temp_f_x10: i16::from_le_bytes([bytes[0], bytes[1]]),
        humidity_x10: u16::from_le_bytes([bytes[2], bytes[3]]),
        pressure_hpa: u16::from_le_bytes([bytes[4], bytes[5]]),
        altitude_m: i16::from_le_bytes([bytes[6], bytes[7]]),
        lat_x1e6: i32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        lon_x1e6: i32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        gps_alt_m: i16::from_le_bytes([bytes[16], bytes[17]]),
        satellites: bytes[18],
        hdop_x10: bytes[19],
        uptime_sec: u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]),
        tx_count: u16::from_le_bytes([bytes[24], bytes[25]]),
        rx_count: u16::from_le_bytes([bytes[26], bytes[27]]),
        battery_pct: bytes[28],
        neighbor_count: bytes[29],
        status_flags: bytes[30],
    }
}

/// Encode a full 39-byte FULL_REPORT frame: header followed by payload.
///
/// Callers (see `crate::pipeline`) are responsible for stamping `version`,
/// `sender_id`, and a freshly incremented `message_id` into `header` before
/// calling this — the codec stays a pure function over its arguments.
pub fn encode_full_report(
    header: &MeshHeader,
    report: &FullReport,
) -> [u8; FULL_REPORT_FRAME_LEN] {
    let mut buf = [0u8; FULL_REPORT_FRAME_LEN];
    buf[..HEADER_LEN].copy_from_slice(&header.encode());
    buf[HEADER_LEN..].copy_from_slice(&encode_full_report_payload(report));
    buf
}

/// Decode a full FULL_REPORT frame.
///
/// Returns [`DecodeError::Length`] unless `bytes.len() == FULL_REPORT_FRAME_LEN`,
/// and [`DecodeError::WrongType`] unless the header's `message_type` is
/// [`MessageType::FullReport`]. A header version mismatch is not an error —
/// the frame is still decoded (spec.md §4.A).
pub fn decode_full_report(
    bytes: &[u8],
) -> Result<(MeshHeader, FullReport), DecodeError> {
    if bytes.len() != FULL_REPORT_FRAME_LEN {
        return Err(DecodeError::Length);
    }
    let mut header_bytes = [0u8; HEADER_LEN];
    header_bytes.copy_from_slice(&bytes[..HEADER_LEN]);
    let header = MeshHeader::decode(&header_bytes);
    if header.message_type != MessageType::FullReport {
        return Err(DecodeError::WrongType);
    }
    let mut payload_bytes = [0u8; FULL_REPORT_PAYLOAD_LEN];
    payload_bytes.copy_from_slice(&bytes[HEADER_LEN..]);
    let report = decode_full_report_payload(&payload_bytes);
    Ok((header, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::header::Flags;

    fn sample_header() -> MeshHeader {
        MeshHeader {
            version: 1,
            message_type: MessageType::FullReport,
            source_id: 3,
            dest_id: 0xFF,
            sender_id: 3,
            message_id: 0,
            ttl: 3,
            flags: Flags::default(),
        }
    }

    fn sample_report() -> FullReport {
        FullReport {
            temp_f_x10: 725,
            humidity_x10: 455,
            pressure_hpa: 1013,
            altitude_m: 120,
            lat_x1e6: 40_712_776,
            lon_x1e6: -74_005_974,
            gps_alt_m: 10,
            satellites: 7,
            hdop_x10: 12,
            uptime_sec: 3600,
            tx_count: 42,
            rx_count: 99,
            battery_pct: 87,
            neighbor_count: 2,
            status_flags: STATUS_GPS_VALID | STATUS_SENSORS_OK | TIME_SRC_GPS,
        }
    }

    #[test]
    fn round_trip() {
        let header = sample_header();
        let report = sample_report();
        let frame = encode_full_report(&header, &report);
        assert_eq!(frame.len(), FULL_REPORT_FRAME_LEN);
        let (dh, dr) = decode_full_report(&frame).unwrap();
        assert_eq!(dh, header);
        assert_eq!(dr, report);
    }

    #[test]
    fn negative_values_round_trip() {
        let mut report = sample_report();
        report.temp_f_x10 = -200;
        report.altitude_m = -30;
        report.lat_x1e6 = -10;
        let frame = encode_full_report(&sample_header(), &report);
        let (_, dr) = decode_full_report(&frame).unwrap();
        assert_eq!(dr.temp_f_x10, -200);
        assert_eq!(dr.altitude_m, -30);
        assert_eq!(dr.lat_x1e6, -10);
    }

    #[test]
    fn rejects_wrong_length() {
        let frame = encode_full_report(&sample_header(), &sample_report());
        assert_eq!(decode_full_report(&frame[..frame.len() - 1]), Err(DecodeError::Length));
    }

    #[test]
    fn rejects_wrong_type() {
        let mut header = sample_header();
        header.message_type = MessageType::Beacon;
        let frame = encode_full_report(&header, &sample_report());
        assert_eq!(decode_full_report(&frame), Err(DecodeError::WrongType));
    }

    #[test]
    fn status_flag_accessors() {
        let report = sample_report();
        assert!(report.gps_valid());
        assert!(report.sensors_ok());
        assert_eq!(report.time_src(), TIME_SRC_GPS);
    }
}
