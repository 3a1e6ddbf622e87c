//! Optional test-affordance CLI surface (spec.md §6), gated behind the
//! `std` feature since it formats to `String`/`std::io` and is meant for
//! desktop simulation, not firmware.

use crate::config::NEIGHBOR_TABLE_SIZE;
use crate::hal::{Gps, Radio, Sensors, Sink};
use crate::neighbor::Neighbor;
use crate::pipeline::MeshCore;
use crate::wire::FullReport;

/// A parsed CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `SETTIME HH:MM:SS`
    SetTime(u8, u8, u8),
    /// `mesh status`
    Status,
    /// `mesh stats`
    Stats,
    /// `mesh reset`
    Reset,
    /// `mesh test <destId> <ttl> <text>`
    Test { dest_id: u8, ttl: u8, text: std::string::String },
}

/// Parse one CLI line. Returns `None` for blank input or an unrecognized command.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut parts = line.split_whitespace();
    let first = parts.next()?;

    if first.eq_ignore_ascii_case("settime") {
        let hms = parts.next()?;
        let mut fields = hms.split(':');
        let h: u8 = fields.next()?.parse().ok()?;
        let m: u8 = fields.next()?.parse().ok()?;
        let s: u8 = fields.next()?.parse().ok()?;
        return Some(Command::SetTime(h, m, s));
    }

    if first.eq_ignore_ascii_case("mesh") {
        let sub = parts.next()?;
        return match sub.to_ascii_lowercase().as_str() {
            "status" => Some(Command::Status),
            "stats" => Some(Command::Stats),
            "reset" => Some(Command::Reset),
            "test" => {
                let dest_id: u8 = parts.next()?.parse().ok()?;
                let ttl: u8 = parts.next()?.parse().ok()?;
                let text: std::string::String = parts.collect::<std::vec::Vec<_>>().join(" ");
                Some(Command::Test { dest_id, ttl, text })
            }
            _ => None,
        };
    }

    None
}

/// Rendered output of a status/stats query, for a caller to print.
pub struct Report(pub std::string::String);

impl<R: Radio, G: Gps, S: Sensors, K: Sink> MeshCore<R, G, S, K> {
    /// Apply a parsed CLI [`Command`] against this core, returning rendered
    /// text for `Status`/`Stats` queries.
    pub fn apply_cli(&mut self, command: Command, now_ms: u32) -> Option<Report> {
        match command {
            Command::SetTime(h, m, s) => {
                self.set_manual_time(h, m, s, now_ms);
                None
            }
            Command::Status => {
                let mut buf = [Neighbor::default(); NEIGHBOR_TABLE_SIZE];
                let n = self.neighbors().snapshot(&mut buf, buf.len());
                let mut neighbors = std::string::String::new();
                for nb in &buf[..n as usize] {
                    if !nb.active {
                        continue;
                    }
                    neighbors.push_str(&std::format!(
                        " {}:{}dBm",
                        nb.node_id,
                        self.neighbors().avg_rssi(nb.node_id),
                    ));
                }
                Some(Report(std::format!(
                    "queue_depth={} active_neighbors={}{}",
                    self.queue_depth(),
                    self.neighbors().active_count(),
                    neighbors,
                )))
            }
            Command::Stats => {
                let s = self.stats();
                Some(Report(std::format!(
                    "duplicates_dropped={} ttl_expired={} queue_overflows={} unicast_forwards={} \
                     flooding_fallbacks={} route_expirations={} beacons_received={} beacons_sent={} \
                     route_updates={} unknown_message_types={} version_mismatches={} \
                     neighbor_table_full={}",
                    s.duplicates_dropped,
                    s.ttl_expired,
                    s.queue_overflows,
                    s.unicast_forwards,
                    s.flooding_fallbacks,
                    s.route_expirations,
                    s.beacons_received,
                    s.beacons_sent,
                    s.route_updates,
                    s.unknown_message_types,
                    s.version_mismatches,
                    s.neighbor_table_full,
                )))
            }
            Command::Reset => {
                self.reset();
                None
            }
            Command::Test { dest_id, ttl, text } => {
                let report = synthetic_report_from_text(&text);
                self.inject_test_report(dest_id, ttl, report, now_ms);
                None
            }
        }
    }
}

fn synthetic_report_from_text(text: &str) -> FullReport {
    let mut report = FullReport {
        temp_f_x10: 0,
        humidity_x10: 0,
        pressure_hpa: 0,
        altitude_m: 0,
        lat_x1e6: 0,
        lon_x1e6: 0,
        gps_alt_m: 0,
        satellites: 0,
        hdop_x10: 0,
        uptime_sec: 0,
        tx_count: 0,
        rx_count: 0,
        battery_pct: 0,
        neighbor_count: 0,
        status_flags: 0,
    };
    // Encode the synthetic marker as a recognizable temperature so tests can
    // assert the injected frame round-trips through the wire codec.
    if let Ok(marker) = text.trim().parse::<i16>() {
        report.temp_f_x10 = marker;
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_settime() {
        assert_eq!(parse("SETTIME 14:30:05"), Some(Command::SetTime(14, 30, 5)));
    }

    #[test]
    fn parses_mesh_subcommands() {
        assert_eq!(parse("mesh status"), Some(Command::Status));
        assert_eq!(parse("mesh stats"), Some(Command::Stats));
        assert_eq!(parse("mesh reset"), Some(Command::Reset));
    }

    #[test]
    fn parses_mesh_test_with_text() {
        assert_eq!(
            parse("mesh test 1 3 hello world"),
            Some(Command::Test { dest_id: 1, ttl: 3, text: "hello world".into() })
        );
    }

    #[test]
    fn rejects_blank_and_unknown_input() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("bogus"), None);
        assert_eq!(parse("mesh bogus"), None);
    }

    struct StubRadio {
        inbox: std::collections::VecDeque<(std::vec::Vec<u8>, i16, i16)>,
    }

    impl Radio for StubRadio {
        fn init(&mut self) -> bool {
            true
        }
        fn standby(&mut self) {}
        fn is_ready(&self) -> bool {
            true
        }
        fn send_binary(&mut self, _bytes: &[u8]) -> bool {
            true
        }
        fn start_receive(&mut self) {}
        fn packet_available(&self) -> bool {
            !self.inbox.is_empty()
        }
        fn poll_rx(&mut self) -> Option<crate::hal::Packet> {
            let (bytes, rssi, snr_x10) = self.inbox.pop_front()?;
            let mut payload = [0u8; crate::config::MAX_MESSAGE_SIZE];
            let len = bytes.len().min(payload.len());
            payload[..len].copy_from_slice(&bytes[..len]);
            Some(crate::hal::Packet { payload, payload_len: len as u8, rssi, snr_x10 })
        }
        fn device_id(&self) -> u8 {
            1
        }
        fn delay_ms(&mut self, _ms: u32) {}
    }

    struct StubGps;
    impl Gps for StubGps {
        fn snapshot(&self) -> crate::hal::GpsSnapshot {
            crate::hal::GpsSnapshot::default()
        }
    }

    struct StubSensors;
    impl Sensors for StubSensors {
        fn read(&self) -> crate::hal::SensorReading {
            crate::hal::SensorReading::default()
        }
    }

    struct StubSink;
    impl Sink for StubSink {
        fn on_report(&mut self, _source_id: u8, _report: &FullReport, _rssi: i16, _snr_x10: i16) {}
    }

    #[test]
    fn status_reports_active_neighbor_rssi() {
        use crate::config::MeshConfig;
        use crate::wire::{encode_full_report, Flags, MessageType, MeshHeader};

        let header = MeshHeader {
            version: 1,
            message_type: MessageType::FullReport,
            source_id: 3,
            dest_id: 0xFF,
            sender_id: 3,
            message_id: 1,
            ttl: 3,
            flags: Flags::default(),
        };
        let frame = encode_full_report(&header, &FullReport {
            temp_f_x10: 0,
            humidity_x10: 0,
            pressure_hpa: 0,
            altitude_m: 0,
            lat_x1e6: 0,
            lon_x1e6: 0,
            gps_alt_m: 0,
            satellites: 0,
            hdop_x10: 0,
            uptime_sec: 0,
            tx_count: 0,
            rx_count: 0,
            battery_pct: 0,
            neighbor_count: 0,
            status_flags: 0,
        });

        let mut inbox = std::collections::VecDeque::new();
        inbox.push_back((frame.to_vec(), -55, 0));
        let radio = StubRadio { inbox };
        let config = MeshConfig::new(1, 1);
        let mut core = MeshCore::new(config, radio, StubGps, StubSensors, StubSink);
        core.on_rx_tick(0);

        let report = core.apply_cli(Command::Status, 0).unwrap();
        assert!(report.0.contains("3:-55dBm"), "status line was: {}", report.0);
    }
}
