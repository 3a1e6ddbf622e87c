//! Minimal gateway-node simulation: ticks a `MeshCore` configured as the
//! deployment's gateway, emitting beacons on schedule and printing delivered
//! reports via the `Sink` collaborator.

use std::time::{Duration, Instant};

use mesh_core::config::{MeshConfig, GATEWAY_LOGICAL_ADDR};
use mesh_core::hal::{Gps, GpsSnapshot, Packet, Radio, Sensors, SensorReading, Sink};
use mesh_core::pipeline::MeshCore;
use mesh_core::wire::FullReport;

struct StdoutRadio;

impl Radio for StdoutRadio {
    fn init(&mut self) -> bool {
        true
    }
    fn standby(&mut self) {}
    fn is_ready(&self) -> bool {
        true
    }
    fn send_binary(&mut self, bytes: &[u8]) -> bool {
        println!("[gateway] TX {} bytes: {:02x?}", bytes.len(), bytes);
        true
    }
    fn start_receive(&mut self) {}
    fn packet_available(&self) -> bool {
        false
    }
    fn poll_rx(&mut self) -> Option<Packet> {
        None
    }
    fn device_id(&self) -> u8 {
        GATEWAY_LOGICAL_ADDR
    }
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

struct HostClockGps;

impl Gps for HostClockGps {
    fn snapshot(&self) -> GpsSnapshot {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        GpsSnapshot {
            hour: ((secs / 3600) % 24) as u8,
            minute: ((secs / 60) % 60) as u8,
            second: (secs % 60) as u8,
            datetime_valid: true,
            ..GpsSnapshot::default()
        }
    }
}

struct DummySensors;

impl Sensors for DummySensors {
    fn read(&self) -> SensorReading {
        SensorReading::default()
    }
}

struct PrintingSink;

impl Sink for PrintingSink {
    fn on_report(&mut self, source_id: u8, report: &FullReport, rssi: i16, snr_x10: i16) {
        println!(
            "delivered: source={} temp_x10={} battery={}% rssi={} snr_x10={}",
            source_id, report.temp_f_x10, report.battery_pct, rssi, snr_x10
        );
    }
}

fn main() {
    let config = MeshConfig::new(GATEWAY_LOGICAL_ADDR, GATEWAY_LOGICAL_ADDR);
    let mut core = MeshCore::new(config, StdoutRadio, HostClockGps, DummySensors, PrintingSink);

    let start = Instant::now();
    let mut last_maintenance = 0u32;
    loop {
        let now_ms = start.elapsed().as_millis() as u32;
        core.on_rx_tick(now_ms);
        core.on_scheduler_tick(now_ms);
        if now_ms.wrapping_sub(last_maintenance) >= 1_000 {
            core.on_maintenance_tick(now_ms);
            last_maintenance = now_ms;
        }
        std::thread::sleep(Duration::from_millis(200));
    }
}
