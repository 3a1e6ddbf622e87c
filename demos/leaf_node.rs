//! Minimal leaf-node simulation: ticks a `MeshCore` against a no-op radio so
//! the transmit path (TDMA gating, own-report construction) can be observed
//! on stdout. Accepts an optional device id on the command line (spec.md §6
//! "a process is expected to accept a node id on the command line").

use std::env;
use std::time::{Duration, Instant};

use mesh_core::config::MeshConfig;
use mesh_core::hal::{Gps, GpsSnapshot, Packet, Radio, Sensors, SensorReading, Sink};
use mesh_core::pipeline::MeshCore;
use mesh_core::wire::FullReport;

struct StdoutRadio {
    device_id: u8,
}

impl Radio for StdoutRadio {
    fn init(&mut self) -> bool {
        true
    }
    fn standby(&mut self) {}
    fn is_ready(&self) -> bool {
        true
    }
    fn send_binary(&mut self, bytes: &[u8]) -> bool {
        println!("[node {}] TX {} bytes: {:02x?}", self.device_id, bytes.len(), bytes);
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
        self.device_id
    }
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Derives the wall-clock second from the host's system clock so the TDMA
/// scheduler has a real time source to gate against, without an actual GPS.
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
        SensorReading {
            temp_f_x10: 725,
            humidity_x10: 455,
            pressure_hpa: 1013,
            altitude_m: 120,
            sensors_ok: true,
        }
    }
}

struct NullSink;

impl Sink for NullSink {
    fn on_report(&mut self, source_id: u8, report: &FullReport, rssi: i16, _snr_x10: i16) {
        println!("sink: report from {} temp_x10={} rssi={}", source_id, report.temp_f_x10, rssi);
    }
}

fn main() {
    let device_id: u8 = env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(3);

    let config = MeshConfig::new(device_id, 1);
    let mut core = MeshCore::new(
        config,
        StdoutRadio { device_id },
        HostClockGps,
        DummySensors,
        NullSink,
    );

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
