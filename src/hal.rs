//! External collaborator traits: radio, GPS, sensors, and the gateway sink.
//!
//! Mirrors the teacher's `Radio` trait boundary (`lorawan/src/radio/traits.rs`):
//! the mesh core is generic over these four traits and never depends on a
//! concrete driver.

use crate::config::MAX_MESSAGE_SIZE;
use crate::wire::FullReport;

/// Radio-surfaced error kinds, per spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Radio failed to initialize; fatal at startup.
    Init,
    /// A transmit attempt failed.
    Send,
    /// A receive attempt failed.
    Receive,
    /// An operation timed out.
    Timeout,
    /// Received frame failed a CRC check.
    Crc,
    /// No frame was available to poll.
    NoPacket,
}

/// One received frame, with its payload and link metadata.
///
/// Only `payload`/`rssi`/`snr` are consumed by the mesh core; any lower-layer
/// link header a driver prepends is the driver's concern, not the core's
/// (spec.md §9 Open Questions).
#[derive(Debug, Clone, Copy)]
pub struct Packet {
    /// Raw mesh-layer payload bytes (header + message payload), as put on
    /// the air by the sender.
    pub payload: [u8; MAX_MESSAGE_SIZE],
    /// Valid length of `payload`.
    pub payload_len: u8,
    /// Received signal strength, in dBm.
    pub rssi: i16,
    /// Signal-to-noise ratio, in dB (tenths, i.e. 125 == 12.5 dB).
    pub snr_x10: i16,
}

impl Packet {
    /// Borrow the valid portion of the payload.
    pub fn as_slice(&self) -> &[u8] {
        &self.payload[..self.payload_len as usize]
    }
}

/// The half-duplex broadcast radio collaborator.
pub trait Radio {
    /// Initialize the radio; `false` is a fatal startup error (spec.md §7).
    fn init(&mut self) -> bool;

    /// Put the radio into a low-power standby state.
    fn standby(&mut self);

    /// Whether the radio is idle and ready to transmit or receive.
    fn is_ready(&self) -> bool;

    /// Transmit `bytes` (at most [`MAX_MESSAGE_SIZE`]); blocking. Returns
    /// `false` on failure; the core does not retry (spec.md §7).
    fn send_binary(&mut self, bytes: &[u8]) -> bool;

    /// Switch the radio into receive mode.
    fn start_receive(&mut self);

    /// Whether a frame is waiting to be polled.
    fn packet_available(&self) -> bool;

    /// Consume one waiting frame, if any.
    fn poll_rx(&mut self) -> Option<Packet>;

    /// This radio's configured device id.
    fn device_id(&self) -> u8;

    /// Block for approximately `ms` milliseconds. Used to space out
    /// back-to-back transmissions (spec.md §4.H's inter-frame gap) so the
    /// receiving end has time to switch back to listening between frames.
    fn delay_ms(&mut self, ms: u32);

    /// No-op on real hardware; used by simulated transports to advance
    /// their own clock or queue.
    fn poll_network(&mut self) {}
}

/// A single GPS reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpsSnapshot {
    /// UTC hour-of-day.
    pub hour: u8,
    /// UTC minute.
    pub minute: u8,
    /// UTC second.
    pub second: u8,
    /// Latitude, millionths of a degree.
    pub lat_x1e6: i32,
    /// Longitude, millionths of a degree.
    pub lon_x1e6: i32,
    /// Altitude, meters.
    pub alt_m: i16,
    /// Satellites used in the fix.
    pub satellites: u8,
    /// Horizontal dilution of precision, tenths.
    pub hdop_x10: u8,
    /// Whether `hour`/`minute`/`second` carry a valid fix.
    pub datetime_valid: bool,
    /// Whether `lat_x1e6`/`lon_x1e6`/`alt_m` carry a valid fix.
    pub location_valid: bool,
}

/// The GPS collaborator.
pub trait Gps {
    /// Read the current GPS state.
    fn snapshot(&self) -> GpsSnapshot;
}

/// A single environmental sensor reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorReading {
    /// Temperature, tenths of a degree Fahrenheit.
    pub temp_f_x10: i16,
    /// Relative humidity, tenths of a percent.
    pub humidity_x10: u16,
    /// Barometric pressure, hPa.
    pub pressure_hpa: u16,
    /// Barometric altitude estimate, meters.
    pub altitude_m: i16,
    /// Whether this reading is trustworthy.
    pub sensors_ok: bool,
}

/// The environmental sensor collaborator.
pub trait Sensors {
    /// Read the current sensor state.
    fn read(&self) -> SensorReading;

    /// Re-calibrate the barometric altitude estimate against a known GPS
    /// altitude. Optional: the default implementation is a no-op.
    fn calibrate_with_gps(&mut self, _alt_m: i16) {}
}

/// The gateway's delivery sink: dashboards, cloud uploaders, and the like are
/// out of scope; this trait is the only hand-off point.
pub trait Sink {
    /// Called for each accepted non-self `FullReport`, after dedup and
    /// before the forwarding decision.
    fn on_report(&mut self, source_id: u8, report: &FullReport, rssi: i16, snr_x10: i16);
}
