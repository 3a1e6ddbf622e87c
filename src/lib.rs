//! # mesh-core
//!
//! The mesh networking core of a wireless sensor-mesh system: nodes exchange
//! sensor reports over a narrowband half-duplex broadcast radio using
//! time-synchronized TDMA, gradient routing toward a single gateway, and
//! duplicate-suppressed multi-hop forwarding.
//!
//! ## Scope
//!
//! This crate implements four tightly coupled subsystems:
//!
//! - the [`scheduler`] (GPS- or network-synchronized TDMA slot ownership),
//! - the [`router`] (beacon-driven gradient routing with flooding fallback),
//! - the packet ingest/forward [`pipeline`] (duplicate suppression, TTL,
//!   bounded transmit queue),
//! - the [`net_time`] network-time relay for nodes without a GPS fix.
//!
//! The radio driver, GPS receiver, sensor acquisition, and any dashboard,
//! storage, or cloud-facing surface are external collaborators whose
//! interfaces are declared in [`hal`] — this crate does not implement them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mesh_core::{config::MeshConfig, pipeline::MeshCore};
//!
//! # fn doc(radio: impl mesh_core::hal::Radio, gps: impl mesh_core::hal::Gps,
//! #        sensors: impl mesh_core::hal::Sensors, sink: impl mesh_core::hal::Sink) {
//! let config = MeshConfig::new(3, 1); // device id 3, gateway id 1
//! let mut core = MeshCore::new(config, radio, gps, sensors, sink);
//!
//! // called once per tick from the embedding firmware's main loop
//! core.on_rx_tick(0);
//! core.on_scheduler_tick(0);
//! core.on_maintenance_tick(0);
//! # }
//! ```
//!
//! ## Safety
//!
//! This crate is `#![no_std]` by default and is intended for use on embedded
//! targets with a single-threaded cooperative main loop. The `std` feature
//! pulls in [`cli`], a desktop-simulation test affordance; it has been
//! designed with safety in mind but has not been audited.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Warn-level log call for a recoverable-but-notable condition. Expands to
/// `defmt::warn!` when the `defmt` feature is enabled, to nothing otherwise,
/// so call sites never need `#[cfg(feature = "defmt")]` of their own.
macro_rules! mesh_warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)*);
    };
}

/// Debug-level counterpart of [`mesh_warn`].
macro_rules! mesh_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
    };
}

pub(crate) use mesh_debug;
pub(crate) use mesh_warn;

#[cfg(feature = "std")]
pub mod cli;
pub mod config;
pub mod dup_cache;
pub mod error;
pub mod hal;
pub mod neighbor;
pub mod net_time;
pub mod pipeline;
pub mod router;
pub mod scheduler;
pub mod stats;
pub mod txqueue;
pub mod wire;

pub use error::{Error, Result};
