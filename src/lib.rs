//! rcgpiod library.
//!
//! Exposes the dispatch core, the device adapters and the lifecycle pieces
//! for the daemon binary and for integration testing. FreeBSD-specific
//! device access is guarded by `#[cfg(target_os = "freebsd")]` inside each
//! adapter; other unix targets get a simulation.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
