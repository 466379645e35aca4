//! Application core — pure dispatch logic, zero I/O.
//!
//! Maps received RF codes to pin actions, filters repeats, and drives the
//! readiness loop. All interaction with devices happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! a receiver or a GPIO controller.

pub mod debounce;
pub mod events;
pub mod mapping;
pub mod ports;
pub mod service;
