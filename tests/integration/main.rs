//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters. All tests run on the host with no receiver or
//! GPIO controller required.

mod dispatch_tests;
mod lifecycle_tests;
mod mock_hw;
mod sim_device_tests;
