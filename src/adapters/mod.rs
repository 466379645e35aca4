//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements    | Connects to                     |
//! |-------------|---------------|---------------------------------|
//! | `rcrecv`    | ReceiverPort  | rcrecv(4) device / sim FIFO     |
//! | `hardware`  | ActuatorPort  | gpioc(4) controller / sim bank  |
//! | `log_sink`  | EventSink     | System log                      |
//!
//! `gpio` and `readiness` are the device plumbing underneath them.

pub mod gpio;
pub mod hardware;
pub mod log_sink;
pub mod rcrecv;
pub mod readiness;
