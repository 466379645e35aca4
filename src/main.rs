//! rcgpiod — RF remote receiver to GPIO dispatch daemon.
//!
//! Hexagonal architecture with a single-threaded, readiness-driven loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  RcRecvDevice       HardwareAdapter      LogEventSink          │
//! │  (ReceiverPort)     (ActuatorPort)       (EventSink)           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Dispatcher (pure logic)                   │    │
//! │  │  MappingTable · DebounceFilter                         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  DaemonContext (prime · detach · run · release) · signals      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::{LevelFilter, error, info, warn};

use rcgpiod::adapters::gpio::GpioController;
use rcgpiod::adapters::hardware::HardwareAdapter;
use rcgpiod::adapters::log_sink::LogEventSink;
use rcgpiod::adapters::rcrecv::RcRecvDevice;
use rcgpiod::app::service::Dispatcher;
use rcgpiod::cli::{self, Command};
use rcgpiod::config::DaemonConfig;
use rcgpiod::error::LifecycleError;
use rcgpiod::lifecycle::{DaemonContext, daemon, signals};
use rcgpiod::logging;

fn main() -> ExitCode {
    let mut argv = std::env::args();
    let program = argv.next().unwrap_or_else(|| "rcgpiod".to_owned());

    let args = match cli::parse_args(argv) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            println!("{}", cli::usage(&program));
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{program}: {e}");
            eprintln!("{}", cli::usage(&program));
            return ExitCode::FAILURE;
        }
    };

    let config = match args.into_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{program}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = if config.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    if let Err(e) = logging::init(level) {
        eprintln!("{program}: cannot install logger: {e}");
        return ExitCode::FAILURE;
    }
    logging::install_panic_hook();

    let status = match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    };
    logging::close_syslog();
    status
}

fn run(config: &DaemonConfig) -> Result<()> {
    info!("rcgpiod v{} starting", env!("CARGO_PKG_VERSION"));

    // ── Step 1: devices ───────────────────────────────────────
    let gpio = GpioController::open(&config.gpio_device)
        .with_context(|| format!("Failed to open '{}'", config.gpio_device.display()))?;
    let receiver = RcRecvDevice::open(&config.receiver_device)?;

    // ── Step 2: context + stale drain ─────────────────────────
    let dispatcher = Dispatcher::new(config.mapping_table(), config.interval_ms, config.poll_timeout());
    let mut ctx = DaemonContext::new(receiver, HardwareAdapter::new(gpio), LogEventSink::new(), dispatcher);
    ctx.prime().context("Failed to arm the receiver")?;

    if ctx.dispatcher().table().is_empty() {
        warn!("No code mappings configured; received codes will be ignored");
    }

    // ── Step 3: single-instance lock ──────────────────────────
    ctx.acquire_instance_lock(&config.pid_file)?;

    // ── Step 4: detach ────────────────────────────────────────
    if config.background {
        ctx.detach(daemon::detach).context("Failed to detach from the controlling session")?;
        logging::detach_stderr();
    } else {
        ctx.write_pid();
    }

    // ── Step 5: dispatch until SIGINT / SIGTERM ───────────────
    signals::install_termination_handlers().map_err(LifecycleError::Signals)?;
    let result = ctx.run(signals::shutdown_flag());

    ctx.release();
    result?;
    info!("rcgpiod stopped");
    Ok(())
}
