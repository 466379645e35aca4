//! Fuzz target: command-line and sub-option parsing.
//!
//! Splits arbitrary input into arguments and runs them through
//! `parse_args`; every `code=…,pin=…` fragment also goes through
//! `parse_mapping`. Neither may panic, and an accepted mapping must
//! round-trip through its canonical spelling.
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use rcgpiod::app::mapping::PinAction;
use rcgpiod::cli::{Command, parse_args, parse_mapping};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(Command::Run(args)) = parse_args(text.split(' ')) {
        for m in &args.mappings {
            let spec = format!("code={:#x},pin={}", m.code, m.pin);
            assert_eq!(parse_mapping(m.action, &spec).ok(), Some(*m));
        }
    }

    for spec in text.split(' ') {
        let _ = parse_mapping(PinAction::Toggle, spec);
    }
});
