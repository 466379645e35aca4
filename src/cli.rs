//! Command-line parsing.
//!
//! getopt_long-style options plus the `code=<n>,pin=<n>` sub-option
//! mini-language used by `-s`, `-u` and `-t`. Numbers follow C `strtoul`
//! base-0 rules (`0x` hex, leading `0` octal, decimal otherwise).

use std::path::PathBuf;

use thiserror::Error;

use crate::app::mapping::{CodeMapping, PinAction, PinId};
use crate::config::DaemonConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    #[error("option '{0}' requires an argument")]
    MissingValue(String),

    #[error("option '{0}' doesn't allow an argument")]
    UnexpectedValue(String),

    #[error("unrecognized option '{0}'")]
    UnknownOption(String),

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("no code")]
    NoCode,

    #[error("no pin number")]
    NoPin,

    #[error("illegal sub option {0}")]
    IllegalSubOption(String),

    #[error("no code neither pin number")]
    EmptyMapping,

    #[error("mapping '{0}' needs both code and pin")]
    IncompleteMapping(String),
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(CliArgs),
    Help,
}

/// Options as given; unset fields fall back to the file or defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub config_file: Option<PathBuf>,
    pub receiver_device: Option<PathBuf>,
    pub gpio_device: Option<PathBuf>,
    pub interval_ms: Option<u64>,
    pub pid_file: Option<PathBuf>,
    pub background: bool,
    pub verbose: bool,
    pub mappings: Vec<CodeMapping>,
}

impl CliArgs {
    /// Merge onto the config file (if any) and validate.
    pub fn into_config(self) -> Result<DaemonConfig, ConfigError> {
        let mut cfg = match &self.config_file {
            Some(path) => DaemonConfig::from_json_file(path)?,
            None => DaemonConfig::default(),
        };

        if let Some(dev) = self.receiver_device {
            cfg.receiver_device = dev;
        }
        if let Some(dev) = self.gpio_device {
            cfg.gpio_device = dev;
        }
        if let Some(ms) = self.interval_ms {
            cfg.interval_ms = ms;
        }
        if let Some(path) = self.pid_file {
            cfg.pid_file = path;
        }
        cfg.background |= self.background;
        cfg.verbose |= self.verbose;
        cfg.mappings.extend(self.mappings);

        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opt {
    Device,
    Gpio,
    Interval,
    Set,
    Unset,
    Toggle,
    Background,
    PidFile,
    Config,
    Verbose,
    Help,
}

impl Opt {
    fn from_short(c: char) -> Option<Self> {
        Some(match c {
            'd' => Self::Device,
            'g' => Self::Gpio,
            'i' => Self::Interval,
            's' => Self::Set,
            'u' => Self::Unset,
            't' => Self::Toggle,
            'b' => Self::Background,
            'p' => Self::PidFile,
            'c' => Self::Config,
            'v' => Self::Verbose,
            'h' => Self::Help,
            _ => return None,
        })
    }

    fn from_long(name: &str) -> Option<Self> {
        Some(match name {
            "device" => Self::Device,
            "gpio" => Self::Gpio,
            "interval" => Self::Interval,
            "set" => Self::Set,
            "unset" => Self::Unset,
            "toggle" => Self::Toggle,
            "background" => Self::Background,
            "pidfile" => Self::PidFile,
            "config" => Self::Config,
            "verbose" => Self::Verbose,
            "help" => Self::Help,
            _ => return None,
        })
    }

    fn takes_value(self) -> bool {
        !matches!(self, Self::Background | Self::Verbose | Self::Help)
    }
}

/// Parse the arguments that follow the program name.
pub fn parse_args<I, S>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out = CliArgs::default();
    let mut it = args.into_iter().map(Into::into);

    while let Some(arg) = it.next() {
        if let Some(long) = arg.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((n, v)) => (n, Some(v.to_owned())),
                None => (long, None),
            };
            let opt = Opt::from_long(name).ok_or_else(|| CliError::UnknownOption(arg.clone()))?;
            let value = if opt.takes_value() {
                match inline {
                    Some(v) => Some(v),
                    None => Some(it.next().ok_or_else(|| CliError::MissingValue(arg.clone()))?),
                }
            } else if inline.is_some() {
                return Err(CliError::UnexpectedValue(format!("--{name}")));
            } else {
                None
            };
            if apply(&mut out, opt, value)? {
                return Ok(Command::Help);
            }
            continue;
        }

        let Some(shorts) = arg.strip_prefix('-').filter(|s| !s.is_empty()) else {
            return Err(CliError::UnexpectedArgument(arg.clone()));
        };

        // Flags may be grouped (`-bv`); a value-taking option consumes the
        // rest of the word or the next argument.
        for (idx, c) in shorts.char_indices() {
            let opt = Opt::from_short(c).ok_or_else(|| CliError::UnknownOption(format!("-{c}")))?;
            if !opt.takes_value() {
                if apply(&mut out, opt, None)? {
                    return Ok(Command::Help);
                }
                continue;
            }
            let rest = &shorts[idx + c.len_utf8()..];
            let value = if rest.is_empty() {
                it.next().ok_or_else(|| CliError::MissingValue(format!("-{c}")))?
            } else {
                rest.to_owned()
            };
            apply(&mut out, opt, Some(value))?;
            break;
        }
    }

    Ok(Command::Run(out))
}

/// Returns `true` when help was requested.
fn apply(out: &mut CliArgs, opt: Opt, value: Option<String>) -> Result<bool, CliError> {
    let value = value.unwrap_or_default();
    match opt {
        Opt::Device => out.receiver_device = Some(PathBuf::from(value)),
        Opt::Gpio => out.gpio_device = Some(PathBuf::from(value)),
        Opt::Interval => out.interval_ms = Some(parse_number(&value)?),
        Opt::Set => out.mappings.push(parse_mapping(PinAction::Set, &value)?),
        Opt::Unset => out.mappings.push(parse_mapping(PinAction::Clear, &value)?),
        Opt::Toggle => out.mappings.push(parse_mapping(PinAction::Toggle, &value)?),
        Opt::Background => out.background = true,
        Opt::PidFile => out.pid_file = Some(PathBuf::from(value)),
        Opt::Config => out.config_file = Some(PathBuf::from(value)),
        Opt::Verbose => out.verbose = true,
        Opt::Help => return Ok(true),
    }
    Ok(false)
}

/// Parse an unsigned number with `strtoul(…, 0)` base detection.
pub fn parse_number(text: &str) -> Result<u64, CliError> {
    let t = text.trim();
    let invalid = || CliError::InvalidNumber(text.to_owned());

    let (digits, radix) = if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        (hex, 16)
    } else if t.len() > 1 && t.starts_with('0') {
        (&t[1..], 8)
    } else {
        (t, 10)
    };

    if digits.is_empty() || digits.starts_with(|c| c == '+' || c == '-') {
        return Err(invalid());
    }
    u64::from_str_radix(digits, radix).map_err(|_| invalid())
}

/// Parse `code=<n>,pin=<n>` into a mapping for `action`.
pub fn parse_mapping(action: PinAction, spec: &str) -> Result<CodeMapping, CliError> {
    let mut code = None;
    let mut pin = None;

    for item in spec.split(',').filter(|s| !s.is_empty()) {
        let (key, value) = match item.split_once('=') {
            Some((k, v)) => (k, Some(v).filter(|v| !v.is_empty())),
            None => (item, None),
        };
        match key {
            "code" => code = Some(parse_number(value.ok_or(CliError::NoCode)?)?),
            "pin" => {
                let raw = value.ok_or(CliError::NoPin)?;
                let n = parse_number(raw)?;
                pin = Some(PinId::try_from(n).map_err(|_| CliError::InvalidNumber(raw.to_owned()))?);
            }
            other => return Err(CliError::IllegalSubOption(other.to_owned())),
        }
    }

    match (code, pin) {
        (Some(code), Some(pin)) => Ok(CodeMapping::new(code, pin, action)),
        (None, None) => Err(CliError::EmptyMapping),
        _ => Err(CliError::IncompleteMapping(spec.to_owned())),
    }
}

/// Usage text for `-h` and argument errors.
pub fn usage(program: &str) -> String {
    format!(
        "usage: {program} [-d <ctldev>] [-g <gpioc>] [-i <ms>] [-c <file>] [-p <pidfile>] \
         -(s|u|t) code=<code>,pin=<pin> [-b] [-v] [-h]

Options:
    -d, --device=<ctldev>
                        A remote control receiver device name.
                        Default: /dev/rcrecv;
    -g, --gpio=<gpioc>  A gpio controller device name
                        Default: /dev/gpioc0;
    -i, --interval=<ms> A minimal valid interval between repeated codes.
                        If an interval is less than that value the next same ones
                        will be ignored. Default value is 1000ms;
    -s, --set code=<code>,pin=<pin>
    -u, --unset code=<code>,pin=<pin>
    -t, --toggle code=<code>,pin=<pin>
                        A way which the <pin> should be changed after the
                        <code> is received; may be repeated;
    -c, --config=<file> A JSON configuration file; options given on the
                        command line override it;
    -p, --pidfile=<path>
                        Single-instance lock file.
                        Default: /var/run/rcgpiod.pid;
    -b, --background    Run in background as a daemon;
    -v, --verbose       Log debug messages;
    -h, --help          Print this help.
"
    )
}
