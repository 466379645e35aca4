//! Code → pin action table.
//!
//! Built once from configuration before the dispatch loop starts and never
//! mutated afterwards, so the loop reads it without any synchronisation.
//! Lookup is a linear scan in insertion order: the first entry whose code
//! matches wins, and later duplicates are simply unreachable.

use core::fmt;

use serde::{Deserialize, Serialize};

/// GPIO pin number on the controller.
pub type PinId = u32;

/// What to do with a pin when its code arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinAction {
    /// Drive the pin high.
    Set,
    /// Drive the pin low.
    Clear,
    /// Invert the current output level.
    Toggle,
}

impl PinAction {
    /// Single-letter tag used in audit records.
    pub const fn letter(self) -> char {
        match self {
            Self::Set => 'S',
            Self::Clear => 'U',
            Self::Toggle => 'T',
        }
    }
}

impl fmt::Display for PinAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => write!(f, "set"),
            Self::Clear => write!(f, "clear"),
            Self::Toggle => write!(f, "toggle"),
        }
    }
}

/// One row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMapping {
    pub code: u64,
    pub pin: PinId,
    pub action: PinAction,
}

impl CodeMapping {
    pub const fn new(code: u64, pin: PinId, action: PinAction) -> Self {
        Self { code, pin, action }
    }
}

/// Ordered, immutable list of [`CodeMapping`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: Vec<CodeMapping>,
}

impl MappingTable {
    pub fn new(entries: Vec<CodeMapping>) -> Self {
        Self { entries }
    }

    /// Build from `(action, code, pin)` triples in caller order.
    pub fn from_triples(triples: impl IntoIterator<Item = (PinAction, u64, PinId)>) -> Self {
        triples
            .into_iter()
            .map(|(action, code, pin)| CodeMapping::new(code, pin, action))
            .collect()
    }

    /// First entry whose code equals `code`, if any.
    pub fn lookup(&self, code: u64) -> Option<&CodeMapping> {
        self.entries.iter().find(|m| m.code == code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodeMapping> {
        self.entries.iter()
    }
}

impl FromIterator<CodeMapping> for MappingTable {
    fn from_iter<I: IntoIterator<Item = CodeMapping>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
