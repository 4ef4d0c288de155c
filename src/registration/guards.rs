use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Host capabilities whose registration APIs are not idempotent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Command palette entries
    Commands,
    /// Language model tools
    Tools,
    /// Chat participant
    Participant,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Self::Commands, Self::Tools, Self::Participant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commands => "commands",
            Self::Tools => "tools",
            Self::Participant => "participant",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commands" => Ok(Self::Commands),
            "tools" => Ok(Self::Tools),
            "participant" => Ok(Self::Participant),
            _ => Err(format!("Invalid capability: {s}")),
        }
    }
}

/// Per-capability registration latches for one activation lifetime.
///
/// Callers check [`is_registered`](Self::is_registered) before calling a host
/// registration API and latch with [`set_registered`](Self::set_registered)
/// only after that call succeeds. Only deactivation resets the set, and it
/// always resets every flag at once.
#[derive(Debug)]
pub struct RegistrationGuardSet {
    flags: RwLock<HashMap<Capability, bool>>,
}

impl RegistrationGuardSet {
    pub fn new() -> Self {
        Self {
            flags: RwLock::new(Self::cleared()),
        }
    }

    pub fn is_registered(&self, capability: Capability) -> bool {
        self.flags
            .read()
            .get(&capability)
            .copied()
            .unwrap_or(false)
    }

    pub fn set_registered(&self, capability: Capability, registered: bool) {
        self.flags.write().insert(capability, registered);
    }

    /// Capabilities currently latched, in declaration order
    pub fn registered(&self) -> Vec<Capability> {
        let flags = self.flags.read();
        Capability::ALL
            .into_iter()
            .filter(|capability| flags.get(capability).copied().unwrap_or(false))
            .collect()
    }

    pub fn any_registered(&self) -> bool {
        self.flags.read().values().any(|registered| *registered)
    }

    /// Clear every latch in one critical section
    pub(crate) fn reset_all(&self) {
        *self.flags.write() = Self::cleared();
    }

    fn cleared() -> HashMap<Capability, bool> {
        Capability::ALL
            .into_iter()
            .map(|capability| (capability, false))
            .collect()
    }
}

impl Default for RegistrationGuardSet {
    fn default() -> Self {
        Self::new()
    }
}
