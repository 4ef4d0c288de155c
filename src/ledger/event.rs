use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::constants::intents;
use crate::registration::Capability;

/// Kinds of lifecycle events the ledger records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEventType {
    /// A disposable was handed to the host, or a guarded registration was skipped
    Registration,
    /// A recovered-from abnormal condition
    Anomaly,
    /// A prompt was shown (or scheduled) to the user
    Prompt,
}

impl fmt::Display for LedgerEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registration => write!(f, "registration"),
            Self::Anomaly => write!(f, "anomaly"),
            Self::Prompt => write!(f, "prompt"),
        }
    }
}

impl std::str::FromStr for LedgerEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(Self::Registration),
            "anomaly" => Ok(Self::Anomaly),
            "prompt" => Ok(Self::Prompt),
            _ => Err(format!("Invalid ledger event type: {s}")),
        }
    }
}

/// What a registration was for. Diagnostic only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationIntent {
    pub kind: String,
    pub id: String,
}

impl RegistrationIntent {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Intent for a host capability registration
    pub fn capability(capability: Capability) -> Self {
        Self::new(intents::CAPABILITY, capability.as_str())
    }
}

impl fmt::Display for RegistrationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationResult {
    Pushed,
    Skipped,
}

impl fmt::Display for RegistrationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pushed => write!(f, "pushed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Container condition observed when an anomaly was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextState {
    pub disposed: bool,
    pub fallback_used: bool,
}

/// Structured payload of a ledger event.
///
/// The variant determines the event type, so a registration payload can never
/// be recorded as a prompt.
///
/// Serialized without a tag; reading one back goes through [`LedgerEvent`],
/// whose `event_type` selects the variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LedgerDetails {
    Registration {
        intent: RegistrationIntent,
        result: RegistrationResult,
    },
    Anomaly {
        context_state: ContextState,
        #[serde(skip_serializing_if = "Option::is_none")]
        intent: Option<RegistrationIntent>,
    },
    Prompt {
        reason: String,
        mode: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl LedgerDetails {
    pub fn registration(intent: RegistrationIntent, result: RegistrationResult) -> Self {
        Self::Registration { intent, result }
    }

    /// Anomaly for a disposed container whose resource went to the fallback list
    pub fn disposed_container(intent: RegistrationIntent) -> Self {
        Self::Anomaly {
            context_state: ContextState {
                disposed: true,
                fallback_used: true,
            },
            intent: Some(intent),
        }
    }

    /// Prompt payload; `reason` and `mode` always win over same-named extra keys
    pub fn prompt(
        reason: impl Into<String>,
        mode: impl Into<String>,
        mut extra: Map<String, Value>,
    ) -> Self {
        extra.remove("reason");
        extra.remove("mode");
        Self::Prompt {
            reason: reason.into(),
            mode: mode.into(),
            extra,
        }
    }

    pub fn event_type(&self) -> LedgerEventType {
        match self {
            Self::Registration { .. } => LedgerEventType::Registration,
            Self::Anomaly { .. } => LedgerEventType::Anomaly,
            Self::Prompt { .. } => LedgerEventType::Prompt,
        }
    }

    /// Look up a top-level payload field by its serialized name
    pub fn field(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.get(key).cloned(),
            _ => None,
        }
    }

    /// Whether this is a registration that actually reached the host container
    pub fn is_pushed_registration(&self) -> bool {
        matches!(
            self,
            Self::Registration {
                result: RegistrationResult::Pushed,
                ..
            }
        )
    }
}

/// One append-only ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLedgerEvent")]
pub struct LedgerEvent {
    /// Insertion order, starting at 1
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event_type: LedgerEventType,
    pub details: LedgerDetails,
}

#[derive(Deserialize)]
struct RawLedgerEvent {
    sequence: u64,
    timestamp: DateTime<Utc>,
    event_type: LedgerEventType,
    details: Value,
}

impl TryFrom<RawLedgerEvent> for LedgerEvent {
    type Error = serde_json::Error;

    fn try_from(raw: RawLedgerEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            sequence: raw.sequence,
            timestamp: raw.timestamp,
            event_type: raw.event_type,
            details: LedgerDetails::from_value(raw.event_type, raw.details)?,
        })
    }
}

#[derive(Deserialize)]
struct RegistrationPayload {
    intent: RegistrationIntent,
    result: RegistrationResult,
}

#[derive(Deserialize)]
struct AnomalyPayload {
    context_state: ContextState,
    #[serde(default)]
    intent: Option<RegistrationIntent>,
}

#[derive(Deserialize)]
struct PromptPayload {
    reason: String,
    mode: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl LedgerDetails {
    /// Read a serialized payload as the variant for `event_type`
    pub fn from_value(event_type: LedgerEventType, details: Value) -> serde_json::Result<Self> {
        let details = match event_type {
            LedgerEventType::Registration => {
                let payload: RegistrationPayload = serde_json::from_value(details)?;
                Self::Registration {
                    intent: payload.intent,
                    result: payload.result,
                }
            }
            LedgerEventType::Anomaly => {
                let payload: AnomalyPayload = serde_json::from_value(details)?;
                Self::Anomaly {
                    context_state: payload.context_state,
                    intent: payload.intent,
                }
            }
            LedgerEventType::Prompt => {
                let payload: PromptPayload = serde_json::from_value(details)?;
                Self::Prompt {
                    reason: payload.reason,
                    mode: payload.mode,
                    extra: payload.extra,
                }
            }
        };
        Ok(details)
    }
}
