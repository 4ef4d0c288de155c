use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::event::{LedgerDetails, LedgerEvent, LedgerEventType, RegistrationResult};

/// Append-only, in-memory record of lifecycle events.
///
/// The ledger is unbounded for the life of the process. It is a diagnostic
/// aid; persisted audit logging happens elsewhere.
#[derive(Debug)]
pub struct ActivationLedger {
    state: Mutex<LedgerState>,
    trace_events: bool,
}

#[derive(Debug, Default)]
struct LedgerState {
    sequence: u64,
    events: Vec<LedgerEvent>,
}

impl ActivationLedger {
    /// Creates an empty ledger that mirrors appended events to `tracing`
    pub fn new() -> Self {
        Self::with_tracing(true)
    }

    pub fn with_tracing(trace_events: bool) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            trace_events,
        }
    }

    /// Append one event with a fresh timestamp
    pub fn record(&self, details: LedgerDetails) -> LedgerEvent {
        let mut guard = self.state.lock();
        guard.sequence += 1;
        let event = LedgerEvent {
            sequence: guard.sequence,
            timestamp: Utc::now(),
            event_type: details.event_type(),
            details,
        };
        guard.events.push(event.clone());
        drop(guard);

        if self.trace_events {
            tracing::debug!(
                sequence = event.sequence,
                event_type = %event.event_type,
                details = ?event.details,
                "Ledger event recorded"
            );
        }

        event
    }

    /// Record a `prompt` event with `{reason, mode, ...extra}` as its payload
    pub fn record_prompt_event(
        &self,
        reason: impl Into<String>,
        mode: impl Into<String>,
        extra: Map<String, Value>,
    ) -> LedgerEvent {
        self.record(LedgerDetails::prompt(reason, mode, extra))
    }

    /// Immutable view of the ledger with its derived summary
    pub fn snapshot(&self) -> LedgerSnapshot {
        let events = self.state.lock().events.clone();
        let latest = LedgerSummary::from_events(&events);
        LedgerSnapshot { events, latest }
    }

    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().events.is_empty()
    }

    /// Drop every event and restart the sequence. Diagnostic reset only.
    pub(crate) fn reset(&self) {
        let mut guard = self.state.lock();
        guard.events.clear();
        guard.sequence = 0;
    }
}

impl Default for ActivationLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub events: Vec<LedgerEvent>,
    pub latest: LedgerSummary,
}

impl LedgerSnapshot {
    /// Events of a single type, in insertion order
    pub fn events_of(&self, event_type: LedgerEventType) -> Vec<&LedgerEvent> {
        self.events
            .iter()
            .filter(|event| event.event_type == event_type)
            .collect()
    }

    pub fn last(&self) -> Option<&LedgerEvent> {
        self.events.last()
    }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Summary fields derived from the events at query time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Timestamp of the first registration that reached a live container
    pub first_registration_at: Option<DateTime<Utc>>,
    pub last_event_at: Option<DateTime<Utc>>,
    pub total_events: usize,
    pub registrations: usize,
    pub skipped_registrations: usize,
    pub anomalies: usize,
    pub prompts: usize,
}

impl LedgerSummary {
    fn from_events(events: &[LedgerEvent]) -> Self {
        let mut summary = Self {
            total_events: events.len(),
            last_event_at: events.last().map(|event| event.timestamp),
            ..Self::default()
        };

        for event in events {
            match &event.details {
                LedgerDetails::Registration { result, .. } => match result {
                    RegistrationResult::Pushed => {
                        summary.registrations += 1;
                        if summary.first_registration_at.is_none() {
                            summary.first_registration_at = Some(event.timestamp);
                        }
                    }
                    RegistrationResult::Skipped => summary.skipped_registrations += 1,
                },
                LedgerDetails::Anomaly { .. } => summary.anomalies += 1,
                LedgerDetails::Prompt { .. } => summary.prompts += 1,
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::RegistrationIntent;
    use serde_json::json;

    fn pushed(id: &str) -> LedgerDetails {
        LedgerDetails::registration(
            RegistrationIntent::new("command", id),
            RegistrationResult::Pushed,
        )
    }

    #[test]
    fn test_events_are_ordered_by_insertion() {
        let ledger = ActivationLedger::with_tracing(false);
        ledger.record(pushed("a"));
        ledger.record(LedgerDetails::disposed_container(RegistrationIntent::new(
            "command", "b",
        )));
        ledger.record_prompt_event("reload", "immediate", Map::new());

        let snapshot = ledger.snapshot();
        let sequences: Vec<u64> = snapshot.events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(
            snapshot
                .events
                .iter()
                .map(|e| e.event_type)
                .collect::<Vec<_>>(),
            vec![
                LedgerEventType::Registration,
                LedgerEventType::Anomaly,
                LedgerEventType::Prompt
            ]
        );
    }

    #[test]
    fn test_empty_ledger_has_no_first_registration() {
        let ledger = ActivationLedger::new();
        let snapshot = ledger.snapshot();
        assert!(snapshot.events.is_empty());
        assert_eq!(snapshot.latest, LedgerSummary::default());
    }

    #[test]
    fn test_first_registration_is_set_once() {
        let ledger = ActivationLedger::with_tracing(false);
        ledger.record_prompt_event("x", "scheduled", Map::new());
        ledger.record(LedgerDetails::registration(
            RegistrationIntent::new("command", "a"),
            RegistrationResult::Skipped,
        ));
        let first = ledger.record(pushed("a"));
        ledger.record(pushed("b"));

        let summary = ledger.snapshot().latest;
        assert_eq!(summary.first_registration_at, Some(first.timestamp));
        assert_eq!(summary.registrations, 2);
        assert_eq!(summary.skipped_registrations, 1);
        assert_eq!(summary.prompts, 1);
        assert_eq!(summary.total_events, 4);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_appends() {
        let ledger = ActivationLedger::with_tracing(false);
        ledger.record(pushed("a"));
        let snapshot = ledger.snapshot();
        ledger.record(pushed("b"));

        assert_eq!(snapshot.events.len(), 1);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_reset_clears_events_and_sequence() {
        let ledger = ActivationLedger::with_tracing(false);
        ledger.record(pushed("a"));
        ledger.reset();
        assert!(ledger.is_empty());

        let event = ledger.record(pushed("b"));
        assert_eq!(event.sequence, 1);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let ledger = ActivationLedger::with_tracing(false);
        let mut extra = Map::new();
        extra.insert("source".to_string(), json!("t"));
        ledger.record_prompt_event("x", "scheduled", extra);

        let value = ledger.snapshot().to_json().unwrap();
        assert_eq!(value["events"][0]["event_type"], json!("prompt"));
        assert_eq!(value["events"][0]["details"]["source"], json!("t"));
        assert_eq!(value["latest"]["prompts"], json!(1));
    }

    #[test]
    fn test_snapshot_json_reads_back_unchanged() {
        let ledger = ActivationLedger::with_tracing(false);
        ledger.record(pushed("a"));
        ledger.record(LedgerDetails::disposed_container(RegistrationIntent::new(
            "command", "b",
        )));
        let mut extra = Map::new();
        extra.insert(
            "context_state".to_string(),
            json!({"disposed": true, "fallback_used": true}),
        );
        extra.insert("source".to_string(), json!("t"));
        ledger.record_prompt_event("x", "scheduled", extra);

        let snapshot = ledger.snapshot();
        let restored: LedgerSnapshot =
            serde_json::from_value(snapshot.to_json().unwrap()).unwrap();

        assert_eq!(restored, snapshot);
        for event in &restored.events {
            assert_eq!(event.details.event_type(), event.event_type);
        }
        assert_eq!(
            restored.events[2].details.field("context_state"),
            Some(json!({"disposed": true, "fallback_used": true}))
        );
    }
}
