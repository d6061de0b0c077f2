//! Call-state tracking - turns raw telephony signals into classified call outcomes
//!
//! The classifier is a small state machine over `IDLE -> RINGING -> ACTIVE -> IDLE`.
//! It is a pure function of (current state, signal, clock): no I/O, so tests can
//! drive it with synthetic timestamps. Session state lives inside the classifier
//! instance, not in statics; callers must serialize signal delivery through a
//! single writer (one classifier per SIM / signal source).

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::{CallOutcome, CallType};

/// Raw telephony signal, as delivered by the OS layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSignal {
    /// Incoming call started ringing
    Ring { number: String },
    /// Line went off-hook: an incoming call was answered, or an outgoing
    /// call started (the number may not be observable in that case)
    OffHook { number: Option<String> },
    /// Outgoing call initiated (explicit signal, number known up front)
    NewOutgoing { number: String },
    /// Line returned to idle
    Idle,
}

/// Classifier phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Ringing,
    Active,
}

/// Tracks one call session and emits a `CallOutcome` when it completes
#[derive(Debug)]
pub struct CallEventClassifier {
    state: CallState,
    number: Option<String>,
    started_at: Option<DateTime<Utc>>,
    /// ACTIVE was entered from RINGING (answered incoming call)
    entered_via_ring: bool,
}

impl CallEventClassifier {
    pub fn new() -> Self {
        Self {
            state: CallState::Idle,
            number: None,
            started_at: None,
            entered_via_ring: false,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    /// Feed one signal using the wall clock
    pub fn handle(&mut self, signal: CallSignal) -> Option<CallOutcome> {
        self.handle_at(signal, Utc::now())
    }

    /// Feed one signal with an explicit timestamp (used by tests)
    pub fn handle_at(&mut self, signal: CallSignal, now: DateTime<Utc>) -> Option<CallOutcome> {
        match signal {
            CallSignal::Ring { number } => {
                if self.state != CallState::Idle {
                    debug!(state = ?self.state, "Ignoring ring signal outside IDLE");
                    return None;
                }
                if is_blank(&number) {
                    debug!("Ignoring ring signal with blank number");
                    return None;
                }
                debug!(number = %number, "Call ringing");
                self.state = CallState::Ringing;
                self.number = Some(number);
                self.started_at = Some(now);
                self.entered_via_ring = false;
                None
            }
            CallSignal::OffHook { number } => match self.state {
                CallState::Ringing => {
                    // Answered: keep the ring number and start time, the
                    // duration is measured from ring, not from answer.
                    debug!(number = ?self.number, "Incoming call answered");
                    self.state = CallState::Active;
                    self.entered_via_ring = true;
                    None
                }
                CallState::Idle => {
                    // Outgoing call observed directly in the active state.
                    // A signal carrying a blank number while idle is a no-op;
                    // an absent number still opens a session (the completed
                    // call classifies as UNKNOWN).
                    if matches!(&number, Some(n) if is_blank(n)) {
                        debug!("Ignoring off-hook signal with blank number");
                        return None;
                    }
                    debug!(number = ?number, "Outgoing call started");
                    self.state = CallState::Active;
                    self.number = number;
                    self.started_at = Some(now);
                    self.entered_via_ring = false;
                    None
                }
                CallState::Active => None,
            },
            CallSignal::NewOutgoing { number } => {
                if self.state != CallState::Idle {
                    debug!(state = ?self.state, "Ignoring outgoing signal outside IDLE");
                    return None;
                }
                if is_blank(&number) {
                    debug!("Ignoring outgoing signal with blank number");
                    return None;
                }
                debug!(number = %number, "New outgoing call");
                self.state = CallState::Active;
                self.number = Some(number);
                self.started_at = Some(now);
                self.entered_via_ring = false;
                None
            }
            CallSignal::Idle => match self.state {
                CallState::Idle => None,
                CallState::Ringing => {
                    debug!(number = ?self.number, "Missed call");
                    Some(self.finish(CallType::Missed, now))
                }
                CallState::Active => {
                    let call_type = if self.entered_via_ring {
                        CallType::Incoming
                    } else {
                        CallType::Outgoing
                    };
                    debug!(number = ?self.number, call_type = %call_type, "Call ended");
                    Some(self.finish(call_type, now))
                }
            },
        }
    }

    /// Close the session and emit the outcome, resetting to IDLE
    fn finish(&mut self, call_type: CallType, now: DateTime<Utc>) -> CallOutcome {
        let number = self.number.take().unwrap_or_default();
        // No usable number: still emit a record so dedup/log code sees it
        let call_type = if is_blank(&number) {
            CallType::Unknown
        } else {
            call_type
        };
        let started_at = self.started_at.take().unwrap_or(now);
        // Clamp negative durations from clock skew instead of failing
        let duration_ms = (now - started_at).num_milliseconds().max(0) as u64;

        self.state = CallState::Idle;
        self.entered_via_ring = false;

        CallOutcome {
            phone_number: number,
            call_type,
            ended_at: now,
            duration_ms,
        }
    }
}

impl Default for CallEventClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
