//! Timing reconstruction for a transaction's event log.
//!
//! A transaction records a flat, chronologically ordered list of lifecycle
//! events. Two kinds of interval are nested inside it: the transaction span
//! (start/end) and connection occupancy (acquired/released). Each kind is
//! paired independently with a LIFO stack, so the most recent unmatched
//! opening event always closes first.
//!
//! ```text
//! START@0  ACQ@5  REL@40  START@50  END@70  END@90
//!   │        └──35ms─┘       └──20ms──┘       │
//!   └──────────────────────90ms───────────────┘
//! ```

use chrono::{DateTime, Utc};
use tracing::debug;

use super::model::{AlarmingThreshold, EventKind, TransactionEvent};

/// What pairing produced for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanOutcome {
    /// Event is not a span boundary.
    None,
    /// Opening boundary, pushed and waiting for its close.
    Opened,
    /// Closing boundary matched with an opening one; duration in milliseconds.
    Closed(i64),
    /// Closing boundary with nothing left to pair against.
    Unmatched,
}

/// One rendered point on the timing timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub kind: EventKind,
    pub details: String,
    pub timestamp: DateTime<Utc>,
    pub span: SpanOutcome,
    pub alarming: bool,
}

impl TimelineEntry {
    /// Duration of the closed span, if this entry closed one.
    pub fn duration_millis(&self) -> Option<i64> {
        match self.span {
            SpanOutcome::Closed(millis) => Some(millis),
            _ => None,
        }
    }

    pub fn marker_class(&self) -> &'static str {
        self.kind.marker_class()
    }
}

/// Rebuild paired intervals from an ordered event log.
///
/// Returns exactly one entry per input event, in input order. A closing
/// event is alarming when its span exceeds the matching threshold; a
/// span exactly at the threshold is not.
pub fn build_timeline(
    events: &[TransactionEvent],
    threshold: &AlarmingThreshold,
) -> Vec<TimelineEntry> {
    let mut tx_stack: Vec<DateTime<Utc>> = Vec::new();
    let mut conn_stack: Vec<DateTime<Utc>> = Vec::new();

    events
        .iter()
        .map(|event| {
            let span = match event.kind {
                EventKind::TransactionStart => {
                    tx_stack.push(event.timestamp);
                    SpanOutcome::Opened
                }
                EventKind::ConnectionAcquired => {
                    conn_stack.push(event.timestamp);
                    SpanOutcome::Opened
                }
                EventKind::TransactionEnd => close_span(&mut tx_stack, event),
                EventKind::ConnectionReleased => close_span(&mut conn_stack, event),
                EventKind::Other => SpanOutcome::None,
            };

            let alarming = match (event.kind, span) {
                (EventKind::TransactionEnd, SpanOutcome::Closed(millis)) => {
                    millis > threshold.transaction
                }
                (EventKind::ConnectionReleased, SpanOutcome::Closed(millis)) => {
                    millis > threshold.connection
                }
                _ => false,
            };

            TimelineEntry {
                kind: event.kind,
                details: event.details.clone().unwrap_or_default(),
                timestamp: event.timestamp,
                span,
                alarming,
            }
        })
        .collect()
}

fn close_span(stack: &mut Vec<DateTime<Utc>>, event: &TransactionEvent) -> SpanOutcome {
    match stack.pop() {
        Some(opened_at) => SpanOutcome::Closed((event.timestamp - opened_at).num_milliseconds()),
        None => {
            debug!(
                kind = event.kind.marker_class(),
                timestamp = %event.timestamp,
                "closing event without a matching opening event"
            );
            SpanOutcome::Unmatched
        }
    }
}
