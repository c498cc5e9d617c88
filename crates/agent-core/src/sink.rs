//! Result Sink
//!
//! The callback-shaped boundary through which the orchestrator reports
//! incremental/final text, citation sources, and out-of-band side effects to
//! whatever is consuming it (a UI, a test harness, a CLI).

use crate::turn::Citation;

/// Observer for the two observable outputs of a `send_message` call.
///
/// `on_chunk` is invoked at least once per call with the terminal content
/// (implementations of the orchestrator may invoke it more often to simulate
/// progressive delivery). `on_side_effect` fires once per durable,
/// user-meaningful event such as a confirmed booking.
pub trait ResultSink<E>: Send + Sync {
    fn on_chunk(&self, text: &str, citations: &[Citation]);

    fn on_side_effect(&self, effect: &E);
}

/// Sink that discards everything (for fire-and-forget callers)
pub struct NullSink;

impl<E> ResultSink<E> for NullSink {
    fn on_chunk(&self, _text: &str, _citations: &[Citation]) {}

    fn on_side_effect(&self, _effect: &E) {}
}
