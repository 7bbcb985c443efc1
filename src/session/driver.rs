//! Folds a frame stream into a transcript.

use futures::{Stream, StreamExt};
use std::collections::HashSet;
use tokio::sync::Mutex;

use crate::debug::{DebugTracer, ErrorSource, StreamPhase};
use crate::error::StreamError;
use crate::frames::InboundFrame;
use crate::transcript::Transcript;

/// How a folded stream ended.
#[derive(Debug, Clone)]
pub enum StreamOutcome {
    /// Every message the stream touched reached `complete`.
    Completed,
    /// The source ended cleanly but these messages never completed.
    Ended { open_ids: Vec<String> },
    /// The transport failed; these messages are left streaming.
    Failed {
        error: StreamError,
        open_ids: Vec<String>,
    },
}

impl StreamOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StreamOutcome::Completed)
    }

    pub fn phase(&self) -> StreamPhase {
        match self {
            StreamOutcome::Completed => StreamPhase::Completed,
            StreamOutcome::Ended { .. } => StreamPhase::Ended,
            StreamOutcome::Failed { .. } => StreamPhase::Failed,
        }
    }
}

/// Apply every frame, in delivery order, until the stream ends or fails.
///
/// The transcript lock is taken per frame and never held across a read, so
/// readers see the reply grow. Callers that must be the only writer hold the
/// session's turn lock around this call.
///
/// Messages still streaming at the end are left that way: a missing
/// `complete` is reported through the outcome, never papered over.
pub async fn fold_stream<S>(
    transcript: &Mutex<Transcript>,
    mut frames: S,
    tracer: Option<&DebugTracer>,
) -> StreamOutcome
where
    S: Stream<Item = Result<InboundFrame, StreamError>> + Unpin,
{
    // Touched ids in first-touch order
    let mut touched: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut failure = None;

    while let Some(item) = frames.next().await {
        match item {
            Ok(frame) => {
                let mut transcript = transcript.lock().await;
                let reconciled = transcript.apply_frame(frame);
                if let (Some(tracer), Some(message)) = (tracer, transcript.get(&reconciled.id)) {
                    tracer.transcript_change(message, reconciled.created);
                }
                if seen.insert(reconciled.id.clone()) {
                    touched.push(reconciled.id);
                }
            }
            Err(error) => {
                failure = Some(error);
                break;
            }
        }
    }

    let open_ids: Vec<String> = {
        let transcript = transcript.lock().await;
        touched
            .into_iter()
            .filter(|id| transcript.get(id).map_or(false, |m| m.streaming))
            .collect()
    };

    let outcome = match failure {
        Some(error) => StreamOutcome::Failed { error, open_ids },
        None if open_ids.is_empty() => StreamOutcome::Completed,
        None => StreamOutcome::Ended { open_ids },
    };

    match &outcome {
        StreamOutcome::Completed => tracing::debug!("Stream completed"),
        StreamOutcome::Ended { open_ids } => {
            tracing::warn!("Stream ended with {} message(s) still streaming", open_ids.len())
        }
        StreamOutcome::Failed { error, .. } => tracing::error!("Stream failed: {}", error),
    }

    if let Some(tracer) = tracer {
        let details = match &outcome {
            StreamOutcome::Completed => None,
            StreamOutcome::Ended { open_ids } => Some(format!("open: {}", open_ids.join(", "))),
            StreamOutcome::Failed { error, .. } => {
                tracer.error(ErrorSource::Transport, error.to_string());
                Some(error.user_message())
            }
        };
        tracer.lifecycle(outcome.phase(), details);
    }

    outcome
}
