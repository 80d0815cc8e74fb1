// Stream orchestrator: pose frames in, one gesture message per hand out to the hub.
// Invariants: every message of frame N is broadcast before frame N+1 is awaited;
// shutdown is only observed while waiting for a frame.

use std::future::Future;
use std::sync::Arc;

use gesture_core::{classify, CodeTable, PoseFrame};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::constants::INSPECT_LOG_INTERVAL_MS;
use crate::hub::Hub;
use crate::model::GestureMessage;
use crate::source::PoseSource;
use crate::utils::{monotonic_ms, throttle_elapsed};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub frames: u64,
    pub skipped_frames: u64,
    pub hands: u64,
    pub dropped_hands: u64,
    pub messages: u64,
    pub deliveries: u64,
}

/// Validates, classifies and encodes every hand of one frame, in detection order.
/// Malformed hands are logged and left out.
pub fn frame_messages(frame: &PoseFrame, codes: &CodeTable) -> Vec<String> {
    let mut messages = Vec::with_capacity(frame.hands.len());
    for (hand, snapshot) in frame.snapshots().enumerate() {
        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(hand, %err, "dropping malformed hand");
                continue;
            }
        };
        let label = classify(&snapshot);
        let code = codes.code(label);
        match GestureMessage::new(code).to_json() {
            Ok(payload) => {
                debug!(hand, %label, code, "gesture");
                messages.push(payload);
            }
            Err(err) => warn!(?err, "failed to encode gesture message"),
        }
    }
    messages
}

pub async fn run_stream<S: PoseSource>(
    mut source: S,
    hub: Arc<Hub>,
    codes: Arc<CodeTable>,
    mut shutdown: watch::Receiver<bool>,
) -> StreamStats {
    let mut stats = StreamStats::default();
    let start = Instant::now();
    let mut last_inspect_log_ms: Option<u64> = None;
    info!("gesture stream started");

    loop {
        if *shutdown.borrow() {
            info!("gesture stream stopping on shutdown");
            break;
        }
        let next = tokio::select! {
            next = source.next_frame() => next,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("gesture stream stopping on shutdown");
                    break;
                }
                continue;
            }
        };

        let frame = match next {
            Some(Ok(frame)) => frame,
            Some(Err(err)) => {
                stats.skipped_frames += 1;
                warn!(%err, "skipping pose frame");
                continue;
            }
            None => {
                info!("pose source exhausted");
                break;
            }
        };
        stats.frames += 1;
        stats.hands += frame.hands.len() as u64;

        let messages = frame_messages(&frame, &codes);
        stats.dropped_hands += (frame.hands.len() - messages.len()) as u64;
        for payload in &messages {
            let report = hub.broadcast(payload).await;
            stats.messages += 1;
            stats.deliveries += report.delivered as u64;
        }

        let now_ms = monotonic_ms(start);
        if throttle_elapsed(&mut last_inspect_log_ms, now_ms, INSPECT_LOG_INTERVAL_MS) {
            let subscribers = hub.len().await;
            info!(
                frames = stats.frames,
                skipped = stats.skipped_frames,
                hands = stats.hands,
                dropped_hands = stats.dropped_hands,
                messages = stats.messages,
                deliveries = stats.deliveries,
                subscribers,
                "stream inspect"
            );
        }

        tokio::task::yield_now().await;
    }

    info!(
        frames = stats.frames,
        messages = stats.messages,
        deliveries = stats.deliveries,
        "gesture stream finished"
    );
    stats
}

/// Flips `shutdown` once `signal` fires. A signal that cannot be listened for
/// leaves the process running.
pub async fn shutdown_on_signal<F>(signal: F, shutdown: &watch::Sender<bool>)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("interrupt received; shutting down");
            shutdown.send_replace(true);
        }
        Err(err) => warn!(?err, "failed to listen for interrupt"),
    }
}
