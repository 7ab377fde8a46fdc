use super::config::BufferConfig;
use super::segment::{FlushReason, Segment, Speaker, DEFAULT_OTHER_LABEL, USER_LABEL};
use super::state::SessionBuffer;
use super::text::{ends_sentence, sanitize};
use serde::Serialize;
use tracing::trace;

/// What one webhook payload did to a buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Segments folded into the buffer
    pub accepted: usize,
    /// Segments dropped (empty after sanitizing, or a non-finite timestamp)
    pub dropped: usize,
    /// Messages committed to history during this call
    pub committed: usize,
}

/// Fold an ordered list of segments into `buffer`.
///
/// Segments are processed in slice order. Consecutive user segments
/// accumulate in a pending chunk that is committed on a speaker change, a gap
/// longer than `flush_timeout_secs`, reaching `word_flush_threshold` words, or
/// sentence-terminal punctuation (word threshold is checked first).
pub fn ingest_segments(
    buffer: &mut SessionBuffer,
    segments: &[Segment],
    config: &BufferConfig,
    now: f64,
) -> IngestReport {
    let mut report = IngestReport::default();

    for segment in segments {
        let text = sanitize(&segment.text);
        if text.is_empty() {
            report.dropped += 1;
            continue;
        }

        let timestamp = match segment.start {
            Some(ts) if ts.is_finite() => ts,
            Some(_) => {
                trace!(session = %buffer.session_id(), "dropping segment with non-finite timestamp");
                report.dropped += 1;
                continue;
            }
            None => now,
        };

        report.accepted += 1;

        if !segment.is_user {
            if buffer.flush_pending(FlushReason::SpeakerChange) {
                report.committed += 1;
            }
            buffer.push_other(other_speaker(segment.speaker.as_deref()), text, timestamp);
            report.committed += 1;
            continue;
        }

        let timed_out = buffer
            .pending()
            .map_or(true, |chunk| timestamp - chunk.last_timestamp() > config.flush_timeout_secs);

        if timed_out {
            if buffer.flush_pending(FlushReason::Timeout) {
                report.committed += 1;
            }
            buffer.start_chunk(&text, timestamp);
        } else if let Some(chunk) = buffer.pending_mut() {
            chunk.append(&text, timestamp);
        }

        let words = buffer.pending().map_or(0, |chunk| chunk.word_count());
        let reason = if words >= config.word_flush_threshold {
            Some(FlushReason::WordThreshold)
        } else if ends_sentence(&text) {
            Some(FlushReason::SentenceComplete)
        } else {
            None
        };

        if let Some(reason) = reason {
            if buffer.flush_pending(reason) {
                report.committed += 1;
            }
        }
    }

    let stale = buffer
        .pending()
        .is_some_and(|chunk| now - chunk.last_timestamp() > config.flush_timeout_secs);
    if stale && buffer.flush_pending(FlushReason::PostTimeout) {
        report.committed += 1;
    }

    buffer.touch(now);
    report
}

fn other_speaker(label: Option<&str>) -> Speaker {
    let label = label.map(sanitize).unwrap_or_default();
    if label.is_empty() || label == USER_LABEL {
        Speaker::Other(DEFAULT_OTHER_LABEL.to_string())
    } else {
        Speaker::Other(label)
    }
}
