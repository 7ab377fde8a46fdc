// Tests for folding webhook segments into a session buffer
//
// These exercise the flush rules (speaker change, gap timeout, word
// threshold, sentence end, post-payload timeout) and the derived counters
// kept on the buffer.

use wearable_gate::buffer::text::{count_sentences, count_words};
use wearable_gate::buffer::{ingest_segments, BufferConfig, FlushReason, Segment, SessionBuffer, Speaker};

fn new_buffer(now: f64) -> SessionBuffer {
    SessionBuffer::new("test-session", now, 24, 60.0)
}

fn expected_user_sentences(buffer: &SessionBuffer) -> usize {
    buffer
        .messages()
        .filter(|m| m.speaker.is_user())
        .map(|m| count_sentences(&m.text))
        .sum()
}

#[test]
fn test_short_user_run_flushes_once_on_speaker_change() {
    let config = BufferConfig::default();
    let mut buffer = new_buffer(0.0);

    let segments = vec![
        Segment::user("so I was", 0.0),
        Segment::user("thinking about", 1.0),
        Segment::user("the trip", 2.0),
    ];
    let report = ingest_segments(&mut buffer, &segments, &config, 2.0);

    assert_eq!(report.accepted, 3);
    assert_eq!(report.committed, 0);
    assert_eq!(buffer.message_count(), 0);
    assert_eq!(buffer.pending().map(|c| c.text()), Some("so I was thinking about the trip"));

    let report = ingest_segments(&mut buffer, &[Segment::other("Alex", "sounds fun", 3.0)], &config, 3.0);
    assert_eq!(report.committed, 2);

    let messages: Vec<_> = buffer.messages().cloned().collect();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].speaker, Speaker::User);
    assert_eq!(messages[0].text, "so I was thinking about the trip");
    assert_eq!(messages[0].timestamp, 0.0);
    assert_eq!(messages[1].speaker, Speaker::Other("Alex".to_string()));
    assert_eq!(buffer.last_flush_reason(), Some(FlushReason::SpeakerChange));
    assert!(buffer.pending().is_none());
}

#[test]
fn test_short_user_run_flushes_on_post_timeout() {
    let config = BufferConfig::default();
    let mut buffer = new_buffer(0.0);

    ingest_segments(
        &mut buffer,
        &[Segment::user("well you know", 0.0), Segment::user("I guess", 1.0)],
        &config,
        1.0,
    );
    assert_eq!(buffer.message_count(), 0);

    // A later, empty payload arrives after the flush timeout has passed
    ingest_segments(&mut buffer, &[], &config, 7.0);

    let messages: Vec<_> = buffer.messages().cloned().collect();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "well you know I guess");
    assert_eq!(buffer.last_flush_reason(), Some(FlushReason::PostTimeout));
    assert_eq!(buffer.last_user_speech_at(), Some(1.0));
}

#[test]
fn test_gap_longer_than_timeout_starts_new_chunk() {
    let config = BufferConfig::default();
    let mut buffer = new_buffer(0.0);

    let segments = vec![Segment::user("first part", 0.0), Segment::user("second part", 6.0)];
    ingest_segments(&mut buffer, &segments, &config, 6.0);

    let messages: Vec<_> = buffer.messages().cloned().collect();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "first part");
    assert_eq!(buffer.last_flush_reason(), Some(FlushReason::Timeout));
    assert_eq!(buffer.pending().map(|c| c.text()), Some("second part"));
}

#[test]
fn test_word_threshold_wins_over_sentence_end() {
    let config = BufferConfig::default();
    let mut buffer = new_buffer(0.0);

    let segments = vec![
        Segment::user("one two three four five", 0.0),
        Segment::user("six seven eight.", 1.0),
    ];
    ingest_segments(&mut buffer, &segments, &config, 1.0);

    let messages: Vec<_> = buffer.messages().cloned().collect();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "one two three four five six seven eight.");
    assert_eq!(buffer.last_flush_reason(), Some(FlushReason::WordThreshold));
}

#[test]
fn test_sentence_end_flushes_short_chunk() {
    let config = BufferConfig::default();
    let mut buffer = new_buffer(0.0);

    ingest_segments(&mut buffer, &[Segment::user("Hello there.", 0.0)], &config, 0.0);

    assert_eq!(buffer.message_count(), 1);
    assert_eq!(buffer.last_flush_reason(), Some(FlushReason::SentenceComplete));
    assert_eq!(buffer.user_sentence_count(), 1);
    assert_eq!(buffer.accumulation_started_at(), Some(0.0));
}

#[test]
fn test_single_long_segment_flushes_on_word_threshold() {
    let config = BufferConfig::default();
    let mut buffer = new_buffer(0.0);

    let nine_words = "we could take the train up to the coast";
    ingest_segments(&mut buffer, &[Segment::user(nine_words, 0.0)], &config, 0.0);

    let messages: Vec<_> = buffer.messages().cloned().collect();
    assert_eq!(messages.len(), 1, "flush must not wait for more speech");
    assert_eq!(messages[0].text, nine_words);
    assert_eq!(buffer.last_flush_reason(), Some(FlushReason::WordThreshold));
    assert!(buffer.pending().is_none());
}

#[test]
fn test_word_threshold_crossed_across_ingest_calls() {
    let config = BufferConfig::default();
    let mut buffer = new_buffer(0.0);

    ingest_segments(&mut buffer, &[Segment::user("we could take the train", 0.0)], &config, 0.5);
    assert_eq!(buffer.message_count(), 0);
    assert_eq!(buffer.pending().map(|c| c.word_count()), Some(5));

    ingest_segments(&mut buffer, &[Segment::user("up to the coast", 1.0)], &config, 1.5);
    let messages: Vec<_> = buffer.messages().cloned().collect();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "we could take the train up to the coast");
    assert_eq!(buffer.last_flush_reason(), Some(FlushReason::WordThreshold));
}

#[test]
fn test_pending_word_count_tracks_text() {
    let config = BufferConfig {
        word_flush_threshold: 100,
        ..BufferConfig::default()
    };
    let mut buffer = new_buffer(0.0);

    for (i, piece) in ["alpha  beta", "gamma", "  delta epsilon  "].iter().enumerate() {
        ingest_segments(&mut buffer, &[Segment::user(*piece, i as f64)], &config, i as f64);
        let chunk = buffer.pending().expect("chunk should still be pending");
        assert_eq!(chunk.word_count(), count_words(chunk.text()));
    }
    assert_eq!(buffer.pending().map(|c| c.text()), Some("alpha beta gamma delta epsilon"));
}

#[test]
fn test_sentence_count_matches_recount_after_every_call() {
    let config = BufferConfig {
        max_messages: 5,
        ..BufferConfig::default()
    };
    let mut buffer = SessionBuffer::new("test-session", 0.0, 5, 60.0);

    let calls: Vec<Vec<Segment>> = vec![
        vec![Segment::user("Hi. How are you?", 0.0)],
        vec![Segment::other("Sam", "Fine thanks.", 1.0)],
        vec![Segment::user("I wanted to ask", 2.0), Segment::user("about the report!", 3.0)],
        vec![Segment::user("It is late", 4.0)],
        vec![Segment::other("Sam", "Tomorrow then.", 10.0)],
        vec![Segment::user("Great. Thanks. Bye.", 11.0)],
        vec![Segment::user("one two three four five six seven eight nine", 12.0)],
        vec![Segment::other("Sam", "See you.", 13.0)],
    ];

    for (i, segments) in calls.iter().enumerate() {
        ingest_segments(&mut buffer, segments, &config, segments[0].start.unwrap_or(0.0));
        assert_eq!(
            buffer.user_sentence_count(),
            expected_user_sentences(&buffer),
            "sentence count drifted after call {}",
            i
        );
        assert!(buffer.message_count() <= 5);
    }
}

#[test]
fn test_eviction_recomputes_accumulation_start() {
    let config = BufferConfig {
        max_messages: 3,
        ..BufferConfig::default()
    };
    let mut buffer = SessionBuffer::new("test-session", 0.0, 3, 60.0);

    ingest_segments(
        &mut buffer,
        &[Segment::user("First point.", 0.0), Segment::user("Second point.", 10.0)],
        &config,
        10.0,
    );
    assert_eq!(buffer.accumulation_started_at(), Some(0.0));
    assert_eq!(buffer.user_sentence_count(), 2);

    ingest_segments(
        &mut buffer,
        &[Segment::other("Kim", "right", 11.0), Segment::other("Kim", "ok", 12.0)],
        &config,
        12.0,
    );
    assert_eq!(buffer.message_count(), 3);
    assert_eq!(buffer.accumulation_started_at(), Some(10.0));
    assert_eq!(buffer.user_sentence_count(), 1);

    ingest_segments(&mut buffer, &[Segment::other("Kim", "anyway", 13.0)], &config, 13.0);
    assert_eq!(buffer.accumulation_started_at(), None);
    assert_eq!(buffer.user_sentence_count(), 0);
}

#[test]
fn test_sanitizing_drops_empty_and_non_finite_segments() {
    let config = BufferConfig::default();
    let mut buffer = new_buffer(0.0);

    let mut bad_time = Segment::user("still here.", 0.0);
    bad_time.start = Some(f64::NAN);

    let segments = vec![
        Segment::user("<i></i>   ", 0.0),
        bad_time,
        Segment::user("  <b>Clean</b>   me   up. ", 1.0),
    ];
    let report = ingest_segments(&mut buffer, &segments, &config, 1.0);

    assert_eq!(report.dropped, 2);
    assert_eq!(report.accepted, 1);
    let messages: Vec<_> = buffer.messages().cloned().collect();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "Clean me up.");
}

#[test]
fn test_missing_timestamp_uses_now_and_default_label() {
    let config = BufferConfig::default();
    let mut buffer = new_buffer(0.0);

    let segment = Segment {
        text: "hey".to_string(),
        start: None,
        is_user: false,
        speaker: None,
    };
    ingest_segments(&mut buffer, &[segment], &config, 42.0);

    let messages: Vec<_> = buffer.messages().cloned().collect();
    assert_eq!(messages[0].timestamp, 42.0);
    assert_eq!(messages[0].speaker.label(), "other");
}

#[test]
fn test_activity_updated_without_commits() {
    let config = BufferConfig::default();
    let mut buffer = new_buffer(0.0);

    let report = ingest_segments(&mut buffer, &[Segment::user("   ", 5.0)], &config, 30.0);
    assert_eq!(report.committed, 0);
    assert_eq!(buffer.last_activity_at(), 30.0);
}

#[test]
fn test_flush_clears_next_eligible_deadline() {
    let config = BufferConfig::default();
    let mut buffer = new_buffer(0.0);
    buffer.defer_until(100.0);

    ingest_segments(&mut buffer, &[Segment::user("Something new.", 1.0)], &config, 1.0);
    assert_eq!(buffer.next_eligible_at(), None);
}
