//! End-to-end tests from raw transport bytes to a folded transcript.

use std::time::Duration;

use bytes::Bytes;
use futures::stream;
use futures_util::StreamExt;
use parley::error::StreamError;
use parley::frames::{Decoded, FrameDecoder, InboundFrame};
use parley::relay::frame_stream;
use parley::session::{fold_stream, StreamOutcome};
use parley::traits::{ByteStream, HttpError};
use parley::transcript::Transcript;
use tokio::sync::Mutex;

const BODY: &str = concat!(
    "event: message\n",
    "data: {\"type\":\"chunk\",\"id\":\"m1\",\"content\":\"Grüße, \"}\r\n",
    "\n",
    ": heartbeat\n",
    "data: {\"type\":\"chunk\",\"id\":\"m1\",\"content\":\"日本 🌸\"}\n",
    "data: {\"type\":\"typing\",\"id\":\"m1\"}\n",
    "data: {\"type\":\"options\",\"id\":\"m1\",\"options\":[\"Ja\",\"Nein\"]}\n",
    "data: {\"type\":\"complete\",\"id\":\"m1\"}\n",
);

fn chunks(parts: Vec<Vec<u8>>) -> ByteStream {
    Box::pin(stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p)))))
}

async fn fold_bytes(bytes: ByteStream) -> (Transcript, StreamOutcome) {
    let transcript = Mutex::new(Transcript::new());
    let outcome = fold_stream(&transcript, frame_stream(bytes, None, None, None), None).await;
    (transcript.into_inner(), outcome)
}

#[tokio::test]
async fn test_every_split_point_gives_the_same_transcript() {
    let body = BODY.as_bytes();
    for split in 0..=body.len() {
        let (transcript, outcome) =
            fold_bytes(chunks(vec![body[..split].to_vec(), body[split..].to_vec()])).await;

        assert!(outcome.is_completed(), "split at {}", split);
        let message = transcript.get("m1").unwrap();
        assert_eq!(message.content, "Grüße, 日本 🌸", "split at {}", split);
        assert_eq!(message.options.as_deref(), Some(&["Ja".to_string(), "Nein".to_string()][..]));
        assert!(!message.streaming);
    }
}

#[tokio::test]
async fn test_byte_at_a_time() {
    let parts = BODY.as_bytes().iter().map(|b| vec![*b]).collect();
    let (transcript, outcome) = fold_bytes(chunks(parts)).await;
    assert!(outcome.is_completed());
    assert_eq!(transcript.get("m1").unwrap().content, "Grüße, 日本 🌸");
}

#[test]
fn test_decoder_stats() {
    let mut decoder = FrameDecoder::new();
    let decoded = decoder.feed(BODY.as_bytes());
    assert!(decoder.finish().is_none());

    let frames = decoded
        .iter()
        .filter(|d| matches!(d, Decoded::Frame { .. }))
        .count();
    assert_eq!(frames, 4);
    let stats = decoder.stats();
    assert_eq!(stats.frames, 4);
    assert_eq!(stats.ignored, 1);
    assert_eq!(stats.malformed, 0);
}

#[tokio::test]
async fn test_malformed_neighbour_is_skipped() {
    let body = concat!(
        "data: {\"type\":\"chunk\",\"id\":\"m1\",\"content\":\"a\"}\n",
        "data: {\"type\":\"chunk\",\"id\":\n",
        "data: {\"type\":\"chunk\",\"content\":\"no id\"}\n",
        "data: {\"type\":\"chunk\",\"id\":\"m1\",\"content\":\"b\"}\n",
        "data: {\"type\":\"complete\",\"id\":\"m1\"}\n",
    );
    let (transcript, outcome) = fold_bytes(chunks(vec![body.as_bytes().to_vec()])).await;
    assert!(outcome.is_completed());
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript.get("m1").unwrap().content, "ab");
}

#[tokio::test]
async fn test_transport_failure_mid_stream() {
    let bytes: ByteStream = Box::pin(stream::iter(vec![
        Ok(Bytes::from_static(b"data: {\"type\":\"chunk\",\"id\":\"m1\",\"content\":\"Hel\"}\n")),
        Err(HttpError::Io("connection reset by peer".to_string())),
    ]));
    let (transcript, outcome) = fold_bytes(bytes).await;

    match outcome {
        StreamOutcome::Failed { error, open_ids } => {
            assert!(matches!(error, StreamError::Transport(_)));
            assert_eq!(open_ids, vec!["m1".to_string()]);
        }
        other => panic!("expected Failed, got {:?}", other),
    }
    let message = transcript.get("m1").unwrap();
    assert_eq!(message.content, "Hel");
    assert!(message.streaming);
}

#[tokio::test]
async fn test_stalled_backend_fails_the_stream() {
    let first = stream::iter(vec![Ok(Bytes::from_static(
        b"data: {\"type\":\"chunk\",\"id\":\"m1\",\"content\":\"wait\"}\n",
    ))]);
    let bytes: ByteStream = Box::pin(first.chain(stream::pending()));

    let transcript = Mutex::new(Transcript::new());
    let frames = frame_stream(bytes, None, Some(Duration::from_millis(30)), None);
    let outcome = fold_stream(&transcript, frames, None).await;

    assert!(matches!(
        outcome,
        StreamOutcome::Failed {
            error: StreamError::Stalled { .. },
            ..
        }
    ));
    assert!(transcript.lock().await.get("m1").unwrap().streaming);
}

#[tokio::test]
async fn test_fallback_id_binds_idless_chunks() {
    let body = concat!(
        "data: {\"type\":\"chunk\",\"content\":\"one \"}\n",
        "data: {\"type\":\"chunk\",\"text\":\"two\"}\n",
        "data: {\"type\":\"complete\"}\n",
    );
    let frames: Vec<InboundFrame> = frame_stream(
        chunks(vec![body.as_bytes().to_vec()]),
        Some("local-reply".to_string()),
        None,
        None,
    )
    .map(|r| r.unwrap())
    .collect()
    .await;

    assert_eq!(
        frames,
        vec![
            InboundFrame::chunk("local-reply", "one "),
            InboundFrame::chunk("local-reply", "two"),
            InboundFrame::complete("local-reply"),
        ]
    );
}
