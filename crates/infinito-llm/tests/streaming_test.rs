use futures::{stream, StreamExt};
use infinito_llm::{
    collect_completion, decode_frame_stream, FinishReason, FragmentStream, RawTextDecoder,
    StreamError, StreamEvent,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

fn transport(chunks: Vec<Result<&'static str, String>>) -> FragmentStream {
    let reads = chunks
        .into_iter()
        .map(|chunk| chunk.map(|s| s.as_bytes()));
    decode_frame_stream(stream::iter(reads), RawTextDecoder)
}

async fn fragments_of(mut events: FragmentStream) -> (Vec<String>, Option<StreamEvent>) {
    let mut fragments = Vec::new();
    let mut last = None;
    while let Some(event) = events.next().await {
        match event.unwrap() {
            StreamEvent::Fragment { content } => fragments.push(content),
            completed => last = Some(completed),
        }
    }
    (fragments, last)
}

#[tokio::test]
async fn test_reassembles_frame_split_across_reads() {
    let events = transport(vec![Ok("data: Hel"), Ok("lo, wor"), Ok("ld\n\n")]);

    let (fragments, last) = fragments_of(events).await;

    assert_eq!(fragments.concat(), "Hello, world");
    assert_eq!(
        last,
        Some(StreamEvent::Completed {
            text: "Hello, world".to_string(),
            finish: FinishReason::Closed,
        })
    );
}

#[tokio::test]
async fn test_inter_token_spaces_survive_boundaries() {
    let events = transport(vec![
        Ok("data: The\n\ndata:  quick\n"),
        Ok("\ndata:  brown\n\nda"),
        Ok("ta:  fox\n\ndata: [DONE]\n\n"),
    ]);

    let (fragments, last) = fragments_of(events).await;

    assert_eq!(fragments, vec!["The", " quick", " brown", " fox"]);
    match last {
        Some(StreamEvent::Completed { text, finish }) => {
            assert_eq!(text, "The quick brown fox");
            assert_eq!(finish, FinishReason::Sentinel);
        }
        other => panic!("Expected completion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_every_split_point_yields_same_text() {
    let wire = "data: Hello\n\ndata: , wor\n\ndata: ld\n\ndata: [DONE]\n\n";

    for split in 1..wire.len() {
        let (head, tail) = wire.split_at(split);
        let events = transport(vec![Ok(head), Ok(tail)]);
        let completion = collect_completion(events).await.unwrap();
        assert_eq!(completion.text, "Hello, world", "split at {}", split);
    }
}

#[tokio::test]
async fn test_sentinel_stops_reading() {
    let events = transport(vec![
        Ok("data: kept\n\ndata: [DONE]\n\ndata: ignored\n\n"),
        Err("never read".to_string()),
    ]);

    let completion = collect_completion(events).await.unwrap();
    assert_eq!(completion.text, "kept");
    assert_eq!(completion.finish, FinishReason::Sentinel);
}

#[tokio::test]
async fn test_heartbeats_are_ignored() {
    let events = transport(vec![Ok(":hb\n\ndata: hi\n\n:hb\n\n")]);

    let (fragments, _) = fragments_of(events).await;
    assert_eq!(fragments, vec!["hi"]);
}

#[tokio::test]
async fn test_unterminated_tail_is_not_lost() {
    let events = transport(vec![Ok("data: one\n\ndata: two")]);

    let completion = collect_completion(events).await.unwrap();
    assert_eq!(completion.text, "onetwo");
    assert_eq!(completion.finish, FinishReason::Closed);
}

#[tokio::test]
async fn test_error_before_first_fragment_fails() {
    let mut events = transport(vec![Ok(":hb\n\n"), Err("connection reset".to_string())]);

    match events.next().await {
        Some(Err(StreamError::StreamFailed(msg))) => assert!(msg.contains("connection reset")),
        other => panic!("Expected StreamFailed, got {:?}", other),
    }
    assert!(events.next().await.is_none());
}

#[tokio::test]
async fn test_error_after_partial_keeps_text() {
    let events = transport(vec![
        Ok("data: Partial answer\n\n"),
        Err("connection reset".to_string()),
    ]);

    let completion = collect_completion(events).await.unwrap();
    assert_eq!(completion.text, "Partial answer");
    assert_eq!(completion.interruption(), Some("connection reset"));
}

#[tokio::test]
async fn test_in_band_refusal_is_generation_failure() {
    let events = transport(vec![Ok("data: [AiO Error] OpenAI API key not found.\n\n")]);

    let err = collect_completion(events).await.unwrap_err();
    assert!(matches!(err, StreamError::GenerationFailed(msg) if msg.contains("API key")));
}

struct TransportGuard(Arc<AtomicBool>);

impl Drop for TransportGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_dropping_consumer_stops_reads_and_releases_transport() {
    let reads = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicBool::new(false));

    let guard = TransportGuard(Arc::clone(&released));
    let counter = Arc::clone(&reads);
    let endless = stream::unfold(guard, move |guard| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Some((Ok::<_, String>("data: tick\n\n".as_bytes()), guard))
        }
    });

    let mut events = decode_frame_stream(endless, RawTextDecoder);
    let first = events.next().await.unwrap().unwrap();
    assert_eq!(
        first,
        StreamEvent::Fragment {
            content: "tick".to_string()
        }
    );

    let reads_at_cancel = reads.load(Ordering::SeqCst);
    drop(events);
    tokio::task::yield_now().await;

    assert_eq!(reads.load(Ordering::SeqCst), reads_at_cancel);
    assert!(released.load(Ordering::SeqCst));
}
