//! Tests for the query orchestrator

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::core::types::{
    AskRequest, GenerationItem, IndexPoint, RetrievedDoc, SourceRef, StreamEvent,
};
use crate::testing::{sample_chunks, FakeAi, GenStep, RecordingIndex, DIM};
use crate::vector::VectorIndex;

const COLLECTION: &str = "chimera_docs";

async fn orchestrator_with(ai: FakeAi, docs: usize) -> (QueryOrchestrator, Arc<FakeAi>, Arc<RecordingIndex>) {
    let ai = Arc::new(ai);
    let index = Arc::new(RecordingIndex::default());
    index
        .ensure_collection(COLLECTION, DIM as u64)
        .await
        .expect("Failed to create collection");

    let points: Vec<IndexPoint> = sample_chunks(docs)
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| IndexPoint::from_chunk(&format!("doc{}.pdf", i), 0, chunk))
        .collect();
    if !points.is_empty() {
        index.upsert(COLLECTION, points).await.unwrap();
    }

    let orchestrator = QueryOrchestrator::new(ai.clone(), index.clone(), COLLECTION, 15);
    (orchestrator, ai, index)
}

fn answer_script(deltas: &[&str]) -> Vec<GenStep> {
    deltas
        .iter()
        .map(|d| GenStep::Item(GenerationItem::delta(*d)))
        .collect()
}

async fn collect(stream: AnswerStream) -> Vec<StreamEvent> {
    tokio::time::timeout(Duration::from_secs(5), stream.collect::<Vec<_>>())
        .await
        .expect("answer stream did not finish")
}

fn assert_single_trailing_error(events: &[StreamEvent]) {
    let errors = events.iter().filter(|e| e.is_error()).count();
    assert_eq!(errors, 1, "events: {:?}", events);
    assert!(events.last().unwrap().is_error());
}

// ============================================================================
// Unit Tests
// ============================================================================

#[tokio::test]
async fn test_no_documents_sequence() {
    let ai = FakeAi::new().with_script(answer_script(&["X is ", "a thing."]));
    let (orchestrator, ai, _) = orchestrator_with(ai, 0).await;

    let events = collect(
        orchestrator.stream_answer(AskRequest::new("What is X?"), &CancellationToken::new()),
    )
    .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::thinking(progress::UNDERSTANDING),
            StreamEvent::thinking(progress::RETRIEVING),
            StreamEvent::thinking(progress::NO_DOCUMENTS),
            StreamEvent::thinking(progress::GENERATING),
            StreamEvent::answer_delta("X is "),
            StreamEvent::answer_delta("a thing."),
        ]
    );

    let request = ai.last_request.lock().clone().unwrap();
    assert!(!request.prompt.contains("[source:"));
    assert!(request.prompt.contains("What is X?"));
}

#[tokio::test]
async fn test_retrieved_documents_feed_prompt() {
    let ai = FakeAi::new().with_script(answer_script(&["answer"]));
    let (orchestrator, ai, _) = orchestrator_with(ai, 3).await;

    let request = AskRequest::new("question").with_session("s-42");
    let events = collect(orchestrator.stream_answer(request, &CancellationToken::new())).await;

    assert_eq!(events[0], StreamEvent::thinking(progress::UNDERSTANDING));
    assert_eq!(events[2], StreamEvent::thinking(progress::found(3)));
    assert!(!events.iter().any(|e| e.is_error()));

    let sent = ai.last_request.lock().clone().unwrap();
    assert_eq!(sent.session_id, "s-42");
    assert_eq!(sent.prompt.matches("[source: doc").count(), 3);
    assert!(sent.prompt.contains("<<filename|page>>"));
}

#[tokio::test]
async fn test_empty_deltas_are_skipped_and_sources_relayed() {
    let script = vec![
        GenStep::Item(GenerationItem {
            thinking_log: "planning".to_string(),
            ..Default::default()
        }),
        GenStep::Item(GenerationItem::delta("")),
        GenStep::Item(GenerationItem {
            answer_delta: "cited".to_string(),
            source_docs: vec![SourceRef {
                filename: "a.pdf".to_string(),
                page: 2,
                score: 0.8,
            }],
            ..Default::default()
        }),
    ];
    let (orchestrator, _, _) = orchestrator_with(FakeAi::new().with_script(script), 0).await;

    let events = collect(
        orchestrator.stream_answer(AskRequest::new("q"), &CancellationToken::new()),
    )
    .await;

    assert_eq!(
        &events[4..],
        &[
            StreamEvent::thinking("planning"),
            StreamEvent::answer_delta("cited"),
            StreamEvent::source_doc("a.pdf", 2),
        ]
    );
}

#[tokio::test]
async fn test_embed_failure_emits_one_error() {
    let ai = FakeAi::new();
    ai.fail_embed.store(true, Ordering::SeqCst);
    let (orchestrator, ai, _) = orchestrator_with(ai, 2).await;

    let events = collect(
        orchestrator.stream_answer(AskRequest::new("q"), &CancellationToken::new()),
    )
    .await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], StreamEvent::thinking(progress::UNDERSTANDING));
    assert_single_trailing_error(&events);
    assert_eq!(ai.generate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_retrieve_failure_emits_one_error() {
    let (orchestrator, _, index) = orchestrator_with(FakeAi::new(), 2).await;
    index.fail_query.store(true, Ordering::SeqCst);

    let events = collect(
        orchestrator.stream_answer(AskRequest::new("q"), &CancellationToken::new()),
    )
    .await;

    assert_eq!(events.len(), 3);
    assert_single_trailing_error(&events);
}

#[tokio::test]
async fn test_generate_open_failure_emits_one_error() {
    let ai = FakeAi::new();
    ai.fail_generate.store(true, Ordering::SeqCst);
    let (orchestrator, _, _) = orchestrator_with(ai, 0).await;

    let events = collect(
        orchestrator.stream_answer(AskRequest::new("q"), &CancellationToken::new()),
    )
    .await;

    assert_single_trailing_error(&events);
    assert!(!events.iter().any(|e| e.is_answer()));
}

#[tokio::test]
async fn test_mid_stream_failure_stops_answer() {
    let mut script = answer_script(&["partial"]);
    script.push(GenStep::Fail);
    script.extend(answer_script(&["never"]));
    let (orchestrator, _, _) = orchestrator_with(FakeAi::new().with_script(script), 0).await;

    let events = collect(
        orchestrator.stream_answer(AskRequest::new("q"), &CancellationToken::new()),
    )
    .await;

    let answers: Vec<_> = events.iter().filter(|e| e.is_answer()).collect();
    assert_eq!(answers, vec![&StreamEvent::answer_delta("partial")]);
    assert_single_trailing_error(&events);
}

#[tokio::test]
async fn test_cancel_releases_upstream_stream() {
    let mut script = answer_script(&["first"]);
    script.push(GenStep::Hang);
    let (orchestrator, ai, _) = orchestrator_with(FakeAi::new().with_script(script), 0).await;

    let caller = CancellationToken::new();
    let mut stream = orchestrator.stream_answer(AskRequest::new("q"), &caller);

    // Drain up to the first answer delta so the upstream stream is open
    loop {
        let event = stream.next_event().await.expect("stream ended early");
        if event.is_answer() {
            break;
        }
    }
    assert!(!ai.stream_dropped.load(Ordering::SeqCst));

    caller.cancel();
    assert_eq!(
        tokio::time::timeout(Duration::from_secs(2), stream.next_event())
            .await
            .expect("stream not closed after cancellation"),
        None
    );
    assert!(ai.stream_dropped.load(Ordering::SeqCst));
    assert_eq!(ai.generate_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancel_while_error_waits_on_full_bridge() {
    let ai = FakeAi::new();
    ai.fail_embed.store(true, Ordering::SeqCst);
    let (orchestrator, _, _) = orchestrator_with(ai, 0).await;
    let orchestrator = orchestrator.with_bridge_capacity(1);

    let caller = CancellationToken::new();
    let stream = orchestrator.stream_answer(AskRequest::new("q"), &caller);

    // The first progress event fills the bridge, so the error send waits
    tokio::time::sleep(Duration::from_millis(50)).await;
    caller.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let events = collect(stream).await;
    assert_eq!(events, vec![StreamEvent::thinking(progress::UNDERSTANDING)]);
}

#[tokio::test]
async fn test_dropping_consumer_releases_upstream_stream() {
    let mut script = answer_script(&["first"]);
    script.push(GenStep::Hang);
    let (orchestrator, ai, _) = orchestrator_with(FakeAi::new().with_script(script), 0).await;

    let mut stream = orchestrator.stream_answer(AskRequest::new("q"), &CancellationToken::new());
    while let Some(event) = stream.next_event().await {
        if event.is_answer() {
            break;
        }
    }

    tokio::time::timeout(Duration::from_secs(2), stream.cancel())
        .await
        .expect("producer did not stop");
    assert!(ai.stream_dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_cancel_before_start_emits_nothing_after_close() {
    let (orchestrator, ai, _) = orchestrator_with(FakeAi::new(), 0).await;
    let caller = CancellationToken::new();
    caller.cancel();

    let events = collect(orchestrator.stream_answer(AskRequest::new("q"), &caller)).await;

    assert!(events.is_empty());
    assert_eq!(ai.generate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_slow_consumer_gets_every_event_in_order() {
    let deltas: Vec<String> = (0..50).map(|i| format!("d{} ", i)).collect();
    let refs: Vec<&str> = deltas.iter().map(String::as_str).collect();
    let (orchestrator, _, _) = orchestrator_with(FakeAi::new().with_script(answer_script(&refs)), 0).await;
    let orchestrator = orchestrator.with_bridge_capacity(2);

    let mut stream = orchestrator.stream_answer(AskRequest::new("q"), &CancellationToken::new());
    let mut received = Vec::new();
    while let Some(event) = stream.next_event().await {
        tokio::time::sleep(Duration::from_millis(1)).await;
        if let StreamEvent::AnswerDelta { text } = event {
            received.push(text);
        }
    }
    assert_eq!(received, deltas);
}

#[test]
fn test_relay_events_order() {
    let events = relay_events(GenerationItem {
        thinking_log: "t".to_string(),
        answer_delta: "a".to_string(),
        source_docs: vec![
            SourceRef {
                filename: "x.pdf".to_string(),
                page: 1,
                score: 0.5,
            },
            SourceRef {
                filename: "y.pdf".to_string(),
                page: 9,
                score: 0.4,
            },
        ],
    });
    assert_eq!(
        events,
        vec![
            StreamEvent::thinking("t"),
            StreamEvent::answer_delta("a"),
            StreamEvent::source_doc("x.pdf", 1),
            StreamEvent::source_doc("y.pdf", 9),
        ]
    );
    assert!(relay_events(GenerationItem::default()).is_empty());
}

#[test]
fn test_format_context_layout() {
    let docs = vec![
        RetrievedDoc {
            content: "alpha".to_string(),
            filename: "a.pdf".to_string(),
            page_number: 1,
        },
        RetrievedDoc {
            content: "beta".to_string(),
            filename: "b.pdf".to_string(),
            page_number: 7,
        },
    ];
    assert_eq!(
        format_context(&docs),
        "[source: a.pdf | page: 1]\nalpha\n\n[source: b.pdf | page: 7]\nbeta\n\n"
    );
    assert_eq!(format_context(&[]), "");
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn arb_doc() -> impl Strategy<Value = RetrievedDoc> {
    ("[a-z]{1,8}\\.pdf", 0i32..1000, "[a-zA-Z0-9 ]{0,60}").prop_map(
        |(filename, page_number, content)| RetrievedDoc {
            content,
            filename,
            page_number,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Context blocks appear once per document, in ranked order
    #[test]
    fn prop_context_preserves_rank_order(docs in prop::collection::vec(arb_doc(), 0..20)) {
        let context = format_context(&docs);

        let mut cursor = 0;
        for doc in &docs {
            let label = format!("[source: {} | page: {}]\n{}\n\n", doc.filename, doc.page_number, doc.content);
            let found = context[cursor..].find(&label);
            prop_assert!(found.is_some());
            cursor += found.unwrap() + label.len();
        }
        prop_assert_eq!(cursor, context.len());
    }

    /// Every prompt carries the question and the citation instruction
    #[test]
    fn prop_prompt_contains_query_and_instruction(
        docs in prop::collection::vec(arb_doc(), 0..5),
        query in "[a-zA-Z0-9 ?]{1,80}",
    ) {
        let context = format_context(&docs);
        let prompt = build_prompt(&context, &query);

        prop_assert!(prompt.contains(&query));
        prop_assert!(prompt.contains(CITATION_INSTRUCTION));
        prop_assert!(prompt.contains(&context));
    }
}
