//! Streaming over real HTTP
//!
//! Drives `ApiClient::open_analysis` against the fake backend and checks what
//! the decoded increments look like for chunked, empty, failing and
//! truncated responses.

use std::ops::ControlFlow;

use futures_util::StreamExt;
use zhicuoti_client::{AnalysisFetch, AnalysisTarget};
use zhicuoti_core::{accumulate, collect_text, AccumulatedText, DecodeMode, SessionContext};

use crate::support::{FakeBackend, Reply};

fn solution(id: &str) -> AnalysisTarget {
    AnalysisTarget::ProblemSolution {
        problem_id: id.to_string(),
    }
}

fn session() -> SessionContext {
    SessionContext::new("tok-1")
}

/// "你好，世界" with the first character split across two chunks.
fn split_chinese_chunks() -> Vec<Vec<u8>> {
    let bytes = "你好，世界".as_bytes().to_vec();
    vec![bytes[..2].to_vec(), bytes[2..9].to_vec(), bytes[9..].to_vec()]
}

#[tokio::test]
async fn test_streams_text_in_order() {
    let backend =
        FakeBackend::start(|_| Reply::text_chunks(&["## 解题思路\n", "先求导，", "再判断单调性。"]))
            .await;

    let fetch = backend
        .client()
        .open_analysis(&session(), &solution("p-1"))
        .await
        .unwrap();
    let AnalysisFetch::Streaming(stream) = fetch else {
        panic!("expected a stream, got {:?}", fetch);
    };

    let text = collect_text(stream).await.unwrap();
    assert_eq!(text, "## 解题思路\n先求导，再判断单调性。");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/api/v1/problem/p-1/solution");
    assert_eq!(requests[0].bearer().as_deref(), Some("tok-1"));
}

#[tokio::test]
async fn test_split_characters_rejoin_incrementally() {
    let backend = FakeBackend::start(|_| Reply::Chunked {
        status: 200,
        chunks: split_chinese_chunks(),
    })
    .await;

    let fetch = backend
        .client()
        .open_analysis(&session(), &solution("p-2"))
        .await
        .unwrap();
    let AnalysisFetch::Streaming(stream) = fetch else {
        panic!("expected a stream");
    };

    let increments: Vec<String> = stream.map(|r| r.unwrap()).collect().await;
    assert_eq!(increments.concat(), "你好，世界");
    assert!(increments.iter().all(|i| !i.contains('\u{FFFD}')));
}

#[tokio::test]
async fn test_per_chunk_mode_replaces_split_characters() {
    let backend = FakeBackend::start(|_| Reply::Chunked {
        status: 200,
        chunks: split_chinese_chunks(),
    })
    .await;

    let fetch = backend
        .client_with_mode(DecodeMode::PerChunk)
        .open_analysis(&session(), &solution("p-3"))
        .await
        .unwrap();
    let AnalysisFetch::Streaming(stream) = fetch else {
        panic!("expected a stream");
    };

    let text = collect_text(stream).await.unwrap();
    assert!(text.contains('\u{FFFD}'));
    assert!(text.ends_with("好，世界"));
}

#[tokio::test]
async fn test_non_success_status_is_unavailable() {
    let backend =
        FakeBackend::start(|_| Reply::json(404, serde_json::json!({ "detail": "Not Found" })))
            .await;

    let fetch = backend
        .client()
        .open_analysis(&session(), &solution("missing"))
        .await
        .unwrap();
    assert!(matches!(fetch, AnalysisFetch::Unavailable { status: 404 }));
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let backend = FakeBackend::start(|_| Reply::Chunked {
        status: 500,
        chunks: vec![b"boom".to_vec()],
    })
    .await;

    let fetch = backend
        .client()
        .open_analysis(&session(), &solution("p-4"))
        .await
        .unwrap();
    assert!(matches!(fetch, AnalysisFetch::Unavailable { status: 500 }));
}

#[tokio::test]
async fn test_empty_body_is_missing() {
    let backend = FakeBackend::start(|_| Reply::empty(200)).await;

    let fetch = backend
        .client()
        .open_analysis(&session(), &solution("p-5"))
        .await
        .unwrap();
    assert!(matches!(fetch, AnalysisFetch::MissingBody));
}

#[tokio::test]
async fn test_dropped_connection_keeps_partial_text() {
    let backend = FakeBackend::start(|_| Reply::ChunkedThenDrop {
        chunks: vec!["Hello, ".as_bytes().to_vec(), "wor".as_bytes().to_vec()],
    })
    .await;

    let fetch = backend
        .client()
        .open_analysis(&session(), &solution("p-6"))
        .await
        .unwrap();
    let AnalysisFetch::Streaming(stream) = fetch else {
        panic!("expected a stream");
    };

    let mut acc = AccumulatedText::new();
    let result = accumulate(stream, &mut acc, &mut |_: &str, _: &AccumulatedText| {
        ControlFlow::Continue(())
    })
    .await;
    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("Transport read error"));
    assert!(acc.as_str().starts_with("Hello, wor"));
}

#[tokio::test]
async fn test_teacher_targets_hit_expected_paths() {
    let backend = FakeBackend::start(|_| Reply::text_chunks(&["ok"])).await;
    let client = backend.client();

    let targets = [
        AnalysisTarget::StudentSubject {
            user_id: "u-9".to_string(),
            subject_id: "math".to_string(),
        },
        AnalysisTarget::ClassTag {
            class_id: "c-2".to_string(),
            tag_id: "derivative".to_string(),
        },
    ];
    for target in &targets {
        let fetch = client.open_analysis(&session(), target).await.unwrap();
        let AnalysisFetch::Streaming(stream) = fetch else {
            panic!("expected a stream");
        };
        assert_eq!(collect_text(stream).await.unwrap(), "ok");
    }

    let paths: Vec<String> = backend.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/api/v1/analyze/student/u-9/subject/math/ai".to_string(),
            "/api/v1/analyze/c-2/tag/derivative/ai".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_ids_are_percent_encoded_in_paths() {
    let backend = FakeBackend::start(|_| Reply::text_chunks(&["ok"])).await;
    let target = AnalysisTarget::MyTag {
        tag_id: "a/b?c".to_string(),
    };

    let fetch = backend.client().open_analysis(&session(), &target).await.unwrap();
    let AnalysisFetch::Streaming(stream) = fetch else {
        panic!("expected a stream");
    };
    collect_text(stream).await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests[0].path, "/api/v1/analyze/me/tag/a%2Fb%3Fc/ai");
}
