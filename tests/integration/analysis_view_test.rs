//! Analysis View Integration Tests
//!
//! Fetch policies, snapshots and failure handling of `AnalysisView` and
//! `AnalysisBoard` against the fake backend.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use zhicuoti::{AnalysisBoard, AnalysisView, FetchPolicy, ViewOutcome, ViewStatus};
use zhicuoti_client::{AnalysisTarget, ApiClient, ClientSettings};
use zhicuoti_core::SessionContext;

use crate::support::{FakeBackend, Reply};

fn session() -> SessionContext {
    SessionContext::new("tok-1")
}

fn solution() -> AnalysisTarget {
    AnalysisTarget::ProblemSolution {
        problem_id: "p-1".to_string(),
    }
}

fn my_subject(id: &str) -> AnalysisTarget {
    AnalysisTarget::MySubject {
        subject_id: id.to_string(),
    }
}

// ============================================================================
// Fetch policies
// ============================================================================

#[tokio::test]
async fn test_refetch_replaces_text() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let backend = FakeBackend::start(move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Reply::text_chunks(&["第", if n == 0 { "一次" } else { "二次" }])
    })
    .await;
    let api = backend.client();

    let mut view = AnalysisView::new(solution());
    assert_eq!(view.policy(), FetchPolicy::Refetch);

    let first = view.open(&api, &session()).await.unwrap();
    assert_eq!(first, ViewOutcome::Completed { increments: 2 });
    assert_eq!(view.text(), "第一次");

    let second = view.open(&api, &session()).await.unwrap();
    assert_eq!(second, ViewOutcome::Completed { increments: 2 });
    assert_eq!(view.text(), "第二次");
    assert_eq!(backend.hits("/solution"), 2);
}

#[tokio::test]
async fn test_fetch_once_serves_cached_text() {
    let backend = FakeBackend::start(|_| Reply::text_chunks(&["函数", "掌握良好"])).await;
    let api = backend.client();

    let mut view = AnalysisView::new(my_subject("math"));
    assert_eq!(view.policy(), FetchPolicy::FetchOnce);

    view.open(&api, &session()).await.unwrap();
    let again = view.open(&api, &session()).await.unwrap();

    assert_eq!(again, ViewOutcome::Cached);
    assert_eq!(view.text(), "函数掌握良好");
    assert_eq!(view.status(), &ViewStatus::Ready);
    assert_eq!(backend.hits("/subject/math/ai"), 1);
}

#[tokio::test]
async fn test_fetch_once_retries_after_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let backend = FakeBackend::start(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Reply::ChunkedThenDrop {
                chunks: vec!["半".as_bytes().to_vec()],
            }
        } else {
            Reply::text_chunks(&["完整分析"])
        }
    })
    .await;
    let api = backend.client();
    let mut view = AnalysisView::new(my_subject("physics"));

    let first = view.open(&api, &session()).await.unwrap();
    assert!(matches!(first, ViewOutcome::Failed { .. }));
    assert!(matches!(view.status(), ViewStatus::Failed(_)));
    assert!(view.text().starts_with('半'));

    let second = view.open(&api, &session()).await.unwrap();
    assert_eq!(second, ViewOutcome::Completed { increments: 1 });
    assert_eq!(view.text(), "完整分析");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Status outcomes
// ============================================================================

#[tokio::test]
async fn test_unavailable_leaves_text_empty() {
    let backend = FakeBackend::start(|_| Reply::json(403, serde_json::json!({}))).await;
    let mut view = AnalysisView::new(my_subject("chem"));

    let outcome = view.open(&backend.client(), &session()).await.unwrap();
    assert_eq!(outcome, ViewOutcome::Unavailable { status: 403 });
    assert_eq!(view.status(), &ViewStatus::Unavailable);
    assert!(view.text().is_empty());
}

#[tokio::test]
async fn test_missing_body_reports_notice() {
    let backend = FakeBackend::start(|_| Reply::empty(200)).await;
    let mut view = AnalysisView::new(AnalysisTarget::MyTag {
        tag_id: "t-1".to_string(),
    });

    let outcome = view.open(&backend.client(), &session()).await.unwrap();
    assert_eq!(
        outcome,
        ViewOutcome::MissingBody {
            notice: "Unable to fetch the tag analysis".to_string()
        }
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_an_error() {
    // Nothing listens on port 1.
    let settings = ClientSettings::default().with_base_url("http://127.0.0.1:1/api/v1");
    let api = ApiClient::new(settings).unwrap();

    let mut view = AnalysisView::new(solution());
    assert!(view.open(&api, &session()).await.is_err());
    assert!(matches!(view.status(), ViewStatus::Failed(_)));
}

// ============================================================================
// Snapshots and callbacks
// ============================================================================

#[tokio::test]
async fn test_callback_and_snapshots_follow_increments() {
    let backend = FakeBackend::start(|_| Reply::text_chunks(&["a", "b", "c"])).await;
    let mut view = AnalysisView::new(solution());
    let updates = view.subscribe();

    let mut seen = Vec::new();
    view.open_with(&backend.client(), &session(), |inc| {
        seen.push(inc.to_string());
        ControlFlow::Continue(())
    })
    .await
    .unwrap();

    assert_eq!(seen.concat(), "abc");
    let last = updates.borrow().clone();
    assert_eq!(last.status, ViewStatus::Ready);
    assert_eq!(last.text, "abc");
}

#[tokio::test]
async fn test_break_abandons_stream() {
    let chunks: Vec<&str> = vec!["hello"; 20];
    let backend = FakeBackend::start(move |_| Reply::text_chunks(&chunks)).await;
    let api = backend.client();
    let mut view = AnalysisView::new(my_subject("math"));

    let mut calls = 0;
    let outcome = view
        .open_with(&api, &session(), |_| {
            calls += 1;
            ControlFlow::Break(())
        })
        .await
        .unwrap();

    assert_eq!(outcome, ViewOutcome::Stopped { increments: 1 });
    assert_eq!(calls, 1);
    assert_eq!(view.text(), "hello");
    assert_eq!(view.status(), &ViewStatus::Stopped);

    // A stopped analysis is not cached.
    let again = view.open(&api, &session()).await.unwrap();
    assert_eq!(again, ViewOutcome::Completed { increments: 20 });
    assert_eq!(view.text().len(), 100);
}

#[tokio::test]
async fn test_board_opens_targets_concurrently() {
    let backend = FakeBackend::start(|req| {
        let subject = req
            .path
            .split('/')
            .rev()
            .nth(1)
            .unwrap_or_default()
            .to_string();
        Reply::Chunked {
            status: 200,
            chunks: vec![subject.into_bytes(), b" done".to_vec()],
        }
    })
    .await;
    let api = backend.client();
    let targets = vec![my_subject("math"), my_subject("physics"), my_subject("chem")];

    let mut board = AnalysisBoard::new();
    let results = board.open_many(&api, &session(), &targets).await;

    assert_eq!(results.len(), 3);
    for (target, outcome) in &results {
        assert!(targets.contains(target));
        assert_eq!(outcome.as_ref().unwrap(), &ViewOutcome::Completed { increments: 2 });
    }
    assert_eq!(board.len(), 3);
    assert_eq!(board.get(&my_subject("physics")).unwrap().text(), "physics done");

    // Everything is cached now.
    let again = board.open(&api, &session(), &my_subject("math")).await.unwrap();
    assert_eq!(again, ViewOutcome::Cached);
    assert_eq!(backend.requests().len(), 3);
}
