//! Analysis Views
//!
//! State holders for streamed AI analysis. A view owns the accumulated text
//! for one target and publishes a snapshot after every increment, which is
//! what a UI binds to and re-renders from.
//!
//! Two fetch policies exist:
//! - `Refetch`: every open clears the text and requests again (problem solutions)
//! - `FetchOnce`: a completed, non-empty analysis is kept and not requested again
//!   (subject and tag analysis)

use std::collections::HashMap;
use std::ops::ControlFlow;

use futures_util::future::join_all;
use tokio::sync::watch;
use zhicuoti_client::{AnalysisFetch, AnalysisKind, AnalysisTarget, ApiClient};
use zhicuoti_core::{accumulate, AccumulatedText, Folded, SessionContext};

use crate::utils::error::AppResult;

/// Whether an already loaded analysis is requested again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    Refetch,
    FetchOnce,
}

impl FetchPolicy {
    pub fn for_target(target: &AnalysisTarget) -> Self {
        match target.kind() {
            AnalysisKind::Solution => FetchPolicy::Refetch,
            AnalysisKind::Subject | AnalysisKind::Tag => FetchPolicy::FetchOnce,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    Idle,
    Loading,
    Streaming,
    Ready,
    /// The consumer stopped reading before the stream ended
    Stopped,
    /// Backend answered with a non-success status
    Unavailable,
    /// User-visible failure message
    Failed(String),
}

/// What a UI renders: status plus the text so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub status: ViewStatus,
    pub text: String,
}

/// Result of one `open` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    Completed { increments: usize },
    /// The increment callback asked to stop; the stream was dropped
    Stopped { increments: usize },
    /// `FetchOnce` view already holds a finished analysis
    Cached,
    Unavailable { status: u16 },
    MissingBody { notice: String },
    /// Stream broke off; partial text is kept for display
    Failed { message: String },
}

/// One streamed analysis and its accumulated text.
pub struct AnalysisView {
    target: AnalysisTarget,
    policy: FetchPolicy,
    text: AccumulatedText,
    status: ViewStatus,
    updates: watch::Sender<ViewSnapshot>,
}

impl AnalysisView {
    /// New view using the target's default policy.
    pub fn new(target: AnalysisTarget) -> Self {
        let policy = FetchPolicy::for_target(&target);
        Self::with_policy(target, policy)
    }

    pub fn with_policy(target: AnalysisTarget, policy: FetchPolicy) -> Self {
        let (updates, _) = watch::channel(ViewSnapshot {
            status: ViewStatus::Idle,
            text: String::new(),
        });
        Self {
            target,
            policy,
            text: AccumulatedText::new(),
            status: ViewStatus::Idle,
            updates,
        }
    }

    pub fn target(&self) -> &AnalysisTarget {
        &self.target
    }

    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    /// Receive a snapshot after every status change and increment.
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.updates.subscribe()
    }

    fn is_cached(&self) -> bool {
        self.status == ViewStatus::Ready && !self.text.is_empty()
    }

    fn set_status(&mut self, status: ViewStatus) {
        self.status = status.clone();
        self.updates.send_replace(ViewSnapshot {
            status,
            text: self.text.as_str().to_string(),
        });
    }

    /// Request the analysis and stream it into this view.
    pub async fn open(
        &mut self,
        api: &ApiClient,
        session: &SessionContext,
    ) -> AppResult<ViewOutcome> {
        self.open_with(api, session, |_| ControlFlow::Continue(())).await
    }

    /// Like [`AnalysisView::open`], also handing each increment to `on_increment`.
    /// Returning `Break` from the callback drops the stream and leaves the view
    /// `Stopped` with the text read so far.
    ///
    /// Errors only when the request cannot be sent. Status problems, a missing
    /// body and mid-stream read failures are reported as outcomes and leave the
    /// view in `Unavailable` or `Failed`.
    pub async fn open_with<F>(
        &mut self,
        api: &ApiClient,
        session: &SessionContext,
        mut on_increment: F,
    ) -> AppResult<ViewOutcome>
    where
        F: FnMut(&str) -> ControlFlow<()> + Send,
    {
        if self.policy == FetchPolicy::FetchOnce && self.is_cached() {
            tracing::debug!(analysis = %self.target, "analysis served from cache");
            return Ok(ViewOutcome::Cached);
        }

        self.text.reset();
        self.set_status(ViewStatus::Loading);

        let fetch = match api.open_analysis(session, &self.target).await {
            Ok(fetch) => fetch,
            Err(err) => {
                self.set_status(ViewStatus::Failed(err.to_string()));
                return Err(err.into());
            }
        };

        let stream = match fetch {
            AnalysisFetch::Streaming(stream) => stream,
            AnalysisFetch::Unavailable { status } => {
                self.set_status(ViewStatus::Unavailable);
                return Ok(ViewOutcome::Unavailable { status });
            }
            AnalysisFetch::MissingBody => {
                let notice = self.target.kind().missing_body_notice().to_string();
                self.set_status(ViewStatus::Failed(notice.clone()));
                return Ok(ViewOutcome::MissingBody { notice });
            }
        };

        self.set_status(ViewStatus::Streaming);
        let updates = &self.updates;
        let mut publish = |increment: &str, acc: &AccumulatedText| {
            updates.send_replace(ViewSnapshot {
                status: ViewStatus::Streaming,
                text: acc.as_str().to_string(),
            });
            on_increment(increment)
        };
        let result = accumulate(stream, &mut self.text, &mut publish).await;

        match result {
            Ok(Folded::Completed { increments }) => {
                tracing::debug!(analysis = %self.target, increments, "analysis complete");
                self.set_status(ViewStatus::Ready);
                Ok(ViewOutcome::Completed { increments })
            }
            Ok(Folded::Stopped { increments }) => {
                tracing::debug!(analysis = %self.target, increments, "analysis stream abandoned");
                self.set_status(ViewStatus::Stopped);
                Ok(ViewOutcome::Stopped { increments })
            }
            Err(err) => {
                tracing::warn!(analysis = %self.target, error = %err, "analysis stream failed");
                let message = err.to_string();
                self.set_status(ViewStatus::Failed(message.clone()));
                Ok(ViewOutcome::Failed { message })
            }
        }
    }
}

/// Several views keyed by target, e.g. one per subject on an overview page.
#[derive(Default)]
pub struct AnalysisBoard {
    views: HashMap<AnalysisTarget, AnalysisView>,
}

impl AnalysisBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: &AnalysisTarget) -> Option<&AnalysisView> {
        self.views.get(target)
    }

    /// View for `target`, created with the default policy on first use.
    pub fn view_mut(&mut self, target: &AnalysisTarget) -> &mut AnalysisView {
        self.views
            .entry(target.clone())
            .or_insert_with(|| AnalysisView::new(target.clone()))
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub async fn open(
        &mut self,
        api: &ApiClient,
        session: &SessionContext,
        target: &AnalysisTarget,
    ) -> AppResult<ViewOutcome> {
        self.view_mut(target).open(api, session).await
    }

    /// Open several targets concurrently. Each runs its own stream into its
    /// own view; results come back in no particular order.
    pub async fn open_many(
        &mut self,
        api: &ApiClient,
        session: &SessionContext,
        targets: &[AnalysisTarget],
    ) -> Vec<(AnalysisTarget, AppResult<ViewOutcome>)> {
        for target in targets {
            self.view_mut(target);
        }
        let pending = self
            .views
            .iter_mut()
            .filter(|(target, _)| targets.contains(*target))
            .map(|(target, view)| async move { (target.clone(), view.open(api, session).await) });
        join_all(pending).await
    }
}
