//! Text Accumulation
//!
//! Folds a stream of text increments into a single growing value, notifying a
//! subscriber after each append so the owner can re-render. Kept separate from
//! the decoder so either side can be reused on its own.

use std::fmt;
use std::ops::ControlFlow;

use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::TransportReadError;

/// Concatenation, in arrival order, of every increment seen for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatedText {
    text: String,
    increments: usize,
}

impl AccumulatedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of increments appended since the last reset.
    pub fn increments(&self) -> usize {
        self.increments
    }

    pub fn push(&mut self, increment: &str) {
        self.text.push_str(increment);
        self.increments += 1;
    }

    /// Drop everything accumulated so far (start of a re-fetch).
    pub fn reset(&mut self) {
        self.text.clear();
        self.increments = 0;
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for AccumulatedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Receives every fold step: the increment just appended and the text so far.
///
/// Returning `Break` stops the fold; the stream is dropped right away, which
/// releases the underlying reader.
pub trait TextSubscriber: Send {
    fn on_increment(&mut self, increment: &str, accumulated: &AccumulatedText) -> ControlFlow<()>;
}

impl<F> TextSubscriber for F
where
    F: FnMut(&str, &AccumulatedText) -> ControlFlow<()> + Send,
{
    fn on_increment(&mut self, increment: &str, accumulated: &AccumulatedText) -> ControlFlow<()> {
        self(increment, accumulated)
    }
}

/// How a fold ended without a read error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folded {
    /// The stream ran to completion.
    Completed { increments: usize },
    /// The subscriber asked to stop; the rest of the stream was never read.
    Stopped { increments: usize },
}

impl Folded {
    /// Increments appended by this fold.
    pub fn increments(&self) -> usize {
        match self {
            Folded::Completed { increments } | Folded::Stopped { increments } => *increments,
        }
    }
}

/// Append every increment of `stream` to `text`, calling `subscriber` after each.
///
/// On a read error the text keeps everything appended before the failure and
/// the error is returned.
pub async fn accumulate<S, Sub>(
    stream: S,
    text: &mut AccumulatedText,
    subscriber: &mut Sub,
) -> Result<Folded, TransportReadError>
where
    S: Stream<Item = Result<String, TransportReadError>>,
    Sub: TextSubscriber + ?Sized,
{
    futures_util::pin_mut!(stream);
    let mut appended = 0;
    while let Some(item) = stream.next().await {
        let increment = item?;
        text.push(&increment);
        appended += 1;
        if subscriber.on_increment(&increment, text).is_break() {
            return Ok(Folded::Stopped {
                increments: appended,
            });
        }
    }
    Ok(Folded::Completed {
        increments: appended,
    })
}

/// Drain a stream into a `String`.
pub async fn collect_text<S>(stream: S) -> Result<String, TransportReadError>
where
    S: Stream<Item = Result<String, TransportReadError>>,
{
    let mut text = AccumulatedText::new();
    accumulate(stream, &mut text, &mut |_: &str, _: &AccumulatedText| {
        ControlFlow::Continue(())
    })
    .await?;
    Ok(text.into_string())
}
