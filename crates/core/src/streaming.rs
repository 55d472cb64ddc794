//! Streaming Text Decoder
//!
//! Turns a pull-based byte stream (typically an HTTP response body) into a lazy
//! sequence of decoded text increments, one per chunk, so callers can render
//! AI-generated output while it is still arriving.
//!
//! The decoder owns the reader for the whole iteration and releases it exactly
//! once: on end-of-stream, on a read error, or when the decoder (or the stream
//! built from it) is dropped early.

use std::char::REPLACEMENT_CHARACTER;
use std::fmt::Display;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::TransportReadError;

/// Boxed stream of decoded text increments.
pub type TextIncrementStream =
    Pin<Box<dyn Stream<Item = Result<String, TransportReadError>> + Send>>;

/// How byte chunks are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// Each chunk is decoded on its own; a character split across two chunks
    /// comes out as replacement characters.
    PerChunk,
    /// An incomplete trailing UTF-8 sequence is carried into the next chunk.
    #[default]
    Incremental,
}

/// Exclusive, sequential, pull-based access to a byte stream.
///
/// `read` returns `Ok(None)` once the source signals completion. `release`
/// gives the underlying handle back (closing or returning the connection);
/// the decoder calls it exactly once.
#[async_trait]
pub trait ChunkReader: Send {
    /// Pull the next chunk. Must not be called again before it resolves.
    async fn read(&mut self) -> Result<Option<Bytes>, TransportReadError>;

    /// Release the underlying handle.
    fn release(&mut self);
}

/// Holds the reader while iteration is live; releases it on every exit path.
struct ReaderGuard<R: ChunkReader> {
    reader: Option<R>,
}

impl<R: ChunkReader> ReaderGuard<R> {
    fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
        }
    }

    fn reader_mut(&mut self) -> Option<&mut R> {
        self.reader.as_mut()
    }

    fn is_released(&self) -> bool {
        self.reader.is_none()
    }

    fn release(&mut self) {
        if let Some(mut reader) = self.reader.take() {
            reader.release();
        }
    }
}

impl<R: ChunkReader> Drop for ReaderGuard<R> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Carries an incomplete UTF-8 sequence (at most 3 bytes) between chunks.
#[derive(Debug, Default)]
struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            // Truncated sequence at the end: wait for more bytes.
                            self.pending.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Discard whatever is still pending at end-of-stream. Returns the number
    /// of dropped bytes.
    fn finish(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}

/// Decodes a byte stream into text increments.
///
/// Single use: [`StreamTextDecoder::into_stream`] consumes the decoder, and a
/// finished decoder never reads again. A new request needs a new decoder over
/// a fresh reader.
pub struct StreamTextDecoder<R: ChunkReader> {
    guard: ReaderGuard<R>,
    mode: DecodeMode,
    carry: Utf8Carry,
    chunks_read: usize,
}

impl<R: ChunkReader + 'static> StreamTextDecoder<R> {
    /// Wrap a reader using the default (incremental) decode mode.
    pub fn new(reader: R) -> Self {
        Self::with_mode(reader, DecodeMode::default())
    }

    pub fn with_mode(reader: R, mode: DecodeMode) -> Self {
        Self {
            guard: ReaderGuard::new(reader),
            mode,
            carry: Utf8Carry::default(),
            chunks_read: 0,
        }
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Number of chunks pulled from the reader so far.
    pub fn chunks_read(&self) -> usize {
        self.chunks_read
    }

    /// Whether the reader has been released (end-of-stream or error).
    pub fn is_finished(&self) -> bool {
        self.guard.is_released()
    }

    /// Pull one chunk and decode it.
    ///
    /// Returns `None` once the stream is exhausted. After an error the reader
    /// is released and every later call returns `None`.
    pub async fn next_increment(&mut self) -> Option<Result<String, TransportReadError>> {
        let reader = self.guard.reader_mut()?;
        match reader.read().await {
            Ok(Some(chunk)) => {
                self.chunks_read += 1;
                Some(Ok(self.decode(&chunk)))
            }
            Ok(None) => {
                tracing::debug!(chunks = self.chunks_read, "text stream completed");
                self.guard.release();
                // Completion never yields an extra increment.
                let dropped = self.carry.finish();
                if dropped > 0 {
                    tracing::warn!(bytes = dropped, "text stream ended inside a UTF-8 sequence");
                }
                None
            }
            Err(err) => {
                tracing::warn!(chunks = self.chunks_read, error = %err, "text stream read failed");
                self.guard.release();
                self.carry.finish();
                Some(Err(err))
            }
        }
    }

    /// Convert into a lazy stream of increments.
    pub fn into_stream(self) -> TextIncrementStream {
        Box::pin(futures_util::stream::unfold(self, |mut decoder| async move {
            let item = decoder.next_increment().await?;
            Some((item, decoder))
        }))
    }

    fn decode(&mut self, chunk: &[u8]) -> String {
        match self.mode {
            DecodeMode::PerChunk => String::from_utf8_lossy(chunk).into_owned(),
            DecodeMode::Incremental => self.carry.decode(chunk),
        }
    }
}

/// Decode a byte stream into text increments in one call.
pub fn decode_text_stream<R: ChunkReader + 'static>(reader: R, mode: DecodeMode) -> TextIncrementStream {
    StreamTextDecoder::with_mode(reader, mode).into_stream()
}

/// Adapts any fallible `Bytes` stream (e.g. `reqwest::Response::bytes_stream`)
/// into a [`ChunkReader`]. Releasing drops the inner stream.
pub struct ByteStreamReader<S> {
    inner: Option<Pin<Box<S>>>,
}

impl<S> ByteStreamReader<S> {
    pub fn new(stream: S) -> Self {
        Self {
            inner: Some(Box::pin(stream)),
        }
    }

    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }
}

#[async_trait]
impl<S, E> ChunkReader for ByteStreamReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    async fn read(&mut self) -> Result<Option<Bytes>, TransportReadError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(None);
        };
        match inner.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(err)) => Err(TransportReadError::new(err.to_string())),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        if self.inner.take().is_some() {
            tracing::debug!("byte stream released");
        }
    }
}
