//! Zhicuoti Core
//!
//! Client-side building blocks for rendering AI analysis as it streams in.
//! This crate has no HTTP dependency; anything that yields byte chunks can be
//! decoded.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`, `TransportReadError`)
//! - `streaming` - Byte stream to text increment decoder (`StreamTextDecoder`)
//! - `accumulate` - Fold of increments into `AccumulatedText`
//! - `session` - Explicit session context (`SessionContext`, `SessionStore`)

pub mod accumulate;
pub mod error;
pub mod session;
pub mod streaming;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult, TransportReadError};

// ── Streaming ──────────────────────────────────────────────────────────
pub use streaming::{
    decode_text_stream, ByteStreamReader, ChunkReader, DecodeMode, StreamTextDecoder,
    TextIncrementStream,
};

// ── Accumulation ───────────────────────────────────────────────────────
pub use accumulate::{accumulate, collect_text, AccumulatedText, Folded, TextSubscriber};

// ── Session ────────────────────────────────────────────────────────────
pub use session::{CurrentUser, NamedRef, SessionContext, SessionStore, UserRole};
