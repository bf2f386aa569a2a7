//! Result finalization: reduce a cursor of intermediate result documents
//! into the single typed outcome the caller asked for.
//!
//! Execution (out of scope here) hands back a cursor of wire documents.
//! Each policy in this module drains that cursor under its own cardinality
//! law and closes it deterministically on every exit path — success,
//! empty, or cardinality failure — so no server-side cursor leaks.
//!
//! Both a synchronous contract ([`Cursor`]) and an asynchronous one (any
//! `Stream<Item = Result<Value, CursorError>>`) are supported; the
//! cancellation token passes through to the fetches unchanged. For the
//! asynchronous forms, releasing the stream is tied to drop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{Stream, StreamExt};

use crate::value::Value;

/// Cheap clonable cancellation flag, checked between batch fetches.
///
/// Cancellation is only meaningful while draining: translation never
/// suspends, so there is nothing to cancel there.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Errors raised by the cursor itself.
#[derive(Debug, Clone)]
pub enum CursorError {
    /// The cancellation token fired between fetches
    Cancelled,

    /// The server reported a failure while producing the batch
    Server(String),
}

impl std::fmt::Display for CursorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CursorError::Cancelled => write!(f, "Cursor drain cancelled"),
            CursorError::Server(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for CursorError {}

/// Errors raised while reducing a cursor to a result.
#[derive(Debug, Clone)]
pub enum FinalizeError {
    /// A policy that requires at least one element observed none
    EmptySequence,

    /// A single-result policy observed more than one element
    MoreThanOneElement,

    /// The server-side result document had an unexpected shape
    MalformedResult(String),

    /// The underlying cursor failed
    Cursor(CursorError),
}

impl std::fmt::Display for FinalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalizeError::EmptySequence => write!(f, "Sequence contains no elements"),
            FinalizeError::MoreThanOneElement => {
                write!(f, "Sequence contains more than one element")
            }
            FinalizeError::MalformedResult(msg) => {
                write!(f, "Malformed result document: {}", msg)
            }
            FinalizeError::Cursor(err) => write!(f, "Cursor error: {}", err),
        }
    }
}

impl std::error::Error for FinalizeError {}

/// The synchronous drain contract over server result documents.
///
/// Implementations check the token between fetches and surface
/// [`CursorError::Cancelled`] when it fires. `close` releases the
/// server-side cursor; calling it on an exhausted cursor is a no-op.
pub trait Cursor {
    fn next_document(&mut self, cancel: &CancellationToken)
    -> Result<Option<Value>, CursorError>;

    fn close(&mut self) -> Result<(), CursorError>;
}

/// In-memory cursor over a fixed document list.
///
/// Backs tests and local execution doubles; tracks whether it was closed
/// so drain contracts can be asserted.
#[derive(Debug)]
pub struct VecCursor {
    documents: std::vec::IntoIter<Value>,
    closed: bool,
}

impl VecCursor {
    pub fn new(documents: Vec<Value>) -> Self {
        VecCursor {
            documents: documents.into_iter(),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Cursor for VecCursor {
    fn next_document(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, CursorError> {
        if cancel.is_cancelled() {
            return Err(CursorError::Cancelled);
        }
        if self.closed {
            return Ok(None);
        }
        Ok(self.documents.next())
    }

    fn close(&mut self) -> Result<(), CursorError> {
        self.closed = true;
        Ok(())
    }
}

fn next_or_close(
    cursor: &mut dyn Cursor,
    cancel: &CancellationToken,
) -> Result<Option<Value>, FinalizeError> {
    match cursor.next_document(cancel) {
        Ok(doc) => Ok(doc),
        Err(err) => {
            // Best effort: the fetch already failed
            let _ = cursor.close();
            Err(FinalizeError::Cursor(err))
        }
    }
}

fn close(cursor: &mut dyn Cursor) -> Result<(), FinalizeError> {
    cursor.close().map_err(FinalizeError::Cursor)
}

/// Drain fully, preserving server order.
pub fn to_list(
    cursor: &mut dyn Cursor,
    cancel: &CancellationToken,
) -> Result<Vec<Value>, FinalizeError> {
    let mut out = Vec::new();
    while let Some(doc) = next_or_close(cursor, cancel)? {
        out.push(doc);
    }
    close(cursor)?;
    Ok(out)
}

/// First element; fails with [`FinalizeError::EmptySequence`] on an empty
/// cursor. The rest of the cursor is cancelled, not drained.
pub fn first(
    cursor: &mut dyn Cursor,
    cancel: &CancellationToken,
) -> Result<Value, FinalizeError> {
    let head = next_or_close(cursor, cancel)?;
    close(cursor)?;
    head.ok_or(FinalizeError::EmptySequence)
}

/// First element, or `None` on an empty cursor.
pub fn first_or_default(
    cursor: &mut dyn Cursor,
    cancel: &CancellationToken,
) -> Result<Option<Value>, FinalizeError> {
    let head = next_or_close(cursor, cancel)?;
    close(cursor)?;
    Ok(head)
}

fn drain_after_head(
    cursor: &mut dyn Cursor,
    cancel: &CancellationToken,
) -> Result<bool, FinalizeError> {
    let mut extra = false;
    while next_or_close(cursor, cancel)?.is_some() {
        extra = true;
    }
    close(cursor)?;
    Ok(extra)
}

/// Exactly one element; empty and more-than-one are distinct failures,
/// and multiplicity is detected only after a full drain.
pub fn single(
    cursor: &mut dyn Cursor,
    cancel: &CancellationToken,
) -> Result<Value, FinalizeError> {
    let head = next_or_close(cursor, cancel)?;
    let extra = drain_after_head(cursor, cancel)?;
    match head {
        None => Err(FinalizeError::EmptySequence),
        Some(_) if extra => {
            tracing::debug!("single-result policy observed more than one element");
            Err(FinalizeError::MoreThanOneElement)
        }
        Some(doc) => Ok(doc),
    }
}

/// `None` on empty, the sole element on one, cardinality failure on more.
/// The cursor is fully drained even though at most one element is
/// returned.
pub fn single_or_default(
    cursor: &mut dyn Cursor,
    cancel: &CancellationToken,
) -> Result<Option<Value>, FinalizeError> {
    let head = next_or_close(cursor, cancel)?;
    let extra = drain_after_head(cursor, cancel)?;
    match head {
        None => Ok(None),
        Some(_) if extra => {
            tracing::debug!("single-result policy observed more than one element");
            Err(FinalizeError::MoreThanOneElement)
        }
        Some(doc) => Ok(Some(doc)),
    }
}

fn read_count_document(doc: Option<Value>) -> Result<i64, FinalizeError> {
    match doc {
        // The server emits no count document when nothing matched
        None => Ok(0),
        Some(Value::Document(map)) => map
            .get("n")
            .and_then(Value::as_int)
            .ok_or_else(|| FinalizeError::MalformedResult("missing integer 'n'".to_string())),
        Some(other) => Err(FinalizeError::MalformedResult(format!(
            "expected a count document, got {}",
            other.kind().name()
        ))),
    }
}

/// Server-side count, read from the pipeline's `{n: <integer>}` document.
pub fn long_count(
    cursor: &mut dyn Cursor,
    cancel: &CancellationToken,
) -> Result<i64, FinalizeError> {
    let head = next_or_close(cursor, cancel)?;
    if drain_after_head(cursor, cancel)? {
        return Err(FinalizeError::MalformedResult(
            "more than one count document".to_string(),
        ));
    }
    read_count_document(head)
}

/// [`long_count`] narrowed to 32 bits.
pub fn count(
    cursor: &mut dyn Cursor,
    cancel: &CancellationToken,
) -> Result<i32, FinalizeError> {
    let n = long_count(cursor, cancel)?;
    i32::try_from(n)
        .map_err(|_| FinalizeError::MalformedResult("count exceeds int32".to_string()))
}

fn read_scalar_document(doc: Value) -> Result<Value, FinalizeError> {
    match doc {
        Value::Document(map) => map
            .get("_v")
            .cloned()
            .ok_or_else(|| FinalizeError::MalformedResult("missing '_v'".to_string())),
        other => Err(FinalizeError::MalformedResult(format!(
            "expected an accumulator document, got {}",
            other.kind().name()
        ))),
    }
}

/// Scalar aggregate result, read from the `_v` element of the sole result
/// document.
pub fn scalar(
    cursor: &mut dyn Cursor,
    cancel: &CancellationToken,
) -> Result<Value, FinalizeError> {
    let doc = single(cursor, cancel)?;
    read_scalar_document(doc)
}

/// [`scalar`] with `None` for an empty cursor.
pub fn scalar_or_default(
    cursor: &mut dyn Cursor,
    cancel: &CancellationToken,
) -> Result<Option<Value>, FinalizeError> {
    match single_or_default(cursor, cancel)? {
        Some(doc) => Ok(Some(read_scalar_document(doc)?)),
        None => Ok(None),
    }
}

// Asynchronous mirrors. The same laws over a document stream; dropping
// the stream is what releases it.

async fn next_item<S>(
    stream: &mut S,
    cancel: &CancellationToken,
) -> Result<Option<Value>, FinalizeError>
where
    S: Stream<Item = Result<Value, CursorError>> + Unpin,
{
    if cancel.is_cancelled() {
        return Err(FinalizeError::Cursor(CursorError::Cancelled));
    }
    match stream.next().await {
        Some(item) => item.map(Some).map_err(FinalizeError::Cursor),
        None => Ok(None),
    }
}

pub async fn to_list_async<S>(
    mut stream: S,
    cancel: &CancellationToken,
) -> Result<Vec<Value>, FinalizeError>
where
    S: Stream<Item = Result<Value, CursorError>> + Unpin,
{
    let mut out = Vec::new();
    while let Some(doc) = next_item(&mut stream, cancel).await? {
        out.push(doc);
    }
    Ok(out)
}

pub async fn first_async<S>(
    mut stream: S,
    cancel: &CancellationToken,
) -> Result<Value, FinalizeError>
where
    S: Stream<Item = Result<Value, CursorError>> + Unpin,
{
    next_item(&mut stream, cancel)
        .await?
        .ok_or(FinalizeError::EmptySequence)
}

pub async fn first_or_default_async<S>(
    mut stream: S,
    cancel: &CancellationToken,
) -> Result<Option<Value>, FinalizeError>
where
    S: Stream<Item = Result<Value, CursorError>> + Unpin,
{
    next_item(&mut stream, cancel).await
}

pub async fn single_async<S>(
    mut stream: S,
    cancel: &CancellationToken,
) -> Result<Value, FinalizeError>
where
    S: Stream<Item = Result<Value, CursorError>> + Unpin,
{
    let head = next_item(&mut stream, cancel).await?;
    let mut extra = false;
    while next_item(&mut stream, cancel).await?.is_some() {
        extra = true;
    }
    match head {
        None => Err(FinalizeError::EmptySequence),
        Some(_) if extra => Err(FinalizeError::MoreThanOneElement),
        Some(doc) => Ok(doc),
    }
}

pub async fn single_or_default_async<S>(
    mut stream: S,
    cancel: &CancellationToken,
) -> Result<Option<Value>, FinalizeError>
where
    S: Stream<Item = Result<Value, CursorError>> + Unpin,
{
    let head = next_item(&mut stream, cancel).await?;
    let mut extra = false;
    while next_item(&mut stream, cancel).await?.is_some() {
        extra = true;
    }
    match head {
        None => Ok(None),
        Some(_) if extra => Err(FinalizeError::MoreThanOneElement),
        Some(doc) => Ok(Some(doc)),
    }
}

pub async fn long_count_async<S>(
    mut stream: S,
    cancel: &CancellationToken,
) -> Result<i64, FinalizeError>
where
    S: Stream<Item = Result<Value, CursorError>> + Unpin,
{
    let head = next_item(&mut stream, cancel).await?;
    if next_item(&mut stream, cancel).await?.is_some() {
        return Err(FinalizeError::MalformedResult(
            "more than one count document".to_string(),
        ));
    }
    read_count_document(head)
}
