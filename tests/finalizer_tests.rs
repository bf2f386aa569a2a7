// tests/finalizer_tests.rs

use futures::executor::block_on;
use futures::stream;

use mace::finalizer::{
    self, CancellationToken, CursorError, FinalizeError, VecCursor,
};
use mace::value::Value;

fn doc(id: i32) -> Value {
    Value::document([("_id", Value::Int32(id))])
}

fn token() -> CancellationToken {
    CancellationToken::new()
}

// ============================================================================
// to_list
// ============================================================================

#[test]
fn test_to_list_empty() {
    let mut cursor = VecCursor::new(vec![]);
    let result = finalizer::to_list(&mut cursor, &token()).unwrap();
    assert!(result.is_empty());
    assert!(cursor.is_closed());
}

#[test]
fn test_to_list_preserves_order() {
    let mut cursor = VecCursor::new(vec![doc(1), doc(2), doc(3)]);
    let result = finalizer::to_list(&mut cursor, &token()).unwrap();
    assert_eq!(result, vec![doc(1), doc(2), doc(3)]);
    assert!(cursor.is_closed());
}

#[test]
fn test_to_list_single_element() {
    let mut cursor = VecCursor::new(vec![doc(7)]);
    let result = finalizer::to_list(&mut cursor, &token()).unwrap();
    assert_eq!(result, vec![doc(7)]);
}

// ============================================================================
// first / first_or_default
// ============================================================================

#[test]
fn test_first_empty_is_an_error() {
    let mut cursor = VecCursor::new(vec![]);
    let result = finalizer::first(&mut cursor, &token());
    assert!(matches!(result, Err(FinalizeError::EmptySequence)));
    assert!(cursor.is_closed());
}

#[test]
fn test_first_returns_head_and_cancels_the_rest() {
    let mut cursor = VecCursor::new(vec![doc(1), doc(2)]);
    let result = finalizer::first(&mut cursor, &token()).unwrap();
    assert_eq!(result, doc(1));
    assert!(cursor.is_closed());
}

#[test]
fn test_first_or_default_empty_is_none() {
    let mut cursor = VecCursor::new(vec![]);
    let result = finalizer::first_or_default(&mut cursor, &token()).unwrap();
    assert!(result.is_none());
    assert!(cursor.is_closed());
}

#[test]
fn test_first_or_default_returns_head() {
    let mut cursor = VecCursor::new(vec![doc(1), doc(2)]);
    let result = finalizer::first_or_default(&mut cursor, &token()).unwrap();
    assert_eq!(result, Some(doc(1)));
}

// ============================================================================
// single / single_or_default
// ============================================================================

#[test]
fn test_single_exactly_one() {
    let mut cursor = VecCursor::new(vec![doc(1)]);
    assert_eq!(finalizer::single(&mut cursor, &token()).unwrap(), doc(1));
    assert!(cursor.is_closed());
}

#[test]
fn test_single_empty_is_empty_sequence() {
    let mut cursor = VecCursor::new(vec![]);
    let result = finalizer::single(&mut cursor, &token());
    assert!(matches!(result, Err(FinalizeError::EmptySequence)));
}

#[test]
fn test_single_two_is_cardinality_violation() {
    let mut cursor = VecCursor::new(vec![doc(1), doc(2)]);
    let result = finalizer::single(&mut cursor, &token());
    assert!(matches!(result, Err(FinalizeError::MoreThanOneElement)));
    assert!(cursor.is_closed());
}

#[test]
fn test_single_or_default_empty_is_none() {
    let mut cursor = VecCursor::new(vec![]);
    let result = finalizer::single_or_default(&mut cursor, &token()).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_single_or_default_one_is_some() {
    let mut cursor = VecCursor::new(vec![doc(1)]);
    let result = finalizer::single_or_default(&mut cursor, &token()).unwrap();
    assert_eq!(result, Some(doc(1)));
}

#[test]
fn test_single_or_default_two_is_cardinality_violation() {
    let mut cursor = VecCursor::new(vec![doc(1), doc(2)]);
    let result = finalizer::single_or_default(&mut cursor, &token());
    assert!(matches!(result, Err(FinalizeError::MoreThanOneElement)));
    // The full cursor was drained to detect the violation
    assert!(cursor.is_closed());
}

// Cardinality and emptiness are distinct, separately matchable failures
#[test]
fn test_cardinality_and_emptiness_are_distinct() {
    let mut empty = VecCursor::new(vec![]);
    let mut two = VecCursor::new(vec![doc(1), doc(2)]);
    let empty_err = finalizer::single(&mut empty, &token()).unwrap_err();
    let many_err = finalizer::single(&mut two, &token()).unwrap_err();
    assert!(matches!(empty_err, FinalizeError::EmptySequence));
    assert!(matches!(many_err, FinalizeError::MoreThanOneElement));
}

// ============================================================================
// count
// ============================================================================

#[test]
fn test_count_reads_server_count_document() {
    let mut cursor = VecCursor::new(vec![Value::document([("n", Value::Int32(5))])]);
    assert_eq!(finalizer::count(&mut cursor, &token()).unwrap(), 5);
}

#[test]
fn test_count_empty_cursor_is_zero() {
    // The server emits no count document when nothing matched
    let mut cursor = VecCursor::new(vec![]);
    assert_eq!(finalizer::count(&mut cursor, &token()).unwrap(), 0);
}

#[test]
fn test_long_count_handles_wide_counts() {
    let wide = 5_000_000_000i64;
    let mut cursor = VecCursor::new(vec![Value::document([("n", Value::Int64(wide))])]);
    assert_eq!(finalizer::long_count(&mut cursor, &token()).unwrap(), wide);
}

#[test]
fn test_count_overflow_is_malformed() {
    let mut cursor =
        VecCursor::new(vec![Value::document([("n", Value::Int64(5_000_000_000))])]);
    let result = finalizer::count(&mut cursor, &token());
    assert!(matches!(result, Err(FinalizeError::MalformedResult(_))));
}

#[test]
fn test_count_rejects_malformed_document() {
    let mut cursor = VecCursor::new(vec![Value::document([("total", Value::Int32(5))])]);
    let result = finalizer::count(&mut cursor, &token());
    assert!(matches!(result, Err(FinalizeError::MalformedResult(_))));
}

#[test]
fn test_count_rejects_extra_documents() {
    let mut cursor = VecCursor::new(vec![
        Value::document([("n", Value::Int32(5))]),
        Value::document([("n", Value::Int32(6))]),
    ]);
    let result = finalizer::count(&mut cursor, &token());
    assert!(matches!(result, Err(FinalizeError::MalformedResult(_))));
}

// ============================================================================
// scalar
// ============================================================================

#[test]
fn test_scalar_reads_accumulator_element() {
    let mut cursor = VecCursor::new(vec![Value::document([("_v", Value::Int32(42))])]);
    assert_eq!(
        finalizer::scalar(&mut cursor, &token()).unwrap(),
        Value::Int32(42)
    );
}

#[test]
fn test_scalar_empty_is_empty_sequence() {
    let mut cursor = VecCursor::new(vec![]);
    let result = finalizer::scalar(&mut cursor, &token());
    assert!(matches!(result, Err(FinalizeError::EmptySequence)));
}

#[test]
fn test_scalar_or_default_empty_is_none() {
    let mut cursor = VecCursor::new(vec![]);
    let result = finalizer::scalar_or_default(&mut cursor, &token()).unwrap();
    assert!(result.is_none());
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn test_cancelled_token_aborts_drain() {
    let cancel = token();
    cancel.cancel();
    let mut cursor = VecCursor::new(vec![doc(1)]);
    let result = finalizer::to_list(&mut cursor, &cancel);
    assert!(matches!(
        result,
        Err(FinalizeError::Cursor(CursorError::Cancelled))
    ));
    // Failed fetches still release the cursor
    assert!(cursor.is_closed());
}

// ============================================================================
// Asynchronous drain
// ============================================================================

fn ok_stream(
    docs: Vec<Value>,
) -> impl futures::Stream<Item = Result<Value, CursorError>> + Unpin {
    stream::iter(docs.into_iter().map(Ok))
}

#[test]
fn test_async_to_list_preserves_order() {
    let result = block_on(finalizer::to_list_async(
        ok_stream(vec![doc(1), doc(2)]),
        &token(),
    ))
    .unwrap();
    assert_eq!(result, vec![doc(1), doc(2)]);
}

#[test]
fn test_async_first_empty_is_an_error() {
    let result = block_on(finalizer::first_async(ok_stream(vec![]), &token()));
    assert!(matches!(result, Err(FinalizeError::EmptySequence)));
}

#[test]
fn test_async_single_or_default_laws() {
    assert!(
        block_on(finalizer::single_or_default_async(
            ok_stream(vec![]),
            &token()
        ))
        .unwrap()
        .is_none()
    );
    assert_eq!(
        block_on(finalizer::single_or_default_async(
            ok_stream(vec![doc(1)]),
            &token()
        ))
        .unwrap(),
        Some(doc(1))
    );
    let result = block_on(finalizer::single_or_default_async(
        ok_stream(vec![doc(1), doc(2)]),
        &token(),
    ));
    assert!(matches!(result, Err(FinalizeError::MoreThanOneElement)));
}

#[test]
fn test_async_long_count() {
    let result = block_on(finalizer::long_count_async(
        ok_stream(vec![Value::document([("n", Value::Int32(9))])]),
        &token(),
    ))
    .unwrap();
    assert_eq!(result, 9);
}

#[test]
fn test_async_cancellation_checked_between_elements() {
    let cancel = token();
    cancel.cancel();
    let result = block_on(finalizer::to_list_async(ok_stream(vec![doc(1)]), &cancel));
    assert!(matches!(
        result,
        Err(FinalizeError::Cursor(CursorError::Cancelled))
    ));
}

#[test]
fn test_async_server_error_propagates() {
    let items: Vec<Result<Value, CursorError>> = vec![
        Ok(doc(1)),
        Err(CursorError::Server("interrupted".to_string())),
    ];
    let result = block_on(finalizer::to_list_async(stream::iter(items), &token()));
    assert!(matches!(
        result,
        Err(FinalizeError::Cursor(CursorError::Server(_)))
    ));
}
