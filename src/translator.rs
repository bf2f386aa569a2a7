//! # Expression-to-AST Translation
//!
//! The translation engine: per-construct lowering rules that turn a host
//! expression tree into the query AST.
//!
//! ## Architecture Overview
//!
//! - **[registry]** - The construct registries and dispatch: two
//!   independent read-only tables (boolean context and value context),
//!   built once at first use, mapping recognized members to translator
//!   functions. Node and operator kinds dispatch by `match` over their
//!   closed enums.
//! - **[filters]** - Boolean-context lowering into [`AstFilter`] nodes.
//! - **[values]** - Value-context lowering into [`AggExpression`]s.
//!
//! ## Control Flow
//!
//! A query surface feeds one lambda at a time into
//! [`translate_predicate`] or [`translate_projection`] with the queried
//! collection's document serializer. The lambda parameter is bound as the
//! implicit current element, and the body is lowered recursively. Failure
//! is total: an unsupported construct aborts the whole tree's translation
//! with the offending node attached, never a partial AST.
//!
//! Translation is a pure, synchronous function of (expression, context);
//! contexts are immutable values, so concurrent translations share nothing
//! mutable.
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use mace::expr::Expr;
//! use mace::output::to_json;
//! use mace::serializer::{DocumentSerializer, Int32Serializer, SerializerRegistry};
//! use mace::translator::translate_predicate;
//!
//! let person = Arc::new(DocumentSerializer::new().field("Age", Arc::new(Int32Serializer)));
//! let predicate = Expr::lambda("p", Expr::gt(Expr::field(Expr::parameter("p"), "Age"), 18));
//!
//! let filter = translate_predicate(
//!     &predicate,
//!     person,
//!     Arc::new(SerializerRegistry::default()),
//! )
//! .unwrap();
//! assert_eq!(to_json(&filter.render()), r#"{"Age":{"$gt":18}}"#);
//! ```
//!
//! [`AstFilter`]: crate::ast::AstFilter
//! [`AggExpression`]: crate::ast::AggExpression

pub mod filters;
pub mod registry;
pub mod values;

use std::sync::Arc;

use crate::ast::expression::AggExpression;
use crate::ast::filter::AstFilter;
use crate::context::{Symbol, TranslationContext};
use crate::expr::Expr;
use crate::serializer::{Serializer, SerializerRegistry};

pub use filters::translate_filter;
pub use registry::TranslationError;
pub use values::translate_value;

use registry::unsupported;

/// Translate a predicate lambda into a filter.
///
/// The lambda parameter is bound as the current element over `document`,
/// the queried collection's serializer, with the empty field path (the
/// document itself).
pub fn translate_predicate(
    lambda: &Expr,
    document: Arc<dyn Serializer>,
    serializers: Arc<SerializerRegistry>,
) -> Result<AstFilter, TranslationError> {
    let Expr::Lambda { parameter, body } = lambda else {
        return Err(unsupported(lambda, lambda));
    };
    tracing::trace!(predicate = %lambda, "translating predicate");
    let ctx = TranslationContext::new(serializers)
        .with_current_symbol(Symbol::new(parameter.clone(), "", document));
    filters::translate(body, lambda, &ctx)
}

/// Translate a projection lambda into an aggregation expression.
pub fn translate_projection(
    lambda: &Expr,
    document: Arc<dyn Serializer>,
    serializers: Arc<SerializerRegistry>,
) -> Result<AggExpression, TranslationError> {
    let Expr::Lambda { parameter, body } = lambda else {
        return Err(unsupported(lambda, lambda));
    };
    tracing::trace!(projection = %lambda, "translating projection");
    let ctx = TranslationContext::new(serializers)
        .with_current_symbol(Symbol::new(parameter.clone(), "", document));
    values::translate(body, lambda, &ctx)
}
