use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ast::expression::AggExpression;
use crate::ast::filter::AstFilter;
use crate::context::TranslationContext;
use crate::expr::{Expr, KnownMethod};
use crate::serializer::SerializerError;
use crate::translator::{filters, values};

/// Errors raised while lowering an expression tree.
///
/// Translation failures are final: no partial AST is produced and nothing
/// is approximated. The offending subexpression and its nearest enclosing
/// expression are carried for diagnostics.
#[derive(Debug, Clone)]
pub enum TranslationError {
    /// Dispatch found no translator for the node
    UnsupportedConstruct { node: Box<Expr>, enclosing: Box<Expr> },

    /// The construct is recognized but its argument shape has no lowering
    UnsupportedPattern {
        node: Box<Expr>,
        enclosing: Box<Expr>,
        reason: String,
    },

    /// A literal could not be serialized into the compared field's wire type
    Serialization(SerializerError),
}

impl std::fmt::Display for TranslationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslationError::UnsupportedConstruct { node, enclosing } => {
                write!(f, "Unsupported construct: {} (in {})", node, enclosing)
            }
            TranslationError::UnsupportedPattern {
                node,
                enclosing,
                reason,
            } => write!(
                f,
                "Unsupported pattern: {}: {} (in {})",
                reason, node, enclosing
            ),
            TranslationError::Serialization(err) => {
                write!(f, "Cannot serialize comparison literal: {}", err)
            }
        }
    }
}

impl std::error::Error for TranslationError {}

impl From<SerializerError> for TranslationError {
    fn from(err: SerializerError) -> Self {
        TranslationError::Serialization(err)
    }
}

pub(crate) fn unsupported(node: &Expr, enclosing: &Expr) -> TranslationError {
    TranslationError::UnsupportedConstruct {
        node: Box::new(node.clone()),
        enclosing: Box::new(enclosing.clone()),
    }
}

pub(crate) fn unsupported_pattern(
    node: &Expr,
    enclosing: &Expr,
    reason: impl Into<String>,
) -> TranslationError {
    TranslationError::UnsupportedPattern {
        node: Box::new(node.clone()),
        enclosing: Box::new(enclosing.clone()),
        reason: reason.into(),
    }
}

/// The pieces of a recognized method call handed to a registered
/// translator: the construct key, the receiver, the arguments, the whole
/// call node and its nearest enclosing expression for diagnostics.
pub(crate) struct MethodCall<'a> {
    pub method: KnownMethod,
    pub object: &'a Expr,
    pub args: &'a [Expr],
    pub call: &'a Expr,
    pub enclosing: &'a Expr,
}

type FilterMethodFn = fn(&MethodCall<'_>, &TranslationContext) -> Result<AstFilter, TranslationError>;
type ValueMethodFn =
    fn(&MethodCall<'_>, &TranslationContext) -> Result<AggExpression, TranslationError>;

/// Boolean-context registry: recognized predicate methods to filter
/// lowerings. Built once, read-only afterwards; concurrent translations
/// never contend on it.
static FILTER_METHODS: Lazy<HashMap<KnownMethod, FilterMethodFn>> = Lazy::new(|| {
    tracing::trace!("initializing filter-method registry");
    let mut table: HashMap<KnownMethod, FilterMethodFn> = HashMap::new();
    table.insert(KnownMethod::StringContains, filters::string_contains);
    table.insert(KnownMethod::StringStartsWith, filters::string_starts_with);
    table.insert(KnownMethod::StringEndsWith, filters::string_ends_with);
    table.insert(KnownMethod::StringIsNullOrEmpty, filters::is_null_or_empty);
    table.insert(KnownMethod::RegexIsMatch, filters::regex_is_match);
    table.insert(KnownMethod::SequenceContains, filters::sequence_contains);
    table.insert(
        KnownMethod::SequenceContainsAll,
        filters::sequence_contains_all,
    );
    table.insert(KnownMethod::SequenceAny, filters::sequence_any);
    table.insert(KnownMethod::SequenceAll, filters::sequence_all);
    table.insert(KnownMethod::HasFlag, filters::has_flag);
    table
});

/// Value-context registry: recognized methods to value-expression
/// lowerings. Independent from the filter registry because the same
/// member can mean different things in the two contexts.
static VALUE_METHODS: Lazy<HashMap<KnownMethod, ValueMethodFn>> = Lazy::new(|| {
    tracing::trace!("initializing value-method registry");
    let mut table: HashMap<KnownMethod, ValueMethodFn> = HashMap::new();
    table.insert(KnownMethod::StringToUpper, values::string_to_upper);
    table.insert(KnownMethod::StringToLower, values::string_to_lower);
    table.insert(KnownMethod::StringContains, values::string_contains);
    table.insert(KnownMethod::StringStartsWith, values::string_starts_with);
    table.insert(KnownMethod::SequenceCount, values::sequence_count);
    table.insert(KnownMethod::SequenceSum, values::sequence_sum);
    table.insert(KnownMethod::SequenceMin, values::sequence_min);
    table.insert(KnownMethod::SequenceMax, values::sequence_max);
    table.insert(KnownMethod::SequenceAvg, values::sequence_avg);
    table
});

pub(crate) fn dispatch_filter_method(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    match FILTER_METHODS.get(&call.method) {
        Some(translator) => translator(call, ctx),
        None => {
            tracing::debug!(
                method = call.method.name(),
                "no filter translator registered"
            );
            Err(unsupported(call.call, call.enclosing))
        }
    }
}

pub(crate) fn dispatch_value_method(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    match VALUE_METHODS.get(&call.method) {
        Some(translator) => translator(call, ctx),
        None => {
            tracing::debug!(
                method = call.method.name(),
                "no value translator registered"
            );
            Err(unsupported(call.call, call.enclosing))
        }
    }
}
