//! Boolean-context translators: lower boolean-valued subexpressions into
//! filter AST nodes.

use std::sync::Arc;

use crate::ast::filter::AstFilter;
use crate::ast::operators::ComparisonOp;
use crate::context::{Symbol, TranslationContext};
use crate::expr::{BinaryOp, Expr, UnaryOp};
use crate::serializer::Serializer;
use crate::translator::registry::{
    self, MethodCall, TranslationError, unsupported_pattern,
};
use crate::translator::values;
use crate::value::Value;

/// Lower a boolean-valued expression into a filter.
///
/// This is the boolean-context entry of the dispatcher. Anything that is
/// not a recognized filter shape but still value-translates is wrapped in
/// an implicit is-true comparison; anything else is an unsupported
/// construct.
pub fn translate_filter(
    expr: &Expr,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    translate(expr, expr, ctx)
}

pub(crate) fn translate(
    expr: &Expr,
    enclosing: &Expr,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    match expr {
        Expr::Binary {
            op: BinaryOp::And, ..
        } => {
            // Source chains flatten into one n-ary conjunction; every
            // operand translates against the same incoming scope.
            let mut operands = Vec::new();
            collect_operands(expr, BinaryOp::And, &mut operands);
            let filters = operands
                .iter()
                .map(|operand| translate(operand, expr, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AstFilter::And(filters))
        }
        Expr::Binary {
            op: BinaryOp::Or, ..
        } => {
            let mut operands = Vec::new();
            collect_operands(expr, BinaryOp::Or, &mut operands);
            let filters = operands
                .iter()
                .map(|operand| translate(operand, expr, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AstFilter::Or(filters))
        }
        Expr::Binary { op, left, right } => match comparison_op(*op) {
            Some(cmp) => translate_comparison(cmp, left, right, expr, ctx),
            None => implicit_is_true(expr, enclosing, ctx),
        },
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } => {
            // Negation is structural; a double negation stays doubled
            let inner = translate(operand, expr, ctx)?;
            Ok(AstFilter::Not(Box::new(inner)))
        }
        Expr::Call {
            method,
            object,
            args,
        } => registry::dispatch_filter_method(
            &MethodCall {
                method: *method,
                object,
                args,
                call: expr,
                enclosing,
            },
            ctx,
        ),
        _ => implicit_is_true(expr, enclosing, ctx),
    }
}

fn comparison_op(op: BinaryOp) -> Option<ComparisonOp> {
    match op {
        BinaryOp::Eq => Some(ComparisonOp::Eq),
        BinaryOp::Ne => Some(ComparisonOp::Ne),
        BinaryOp::Gt => Some(ComparisonOp::Gt),
        BinaryOp::Gte => Some(ComparisonOp::Gte),
        BinaryOp::Lt => Some(ComparisonOp::Lt),
        BinaryOp::Lte => Some(ComparisonOp::Lte),
        _ => None,
    }
}

/// Collect the leaves of a same-operator binary chain, left to right.
fn collect_operands<'a>(expr: &'a Expr, op: BinaryOp, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::Binary {
            op: chain_op,
            left,
            right,
        } if *chain_op == op => {
            collect_operands(left, op, out);
            collect_operands(right, op, out);
        }
        _ => out.push(expr),
    }
}

/// Comparison lowering: field-to-literal shorthand whenever one side is a
/// field reference and the other a literal (mirrored when the literal is
/// on the left), generic `$expr` comparison otherwise.
fn translate_comparison(
    op: ComparisonOp,
    left: &Expr,
    right: &Expr,
    parent: &Expr,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    let lhs = values::translate(left, parent, ctx)?;
    let rhs = values::translate(right, parent, ctx)?;

    if let (Some(field), Some(literal)) = (lhs.as_field(), rhs.as_literal()) {
        if !field.is_empty() {
            let value = serialize_with(lhs.serializer(), literal)?;
            return Ok(AstFilter::Compare {
                field: field.to_string(),
                op,
                value,
            });
        }
    }
    if let (Some(literal), Some(field)) = (lhs.as_literal(), rhs.as_field()) {
        if !field.is_empty() {
            let value = serialize_with(rhs.serializer(), literal)?;
            return Ok(AstFilter::Compare {
                field: field.to_string(),
                op: op.mirrored(),
                value,
            });
        }
    }

    Ok(AstFilter::ExprCompare {
        op,
        left: Box::new(lhs.into_ast()),
        right: Box::new(rhs.into_ast()),
    })
}

/// A boolean value expression with no filter shape of its own is tested
/// for truth: `{field: true}` for a bare field, `$expr` otherwise.
fn implicit_is_true(
    expr: &Expr,
    enclosing: &Expr,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    let value = values::translate(expr, enclosing, ctx)?;
    match value.as_field() {
        Some(field) if !field.is_empty() => Ok(AstFilter::Compare {
            field: field.to_string(),
            op: ComparisonOp::Eq,
            value: Value::Boolean(true),
        }),
        _ => Ok(AstFilter::ExprCompare {
            op: ComparisonOp::Eq,
            left: Box::new(value.into_ast()),
            right: Box::new(crate::ast::expression::AstExpr::Literal(Value::Boolean(
                true,
            ))),
        }),
    }
}

fn serialize_with(
    serializer: Option<&Arc<dyn Serializer>>,
    value: &Value,
) -> Result<Value, TranslationError> {
    match serializer {
        Some(s) => Ok(s.serialize(value)?),
        None => Ok(value.clone()),
    }
}

/// Resolve a method receiver to a document field path.
fn receiver_field(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<(String, Option<Arc<dyn Serializer>>), TranslationError> {
    let recv = values::translate(call.object, call.call, ctx)?;
    match recv.as_field() {
        Some(field) if !field.is_empty() => {
            Ok((field.to_string(), recv.serializer().cloned()))
        }
        _ => Err(unsupported_pattern(
            call.call,
            call.enclosing,
            "receiver must be a document field",
        )),
    }
}

fn constant_string_arg<'a>(
    call: &MethodCall<'a>,
    index: usize,
) -> Result<&'a str, TranslationError> {
    match call.args.get(index) {
        Some(Expr::Constant(Value::String(s))) => Ok(s),
        _ => Err(unsupported_pattern(
            call.call,
            call.enclosing,
            "argument must be a string constant",
        )),
    }
}

enum StringMatch {
    Prefix,
    Suffix,
    Substring,
}

fn string_match(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
    kind: StringMatch,
) -> Result<AstFilter, TranslationError> {
    let (field, _) = receiver_field(call, ctx)?;
    let escaped = regex::escape(constant_string_arg(call, 0)?);
    let pattern = match kind {
        StringMatch::Prefix => format!("^{}", escaped),
        StringMatch::Suffix => format!("{}$", escaped),
        StringMatch::Substring => escaped,
    };
    // Case-sensitive by default; callers wanting flags use a regex match
    Ok(AstFilter::Regex {
        field,
        pattern,
        options: String::new(),
    })
}

pub(crate) fn string_contains(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    string_match(call, ctx, StringMatch::Substring)
}

pub(crate) fn string_starts_with(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    string_match(call, ctx, StringMatch::Prefix)
}

pub(crate) fn string_ends_with(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    string_match(call, ctx, StringMatch::Suffix)
}

/// Null-or-empty lowers to a disjunction of is-null and is-empty-string.
pub(crate) fn is_null_or_empty(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    let (field, _) = receiver_field(call, ctx)?;
    Ok(AstFilter::Or(vec![
        AstFilter::Compare {
            field: field.clone(),
            op: ComparisonOp::Eq,
            value: Value::Null,
        },
        AstFilter::Compare {
            field,
            op: ComparisonOp::Eq,
            value: Value::String(String::new()),
        },
    ]))
}

/// Regex match: pattern and option flags pass through verbatim. The
/// pattern must be constant; it is validated eagerly so a bad pattern
/// fails at translation time instead of server-side.
pub(crate) fn regex_is_match(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    let (field, _) = receiver_field(call, ctx)?;
    let (pattern, options) = match call.args {
        [Expr::Constant(Value::Regex { pattern, options })] => {
            (pattern.clone(), options.clone())
        }
        [Expr::Constant(Value::String(pattern))] => (pattern.clone(), String::new()),
        [
            Expr::Constant(Value::String(pattern)),
            Expr::Constant(Value::String(options)),
        ] => (pattern.clone(), options.clone()),
        _ => {
            return Err(unsupported_pattern(
                call.call,
                call.enclosing,
                "pattern must be a constant",
            ));
        }
    };
    if regex::Regex::new(&pattern).is_err() {
        return Err(unsupported_pattern(
            call.call,
            call.enclosing,
            "invalid regex pattern",
        ));
    }
    Ok(AstFilter::Regex {
        field,
        pattern,
        options,
    })
}

/// Containment: a constant set containing a field lowers to `$in`; an
/// array field containing a constant lowers to element equality.
pub(crate) fn sequence_contains(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    if let Expr::Constant(Value::Array(set)) = call.object {
        let Some(arg) = call.args.first() else {
            return Err(unsupported_pattern(
                call.call,
                call.enclosing,
                "containment takes one argument",
            ));
        };
        let element = values::translate(arg, call.call, ctx)?;
        let Some(field) = element.as_field().filter(|f| !f.is_empty()) else {
            return Err(unsupported_pattern(
                call.call,
                call.enclosing,
                "set containment argument must be a document field",
            ));
        };
        let values = set
            .iter()
            .map(|v| serialize_with(element.serializer(), v))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(AstFilter::In {
            field: field.to_string(),
            values,
        });
    }

    let (field, serializer) = receiver_field(call, ctx)?;
    match call.args.first() {
        Some(Expr::Constant(value)) => {
            let element_serializer = serializer.as_ref().and_then(|s| s.element());
            let value = serialize_with(element_serializer, value)?;
            Ok(AstFilter::Compare {
                field,
                op: ComparisonOp::Eq,
                value,
            })
        }
        _ => Err(unsupported_pattern(
            call.call,
            call.enclosing,
            "containment element must be a constant",
        )),
    }
}

/// Array field containing every member of a constant set (`$all`).
pub(crate) fn sequence_contains_all(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    let (field, serializer) = receiver_field(call, ctx)?;
    match call.args.first() {
        Some(Expr::Constant(Value::Array(set))) => {
            let element_serializer = serializer.as_ref().and_then(|s| s.element());
            let values = set
                .iter()
                .map(|v| serialize_with(element_serializer, v))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AstFilter::All { field, values })
        }
        _ => Err(unsupported_pattern(
            call.call,
            call.enclosing,
            "contains_all argument must be a constant array",
        )),
    }
}

/// Bit-flag test lowers to a bitwise-mask equality filter.
pub(crate) fn has_flag(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    let (field, _) = receiver_field(call, ctx)?;
    match call.args.first() {
        Some(Expr::Constant(value)) => match value.as_int() {
            Some(mask) => Ok(AstFilter::BitsAllSet { field, mask }),
            None => Err(unsupported_pattern(
                call.call,
                call.enclosing,
                "flag must be an integer constant",
            )),
        },
        _ => Err(unsupported_pattern(
            call.call,
            call.enclosing,
            "flag must be a constant",
        )),
    }
}

/// Translate the quantifier body against a scope extended with the bound
/// variable as the new current element.
fn quantifier_body(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
    serializer: Option<Arc<dyn Serializer>>,
) -> Result<AstFilter, TranslationError> {
    let Some(Expr::Lambda { parameter, body }) = call.args.first() else {
        return Err(unsupported_pattern(
            call.call,
            call.enclosing,
            "quantifier argument must be a lambda",
        ));
    };
    let Some(element_serializer) = serializer.as_ref().and_then(|s| s.element()).cloned() else {
        return Err(unsupported_pattern(
            call.call,
            call.enclosing,
            "receiver has no element serializer",
        ));
    };
    // Element paths are relative inside an element match
    let inner_ctx =
        ctx.with_current_symbol(Symbol::new(parameter.clone(), "", element_serializer));
    translate(body, call.call, &inner_ctx)
}

/// Existential quantifier lowers to an element match.
pub(crate) fn sequence_any(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    let (field, serializer) = receiver_field(call, ctx)?;
    let inner = quantifier_body(call, ctx, serializer)?;
    Ok(AstFilter::ElemMatch {
        field,
        filter: Box::new(inner),
    })
}

/// Universal quantifier: all match ⇔ no element fails the predicate.
pub(crate) fn sequence_all(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AstFilter, TranslationError> {
    let (field, serializer) = receiver_field(call, ctx)?;
    let inner = quantifier_body(call, ctx, serializer)?;
    Ok(AstFilter::Not(Box::new(AstFilter::ElemMatch {
        field,
        filter: Box::new(AstFilter::Not(Box::new(inner))),
    })))
}
