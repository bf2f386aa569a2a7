//! Value-context translators: lower value-valued subexpressions into
//! aggregation expressions.

use std::sync::Arc;

use crate::ast::expression::{AggExpression, AstExpr};
use crate::ast::operators::{AstNaryOp, AstUnaryOp};
use crate::context::TranslationContext;
use crate::expr::{BinaryOp, Expr, KnownCtor, KnownProperty, UnaryOp};
use crate::serializer::Serializer;
use crate::translator::registry::{
    self, MethodCall, TranslationError, unsupported, unsupported_pattern,
};
use crate::value::ValueKind;

/// Lower a value-valued expression into an aggregation expression.
///
/// This is the value-context entry of the dispatcher. Every result carries
/// the serializer describing its runtime type, chosen from the source
/// expression — a literal's kind, a field's mapped serializer, or the
/// fixed result type of a recognized operator.
pub fn translate_value(
    expr: &Expr,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    translate(expr, expr, ctx)
}

pub(crate) fn translate(
    expr: &Expr,
    enclosing: &Expr,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    match expr {
        Expr::Constant(value) => {
            let serializer = ctx.serializers().for_value(value);
            Ok(AggExpression::new(
                expr.clone(),
                AstExpr::Literal(value.clone()),
                serializer,
            ))
        }
        Expr::Parameter(name) => {
            let symbol = ctx.symbol(name);
            Ok(AggExpression::new(
                expr.clone(),
                AstExpr::FieldRef(symbol.path().to_string()),
                Some(symbol.serializer().clone()),
            ))
        }
        Expr::Current => {
            let symbol = ctx.current_symbol();
            Ok(AggExpression::new(
                expr.clone(),
                AstExpr::FieldRef(symbol.path().to_string()),
                Some(symbol.serializer().clone()),
            ))
        }
        Expr::Field { object, name } => translate_field(expr, object, name, ctx),
        Expr::Property { object, property } => {
            translate_property(expr, object, *property, ctx)
        }
        Expr::Unary { op, operand } => {
            let arg = translate(operand, expr, ctx)?;
            match op {
                UnaryOp::Not => Ok(AggExpression::new(
                    expr.clone(),
                    AstExpr::Unary {
                        op: AstUnaryOp::Not,
                        arg: Box::new(arg.into_ast()),
                    },
                    ctx.serializers().for_kind(ValueKind::Boolean),
                )),
                UnaryOp::Negate => {
                    let serializer = arg.serializer().cloned();
                    Ok(AggExpression::new(
                        expr.clone(),
                        AstExpr::Nary {
                            op: AstNaryOp::Multiply,
                            args: vec![
                                AstExpr::Literal(crate::value::Value::Int32(-1)),
                                arg.into_ast(),
                            ],
                        },
                        serializer,
                    ))
                }
            }
        }
        Expr::Binary { op, left, right } => translate_binary(expr, *op, left, right, ctx),
        Expr::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            let cond = translate(condition, expr, ctx)?;
            let then_part = translate(then_branch, expr, ctx)?;
            let else_part = translate(else_branch, expr, ctx)?;
            let serializer = then_part
                .serializer()
                .cloned()
                .or_else(|| else_part.serializer().cloned());
            Ok(AggExpression::new(
                expr.clone(),
                AstExpr::Cond {
                    condition: Box::new(cond.into_ast()),
                    then_branch: Box::new(then_part.into_ast()),
                    else_branch: Box::new(else_part.into_ast()),
                },
                serializer,
            ))
        }
        Expr::New { ctor, args } => translate_ctor(expr, *ctor, args, ctx),
        Expr::Call {
            method,
            object,
            args,
        } => registry::dispatch_value_method(
            &MethodCall {
                method: *method,
                object,
                args,
                call: expr,
                enclosing,
            },
            ctx,
        ),
        _ => Err(unsupported(expr, enclosing)),
    }
}

/// Field access resolves through the receiver's document serializer: the
/// member table supplies the wire element name and the member serializer.
fn translate_field(
    expr: &Expr,
    object: &Expr,
    name: &str,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    let receiver = translate(object, expr, ctx)?;
    let Some(base) = receiver.as_field() else {
        return Err(unsupported_pattern(
            expr,
            expr,
            "field access on a computed value",
        ));
    };
    let Some(info) = receiver
        .serializer()
        .and_then(|s| s.member(name))
    else {
        return Err(unsupported_pattern(
            expr,
            expr,
            format!("no mapped member '{}'", name),
        ));
    };
    let path = if base.is_empty() {
        info.element_name.clone()
    } else {
        format!("{}.{}", base, info.element_name)
    };
    let serializer = info.serializer.clone();
    Ok(AggExpression::new(
        expr.clone(),
        AstExpr::FieldRef(path),
        Some(serializer),
    ))
}

/// Recognized properties lower to built-in operators applied to the
/// re-translated receiver — the receiver may itself be computed, not a
/// bare field.
fn translate_property(
    expr: &Expr,
    object: &Expr,
    property: KnownProperty,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    let receiver = translate(object, expr, ctx)?;
    let (op, result_kind) = match property {
        KnownProperty::StringLength => (AstUnaryOp::StrLenCp, ValueKind::Int32),
        KnownProperty::ArrayLength => (AstUnaryOp::Size, ValueKind::Int32),
        KnownProperty::DateTimeYear => (AstUnaryOp::Year, ValueKind::Int32),
        KnownProperty::DateTimeMonth => (AstUnaryOp::Month, ValueKind::Int32),
        KnownProperty::DateTimeDay => (AstUnaryOp::DayOfMonth, ValueKind::Int32),
    };
    Ok(AggExpression::new(
        expr.clone(),
        AstExpr::Unary {
            op,
            arg: Box::new(receiver.into_ast()),
        },
        ctx.serializers().for_kind(result_kind),
    ))
}

fn is_string(expression: &AggExpression) -> bool {
    expression
        .serializer()
        .map(|s| s.kind() == ValueKind::String)
        .unwrap_or(false)
}

fn translate_binary(
    expr: &Expr,
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    let lhs = translate(left, expr, ctx)?;
    let rhs = translate(right, expr, ctx)?;

    let (ast_op, serializer) = match op {
        BinaryOp::Eq => (AstNaryOp::Eq, ctx.serializers().for_kind(ValueKind::Boolean)),
        BinaryOp::Ne => (AstNaryOp::Ne, ctx.serializers().for_kind(ValueKind::Boolean)),
        BinaryOp::Gt => (AstNaryOp::Gt, ctx.serializers().for_kind(ValueKind::Boolean)),
        BinaryOp::Gte => (
            AstNaryOp::Gte,
            ctx.serializers().for_kind(ValueKind::Boolean),
        ),
        BinaryOp::Lt => (AstNaryOp::Lt, ctx.serializers().for_kind(ValueKind::Boolean)),
        BinaryOp::Lte => (
            AstNaryOp::Lte,
            ctx.serializers().for_kind(ValueKind::Boolean),
        ),
        BinaryOp::And => (
            AstNaryOp::And,
            ctx.serializers().for_kind(ValueKind::Boolean),
        ),
        BinaryOp::Or => (AstNaryOp::Or, ctx.serializers().for_kind(ValueKind::Boolean)),
        BinaryOp::Add => {
            // String addition is concatenation
            if is_string(&lhs) && is_string(&rhs) {
                (
                    AstNaryOp::Concat,
                    ctx.serializers().for_kind(ValueKind::String),
                )
            } else {
                (AstNaryOp::Add, operand_serializer(&lhs, &rhs))
            }
        }
        BinaryOp::Subtract => (AstNaryOp::Subtract, operand_serializer(&lhs, &rhs)),
        BinaryOp::Multiply => (AstNaryOp::Multiply, operand_serializer(&lhs, &rhs)),
        BinaryOp::Divide => (AstNaryOp::Divide, operand_serializer(&lhs, &rhs)),
        BinaryOp::Modulo => (AstNaryOp::Mod, operand_serializer(&lhs, &rhs)),
        BinaryOp::Coalesce => (AstNaryOp::IfNull, operand_serializer(&lhs, &rhs)),
    };

    Ok(AggExpression::new(
        expr.clone(),
        AstExpr::Nary {
            op: ast_op,
            args: vec![lhs.into_ast(), rhs.into_ast()],
        },
        serializer,
    ))
}

fn operand_serializer(
    lhs: &AggExpression,
    rhs: &AggExpression,
) -> Option<Arc<dyn Serializer>> {
    lhs.serializer()
        .cloned()
        .or_else(|| rhs.serializer().cloned())
}

/// Constructors lower to the fixed-arity construction operator. Which
/// shape applies was decided by constructor identity when the tree was
/// built; the argument count is only checked, never used to choose.
fn translate_ctor(
    expr: &Expr,
    ctor: KnownCtor,
    args: &[Expr],
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    if args.len() != ctor.arity() {
        return Err(unsupported_pattern(
            expr,
            expr,
            format!(
                "constructor takes {} arguments, got {}",
                ctor.arity(),
                args.len()
            ),
        ));
    }
    let parts = args
        .iter()
        .map(|arg| translate(arg, expr, ctx).map(AggExpression::into_ast))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AggExpression::new(
        expr.clone(),
        AstExpr::Nary {
            op: AstNaryOp::DateFromParts,
            args: parts,
        },
        ctx.serializers().for_kind(ValueKind::DateTime),
    ))
}

// Registered value-context method translators

fn receiver_only(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    if !call.args.is_empty() {
        return Err(unsupported_pattern(
            call.call,
            call.enclosing,
            "method takes no arguments",
        ));
    }
    translate(call.object, call.call, ctx)
}

fn string_case(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
    op: AstUnaryOp,
) -> Result<AggExpression, TranslationError> {
    let receiver = receiver_only(call, ctx)?;
    Ok(AggExpression::new(
        call.call.clone(),
        AstExpr::Unary {
            op,
            arg: Box::new(receiver.into_ast()),
        },
        ctx.serializers().for_kind(ValueKind::String),
    ))
}

pub(crate) fn string_to_upper(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    string_case(call, ctx, AstUnaryOp::ToUpper)
}

pub(crate) fn string_to_lower(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    string_case(call, ctx, AstUnaryOp::ToLower)
}

/// Substring position test, value form: the index of the substring is
/// compared to zero. Distinct from the filter form of the same member,
/// which lowers to a regex match.
fn index_of_compare(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
    op: AstNaryOp,
) -> Result<AggExpression, TranslationError> {
    let receiver = translate(call.object, call.call, ctx)?;
    let Some(arg) = call.args.first() else {
        return Err(unsupported_pattern(
            call.call,
            call.enclosing,
            "method takes one argument",
        ));
    };
    let needle = translate(arg, call.call, ctx)?;
    let index = AstExpr::Nary {
        op: AstNaryOp::IndexOfCp,
        args: vec![receiver.into_ast(), needle.into_ast()],
    };
    Ok(AggExpression::new(
        call.call.clone(),
        AstExpr::Nary {
            op,
            args: vec![index, AstExpr::Literal(crate::value::Value::Int32(0))],
        },
        ctx.serializers().for_kind(ValueKind::Boolean),
    ))
}

pub(crate) fn string_contains(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    index_of_compare(call, ctx, AstNaryOp::Gte)
}

pub(crate) fn string_starts_with(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    index_of_compare(call, ctx, AstNaryOp::Eq)
}

pub(crate) fn sequence_count(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    let receiver = receiver_only(call, ctx)?;
    Ok(AggExpression::new(
        call.call.clone(),
        AstExpr::Unary {
            op: AstUnaryOp::Size,
            arg: Box::new(receiver.into_ast()),
        },
        ctx.serializers().for_kind(ValueKind::Int32),
    ))
}

fn sequence_fold(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
    op: AstUnaryOp,
) -> Result<AggExpression, TranslationError> {
    let receiver = receiver_only(call, ctx)?;
    // The fold is typed by the array's element type
    let serializer = receiver
        .serializer()
        .and_then(|s| s.element())
        .cloned();
    Ok(AggExpression::new(
        call.call.clone(),
        AstExpr::Unary {
            op,
            arg: Box::new(receiver.into_ast()),
        },
        serializer,
    ))
}

pub(crate) fn sequence_sum(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    sequence_fold(call, ctx, AstUnaryOp::Sum)
}

pub(crate) fn sequence_min(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    sequence_fold(call, ctx, AstUnaryOp::Min)
}

pub(crate) fn sequence_max(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    sequence_fold(call, ctx, AstUnaryOp::Max)
}

pub(crate) fn sequence_avg(
    call: &MethodCall<'_>,
    ctx: &TranslationContext,
) -> Result<AggExpression, TranslationError> {
    let receiver = receiver_only(call, ctx)?;
    Ok(AggExpression::new(
        call.call.clone(),
        AstExpr::Unary {
            op: AstUnaryOp::Avg,
            arg: Box::new(receiver.into_ast()),
        },
        ctx.serializers().for_kind(ValueKind::Double),
    ))
}
