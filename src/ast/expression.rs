use std::sync::Arc;

use crate::ast::operators::{AstNaryOp, AstUnaryOp};
use crate::expr::Expr;
use crate::serializer::Serializer;
use crate::value::Value;

/// A computed value over a document: the value-expression half of the
/// intermediate representation.
#[derive(Debug, Clone, PartialEq)]
pub enum AstExpr {
    /// Literal constant
    ///
    /// Renders bare, except where the value could be mistaken for an
    /// operator document (strings starting with `$`, documents), which
    /// render under `$literal`.
    Literal(Value),

    /// Reference to a document field (`"$path"`, `"$$CURRENT"` for the
    /// empty path)
    FieldRef(String),

    /// Unary operator application
    Unary { op: AstUnaryOp, arg: Box<AstExpr> },

    /// N-ary operator application
    Nary { op: AstNaryOp, args: Vec<AstExpr> },

    /// Conditional (`$cond`)
    Cond {
        condition: Box<AstExpr>,
        then_branch: Box<AstExpr>,
        else_branch: Box<AstExpr>,
    },
}

impl AstExpr {
    /// Render to the wire form.
    pub fn render(&self) -> Value {
        match self {
            AstExpr::Literal(value) => {
                if needs_literal_wrap(value) {
                    Value::document([("$literal", value.clone())])
                } else {
                    value.clone()
                }
            }
            AstExpr::FieldRef(path) => {
                if path.is_empty() {
                    Value::String("$$CURRENT".to_string())
                } else {
                    Value::String(format!("${}", path))
                }
            }
            AstExpr::Unary { op, arg } => Value::document([(op.symbol(), arg.render())]),
            AstExpr::Nary { op, args } => match op {
                AstNaryOp::DateFromParts => render_date_from_parts(args),
                _ => Value::document([(
                    op.symbol(),
                    Value::Array(args.iter().map(AstExpr::render).collect()),
                )]),
            },
            AstExpr::Cond {
                condition,
                then_branch,
                else_branch,
            } => Value::document([(
                "$cond",
                Value::Array(vec![
                    condition.render(),
                    then_branch.render(),
                    else_branch.render(),
                ]),
            )]),
        }
    }
}

fn needs_literal_wrap(value: &Value) -> bool {
    match value {
        Value::String(s) => s.starts_with('$'),
        Value::Document(_) => true,
        _ => false,
    }
}

/// Map the fixed-arity positional constructor arguments onto the named
/// component document. Arity was established by constructor identity
/// before translation, so 3, 6 and 7 are the only shapes that reach here.
fn render_date_from_parts(args: &[AstExpr]) -> Value {
    const COMPONENTS: [&str; 7] = [
        "year",
        "month",
        "day",
        "hour",
        "minute",
        "second",
        "millisecond",
    ];
    let parts: Vec<(String, Value)> = args
        .iter()
        .zip(COMPONENTS)
        .map(|(arg, name)| (name.to_string(), arg.render()))
        .collect();
    Value::document([("$dateFromParts", Value::document(parts))])
}

/// The aggregation-expression triple: the source expression kept for
/// diagnostics, the lowered AST node, and the serializer describing the
/// runtime type of the computed value (absent for typeless literals such
/// as null).
///
/// Downstream translators consume the triple to keep composing: a method
/// receiver arrives as an `AggExpression`, and its serializer decides how
/// the surrounding construct is typed.
#[derive(Debug, Clone)]
pub struct AggExpression {
    source: Expr,
    ast: AstExpr,
    serializer: Option<Arc<dyn Serializer>>,
}

impl AggExpression {
    pub fn new(source: Expr, ast: AstExpr, serializer: Option<Arc<dyn Serializer>>) -> Self {
        AggExpression {
            source,
            ast,
            serializer,
        }
    }

    /// The source expression this was lowered from
    pub fn source(&self) -> &Expr {
        &self.source
    }

    pub fn ast(&self) -> &AstExpr {
        &self.ast
    }

    pub fn serializer(&self) -> Option<&Arc<dyn Serializer>> {
        self.serializer.as_ref()
    }

    pub fn into_ast(self) -> AstExpr {
        self.ast
    }

    /// Render the underlying AST node to the wire form
    pub fn render(&self) -> Value {
        self.ast.render()
    }

    /// True when this expression is a bare field reference
    pub fn as_field(&self) -> Option<&str> {
        match &self.ast {
            AstExpr::FieldRef(path) => Some(path),
            _ => None,
        }
    }

    /// True when this expression is a literal constant
    pub fn as_literal(&self) -> Option<&Value> {
        match &self.ast {
            AstExpr::Literal(value) => Some(value),
            _ => None,
        }
    }
}
