use crate::ast::expression::AstExpr;
use crate::ast::operators::ComparisonOp;
use crate::value::{Value, ValueKind};

/// A boolean test over a document: the filter half of the intermediate
/// representation.
///
/// Filters are immutable and acyclic. `render()` produces the wire form;
/// rendering never restructures the tree — `Not(Not(f))` renders as a
/// nested double negation, and `And`/`Or` stay exactly as flat as the
/// translator built them.
#[derive(Debug, Clone, PartialEq)]
pub enum AstFilter {
    /// Flat n-ary conjunction (`$and`)
    And(Vec<AstFilter>),

    /// Flat n-ary disjunction (`$or`)
    Or(Vec<AstFilter>),

    /// Structural negation (`$nor` of one filter)
    Not(Box<AstFilter>),

    /// Field compared to a literal — the canonical shorthand form
    ///
    /// Chosen whenever one side of a comparison is a field reference and
    /// the other a literal; equality renders as the bare `{field: value}`
    /// shape the server can drive an index from.
    Compare {
        field: String,
        op: ComparisonOp,
        value: Value,
    },

    /// Generic comparison of two computed expressions (`$expr`)
    ExprCompare {
        op: ComparisonOp,
        left: Box<AstExpr>,
        right: Box<AstExpr>,
    },

    /// Field existence test (`$exists`)
    Exists { field: String, exists: bool },

    /// Array element match (`$elemMatch`)
    ElemMatch {
        field: String,
        filter: Box<AstFilter>,
    },

    /// Field value is one of a set (`$in`)
    In { field: String, values: Vec<Value> },

    /// Array field contains every member of a set (`$all`)
    All { field: String, values: Vec<Value> },

    /// Regular-expression match (`$regex`)
    ///
    /// `options` carries the server flags verbatim; empty means
    /// case-sensitive.
    Regex {
        field: String,
        pattern: String,
        options: String,
    },

    /// Bitwise mask test (`$bitsAllSet`)
    BitsAllSet { field: String, mask: i64 },
}

impl AstFilter {
    /// Render to the wire document form.
    pub fn render(&self) -> Value {
        match self {
            AstFilter::And(filters) => Value::document([(
                "$and",
                Value::Array(filters.iter().map(AstFilter::render).collect()),
            )]),
            AstFilter::Or(filters) => Value::document([(
                "$or",
                Value::Array(filters.iter().map(AstFilter::render).collect()),
            )]),
            AstFilter::Not(filter) => {
                Value::document([("$nor", Value::Array(vec![filter.render()]))])
            }
            AstFilter::Compare { field, op, value } => {
                // Equality renders bare unless the value itself would read
                // as an operator document
                let plain_eq = *op == ComparisonOp::Eq
                    && value.kind() != ValueKind::Document
                    && value.kind() != ValueKind::Regex;
                if plain_eq {
                    Value::document([(field.clone(), value.clone())])
                } else {
                    Value::document([(
                        field.clone(),
                        Value::document([(op.symbol(), value.clone())]),
                    )])
                }
            }
            AstFilter::ExprCompare { op, left, right } => Value::document([(
                "$expr",
                Value::document([(
                    op.symbol(),
                    Value::Array(vec![left.render(), right.render()]),
                )]),
            )]),
            AstFilter::Exists { field, exists } => Value::document([(
                field.clone(),
                Value::document([("$exists", Value::Boolean(*exists))]),
            )]),
            AstFilter::ElemMatch { field, filter } => Value::document([(
                field.clone(),
                Value::document([("$elemMatch", filter.render())]),
            )]),
            AstFilter::In { field, values } => Value::document([(
                field.clone(),
                Value::document([("$in", Value::Array(values.clone()))]),
            )]),
            AstFilter::All { field, values } => Value::document([(
                field.clone(),
                Value::document([("$all", Value::Array(values.clone()))]),
            )]),
            AstFilter::Regex {
                field,
                pattern,
                options,
            } => Value::document([(
                field.clone(),
                Value::document([
                    ("$regex", Value::String(pattern.clone())),
                    ("$options", Value::String(options.clone())),
                ]),
            )]),
            AstFilter::BitsAllSet { field, mask } => Value::document([(
                field.clone(),
                Value::document([("$bitsAllSet", Value::Int64(*mask))]),
            )]),
        }
    }
}
