//! Host expression trees: the input to the translation engine.
//!
//! A query predicate or projection arrives as an immutable, caller-built
//! [`Expr`] tree. The tree is *typed at construction time*: recognized
//! standard-library members are identified by the closed tables
//! [`KnownMethod`], [`KnownProperty`] and [`KnownCtor`] when the tree is
//! built, never re-derived by name matching during translation. Anything
//! outside those tables is an unsupported construct, which translation
//! reports as a first-class failure rather than approximating.
//!
//! ## Core Concepts
//!
//! - **Parameters and the current element.** A [`Expr::Lambda`] introduces a
//!   named parameter; [`Expr::Current`] (`@` in diagnostic output) refers to
//!   the implicit current element without naming one, the way a quantifier
//!   body refers to the element under test.
//! - **Construct identity.** A [`KnownMethod`] variant stands for one
//!   (declaring type, member name, arity) triple. Arity is part of the
//!   identity: a two-argument form and a three-argument form of the same
//!   member are different constructs.
//!
//! ## Examples
//!
//! The predicate `p => p.Age > 2`:
//!
//! ```
//! use mace::expr::Expr;
//!
//! let p = Expr::lambda(
//!     "p",
//!     Expr::gt(Expr::field(Expr::parameter("p"), "Age"), 2),
//! );
//! assert_eq!(p.to_string(), "p => (p.Age > 2)");
//! ```

use std::fmt;

use crate::value::Value;

/// Binary operators of the host expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Comparison
    /// Equal (`==`)
    Eq,
    /// Not equal (`!=`)
    Ne,
    /// Greater than (`>`)
    Gt,
    /// Greater than or equal (`>=`)
    Gte,
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    Lte,

    // Arithmetic
    /// Addition, or string concatenation on string operands (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Modulo (`%`)
    Modulo,

    // Logical
    /// Logical AND (`&&`)
    And,
    /// Logical OR (`||`)
    Or,

    // Null-coalescing
    /// Null-coalescing (`??`)
    Coalesce,
}

impl BinaryOp {
    /// Source-form symbol, used in diagnostics
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
        }
    }
}

/// Unary operators of the host expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation (`!`)
    Not,
    /// Arithmetic negation (`-`)
    Negate,
}

/// A recognized standard-library method, identified by declaring type,
/// member name and arity when the expression tree is built.
///
/// This is the closed construct table the dispatch registries key on. The
/// receiver counts toward arity, so `StringContains` (receiver + substring)
/// has arity 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownMethod {
    /// string.contains(substring) — arity 2
    StringContains,
    /// string.starts_with(prefix) — arity 2
    StringStartsWith,
    /// string.ends_with(suffix) — arity 2
    StringEndsWith,
    /// string.is_null_or_empty() — arity 1
    StringIsNullOrEmpty,
    /// string.to_upper() — arity 1
    StringToUpper,
    /// string.to_lower() — arity 1
    StringToLower,
    /// regex.is_match(input, pattern[, options]) — arity 2 or 3; the
    /// pattern may also arrive as a single regex constant carrying its
    /// own option flags
    RegexIsMatch,
    /// sequence.contains(element) — arity 2
    SequenceContains,
    /// sequence.contains_all(elements) — arity 2
    SequenceContainsAll,
    /// sequence.any(predicate) — arity 2
    SequenceAny,
    /// sequence.all(predicate) — arity 2
    SequenceAll,
    /// sequence.count() — arity 1
    SequenceCount,
    /// sequence.sum() — arity 1
    SequenceSum,
    /// sequence.min() — arity 1
    SequenceMin,
    /// sequence.max() — arity 1
    SequenceMax,
    /// sequence.avg() — arity 1
    SequenceAvg,
    /// flags.has_flag(flag) — arity 2
    HasFlag,
}

impl KnownMethod {
    /// Member name, used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            KnownMethod::StringContains => "contains",
            KnownMethod::StringStartsWith => "starts_with",
            KnownMethod::StringEndsWith => "ends_with",
            KnownMethod::StringIsNullOrEmpty => "is_null_or_empty",
            KnownMethod::StringToUpper => "to_upper",
            KnownMethod::StringToLower => "to_lower",
            KnownMethod::RegexIsMatch => "is_match",
            KnownMethod::SequenceContains => "contains",
            KnownMethod::SequenceContainsAll => "contains_all",
            KnownMethod::SequenceAny => "any",
            KnownMethod::SequenceAll => "all",
            KnownMethod::SequenceCount => "count",
            KnownMethod::SequenceSum => "sum",
            KnownMethod::SequenceMin => "min",
            KnownMethod::SequenceMax => "max",
            KnownMethod::SequenceAvg => "avg",
            KnownMethod::HasFlag => "has_flag",
        }
    }
}

/// A recognized standard-library property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownProperty {
    /// Code-point length of a string
    StringLength,
    /// Element count of an array field
    ArrayLength,
    /// Year component of a point in time
    DateTimeYear,
    /// Month component of a point in time
    DateTimeMonth,
    /// Day-of-month component of a point in time
    DateTimeDay,
}

impl KnownProperty {
    /// Member name, used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            KnownProperty::StringLength => "Length",
            KnownProperty::ArrayLength => "Count",
            KnownProperty::DateTimeYear => "Year",
            KnownProperty::DateTimeMonth => "Month",
            KnownProperty::DateTimeDay => "Day",
        }
    }
}

/// A recognized constructor shape for compound values.
///
/// Arity is fixed by the variant; translation never counts arguments to
/// decide which shape it is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownCtor {
    /// Point in time from (year, month, day)
    DateFromYmd,
    /// Point in time from (year, month, day, hour, minute, second)
    DateFromYmdHms,
    /// Point in time from (year, month, day, hour, minute, second, millisecond)
    DateFromYmdHmsMillis,
}

impl KnownCtor {
    /// Number of constructor arguments
    pub fn arity(&self) -> usize {
        match self {
            KnownCtor::DateFromYmd => 3,
            KnownCtor::DateFromYmdHms => 6,
            KnownCtor::DateFromYmdHmsMillis => 7,
        }
    }
}

/// A node in the host's typed expression representation.
///
/// The tree is owned by the caller and never mutated by the translation
/// engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal constant, already in wire form
    Constant(Value),

    /// Named lambda parameter reference
    Parameter(String),

    /// The implicit current element (`@`)
    ///
    /// Refers to the element a quantifier or projection body is evaluated
    /// against without naming a parameter.
    Current,

    /// Document field access
    ///
    /// # Examples
    /// ```text
    /// p.Age
    /// c.Items
    /// ```
    Field { object: Box<Expr>, name: String },

    /// Recognized standard-library property access
    ///
    /// # Examples
    /// ```text
    /// s.Name.Length
    /// ```
    Property {
        object: Box<Expr>,
        property: KnownProperty,
    },

    /// Recognized standard-library method call
    ///
    /// `object` is the receiver, or the first operand of a static-shaped
    /// member (the regex input, the string tested by `is_null_or_empty`).
    Call {
        method: KnownMethod,
        object: Box<Expr>,
        args: Vec<Expr>,
    },

    /// Binary operation (arithmetic, comparison, logical)
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Lambda abstraction introducing one parameter
    Lambda { parameter: String, body: Box<Expr> },

    /// Recognized constructor for a compound value
    New { ctor: KnownCtor, args: Vec<Expr> },

    /// Conditional (`condition ? then : else`)
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Expr {
        Expr::Constant(value.into())
    }

    pub fn parameter(name: impl Into<String>) -> Expr {
        Expr::Parameter(name.into())
    }

    pub fn current() -> Expr {
        Expr::Current
    }

    pub fn field(object: impl Into<Expr>, name: impl Into<String>) -> Expr {
        Expr::Field {
            object: Box::new(object.into()),
            name: name.into(),
        }
    }

    pub fn property(object: impl Into<Expr>, property: KnownProperty) -> Expr {
        Expr::Property {
            object: Box::new(object.into()),
            property,
        }
    }

    pub fn call(method: KnownMethod, object: impl Into<Expr>, args: Vec<Expr>) -> Expr {
        Expr::Call {
            method,
            object: Box::new(object.into()),
            args,
        }
    }

    pub fn binary(op: BinaryOp, left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left.into()),
            right: Box::new(right.into()),
        }
    }

    pub fn unary(op: UnaryOp, operand: impl Into<Expr>) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand.into()),
        }
    }

    pub fn lambda(parameter: impl Into<String>, body: impl Into<Expr>) -> Expr {
        Expr::Lambda {
            parameter: parameter.into(),
            body: Box::new(body.into()),
        }
    }

    pub fn construct(ctor: KnownCtor, args: Vec<Expr>) -> Expr {
        Expr::New { ctor, args }
    }

    pub fn conditional(
        condition: impl Into<Expr>,
        then_branch: impl Into<Expr>,
        else_branch: impl Into<Expr>,
    ) -> Expr {
        Expr::Conditional {
            condition: Box::new(condition.into()),
            then_branch: Box::new(then_branch.into()),
            else_branch: Box::new(else_branch.into()),
        }
    }

    // Operator shorthands

    pub fn eq(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Eq, left, right)
    }

    pub fn ne(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Ne, left, right)
    }

    pub fn gt(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Gt, left, right)
    }

    pub fn gte(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Gte, left, right)
    }

    pub fn lt(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Lt, left, right)
    }

    pub fn lte(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Lte, left, right)
    }

    pub fn and(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::And, left, right)
    }

    pub fn or(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Or, left, right)
    }

    pub fn not(operand: impl Into<Expr>) -> Expr {
        Expr::unary(UnaryOp::Not, operand)
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Constant(v)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Constant(Value::Boolean(b))
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::Constant(Value::Int32(n))
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::Constant(Value::Int64(n))
    }
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::Constant(Value::Double(n))
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Constant(Value::String(s.to_string()))
    }
}

impl fmt::Display for Expr {
    /// Pseudo-source rendering, used by translation errors to point at the
    /// offending construct.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(v) => write!(f, "{}", crate::output::to_json(v)),
            Expr::Parameter(name) => write!(f, "{}", name),
            Expr::Current => write!(f, "@"),
            Expr::Field { object, name } => write!(f, "{}.{}", object, name),
            Expr::Property { object, property } => {
                write!(f, "{}.{}", object, property.name())
            }
            Expr::Call {
                method,
                object,
                args,
            } => {
                write!(f, "{}.{}(", object, method.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!({})", operand),
                UnaryOp::Negate => write!(f, "-({})", operand),
            },
            Expr::Lambda { parameter, body } => write!(f, "{} => {}", parameter, body),
            Expr::New { ctor: _, args } => {
                write!(f, "date(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "({} ? {} : {})", condition, then_branch, else_branch),
        }
    }
}
