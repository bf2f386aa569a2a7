/// Comparison operators shared by filters and value expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// Equal (`$eq`)
    Eq,
    /// Not equal (`$ne`)
    Ne,
    /// Greater than (`$gt`)
    Gt,
    /// Greater than or equal (`$gte`)
    Gte,
    /// Less than (`$lt`)
    Lt,
    /// Less than or equal (`$lte`)
    Lte,
}

impl ComparisonOp {
    /// Wire symbol of the operator
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "$eq",
            ComparisonOp::Ne => "$ne",
            ComparisonOp::Gt => "$gt",
            ComparisonOp::Gte => "$gte",
            ComparisonOp::Lt => "$lt",
            ComparisonOp::Lte => "$lte",
        }
    }

    /// The operator with its operands swapped (`a < b` ⇔ `b > a`).
    ///
    /// Used when a comparison arrives literal-first so the rendered filter
    /// can still lead with the field.
    pub fn mirrored(&self) -> ComparisonOp {
        match self {
            ComparisonOp::Eq => ComparisonOp::Eq,
            ComparisonOp::Ne => ComparisonOp::Ne,
            ComparisonOp::Gt => ComparisonOp::Lt,
            ComparisonOp::Gte => ComparisonOp::Lte,
            ComparisonOp::Lt => ComparisonOp::Gt,
            ComparisonOp::Lte => ComparisonOp::Gte,
        }
    }
}

/// Single-argument value-expression operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstUnaryOp {
    /// Logical negation (`$not`)
    Not,
    /// Code-point length of a string (`$strLenCP`)
    StrLenCp,
    /// Uppercase a string (`$toUpper`)
    ToUpper,
    /// Lowercase a string (`$toLower`)
    ToLower,
    /// Element count of an array (`$size`)
    Size,
    /// Sum of an array (`$sum`)
    Sum,
    /// Minimum of an array (`$min`)
    Min,
    /// Maximum of an array (`$max`)
    Max,
    /// Average of an array (`$avg`)
    Avg,
    /// Year component (`$year`)
    Year,
    /// Month component (`$month`)
    Month,
    /// Day-of-month component (`$dayOfMonth`)
    DayOfMonth,
}

impl AstUnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AstUnaryOp::Not => "$not",
            AstUnaryOp::StrLenCp => "$strLenCP",
            AstUnaryOp::ToUpper => "$toUpper",
            AstUnaryOp::ToLower => "$toLower",
            AstUnaryOp::Size => "$size",
            AstUnaryOp::Sum => "$sum",
            AstUnaryOp::Min => "$min",
            AstUnaryOp::Max => "$max",
            AstUnaryOp::Avg => "$avg",
            AstUnaryOp::Year => "$year",
            AstUnaryOp::Month => "$month",
            AstUnaryOp::DayOfMonth => "$dayOfMonth",
        }
    }
}

/// Multi-argument value-expression operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstNaryOp {
    /// Numeric addition (`$add`)
    Add,
    /// Subtraction (`$subtract`)
    Subtract,
    /// Multiplication (`$multiply`)
    Multiply,
    /// Division (`$divide`)
    Divide,
    /// Modulo (`$mod`)
    Mod,
    /// String concatenation (`$concat`)
    Concat,
    /// Logical AND (`$and`)
    And,
    /// Logical OR (`$or`)
    Or,
    /// Null-coalescing (`$ifNull`)
    IfNull,
    /// Equal (`$eq`)
    Eq,
    /// Not equal (`$ne`)
    Ne,
    /// Greater than (`$gt`)
    Gt,
    /// Greater than or equal (`$gte`)
    Gte,
    /// Less than (`$lt`)
    Lt,
    /// Less than or equal (`$lte`)
    Lte,
    /// Code-point index of a substring (`$indexOfCP`)
    IndexOfCp,
    /// Construct a point in time from components (`$dateFromParts`)
    ///
    /// Renders its fixed-arity positional arguments into the named
    /// component document the server expects.
    DateFromParts,
}

impl AstNaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AstNaryOp::Add => "$add",
            AstNaryOp::Subtract => "$subtract",
            AstNaryOp::Multiply => "$multiply",
            AstNaryOp::Divide => "$divide",
            AstNaryOp::Mod => "$mod",
            AstNaryOp::Concat => "$concat",
            AstNaryOp::And => "$and",
            AstNaryOp::Or => "$or",
            AstNaryOp::IfNull => "$ifNull",
            AstNaryOp::Eq => "$eq",
            AstNaryOp::Ne => "$ne",
            AstNaryOp::Gt => "$gt",
            AstNaryOp::Gte => "$gte",
            AstNaryOp::Lt => "$lt",
            AstNaryOp::Lte => "$lte",
            AstNaryOp::IndexOfCp => "$indexOfCP",
            AstNaryOp::DateFromParts => "$dateFromParts",
        }
    }
}
