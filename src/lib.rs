pub mod ast;
pub mod context;
pub mod expr;
pub mod finalizer;
pub mod output;
pub mod serializer;
pub mod translator;
pub mod value;

pub use ast::{AggExpression, AstExpr, AstFilter, AstNaryOp, AstUnaryOp, ComparisonOp};
pub use context::{Symbol, SymbolTable, TranslationContext};
pub use expr::{BinaryOp, Expr, KnownCtor, KnownMethod, KnownProperty, UnaryOp};
pub use finalizer::{CancellationToken, Cursor, CursorError, FinalizeError, VecCursor};
pub use output::{to_json, to_json_pretty};
pub use serializer::{Serializer, SerializerError, SerializerRegistry};
pub use translator::{
    TranslationError, translate_filter, translate_predicate, translate_projection,
    translate_value,
};
pub use value::{Value, ValueKind};
