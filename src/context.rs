use std::sync::Arc;

use crate::serializer::{Serializer, SerializerRegistry};

/// Binds one lambda parameter to a field path and a serializer.
///
/// A symbol is created once per parameter introduction and never mutated.
/// The field path addresses the location in the queried document that the
/// parameter stands for; the root parameter of a predicate has the empty
/// path (the document itself).
#[derive(Debug, Clone)]
pub struct Symbol {
    parameter: String,
    path: String,
    serializer: Arc<dyn Serializer>,
}

impl Symbol {
    pub fn new(
        parameter: impl Into<String>,
        path: impl Into<String>,
        serializer: Arc<dyn Serializer>,
    ) -> Self {
        Symbol {
            parameter: parameter.into(),
            path: path.into(),
            serializer,
        }
    }

    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn serializer(&self) -> &Arc<dyn Serializer> {
        &self.serializer
    }

    /// Dotted path of a member under this symbol's path
    pub fn member_path(&self, element_name: &str) -> String {
        if self.path.is_empty() {
            element_name.to_string()
        } else {
            format!("{}.{}", self.path, element_name)
        }
    }
}

/// An immutable, persistent chain of symbol bindings.
///
/// Every `with_*` operation returns a *new* table sharing the tail of the
/// old one; the old table stays valid and unchanged, so a context handed to
/// one branch of translation cannot be corrupted by a sibling branch.
/// Lookup walks from the most recent binding outward, which is what makes
/// an inner binding shadow an outer one of the same name.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    head: Option<Arc<Node>>,
    current: Option<Arc<Symbol>>,
}

#[derive(Debug)]
struct Node {
    symbol: Arc<Symbol>,
    next: Option<Arc<Node>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// New table with `symbol` appended as the innermost binding
    pub fn with(&self, symbol: Symbol) -> SymbolTable {
        SymbolTable {
            head: Some(Arc::new(Node {
                symbol: Arc::new(symbol),
                next: self.head.clone(),
            })),
            current: self.current.clone(),
        }
    }

    /// New table with `symbol` appended and marked as the implicit current
    /// element
    pub fn with_current(&self, symbol: Symbol) -> SymbolTable {
        let symbol = Arc::new(symbol);
        SymbolTable {
            head: Some(Arc::new(Node {
                symbol: symbol.clone(),
                next: self.head.clone(),
            })),
            current: Some(symbol),
        }
    }

    /// New table with several bindings appended atomically.
    ///
    /// Relative order is preserved: a later binding shadows an earlier one
    /// of the same name.
    pub fn with_all(&self, symbols: impl IntoIterator<Item = Symbol>) -> SymbolTable {
        let mut table = self.clone();
        for symbol in symbols {
            table = table.with(symbol);
        }
        table
    }

    /// Innermost binding for a parameter name, if any
    pub fn resolve(&self, parameter: &str) -> Option<&Symbol> {
        let mut node = self.head.as_deref();
        while let Some(n) = node {
            if n.symbol.parameter == parameter {
                return Some(&n.symbol);
            }
            node = n.next.as_deref();
        }
        None
    }

    /// The implicit current-element binding, if any
    pub fn current(&self) -> Option<&Symbol> {
        self.current.as_deref()
    }
}

/// Carries the symbol scope and the serializer registry through one
/// translation pass.
///
/// All mutator-shaped operations return a new context and leave the
/// original usable; sibling sub-expressions of a logical connective must
/// translate against the same starting scope, not an accumulated one.
#[derive(Debug, Clone)]
pub struct TranslationContext {
    symbols: SymbolTable,
    serializers: Arc<SerializerRegistry>,
}

impl TranslationContext {
    pub fn new(serializers: Arc<SerializerRegistry>) -> Self {
        TranslationContext {
            symbols: SymbolTable::new(),
            serializers,
        }
    }

    pub fn with_symbol(&self, symbol: Symbol) -> Self {
        TranslationContext {
            symbols: self.symbols.with(symbol),
            serializers: self.serializers.clone(),
        }
    }

    pub fn with_current_symbol(&self, symbol: Symbol) -> Self {
        TranslationContext {
            symbols: self.symbols.with_current(symbol),
            serializers: self.serializers.clone(),
        }
    }

    pub fn with_symbols(&self, symbols: impl IntoIterator<Item = Symbol>) -> Self {
        TranslationContext {
            symbols: self.symbols.with_all(symbols),
            serializers: self.serializers.clone(),
        }
    }

    pub fn resolve(&self, parameter: &str) -> Option<&Symbol> {
        self.symbols.resolve(parameter)
    }

    /// Resolve a parameter that must be in scope.
    ///
    /// An unbound parameter here is a translator bug, not a user input
    /// problem: every dispatch path binds its parameters before descending
    /// into a body. Fail fast.
    pub fn symbol(&self, parameter: &str) -> &Symbol {
        match self.symbols.resolve(parameter) {
            Some(symbol) => symbol,
            None => panic!(
                "unbound parameter '{}': referenced outside its scope (translator dispatch bug)",
                parameter
            ),
        }
    }

    /// The implicit current-element symbol. Same failure class as
    /// [`TranslationContext::symbol`].
    pub fn current_symbol(&self) -> &Symbol {
        match self.symbols.current() {
            Some(symbol) => symbol,
            None => panic!("no current element in scope (translator dispatch bug)"),
        }
    }

    pub fn serializers(&self) -> &SerializerRegistry {
        &self.serializers
    }
}
