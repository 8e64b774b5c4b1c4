//! Lexical scopes and their symbols.
//!
//! A child holds a shared handle to its parent; parents never see their
//! children. Redefining a name inside one scope is an error, redefining it in
//! a child scope shadows the ancestor's entry.
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Function,
    Class,
    Interface,
    Property,
    Parameter,
}

/// Declared in canonical rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Public,
    Private,
    Protected,
    Internal,
    Abstract,
    Final,
    Open,
    Sealed,
    Var,
    Val,
    Const,
    Inline,
    Suspend,
    Operator,
}

impl Modifier {
    pub fn keyword(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Private => "private",
            Modifier::Protected => "protected",
            Modifier::Internal => "internal",
            Modifier::Abstract => "abstract",
            Modifier::Final => "final",
            Modifier::Open => "open",
            Modifier::Sealed => "sealed",
            Modifier::Var => "var",
            Modifier::Val => "val",
            Modifier::Const => "const",
            Modifier::Inline => "inline",
            Modifier::Suspend => "suspend",
            Modifier::Operator => "operator",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub kind: SymbolKind,
    pub modifiers: BTreeSet<Modifier>,
    pub value: Option<serde_json::Value>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, ty: Type, kind: SymbolKind) -> Self {
        Self { name: name.into(), ty, kind, modifiers: BTreeSet::new(), value: None }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.insert(modifier);
        self
    }

    pub fn with_value(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Debug)]
pub struct Scope {
    name: String,
    parent: Option<Rc<Scope>>,
    symbols: RefCell<IndexMap<String, Symbol>>,
}

impl Scope {
    pub fn root(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self { name: name.into(), parent: None, symbols: RefCell::new(IndexMap::new()) })
    }

    pub fn create_child(self: &Rc<Self>, name: impl Into<String>) -> Rc<Self> {
        let child = Self {
            name: name.into(),
            parent: Some(Rc::clone(self)),
            symbols: RefCell::new(IndexMap::new()),
        };
        tracing::trace!(parent = %self.name, child = %child.name, "scope created");
        Rc::new(child)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    /// Fails when `name` is already bound in this very scope; ancestors are not consulted.
    pub fn define(&self, name: impl Into<String>, symbol: Symbol) -> Result<()> {
        let name = name.into();
        let mut symbols = self.symbols.borrow_mut();
        if symbols.contains_key(&name) {
            return Err(Error::DuplicateSymbol { name, scope: self.name.clone() });
        }
        tracing::trace!(scope = %self.name, symbol = %name, kind = ?symbol.kind, "symbol defined");
        symbols.insert(name, symbol);
        Ok(())
    }

    /// Local symbols first, then ancestors.
    pub fn resolve(&self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.symbols.borrow().get(name) {
            return Some(symbol.clone());
        }
        self.parent.as_ref().and_then(|p| p.resolve(name))
    }

    pub fn resolve_local(&self, name: &str) -> Option<Symbol> {
        self.symbols.borrow().get(name).cloned()
    }

    /// Local symbol names in definition order.
    pub fn local_names(&self) -> Vec<String> {
        self.symbols.borrow().keys().cloned().collect()
    }

    /// Root-first dotted path of scope names, e.g. `build.publishing`.
    pub fn path(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent.path(), self.name),
            None => self.name.clone(),
        }
    }
}
