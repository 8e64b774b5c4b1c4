//! Nominal type model with generics and nullability.
//!
//! Assignability is answered per type kind, never inferred:
//! - simple types are nominal; equality and hashing go by qualified name only;
//! - generic types need equal bases and are covariant in every argument;
//! - `T?` accepts `T` and `T?`, while `T` never accepts `T?`.
//!
//! The top type (`kotlin.Any`) accepts every non-nullable type.
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

pub const ANY: &str = "kotlin.Any";
pub const NOTHING: &str = "kotlin.Nothing";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Simple(SimpleType),
    Generic(GenericType),
    Nullable(Box<Type>),
}

#[derive(Debug, Clone)]
pub struct SimpleType {
    pub name: String,
    pub qualified_name: String,
    pub type_parameters: Vec<TypeParameter>,
}

impl PartialEq for SimpleType {
    fn eq(&self, other: &Self) -> bool {
        self.qualified_name == other.qualified_name
    }
}

impl Eq for SimpleType {}

impl Hash for SimpleType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualified_name.hash(state)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericType {
    pub base: Box<Type>,
    pub arguments: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameter {
    pub name: String,
    pub constraints: Vec<TypeConstraint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeConstraint {
    UpperBound(Type),
    LowerBound(Type),
}

impl Type {
    pub fn simple(name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        Type::Simple(SimpleType {
            name: name.into(),
            qualified_name: qualified_name.into(),
            type_parameters: Vec::new(),
        })
    }

    /// Simple type whose qualified name equals its simple name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Type::simple(name.clone(), name)
    }

    pub fn generic(base: Type, arguments: Vec<Type>) -> Self {
        Type::Generic(GenericType { base: Box::new(base), arguments })
    }

    /// Wraps in `Nullable` unless already nullable.
    pub fn nullable(self) -> Self {
        match self {
            Type::Nullable(_) => self,
            other => Type::Nullable(Box::new(other)),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Type::Nullable(_))
    }

    /// Strips one level of nullability.
    pub fn non_null(&self) -> &Type {
        match self {
            Type::Nullable(inner) => inner,
            other => other,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Type::Simple(s) => s.name.clone(),
            Type::Generic(g) => {
                let args = g.arguments.iter().map(Type::name).collect::<Vec<_>>();
                format!("{}<{}>", g.base.name(), args.join(", "))
            }
            Type::Nullable(inner) => format!("{}?", inner.name()),
        }
    }

    pub fn qualified_name(&self) -> String {
        match self {
            Type::Simple(s) => s.qualified_name.clone(),
            Type::Generic(g) => {
                let args = g.arguments.iter().map(Type::qualified_name).collect::<Vec<_>>();
                format!("{}<{}>", g.base.qualified_name(), args.join(", "))
            }
            Type::Nullable(inner) => format!("{}?", inner.qualified_name()),
        }
    }

    pub fn type_parameters(&self) -> &[TypeParameter] {
        match self {
            Type::Simple(s) => &s.type_parameters,
            Type::Generic(_) => &[],
            Type::Nullable(inner) => inner.type_parameters(),
        }
    }

    pub fn is_assignable_from(&self, other: &Type) -> bool {
        match self {
            Type::Simple(s) => match other {
                Type::Nullable(_) => false,
                _ if s.qualified_name == ANY => true,
                Type::Simple(o) => s == o,
                Type::Generic(_) => false,
            },
            Type::Generic(g) => match other {
                Type::Generic(o) => {
                    g.base == o.base
                        && g.arguments.len() == o.arguments.len()
                        && g.arguments.iter().zip(&o.arguments).all(|(a, b)| a.is_assignable_from(b))
                }
                _ => false,
            },
            Type::Nullable(inner) => inner.is_assignable_from(other.non_null()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// REGISTRY
// ————————————————————————————————————————————————————————————————————————————

/// Flat name → type registry, seeded with the built-in primitives.
#[derive(Debug, Clone)]
pub struct TypeSystem {
    types: IndexMap<String, Type>,
}

const BUILTINS: &[(&str, &str)] = &[
    ("Any", ANY),
    ("Nothing", NOTHING),
    ("Unit", "kotlin.Unit"),
    ("String", "kotlin.String"),
    ("Int", "kotlin.Int"),
    ("Boolean", "kotlin.Boolean"),
    ("Long", "kotlin.Long"),
    ("Double", "kotlin.Double"),
    ("Float", "kotlin.Float"),
];

impl Default for TypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeSystem {
    pub fn new() -> Self {
        let mut ts = Self::empty();
        for (name, qualified) in BUILTINS {
            ts.register_type(Type::simple(*name, *qualified));
        }
        ts
    }

    pub fn empty() -> Self {
        Self { types: IndexMap::new() }
    }

    /// Indexes under both simple and qualified name. Re-registering a name
    /// replaces the previous entry.
    pub fn register_type(&mut self, ty: Type) {
        let name = ty.name();
        let qualified = ty.qualified_name();
        if name != qualified {
            self.types.insert(qualified, ty.clone());
        }
        self.types.insert(name, ty);
    }

    pub fn resolve_type(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn is_subtype(&self, subtype: &Type, supertype: &Type) -> bool {
        supertype.is_assignable_from(subtype)
    }

    /// Empty → `Nothing`; one type → itself; otherwise the top type (`Any`,
    /// or `Any?` when a nullable type is among the inputs). No precise join.
    pub fn common_supertype(&self, types: &[Type]) -> Type {
        match types {
            [] => self.builtin("Nothing", NOTHING),
            [only] => only.clone(),
            many => {
                let top = self.builtin("Any", ANY);
                if many.iter().any(Type::is_nullable) { top.nullable() } else { top }
            }
        }
    }

    fn builtin(&self, name: &str, qualified: &str) -> Type {
        self.resolve_type(name)
            .cloned()
            .unwrap_or_else(|| Type::simple(name, qualified))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
