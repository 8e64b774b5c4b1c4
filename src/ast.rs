//! Node model.
//!
//! Every AST element implements [`Node`]: it carries [`NodeMetadata`] and can
//! list its structural children in render order. Trees are immutable once
//! built and shared through [`NodeRef`] handles, so a transformation that only
//! touches one branch reuses the rest of the tree as-is.
//!
//! Only the categories every target understands live here (literals,
//! references, blocks, type annotations, variable declarations, comments).
//! Domain modules add their own node kinds by implementing [`Node`] and
//! tagging them with a [`NodeType`] category.
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;

use crate::scope::Modifier;
use crate::types::Type;
use crate::visit::NodeVisitor;

// ————————————————————————————————————————————————————————————————————————————
// CONTRACT
// ————————————————————————————————————————————————————————————————————————————

pub type NodeRef = Rc<dyn Node>;

/// Structural category of a node. Drives the visitor/transformer fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Expression,
    Statement,
    Declaration,
    Block,
    Literal,
    Reference,
    Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self { file: file.into(), line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeMetadata {
    pub source_location: Option<SourceLocation>,
    pub node_type: NodeType,
    /// Free-form annotations; insertion order is kept.
    pub attributes: IndexMap<String, serde_json::Value>,
}

impl NodeMetadata {
    pub fn new(node_type: NodeType) -> Self {
        Self { source_location: None, node_type, attributes: IndexMap::new() }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.source_location = Some(location);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

pub trait Node: fmt::Debug {
    fn metadata(&self) -> &NodeMetadata;

    /// Immediate children in render order. Must include every child that can
    /// itself contain nodes, otherwise generic traversal would skip structure.
    fn children(&self) -> Vec<NodeRef>;

    /// Stable name of the concrete node kind, used in diagnostics.
    fn kind_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

impl dyn Node + '_ {
    pub fn node_type(&self) -> NodeType {
        self.metadata().node_type
    }

    pub fn downcast_ref<T: Node + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Node + 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Double dispatch entry point: hands the node to the visitor's `visit`.
    pub fn accept<V: NodeVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit(self)
    }
}

pub fn node_ref<N: Node + 'static>(node: N) -> NodeRef {
    Rc::new(node)
}

// ————————————————————————————————————————————————————————————————————————————
// LITERALS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralType {
    String,
    Number,
    Boolean,
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    String(String),
    Integer(i64),
    Float(OrderedFloat<f64>),
    Boolean(bool),
    Null,
}

impl LiteralValue {
    pub fn literal_type(&self) -> LiteralType {
        match self {
            LiteralValue::String(_) => LiteralType::String,
            LiteralValue::Integer(_) | LiteralValue::Float(_) => LiteralType::Number,
            LiteralValue::Boolean(_) => LiteralType::Boolean,
            LiteralValue::Null => LiteralType::Null,
        }
    }

    /// Unquoted source text. Whole floats keep a `.0` so they stay floats in
    /// JVM-family targets.
    pub fn plain_text(&self) -> String {
        match self {
            LiteralValue::String(s) => s.clone(),
            LiteralValue::Integer(i) => i.to_string(),
            LiteralValue::Float(f) if f.0.is_finite() && f.0.fract() == 0.0 => format!("{:.1}", f.0),
            LiteralValue::Float(f) => f.0.to_string(),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Null => "null".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub metadata: NodeMetadata,
    pub value: LiteralValue,
}

impl Literal {
    pub fn new(value: LiteralValue) -> Self {
        Self { metadata: NodeMetadata::new(NodeType::Literal), value }
    }
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(LiteralValue::String(value.into()))
    }
    pub fn integer(value: i64) -> Self {
        Self::new(LiteralValue::Integer(value))
    }
    pub fn float(value: f64) -> Self {
        Self::new(LiteralValue::Float(OrderedFloat(value)))
    }
    pub fn boolean(value: bool) -> Self {
        Self::new(LiteralValue::Boolean(value))
    }
    pub fn null() -> Self {
        Self::new(LiteralValue::Null)
    }
    pub fn literal_type(&self) -> LiteralType {
        self.value.literal_type()
    }
}

impl Node for Literal {
    fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }
    fn children(&self) -> Vec<NodeRef> {
        Vec::new()
    }
    fn kind_name(&self) -> &'static str {
        "Literal"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// REFERENCES
// ————————————————————————————————————————————————————————————————————————————

/// A name, optionally qualified by another reference: `a.b.c` is
/// `c` qualified by `b` qualified by `a`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub metadata: NodeMetadata,
    pub name: String,
    pub qualifier: Option<Rc<Reference>>,
}

impl Reference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { metadata: NodeMetadata::new(NodeType::Reference), name: name.into(), qualifier: None }
    }

    pub fn qualified(qualifier: Reference, name: impl Into<String>) -> Self {
        Self { qualifier: Some(Rc::new(qualifier)), ..Self::new(name) }
    }

    /// Builds the chain for a dotted path. `None` for an empty path or an empty segment.
    pub fn from_path(path: &str) -> Option<Self> {
        let mut segments = path.split('.');
        let first = segments.next().filter(|s| !s.is_empty())?;
        let mut out = Reference::new(first);
        for segment in segments {
            if segment.is_empty() {
                return None;
            }
            out = Reference::qualified(out, segment);
        }
        Some(out)
    }

    pub fn segments(&self) -> Vec<&str> {
        let mut out = match &self.qualifier {
            Some(q) => q.segments(),
            None => Vec::new(),
        };
        out.push(self.name.as_str());
        out
    }

    pub fn dotted_path(&self) -> String {
        self.segments().join(".")
    }
}

impl Node for Reference {
    fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }
    fn children(&self) -> Vec<NodeRef> {
        self.qualifier.iter().map(|q| q.clone() as NodeRef).collect()
    }
    fn kind_name(&self) -> &'static str {
        "Reference"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BLOCKS, TYPES, DECLARATIONS, COMMENTS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub struct Block {
    pub metadata: NodeMetadata,
    pub statements: Vec<NodeRef>,
}

impl Block {
    pub fn new(statements: Vec<NodeRef>) -> Self {
        Self { metadata: NodeMetadata::new(NodeType::Block), statements }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Same metadata, different statements.
    pub fn with_statements(&self, statements: Vec<NodeRef>) -> Self {
        Self { metadata: self.metadata.clone(), statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl Node for Block {
    fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }
    fn children(&self) -> Vec<NodeRef> {
        self.statements.clone()
    }
    fn kind_name(&self) -> &'static str {
        "Block"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A type annotation in source position (`val x: List<String>`).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub metadata: NodeMetadata,
    pub ty: Type,
}

impl TypeNode {
    pub fn new(ty: Type) -> Self {
        Self { metadata: NodeMetadata::new(NodeType::Type), ty }
    }
}

impl Node for TypeNode {
    fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }
    fn children(&self) -> Vec<NodeRef> {
        Vec::new()
    }
    fn kind_name(&self) -> &'static str {
        "TypeNode"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `val name: Type = initializer`. `Modifier::Var` marks it mutable.
#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub metadata: NodeMetadata,
    pub name: String,
    pub modifiers: BTreeSet<Modifier>,
    pub ty: Option<Rc<TypeNode>>,
    pub initializer: Option<NodeRef>,
}

impl VariableDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: NodeMetadata::new(NodeType::Declaration),
            name: name.into(),
            modifiers: BTreeSet::new(),
            ty: None,
            initializer: None,
        }
    }

    pub fn typed(mut self, ty: Type) -> Self {
        self.ty = Some(Rc::new(TypeNode::new(ty)));
        self
    }

    pub fn initialized(mut self, initializer: NodeRef) -> Self {
        self.initializer = Some(initializer);
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.insert(modifier);
        self
    }

    pub fn is_mutable(&self) -> bool {
        self.modifiers.contains(&Modifier::Var)
    }
}

impl Node for VariableDeclaration {
    fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }
    fn children(&self) -> Vec<NodeRef> {
        let mut out: Vec<NodeRef> = Vec::new();
        if let Some(ty) = &self.ty {
            out.push(ty.clone());
        }
        out.extend(self.initializer.iter().cloned());
        out
    }
    fn kind_name(&self) -> &'static str {
        "VariableDeclaration"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Line comment; dropped when generation options exclude comments.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub metadata: NodeMetadata,
    pub text: String,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { metadata: NodeMetadata::new(NodeType::Statement), text: text.into() }
    }
}

impl Node for Comment {
    fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }
    fn children(&self) -> Vec<NodeRef> {
        Vec::new()
    }
    fn kind_name(&self) -> &'static str {
        "Comment"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}
