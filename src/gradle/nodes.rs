//! Gradle-specific node kinds. Each is tagged with the core category it
//! behaves like, so generic visitors still see a sensible shape.
use std::any::Any;
use std::rc::Rc;

use crate::ast::{Block, Node, NodeMetadata, NodeRef, NodeType, Reference, TypeNode};
use crate::types::Type;

macro_rules! impl_node {
    ($ty:ident, |$this:ident| $children:expr) => {
        impl Node for $ty {
            fn metadata(&self) -> &NodeMetadata {
                &self.metadata
            }
            fn children(&self) -> Vec<NodeRef> {
                let $this = self;
                $children
            }
            fn kind_name(&self) -> &'static str {
                stringify!($ty)
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

/// Root of a build script: imports, then top-level statements without braces.
#[derive(Debug, Clone)]
pub struct GradleScript {
    pub metadata: NodeMetadata,
    pub imports: Vec<String>,
    pub statements: Vec<NodeRef>,
}

impl GradleScript {
    pub fn new(statements: Vec<NodeRef>) -> Self {
        Self { metadata: NodeMetadata::new(NodeType::Block), imports: Vec::new(), statements }
    }

    pub fn with_imports(mut self, imports: impl IntoIterator<Item = String>) -> Self {
        self.imports = imports.into_iter().collect();
        self
    }
}

impl_node!(GradleScript, |this| this.statements.clone());

/// `group = "test"`
#[derive(Debug, Clone)]
pub struct PropertyAssignment {
    pub metadata: NodeMetadata,
    pub target: Rc<Reference>,
    pub value: NodeRef,
}

impl PropertyAssignment {
    pub fn new(target: Reference, value: NodeRef) -> Self {
        Self { metadata: NodeMetadata::new(NodeType::Statement), target: Rc::new(target), value }
    }
}

impl_node!(PropertyAssignment, |this| vec![this.target.clone() as NodeRef, this.value.clone()]);

/// `name { ... }`
#[derive(Debug, Clone)]
pub struct ScriptBlock {
    pub metadata: NodeMetadata,
    pub name: String,
    pub body: Rc<Block>,
}

impl ScriptBlock {
    pub fn new(name: impl Into<String>, body: Block) -> Self {
        Self { metadata: NodeMetadata::new(NodeType::Statement), name: name.into(), body: Rc::new(body) }
    }
}

impl_node!(ScriptBlock, |this| vec![this.body.clone() as NodeRef]);

/// `receiver.name<T>(args) { trailing }`. Every part but the name is optional.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub metadata: NodeMetadata,
    pub receiver: Option<NodeRef>,
    pub name: String,
    pub type_arguments: Vec<Rc<TypeNode>>,
    pub arguments: Vec<NodeRef>,
    pub trailing_block: Option<Rc<Block>>,
}

impl MethodCall {
    pub fn new(name: impl Into<String>, arguments: Vec<NodeRef>) -> Self {
        Self {
            metadata: NodeMetadata::new(NodeType::Expression),
            receiver: None,
            name: name.into(),
            type_arguments: Vec::new(),
            arguments,
            trailing_block: None,
        }
    }

    pub fn on(mut self, receiver: NodeRef) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn with_type_argument(mut self, ty: Type) -> Self {
        self.type_arguments.push(Rc::new(TypeNode::new(ty)));
        self
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.trailing_block = Some(Rc::new(block));
        self
    }

    pub fn type_argument_nodes(&self) -> Vec<NodeRef> {
        self.type_arguments.iter().map(|t| t.clone() as NodeRef).collect()
    }
}

impl_node!(MethodCall, |this| {
    let mut out: Vec<NodeRef> = this.receiver.iter().cloned().collect();
    out.extend(this.type_argument_nodes());
    out.extend(this.arguments.iter().cloned());
    out.extend(this.trailing_block.iter().map(|b| b.clone() as NodeRef));
    out
});

/// One entry of a `plugins { }` block.
///
/// `core` plugins are addressed by their bare name where the target allows it
/// (`` `kotlin-dsl` `` in Kotlin); the rest go through `id(...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginSpec {
    pub metadata: NodeMetadata,
    pub id: String,
    pub version: Option<String>,
    pub apply: Option<bool>,
    pub core: bool,
}

impl PluginSpec {
    pub fn id(id: impl Into<String>) -> Self {
        Self { metadata: NodeMetadata::new(NodeType::Statement), id: id.into(), version: None, apply: None, core: false }
    }

    pub fn core(name: impl Into<String>) -> Self {
        Self { core: true, ..Self::id(name) }
    }

    pub fn version(&mut self, version: impl Into<String>) -> &mut Self {
        self.version = Some(version.into());
        self
    }

    pub fn apply(&mut self, apply: bool) -> &mut Self {
        self.apply = Some(apply);
        self
    }
}

impl_node!(PluginSpec, |_this| Vec::new());

/// `components["java"]`
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentAccess {
    pub metadata: NodeMetadata,
    pub name: String,
}

impl ComponentAccess {
    pub fn new(name: impl Into<String>) -> Self {
        Self { metadata: NodeMetadata::new(NodeType::Expression), name: name.into() }
    }
}

impl_node!(ComponentAccess, |_this| Vec::new());

#[derive(Debug, Clone, PartialEq)]
pub struct MavenRepository {
    pub metadata: NodeMetadata,
    pub url: String,
}

impl MavenRepository {
    pub fn new(url: impl Into<String>) -> Self {
        Self { metadata: NodeMetadata::new(NodeType::Statement), url: url.into() }
    }
}

impl_node!(MavenRepository, |_this| Vec::new());

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{node_ref, Literal};
    use crate::visit::count_nodes;

    #[test]
    fn method_call_children_follow_render_order() {
        let call = MethodCall::new("create", vec![node_ref(Literal::string("java"))])
            .on(node_ref(Reference::new("publications")))
            .with_type_argument(Type::named("MavenPublication"))
            .with_block(Block::new(vec![node_ref(ComponentAccess::new("java"))]));
        let kinds: Vec<_> = call.children().iter().map(|c| c.kind_name()).collect();
        assert_eq!(kinds, vec!["Reference", "TypeNode", "Literal", "Block"]);
        assert_eq!(count_nodes(&call), 6);
    }

    #[test]
    fn script_children_are_its_statements() {
        let script = GradleScript::new(vec![
            node_ref(PropertyAssignment::new(Reference::new("group"), node_ref(Literal::string("test")))),
            node_ref(ScriptBlock::new("plugins", Block::new(vec![node_ref(PluginSpec::id("java"))]))),
        ]);
        assert_eq!(script.children().len(), 2);
        // script, assignment, reference, literal, block statement, block, plugin
        assert_eq!(count_nodes(&script), 7);
    }

    #[test]
    fn scripts_reach_the_block_like_hook() {
        use crate::visit::NodeVisitor;

        #[derive(Default)]
        struct Hooks(Vec<&'static str>);
        impl NodeVisitor for Hooks {
            type Output = ();
            fn visit_block_like(&mut self, node: &dyn Node) {
                self.0.push("block-like");
                self.visit_children(node);
            }
            fn visit_literal(&mut self, _: &Literal) {
                self.0.push("literal");
            }
            fn visit_default(&mut self, _: &dyn Node) {
                self.0.push("default");
            }
        }

        let script = GradleScript::new(vec![node_ref(Literal::integer(1))]);
        let mut hooks = Hooks::default();
        (&script as &dyn Node).accept(&mut hooks);
        assert_eq!(hooks.0, vec!["block-like", "literal"]);
    }

    #[test]
    fn plugin_spec_is_fluent() {
        let mut spec = PluginSpec::id("com.gradle.plugin-publish");
        spec.version("1.3.1").apply(false);
        assert_eq!(spec.version.as_deref(), Some("1.3.1"));
        assert_eq!(spec.apply, Some(false));
        assert!(PluginSpec::core("kotlin-dsl").core);
    }
}
