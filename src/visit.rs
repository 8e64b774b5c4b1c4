//! Visitor/transformer framework over the node model.
//!
//! Dispatch happens at category granularity: the three concrete core kinds
//! (literal, reference, block) get their own hook, every other node falls
//! back to the hook of its [`NodeType`] tag. Domain nodes tagged like a core
//! kind get a `*_like` hook taking the untyped node. A domain node therefore
//! lands in the nearest category handler without the core knowing it exists;
//! code that needs a finer split downcasts explicitly before delegating.
use std::rc::Rc;

use crate::ast::{Block, Literal, Node, NodeRef, NodeType, Reference};

/// Result of classifying a node for dispatch.
#[derive(Debug, Clone, Copy)]
pub enum Category<'a> {
    Literal(&'a Literal),
    Reference(&'a Reference),
    Block(&'a Block),
    Expression(&'a dyn Node),
    Statement(&'a dyn Node),
    Declaration(&'a dyn Node),
    Type(&'a dyn Node),
    /// Tagged `Literal` but not the core literal type.
    LiteralLike(&'a dyn Node),
    /// Tagged `Reference` but not the core reference type.
    ReferenceLike(&'a dyn Node),
    /// Tagged `Block` but not the core block type.
    BlockLike(&'a dyn Node),
}

pub fn categorize(node: &dyn Node) -> Category<'_> {
    if let Some(literal) = node.downcast_ref::<Literal>() {
        return Category::Literal(literal);
    }
    if let Some(reference) = node.downcast_ref::<Reference>() {
        return Category::Reference(reference);
    }
    if let Some(block) = node.downcast_ref::<Block>() {
        return Category::Block(block);
    }
    match node.node_type() {
        NodeType::Expression => Category::Expression(node),
        NodeType::Literal => Category::LiteralLike(node),
        NodeType::Reference => Category::ReferenceLike(node),
        NodeType::Statement => Category::Statement(node),
        NodeType::Declaration => Category::Declaration(node),
        NodeType::Type => Category::Type(node),
        NodeType::Block => Category::BlockLike(node),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VISITOR
// ————————————————————————————————————————————————————————————————————————————

pub trait NodeVisitor {
    type Output;

    fn visit(&mut self, node: &dyn Node) -> Self::Output {
        match categorize(node) {
            Category::Literal(n) => self.visit_literal(n),
            Category::Reference(n) => self.visit_reference(n),
            Category::Block(n) => self.visit_block(n),
            Category::Expression(n) => self.visit_expression(n),
            Category::Statement(n) => self.visit_statement(n),
            Category::Declaration(n) => self.visit_declaration(n),
            Category::Type(n) => self.visit_type(n),
            Category::LiteralLike(n) => self.visit_literal_like(n),
            Category::ReferenceLike(n) => self.visit_reference_like(n),
            Category::BlockLike(n) => self.visit_block_like(n),
        }
    }

    fn visit_children(&mut self, node: &dyn Node) -> Vec<Self::Output> {
        node.children().iter().map(|child| child.accept(self)).collect()
    }

    fn visit_literal(&mut self, node: &Literal) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_reference(&mut self, node: &Reference) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_block(&mut self, node: &Block) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_expression(&mut self, node: &dyn Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_statement(&mut self, node: &dyn Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_declaration(&mut self, node: &dyn Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_type(&mut self, node: &dyn Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_literal_like(&mut self, node: &dyn Node) -> Self::Output {
        self.visit_expression(node)
    }
    fn visit_reference_like(&mut self, node: &dyn Node) -> Self::Output {
        self.visit_expression(node)
    }
    fn visit_block_like(&mut self, node: &dyn Node) -> Self::Output {
        self.visit_default(node)
    }

    fn visit_default(&mut self, node: &dyn Node) -> Self::Output;
}

// ————————————————————————————————————————————————————————————————————————————
// TRANSFORMER
// ————————————————————————————————————————————————————————————————————————————

/// Rewrites a tree into a new one. Hooks receive the shared handle next to
/// the typed view so the identity case can hand back the original subtree.
pub trait NodeTransformer {
    fn transform(&mut self, node: &NodeRef) -> NodeRef {
        match categorize(node.as_ref()) {
            Category::Literal(n) => self.transform_literal(node, n),
            Category::Reference(n) => self.transform_reference(node, n),
            Category::Block(n) => self.transform_block(node, n),
            Category::Expression(_) => self.transform_expression(node),
            Category::Statement(_) => self.transform_statement(node),
            Category::Declaration(_) => self.transform_declaration(node),
            Category::Type(_) => self.transform_type(node),
            Category::LiteralLike(_) => self.transform_literal_like(node),
            Category::ReferenceLike(_) => self.transform_reference_like(node),
            Category::BlockLike(_) => self.transform_block_like(node),
        }
    }

    fn transform_literal(&mut self, node: &NodeRef, _literal: &Literal) -> NodeRef {
        self.transform_default(node)
    }
    fn transform_reference(&mut self, node: &NodeRef, _reference: &Reference) -> NodeRef {
        self.transform_default(node)
    }
    fn transform_block(&mut self, node: &NodeRef, _block: &Block) -> NodeRef {
        self.transform_default(node)
    }
    fn transform_expression(&mut self, node: &NodeRef) -> NodeRef {
        self.transform_default(node)
    }
    fn transform_statement(&mut self, node: &NodeRef) -> NodeRef {
        self.transform_default(node)
    }
    fn transform_declaration(&mut self, node: &NodeRef) -> NodeRef {
        self.transform_default(node)
    }
    fn transform_type(&mut self, node: &NodeRef) -> NodeRef {
        self.transform_default(node)
    }
    fn transform_literal_like(&mut self, node: &NodeRef) -> NodeRef {
        self.transform_expression(node)
    }
    fn transform_reference_like(&mut self, node: &NodeRef) -> NodeRef {
        self.transform_expression(node)
    }
    fn transform_block_like(&mut self, node: &NodeRef) -> NodeRef {
        self.transform_default(node)
    }

    fn transform_default(&mut self, node: &NodeRef) -> NodeRef {
        Rc::clone(node)
    }
}

/// Rebuilds `block` with every statement passed through `transformer`.
/// Returns a new block even when nothing changed; metadata is kept.
pub fn transform_statements<T: NodeTransformer + ?Sized>(transformer: &mut T, block: &Block) -> Block {
    let statements = block.statements.iter().map(|s| transformer.transform(s)).collect();
    block.with_statements(statements)
}

// ————————————————————————————————————————————————————————————————————————————
// TRAVERSAL
// ————————————————————————————————————————————————————————————————————————————

/// Pre-order walk; `f` receives each node with its depth (root = 0).
pub fn walk(node: &dyn Node, f: &mut impl FnMut(&dyn Node, usize)) {
    fn go(node: &dyn Node, depth: usize, f: &mut impl FnMut(&dyn Node, usize)) {
        f(node, depth);
        for child in node.children() {
            go(child.as_ref(), depth + 1, f);
        }
    }
    go(node, 0, f)
}

pub fn count_nodes(node: &dyn Node) -> usize {
    let mut count = 0;
    walk(node, &mut |_, _| count += 1);
    count
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::ast::{node_ref, Comment, NodeMetadata, TypeNode};
    use crate::types::Type;

    /// A node kind the core has never heard of.
    #[derive(Debug)]
    struct Assign {
        metadata: NodeMetadata,
        value: NodeRef,
    }

    impl Assign {
        fn new(value: NodeRef) -> Self {
            Self::tagged(NodeType::Statement, value)
        }

        fn tagged(node_type: NodeType, value: NodeRef) -> Self {
            Self { metadata: NodeMetadata::new(node_type), value }
        }
    }

    impl Node for Assign {
        fn metadata(&self) -> &NodeMetadata {
            &self.metadata
        }
        fn children(&self) -> Vec<NodeRef> {
            vec![self.value.clone()]
        }
        fn kind_name(&self) -> &'static str {
            "Assign"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Default)]
    struct Tally {
        seen: Vec<&'static str>,
    }

    impl NodeVisitor for Tally {
        type Output = ();
        fn visit_literal(&mut self, _: &Literal) {
            self.seen.push("literal");
        }
        fn visit_statement(&mut self, node: &dyn Node) {
            self.seen.push("statement");
            self.visit_children(node);
        }
        fn visit_block(&mut self, node: &Block) {
            self.seen.push("block");
            self.visit_children(node);
        }
        fn visit_block_like(&mut self, node: &dyn Node) {
            self.seen.push("block-like");
            self.visit_children(node);
        }
        fn visit_expression(&mut self, _: &dyn Node) {
            self.seen.push("expression");
        }
        fn visit_default(&mut self, _: &dyn Node) {
            self.seen.push("default");
        }
    }

    #[test]
    fn unknown_node_falls_back_to_its_category() {
        let tree = Block::new(vec![
            node_ref(Assign::new(node_ref(Literal::string("x")))),
            node_ref(Reference::new("r")),
        ]);
        let mut tally = Tally::default();
        (&tree as &dyn Node).accept(&mut tally);
        assert_eq!(tally.seen, vec!["block", "statement", "literal", "default"]);
    }

    #[test]
    fn foreign_nodes_tagged_like_core_kinds_get_the_like_hooks() {
        let tree = Assign::tagged(
            NodeType::Block,
            node_ref(Block::new(vec![
                node_ref(Assign::tagged(NodeType::Literal, node_ref(Literal::null()))),
                node_ref(Assign::tagged(NodeType::Reference, node_ref(Literal::null()))),
            ])),
        );
        let mut tally = Tally::default();
        (&tree as &dyn Node).accept(&mut tally);
        assert_eq!(tally.seen, vec!["block-like", "block", "expression", "expression"]);
        assert!(matches!(categorize(&tree), Category::BlockLike(_)));
    }

    #[test]
    fn categorize_uses_tags_for_foreign_nodes() {
        let comment = Comment::new("hi");
        assert!(matches!(categorize(&comment), Category::Statement(_)));
        let ty = TypeNode::new(Type::simple("String", "kotlin.String"));
        assert!(matches!(categorize(&ty), Category::Type(_)));
        assert!(matches!(categorize(&Block::empty()), Category::Block(_)));
    }

    struct Upcase;

    impl NodeTransformer for Upcase {
        fn transform_literal(&mut self, node: &NodeRef, literal: &Literal) -> NodeRef {
            match &literal.value {
                crate::ast::LiteralValue::String(s) => node_ref(Literal::string(s.to_uppercase())),
                _ => node.clone(),
            }
        }
        fn transform_block(&mut self, _: &NodeRef, block: &Block) -> NodeRef {
            node_ref(transform_statements(self, block))
        }
    }

    #[test]
    fn transformer_builds_new_tree_and_shares_untouched_nodes() {
        let untouched = node_ref(Reference::new("keep"));
        let root: NodeRef = node_ref(Block::new(vec![node_ref(Literal::string("a")), untouched.clone()]));
        let out = Upcase.transform(&root);

        let old = root.downcast_ref::<Block>().unwrap();
        let new = out.downcast_ref::<Block>().unwrap();
        assert_eq!(old.statements[0].downcast_ref::<Literal>().unwrap().value.plain_text(), "a");
        assert_eq!(new.statements[0].downcast_ref::<Literal>().unwrap().value.plain_text(), "A");
        assert!(Rc::ptr_eq(&new.statements[1], &untouched));
    }

    #[test]
    fn default_transform_is_identity() {
        struct Nop;
        impl NodeTransformer for Nop {}
        let root: NodeRef = node_ref(Block::new(vec![node_ref(Literal::integer(1))]));
        assert!(Rc::ptr_eq(&Nop.transform(&root), &root));
    }

    #[test]
    fn walk_reaches_qualifiers() {
        let tree = Block::new(vec![node_ref(Reference::from_path("a.b.c").unwrap())]);
        let mut depths = Vec::new();
        walk(&tree, &mut |n, d| depths.push((n.kind_name(), d)));
        assert_eq!(
            depths,
            vec![("Block", 0), ("Reference", 1), ("Reference", 2), ("Reference", 3)]
        );
        assert_eq!(count_nodes(&tree), 4);
    }
}
