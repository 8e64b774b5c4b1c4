//! Fluent builders for Gradle scripts.
//!
//! Section builders (`plugins`, `repositories`, `publishing`, ...) only
//! collect statements; anything that touches the symbol table or the
//! reference registry returns a [`Result`] so failures surface at the call.
use std::rc::Rc;

use crate::ast::{node_ref, Block, Comment, Literal, LiteralValue, NodeRef, Reference, VariableDeclaration};
use crate::context::{CURRENT_SCOPE, IMPORTS};
use crate::dsl::{DslBuilder, DslContext, DslReference};
use crate::error::{Error, Result};
use crate::scope::{Modifier, Symbol, SymbolKind};
use crate::types::{Type, ANY};

use super::nodes::{ComponentAccess, GradleScript, MavenRepository, MethodCall, PluginSpec, PropertyAssignment, ScriptBlock};

pub fn string(value: impl Into<String>) -> NodeRef {
    node_ref(Literal::string(value))
}

/// Dotted path as a reference chain. A malformed path is kept as one opaque name.
pub fn reference(path: &str) -> NodeRef {
    node_ref(Reference::from_path(path).unwrap_or_else(|| Reference::new(path)))
}

fn assignment(name: &str, value: NodeRef) -> NodeRef {
    node_ref(PropertyAssignment::new(
        Reference::from_path(name).unwrap_or_else(|| Reference::new(name)),
        value,
    ))
}

fn literal_value(node: &NodeRef) -> Option<serde_json::Value> {
    let literal = node.downcast_ref::<Literal>()?;
    Some(match &literal.value {
        LiteralValue::String(s) => s.clone().into(),
        LiteralValue::Integer(i) => (*i).into(),
        LiteralValue::Float(f) => f.into_inner().into(),
        LiteralValue::Boolean(b) => (*b).into(),
        LiteralValue::Null => serde_json::Value::Null,
    })
}

// ————————————————————————————————————————————————————————————————————————————
// GENERIC BLOCKS
// ————————————————————————————————————————————————————————————————————————————

/// Body of an arbitrary `name { }` block, with its own scope.
#[derive(Debug)]
pub struct BlockBuilder {
    context: Rc<DslContext>,
    statements: Vec<NodeRef>,
}

impl BlockBuilder {
    pub(crate) fn new(context: Rc<DslContext>) -> Self {
        Self { context, statements: Vec::new() }
    }

    pub fn context(&self) -> &Rc<DslContext> {
        &self.context
    }

    pub fn statement(&mut self, node: NodeRef) -> &mut Self {
        self.statements.push(node);
        self
    }

    pub fn property(&mut self, name: &str, value: NodeRef) -> &mut Self {
        self.statement(assignment(name, value))
    }

    pub fn call(&mut self, name: &str, arguments: Vec<NodeRef>) -> &mut Self {
        self.statement(node_ref(MethodCall::new(name, arguments)))
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        self.statement(node_ref(Comment::new(text)))
    }

    /// Declares a read-only local. Redeclaring a name in the same block fails;
    /// nested blocks may shadow it.
    pub fn val(&mut self, name: &str, ty: Option<Type>, initializer: NodeRef) -> Result<&mut Self> {
        let scope = self.context.scope()?;
        let mut symbol = Symbol::new(
            name,
            ty.clone().unwrap_or_else(|| Type::simple("Any", ANY)),
            SymbolKind::Variable,
        )
        .with_modifier(Modifier::Val);
        if let Some(value) = literal_value(&initializer) {
            symbol = symbol.with_value(value);
        }
        scope.define(name, symbol)?;

        let mut declaration = VariableDeclaration::new(name).with_modifier(Modifier::Val).initialized(initializer);
        if let Some(ty) = ty {
            declaration = declaration.typed(ty);
        }
        Ok(self.statement(node_ref(declaration)))
    }

    pub fn block<F>(&mut self, name: &str, body: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut BlockBuilder) -> Result<()>,
    {
        let child = self.context.create_dsl_child();
        child.bind(CURRENT_SCOPE, self.context.scope()?.create_child(name));
        let mut inner = BlockBuilder::new(child);
        body(&mut inner)?;
        Ok(self.statement(node_ref(ScriptBlock::new(name, inner.into_block()))))
    }

    fn into_block(self) -> Block {
        Block::new(self.statements)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ROOT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug)]
pub struct GradleRootBuilder {
    body: BlockBuilder,
}

impl GradleRootBuilder {
    pub fn new(context: Rc<DslContext>) -> Self {
        Self { body: BlockBuilder::new(context) }
    }

    pub fn context(&self) -> &Rc<DslContext> {
        self.body.context()
    }

    /// Adds an import line at the top of the script. Duplicates collapse.
    pub fn import(&mut self, path: &str) -> &mut Self {
        let context = self.context();
        let mut imports = context.resolve(IMPORTS).unwrap_or_default();
        imports.insert(path.to_string());
        context.bind(IMPORTS, imports);
        self
    }

    pub fn set_group(&mut self, group: &str) -> &mut Self {
        self.body.property("group", string(group));
        self
    }

    pub fn set_version(&mut self, version: &str) -> &mut Self {
        self.body.property("version", string(version));
        self
    }

    pub fn property(&mut self, name: &str, value: NodeRef) -> &mut Self {
        self.body.property(name, value);
        self
    }

    pub fn call(&mut self, name: &str, arguments: Vec<NodeRef>) -> &mut Self {
        self.body.call(name, arguments);
        self
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        self.body.comment(text);
        self
    }

    pub fn val(&mut self, name: &str, ty: Option<Type>, initializer: NodeRef) -> Result<&mut Self> {
        self.body.val(name, ty, initializer)?;
        Ok(self)
    }

    pub fn block<F>(&mut self, name: &str, body: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut BlockBuilder) -> Result<()>,
    {
        self.body.block(name, body)?;
        Ok(self)
    }

    pub fn plugins(&mut self, body: impl FnOnce(&mut PluginsBuilder)) -> &mut Self {
        let mut plugins = PluginsBuilder::default();
        body(&mut plugins);
        self.section("plugins", plugins.into_statements())
    }

    pub fn repositories(&mut self, body: impl FnOnce(&mut RepositoriesBuilder)) -> &mut Self {
        let mut repositories = RepositoriesBuilder::default();
        body(&mut repositories);
        self.section("repositories", repositories.statements)
    }

    pub fn publishing(&mut self, body: impl FnOnce(&mut PublishingBuilder)) -> &mut Self {
        let mut publishing = PublishingBuilder::default();
        body(&mut publishing);
        self.section("publishing", publishing.statements)
    }

    /// Needs the `publishing` reference to be registered on the context.
    pub fn signing(&mut self, body: impl FnOnce(&mut SigningBuilder)) -> Result<&mut Self> {
        let publishing = self
            .context()
            .resolve_reference("publishing")
            .ok_or_else(|| Error::configuration("signing requires a `publishing` reference"))?;
        let mut signing = SigningBuilder { publishing, statements: Vec::new() };
        body(&mut signing);
        Ok(self.section("signing", signing.statements))
    }

    fn section(&mut self, name: &str, statements: Vec<NodeRef>) -> &mut Self {
        self.body.statement(node_ref(ScriptBlock::new(name, Block::new(statements))));
        self
    }
}

impl DslBuilder for GradleRootBuilder {
    fn build(self) -> NodeRef {
        let imports = self.body.context.resolve(IMPORTS).unwrap_or_default();
        node_ref(GradleScript::new(self.body.statements).with_imports(imports))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SECTIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Default)]
pub struct PluginsBuilder {
    plugins: Vec<PluginSpec>,
}

impl PluginsBuilder {
    /// `id("...")`; chain `.version(..)` / `.apply(..)` on the result.
    pub fn id(&mut self, id: &str) -> &mut PluginSpec {
        self.push(PluginSpec::id(id))
    }

    /// A plugin addressed by its bare name, such as `kotlin-dsl` or `java`.
    pub fn core(&mut self, name: &str) -> &mut PluginSpec {
        self.push(PluginSpec::core(name))
    }

    fn push(&mut self, spec: PluginSpec) -> &mut PluginSpec {
        self.plugins.push(spec);
        let last = self.plugins.len() - 1;
        &mut self.plugins[last]
    }

    fn into_statements(self) -> Vec<NodeRef> {
        self.plugins.into_iter().map(node_ref).collect()
    }
}

#[derive(Debug, Default)]
pub struct RepositoriesBuilder {
    statements: Vec<NodeRef>,
}

impl RepositoriesBuilder {
    pub fn maven_central(&mut self) -> &mut Self {
        self.call("mavenCentral")
    }

    pub fn maven_local(&mut self) -> &mut Self {
        self.call("mavenLocal")
    }

    pub fn google(&mut self) -> &mut Self {
        self.call("google")
    }

    pub fn gradle_plugin_portal(&mut self) -> &mut Self {
        self.call("gradlePluginPortal")
    }

    pub fn maven(&mut self, url: &str) -> &mut Self {
        self.statements.push(node_ref(MavenRepository::new(url)));
        self
    }

    fn call(&mut self, name: &str) -> &mut Self {
        self.statements.push(node_ref(MethodCall::new(name, Vec::new())));
        self
    }
}

#[derive(Debug, Default)]
pub struct PublishingBuilder {
    statements: Vec<NodeRef>,
}

impl PublishingBuilder {
    pub fn repositories(&mut self, body: impl FnOnce(&mut RepositoriesBuilder)) -> &mut Self {
        let mut repositories = RepositoriesBuilder::default();
        body(&mut repositories);
        self.statements.push(node_ref(ScriptBlock::new("repositories", Block::new(repositories.statements))));
        self
    }

    pub fn publications(&mut self, body: impl FnOnce(&mut PublicationsBuilder)) -> &mut Self {
        let mut publications = PublicationsBuilder::default();
        body(&mut publications);
        self.statements.push(node_ref(ScriptBlock::new("publications", Block::new(publications.statements))));
        self
    }
}

#[derive(Debug, Default)]
pub struct PublicationsBuilder {
    statements: Vec<NodeRef>,
}

impl PublicationsBuilder {
    /// `create<Type>("name") { ... }`
    pub fn create(&mut self, name: &str, type_name: &str, body: impl FnOnce(&mut PublicationBuilder)) -> &mut Self {
        let mut publication = PublicationBuilder::default();
        body(&mut publication);
        let call = MethodCall::new("create", vec![string(name)])
            .with_type_argument(Type::named(type_name))
            .with_block(Block::new(publication.statements));
        self.statements.push(node_ref(call));
        self
    }

    pub fn maven_publication(&mut self, name: &str, body: impl FnOnce(&mut PublicationBuilder)) -> &mut Self {
        self.create(name, "MavenPublication", body)
    }
}

#[derive(Debug, Default)]
pub struct PublicationBuilder {
    statements: Vec<NodeRef>,
}

impl PublicationBuilder {
    /// `from(components["name"])`
    pub fn from_component(&mut self, name: &str) -> &mut Self {
        self.statements.push(node_ref(MethodCall::new("from", vec![node_ref(ComponentAccess::new(name))])));
        self
    }

    pub fn group_id(&mut self, value: &str) -> &mut Self {
        self.property("groupId", string(value))
    }

    pub fn artifact_id(&mut self, value: &str) -> &mut Self {
        self.property("artifactId", string(value))
    }

    pub fn version(&mut self, value: &str) -> &mut Self {
        self.property("version", string(value))
    }

    pub fn property(&mut self, name: &str, value: NodeRef) -> &mut Self {
        self.statements.push(assignment(name, value));
        self
    }
}

#[derive(Debug)]
pub struct SigningBuilder {
    publishing: DslReference,
    statements: Vec<NodeRef>,
}

impl SigningBuilder {
    pub fn use_in_memory_pgp_keys(&mut self, key: NodeRef, password: NodeRef) -> &mut Self {
        self.statements.push(node_ref(MethodCall::new("useInMemoryPgpKeys", vec![key, password])));
        self
    }

    /// `sign(publishing.publications)`
    pub fn sign_publications(&mut self) -> &mut Self {
        let publications = self.publishing.child("publications").to_reference();
        self.statements.push(node_ref(MethodCall::new("sign", vec![node_ref(publications)])));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::dsl::DslKind;
    use crate::scope::Scope;

    fn context() -> Rc<DslContext> {
        let context = DslContext::new(Context::root(), DslKind::Gradle);
        context.bind(CURRENT_SCOPE, Scope::root("gradle"));
        context
    }

    #[test]
    fn val_records_a_symbol() {
        let context = context();
        let mut root = GradleRootBuilder::new(context.clone());
        root.val("signingKeyId", None, string("")).unwrap();
        let symbol = context.scope().unwrap().resolve("signingKeyId").unwrap();
        assert_eq!(symbol.value, Some("".into()));
        assert!(symbol.modifiers.contains(&Modifier::Val));
    }

    #[test]
    fn duplicate_val_fails_but_nested_blocks_shadow() {
        let mut root = GradleRootBuilder::new(context());
        root.val("flag", None, node_ref(Literal::boolean(true))).unwrap();
        let err = root.val("flag", None, node_ref(Literal::boolean(false))).unwrap_err();
        assert_eq!(err, Error::DuplicateSymbol { name: "flag".into(), scope: "gradle".into() });

        root.block("subprojects", |b| {
            b.val("flag", None, node_ref(Literal::boolean(false)))?;
            assert_eq!(b.context().scope()?.path(), "gradle.subprojects");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn signing_without_publishing_reference_fails() {
        let mut root = GradleRootBuilder::new(context());
        let err = root.signing(|s| {
            s.sign_publications();
        });
        assert!(matches!(err, Err(Error::Configuration(_))));
    }

    #[test]
    fn imports_are_deduplicated_and_sorted() {
        let mut root = GradleRootBuilder::new(context());
        root.import("java.util.Properties").import("java.io.File").import("java.util.Properties");
        let script = root.build();
        let script = script.downcast_ref::<GradleScript>().unwrap();
        assert_eq!(script.imports, vec!["java.io.File".to_string(), "java.util.Properties".to_string()]);
    }

    #[test]
    fn reference_helper_keeps_malformed_paths() {
        assert_eq!(reference("a..b").downcast_ref::<Reference>().unwrap().name, "a..b");
    }
}
