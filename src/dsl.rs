//! DSL framework and registry.
//!
//! A [`DslFactory`] turns a prepared [`Context`] into a [`Dsl`] instance for
//! one kind of build language; the [`DslManager`] owns the factories and the
//! language modules and wires them together on request.
use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::ast::{Node, NodeRef, Reference};
use crate::codegen::{self, CodeGenerator, GenerationOptions, GenerationOutput};
use crate::context::{
    Context, ContextKey, Language, LanguageFamily, CODE_GENERATOR, CURRENT_SCOPE, IMPORTS, LANGUAGE,
    TYPE_SYSTEM,
};
use crate::error::{Error, Result};
use crate::lang::{GroovyModule, KotlinModule, LanguageModule};
use crate::scope::Scope;
use crate::visit::count_nodes;

// ————————————————————————————————————————————————————————————————————————————
// KINDS & REFERENCES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DslKind {
    Gradle,
    Maven,
    Custom,
}

impl DslKind {
    pub const ALL: [DslKind; 3] = [DslKind::Gradle, DslKind::Maven, DslKind::Custom];

    pub fn name(self) -> &'static str {
        match self {
            DslKind::Gradle => "gradle",
            DslKind::Maven => "maven",
            DslKind::Custom => "custom",
        }
    }
}

impl fmt::Display for DslKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DslKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DslKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::configuration(format!("unknown DSL kind `{s}`")))
    }
}

/// Symbolic handle on an object that lives outside the block being built,
/// e.g. `publishing`, so that other blocks can point at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DslReference {
    pub name: String,
    pub type_name: String,
}

impl DslReference {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self { name: name.into(), type_name: type_name.into() }
    }

    /// `publishing` + `publications` → `publishing.publications`.
    pub fn child(&self, property: &str) -> DslReference {
        DslReference::new(format!("{}.{property}", self.name), "Any")
    }

    pub fn to_reference(&self) -> Reference {
        let mut segments = self.name.split('.');
        let first = Reference::new(segments.next().unwrap_or_default());
        segments.fold(first, |qualifier, segment| Reference::qualified(qualifier, segment))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DSL CONTEXT
// ————————————————————————————————————————————————————————————————————————————

/// A [`Context`] tagged with the DSL kind, plus a registry of [`DslReference`]s.
/// Context operations are forwarded to the wrapped context.
#[derive(Debug)]
pub struct DslContext {
    context: Rc<Context>,
    kind: DslKind,
    parent: Option<Rc<DslContext>>,
    references: RefCell<IndexMap<String, DslReference>>,
}

impl DslContext {
    pub fn new(context: Rc<Context>, kind: DslKind) -> Rc<Self> {
        Rc::new(Self { context, kind, parent: None, references: RefCell::default() })
    }

    pub fn kind(&self) -> DslKind {
        self.kind
    }

    pub fn context(&self) -> &Rc<Context> {
        &self.context
    }

    pub fn bind<T: 'static>(&self, key: ContextKey<T>, value: T) {
        self.context.bind(key, value)
    }

    pub fn resolve<T: Clone + 'static>(&self, key: ContextKey<T>) -> Option<T> {
        self.context.resolve(key)
    }

    pub fn create_child(&self) -> Rc<Context> {
        self.context.create_child()
    }

    /// Child with its own bindings and references; both fall back to `self`.
    pub fn create_dsl_child(self: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            context: self.context.create_child(),
            kind: self.kind,
            parent: Some(Rc::clone(self)),
            references: RefCell::default(),
        })
    }

    pub fn register_reference(&self, name: impl Into<String>, type_name: impl Into<String>) -> DslReference {
        let reference = DslReference::new(name, type_name);
        self.references.borrow_mut().insert(reference.name.clone(), reference.clone());
        reference
    }

    pub fn resolve_reference(&self, name: &str) -> Option<DslReference> {
        if let Some(reference) = self.references.borrow().get(name) {
            return Some(reference.clone());
        }
        self.parent.as_ref().and_then(|p| p.resolve_reference(name))
    }

    /// The scope new declarations go into.
    pub fn scope(&self) -> Result<Rc<Scope>> {
        self.resolve(CURRENT_SCOPE)
            .ok_or_else(|| Error::configuration(format!("{} context has no current scope", self.kind)))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TRAITS
// ————————————————————————————————————————————————————————————————————————————

/// A configured DSL instance: knows its context and how to render trees.
pub trait Dsl: Any + fmt::Debug {
    fn kind(&self) -> DslKind;

    fn context(&self) -> &Rc<DslContext>;

    fn code_generator(&self) -> Rc<dyn CodeGenerator>;

    /// Semantic evaluation hook; identity for now.
    fn execute(&self, root: NodeRef) -> NodeRef {
        root
    }

    fn generate(&self, root: &dyn Node) -> Result<String> {
        self.generate_with(root, &GenerationOptions::default())
    }

    fn generate_with(&self, root: &dyn Node, options: &GenerationOptions) -> Result<String> {
        codegen::generate(self.code_generator().as_ref(), root, options)
    }

    fn generate_output(&self, root: &dyn Node, options: &GenerationOptions) -> Result<GenerationOutput> {
        codegen::generate_output(self.code_generator().as_ref(), root, options)
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

pub trait DslBuilder {
    /// Consumes the builder and yields the root node.
    fn build(self) -> NodeRef;
}

/// The statically typed half of a DSL: builder access.
pub trait BuildDsl: Dsl {
    type Builder: DslBuilder;

    fn builder(&self) -> Self::Builder;

    fn build<F>(&self, block: F) -> Result<NodeRef>
    where
        F: FnOnce(&mut Self::Builder) -> Result<()>,
    {
        let mut builder = self.builder();
        block(&mut builder)?;
        let root = builder.build();
        tracing::debug!(kind = %self.kind(), nodes = count_nodes(root.as_ref()), "tree built");
        Ok(root)
    }
}

pub trait DslFactory {
    fn kind(&self) -> DslKind;

    /// `context` already carries the language, type system, code generator,
    /// scope and imports of the requested target.
    fn create(&self, context: Rc<Context>) -> Result<Box<dyn Dsl>>;
}

// ————————————————————————————————————————————————————————————————————————————
// MANAGER
// ————————————————————————————————————————————————————————————————————————————

pub struct DslManager {
    factories: IndexMap<DslKind, Rc<dyn DslFactory>>,
    modules: IndexMap<LanguageFamily, IndexMap<String, Rc<dyn LanguageModule>>>,
}

impl fmt::Debug for DslManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DslManager")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("modules", &self.module_names())
            .finish()
    }
}

impl Default for DslManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DslManager {
    /// Registry with nothing in it.
    pub fn empty() -> Self {
        Self { factories: IndexMap::new(), modules: IndexMap::new() }
    }

    /// Gradle factory plus the Kotlin and Groovy modules.
    pub fn new() -> Self {
        let mut manager = Self::empty();
        manager.register_factory(crate::gradle::GradleFactory);
        for family in LanguageFamily::ALL {
            let module: Rc<dyn LanguageModule> = match family {
                LanguageFamily::Kotlin => Rc::new(KotlinModule),
                LanguageFamily::Groovy => Rc::new(GroovyModule),
            };
            manager.modules.entry(family).or_default().insert(family.name().to_ascii_lowercase(), module);
        }
        manager
    }

    /// Replaces any factory already registered for the same kind.
    pub fn register_factory(&mut self, factory: impl DslFactory + 'static) {
        let kind = factory.kind();
        tracing::debug!(%kind, "factory registered");
        self.factories.insert(kind, Rc::new(factory));
    }

    /// `name` must belong to a recognized language family.
    pub fn register_language_module(&mut self, name: &str, module: impl LanguageModule + 'static) -> Result<()> {
        let family = LanguageFamily::from_name(name).ok_or_else(|| Error::UnsupportedLanguage(name.to_string()))?;
        tracing::debug!(%family, name, "language module registered");
        self.modules.entry(family).or_default().insert(name.trim().to_ascii_lowercase(), Rc::new(module));
        Ok(())
    }

    pub fn language_module(&self, language: &str) -> Result<Rc<dyn LanguageModule>> {
        let family =
            LanguageFamily::from_name(language).ok_or_else(|| Error::UnsupportedLanguage(language.to_string()))?;
        self.modules
            .get(&family)
            .and_then(|modules| modules.get(&language.trim().to_ascii_lowercase()))
            .cloned()
            .ok_or_else(|| Error::configuration(format!("no language module registered for `{language}`")))
    }

    pub fn create_dsl(&self, kind: DslKind, language: &str) -> Result<Box<dyn Dsl>> {
        let factory = self
            .factories
            .get(&kind)
            .ok_or_else(|| Error::configuration(format!("no DSL factory registered for `{kind}`")))?;
        let module = self.language_module(language)?;
        let descriptor = module.language();
        tracing::debug!(%kind, language = %descriptor.name, "creating dsl");

        let context = Context::root();
        context.bind(LANGUAGE, descriptor);
        context.bind(TYPE_SYSTEM, Rc::new(module.type_system()));
        context.bind(CODE_GENERATOR, module.code_generator());
        context.bind(CURRENT_SCOPE, Scope::root(kind.name()));
        context.bind(IMPORTS, BTreeSet::new());
        factory.create(context)
    }

    /// [`create_dsl`](Self::create_dsl) plus a downcast to the concrete DSL type.
    pub fn create<D: Dsl>(&self, kind: DslKind, language: &str) -> Result<Box<D>> {
        self.create_dsl(kind, language)?.into_any().downcast::<D>().map_err(|_| {
            Error::configuration(format!("factory for `{kind}` does not produce {}", std::any::type_name::<D>()))
        })
    }

    pub fn kinds(&self) -> Vec<DslKind> {
        self.factories.keys().copied().collect()
    }

    /// Registered module names, lowercase, grouped by family order.
    pub fn module_names(&self) -> Vec<String> {
        self.modules.values().flat_map(|modules| modules.keys().cloned()).collect()
    }

    pub fn languages(&self) -> Vec<Language> {
        self.modules.values().flat_map(|modules| modules.values().map(|m| m.language())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradle::GradleDsl;

    #[test]
    fn unknown_kind_is_a_configuration_error() {
        let manager = DslManager::new();
        let err = manager.create_dsl(DslKind::Maven, "Kotlin").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "{err}");
    }

    #[test]
    fn unknown_language_is_unsupported() {
        let manager = DslManager::new();
        let err = manager.create_dsl(DslKind::Gradle, "COBOL").unwrap_err();
        assert_eq!(err, Error::UnsupportedLanguage("COBOL".into()));
    }

    #[test]
    fn recognized_but_unregistered_language_is_a_configuration_error() {
        let mut manager = DslManager::empty();
        manager.register_factory(crate::gradle::GradleFactory);
        let err = manager.create_dsl(DslKind::Gradle, "groovy").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        manager.register_language_module("Groovy", GroovyModule).unwrap();
        assert!(manager.create_dsl(DslKind::Gradle, "GROOVY").is_ok());
    }

    #[test]
    fn registering_an_unknown_language_fails() {
        let mut manager = DslManager::empty();
        let err = manager.register_language_module("scala", KotlinModule).unwrap_err();
        assert_eq!(err, Error::UnsupportedLanguage("scala".into()));
    }

    #[test]
    fn created_context_carries_the_target() {
        let manager = DslManager::new();
        let dsl = manager.create::<GradleDsl>(DslKind::Gradle, "kotlin").unwrap();
        let context = dsl.context();
        assert_eq!(context.kind(), DslKind::Gradle);
        assert_eq!(context.resolve(LANGUAGE).unwrap().family, LanguageFamily::Kotlin);
        assert_eq!(context.scope().unwrap().name(), "gradle");
        assert!(context.resolve(IMPORTS).unwrap().is_empty());
        assert!(context.resolve(TYPE_SYSTEM).unwrap().resolve_type("String").is_some());
    }

    #[test]
    fn references_fall_back_to_parent_contexts() {
        let root = DslContext::new(Context::root(), DslKind::Custom);
        root.register_reference("publishing", "PublishingExtension");
        let child = root.create_dsl_child();
        child.register_reference("local", "Any");

        let publishing = child.resolve_reference("publishing").unwrap();
        assert_eq!(publishing.child("publications").name, "publishing.publications");
        assert_eq!(publishing.child("publications").to_reference().dotted_path(), "publishing.publications");
        assert!(root.resolve_reference("local").is_none());
    }

    #[test]
    fn created_dsls_are_debuggable() {
        let dsl = DslManager::new().create_dsl(DslKind::Gradle, "groovy").unwrap();
        assert!(format!("{dsl:?}").starts_with("GradleDsl"));
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("Gradle".parse::<DslKind>().unwrap(), DslKind::Gradle);
        assert!("ant".parse::<DslKind>().is_err());
    }

    #[test]
    fn listing() {
        let manager = DslManager::new();
        assert_eq!(manager.kinds(), vec![DslKind::Gradle]);
        assert_eq!(manager.module_names(), vec!["kotlin".to_string(), "groovy".to_string()]);
        assert_eq!(manager.languages().len(), 2);
    }
}
