//! Hierarchical typed key → value environment.
//!
//! Builders thread ambient configuration (target language, type system,
//! current scope, imports, code generator) through a tree of contexts
//! instead of globals. Lookups fall back to the parent chain; bindings only
//! ever land in the local map.
use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::codegen::CodeGenerator;
use crate::scope::Scope;
use crate::types::TypeSystem;

// ————————————————————————————————————————————————————————————————————————————
// KEYS
// ————————————————————————————————————————————————————————————————————————————

/// Keys are identified by name; `T` fixes what a lookup hands back.
pub struct ContextKey<T> {
    name: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self { name, _value: PhantomData }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextKey({})", self.name)
    }
}

pub const CURRENT_SCOPE: ContextKey<Rc<Scope>> = ContextKey::new("currentScope");
pub const TYPE_SYSTEM: ContextKey<Rc<TypeSystem>> = ContextKey::new("typeSystem");
pub const LANGUAGE: ContextKey<Language> = ContextKey::new("language");
pub const IMPORTS: ContextKey<BTreeSet<String>> = ContextKey::new("imports");
pub const CODE_GENERATOR: ContextKey<Rc<dyn CodeGenerator>> = ContextKey::new("codeGenerator");

// ————————————————————————————————————————————————————————————————————————————
// LANGUAGES
// ————————————————————————————————————————————————————————————————————————————

/// The fixed set of recognized target families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LanguageFamily {
    Kotlin,
    Groovy,
}

impl LanguageFamily {
    pub const ALL: [LanguageFamily; 2] = [LanguageFamily::Kotlin, LanguageFamily::Groovy];

    /// Case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "kotlin" => Some(LanguageFamily::Kotlin),
            "groovy" => Some(LanguageFamily::Groovy),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LanguageFamily::Kotlin => "Kotlin",
            LanguageFamily::Groovy => "Groovy",
        }
    }
}

impl fmt::Display for LanguageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LanguageFeature {
    TypeInference,
    SmartCasts,
    ExtensionFunctions,
    OperatorOverloading,
    NullableTypes,
    GroovyClosures,
    GradlePlugins,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub name: String,
    pub family: LanguageFamily,
    pub features: BTreeSet<LanguageFeature>,
}

impl Language {
    pub fn new(family: LanguageFamily, features: impl IntoIterator<Item = LanguageFeature>) -> Self {
        Self { name: family.name().to_string(), family, features: features.into_iter().collect() }
    }

    pub fn supports(&self, feature: LanguageFeature) -> bool {
        self.features.contains(&feature)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONTEXT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Default)]
pub struct Context {
    parent: Option<Rc<Context>>,
    bindings: RefCell<IndexMap<&'static str, Rc<dyn Any>>>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("keys", &self.bindings.borrow().keys().collect::<Vec<_>>())
            .field("parent", &self.parent)
            .finish()
    }
}

impl Context {
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn create_child(self: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self { parent: Some(Rc::clone(self)), bindings: RefCell::default() })
    }

    pub fn parent(&self) -> Option<&Rc<Context>> {
        self.parent.as_ref()
    }

    /// Overwrites any previous local binding for `key`. Never touches ancestors.
    pub fn bind<T: 'static>(&self, key: ContextKey<T>, value: T) {
        self.bindings.borrow_mut().insert(key.name, Rc::new(value));
    }

    pub fn resolve<T: Clone + 'static>(&self, key: ContextKey<T>) -> Option<T> {
        let local = self
            .bindings
            .borrow()
            .get(key.name)
            .and_then(|v| v.downcast_ref::<T>().cloned());
        match local {
            Some(value) => Some(value),
            None => self.parent.as_ref().and_then(|p| p.resolve(key)),
        }
    }

    pub fn is_bound_locally<T>(&self, key: ContextKey<T>) -> bool {
        self.bindings.borrow().contains_key(key.name)
    }

    /// Number of ancestors above this context.
    pub fn depth(&self) -> usize {
        self.parent.as_ref().map_or(0, |p| p.depth() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNT: ContextKey<u32> = ContextKey::new("count");
    const LABEL: ContextKey<String> = ContextKey::new("label");

    #[test]
    fn unbound_root_resolves_to_none() {
        let root = Context::root();
        assert_eq!(root.resolve(COUNT), None);
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn child_falls_back_to_ancestors() {
        let root = Context::root();
        root.bind(COUNT, 1);
        let grandchild = root.create_child().create_child();
        assert_eq!(grandchild.resolve(COUNT), Some(1));
        assert_eq!(grandchild.depth(), 2);
    }

    #[test]
    fn child_binding_shadows_but_never_writes_parent() {
        let root = Context::root();
        root.bind(LABEL, "outer".to_string());
        let child = root.create_child();
        child.bind(LABEL, "inner".to_string());
        assert_eq!(child.resolve(LABEL).as_deref(), Some("inner"));
        assert_eq!(root.resolve(LABEL).as_deref(), Some("outer"));
        assert!(child.is_bound_locally(LABEL));
        assert!(!child.is_bound_locally(COUNT));
    }

    #[test]
    fn bind_overwrites_locally() {
        let ctx = Context::root();
        ctx.bind(COUNT, 1);
        ctx.bind(COUNT, 2);
        assert_eq!(ctx.resolve(COUNT), Some(2));
    }

    #[test]
    fn parent_bindings_made_after_child_creation_are_visible() {
        let root = Context::root();
        let child = root.create_child();
        root.bind(COUNT, 7);
        assert_eq!(child.resolve(COUNT), Some(7));
    }

    #[test]
    fn language_family_parsing() {
        assert_eq!(LanguageFamily::from_name("KOTLIN"), Some(LanguageFamily::Kotlin));
        assert_eq!(LanguageFamily::from_name("groovy"), Some(LanguageFamily::Groovy));
        assert_eq!(LanguageFamily::from_name("COBOL"), None);
        let kotlin = Language::new(LanguageFamily::Kotlin, [LanguageFeature::NullableTypes]);
        assert!(kotlin.supports(LanguageFeature::NullableTypes));
        assert!(!kotlin.supports(LanguageFeature::GroovyClosures));
    }
}
