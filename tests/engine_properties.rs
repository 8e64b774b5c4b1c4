//! Quantified properties of the engine: context fallback, scope shadowing,
//! assignability, indentation and generation purity.
use std::rc::Rc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use polydsl::ast::{node_ref, Block, Literal, Node, NodeRef};
use polydsl::codegen::{generate, GenerationOptions};
use polydsl::context::{Context, ContextKey};
use polydsl::dsl::{BuildDsl, Dsl, DslKind, DslManager};
use polydsl::gradle::GradleDsl;
use polydsl::lang::{GroovyGenerator, KotlinGenerator};
use polydsl::scope::{Scope, Symbol, SymbolKind};
use polydsl::types::Type;
use polydsl::Error;

const LEVEL: ContextKey<u32> = ContextKey::new("level");

fn chain(bindings: &[Option<u32>]) -> Vec<Rc<Context>> {
    let mut out: Vec<Rc<Context>> = Vec::new();
    for binding in bindings {
        let context = match out.last() {
            Some(parent) => parent.create_child(),
            None => Context::root(),
        };
        if let Some(value) = binding {
            context.bind(LEVEL, *value);
        }
        out.push(context);
    }
    out
}

fn simple(name: &str) -> Type {
    Type::simple(name, format!("kotlin.{name}"))
}

fn any_type() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(simple("Any")),
        Just(simple("String")),
        Just(simple("Int")),
        Just(simple("String").nullable()),
        Just(simple("Any").nullable()),
    ]
}

fn nested(depth: usize, siblings: &[usize]) -> Block {
    let mut statements: Vec<NodeRef> =
        (0..siblings[depth]).map(|i| node_ref(Literal::integer(i as i64))).collect();
    if depth + 1 < siblings.len() {
        statements.push(node_ref(nested(depth + 1, siblings)));
    } else {
        statements.push(node_ref(Literal::string("deep")));
    }
    Block::new(statements)
}

proptest! {
    #[test]
    fn unbound_contexts_defer_to_their_parent(bindings in prop::collection::vec(prop::option::of(0u32..100), 1..8)) {
        let contexts = chain(&bindings);
        for (i, context) in contexts.iter().enumerate() {
            if bindings[i].is_none() {
                let inherited = context.parent().and_then(|p| p.resolve(LEVEL));
                prop_assert_eq!(context.resolve(LEVEL), inherited);
            } else {
                prop_assert_eq!(context.resolve(LEVEL), bindings[i]);
            }
        }
        let nearest = bindings.iter().rev().find_map(|b| *b);
        prop_assert_eq!(contexts.last().and_then(|c| c.resolve(LEVEL)), nearest);
    }

    #[test]
    fn child_scopes_shadow_without_clobbering(name in "[a-z]{1,8}", outer in "[a-z]{0,8}", inner in "[a-z]{0,8}") {
        let root = Scope::root("root");
        let symbol = |value: &str| Symbol::new(name.clone(), simple("String"), SymbolKind::Variable).with_value(value);
        root.define(name.clone(), symbol(&outer)).unwrap();
        let duplicate = root.define(name.clone(), symbol(&inner));
        prop_assert_eq!(duplicate, Err(Error::DuplicateSymbol { name: name.clone(), scope: "root".into() }));

        let child = root.create_child("child");
        child.define(name.clone(), symbol(&inner)).unwrap();
        prop_assert_eq!(child.resolve(&name).unwrap().value, Some(serde_json::Value::from(inner.clone())));
        prop_assert_eq!(root.resolve(&name).unwrap().value, Some(serde_json::Value::from(outer.clone())));
    }

    #[test]
    fn nullable_wrappers_accept_both_forms(name in "[A-Z][a-z]{0,6}") {
        let plain = simple(&name);
        let nullable = plain.clone().nullable();
        prop_assert!(plain.is_assignable_from(&plain));
        prop_assert!(nullable.is_assignable_from(&plain));
        prop_assert!(nullable.is_assignable_from(&nullable));
        prop_assert!(!plain.is_assignable_from(&nullable));
    }

    #[test]
    fn generics_are_pairwise_covariant(a1 in any_type(), a2 in any_type(), b1 in any_type(), b2 in any_type()) {
        let base = simple("Map");
        let target = Type::generic(base.clone(), vec![a1.clone(), a2.clone()]);
        let source = Type::generic(base, vec![b1.clone(), b2.clone()]);
        let expected = a1.is_assignable_from(&b1) && a2.is_assignable_from(&b2);
        prop_assert_eq!(target.is_assignable_from(&source), expected);

        let other_base = Type::generic(simple("Pair"), vec![b1, b2]);
        prop_assert!(!target.is_assignable_from(&other_base));
    }

    #[test]
    fn innermost_line_is_indented_three_times(
        siblings in prop::collection::vec(0usize..4, 3),
        indent in prop_oneof![Just("  "), Just("    "), Just("\t")],
    ) {
        let options = GenerationOptions { indent: indent.to_string(), ..GenerationOptions::default() };
        let tree = nested(0, &siblings);
        let text = generate(&KotlinGenerator, &tree, &options).unwrap();
        let deep = text.lines().find(|line| line.ends_with("\"deep\"")).unwrap();
        prop_assert_eq!(deep.to_string(), format!("{}\"deep\"", indent.repeat(3)));
    }

    #[test]
    fn targets_differ_only_in_quoting(value in "[A-Za-z0-9 ._-]{0,12}") {
        let block = Block::new(vec![node_ref(Literal::string(value.clone())), node_ref(Literal::string(value))]);
        let kotlin = generate(&KotlinGenerator, &block, &GenerationOptions::default()).unwrap();
        let groovy = generate(&GroovyGenerator, &block, &GenerationOptions::default()).unwrap();
        prop_assert_eq!(kotlin.lines().count(), groovy.lines().count());
        prop_assert_eq!(kotlin.replace('"', "'"), groovy);
    }

    #[test]
    fn generate_is_pure(group in "[a-z][a-z.]{0,12}", url in "https://[a-z]{1,8}\\.example") {
        let dsl = DslManager::new().create::<GradleDsl>(DslKind::Gradle, "kotlin").unwrap();
        let root = dsl
            .build(|root| {
                root.set_group(&group).publishing(|p| {
                    p.repositories(|r| {
                        r.maven(&url);
                    });
                });
                Ok(())
            })
            .unwrap();
        let first = dsl.generate(root.as_ref()).unwrap();
        let second = dsl.generate(root.as_ref()).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn three_level_nesting_with_tabs() {
    let tree = nested(0, &[1, 0, 2]);
    let text = generate(&KotlinGenerator, &tree, &GenerationOptions::tabs()).unwrap();
    assert_eq!(text, "{\n\t0\n\t{\n\t\t{\n\t\t\t0\n\t\t\t1\n\t\t\t\"deep\"\n\t\t}\n\t}\n}\n");
}

#[test]
fn manager_reports_configuration_and_language_errors() {
    let manager = DslManager::new();
    assert!(matches!(manager.create_dsl(DslKind::Custom, "Kotlin"), Err(Error::Configuration(_))));
    assert!(matches!(manager.create_dsl(DslKind::Gradle, "COBOL"), Err(Error::UnsupportedLanguage(_))));
}

#[test]
fn failed_generation_returns_no_text() {
    #[derive(Debug)]
    struct Opaque(polydsl::ast::NodeMetadata);
    impl Node for Opaque {
        fn metadata(&self) -> &polydsl::ast::NodeMetadata {
            &self.0
        }
        fn children(&self) -> Vec<NodeRef> {
            Vec::new()
        }
        fn kind_name(&self) -> &'static str {
            "Opaque"
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }
    let block = Block::new(vec![
        node_ref(Literal::string("before")),
        node_ref(Opaque(polydsl::ast::NodeMetadata::new(polydsl::ast::NodeType::Declaration))),
    ]);
    let result = generate(&GroovyGenerator, &block, &GenerationOptions::default());
    assert_eq!(result, Err(Error::generation("groovy", "Opaque")));
}
