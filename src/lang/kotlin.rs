//! Kotlin target: double-quoted strings, `?` nullability, backticked names.
use std::rc::Rc;

use crate::ast::{Literal, LiteralValue, Node, Reference, VariableDeclaration};
use crate::codegen::{CodeGenerator, GenerationContext};
use crate::context::{Language, LanguageFamily, LanguageFeature};
use crate::error::Result;
use crate::lang::{emit_core, is_identifier, CoreSyntax, LanguageModule};
use crate::scope::Modifier;
use crate::types::{Type, TypeSystem};

#[derive(Debug, Default, Clone, Copy)]
pub struct KotlinModule;

impl LanguageModule for KotlinModule {
    fn language(&self) -> Language {
        Language::new(
            LanguageFamily::Kotlin,
            [
                LanguageFeature::TypeInference,
                LanguageFeature::SmartCasts,
                LanguageFeature::ExtensionFunctions,
                LanguageFeature::OperatorOverloading,
                LanguageFeature::NullableTypes,
            ],
        )
    }

    fn type_system(&self) -> TypeSystem {
        TypeSystem::new()
    }

    fn code_generator(&self) -> Rc<dyn CodeGenerator> {
        Rc::new(KotlinGenerator)
    }
}

/// Renders the core node kinds as Kotlin.
#[derive(Debug, Default, Clone, Copy)]
pub struct KotlinGenerator;

impl CodeGenerator for KotlinGenerator {
    fn name(&self) -> &str {
        "kotlin"
    }

    fn emit(&self, node: &dyn Node, out: &mut GenerationContext, dispatch: &dyn CodeGenerator) -> Result<()> {
        emit_core(self.name(), &KOTLIN_SYNTAX, node, out, dispatch)
    }
}

const KOTLIN_SYNTAX: CoreSyntax = CoreSyntax {
    literal: literal_text,
    reference: reference_text,
    ty: type_text,
    declaration: emit_declaration,
};

fn emit_declaration(decl: &VariableDeclaration, out: &mut GenerationContext, dispatch: &dyn CodeGenerator) -> Result<()> {
    for modifier in decl.modifiers.iter().filter(|m| !matches!(m, Modifier::Val | Modifier::Var)) {
        out.append(modifier.keyword()).append(" ");
    }
    out.append(if decl.is_mutable() { "var " } else { "val " });
    out.append(&name_text(&decl.name));
    if let Some(ty) = &decl.ty {
        out.append(": ");
        dispatch.emit(ty.as_ref(), out, dispatch)?;
    }
    if let Some(init) = &decl.initializer {
        out.append(" = ");
        dispatch.emit(init.as_ref(), out, dispatch)?;
    }
    Ok(())
}

pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn literal_text(literal: &Literal) -> String {
    match &literal.value {
        LiteralValue::String(s) => string_literal(s),
        other => other.plain_text(),
    }
}

/// Names that are not plain identifiers go in backticks.
pub fn name_text(name: &str) -> String {
    if is_identifier(name) { name.to_string() } else { format!("`{name}`") }
}

pub fn reference_text(reference: &Reference) -> String {
    reference.segments().into_iter().map(name_text).collect::<Vec<_>>().join(".")
}

pub fn type_text(ty: &Type) -> String {
    ty.name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{node_ref, Block, Comment, TypeNode};
    use crate::codegen::{generate, GenerationOptions};

    fn render(node: &dyn Node) -> String {
        generate(&KotlinGenerator, node, &GenerationOptions::default()).unwrap()
    }

    #[test]
    fn strings_are_double_quoted_and_escaped() {
        assert_eq!(string_literal("a\"b$c"), r#""a\"b\$c""#);
        assert_eq!(render(&Literal::string("x")), "\"x\"\n");
    }

    #[test]
    fn references_backtick_odd_segments() {
        let r = Reference::from_path("plugins.kotlin-dsl").unwrap();
        assert_eq!(reference_text(&r), "plugins.`kotlin-dsl`");
    }

    #[test]
    fn nullable_generic_types_keep_question_marks() {
        let ty = Type::generic(Type::named("List"), vec![Type::named("String")]).nullable();
        assert_eq!(render(&TypeNode::new(ty)), "List<String>?\n");
    }

    #[test]
    fn declarations() {
        let decl = VariableDeclaration::new("signingKeyId")
            .with_modifier(Modifier::Private)
            .typed(Type::named("String").nullable())
            .initialized(node_ref(Literal::null()));
        assert_eq!(render(&decl), "private val signingKeyId: String? = null\n");

        let var = VariableDeclaration::new("n").with_modifier(Modifier::Var).initialized(node_ref(Literal::integer(3)));
        assert_eq!(render(&var), "var n = 3\n");
    }

    #[test]
    fn blocks_indent_their_statements() {
        let block = Block::new(vec![node_ref(Literal::boolean(true)), node_ref(Block::empty())]);
        assert_eq!(render(&block), "{\n    true\n    {\n    }\n}\n");
    }

    #[test]
    fn comments_honor_options() {
        let block = Block::new(vec![node_ref(Comment::new("note")), node_ref(Literal::integer(1))]);
        assert_eq!(render(&block), "{\n    // note\n    1\n}\n");
        let quiet = GenerationOptions { include_comments: false, ..GenerationOptions::default() };
        assert_eq!(generate(&KotlinGenerator, &block, &quiet).unwrap(), "{\n    1\n}\n");
    }
}
