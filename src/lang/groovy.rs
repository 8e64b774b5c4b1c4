//! Groovy target: single-quoted strings, no nullable types, `def` for untyped locals.
use std::rc::Rc;

use crate::ast::{Literal, LiteralValue, Node, Reference, VariableDeclaration};
use crate::codegen::{CodeGenerator, GenerationContext};
use crate::context::{Language, LanguageFamily, LanguageFeature};
use crate::error::Result;
use crate::lang::{emit_core, is_identifier, CoreSyntax, LanguageModule};
use crate::scope::Modifier;
use crate::types::{Type, TypeSystem};

#[derive(Debug, Default, Clone, Copy)]
pub struct GroovyModule;

impl LanguageModule for GroovyModule {
    fn language(&self) -> Language {
        Language::new(
            LanguageFamily::Groovy,
            [
                LanguageFeature::TypeInference,
                LanguageFeature::GroovyClosures,
                LanguageFeature::GradlePlugins,
            ],
        )
    }

    fn type_system(&self) -> TypeSystem {
        let mut ts = TypeSystem::new();
        ts.register_type(Type::simple("Object", "java.lang.Object"));
        ts
    }

    fn code_generator(&self) -> Rc<dyn CodeGenerator> {
        Rc::new(GroovyGenerator)
    }
}

/// Renders the core node kinds as Groovy.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroovyGenerator;

impl CodeGenerator for GroovyGenerator {
    fn name(&self) -> &str {
        "groovy"
    }

    fn emit(&self, node: &dyn Node, out: &mut GenerationContext, dispatch: &dyn CodeGenerator) -> Result<()> {
        emit_core(self.name(), &GROOVY_SYNTAX, node, out, dispatch)
    }
}

const GROOVY_SYNTAX: CoreSyntax = CoreSyntax {
    literal: literal_text,
    reference: reference_text,
    ty: type_text,
    declaration: emit_declaration,
};

fn emit_declaration(decl: &VariableDeclaration, out: &mut GenerationContext, dispatch: &dyn CodeGenerator) -> Result<()> {
    let groovy_modifiers = decl.modifiers.iter().filter(|m| {
        matches!(
            m,
            Modifier::Public | Modifier::Private | Modifier::Protected | Modifier::Abstract | Modifier::Final
        )
    });
    for modifier in groovy_modifiers {
        out.append(modifier.keyword()).append(" ");
    }
    match &decl.ty {
        Some(ty) => {
            dispatch.emit(ty.as_ref(), out, dispatch)?;
            out.append(" ");
        }
        None => {
            out.append("def ");
        }
    }
    out.append(&decl.name);
    if let Some(init) = &decl.initializer {
        out.append(" = ");
        dispatch.emit(init.as_ref(), out, dispatch)?;
    }
    Ok(())
}

pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

pub fn literal_text(literal: &Literal) -> String {
    match &literal.value {
        LiteralValue::String(s) => string_literal(s),
        other => other.plain_text(),
    }
}

/// Segments that are not plain identifiers become quoted property names.
/// A quoted name needs a receiver, so an odd leading segment is read off `this`.
pub fn reference_text(reference: &Reference) -> String {
    let segments = reference.segments();
    let mut parts = Vec::with_capacity(segments.len() + 1);
    if segments.first().is_some_and(|s| !is_identifier(s)) {
        parts.push("this".to_string());
    }
    parts.extend(segments.into_iter().map(|s| if is_identifier(s) { s.to_string() } else { string_literal(s) }));
    parts.join(".")
}

/// Groovy has no nullable types, so `?` is dropped at every level.
pub fn type_text(ty: &Type) -> String {
    match ty {
        Type::Simple(s) => s.name.clone(),
        Type::Generic(g) => {
            let args = g.arguments.iter().map(type_text).collect::<Vec<_>>();
            format!("{}<{}>", type_text(&g.base), args.join(", "))
        }
        Type::Nullable(inner) => type_text(inner),
    }
}
