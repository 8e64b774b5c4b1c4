//! Target language modules.
//!
//! A module bundles what the engine needs to know about one target: its
//! descriptor, a seeded type system and a generator for the core node kinds.
//! Domain generators wrap the module's generator and delegate to it.
pub mod groovy;
pub mod kotlin;

use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Comment, Literal, Node, Reference, TypeNode, VariableDeclaration};
use crate::codegen::{emit_indented, CodeGenerator, GenerationContext};
use crate::context::Language;
use crate::error::{Error, Result};
use crate::types::{Type, TypeSystem};
use crate::visit::{categorize, Category};

pub use groovy::{GroovyGenerator, GroovyModule};
pub use kotlin::{KotlinGenerator, KotlinModule};

pub trait LanguageModule {
    fn language(&self) -> Language;
    fn type_system(&self) -> TypeSystem;
    fn code_generator(&self) -> Rc<dyn CodeGenerator>;
}

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Plain JVM identifier (no backticks or quoting needed).
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Per-target spelling of the core node kinds.
pub(crate) struct CoreSyntax {
    pub literal: fn(&Literal) -> String,
    pub reference: fn(&Reference) -> String,
    pub ty: fn(&Type) -> String,
    pub declaration: fn(&VariableDeclaration, &mut GenerationContext, &dyn CodeGenerator) -> Result<()>,
}

/// Category dispatch shared by the language generators. Anything that is not
/// a core node kind is a generation error naming `generator`.
pub(crate) fn emit_core(
    generator: &str,
    syntax: &CoreSyntax,
    node: &dyn Node,
    out: &mut GenerationContext,
    dispatch: &dyn CodeGenerator,
) -> Result<()> {
    out.mark(node);
    match categorize(node) {
        Category::Literal(literal) => {
            out.append(&(syntax.literal)(literal));
        }
        Category::Reference(reference) => {
            out.append(&(syntax.reference)(reference));
        }
        Category::Block(block) => {
            out.append("{").end_line();
            emit_indented(&block.statements, out, dispatch)?;
            out.append("}");
        }
        _ => {
            if let Some(ty) = node.downcast_ref::<TypeNode>() {
                out.append(&(syntax.ty)(&ty.ty));
            } else if let Some(decl) = node.downcast_ref::<VariableDeclaration>() {
                (syntax.declaration)(decl, out, dispatch)?;
            } else if let Some(comment) = node.downcast_ref::<Comment>() {
                emit_comment(comment, out);
            } else {
                return Err(Error::generation(generator, node.kind_name()));
            }
        }
    }
    Ok(())
}

/// One `//` line per line of text, each at the current indent.
fn emit_comment(comment: &Comment, out: &mut GenerationContext) {
    if !out.options().include_comments {
        return;
    }
    let text = comment.text.replace("\r\n", "\n");
    for (i, line) in text.split(['\n', '\r']).enumerate() {
        if i > 0 {
            out.end_line();
        }
        if line.is_empty() {
            out.append("//");
        } else {
            out.append(&format!("// {line}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_identifier("java"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("kotlin-dsl"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn multi_line_comments_stay_comments() {
        use crate::ast::{node_ref, Block};
        use crate::codegen::{generate, GenerationOptions};

        let block = Block::new(vec![node_ref(Comment::new("a\nversion = 'evil'\r\n\nend"))]);
        let text = generate(&GroovyGenerator, &block, &GenerationOptions::default()).unwrap();
        assert_eq!(text, "{\n    // a\n    // version = 'evil'\n    //\n    // end\n}\n");
        assert!(text.lines().all(|line| line.trim_start().starts_with("//") || line == "{" || line == "}"));
    }
}
