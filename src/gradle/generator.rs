//! Gradle target generator.
//!
//! Renders the Gradle node kinds itself and hands every core node to the
//! language module's generator, passing itself along as `dispatch` so Gradle
//! nodes nested inside core blocks come back here.
use std::rc::Rc;

use crate::ast::{Node, NodeRef};
use crate::codegen::{emit_separated, CodeGenerator, GenerationContext};
use crate::context::LanguageFamily;
use crate::error::Result;
use crate::lang::{groovy, is_identifier, kotlin, GroovyGenerator, KotlinGenerator};

use super::nodes::{ComponentAccess, GradleScript, MavenRepository, MethodCall, PluginSpec, PropertyAssignment, ScriptBlock};

pub struct GradleGenerator {
    family: LanguageFamily,
    base: Rc<dyn CodeGenerator>,
}

impl std::fmt::Debug for GradleGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradleGenerator").field("family", &self.family).field("base", &self.base.name()).finish()
    }
}

impl GradleGenerator {
    pub fn new(family: LanguageFamily, base: Rc<dyn CodeGenerator>) -> Self {
        Self { family, base }
    }

    pub fn kotlin() -> Self {
        Self::new(LanguageFamily::Kotlin, Rc::new(KotlinGenerator))
    }

    pub fn groovy() -> Self {
        Self::new(LanguageFamily::Groovy, Rc::new(GroovyGenerator))
    }

    pub fn family(&self) -> LanguageFamily {
        self.family
    }

    fn quote(&self, value: &str) -> String {
        match self.family {
            LanguageFamily::Kotlin => kotlin::string_literal(value),
            LanguageFamily::Groovy => groovy::string_literal(value),
        }
    }

    fn emit_script(&self, script: &GradleScript, out: &mut GenerationContext, dispatch: &dyn CodeGenerator) -> Result<()> {
        for import in &script.imports {
            out.append_line(&format!("import {import}"));
        }
        if !script.imports.is_empty() && !script.statements.is_empty() {
            out.append_line("");
        }
        for statement in &script.statements {
            dispatch.emit(statement.as_ref(), out, dispatch)?;
            out.end_line();
        }
        Ok(())
    }

    fn emit_call(&self, call: &MethodCall, out: &mut GenerationContext, dispatch: &dyn CodeGenerator) -> Result<()> {
        if let Some(receiver) = &call.receiver {
            dispatch.emit(receiver.as_ref(), out, dispatch)?;
            out.append(".");
        }
        out.append(&call.name);

        // Groovy has no explicit type arguments; the class goes last in the argument list.
        let mut arguments: Vec<NodeRef> = call.arguments.clone();
        match self.family {
            LanguageFamily::Kotlin if !call.type_arguments.is_empty() => {
                out.append("<");
                emit_separated(&call.type_argument_nodes(), ", ", out, dispatch)?;
                out.append(">");
            }
            LanguageFamily::Kotlin => {}
            LanguageFamily::Groovy => arguments.extend(call.type_argument_nodes()),
        }

        if !(arguments.is_empty() && call.trailing_block.is_some()) {
            out.append("(");
            emit_separated(&arguments, ", ", out, dispatch)?;
            out.append(")");
        }
        if let Some(block) = &call.trailing_block {
            out.append(" ");
            dispatch.emit(block.as_ref(), out, dispatch)?;
        }
        Ok(())
    }

    fn emit_plugin(&self, plugin: &PluginSpec, out: &mut GenerationContext) {
        match self.family {
            LanguageFamily::Kotlin if plugin.core => out.append(&kotlin::name_text(&plugin.id)),
            LanguageFamily::Kotlin => out.append(&format!("id({})", self.quote(&plugin.id))),
            LanguageFamily::Groovy => out.append(&format!("id {}", self.quote(&plugin.id))),
        };
        if let Some(version) = &plugin.version {
            out.append(&format!(" version {}", self.quote(version)));
        }
        if let Some(apply) = plugin.apply {
            out.append(&format!(" apply {apply}"));
        }
    }

    fn emit_component(&self, component: &ComponentAccess, out: &mut GenerationContext) {
        let text = match self.family {
            LanguageFamily::Groovy if is_identifier(&component.name) => format!("components.{}", component.name),
            _ => format!("components[{}]", self.quote(&component.name)),
        };
        out.append(&text);
    }

    fn emit_repository(&self, repository: &MavenRepository, out: &mut GenerationContext) {
        match self.family {
            LanguageFamily::Kotlin => {
                out.append(&format!("maven({})", self.quote(&repository.url)));
            }
            LanguageFamily::Groovy => {
                out.append("maven {").end_line();
                out.indent();
                out.append(&format!("url {}", self.quote(&repository.url))).end_line();
                out.dedent();
                out.append("}");
            }
        }
    }
}

impl CodeGenerator for GradleGenerator {
    fn name(&self) -> &str {
        match self.family {
            LanguageFamily::Kotlin => "gradle-kotlin",
            LanguageFamily::Groovy => "gradle-groovy",
        }
    }

    fn emit(&self, node: &dyn Node, out: &mut GenerationContext, dispatch: &dyn CodeGenerator) -> Result<()> {
        if let Some(script) = node.downcast_ref::<GradleScript>() {
            out.mark(node);
            self.emit_script(script, out, dispatch)
        } else if let Some(assignment) = node.downcast_ref::<PropertyAssignment>() {
            out.mark(node);
            dispatch.emit(assignment.target.as_ref(), out, dispatch)?;
            out.append(" = ");
            dispatch.emit(assignment.value.as_ref(), out, dispatch)
        } else if let Some(block) = node.downcast_ref::<ScriptBlock>() {
            out.mark(node);
            out.append(&block.name).append(" ");
            dispatch.emit(block.body.as_ref(), out, dispatch)
        } else if let Some(call) = node.downcast_ref::<MethodCall>() {
            out.mark(node);
            self.emit_call(call, out, dispatch)
        } else if let Some(plugin) = node.downcast_ref::<PluginSpec>() {
            out.mark(node);
            self.emit_plugin(plugin, out);
            Ok(())
        } else if let Some(component) = node.downcast_ref::<ComponentAccess>() {
            out.mark(node);
            self.emit_component(component, out);
            Ok(())
        } else if let Some(repository) = node.downcast_ref::<MavenRepository>() {
            out.mark(node);
            self.emit_repository(repository, out);
            Ok(())
        } else {
            self.base.emit(node, out, dispatch)
        }
    }
}
