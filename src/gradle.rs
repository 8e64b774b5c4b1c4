//! Gradle build scripts, rendered as `build.gradle.kts` or `build.gradle`.
pub mod builder;
pub mod generator;
pub mod nodes;
pub mod script;

use std::any::Any;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::codegen::CodeGenerator;
use crate::context::{Context, CODE_GENERATOR, CURRENT_SCOPE, IMPORTS, LANGUAGE};
use crate::dsl::{BuildDsl, Dsl, DslContext, DslFactory, DslKind};
use crate::error::{Error, Result};

pub use builder::{BlockBuilder, GradleRootBuilder};
pub use generator::GradleGenerator;
pub use nodes::{ComponentAccess, GradleScript, MavenRepository, MethodCall, PluginSpec, PropertyAssignment, ScriptBlock};
pub use script::BuildScript;

#[derive(Debug)]
pub struct GradleDsl {
    context: Rc<DslContext>,
    generator: Rc<GradleGenerator>,
}

impl GradleDsl {
    pub fn gradle_generator(&self) -> &GradleGenerator {
        &self.generator
    }
}

impl Dsl for GradleDsl {
    fn kind(&self) -> DslKind {
        DslKind::Gradle
    }

    fn context(&self) -> &Rc<DslContext> {
        &self.context
    }

    fn code_generator(&self) -> Rc<dyn CodeGenerator> {
        self.generator.clone()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl BuildDsl for GradleDsl {
    type Builder = GradleRootBuilder;

    /// Every builder works in a child context with a fresh scope and import
    /// set, so nothing declared in one tree is visible to the next.
    fn builder(&self) -> GradleRootBuilder {
        let context = self.context.create_dsl_child();
        if let Ok(scope) = self.context.scope() {
            context.bind(CURRENT_SCOPE, scope.create_child("script"));
        }
        context.bind(IMPORTS, BTreeSet::new());
        GradleRootBuilder::new(context)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GradleFactory;

impl DslFactory for GradleFactory {
    fn kind(&self) -> DslKind {
        DslKind::Gradle
    }

    fn create(&self, context: Rc<Context>) -> Result<Box<dyn Dsl>> {
        let language = context
            .resolve(LANGUAGE)
            .ok_or_else(|| Error::configuration("gradle context has no language"))?;
        let base = context
            .resolve(CODE_GENERATOR)
            .ok_or_else(|| Error::configuration("gradle context has no code generator"))?;

        let context = DslContext::new(context, DslKind::Gradle);
        context.register_reference("publishing", "PublishingExtension");
        context.register_reference("components", "SoftwareComponentContainer");
        let generator = Rc::new(GradleGenerator::new(language.family, base));
        Ok(Box::new(GradleDsl { context, generator }))
    }
}
