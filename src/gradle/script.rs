//! JSON build descriptions.
//!
//! A [`BuildScript`] is the declarative form of a Gradle script: it is
//! replayed onto a [`GradleRootBuilder`] and rendered through either target.
//!
//! ```json
//! {
//!   "group": "com.example",
//!   "plugins": ["java", {"id": "com.gradle.plugin-publish", "version": "1.3.1"}],
//!   "repositories": ["mavenCentral", {"maven": {"url": "https://repo.example.com"}}],
//!   "vals": {"signingKey": ""},
//!   "signing": {"key": {"ref": "signingKey"}, "password": "secret"}
//! }
//! ```
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ast::{node_ref, Literal, NodeRef};
use crate::codegen::GenerationOptions;
use crate::dsl::{BuildDsl, Dsl, DslKind, DslManager};
use crate::error::{Error, Result};
use crate::path_de;

use super::builder::{reference, GradleRootBuilder, PublicationsBuilder, RepositoriesBuilder};
use super::GradleDsl;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildScript {
    pub imports: Vec<String>,
    pub comment: Option<String>,
    pub plugins: Vec<PluginDescription>,
    pub group: Option<String>,
    pub version: Option<String>,
    pub vals: IndexMap<String, ValueDescription>,
    pub properties: IndexMap<String, ValueDescription>,
    pub repositories: Vec<RepositoryDescription>,
    pub publishing: Option<PublishingDescription>,
    pub signing: Option<SigningDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginDescription {
    /// Bare name: a core plugin (`java`, `kotlin-dsl`).
    Core(String),
    Id {
        id: String,
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        apply: Option<bool>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepositoryDescription {
    MavenCentral,
    MavenLocal,
    Google,
    GradlePluginPortal,
    Maven { url: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishingDescription {
    pub repositories: Vec<RepositoryDescription>,
    pub publications: Vec<PublicationDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PublicationDescription {
    pub name: String,
    #[serde(rename = "type", default = "maven_publication")]
    pub type_name: String,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

fn maven_publication() -> String {
    "MavenPublication".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SigningDescription {
    pub key: ValueDescription,
    pub password: ValueDescription,
    #[serde(default = "yes")]
    pub sign_publications: bool,
}

fn yes() -> bool {
    true
}

/// Either `{"ref": "a.b"}` or a JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueDescription {
    Reference {
        #[serde(rename = "ref")]
        path: String,
    },
    Literal(serde_json::Value),
}

impl ValueDescription {
    pub fn to_node(&self) -> Result<NodeRef> {
        use serde_json::Value;
        let literal = match self {
            ValueDescription::Reference { path } => return Ok(reference(path)),
            ValueDescription::Literal(Value::String(s)) => Literal::string(s.clone()),
            ValueDescription::Literal(Value::Bool(b)) => Literal::boolean(*b),
            ValueDescription::Literal(Value::Null) => Literal::null(),
            ValueDescription::Literal(Value::Number(n)) => match n.as_i64() {
                Some(i) => Literal::integer(i),
                None => Literal::float(n.as_f64().unwrap_or(f64::NAN)),
            },
            ValueDescription::Literal(other) => {
                return Err(Error::Input(format!("expected a scalar or a reference, found {other}")));
            }
        };
        Ok(node_ref(literal))
    }
}

impl BuildScript {
    pub fn from_json(src: &str) -> Result<Self> {
        path_de::from_str_with_path(src)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        path_de::from_value_with_path(value)
    }

    /// Replays the description in a fixed order: imports, comment, plugins,
    /// coordinates, vals, properties, repositories, publishing, signing.
    pub fn apply(&self, root: &mut GradleRootBuilder) -> Result<()> {
        for import in &self.imports {
            root.import(import);
        }
        if let Some(comment) = &self.comment {
            root.comment(comment);
        }
        if !self.plugins.is_empty() {
            root.plugins(|plugins| {
                for plugin in &self.plugins {
                    match plugin {
                        PluginDescription::Core(name) => {
                            plugins.core(name);
                        }
                        PluginDescription::Id { id, version, apply } => {
                            let spec = plugins.id(id);
                            if let Some(version) = version {
                                spec.version(version.as_str());
                            }
                            if let Some(apply) = apply {
                                spec.apply(*apply);
                            }
                        }
                    }
                }
            });
        }
        if let Some(group) = &self.group {
            root.set_group(group);
        }
        if let Some(version) = &self.version {
            root.set_version(version);
        }
        for (name, value) in &self.vals {
            root.val(name, None, value.to_node()?)?;
        }
        for (name, value) in &self.properties {
            root.property(name, value.to_node()?);
        }
        if !self.repositories.is_empty() {
            root.repositories(|repositories| add_repositories(repositories, &self.repositories));
        }
        if let Some(publishing) = &self.publishing {
            root.publishing(|p| {
                if !publishing.repositories.is_empty() {
                    p.repositories(|repositories| add_repositories(repositories, &publishing.repositories));
                }
                if !publishing.publications.is_empty() {
                    p.publications(|publications| add_publications(publications, &publishing.publications));
                }
            });
        }
        if let Some(signing) = &self.signing {
            let key = signing.key.to_node()?;
            let password = signing.password.to_node()?;
            root.signing(|s| {
                s.use_in_memory_pgp_keys(key, password);
                if signing.sign_publications {
                    s.sign_publications();
                }
            })?;
        }
        Ok(())
    }

    /// Builds and renders through a fresh Gradle DSL for `language`.
    pub fn render(&self, manager: &DslManager, language: &str, options: &GenerationOptions) -> Result<String> {
        let dsl = manager.create::<GradleDsl>(DslKind::Gradle, language)?;
        let root = dsl.build(|root| self.apply(root))?;
        let root = dsl.execute(root);
        dsl.generate_with(root.as_ref(), options)
    }
}

fn add_repositories(builder: &mut RepositoriesBuilder, repositories: &[RepositoryDescription]) {
    for repository in repositories {
        match repository {
            RepositoryDescription::MavenCentral => builder.maven_central(),
            RepositoryDescription::MavenLocal => builder.maven_local(),
            RepositoryDescription::Google => builder.google(),
            RepositoryDescription::GradlePluginPortal => builder.gradle_plugin_portal(),
            RepositoryDescription::Maven { url } => builder.maven(url),
        };
    }
}

fn add_publications(builder: &mut PublicationsBuilder, publications: &[PublicationDescription]) {
    for publication in publications {
        builder.create(&publication.name, &publication.type_name, |p| {
            if let Some(component) = &publication.component {
                p.from_component(component);
            }
            if let Some(group_id) = &publication.group_id {
                p.group_id(group_id);
            }
            if let Some(artifact_id) = &publication.artifact_id {
                p.artifact_id(artifact_id);
            }
            if let Some(version) = &publication.version {
                p.version(version);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SCRIPT: &str = r#"{
        "plugins": ["java", {"id": "com.gradle.plugin-publish", "version": "1.3.1"}],
        "group": "test",
        "vals": {"signingKey": ""},
        "publishing": {
            "repositories": ["mavenLocal"],
            "publications": [{"name": "java", "component": "java"}]
        },
        "signing": {"key": {"ref": "signingKey"}, "password": "pw"}
    }"#;

    #[test]
    fn renders_kotlin() {
        let script = BuildScript::from_json(SCRIPT).unwrap();
        let text = script.render(&DslManager::new(), "kotlin", &GenerationOptions::default()).unwrap();
        assert_eq!(
            text,
            r#"plugins {
    java
    id("com.gradle.plugin-publish") version "1.3.1"
}
group = "test"
val signingKey = ""
publishing {
    repositories {
        mavenLocal()
    }
    publications {
        create<MavenPublication>("java") {
            from(components["java"])
        }
    }
}
signing {
    useInMemoryPgpKeys(signingKey, "pw")
    sign(publishing.publications)
}
"#
        );
    }

    #[test]
    fn renders_groovy() {
        let script = BuildScript::from_json(SCRIPT).unwrap();
        let text = script.render(&DslManager::new(), "Groovy", &GenerationOptions::default()).unwrap();
        assert_eq!(
            text,
            r#"plugins {
    id 'java'
    id 'com.gradle.plugin-publish' version '1.3.1'
}
group = 'test'
def signingKey = ''
publishing {
    repositories {
        mavenLocal()
    }
    publications {
        create('java', MavenPublication) {
            from(components.java)
        }
    }
}
signing {
    useInMemoryPgpKeys(signingKey, 'pw')
    sign(publishing.publications)
}
"#
        );
    }

    #[test]
    fn malformed_descriptions_are_input_errors() {
        let err = BuildScript::from_json(r#"{"plugins": [42]}"#).unwrap_err();
        assert!(matches!(err, Error::Input(_)));

        let err = BuildScript::from_json(r#"{"grop": "x"}"#).unwrap_err();
        assert!(matches!(err, Error::Input(ref m) if m.contains("grop")), "{err}");
    }

    #[test]
    fn non_scalar_values_are_input_errors() {
        let script = BuildScript::from_json(r#"{"properties": {"description": [1, 2]}}"#).unwrap();
        let err = script.render(&DslManager::new(), "kotlin", &GenerationOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn numbers_keep_their_kind() {
        assert_eq!(
            ValueDescription::Literal(serde_json::json!(3)).to_node().unwrap().downcast_ref::<Literal>().unwrap().value,
            crate::ast::LiteralValue::Integer(3)
        );
        assert_eq!(
            ValueDescription::Literal(serde_json::json!(1.5)).to_node().unwrap().downcast_ref::<Literal>().unwrap().value,
            crate::ast::LiteralValue::Float(1.5.into())
        );
    }
}
