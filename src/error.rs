//! Error taxonomy shared by every layer of the engine.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No factory or language module registered for the requested kind/name.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The language name is not one of the recognized target families.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// A name was defined twice in the same scope.
    #[error("symbol `{name}` already defined in scope `{scope}`")]
    DuplicateSymbol { name: String, scope: String },

    /// A generator received a node it has no rendering rule for.
    #[error("generator `{generator}` cannot render node `{node}`")]
    Generation { generator: String, node: String },

    /// Malformed build description handed to the Gradle front door.
    #[error("invalid input: {0}")]
    Input(String),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub fn generation(generator: impl Into<String>, node: impl Into<String>) -> Self {
        Error::Generation { generator: generator.into(), node: node.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
