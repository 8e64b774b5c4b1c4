//! Multi-target AST construction and code generation.
//!
//! Builders assemble one tree of typed nodes; target generators render it as
//! Kotlin or Groovy source. The Gradle module is the bundled consumer.
pub mod ast;
pub mod codegen;
pub mod context;
pub mod dsl;
pub mod error;
pub mod gradle;
pub mod lang;
pub mod path_de;
pub mod scope;
pub mod types;
pub mod visit;

pub use error::{Error, Result};
