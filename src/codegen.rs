//! Tree → text rendering.
//!
//! A [`CodeGenerator`] renders one node into a [`GenerationContext`], an
//! append-only buffer that tracks indentation. Generators compose by
//! delegation: `emit` receives the outermost generator as `dispatch` and
//! sends every child back through it, so a domain generator can hand a core
//! block to a language generator and still get its own nodes inside that
//! block rendered by itself.
use serde::{Deserialize, Serialize};

use crate::ast::{Node, NodeRef, SourceLocation};
use crate::error::Result;

// ————————————————————————————————————————————————————————————————————————————
// OPTIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub indent: String,
    pub line_ending: String,
    pub include_comments: bool,
    pub include_source_map: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            line_ending: "\n".to_string(),
            include_comments: true,
            include_source_map: false,
        }
    }
}

impl GenerationOptions {
    pub fn tabs() -> Self {
        Self { indent: "\t".to_string(), ..Self::default() }
    }

    pub fn with_indent_size(size: usize) -> Self {
        Self { indent: " ".repeat(size), ..Self::default() }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BUFFER
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapEntry {
    /// 1-based output position.
    pub line: usize,
    pub column: usize,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutput {
    pub text: String,
    pub source_map: Vec<SourceMapEntry>,
}

#[derive(Debug)]
pub struct GenerationContext {
    options: GenerationOptions,
    output: String,
    indent_level: usize,
    at_line_start: bool,
    line: usize,
    line_len: usize,
    source_map: Vec<SourceMapEntry>,
}

impl GenerationContext {
    pub fn new(options: GenerationOptions) -> Self {
        Self {
            options,
            output: String::new(),
            indent_level: 0,
            at_line_start: true,
            line: 1,
            line_len: 0,
            source_map: Vec::new(),
        }
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Appends to the current line, writing the indent first when the line is fresh.
    pub fn append(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        if self.at_line_start {
            let indent = self.current_indent();
            self.line_len += indent.chars().count();
            self.output.push_str(&indent);
            self.at_line_start = false;
        }
        self.line_len += text.chars().count();
        self.output.push_str(text);
        self
    }

    /// Appends `text` (if any) and terminates the line.
    pub fn append_line(&mut self, text: &str) -> &mut Self {
        self.append(text);
        self.output.push_str(&self.options.line_ending);
        self.at_line_start = true;
        self.line += 1;
        self.line_len = 0;
        self
    }

    /// Terminates the current line unless nothing was written on it yet.
    pub fn end_line(&mut self) -> &mut Self {
        if !self.at_line_start {
            self.append_line("");
        }
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.indent_level += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        debug_assert!(self.indent_level > 0, "unbalanced dedent");
        self.indent_level = self.indent_level.saturating_sub(1);
        self
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    pub fn current_indent(&self) -> String {
        self.options.indent.repeat(self.indent_level)
    }

    /// Records where `node` starts in the output, if source maps are on and
    /// the node knows where it came from.
    pub fn mark(&mut self, node: &dyn Node) {
        if !self.options.include_source_map {
            return;
        }
        let Some(location) = node.metadata().source_location.clone() else {
            return;
        };
        let column = if self.at_line_start {
            self.current_indent().chars().count() + 1
        } else {
            self.line_len + 1
        };
        self.source_map.push(SourceMapEntry { line: self.line, column, location });
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> GenerationOutput {
        GenerationOutput { text: self.output, source_map: self.source_map }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// GENERATORS
// ————————————————————————————————————————————————————————————————————————————

pub trait CodeGenerator {
    /// Used in diagnostics.
    fn name(&self) -> &str;

    /// Renders `node`. Children must be rendered through `dispatch`, never
    /// through `self` directly. A node without a rendering rule is an error.
    fn emit(&self, node: &dyn Node, out: &mut GenerationContext, dispatch: &dyn CodeGenerator) -> Result<()>;
}

impl dyn CodeGenerator + '_ {
    pub fn generate(&self, node: &dyn Node, options: &GenerationOptions) -> Result<String> {
        generate(self, node, options)
    }

    pub fn generate_output(&self, node: &dyn Node, options: &GenerationOptions) -> Result<GenerationOutput> {
        generate_output(self, node, options)
    }
}

pub fn generate(generator: &dyn CodeGenerator, node: &dyn Node, options: &GenerationOptions) -> Result<String> {
    generate_output(generator, node, options).map(|out| out.text)
}

/// One fresh buffer per call; on error nothing is returned, not even a prefix.
pub fn generate_output(
    generator: &dyn CodeGenerator,
    node: &dyn Node,
    options: &GenerationOptions,
) -> Result<GenerationOutput> {
    tracing::debug!(generator = generator.name(), root = node.kind_name(), "generating");
    let mut out = GenerationContext::new(options.clone());
    if let Err(err) = generator.emit(node, &mut out, generator) {
        tracing::warn!(generator = generator.name(), %err, "generation failed");
        return Err(err);
    }
    out.end_line();
    Ok(out.into_output())
}

/// Indents, renders each statement on its own line through `dispatch`, dedents.
pub fn emit_indented(statements: &[NodeRef], out: &mut GenerationContext, dispatch: &dyn CodeGenerator) -> Result<()> {
    out.indent();
    for statement in statements {
        if let Err(err) = dispatch.emit(statement.as_ref(), out, dispatch) {
            out.dedent();
            return Err(err);
        }
        out.end_line();
    }
    out.dedent();
    Ok(())
}

/// Renders `items` inline, separated by `separator`.
pub fn emit_separated(
    items: &[NodeRef],
    separator: &str,
    out: &mut GenerationContext,
    dispatch: &dyn CodeGenerator,
) -> Result<()> {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.append(separator);
        }
        dispatch.emit(item.as_ref(), out, dispatch)?;
    }
    Ok(())
}
