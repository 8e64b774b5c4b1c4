//! Command line: JSON build descriptions → (build.gradle.kts | build.gradle)
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use polydsl::codegen::GenerationOptions;
use polydsl::context::LanguageFamily;
use polydsl::dsl::DslManager;
use polydsl::gradle::BuildScript;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// render Gradle build descriptions (JSON) as Kotlin or Groovy build scripts
#[derive(Parser, Debug)]
#[command(name = "polydsl", version)]
pub struct CommandLineInterface {
    /// debug-level logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// render one build script per input document
    Render(RenderOut),
    /// list registered DSL kinds and language modules
    Languages,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (one build description per line)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select the build description in each document (e.g. /build)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is rendered
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct FormatSettings {
    /// spaces per indent level
    #[arg(long, default_value_t = 4)]
    indent: usize,

    /// indent with tabs instead of spaces
    #[arg(long, conflicts_with = "indent")]
    tabs: bool,

    /// end lines with \r\n
    #[arg(long)]
    crlf: bool,

    /// drop `// comment` lines
    #[arg(long)]
    no_comments: bool,
}

#[derive(clap::Parser, Debug)]
struct RenderOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    format_settings: FormatSettings,

    /// target language: kotlin or groovy (case-insensitive)
    #[arg(long, short, default_value = "kotlin")]
    language: String,

    /// write `<stem>.gradle.kts` / `<stem>.gradle` files here (stdout if omitted)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

/// One build description and where it came from.
#[derive(Debug)]
struct Document {
    origin: PathBuf,
    /// Position within its file when the file yields more than one.
    index: Option<usize>,
    value: serde_json::Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read {}", source_path.display()))?;
            let mut values = Vec::new();
            for raw in self.split(&source) {
                let value = serde_json::from_str::<serde_json::Value>(raw)
                    .with_context(|| format!("failed to parse JSON in {}", source_path.display()))?;
                values.extend(self.select(value, &source_path)?);
            }
            let many = values.len() > 1;
            documents.extend(values.into_iter().enumerate().map(|(i, value)| Document {
                origin: source_path.clone(),
                index: many.then_some(i),
                value,
            }));
        }
        Ok(documents)
    }

    fn split<'a>(&self, source: &'a str) -> Vec<&'a str> {
        if self.ndjson {
            source.lines().filter(|line| !line.trim().is_empty()).collect()
        } else {
            vec![source]
        }
    }

    fn select(&self, value: serde_json::Value, origin: &Path) -> Result<Vec<serde_json::Value>> {
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(pointer) => value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("{}: nothing at JSON pointer {pointer}", origin.display()))?,
        };
        match self.jq_expr.as_deref() {
            None => Ok(vec![value]),
            Some(jq_expr) => crate::jq_exec::preprocess(jq_expr, &value)
                .with_context(|| format!("failed to apply jq expression to {}", origin.display())),
        }
    }
}

impl FormatSettings {
    fn options(&self) -> GenerationOptions {
        let mut options =
            if self.tabs { GenerationOptions::tabs() } else { GenerationOptions::with_indent_size(self.indent) };
        if self.crlf {
            options.line_ending = "\r\n".to_string();
        }
        options.include_comments = !self.no_comments;
        options
    }
}

impl Document {
    fn label(&self) -> String {
        match self.index {
            Some(i) => format!("{}#{i}", self.origin.display()),
            None => self.origin.display().to_string(),
        }
    }

    fn output_path(&self, out_dir: &Path, family: LanguageFamily) -> PathBuf {
        let stem = self.origin.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "build".into());
        let stem = match self.index {
            Some(i) => format!("{stem}-{i}"),
            None => stem,
        };
        let extension = match family {
            LanguageFamily::Kotlin => "gradle.kts",
            LanguageFamily::Groovy => "gradle",
        };
        out_dir.join(format!("{stem}.{extension}"))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Render(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                target.run()
            }
            Command::Languages => {
                let manager = DslManager::new();
                let kinds: Vec<String> = manager.kinds().iter().map(|k| k.to_string()).collect();
                println!("{} {}", "kinds:".bold(), kinds.join(", "));
                for (name, language) in manager.module_names().iter().zip(manager.languages()) {
                    let features: Vec<String> = language.features.iter().map(|f| format!("{f:?}")).collect();
                    println!("{} ({}) {}", name.bold(), language.family, features.join(", "));
                }
                Ok(())
            }
        }
    }
}

impl RenderOut {
    fn run(&self) -> Result<()> {
        let Some(family) = LanguageFamily::from_name(&self.language) else {
            bail!("unsupported language: {}", self.language);
        };
        let options = self.format_settings.options();
        let documents = self.input_settings.load()?;
        tracing::debug!(documents = documents.len(), language = %family, "rendering");

        // The engine is single-threaded; every task gets its own manager and tree.
        let rendered: Vec<(&Document, polydsl::Result<String>)> = documents
            .par_iter()
            .map(|document| {
                let manager = DslManager::new();
                let text = BuildScript::from_value(document.value.clone())
                    .and_then(|script| script.render(&manager, &self.language, &options));
                (document, text)
            })
            .collect();

        let mut failures = 0;
        for (document, text) in &rendered {
            match text {
                Ok(text) => self.emit(document, family, text)?,
                Err(error) => {
                    failures += 1;
                    eprintln!("{} {}: {error}", "error:".red().bold(), document.label());
                }
            }
        }
        if failures > 0 {
            bail!("{failures} of {} build descriptions failed", rendered.len());
        }
        Ok(())
    }

    fn emit(&self, document: &Document, family: LanguageFamily, text: &str) -> Result<()> {
        match self.out_dir.as_ref() {
            Some(out_dir) => {
                std::fs::create_dir_all(out_dir)
                    .with_context(|| format!("failed to create {}", out_dir.display()))?;
                let path = document.output_path(out_dir, family);
                std::fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("{} {} → {}", "wrote".green(), document.label(), path.display());
            }
            None => print!("{text}"),
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let before = out.len();
        for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
            out.push(entry?);
        }
        if out.len() == before {
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(out)
}
