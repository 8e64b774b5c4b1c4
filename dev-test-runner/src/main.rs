//! Golden-file check: renders every `fixtures/*.json` through both targets
//! and compares with the `.gradle.kts` / `.gradle` files next to it.
//!
//! `dev-test-runner [FIXTURES_DIR] [--bless]`; `--bless` rewrites the goldens.
use std::path::{Path, PathBuf};

use colored::Colorize;

use polydsl::codegen::GenerationOptions;
use polydsl::dsl::DslManager;
use polydsl::gradle::BuildScript;

const TARGETS: [(&str, &str); 2] = [("kotlin", "gradle.kts"), ("groovy", "gradle")];

/// Goldens checked out on Windows may carry `\r\n`; rendering always uses `\n`.
fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

enum Outcome {
    Pass,
    Blessed,
    Fail(String),
}

fn check(manager: &DslManager, json: &Path, language: &str, golden: &Path, bless: bool) -> Outcome {
    let rendered = std::fs::read_to_string(json)
        .map_err(|e| e.to_string())
        .and_then(|src| BuildScript::from_json(&src).map_err(|e| e.to_string()))
        .and_then(|script| script.render(manager, language, &GenerationOptions::default()).map_err(|e| e.to_string()));
    let rendered = match rendered {
        Ok(text) => text,
        Err(error) => return Outcome::Fail(error),
    };
    if bless {
        return match std::fs::write(golden, &rendered) {
            Ok(()) => Outcome::Blessed,
            Err(error) => Outcome::Fail(error.to_string()),
        };
    }
    let expected = match std::fs::read_to_string(golden) {
        Ok(text) => normalize_line_endings(&text),
        Err(error) => return Outcome::Fail(format!("{}: {error}", golden.display())),
    };
    if expected == rendered {
        return Outcome::Pass;
    }
    let lines = expected.lines().count().max(rendered.lines().count());
    let mismatch = expected
        .lines()
        .chain(std::iter::repeat(""))
        .zip(rendered.lines().chain(std::iter::repeat("")))
        .take(lines)
        .enumerate()
        .find(|(_, (want, got))| want != got);
    match mismatch {
        Some((line, (want, got))) => {
            Outcome::Fail(format!("line {}:\n  expected: {want:?}\n  rendered: {got:?}", line + 1))
        }
        None => Outcome::Fail("line endings differ".to_string()),
    }
}

fn main() {
    let mut bless = false;
    let mut dir = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures"));
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--bless" => bless = true,
            other => dir = PathBuf::from(other),
        }
    }

    let mut fixtures: Vec<PathBuf> = match std::fs::read_dir(&dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect(),
        Err(error) => {
            eprintln!("{} {}: {error}", "error:".red().bold(), dir.display());
            std::process::exit(2);
        }
    };
    fixtures.sort();

    let manager = DslManager::new();
    let mut failed = 0;
    for json in &fixtures {
        for (language, extension) in TARGETS {
            let golden = json.with_extension(extension);
            let name = golden.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            match check(&manager, json, language, &golden, bless) {
                Outcome::Pass => println!("{} {name}", "PASS".green().bold()),
                Outcome::Blessed => println!("{} {name}", "BLESSED".yellow().bold()),
                Outcome::Fail(reason) => {
                    failed += 1;
                    println!("{} {name}\n{reason}", "FAIL".red().bold());
                }
            }
        }
    }
    println!("{} fixtures, {} checks, {failed} failed", fixtures.len(), fixtures.len() * TARGETS.len());
    if failed > 0 {
        std::process::exit(1);
    }
}
