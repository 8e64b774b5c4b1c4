use anyhow::{anyhow, Context as _, Result};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

/// Runs a jq filter over one document; every output becomes its own document.
pub fn preprocess(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader.load(&arena, program).map_err(parse_errors)?;
    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut documents = Vec::new();
    for (index, output) in outputs.enumerate() {
        let output = output.map_err(|e| anyhow!("jq output #{index}: {e:?}"))?;
        let text = output.to_string();
        let document = serde_json::from_str(&text).with_context(|| format!("jq output #{index} is not JSON: {text}"))?;
        documents.push(document);
    }
    Ok(documents)
}

fn parse_errors(errs: Vec<(load::File<&str, ()>, load::Error<&str>)>) -> anyhow::Error {
    let lines: Vec<String> = errs
        .into_iter()
        .map(|(file, err)| format!("cannot parse jq filter `{}`: {err:?}", file.code))
        .collect();
    anyhow!(lines.join("\n"))
}

fn undefined_errors(errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>) -> anyhow::Error {
    let lines: Vec<String> = errs
        .into_iter()
        .flat_map(|(file, list)| {
            list.into_iter()
                .map(move |(name, undef)| format!("jq filter `{}` uses undefined `{name}` ({undef:?})", file.code))
        })
        .collect();
    anyhow!(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn every_output_is_kept_in_order() {
        let input = json!({"group": "g", "modules": ["core", "cli"]});
        let out = preprocess(".modules[] | {group: \"g\", name: .}", &input).unwrap();
        assert_eq!(out, vec![json!({"group": "g", "name": "core"}), json!({"group": "g", "name": "cli"})]);
    }

    #[test]
    fn empty_filter_yields_no_documents() {
        assert!(preprocess("empty", &json!({})).unwrap().is_empty());
    }

    #[test]
    fn bad_filters_are_reported() {
        assert!(preprocess(".[", &json!({})).unwrap_err().to_string().contains("cannot parse jq filter"));
        assert!(preprocess("nosuchfn", &json!({})).unwrap_err().to_string().contains("undefined"));
    }
}
