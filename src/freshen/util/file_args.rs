//! Expansion of `@FileArg(...)` references in command-line arguments.
//!
//! An argument such as `--classpath=@FileArg(gen/foo.build_config.json:deps:jars)`
//! is replaced by the value stored under `deps.jars` in the named JSON file.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context as _, bail};
use freshen_util::paths;
use serde_json::Value;

use crate::util::FreshenResult;
use crate::util::gn::to_gn_string;

const PREFIX: &str = "@FileArg(";

/// Replaces every `@FileArg(file:key:...)` reference found in `args`.
///
/// Lists are rendered as GN list literals, strings verbatim, and other
/// values as their JSON text. Each file is read once per call.
pub fn expand_file_args<S: AsRef<str>>(args: &[S]) -> FreshenResult<Vec<String>> {
    let mut files: HashMap<String, Value> = HashMap::new();
    let mut ret = Vec::with_capacity(args.len());
    for arg in args {
        let mut rest = arg.as_ref();
        let mut expanded = String::new();
        while let Some(start) = rest.find(PREFIX) {
            let body_start = start + PREFIX.len();
            let Some(len) = rest[body_start..].find(')') else {
                bail!("unterminated `@FileArg(` in argument `{}`", arg.as_ref());
            };
            let body = &rest[body_start..body_start + len];
            expanded.push_str(&rest[..start]);
            expanded.push_str(&lookup(&mut files, body)?);
            rest = &rest[body_start + len + 1..];
        }
        expanded.push_str(rest);
        ret.push(expanded);
    }
    Ok(ret)
}

fn lookup(files: &mut HashMap<String, Value>, body: &str) -> FreshenResult<String> {
    let mut parts = body.split(':');
    let file = parts.next().unwrap_or_default();
    let keys: Vec<&str> = parts.collect();
    if file.is_empty() || keys.is_empty() {
        bail!("expected `@FileArg(file:key...)`, found `@FileArg({})`", body);
    }

    if !files.contains_key(file) {
        let path = Path::new(file);
        let contents = paths::read(path)?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON in `{}`", path.display()))?;
        files.insert(file.to_string(), value);
    }
    let mut value = &files[file];
    for key in &keys {
        value = match value.get(*key) {
            Some(v) => v,
            None => bail!("key `{}` not found in `{}` (looking up `{}`)", key, file, body),
        };
    }

    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let items = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>();
            to_gn_string(&items)
        }
        other => other.to_string(),
    })
}
