//! Environment placeholder resolution
//!
//! Pipeline files can't reference deployment secrets directly, so values in
//! an env section may be written as `${{ name }}` and get substituted from
//! the environment namespace at deploy time. A value that isn't shaped like
//! a placeholder passes through untouched; a placeholder whose input is not
//! set is an error.

use regex::Regex;
use serde_yml::{Mapping, Value};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::{CoreError, Result};

/// Prefix under which the automation environment exposes step inputs
pub const INPUT_PREFIX: &str = "INPUT_";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$\{\{\s*(.*?)\s*\}\}$").expect("placeholder pattern is valid")
});

/// Source of values for placeholder substitution
///
/// Keeps the resolver independent of how inputs actually reach the process.
pub trait VarProvider {
    /// Get a value by its full key (e.g. `INPUT_TOKEN`)
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads values from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct InputEnv;

impl VarProvider for InputEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl VarProvider for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Return the name inside `${{ name }}`, or `None` if `value` is not a placeholder.
///
/// The whole string has to match; `${{ A }}x` is not a placeholder. An empty
/// name (`${{ }}`) is not one either.
pub fn extract_placeholder_name(value: &str) -> Option<&str> {
    let name = PLACEHOLDER.captures(value)?.get(1)?.as_str();
    (!name.is_empty()).then_some(name)
}

/// Key looked up for a placeholder name: `INPUT_` + uppercased name, spaces as `_`
pub fn lookup_key(name: &str) -> String {
    format!("{}{}", INPUT_PREFIX, name.replace(' ', "_").to_uppercase())
}

/// Resolve a single value, returning the substitute if it was a placeholder
fn resolve_value<V: VarProvider + ?Sized>(value: &str, provider: &V) -> Result<Option<String>> {
    let Some(name) = extract_placeholder_name(value) else {
        return Ok(None);
    };

    let key = lookup_key(name);
    match provider.get(&key) {
        Some(resolved) => Ok(Some(resolved)),
        None => Err(CoreError::MissingEnvironmentValue {
            name: name.to_string(),
            key,
        }),
    }
}

/// Substitute every placeholder value of an env mapping in place
///
/// Returns the number of values that were replaced.
pub fn resolve_env_map<V: VarProvider + ?Sized>(
    envs: &mut Mapping,
    provider: &V,
) -> Result<usize> {
    let mut resolved = 0;

    for (key, value) in envs.iter_mut() {
        let Value::String(current) = value else {
            continue;
        };
        if let Some(new_value) = resolve_value(current, provider)? {
            debug!(
                "Resolved env {:?} from placeholder",
                key.as_str().unwrap_or("<non-string>")
            );
            *current = new_value;
            resolved += 1;
        }
    }

    Ok(resolved)
}

/// Substitute placeholders in a list of `{key, value}` records in place
///
/// Records without a string `value` are skipped. Returns the number of
/// values that were replaced.
pub fn resolve_env_list<V: VarProvider + ?Sized>(
    entries: &mut [Value],
    provider: &V,
) -> Result<usize> {
    let mut resolved = 0;

    for entry in entries.iter_mut() {
        let Some(Value::String(current)) = entry.get_mut("value") else {
            continue;
        };
        if let Some(new_value) = resolve_value(current, provider)? {
            *current = new_value;
            resolved += 1;
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn mapping(yaml: &str) -> Mapping {
        serde_yml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_extract_placeholder_name() {
        assert_eq!(extract_placeholder_name("${{ FOO }}"), Some("FOO"));
        assert_eq!(extract_placeholder_name("${{FOO}}"), Some("FOO"));
        assert_eq!(extract_placeholder_name("${{  my secret  }}"), Some("my secret"));
        assert_eq!(extract_placeholder_name("plain"), None);
    }

    #[test]
    fn test_extract_requires_full_match() {
        assert_eq!(extract_placeholder_name("${{ FOO }}x"), None);
        assert_eq!(extract_placeholder_name("x${{ FOO }}"), None);
        assert_eq!(extract_placeholder_name("${ FOO }"), None);
    }

    #[test]
    fn test_extract_empty_name() {
        assert_eq!(extract_placeholder_name("${{ }}"), None);
        assert_eq!(extract_placeholder_name("${{}}"), None);
    }

    #[test]
    fn test_lookup_key() {
        assert_eq!(lookup_key("secret"), "INPUT_SECRET");
        assert_eq!(lookup_key("api key"), "INPUT_API_KEY");
    }

    #[test]
    fn test_resolve_env_map() {
        let mut envs = mapping("key: \"${{ secret }}\"\nplain: value\ncount: 3\n");
        let vars = provider(&[("INPUT_SECRET", "hunter2")]);

        let resolved = resolve_env_map(&mut envs, &vars).unwrap();

        assert_eq!(resolved, 1);
        assert_eq!(envs.get("key").and_then(Value::as_str), Some("hunter2"));
        assert_eq!(envs.get("plain").and_then(Value::as_str), Some("value"));
        assert_eq!(envs.get("count").and_then(Value::as_u64), Some(3));
    }

    #[test]
    fn test_resolve_env_map_missing_is_fatal() {
        let mut envs = mapping("key: \"${{ MISSING }}\"\n");
        let vars = provider(&[]);

        let err = resolve_env_map(&mut envs, &vars).unwrap_err();

        match err {
            CoreError::MissingEnvironmentValue { name, key } => {
                assert_eq!(name, "MISSING");
                assert_eq!(key, "INPUT_MISSING");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_env_list() {
        let mut entries: Vec<Value> = serde_yml::from_str(
            r#"
- key: token
  value: "${{ tok }}"
- value: literal
- key: no-value
"#,
        )
        .unwrap();
        let vars = provider(&[("INPUT_TOK", "abc")]);

        let resolved = resolve_env_list(&mut entries, &vars).unwrap();

        assert_eq!(resolved, 1);
        assert_eq!(entries[0].get("value").and_then(Value::as_str), Some("abc"));
        assert_eq!(entries[1].get("value").and_then(Value::as_str), Some("literal"));
        assert!(entries[2].get("value").is_none());
    }

    #[test]
    fn test_resolve_env_list_missing_is_fatal() {
        let mut entries: Vec<Value> =
            serde_yml::from_str("- key: a\n  value: \"${{ nope }}\"\n").unwrap();

        let err = resolve_env_list(&mut entries, &provider(&[])).unwrap_err();
        assert!(matches!(err, CoreError::MissingEnvironmentValue { .. }));
    }

    #[test]
    fn test_resolved_values_are_not_placeholders() {
        let mut envs = mapping("key: \"${{ tok }}\"\n");
        let vars = provider(&[("INPUT_TOK", "abc")]);

        resolve_env_map(&mut envs, &vars).unwrap();
        // a second pass over resolved values needs no inputs
        assert_eq!(resolve_env_map(&mut envs, &provider(&[])).unwrap(), 0);
    }
}
