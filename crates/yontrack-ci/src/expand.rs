use crate::error::{CiError, Result};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Expands `@path` references, resolving top-level relative paths against
/// the current directory.
///
/// ```
/// let expanded = yontrack_ci::expand_config("name: demo\nlabels: [a, b]\n")?;
/// assert!(expanded.contains("name: demo"));
/// # Ok::<(), yontrack_ci::CiError>(())
/// ```
pub fn expand_config(initial: &str) -> Result<String> {
    expand(initial, None)
}

/// Same as [`expand_config`], resolving top-level relative paths against
/// `base`.
pub fn expand_config_from(initial: &str, base: &Path) -> Result<String> {
    expand(initial, Some(base))
}

fn expand(initial: &str, base: Option<&Path>) -> Result<String> {
    let data: Value = serde_yaml::from_str(initial).map_err(CiError::ParseInitial)?;
    let mut visiting = Vec::new();
    let expanded = expand_node(data, base, &mut visiting)?;
    serde_yaml::to_string(&expanded).map_err(CiError::Serialize)
}

/// `visiting` holds the files being expanded, outermost first.
fn expand_node(node: Value, base: Option<&Path>, visiting: &mut Vec<PathBuf>) -> Result<Value> {
    match node {
        Value::String(s) => match s.strip_prefix('@') {
            Some(reference) => expand_file(reference, base, visiting),
            None => Ok(Value::String(s)),
        },
        Value::Mapping(mapping) => {
            let mut result = serde_yaml::Mapping::with_capacity(mapping.len());
            for (key, value) in mapping {
                result.insert(key, expand_node(value, base, visiting)?);
            }
            Ok(Value::Mapping(result))
        }
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| expand_node(item, base, visiting))
            .collect::<Result<Vec<_>>>()
            .map(Value::Sequence),
        Value::Tagged(mut tagged) => {
            let value = std::mem::replace(&mut tagged.value, Value::Null);
            tagged.value = expand_node(value, base, visiting)?;
            Ok(Value::Tagged(tagged))
        }
        other => Ok(other),
    }
}

fn expand_file(reference: &str, base: Option<&Path>, visiting: &mut Vec<PathBuf>) -> Result<Value> {
    let reference = Path::new(reference);
    let path = match base {
        Some(base) if reference.is_relative() => base.join(reference),
        _ => reference.to_path_buf(),
    };

    let content = fs::read_to_string(&path).map_err(|source| CiError::ReadFile {
        path: path.clone(),
        source,
    })?;

    let identity = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
    if visiting.contains(&identity) {
        return Err(CiError::Cycle(path));
    }

    let parsed: Value = serde_yaml::from_str(&content).map_err(|source| CiError::ParseFile {
        path: path.clone(),
        source,
    })?;

    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    visiting.push(identity);
    let expanded = expand_node(parsed, Some(&dir), visiting);
    visiting.pop();
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_plain_yaml_is_unchanged() {
        let out = expand_config("name: test-project\nversion: 1.0.0\nenabled: true\n").unwrap();
        assert!(out.contains("name: test-project"));
        assert!(out.contains("version: 1.0.0"));
        assert!(out.contains("enabled: true"));
    }

    #[test]
    fn test_absolute_file_reference() {
        let dir = tempfile::tempdir().unwrap();
        let external = write(&dir, "external.yaml", "external: true\nvalue: 42\n");
        let input = format!("name: main\nconfig: \"@{}\"\n", external.display());

        let out = parse(&expand_config(&input).unwrap());
        assert_eq!(out["config"]["external"], Value::Bool(true));
        assert_eq!(out["config"]["value"], parse("42"));
        assert_eq!(out["name"], parse("main"));
    }

    #[test]
    fn test_missing_file() {
        let err = expand_config("config: \"@/nonexistent/file.yaml\"\n").unwrap_err();
        assert!(
            err.to_string()
                .starts_with("failed to read file /nonexistent/file.yaml")
        );
    }

    #[test]
    fn test_nested_reference_is_relative_to_referencing_file() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "conf/level2.yaml", "deep: value\n");
        write(&dir, "conf/level1.yaml", "nested: \"@level2.yaml\"\n");

        let out = parse(&expand_config_from("root: \"@conf/level1.yaml\"\n", dir.path()).unwrap());
        assert_eq!(out["root"]["nested"]["deep"], parse("value"));
    }

    #[test]
    fn test_references_in_sequences() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "item.yaml", "id: 1\n");
        let input = "items:\n  - \"@item.yaml\"\n  - plain\n";

        let out = parse(&expand_config_from(input, dir.path()).unwrap());
        assert_eq!(out["items"][0]["id"], parse("1"));
        assert_eq!(out["items"][1], parse("plain"));
    }

    #[test]
    fn test_references_in_nested_maps() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "db.yaml", "host: localhost\nport: 5432\n");
        let input = "services:\n  database:\n    settings: \"@db.yaml\"\n";

        let out = parse(&expand_config_from(input, dir.path()).unwrap());
        assert_eq!(out["services"]["database"]["settings"]["port"], parse("5432"));
    }

    #[test]
    fn test_at_sign_of_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = expand_config_from("owner: \"@username\"\n", dir.path()).unwrap_err();
        assert!(matches!(err, CiError::ReadFile { .. }));
    }

    #[test]
    fn test_referenced_file_must_be_yaml() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "bad.yaml", "key: [unclosed\n");
        let err = expand_config_from("x: \"@bad.yaml\"\n", dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse YAML from "));
    }

    #[test]
    fn test_invalid_initial_yaml() {
        let err = expand_config("a: [b\n").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse initial YAML"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "a.yaml", "next: \"@b.yaml\"\n");
        write(&dir, "b.yaml", "back: \"@a.yaml\"\n");
        let err = expand_config_from("start: \"@a.yaml\"\n", dir.path()).unwrap_err();
        assert!(matches!(err, CiError::Cycle(_)));
    }

    #[test]
    fn test_same_file_twice_is_not_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "shared.yaml", "k: v\n");
        let input = "one: \"@shared.yaml\"\ntwo: \"@shared.yaml\"\n";
        let out = parse(&expand_config_from(input, dir.path()).unwrap());
        assert_eq!(out["one"], out["two"]);
    }
}
