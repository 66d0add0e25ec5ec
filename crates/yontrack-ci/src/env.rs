use crate::error::{CiError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// Reads a file of `KEY=VALUE` lines.
///
/// Blank lines and `#` comments are skipped. Keys and values are trimmed and
/// only the first `=` separates them. A missing file gives an empty map.
pub fn read_env_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };

    let mut env = BTreeMap::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(CiError::EnvFormat {
                line: index + 1,
                content: line.to_string(),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(CiError::EmptyKey(index + 1));
        }
        env.insert(key.to_string(), value.trim().to_string());
    }
    Ok(env)
}

/// Splits a `KEY=VALUE` assignment on its first `=`.
pub fn parse_env_assignment(assignment: &str) -> Result<(String, String)> {
    assignment
        .split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| CiError::EnvAssignment(assignment.to_string()))
}

/// Sources of the environment passed to a CI configuration.
#[derive(Debug, Clone, Default)]
pub struct EnvSources<'a> {
    pub file: Option<&'a Path>,
    /// Process variables whose name starts with one of these are included.
    pub prefixes: &'a [String],
    /// `KEY=VALUE` assignments, applied last.
    pub assignments: &'a [String],
}

/// Merges the environment: file, then matching process variables, then
/// explicit assignments, later sources overriding earlier ones.
pub fn collect_env<I>(sources: &EnvSources<'_>, process_env: I) -> Result<BTreeMap<String, String>>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env = match sources.file {
        Some(file) => read_env_file(file)?,
        None => BTreeMap::new(),
    };

    if !sources.prefixes.is_empty() {
        env.extend(
            process_env
                .into_iter()
                .filter(|(key, _)| sources.prefixes.iter().any(|p| key.starts_with(p.as_str()))),
        );
    }

    for assignment in sources.assignments {
        let (key, value) = parse_env_assignment(assignment)?;
        env.insert(key, value);
    }
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_file(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ci.env");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_read_env_file() {
        let (_dir, path) = env_file(
            "# CI variables\n\nGIT_URL = git@github.com:nemerosa/ontrack.git\nQUERY=a=b\r\nEMPTY=\n",
        );
        let env = read_env_file(&path).unwrap();
        assert_eq!(env.len(), 3);
        assert_eq!(env["GIT_URL"], "git@github.com:nemerosa/ontrack.git");
        assert_eq!(env["QUERY"], "a=b");
        assert_eq!(env["EMPTY"], "");
    }

    #[test]
    fn test_missing_env_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_env_file(&dir.path().join("none.env")).unwrap().is_empty());
    }

    #[test]
    fn test_line_without_separator() {
        let (_dir, path) = env_file("A=1\nbroken line\n");
        let err = read_env_file(&path).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid env format at line 2: broken line (expected KEY=VALUE)"
        );
    }

    #[test]
    fn test_empty_key() {
        let (_dir, path) = env_file("\n\n = value\n");
        let err = read_env_file(&path).unwrap_err();
        assert_eq!(err.to_string(), "empty key at line 3");
    }

    #[test]
    fn test_collect_env_precedence() {
        let (_dir, path) = env_file("GIT_BRANCH=from-file\nFILE_ONLY=1\n");
        let prefixes = vec!["GIT_".to_string()];
        let assignments = vec!["GIT_URL=explicit".to_string()];
        let sources = EnvSources {
            file: Some(&path),
            prefixes: &prefixes,
            assignments: &assignments,
        };
        let process = vec![
            ("GIT_BRANCH".to_string(), "from-process".to_string()),
            ("GIT_URL".to_string(), "from-process".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ];

        let env = collect_env(&sources, process).unwrap();
        assert_eq!(env["GIT_BRANCH"], "from-process");
        assert_eq!(env["GIT_URL"], "explicit");
        assert_eq!(env["FILE_ONLY"], "1");
        assert!(!env.contains_key("HOME"));
    }

    #[test]
    fn test_process_env_ignored_without_prefix() {
        let env = collect_env(
            &EnvSources::default(),
            vec![("SECRET".to_string(), "x".to_string())],
        )
        .unwrap();
        assert!(env.is_empty());
    }

    #[test]
    fn test_invalid_assignment() {
        let assignments = vec!["NOVALUE".to_string()];
        let sources = EnvSources {
            assignments: &assignments,
            ..Default::default()
        };
        let err = collect_env(&sources, Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "invalid env format: NOVALUE (expected KEY=VALUE)");
    }
}
