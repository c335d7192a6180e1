use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Variables and working directory of one demo shell.
///
/// Entering a nested shell hands it a copy, so changes made there are dropped on `exit`.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory of the shell.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Resolve a `cd` target the way a shell does.
    ///
    /// No target (or an empty one) means `$HOME`; relative targets are taken from
    /// `current_dir`. The result is canonical and must exist.
    pub fn resolve_dir(&self, target: Option<&str>) -> Result<PathBuf> {
        let target = match target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match self.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => anyhow::bail!("no target and HOME not set"),
            },
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            self.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("can't canonicalize {}", new_dir.display()))?;
        if !canonical.is_dir() {
            anyhow::bail!("{} is not a directory", canonical.display());
        }
        Ok(canonical)
    }

    /// Names of the subdirectories of `dir` starting with `prefix`, sorted.
    pub fn subdirs(dir: &Path, prefix: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;
    use std::collections::HashMap;
    use std::env as stdenv;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap(),
        };

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }

    fn make_unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let p = stdenv::temp_dir().join(format!("shell_demo_{}_{}_{}", tag, std::process::id(), nanos));
        fs::create_dir_all(&p).unwrap();
        fs::canonicalize(p).unwrap()
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let base = make_unique_temp_dir("resolve");
        fs::create_dir(base.join("inner")).unwrap();
        let env = Environment {
            vars: HashMap::new(),
            current_dir: base.clone(),
        };

        assert_eq!(env.resolve_dir(Some("inner")).unwrap(), base.join("inner"));
        assert_eq!(
            env.resolve_dir(Some(base.to_str().unwrap())).unwrap(),
            base
        );
        assert!(env.resolve_dir(Some("missing")).is_err());

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_resolve_defaults_to_home() {
        let home = make_unique_temp_dir("home");
        let mut env = Environment {
            vars: HashMap::new(),
            current_dir: stdenv::temp_dir(),
        };
        env.set_var("HOME", home.to_string_lossy().to_string());

        assert_eq!(env.resolve_dir(None).unwrap(), home);
        assert_eq!(env.resolve_dir(Some("")).unwrap(), home);

        let _ = fs::remove_dir_all(&home);
    }

    #[test]
    fn test_resolve_rejects_files() {
        let base = make_unique_temp_dir("file");
        fs::write(base.join("plain.txt"), "x").unwrap();
        let env = Environment {
            vars: HashMap::new(),
            current_dir: base.clone(),
        };
        assert!(env.resolve_dir(Some("plain.txt")).is_err());
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_subdirs_filters_by_prefix() {
        let base = make_unique_temp_dir("subdirs");
        for name in ["alpha", "beta", "also"] {
            fs::create_dir(base.join(name)).unwrap();
        }
        fs::write(base.join("afile"), "x").unwrap();

        assert_eq!(Environment::subdirs(&base, "a"), vec!["alpha", "also"]);
        assert_eq!(Environment::subdirs(&base, ""), vec!["alpha", "also", "beta"]);
        assert!(Environment::subdirs(&base.join("nowhere"), "").is_empty());

        let _ = fs::remove_dir_all(&base);
    }
}
