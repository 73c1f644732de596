use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx SQLite connection URL, e.g. `sqlite:todo.db`.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directives.
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

const DEFAULT_CONFIG: &str = r#"
[database]
url = "sqlite:todo.db"

[log]
filter = "warn"
"#;

const ENV_PREFIX: &str = "TODO";

impl Configuration {
    /// Loads the defaults, then `~/.config/todo/todo.toml` when present, then
    /// `explicit` (which must exist), then `TODO_*` environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_sources(user_config_path().as_deref(), explicit, Some(environment()))
    }

    fn from_sources(
        user: Option<&Path>,
        explicit: Option<&Path>,
        env: Option<Environment>,
    ) -> Result<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));
        if let Some(path) = user {
            builder = builder.add_source(File::from(path).required(false));
        }
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }
        if let Some(env) = env {
            builder = builder.add_source(env);
        }
        let settings = builder.build()?;

        Ok(settings.try_deserialize::<Configuration>()?)
    }
}

/// `TODO_DATABASE__URL` maps to `database.url`.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/todo/todo.toml"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use config::Map;

    use super::{Configuration, environment};

    #[test]
    fn test_defaults() {
        let cfg = Configuration::from_sources(None, None, None).unwrap();
        assert_eq!(cfg.database.url, "sqlite:todo.db");
        assert_eq!(cfg.log.filter, "warn");
    }

    #[test]
    fn test_missing_user_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("todo.toml");
        let cfg = Configuration::from_sources(Some(&missing), None, None).unwrap();
        assert_eq!(cfg.database.url, "sqlite:todo.db");
    }

    #[test]
    fn test_explicit_file_overrides_user_file() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let explicit = dir.path().join("explicit.toml");
        fs::write(&user, "[database]\nurl = \"sqlite:user.db\"\n").unwrap();
        fs::write(
            &explicit,
            "[log]\nfilter = \"debug\"\n[database]\nurl = \"sqlite:explicit.db\"\n",
        )
        .unwrap();

        let cfg = Configuration::from_sources(Some(&user), None, None).unwrap();
        assert_eq!(cfg.database.url, "sqlite:user.db");
        assert_eq!(cfg.log.filter, "warn");

        let cfg = Configuration::from_sources(Some(&user), Some(&explicit), None).unwrap();
        assert_eq!(cfg.database.url, "sqlite:explicit.db");
        assert_eq!(cfg.log.filter, "debug");
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Configuration::from_sources(None, Some(&missing), None).is_err());
    }

    #[test]
    fn test_environment_overrides_files() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("explicit.toml");
        fs::write(&explicit, "[database]\nurl = \"sqlite:explicit.db\"\n").unwrap();

        let mut vars = Map::new();
        vars.insert(
            "TODO_DATABASE__URL".to_string(),
            "sqlite:from-env.db".to_string(),
        );
        vars.insert("TODO_LOG__FILTER".to_string(), "todo=trace".to_string());
        let env = environment().source(Some(vars));

        let cfg = Configuration::from_sources(None, Some(&explicit), Some(env)).unwrap();
        assert_eq!(cfg.database.url, "sqlite:from-env.db");
        assert_eq!(cfg.log.filter, "todo=trace");
    }
}
