use anyhow::{Context, Result};
use common::{Consistency, SystemCrontab};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct CrontabConfig {
    /// Whose crontab to edit; the invoking user when unset
    pub user: Option<String>,
    pub program: PathBuf,
    pub settle_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

fn default_program() -> PathBuf { PathBuf::from(common::DEFAULT_CRONTAB_PROGRAM) }
fn default_settle_timeout() -> u64 { 500 }
fn default_poll_interval() -> u64 { 10 }

impl Default for CrontabConfig {
    fn default() -> Self {
        Self {
            user: None,
            program: default_program(),
            settle_timeout_ms: default_settle_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub output: Option<PathBuf>,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: None,
        }
    }
}

/// Effective configuration: defaults overlaid with every loaded file
#[derive(Debug, Clone, Serialize, Default)]
pub struct Config {
    pub crontab: CrontabConfig,
    pub logging: LoggingConfig,
}

/// One config file as written. Keys left out keep the value of the layer below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub crontab: CrontabSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrontabSection {
    pub user: Option<String>,
    pub program: Option<PathBuf>,
    pub settle_timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub output: Option<PathBuf>,
}

impl ConfigFile {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(file)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let file: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(file)
    }

    /// Detect file type by extension and load
    pub fn from_file(path: &Path) -> Result<Self> {
        let ext = path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "toml" => Self::from_toml_file(path),
            _ => Err(anyhow::anyhow!("Unsupported config file format. Use .yaml, .yml, or .toml")),
        }
    }
}

impl Config {
    /// Overlay the keys present in `file`
    pub fn merge(&mut self, file: ConfigFile) {
        let ConfigFile { crontab, logging } = file;
        if crontab.user.is_some() {
            self.crontab.user = crontab.user;
        }
        if let Some(program) = crontab.program {
            self.crontab.program = program;
        }
        if let Some(ms) = crontab.settle_timeout_ms {
            self.crontab.settle_timeout_ms = ms;
        }
        if let Some(ms) = crontab.poll_interval_ms {
            self.crontab.poll_interval_ms = ms;
        }

        if let Some(level) = logging.level {
            self.logging.level = level;
        }
        if logging.output.is_some() {
            self.logging.output = logging.output;
        }
    }

    /// Defaults, then the system file, then the user file, then `explicit`.
    /// Only an explicit path is required to exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut layers = vec![PathBuf::from(common::DEFAULT_CONFIG_PATH)];
        if let Some(home) = std::env::var_os("HOME") {
            layers.push(PathBuf::from(home).join(common::USER_CONFIG_PATH));
        }
        layers.retain(|p| p.exists());
        layers.extend(explicit.map(Path::to_path_buf));
        Self::load_layers(&layers)
    }

    /// Overlay each file in order; later files win key by key
    pub fn load_layers(paths: &[PathBuf]) -> Result<Self> {
        let mut config = Config::default();
        for path in paths {
            log::trace!("loading config layer {:?}", path);
            config.merge(ConfigFile::from_file(path)?);
        }
        Ok(config)
    }

    pub fn consistency(&self) -> Consistency {
        Consistency {
            settle_timeout: Duration::from_millis(self.crontab.settle_timeout_ms),
            poll_interval: Duration::from_millis(self.crontab.poll_interval_ms),
        }
    }

    pub fn store(&self) -> SystemCrontab {
        SystemCrontab::new(self.crontab.user.clone()).with_program(&self.crontab.program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_yaml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.yaml", "crontab:\n  user: backup\n  settle_timeout_ms: 100\n");

        let config = Config::load_layers(&[path]).unwrap();
        assert_eq!(config.crontab.user.as_deref(), Some("backup"));
        assert_eq!(config.crontab.program, PathBuf::from("crontab"));
        assert_eq!(config.crontab.poll_interval_ms, 10);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.consistency().settle_timeout, Duration::from_millis(100));
        assert_eq!(config.store().user(), Some("backup"));
    }

    #[test]
    fn test_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "config.toml",
            "[crontab]\nprogram = \"/usr/bin/crontab\"\n\n[logging]\nlevel = \"debug\"\noutput = \"/tmp/cronedit.log\"\n",
        );

        let config = Config::load_layers(&[path]).unwrap();
        assert_eq!(config.crontab.program, PathBuf::from("/usr/bin/crontab"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.output, Some(PathBuf::from("/tmp/cronedit.log")));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.ini", "user=x");
        assert!(Config::load_layers(&[path]).is_err());
    }

    #[test]
    fn test_merge_keeps_unset_keys() {
        let mut base = Config::default();
        base.crontab.user = Some("alice".into());
        base.crontab.program = PathBuf::from("/opt/bin/crontab");
        let mut file = ConfigFile::default();
        file.crontab.poll_interval_ms = Some(3);

        base.merge(file);
        assert_eq!(base.crontab.user.as_deref(), Some("alice"));
        assert_eq!(base.crontab.program, PathBuf::from("/opt/bin/crontab"));
        assert_eq!(base.crontab.poll_interval_ms, 3);
    }

    #[test]
    fn test_later_layers_only_override_their_own_keys() {
        let dir = tempfile::tempdir().unwrap();
        let system = write_file(
            &dir,
            "system.yaml",
            "crontab:\n  program: /opt/bin/crontab\n  settle_timeout_ms: 2000\n",
        );
        let user = write_file(&dir, "user.yaml", "logging:\n  level: debug\n");
        let explicit = write_file(&dir, "explicit.toml", "[crontab]\nsettle_timeout_ms = 750\n");

        let config = Config::load_layers(&[system.clone(), user.clone()]).unwrap();
        assert_eq!(config.crontab.program, PathBuf::from("/opt/bin/crontab"));
        assert_eq!(config.crontab.settle_timeout_ms, 2000);
        assert_eq!(config.crontab.poll_interval_ms, 10);
        assert_eq!(config.logging.level, "debug");

        let config = Config::load_layers(&[system, user, explicit]).unwrap();
        assert_eq!(config.crontab.program, PathBuf::from("/opt/bin/crontab"));
        assert_eq!(config.crontab.settle_timeout_ms, 750);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "c.yaml", "crontab:\n  settle_timeout: 100\n");
        assert!(Config::load_layers(&[path]).is_err());
    }

    #[test]
    fn test_load_explicit_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.yaml"))).is_err());

        let path = write_file(&dir, "c.yml", "logging:\n  level: warn\n");
        assert_eq!(Config::load(Some(&path)).unwrap().logging.level, "warn");
    }
}
