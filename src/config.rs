use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub workbook: WorkbookConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkbookConfig {
    #[serde(default = "default_workbook_path")]
    pub path: PathBuf,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            path: default_workbook_path(),
        }
    }
}

fn default_workbook_path() -> PathBuf {
    PathBuf::from("static/data/Cybersecurity Standards Database..xltx")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.workbook.path.as_os_str().is_empty() {
            anyhow::bail!("workbook.path must not be empty");
        }
        self.server
            .bind
            .parse::<SocketAddr>()
            .with_context(|| format!("server.bind is not a socket address: '{}'", self.server.bind))?;
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("standards.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn empty_file_uses_defaults() {
        let (_dir, path) = write("");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:5000");
        assert_eq!(
            cfg.workbook.path,
            PathBuf::from("static/data/Cybersecurity Standards Database..xltx")
        );
    }

    #[test]
    fn reads_workbook_and_server_sections() {
        let (_dir, path) = write(
            r#"
[workbook]
path = "/data/standards.xlsx"

[server]
bind = "0.0.0.0:8080"
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.workbook.path, PathBuf::from("/data/standards.xlsx"));
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn rejects_bad_bind_address() {
        let (_dir, path) = write("[server]\nbind = \"localhost\"\n");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("server.bind"));
    }

    #[test]
    fn rejects_empty_workbook_path() {
        let (_dir, path) = write("[workbook]\npath = \"\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(load_config(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn minimal_config_is_valid() {
        Config::minimal().validate().unwrap();
    }
}
