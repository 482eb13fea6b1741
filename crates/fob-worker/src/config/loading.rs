use crate::config::ConfigArtifact;
use crate::error::ConfigError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Inputs that influence how a configuration artifact is produced.
#[derive(Debug, Clone, Default)]
pub struct LoadContext {
    /// Arguments handed to configuration scripts instead of the worker's own
    pub argv: Option<Vec<String>>,
}

/// Produces a configuration artifact from a path.
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    async fn load(&self, path: &Path, ctx: &LoadContext) -> Result<ConfigArtifact, ConfigError>;
}

/// Loads `.json` and `.toml` files, and runs executable configuration
/// scripts whose standard output is a JSON artifact.
///
/// In TOML, a collection is written as an array of tables named `configs`:
///
/// ```toml
/// [[configs]]
/// name = "client"
/// entry = "src/client.ts"
///
/// [[configs]]
/// name = "server"
/// entry = "src/server.ts"
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileConfigLoader;

impl FileConfigLoader {
    pub fn new() -> Self {
        Self
    }

    async fn load_json(&self, path: &Path) -> Result<ConfigArtifact, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let value: Value = serde_json::from_str(&content)?;
        ConfigArtifact::from_value(value)
    }

    async fn load_toml(&self, path: &Path) -> Result<ConfigArtifact, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let toml_val: toml::Table = toml::from_str(&content)?;
        let value = serde_json::to_value(toml_val)?;
        ConfigArtifact::from_value(unwrap_configs_table(value))
    }

    async fn load_script(&self, path: &Path, ctx: &LoadContext) -> Result<ConfigArtifact, ConfigError> {
        let argv = ctx.argv.clone().unwrap_or_default();
        tracing::debug!(script = %path.display(), ?argv, "running configuration script");

        let output = tokio::process::Command::new(path)
            .args(&argv)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(ConfigError::ScriptFailed {
                path: path.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let value: Value = serde_json::from_slice(&output.stdout)?;
        ConfigArtifact::from_value(value)
    }
}

#[async_trait]
impl ConfigLoader for FileConfigLoader {
    async fn load(&self, path: &Path, ctx: &LoadContext) -> Result<ConfigArtifact, ConfigError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => self.load_json(path).await,
            Some("toml") => self.load_toml(path).await,
            _ if is_executable(&metadata) => self.load_script(path, ctx).await,
            _ => Err(ConfigError::UnsupportedFormat(PathBuf::from(path))),
        }
    }
}

/// A TOML document consisting only of `configs = [...]` is a collection.
fn unwrap_configs_table(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.get("configs").is_some_and(Value::is_array) => {
            map.remove("configs").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    false
}
