use crate::config::{BuildConfig, ConfigArtifact};
use crate::error::ConfigError;

impl ConfigArtifact {
    /// Number of top-level configurations.
    pub fn len(&self) -> usize {
        match self {
            ConfigArtifact::Single(_) => 1,
            ConfigArtifact::Multi(configs) => configs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the artifact against the count the coordinator expects.
    ///
    /// A single configuration only matches an expected count of 1; a
    /// collection must have exactly `expected` elements.
    pub fn validate_count(&self, expected: usize) -> Result<(), ConfigError> {
        let actual = self.len();
        if actual != expected {
            return Err(ConfigError::CountMismatch { expected, actual });
        }
        Ok(())
    }

    /// Validate the count, then take the configuration at `index`.
    ///
    /// `index` is ignored for a single configuration.
    pub fn select(self, index: usize, expected: usize) -> Result<BuildConfig, ConfigError> {
        self.validate_count(expected)?;

        match self {
            ConfigArtifact::Single(config) => Ok(config),
            ConfigArtifact::Multi(mut configs) => {
                let len = configs.len();
                if index >= len {
                    return Err(ConfigError::IndexOutOfRange { index, len });
                }
                Ok(configs.swap_remove(index))
            }
        }
    }
}

impl BuildConfig {
    /// Validate the configuration for logical consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.filename.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.filename".to_string(),
                value: String::new(),
                hint: "Provide a filename template such as \"[name].js\"".to_string(),
            });
        }

        if let Some(ref pattern) = self.stats.exclude {
            if let Err(e) = regex::Regex::new(pattern) {
                return Err(ConfigError::InvalidValue {
                    field: "stats.exclude".to_string(),
                    value: pattern.clone(),
                    hint: format!("Not a valid regular expression: {}", e),
                });
            }
        }

        Ok(())
    }
}
