// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pipeline-wide configuration.

use crate::renderer::TextureFilterOptions;
use serde::{Deserialize, Serialize};

/// An error raised while loading or validating [`PipelineSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The RON text could not be parsed.
    #[error("failed to parse pipeline settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The settings could not be serialized.
    #[error("failed to serialize pipeline settings: {0}")]
    Serialize(#[from] ron::Error),
    /// A field holds a value the pipeline cannot use.
    #[error("invalid pipeline setting `{field}`: {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Settings applied to every material and parameter set created by a
/// material manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// The material scheme that is active at start-up.
    pub default_scheme: String,
    /// Whether compilation may split fixed-function passes that use more
    /// texture units than the hardware offers.
    pub auto_manage_texture_units: bool,
    /// Whether matrices are transposed when written into constant buffers.
    pub transpose_matrices: bool,
    /// Whether writing an unknown named constant allocates a new slot
    /// instead of failing.
    pub auto_add_param_name: bool,
    /// Initial capacity of the world-matrix buffer handed to the data source.
    pub world_matrix_capacity: usize,
    /// Anisotropy level given to new texture units.
    pub default_max_anisotropy: u32,
    /// Filtering given to new texture units.
    pub default_texture_filtering: TextureFilterOptions,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            default_scheme: "Default".to_owned(),
            auto_manage_texture_units: true,
            transpose_matrices: false,
            auto_add_param_name: false,
            world_matrix_capacity: 256,
            default_max_anisotropy: 1,
            default_texture_filtering: TextureFilterOptions::Bilinear,
        }
    }
}

impl PipelineSettings {
    /// Parses settings from RON text. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(text)?;
        settings.validate()?;
        log::debug!("Loaded pipeline settings: {settings:?}");
        Ok(settings)
    }

    /// Serializes the settings as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, SettingsError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Checks that every field holds a usable value.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.default_scheme.is_empty() {
            return Err(SettingsError::Invalid {
                field: "default_scheme",
                reason: "scheme name must not be empty".to_owned(),
            });
        }
        if self.default_max_anisotropy == 0 {
            return Err(SettingsError::Invalid {
                field: "default_max_anisotropy",
                reason: "anisotropy must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.default_scheme, "Default");
        assert!(settings.auto_manage_texture_units);
        assert!(!settings.transpose_matrices);
        assert_eq!(settings.world_matrix_capacity, 256);
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let settings =
            PipelineSettings::from_ron_str("(transpose_matrices: true, default_scheme: \"HDR\")")
                .unwrap();
        assert!(settings.transpose_matrices);
        assert_eq!(settings.default_scheme, "HDR");
        assert!(settings.auto_manage_texture_units);
    }

    #[test]
    fn test_invalid_anisotropy_is_rejected() {
        let err = PipelineSettings::from_ron_str("(default_max_anisotropy: 0)").unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid {
                field: "default_max_anisotropy",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_ron_is_a_parse_error() {
        let err = PipelineSettings::from_ron_str("(auto_add_param_name: maybe)").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
