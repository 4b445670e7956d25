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

//! State shared by every material of one manager.

use crate::pass_registry::PassRegistry;
use prism_core::PipelineSettings;
use std::sync::{PoisonError, RwLock};

/// Index of the scheme every technique starts in.
pub const DEFAULT_SCHEME_INDEX: u16 = 0;
/// Name of the scheme every technique starts in.
pub const DEFAULT_SCHEME_NAME: &str = "Default";

#[derive(Debug)]
struct SchemeTable {
    names: Vec<String>,
    active: u16,
}

/// Maps material scheme names to small indices and tracks the active one.
///
/// Index 0 is always `"Default"`. Names are registered on first use and
/// never removed.
#[derive(Debug)]
pub struct SchemeRegistry {
    table: RwLock<SchemeTable>,
}

impl SchemeRegistry {
    /// Creates a registry whose active scheme is `active`.
    pub fn new(active: &str) -> Self {
        let registry = Self {
            table: RwLock::new(SchemeTable {
                names: vec![DEFAULT_SCHEME_NAME.to_owned()],
                active: DEFAULT_SCHEME_INDEX,
            }),
        };
        registry.set_active_scheme(active);
        registry
    }

    /// Returns the index of `name`, registering it if needed.
    pub fn scheme_index(&self, name: &str) -> u16 {
        if let Some(index) = self.lookup(name) {
            return index;
        }
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have registered it in between.
        if let Some(pos) = table.names.iter().position(|n| n == name) {
            return pos as u16;
        }
        table.names.push(name.to_owned());
        (table.names.len() - 1) as u16
    }

    /// Returns the index of `name` without registering it.
    pub fn lookup(&self, name: &str) -> Option<u16> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.names.iter().position(|n| n == name).map(|p| p as u16)
    }

    /// Returns the name registered under `index`.
    pub fn scheme_name(&self, index: u16) -> Option<String> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.names.get(index as usize).cloned()
    }

    /// Makes `name` the active scheme, registering it if needed.
    pub fn set_active_scheme(&self, name: &str) {
        let index = self.scheme_index(name);
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .active = index;
    }

    /// Index of the active scheme.
    pub fn active_scheme_index(&self) -> u16 {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active
    }

    /// Name of the active scheme.
    pub fn active_scheme_name(&self) -> String {
        let index = self.active_scheme_index();
        self.scheme_name(index).unwrap_or_default()
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEME_NAME)
    }
}

/// Everything the materials of one manager share: pass bookkeeping,
/// scheme names and the pipeline settings new objects are created with.
#[derive(Debug)]
pub struct MaterialContext {
    /// Pass ids, dirty hashes and deferred deletion.
    pub passes: PassRegistry,
    /// Scheme name table.
    pub schemes: SchemeRegistry,
    settings: PipelineSettings,
}

impl MaterialContext {
    /// Creates a context configured by `settings`.
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            passes: PassRegistry::new(),
            schemes: SchemeRegistry::new(&settings.default_scheme),
            settings,
        }
    }

    /// The settings new passes, texture units and parameter sets start with.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }
}

impl Default for MaterialContext {
    fn default() -> Self {
        Self::new(PipelineSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scheme_is_index_zero() {
        let schemes = SchemeRegistry::default();
        assert_eq!(schemes.lookup("Default"), Some(0));
        assert_eq!(schemes.active_scheme_index(), 0);
    }

    #[test]
    fn test_registration_is_stable() {
        let schemes = SchemeRegistry::default();
        let hdr = schemes.scheme_index("HDR");
        assert_eq!(hdr, 1);
        assert_eq!(schemes.scheme_index("HDR"), hdr);
        assert_eq!(schemes.scheme_name(hdr).as_deref(), Some("HDR"));
        assert_eq!(schemes.lookup("Missing"), None);
    }

    #[test]
    fn test_context_uses_configured_scheme() {
        let settings = PipelineSettings {
            default_scheme: "LowEnd".to_owned(),
            ..Default::default()
        };
        let context = MaterialContext::new(settings);
        assert_eq!(context.schemes.active_scheme_name(), "LowEnd");
        assert_eq!(context.schemes.lookup("Default"), Some(0));
    }
}
