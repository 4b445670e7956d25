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

//! Owns the materials of one renderer and their shared context.

use crate::context::MaterialContext;
use crate::error::{MaterialError, Result};
use crate::material::{CompileReport, Material};
use crate::technique::Technique;
use ahash::AHashMap;
use prism_core::renderer::RenderSystemCapabilities;
use prism_core::{PipelineSettings, TextureManager};
use std::sync::Arc;

/// Creates, compiles and looks up materials by name.
///
/// Every material shares the manager's [`MaterialContext`], so one call to
/// [`process_pending_pass_updates`](Self::process_pending_pass_updates) per
/// frame maintains all of their passes.
#[derive(Debug)]
pub struct MaterialManager {
    capabilities: RenderSystemCapabilities,
    context: Arc<MaterialContext>,
    materials: AHashMap<String, Material>,
}

impl MaterialManager {
    /// Creates an empty manager for hardware described by `capabilities`.
    pub fn new(settings: PipelineSettings, capabilities: RenderSystemCapabilities) -> Self {
        Self {
            capabilities,
            context: Arc::new(MaterialContext::new(settings)),
            materials: AHashMap::new(),
        }
    }

    /// The settings new materials are created with.
    pub fn settings(&self) -> &PipelineSettings {
        self.context.settings()
    }

    /// The hardware materials are compiled against.
    pub fn capabilities(&self) -> &RenderSystemCapabilities {
        &self.capabilities
    }

    /// Replaces the hardware description. Materials are not recompiled
    /// until [`compile_all`](Self::compile_all) runs.
    pub fn set_capabilities(&mut self, capabilities: RenderSystemCapabilities) {
        self.capabilities = capabilities;
    }

    /// The context shared by every material of this manager.
    pub fn context(&self) -> &Arc<MaterialContext> {
        &self.context
    }

    /// Creates a material with one default technique and pass.
    pub fn create(&mut self, name: &str) -> Result<&mut Material> {
        if self.materials.contains_key(name) {
            return Err(MaterialError::DuplicateMaterial(name.to_owned()));
        }
        let material = Material::new(name, self.context.clone());
        Ok(self.materials.entry(name.to_owned()).or_insert(material))
    }

    /// Registers a deep copy of `source` under `name`.
    pub fn clone_material(&mut self, source: &str, name: &str) -> Result<Option<&mut Material>> {
        if self.materials.contains_key(name) {
            return Err(MaterialError::DuplicateMaterial(name.to_owned()));
        }
        let Some(copy) = self.materials.get(source).map(|m| m.clone_as(name)) else {
            return Ok(None);
        };
        Ok(Some(self.materials.entry(name.to_owned()).or_insert(copy)))
    }

    /// The material called `name`.
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Mutable access to the material called `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Material> {
        self.materials.get_mut(name)
    }

    /// Returns `true` if a material called `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.materials.contains_key(name)
    }

    /// Number of materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Returns `true` if the manager holds no materials.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Removes a material, retiring its passes. Returns `false` if it did
    /// not exist.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.materials.remove(name) {
            Some(material) => {
                material.retire();
                true
            }
            None => false,
        }
    }

    /// Compiles every material against the current capabilities.
    ///
    /// Reports are returned sorted by material name.
    pub fn compile_all(&mut self) -> Vec<(String, CompileReport)> {
        let auto_manage = self.context.settings().auto_manage_texture_units;
        let mut reports: Vec<_> = self
            .materials
            .iter_mut()
            .map(|(name, material)| (name.clone(), material.compile(&self.capabilities, auto_manage)))
            .collect();
        reports.sort_by(|a, b| a.0.cmp(&b.0));
        reports
    }

    /// Compiles if needed and loads the textures of the named material.
    /// Returns `false` if it does not exist.
    pub fn load(&mut self, name: &str, textures: &dyn TextureManager) -> bool {
        let auto_manage = self.context.settings().auto_manage_texture_units;
        match self.materials.get_mut(name) {
            Some(material) => {
                material.load(&self.capabilities, auto_manage, textures);
                true
            }
            None => false,
        }
    }

    /// Runs the pass maintenance sweep over every live pass.
    ///
    /// Call once per frame, after all pass mutations and before anything
    /// reads pass hashes.
    pub fn process_pending_pass_updates(&mut self) {
        let live = self.materials.values_mut().flat_map(|m| m.all_passes_mut());
        self.context.passes.process_pending_updates(live);
    }

    /// Name of the active scheme.
    pub fn active_scheme(&self) -> String {
        self.context.schemes.active_scheme_name()
    }

    /// Makes `name` the active scheme.
    pub fn set_active_scheme(&self, name: &str) {
        self.context.schemes.set_active_scheme(name);
    }

    /// The technique the named material uses at `lod_index`.
    pub fn best_technique(&self, material: &str, lod_index: u16) -> Option<&Technique> {
        self.materials.get(material)?.best_technique(lod_index)
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new(PipelineSettings::default(), RenderSystemCapabilities::default())
    }
}

impl Drop for MaterialManager {
    fn drop(&mut self) {
        self.context.passes.clear_graveyard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut manager = MaterialManager::default();
        manager.create("rock").unwrap();
        assert_eq!(
            manager.create("rock").unwrap_err(),
            MaterialError::DuplicateMaterial("rock".into())
        );
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_remove_retires_passes() {
        let mut manager = MaterialManager::default();
        manager.create("rock").unwrap();
        assert!(manager.remove("rock"));
        assert!(!manager.remove("rock"));
        assert_eq!(manager.context().passes.graveyard_len(), 1);
        manager.process_pending_pass_updates();
        assert_eq!(manager.context().passes.graveyard_len(), 0);
    }

    #[test]
    fn test_drop_releases_context_with_retired_passes() {
        let mut manager = MaterialManager::default();
        manager.create("rock").unwrap();
        assert!(manager.remove("rock"));
        let context = Arc::downgrade(manager.context());

        drop(manager);
        assert!(context.upgrade().is_none());
    }

    #[test]
    fn test_sweep_rehashes_dirty_passes() {
        let mut manager = MaterialManager::default();
        let material = manager.create("rock").unwrap();
        let pass = material.technique_mut(0).unwrap().pass_mut(0).unwrap();
        pass.create_texture_unit_state("rock.png");
        let (id, stale) = (pass.id(), pass.hash());
        assert!(manager.context().passes.is_dirty(id));

        manager.process_pending_pass_updates();
        assert!(!manager.context().passes.is_dirty(id));
        let pass = manager.get("rock").unwrap().technique(0).unwrap().pass(0).unwrap();
        assert_ne!(pass.hash(), stale);
    }

    #[test]
    fn test_clone_material() {
        let mut manager = MaterialManager::default();
        manager.create("rock").unwrap();
        assert!(manager.clone_material("rock", "moss").unwrap().is_some());
        assert!(manager.clone_material("missing", "x").unwrap().is_none());
        assert!(manager.clone_material("rock", "moss").is_err());
    }

    #[test]
    fn test_active_scheme() {
        let manager = MaterialManager::default();
        assert_eq!(manager.active_scheme(), "Default");
        manager.set_active_scheme("lowfi");
        assert_eq!(manager.active_scheme(), "lowfi");
    }
}
