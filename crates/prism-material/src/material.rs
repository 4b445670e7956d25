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

//! Materials: an ordered list of techniques plus the per-scheme, per-LOD
//! selection map built when the material is compiled.

use crate::context::MaterialContext;
use crate::error::{MaterialError, Result};
use crate::pass::Pass;
use crate::render_state::FogState;
use crate::technique::Technique;
use prism_core::math::LinearRgba;
use prism_core::renderer::{CullingMode, RenderSystemCapabilities, SceneBlendType};
use prism_core::TextureManager;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Outcome of compiling a material.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Number of techniques usable on the current hardware.
    pub supported_count: usize,
    /// One line per rejected technique.
    pub diagnostics: Vec<String>,
}

impl CompileReport {
    /// Returns `true` if at least one technique is usable.
    pub fn is_supported(&self) -> bool {
        self.supported_count > 0
    }
}

/// A surface description made of alternative techniques.
///
/// Techniques are listed in order of preference. [`Material::compile`]
/// decides which ones the hardware can run and indexes them by scheme and
/// level of detail; [`Material::best_technique`] picks one at render time.
pub struct Material {
    name: String,
    context: Arc<MaterialContext>,
    techniques: Vec<Technique>,
    supported: Vec<usize>,
    // Insertion-ordered so the first compiled scheme is the fallback.
    best_by_scheme: Vec<(u16, BTreeMap<u16, usize>)>,
    unsupported_reasons: Vec<String>,
    compilation_required: bool,
    receive_shadows: bool,
    transparency_casts_shadows: bool,
    lod_distances: Vec<f32>,
    loaded: bool,
}

impl Material {
    /// Creates a material with one technique holding one default pass.
    pub fn new(name: impl Into<String>, context: Arc<MaterialContext>) -> Self {
        let mut material = Self::empty(name.into(), context);
        material.create_technique().create_pass();
        material
    }

    fn empty(name: String, context: Arc<MaterialContext>) -> Self {
        Self {
            name,
            context,
            techniques: Vec::new(),
            supported: Vec::new(),
            best_by_scheme: Vec::new(),
            unsupported_reasons: Vec::new(),
            compilation_required: true,
            receive_shadows: true,
            transparency_casts_shadows: false,
            lod_distances: vec![0.0],
            loaded: false,
        }
    }

    /// The material's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    // --- Techniques ---

    /// Appends a technique and returns it.
    pub fn create_technique(&mut self) -> &mut Technique {
        self.compilation_required = true;
        self.techniques.push(Technique::new(self.context.clone()));
        let last = self.techniques.len() - 1;
        &mut self.techniques[last]
    }

    /// The technique at `index`.
    pub fn technique(&self, index: usize) -> Option<&Technique> {
        self.techniques.get(index)
    }

    /// Mutable access to the technique at `index`. The material must be
    /// compiled again before its selection reflects the changes.
    pub fn technique_mut(&mut self, index: usize) -> Option<&mut Technique> {
        self.compilation_required = true;
        self.techniques.get_mut(index)
    }

    /// The first technique called `name`.
    pub fn technique_by_name(&self, name: &str) -> Option<&Technique> {
        self.techniques.iter().find(|t| t.name() == name)
    }

    /// Every technique, in order of preference.
    pub fn techniques(&self) -> &[Technique] {
        &self.techniques
    }

    /// Number of techniques.
    pub fn num_techniques(&self) -> usize {
        self.techniques.len()
    }

    /// Removes the technique at `index`, retiring its passes.
    pub fn remove_technique(&mut self, index: usize) -> Result<()> {
        if index >= self.techniques.len() {
            return Err(MaterialError::TechniqueIndexOutOfRange {
                index,
                count: self.techniques.len(),
            });
        }
        self.techniques.remove(index).retire();
        self.clear_selection();
        self.compilation_required = true;
        Ok(())
    }

    /// Removes every technique.
    pub fn remove_all_techniques(&mut self) {
        for technique in self.techniques.drain(..) {
            technique.retire();
        }
        self.clear_selection();
        self.compilation_required = true;
    }

    fn clear_selection(&mut self) {
        self.supported.clear();
        self.best_by_scheme.clear();
    }

    /// Techniques accepted by the last compilation, in order of preference.
    pub fn supported_techniques(&self) -> impl Iterator<Item = &Technique> + '_ {
        self.supported.iter().filter_map(|&i| self.techniques.get(i))
    }

    /// Number of techniques accepted by the last compilation.
    pub fn num_supported_techniques(&self) -> usize {
        self.supported.len()
    }

    /// Why techniques were rejected by the last compilation.
    pub fn unsupported_reasons(&self) -> &[String] {
        &self.unsupported_reasons
    }

    /// Returns `true` if the material changed since it was last compiled.
    pub fn is_compilation_required(&self) -> bool {
        self.compilation_required
    }

    // --- Compilation ---

    /// Decides which techniques `caps` can run and rebuilds the selection
    /// map.
    ///
    /// Passes of fixed-function techniques that use more texture units than
    /// available are split when `auto_manage_texture_units` is set.
    /// Rejections are reported, never raised.
    pub fn compile(
        &mut self,
        caps: &RenderSystemCapabilities,
        auto_manage_texture_units: bool,
    ) -> CompileReport {
        self.clear_selection();
        let mut diagnostics = Vec::new();

        for (index, technique) in self.techniques.iter_mut().enumerate() {
            match technique.compile(caps, auto_manage_texture_units) {
                Ok(()) => {
                    log::debug!("Material '{}': technique {index} is supported", self.name);
                    self.supported.push(index);
                }
                Err(reason) => {
                    log::debug!("Material '{}': technique {index} rejected: {reason}", self.name);
                    diagnostics.push(format!("Technique {index}: {reason}"));
                }
            }
        }

        for &index in &self.supported {
            let technique = &self.techniques[index];
            let scheme = technique.scheme_index();
            let lods = match self.best_by_scheme.iter_mut().position(|(s, _)| *s == scheme) {
                Some(pos) => &mut self.best_by_scheme[pos].1,
                None => {
                    self.best_by_scheme.push((scheme, BTreeMap::new()));
                    let last = self.best_by_scheme.len() - 1;
                    &mut self.best_by_scheme[last].1
                }
            };
            lods.entry(technique.lod_index()).or_insert(index);
        }

        if self.supported.is_empty() {
            log::warn!(
                "Material '{}' has no supportable techniques and will be blank. Explanation:\n{}",
                self.name,
                diagnostics.join("\n")
            );
        }

        self.compilation_required = false;
        self.unsupported_reasons = diagnostics.clone();
        CompileReport {
            supported_count: self.supported.len(),
            diagnostics,
        }
    }

    /// Index of the technique to use at LOD `lod_index` in the active
    /// scheme.
    pub fn best_technique_index(&self, lod_index: u16) -> Option<usize> {
        let active = self.context.schemes.active_scheme_index();
        let (_, lods) = self
            .best_by_scheme
            .iter()
            .find(|(scheme, _)| *scheme == active)
            .or_else(|| self.best_by_scheme.first())?;
        lods.get(&lod_index)
            .or_else(|| lods.range(..lod_index).next_back().map(|(_, i)| i))
            .or_else(|| lods.values().next())
            .copied()
    }

    /// The technique to use at LOD `lod_index` in the active scheme, or
    /// `None` when nothing is supported.
    pub fn best_technique(&self, lod_index: u16) -> Option<&Technique> {
        self.best_technique_index(lod_index)
            .and_then(|i| self.techniques.get(i))
    }

    // --- Copying ---

    /// Deep copy under a new name. Compilation state is copied too.
    pub fn clone_as(&self, name: impl Into<String>) -> Material {
        let mut copy = Self::empty(name.into(), self.context.clone());
        self.copy_to(&mut copy);
        copy
    }

    /// Replaces everything but the name of `other` with a deep copy of this
    /// material.
    pub fn copy_to(&self, other: &mut Material) {
        other.remove_all_techniques();
        other.techniques = self.techniques.iter().map(Technique::duplicate).collect();
        other.supported.clone_from(&self.supported);
        other.best_by_scheme.clone_from(&self.best_by_scheme);
        other.unsupported_reasons.clone_from(&self.unsupported_reasons);
        other.compilation_required = self.compilation_required;
        other.receive_shadows = self.receive_shadows;
        other.transparency_casts_shadows = self.transparency_casts_shadows;
        other.lod_distances.clone_from(&self.lod_distances);
    }

    // --- Properties ---

    /// Returns `true` if any supported technique is transparent.
    pub fn is_transparent(&self) -> bool {
        self.supported_techniques().any(Technique::is_transparent)
    }

    /// Whether objects using this material receive shadows.
    pub fn receive_shadows(&self) -> bool {
        self.receive_shadows
    }

    /// Sets whether objects using this material receive shadows.
    pub fn set_receive_shadows(&mut self, enabled: bool) {
        self.receive_shadows = enabled;
    }

    /// Whether transparent objects using this material still cast shadows.
    pub fn transparency_casts_shadows(&self) -> bool {
        self.transparency_casts_shadows
    }

    /// Sets whether transparent objects using this material cast shadows.
    pub fn set_transparency_casts_shadows(&mut self, enabled: bool) {
        self.transparency_casts_shadows = enabled;
    }

    /// Sets the camera distances at which LOD 1, 2, ... start. LOD 0 always
    /// starts at distance zero.
    pub fn set_lod_distances(&mut self, distances: &[f32]) {
        self.lod_distances = std::iter::once(0.0)
            .chain(distances.iter().map(|d| d * d))
            .collect();
    }

    /// Squared LOD start distances, LOD 0 first.
    pub fn lod_distances_squared(&self) -> &[f32] {
        &self.lod_distances
    }

    /// LOD index for an object at squared distance `distance_squared`.
    pub fn lod_index(&self, distance_squared: f32) -> u16 {
        let count = self
            .lod_distances
            .iter()
            .take_while(|&&start| start <= distance_squared)
            .count();
        count.saturating_sub(1) as u16
    }

    // --- Broadcast setters ---

    fn for_each_technique(&mut self, f: impl FnMut(&mut Technique)) {
        self.techniques.iter_mut().for_each(f);
    }

    /// Sets the ambient reflectance of every pass.
    pub fn set_ambient(&mut self, colour: LinearRgba) {
        self.for_each_technique(|t| t.set_ambient(colour));
    }

    /// Sets the diffuse reflectance of every pass.
    pub fn set_diffuse(&mut self, colour: LinearRgba) {
        self.for_each_technique(|t| t.set_diffuse(colour));
    }

    /// Sets the specular reflectance of every pass.
    pub fn set_specular(&mut self, colour: LinearRgba) {
        self.for_each_technique(|t| t.set_specular(colour));
    }

    /// Sets the specular exponent of every pass.
    pub fn set_shininess(&mut self, shininess: f32) {
        self.for_each_technique(|t| t.set_shininess(shininess));
    }

    /// Sets the emissive colour of every pass.
    pub fn set_self_illumination(&mut self, colour: LinearRgba) {
        self.for_each_technique(|t| t.set_self_illumination(colour));
    }

    /// Applies a blend preset to every pass.
    pub fn set_scene_blending(&mut self, blend: SceneBlendType) {
        self.for_each_technique(|t| t.set_scene_blending(blend));
    }

    /// Turns depth writes on or off for every pass.
    pub fn set_depth_write_enabled(&mut self, enabled: bool) {
        self.for_each_technique(|t| t.set_depth_write_enabled(enabled));
    }

    /// Turns depth testing on or off for every pass.
    pub fn set_depth_check_enabled(&mut self, enabled: bool) {
        self.for_each_technique(|t| t.set_depth_check_enabled(enabled));
    }

    /// Turns lighting on or off for every pass.
    pub fn set_lighting_enabled(&mut self, enabled: bool) {
        self.for_each_technique(|t| t.set_lighting_enabled(enabled));
    }

    /// Sets the hardware culling mode of every pass.
    pub fn set_culling_mode(&mut self, mode: CullingMode) {
        self.for_each_technique(|t| t.set_culling_mode(mode));
    }

    /// Sets the fog override of every pass.
    pub fn set_fog(&mut self, fog: Option<FogState>) {
        self.for_each_technique(|t| t.set_fog(fog));
    }

    // --- Resources ---

    /// Compiles if needed, then loads the textures of every supported
    /// technique.
    pub fn load(
        &mut self,
        caps: &RenderSystemCapabilities,
        auto_manage_texture_units: bool,
        textures: &dyn TextureManager,
    ) {
        if self.compilation_required {
            self.compile(caps, auto_manage_texture_units);
        }
        for &index in &self.supported {
            self.techniques[index].load(textures);
        }
        self.loaded = true;
    }

    /// Releases the textures of every supported technique.
    pub fn unload(&mut self) {
        for &index in &self.supported {
            self.techniques[index].unload();
        }
        self.loaded = false;
    }

    /// Returns `true` between [`load`](Self::load) and [`unload`](Self::unload).
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Advances texture animations of every pass to `time` seconds.
    pub fn update_effects(&mut self, time: f32) {
        self.for_each_technique(|t| t.update_effects(time));
    }

    /// Every pass of every technique, illumination-derived ones included.
    pub fn all_passes_mut(&mut self) -> impl Iterator<Item = &mut Pass> + '_ {
        self.techniques.iter_mut().flat_map(|t| t.all_passes_mut())
    }

    pub(crate) fn retire(mut self) {
        self.remove_all_techniques();
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("techniques", &self.techniques)
            .field("supported", &self.supported)
            .field("compilation_required", &self.compilation_required)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> Material {
        Material::new("test", Arc::new(MaterialContext::default()))
    }

    #[test]
    fn test_new_material_has_one_technique_and_pass() {
        let m = material();
        assert_eq!(m.num_techniques(), 1);
        assert_eq!(m.technique(0).unwrap().num_passes(), 1);
        assert!(m.is_compilation_required());
        assert!(m.best_technique(0).is_none());
    }

    #[test]
    fn test_first_registered_wins_for_same_slot() {
        let mut m = material();
        m.technique_mut(0).unwrap().set_name("first");
        m.create_technique().set_name("second");
        m.technique_mut(1).unwrap().create_pass();
        let report = m.compile(&RenderSystemCapabilities::default(), true);
        assert_eq!(report.supported_count, 2);
        assert_eq!(m.best_technique(0).unwrap().name(), "first");
    }

    #[test]
    fn test_unknown_scheme_falls_back_to_first_inserted() {
        let mut m = material();
        m.technique_mut(0).unwrap().set_scheme_name("hdr");
        m.compile(&RenderSystemCapabilities::default(), true);
        // Active scheme is "Default", which has no techniques.
        assert_eq!(m.best_technique_index(0), Some(0));
    }

    #[test]
    fn test_lod_index_from_distance() {
        let mut m = material();
        m.set_lod_distances(&[10.0, 20.0]);
        assert_eq!(m.lod_index(0.0), 0);
        assert_eq!(m.lod_index(99.0), 0);
        assert_eq!(m.lod_index(100.0), 1);
        assert_eq!(m.lod_index(1000.0), 2);
    }

    #[test]
    fn test_remove_technique_clears_selection() {
        let mut m = material();
        m.compile(&RenderSystemCapabilities::default(), true);
        assert!(m.best_technique(0).is_some());
        m.remove_technique(0).unwrap();
        assert!(m.best_technique(0).is_none());
        assert_eq!(
            m.remove_technique(3),
            Err(MaterialError::TechniqueIndexOutOfRange { index: 3, count: 0 })
        );
    }
}
