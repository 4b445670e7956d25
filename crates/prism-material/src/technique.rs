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

//! Techniques: alternative ways of rendering a material, each made of one
//! or more passes.
//!
//! A technique is only used if [`Material::compile`](crate::Material::compile)
//! found every one of its passes renderable on the current hardware. It
//! also derives, on demand, the *illumination passes* used by additive
//! stencil shadows, which split each pass into ambient, per-light and decal
//! contributions.

use crate::blend::{LayerBlendOperationEx, LayerBlendSource};
use crate::context::{MaterialContext, DEFAULT_SCHEME_INDEX};
use crate::error::{MaterialError, Result};
use crate::pass::Pass;
use crate::program::ProgramSlot;
use crate::render_state::FogState;
use prism_core::math::LinearRgba;
use prism_core::renderer::{
    CompareFunction, CullingMode, RenderSystemCapabilities, SceneBlendFactor, SceneBlendType,
    TextureFilterOptions,
};
use prism_core::TextureManager;
use std::sync::Arc;

/// The lighting contribution an illumination pass renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IlluminationStage {
    /// Ambient and emissive light, rendered once.
    Ambient,
    /// Diffuse and specular light, rendered once per light.
    PerLight,
    /// Texturing, modulated onto the lit result.
    Decal,
}

/// One pass of the illumination breakdown of a technique.
///
/// Either refers to one of the technique's own passes, used as is, or owns
/// a derived copy with the irrelevant lighting terms removed.
#[derive(Debug)]
pub struct IlluminationPass {
    stage: IlluminationStage,
    original: usize,
    derived: Option<Pass>,
}

impl IlluminationPass {
    fn original(stage: IlluminationStage, original: usize) -> Self {
        Self {
            stage,
            original,
            derived: None,
        }
    }

    fn derived(stage: IlluminationStage, original: usize, mut pass: Pass) -> Self {
        pass.recalculate_hash();
        Self {
            stage,
            original,
            derived: Some(pass),
        }
    }

    /// The lighting contribution.
    pub fn stage(&self) -> IlluminationStage {
        self.stage
    }

    /// Index of the technique pass this entry was built from.
    pub fn original_pass_index(&self) -> usize {
        self.original
    }

    /// The derived pass, if the original could not be used as is.
    pub fn derived_pass(&self) -> Option<&Pass> {
        self.derived.as_ref()
    }
}

/// An ordered list of passes plus the metadata that selects it.
pub struct Technique {
    context: Arc<MaterialContext>,
    name: String,
    passes: Vec<Pass>,
    illumination_passes: Vec<IlluminationPass>,
    illumination_compiled: bool,
    supported: bool,
    lod_index: u16,
    scheme_index: u16,
}

impl Technique {
    /// Creates an empty technique in the default scheme at LOD 0.
    pub fn new(context: Arc<MaterialContext>) -> Self {
        Self {
            context,
            name: String::new(),
            passes: Vec::new(),
            illumination_passes: Vec::new(),
            illumination_compiled: false,
            supported: false,
            lod_index: 0,
            scheme_index: DEFAULT_SCHEME_INDEX,
        }
    }

    /// Deep copy with fresh pass ids. Illumination passes are not copied.
    pub fn duplicate(&self) -> Self {
        Self {
            context: self.context.clone(),
            name: self.name.clone(),
            passes: self.passes.iter().map(|p| p.duplicate(p.index())).collect(),
            illumination_passes: Vec::new(),
            illumination_compiled: false,
            supported: self.supported,
            lod_index: self.lod_index,
            scheme_index: self.scheme_index,
        }
    }

    /// The technique's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the technique's name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // --- Passes ---

    /// Appends a new pass and returns it.
    pub fn create_pass(&mut self) -> &mut Pass {
        self.clear_illumination_passes();
        let index = self.passes.len();
        self.passes.push(Pass::new(self.context.clone(), index));
        &mut self.passes[index]
    }

    pub(crate) fn push_pass(&mut self, mut pass: Pass) {
        self.clear_illumination_passes();
        pass.set_index(self.passes.len());
        self.passes.push(pass);
    }

    /// The pass at `index`.
    pub fn pass(&self, index: usize) -> Option<&Pass> {
        self.passes.get(index)
    }

    /// Mutable access to the pass at `index`.
    pub fn pass_mut(&mut self, index: usize) -> Option<&mut Pass> {
        self.clear_illumination_passes();
        self.passes.get_mut(index)
    }

    /// All passes, in order.
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// Number of passes.
    pub fn num_passes(&self) -> usize {
        self.passes.len()
    }

    /// Removes the pass at `index`. The pass is retired through the pass
    /// registry.
    pub fn remove_pass(&mut self, index: usize) -> Result<()> {
        if index >= self.passes.len() {
            return Err(MaterialError::PassIndexOutOfRange {
                index,
                count: self.passes.len(),
            });
        }
        self.clear_illumination_passes();
        let pass = self.passes.remove(index);
        self.context.passes.queue_for_deletion(pass);
        self.reindex_passes();
        Ok(())
    }

    /// Removes every pass.
    pub fn remove_all_passes(&mut self) {
        self.clear_illumination_passes();
        for pass in self.passes.drain(..) {
            self.context.passes.queue_for_deletion(pass);
        }
    }

    /// Moves the pass at `source` to position `destination`.
    pub fn move_pass(&mut self, source: usize, destination: usize) -> Result<()> {
        let count = self.passes.len();
        for index in [source, destination] {
            if index >= count {
                return Err(MaterialError::PassIndexOutOfRange { index, count });
            }
        }
        if source != destination {
            self.clear_illumination_passes();
            let pass = self.passes.remove(source);
            self.passes.insert(destination, pass);
            self.reindex_passes();
        }
        Ok(())
    }

    fn reindex_passes(&mut self) {
        for (index, pass) in self.passes.iter_mut().enumerate() {
            pass.set_index(index);
        }
    }

    /// Every pass owned by the technique, illumination-derived ones included.
    pub fn all_passes_mut(&mut self) -> impl Iterator<Item = &mut Pass> + '_ {
        let Self {
            passes,
            illumination_passes,
            ..
        } = self;
        passes
            .iter_mut()
            .chain(illumination_passes.iter_mut().filter_map(|ip| ip.derived.as_mut()))
    }

    fn for_each_pass(&mut self, mut f: impl FnMut(&mut Pass)) {
        self.clear_illumination_passes();
        self.passes.iter_mut().for_each(&mut f);
    }

    // --- Selection ---

    /// Whether the last compilation accepted this technique.
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Level of detail this technique is used for.
    pub fn lod_index(&self) -> u16 {
        self.lod_index
    }

    /// Sets the level of detail this technique is used for.
    pub fn set_lod_index(&mut self, index: u16) {
        self.lod_index = index;
    }

    /// Index of the scheme this technique belongs to.
    pub fn scheme_index(&self) -> u16 {
        self.scheme_index
    }

    /// Name of the scheme this technique belongs to.
    pub fn scheme_name(&self) -> String {
        self.context
            .schemes
            .scheme_name(self.scheme_index)
            .unwrap_or_default()
    }

    /// Moves the technique into the named scheme, registering it if needed.
    pub fn set_scheme_name(&mut self, name: &str) {
        self.scheme_index = self.context.schemes.scheme_index(name);
    }

    // --- Queries ---

    /// Returns `true` if the first pass is transparent.
    pub fn is_transparent(&self) -> bool {
        self.passes.first().is_some_and(Pass::is_transparent)
    }

    /// Returns `true` if the first pass writes depth.
    pub fn is_depth_writing(&self) -> bool {
        self.passes.first().is_some_and(Pass::depth_write_enabled)
    }

    /// Returns `true` if the first pass tests depth.
    pub fn is_depth_checking(&self) -> bool {
        self.passes.first().is_some_and(Pass::depth_check_enabled)
    }

    /// Returns `true` if the first pass does not write colour.
    pub fn has_colour_write_disabled(&self) -> bool {
        self.passes.first().is_some_and(|p| !p.colour_write_enabled())
    }

    /// Returns `true` if every pass is loaded.
    pub fn is_loaded(&self) -> bool {
        self.passes.iter().all(Pass::is_loaded)
    }

    // --- Broadcast setters ---

    /// Sets the ambient reflectance of every pass.
    pub fn set_ambient(&mut self, colour: LinearRgba) {
        self.for_each_pass(|p| p.set_ambient(colour));
    }

    /// Sets the diffuse reflectance of every pass.
    pub fn set_diffuse(&mut self, colour: LinearRgba) {
        self.for_each_pass(|p| p.set_diffuse(colour));
    }

    /// Sets the specular reflectance of every pass.
    pub fn set_specular(&mut self, colour: LinearRgba) {
        self.for_each_pass(|p| p.set_specular(colour));
    }

    /// Sets the specular exponent of every pass.
    pub fn set_shininess(&mut self, shininess: f32) {
        self.for_each_pass(|p| p.set_shininess(shininess));
    }

    /// Sets the emissive colour of every pass.
    pub fn set_self_illumination(&mut self, colour: LinearRgba) {
        self.for_each_pass(|p| p.set_self_illumination(colour));
    }

    /// Applies a blend preset to every pass.
    pub fn set_scene_blending(&mut self, blend: SceneBlendType) {
        self.for_each_pass(|p| p.set_scene_blending(blend));
    }

    /// Sets explicit blend factors on every pass.
    pub fn set_scene_blending_factors(&mut self, src: SceneBlendFactor, dest: SceneBlendFactor) {
        self.for_each_pass(|p| p.set_scene_blending_factors(src, dest));
    }

    /// Turns depth writes on or off for every pass.
    pub fn set_depth_write_enabled(&mut self, enabled: bool) {
        self.for_each_pass(|p| p.set_depth_write_enabled(enabled));
    }

    /// Turns depth testing on or off for every pass.
    pub fn set_depth_check_enabled(&mut self, enabled: bool) {
        self.for_each_pass(|p| p.set_depth_check_enabled(enabled));
    }

    /// Sets the depth comparison of every pass.
    pub fn set_depth_function(&mut self, function: CompareFunction) {
        self.for_each_pass(|p| p.set_depth_function(function));
    }

    /// Turns lighting on or off for every pass.
    pub fn set_lighting_enabled(&mut self, enabled: bool) {
        self.for_each_pass(|p| p.set_lighting_enabled(enabled));
    }

    /// Sets the hardware culling mode of every pass.
    pub fn set_culling_mode(&mut self, mode: CullingMode) {
        self.for_each_pass(|p| p.set_culling_mode(mode));
    }

    /// Sets the fog override of every pass.
    pub fn set_fog(&mut self, fog: Option<FogState>) {
        self.for_each_pass(|p| p.set_fog(fog));
    }

    /// Applies a filtering preset to every texture unit.
    pub fn set_texture_filtering(&mut self, filtering: TextureFilterOptions) {
        self.for_each_pass(|p| p.set_texture_filtering(filtering));
    }

    /// Applies an anisotropy level to every texture unit.
    pub fn set_texture_anisotropy(&mut self, max_anisotropy: u32) {
        self.for_each_pass(|p| p.set_texture_anisotropy(max_anisotropy));
    }

    // --- Compilation ---

    /// Checks every pass against `caps`, splitting fixed-function passes
    /// that use too many texture units when `auto_manage` allows it.
    ///
    /// Returns the reason the technique is unusable on failure.
    pub(crate) fn compile(
        &mut self,
        caps: &RenderSystemCapabilities,
        auto_manage: bool,
    ) -> std::result::Result<(), String> {
        self.supported = false;
        self.clear_illumination_passes();

        let hardware_units = caps.num_texture_units;
        // Split passes are appended, so the bound is re-read every iteration.
        let mut index = 0;
        while index < self.passes.len() {
            let pass = &mut self.passes[index];
            let requested = pass.num_texture_unit_states();

            if let Some(usage) = pass.program_usage(ProgramSlot::Fragment) {
                let program = usage.program();
                if program.compile_error {
                    return Err(format!(
                        "Pass {index}: Fragment program {} encountered a compile error and is thus not supported.",
                        program.name
                    ));
                }
                if !program.supported {
                    return Err(format!(
                        "Pass {index}: Fragment program {} cannot be used - not supported.",
                        program.name
                    ));
                }
                if requested > program.sampler_count {
                    return Err(format!(
                        "Pass {index}: Too many texture units for fragment program {} ({requested} requested, {} samplers).",
                        program.name, program.sampler_count
                    ));
                }
            } else {
                if requested > hardware_units {
                    if !auto_manage || pass.has_vertex_program() || hardware_units == 0 {
                        return Err(format!(
                            "Pass {index}: Too many texture units for the current hardware and no fragment program is used, cannot auto-split."
                        ));
                    }
                    let split = pass
                        .split(hardware_units)
                        .map_err(|e| format!("Pass {index}: {e}"))?;
                    self.push_pass(split);
                }
                for (unit_index, unit) in self.passes[index].texture_unit_states().iter().enumerate() {
                    if let Some(feature) = unit.unsupported_feature(caps) {
                        return Err(format!(
                            "Pass {index} Tex {unit_index}: {feature} not supported by current environment."
                        ));
                    }
                }
            }

            if let Some(usage) = self.passes[index].program_usage(ProgramSlot::Vertex) {
                let program = usage.program();
                if program.compile_error {
                    return Err(format!(
                        "Pass {index}: Vertex program {} encountered a compile error and is thus not supported.",
                        program.name
                    ));
                }
                if !program.supported {
                    return Err(format!(
                        "Pass {index}: Vertex program {} cannot be used - not supported.",
                        program.name
                    ));
                }
                if program.uses_vertex_textures && caps.num_vertex_texture_units == 0 {
                    return Err(format!(
                        "Pass {index}: Vertex program {} samples textures but vertex texture fetch is not supported.",
                        program.name
                    ));
                }
            }
            index += 1;
        }

        self.supported = true;
        Ok(())
    }

    // --- Illumination passes ---

    /// Returns the illumination breakdown, building it if the technique
    /// changed since the last call.
    pub fn illumination_passes(&mut self) -> &[IlluminationPass] {
        if !self.illumination_compiled {
            self.compile_illumination_passes();
        }
        &self.illumination_passes
    }

    /// Returns the pass to render for `illumination`.
    pub fn resolve_illumination_pass<'t>(&'t self, illumination: &'t IlluminationPass) -> Option<&'t Pass> {
        illumination
            .derived
            .as_ref()
            .or_else(|| self.passes.get(illumination.original))
    }

    /// Drops the illumination breakdown. Derived passes are retired through
    /// the pass registry.
    pub fn clear_illumination_passes(&mut self) {
        for illumination in self.illumination_passes.drain(..) {
            if let Some(pass) = illumination.derived {
                self.context.passes.queue_for_deletion(pass);
            }
        }
        self.illumination_compiled = false;
    }

    fn compile_illumination_passes(&mut self) {
        self.clear_illumination_passes();

        let mut result = Vec::new();
        let mut stage = IlluminationStage::Ambient;
        let mut index = 0;
        while index < self.passes.len() {
            let pass = &self.passes[index];
            match stage {
                IlluminationStage::Ambient => {
                    if pass.is_ambient_only() {
                        result.push(IlluminationPass::original(stage, index));
                        index += 1;
                        continue;
                    }
                    let alpha_reject = pass.alpha_reject_function() != CompareFunction::Always;
                    if !pass.ambient().is_black()
                        || !pass.self_illumination().is_black()
                        || alpha_reject
                    {
                        let mut ambient = pass.duplicate(pass.index());
                        strip_texturing(&mut ambient, alpha_reject);
                        let diffuse_alpha = ambient.diffuse().a;
                        ambient.set_diffuse(LinearRgba::new(0.0, 0.0, 0.0, diffuse_alpha));
                        ambient.set_specular(LinearRgba::BLACK);
                        result.push(IlluminationPass::derived(stage, index, ambient));
                    } else {
                        let mut blank = Pass::new(self.context.clone(), pass.index());
                        blank.set_ambient(LinearRgba::BLACK);
                        blank.set_diffuse(LinearRgba::BLACK);
                        result.push(IlluminationPass::derived(stage, index, blank));
                    }
                    stage = IlluminationStage::PerLight;
                }
                IlluminationStage::PerLight => {
                    if pass.iterate_per_light() {
                        result.push(IlluminationPass::original(stage, index));
                        index += 1;
                        continue;
                    }
                    if pass.lighting_enabled()
                        && (!pass.diffuse().is_black() || !pass.specular().is_black())
                    {
                        let alpha_reject = pass.alpha_reject_function() != CompareFunction::Always;
                        let mut per_light = pass.duplicate(pass.index());
                        strip_texturing(&mut per_light, alpha_reject);
                        per_light.set_ambient(LinearRgba::BLACK);
                        per_light.set_self_illumination(LinearRgba::BLACK);
                        per_light.set_scene_blending_factors(SceneBlendFactor::One, SceneBlendFactor::One);
                        per_light.set_iterate_per_light(true, None);
                        result.push(IlluminationPass::derived(stage, index, per_light));
                    }
                    stage = IlluminationStage::Decal;
                }
                IlluminationStage::Decal => {
                    if pass.num_texture_unit_states() > 0 {
                        if !pass.lighting_enabled() {
                            result.push(IlluminationPass::original(stage, index));
                        } else {
                            let mut decal = pass.duplicate(pass.index());
                            let diffuse_alpha = decal.diffuse().a;
                            decal.set_ambient(LinearRgba::BLACK);
                            decal.set_diffuse(LinearRgba::new(0.0, 0.0, 0.0, diffuse_alpha));
                            decal.set_specular(LinearRgba::BLACK);
                            decal.set_self_illumination(LinearRgba::BLACK);
                            decal.set_lighting_enabled(false);
                            decal.set_iterate_per_light(false, None);
                            decal.set_scene_blending_factors(
                                SceneBlendFactor::DestColour,
                                SceneBlendFactor::Zero,
                            );
                            result.push(IlluminationPass::derived(stage, index, decal));
                        }
                    }
                    index += 1;
                }
            }
        }

        self.illumination_passes = result;
        self.illumination_compiled = true;
    }

    // --- Resources ---

    /// Loads the textures of every pass.
    pub fn load(&mut self, textures: &dyn TextureManager) {
        self.passes.iter_mut().for_each(|p| p.load(textures));
    }

    /// Releases the textures of every pass.
    pub fn unload(&mut self) {
        self.passes.iter_mut().for_each(Pass::unload);
    }

    /// Advances texture animations of every pass to `time` seconds.
    pub fn update_effects(&mut self, time: f32) {
        self.passes.iter_mut().for_each(|p| p.update_effects(time));
    }

    /// Retires every pass through the pass registry.
    pub(crate) fn retire(mut self) {
        self.remove_all_passes();
    }
}

// Ambient and per-light copies must not texture the result. Alpha-rejecting
// passes keep their units for the alpha test but pass the colour through.
fn strip_texturing(pass: &mut Pass, alpha_reject: bool) {
    if alpha_reject {
        for index in 0..pass.num_texture_unit_states() {
            if let Some(unit) = pass.texture_unit_state_mut(index) {
                unit.set_colour_operation_ex(
                    LayerBlendOperationEx::Source1,
                    LayerBlendSource::Current,
                    LayerBlendSource::Current,
                );
            }
        }
    } else {
        pass.remove_all_texture_unit_states();
    }
    pass.set_program(ProgramSlot::Fragment, None);
}

impl std::fmt::Debug for Technique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Technique")
            .field("name", &self.name)
            .field("passes", &self.passes)
            .field("supported", &self.supported)
            .field("lod_index", &self.lod_index)
            .field("scheme_index", &self.scheme_index)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::renderer::Capabilities;

    fn technique() -> Technique {
        Technique::new(Arc::new(MaterialContext::default()))
    }

    #[test]
    fn test_remove_pass_reindexes_and_retires() {
        let mut t = technique();
        t.create_pass();
        t.create_pass();
        t.create_pass();
        t.remove_pass(0).unwrap();
        assert_eq!(t.num_passes(), 2);
        assert_eq!(t.pass(0).unwrap().index(), 0);
        assert_eq!(t.pass(1).unwrap().index(), 1);
        assert_eq!(t.context.passes.graveyard_len(), 1);
    }

    #[test]
    fn test_move_pass() {
        let mut t = technique();
        t.create_pass().set_name("a");
        t.create_pass().set_name("b");
        t.move_pass(1, 0).unwrap();
        assert_eq!(t.pass(0).unwrap().name(), "b");
        assert_eq!(t.pass(0).unwrap().index(), 0);
        assert!(t.move_pass(0, 5).is_err());
    }

    #[test]
    fn test_compile_splits_until_units_fit() {
        let mut t = technique();
        let pass = t.create_pass();
        for name in ["a", "b", "c", "d", "e"] {
            pass.create_texture_unit_state(name);
        }
        let caps = RenderSystemCapabilities::new(2);
        t.compile(&caps, true).unwrap();
        assert!(t.is_supported());
        let counts: Vec<_> = t.passes().iter().map(Pass::num_texture_unit_states).collect();
        assert_eq!(counts, vec![2, 2, 1]);
        assert_eq!(t.pass(2).unwrap().index(), 2);
    }

    #[test]
    fn test_compile_without_auto_manage_fails() {
        let mut t = technique();
        let pass = t.create_pass();
        pass.create_texture_unit_state("a");
        pass.create_texture_unit_state("b");
        let err = t.compile(&RenderSystemCapabilities::new(1), false).unwrap_err();
        assert!(err.contains("Pass 0"));
        assert!(err.contains("cannot auto-split"));
        assert!(!t.is_supported());
    }

    #[test]
    fn test_compile_reports_missing_dot3() {
        let mut t = technique();
        t.create_pass()
            .create_texture_unit_state("bump")
            .set_colour_operation_ex(
                LayerBlendOperationEx::DotProduct,
                LayerBlendSource::Texture,
                LayerBlendSource::Diffuse,
            );
        let err = t.compile(&RenderSystemCapabilities::new(4), true).unwrap_err();
        assert_eq!(err, "Pass 0 Tex 0: DOT3 blending not supported by current environment.");
        let caps = RenderSystemCapabilities::new(4).with(Capabilities::DOT3);
        assert!(t.compile(&caps, true).is_ok());
    }

    #[test]
    fn test_illumination_of_lit_textured_pass() {
        let mut t = technique();
        let pass = t.create_pass();
        pass.set_ambient(LinearRgba::rgb(0.2, 0.2, 0.2));
        pass.create_texture_unit_state("wall.png");

        let stages: Vec<_> = t.illumination_passes().iter().map(|p| p.stage()).collect();
        assert_eq!(
            stages,
            vec![
                IlluminationStage::Ambient,
                IlluminationStage::PerLight,
                IlluminationStage::Decal
            ]
        );

        let ips = &t.illumination_passes;
        let ambient = t.resolve_illumination_pass(&ips[0]).unwrap();
        assert_eq!(ambient.num_texture_unit_states(), 0);
        assert!(ambient.diffuse().is_black());

        let per_light = t.resolve_illumination_pass(&ips[1]).unwrap();
        assert!(per_light.iterate_per_light());
        assert_eq!(per_light.dest_blend_factor(), SceneBlendFactor::One);
        assert!(per_light.ambient().is_black());

        let decal = t.resolve_illumination_pass(&ips[2]).unwrap();
        assert!(!decal.lighting_enabled());
        assert_eq!(decal.source_blend_factor(), SceneBlendFactor::DestColour);
        assert_eq!(decal.num_texture_unit_states(), 1);
    }

    #[test]
    fn test_ambient_only_pass_is_used_directly() {
        let mut t = technique();
        t.create_pass().set_lighting_enabled(false);
        let ips = t.illumination_passes();
        assert_eq!(ips.len(), 1);
        assert_eq!(ips[0].stage(), IlluminationStage::Ambient);
        assert!(ips[0].derived_pass().is_none());
    }

    #[test]
    fn test_mutation_retires_derived_illumination_passes() {
        let mut t = technique();
        t.create_pass().create_texture_unit_state("a.png");
        assert_eq!(t.illumination_passes().len(), 3);
        t.pass_mut(0);
        assert_eq!(t.context.passes.graveyard_len(), 3);
        assert!(!t.illumination_compiled);
    }
}
