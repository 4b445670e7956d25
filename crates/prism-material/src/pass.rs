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

//! A single rendering pass: fixed-function state, texture units and GPU
//! program bindings.

use crate::blend::{LayerBlendOperationEx, LayerBlendSource};
use crate::context::MaterialContext;
use crate::error::{MaterialError, Result};
use crate::pass_registry::PassId;
use crate::program::{GpuProgram, GpuProgramUsage, ProgramSlot};
use crate::render_state::FogState;
use crate::texture_unit::TextureUnitState;
use ahash::RandomState;
use prism_core::math::LinearRgba;
use prism_core::renderer::{
    CompareFunction, CullingMode, LightType, ManualCullingMode, PolygonMode, SceneBlendFactor,
    SceneBlendType, ShadeOptions, TextureFilterOptions, TextureType,
};
use prism_core::TextureManager;
use std::fmt;
use std::hash::BuildHasher;
use std::sync::{Arc, OnceLock};

const NAME_HASH_RANGE: u32 = 1 << 14;

fn name_hash(name: &str) -> u32 {
    static HASHER: OnceLock<RandomState> = OnceLock::new();
    let hasher = HASHER.get_or_init(|| {
        RandomState::with_seeds(
            0x243f_6a88_85a3_08d3,
            0x1319_8a2e_0370_7344,
            0xa409_3822_299f_31d0,
            0x082e_fa98_ec4e_6c89,
        )
    });
    (hasher.hash_one(name) as u32) % NAME_HASH_RANGE
}

/// Which surface colours follow the vertex colour instead of the material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TrackVertexColour {
    /// Ambient follows the vertex colour.
    pub ambient: bool,
    /// Diffuse follows the vertex colour.
    pub diffuse: bool,
    /// Specular follows the vertex colour.
    pub specular: bool,
    /// Emissive follows the vertex colour.
    pub emissive: bool,
}

/// One rendering of the geometry with a fixed set of render states.
///
/// Every pass has an id that is unique within its [`MaterialContext`] and
/// an index within its technique. Changing the index or the first two
/// texture units changes the pass's sort key; the new key only becomes
/// visible after the next [`PassRegistry`](crate::PassRegistry) sweep.
pub struct Pass {
    context: Arc<MaterialContext>,
    id: PassId,
    index: usize,
    hash: u32,
    name: String,
    ambient: LinearRgba,
    diffuse: LinearRgba,
    specular: LinearRgba,
    emissive: LinearRgba,
    shininess: f32,
    tracking: TrackVertexColour,
    source_blend: SceneBlendFactor,
    dest_blend: SceneBlendFactor,
    depth_check: bool,
    depth_write: bool,
    depth_function: CompareFunction,
    depth_bias_constant: f32,
    depth_bias_slope: f32,
    colour_write: bool,
    alpha_reject_function: CompareFunction,
    alpha_reject_value: u8,
    culling_mode: CullingMode,
    manual_culling_mode: ManualCullingMode,
    lighting_enabled: bool,
    max_simultaneous_lights: usize,
    start_light: usize,
    iterate_per_light: bool,
    only_light_type: Option<LightType>,
    lights_per_iteration: usize,
    shading: ShadeOptions,
    polygon_mode: PolygonMode,
    fog_override: Option<FogState>,
    point_size: f32,
    pass_iteration_count: usize,
    texture_units: Vec<TextureUnitState>,
    programs: [Option<GpuProgramUsage>; 6],
}

impl Pass {
    /// Creates a pass with default render state and no texture units.
    pub fn new(context: Arc<MaterialContext>, index: usize) -> Self {
        let id = context.passes.allocate_id();
        let mut pass = Self {
            context,
            id,
            index,
            hash: 0,
            name: String::new(),
            ambient: LinearRgba::WHITE,
            diffuse: LinearRgba::WHITE,
            specular: LinearRgba::BLACK,
            emissive: LinearRgba::BLACK,
            shininess: 0.0,
            tracking: TrackVertexColour::default(),
            source_blend: SceneBlendFactor::One,
            dest_blend: SceneBlendFactor::Zero,
            depth_check: true,
            depth_write: true,
            depth_function: CompareFunction::LessEqual,
            depth_bias_constant: 0.0,
            depth_bias_slope: 0.0,
            colour_write: true,
            alpha_reject_function: CompareFunction::Always,
            alpha_reject_value: 0,
            culling_mode: CullingMode::Clockwise,
            manual_culling_mode: ManualCullingMode::Back,
            lighting_enabled: true,
            max_simultaneous_lights: 8,
            start_light: 0,
            iterate_per_light: false,
            only_light_type: None,
            lights_per_iteration: 1,
            shading: ShadeOptions::Gouraud,
            polygon_mode: PolygonMode::Fill,
            fog_override: None,
            point_size: 1.0,
            pass_iteration_count: 1,
            texture_units: Vec::new(),
            programs: Default::default(),
        };
        pass.recalculate_hash();
        pass
    }

    /// Creates a copy of `self` with a fresh id and the given index.
    ///
    /// Texture units are copied and attached to the new pass.
    pub fn duplicate(&self, index: usize) -> Self {
        let mut pass = Pass::new(self.context.clone(), index);
        pass.copy_from(self);
        pass.recalculate_hash();
        pass
    }

    /// Copies every setting and texture unit of `other` into `self`.
    ///
    /// The id and index of `self` are kept; the hash is marked dirty.
    pub fn copy_from(&mut self, other: &Pass) {
        self.name.clone_from(&other.name);
        self.ambient = other.ambient;
        self.diffuse = other.diffuse;
        self.specular = other.specular;
        self.emissive = other.emissive;
        self.shininess = other.shininess;
        self.tracking = other.tracking;
        self.source_blend = other.source_blend;
        self.dest_blend = other.dest_blend;
        self.depth_check = other.depth_check;
        self.depth_write = other.depth_write;
        self.depth_function = other.depth_function;
        self.depth_bias_constant = other.depth_bias_constant;
        self.depth_bias_slope = other.depth_bias_slope;
        self.colour_write = other.colour_write;
        self.alpha_reject_function = other.alpha_reject_function;
        self.alpha_reject_value = other.alpha_reject_value;
        self.culling_mode = other.culling_mode;
        self.manual_culling_mode = other.manual_culling_mode;
        self.lighting_enabled = other.lighting_enabled;
        self.max_simultaneous_lights = other.max_simultaneous_lights;
        self.start_light = other.start_light;
        self.iterate_per_light = other.iterate_per_light;
        self.only_light_type = other.only_light_type;
        self.lights_per_iteration = other.lights_per_iteration;
        self.shading = other.shading;
        self.polygon_mode = other.polygon_mode;
        self.fog_override = other.fog_override;
        self.point_size = other.point_size;
        self.pass_iteration_count = other.pass_iteration_count;
        self.programs.clone_from(&other.programs);

        self.texture_units.clear();
        for unit in &other.texture_units {
            let mut copy = TextureUnitState::new();
            copy.copy_from(unit);
            copy.set_parent(Some(self.id));
            self.texture_units.push(copy);
        }
        self.mark_dirty();
    }

    pub(crate) fn context(&self) -> &Arc<MaterialContext> {
        &self.context
    }

    fn mark_dirty(&self) {
        self.context.passes.mark_dirty(self.id);
    }

    // --- Identity ---

    /// The pass's unique id.
    pub fn id(&self) -> PassId {
        self.id
    }

    /// Position of the pass within its technique.
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        if self.index != index {
            self.index = index;
            self.mark_dirty();
        }
    }

    /// The pass's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the pass's name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The sort key computed by the last hash recalculation.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Recomputes the sort key.
    ///
    /// The top four bits hold the pass index, the next fourteen a hash of
    /// the first texture name and the low fourteen a hash of the second.
    /// Blank units contribute nothing.
    pub fn recalculate_hash(&mut self) {
        let mut hash = ((self.index as u32) & 0xF) << 28;
        if let Some(unit) = self.texture_units.first().filter(|u| !u.is_blank()) {
            hash = hash.wrapping_add(name_hash(unit.texture_name()) << 14);
        }
        if let Some(unit) = self.texture_units.get(1).filter(|u| !u.is_blank()) {
            hash = hash.wrapping_add(name_hash(unit.texture_name()));
        }
        self.hash = hash;
    }

    // --- Surface colours ---

    /// Ambient reflectance.
    pub fn ambient(&self) -> LinearRgba {
        self.ambient
    }

    /// Sets the ambient reflectance.
    pub fn set_ambient(&mut self, colour: LinearRgba) {
        self.ambient = colour;
    }

    /// Diffuse reflectance.
    pub fn diffuse(&self) -> LinearRgba {
        self.diffuse
    }

    /// Sets the diffuse reflectance.
    pub fn set_diffuse(&mut self, colour: LinearRgba) {
        self.diffuse = colour;
    }

    /// Specular reflectance.
    pub fn specular(&self) -> LinearRgba {
        self.specular
    }

    /// Sets the specular reflectance.
    pub fn set_specular(&mut self, colour: LinearRgba) {
        self.specular = colour;
    }

    /// Emissive colour.
    pub fn self_illumination(&self) -> LinearRgba {
        self.emissive
    }

    /// Sets the emissive colour.
    pub fn set_self_illumination(&mut self, colour: LinearRgba) {
        self.emissive = colour;
    }

    /// Specular exponent.
    pub fn shininess(&self) -> f32 {
        self.shininess
    }

    /// Sets the specular exponent.
    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = shininess;
    }

    /// Which colours follow the vertex colour.
    pub fn vertex_colour_tracking(&self) -> TrackVertexColour {
        self.tracking
    }

    /// Sets which colours follow the vertex colour.
    pub fn set_vertex_colour_tracking(&mut self, tracking: TrackVertexColour) {
        self.tracking = tracking;
    }

    // --- Blending and buffers ---

    /// Applies a blend preset.
    pub fn set_scene_blending(&mut self, blend: SceneBlendType) {
        let (src, dest) = blend.factors();
        self.set_scene_blending_factors(src, dest);
    }

    /// Sets explicit blend factors.
    pub fn set_scene_blending_factors(&mut self, src: SceneBlendFactor, dest: SceneBlendFactor) {
        self.source_blend = src;
        self.dest_blend = dest;
    }

    /// Source blend factor.
    pub fn source_blend_factor(&self) -> SceneBlendFactor {
        self.source_blend
    }

    /// Destination blend factor.
    pub fn dest_blend_factor(&self) -> SceneBlendFactor {
        self.dest_blend
    }

    /// Returns `true` if the pass blends with what is already in the frame
    /// buffer and must therefore be sorted back to front.
    ///
    /// A pass is opaque only when the destination factor is zero and the
    /// source factor does not read the destination.
    pub fn is_transparent(&self) -> bool {
        !(self.dest_blend == SceneBlendFactor::Zero && !self.source_blend.reads_destination())
    }

    /// Whether depth testing is on.
    pub fn depth_check_enabled(&self) -> bool {
        self.depth_check
    }

    /// Turns depth testing on or off.
    pub fn set_depth_check_enabled(&mut self, enabled: bool) {
        self.depth_check = enabled;
    }

    /// Whether depth writes are on.
    pub fn depth_write_enabled(&self) -> bool {
        self.depth_write
    }

    /// Turns depth writes on or off.
    pub fn set_depth_write_enabled(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    /// The depth comparison.
    pub fn depth_function(&self) -> CompareFunction {
        self.depth_function
    }

    /// Sets the depth comparison.
    pub fn set_depth_function(&mut self, function: CompareFunction) {
        self.depth_function = function;
    }

    /// Sets the constant and slope-scaled depth bias.
    pub fn set_depth_bias(&mut self, constant: f32, slope_scale: f32) {
        self.depth_bias_constant = constant;
        self.depth_bias_slope = slope_scale;
    }

    /// Returns `(constant, slope_scale)` depth bias.
    pub fn depth_bias(&self) -> (f32, f32) {
        (self.depth_bias_constant, self.depth_bias_slope)
    }

    /// Whether colour writes are on.
    pub fn colour_write_enabled(&self) -> bool {
        self.colour_write
    }

    /// Turns colour writes on or off.
    pub fn set_colour_write_enabled(&mut self, enabled: bool) {
        self.colour_write = enabled;
    }

    /// Rejects fragments whose alpha fails `function` against `value`.
    pub fn set_alpha_reject_settings(&mut self, function: CompareFunction, value: u8) {
        self.alpha_reject_function = function;
        self.alpha_reject_value = value;
    }

    /// The alpha rejection comparison. [`CompareFunction::Always`] disables it.
    pub fn alpha_reject_function(&self) -> CompareFunction {
        self.alpha_reject_function
    }

    /// The alpha rejection reference value.
    pub fn alpha_reject_value(&self) -> u8 {
        self.alpha_reject_value
    }

    /// Hardware culling mode.
    pub fn culling_mode(&self) -> CullingMode {
        self.culling_mode
    }

    /// Sets the hardware culling mode.
    pub fn set_culling_mode(&mut self, mode: CullingMode) {
        self.culling_mode = mode;
    }

    /// Software culling mode.
    pub fn manual_culling_mode(&self) -> ManualCullingMode {
        self.manual_culling_mode
    }

    /// Sets the software culling mode.
    pub fn set_manual_culling_mode(&mut self, mode: ManualCullingMode) {
        self.manual_culling_mode = mode;
    }

    // --- Lighting ---

    /// Whether dynamic lighting is on.
    pub fn lighting_enabled(&self) -> bool {
        self.lighting_enabled
    }

    /// Turns dynamic lighting on or off.
    pub fn set_lighting_enabled(&mut self, enabled: bool) {
        self.lighting_enabled = enabled;
    }

    /// Maximum lights applied in one rendering of the pass.
    pub fn max_simultaneous_lights(&self) -> usize {
        self.max_simultaneous_lights
    }

    /// Sets the maximum lights applied in one rendering of the pass.
    pub fn set_max_simultaneous_lights(&mut self, max: usize) {
        self.max_simultaneous_lights = max;
    }

    /// Index of the first light considered.
    pub fn start_light(&self) -> usize {
        self.start_light
    }

    /// Sets the index of the first light considered.
    pub fn set_start_light(&mut self, start: usize) {
        self.start_light = start;
    }

    /// Whether the pass is repeated once per light (or group of lights).
    pub fn iterate_per_light(&self) -> bool {
        self.iterate_per_light
    }

    /// Repeats the pass per light, optionally only for lights of one type.
    pub fn set_iterate_per_light(&mut self, enabled: bool, only_light_type: Option<LightType>) {
        self.iterate_per_light = enabled;
        self.only_light_type = only_light_type;
    }

    /// The light type iteration is restricted to.
    pub fn only_light_type(&self) -> Option<LightType> {
        self.only_light_type
    }

    /// Lights handled by each per-light iteration.
    pub fn lights_per_iteration(&self) -> usize {
        self.lights_per_iteration
    }

    /// Sets the lights handled by each per-light iteration.
    pub fn set_lights_per_iteration(&mut self, count: usize) {
        self.lights_per_iteration = count.max(1);
    }

    /// Fixed number of times the pass is rendered.
    pub fn pass_iteration_count(&self) -> usize {
        self.pass_iteration_count
    }

    /// Sets the fixed number of times the pass is rendered.
    pub fn set_pass_iteration_count(&mut self, count: usize) {
        self.pass_iteration_count = count.max(1);
    }

    /// Shading model.
    pub fn shading_mode(&self) -> ShadeOptions {
        self.shading
    }

    /// Sets the shading model.
    pub fn set_shading_mode(&mut self, mode: ShadeOptions) {
        self.shading = mode;
    }

    /// Rasterization mode.
    pub fn polygon_mode(&self) -> PolygonMode {
        self.polygon_mode
    }

    /// Sets the rasterization mode.
    pub fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.polygon_mode = mode;
    }

    /// Fog used instead of the scene fog, if any.
    pub fn fog_override(&self) -> Option<&FogState> {
        self.fog_override.as_ref()
    }

    /// Overrides the scene fog, or restores it with `None`.
    pub fn set_fog(&mut self, fog: Option<FogState>) {
        self.fog_override = fog;
    }

    /// Point sprite size.
    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Sets the point sprite size.
    pub fn set_point_size(&mut self, size: f32) {
        self.point_size = size;
    }

    /// Returns `true` if the pass contributes ambient light only: unlit,
    /// colour writes disabled, or no diffuse and specular reflectance.
    pub fn is_ambient_only(&self) -> bool {
        !self.lighting_enabled
            || !self.colour_write
            || (self.diffuse.is_black() && self.specular.is_black())
    }

    // --- Texture units ---

    /// Appends a unit showing `texture_name` and returns it.
    pub fn create_texture_unit_state(&mut self, texture_name: &str) -> &mut TextureUnitState {
        let mut unit = TextureUnitState::with_settings(self.context.settings());
        if !texture_name.is_empty() {
            unit.set_texture_name(texture_name, TextureType::TwoD);
        }
        unit.set_parent(Some(self.id));
        self.texture_units.push(unit);
        self.mark_dirty();
        let last = self.texture_units.len() - 1;
        &mut self.texture_units[last]
    }

    /// Attaches an existing unit.
    ///
    /// Fails if the unit still belongs to another pass.
    pub fn add_texture_unit_state(&mut self, mut unit: TextureUnitState) -> Result<()> {
        if let Some(owner) = unit.parent().filter(|owner| *owner != self.id) {
            return Err(MaterialError::TextureUnitOwned { owner });
        }
        unit.set_parent(Some(self.id));
        self.texture_units.push(unit);
        self.mark_dirty();
        Ok(())
    }

    /// The unit at `index`.
    pub fn texture_unit_state(&self, index: usize) -> Option<&TextureUnitState> {
        self.texture_units.get(index)
    }

    /// Mutable access to the unit at `index`. Marks the hash dirty.
    pub fn texture_unit_state_mut(&mut self, index: usize) -> Option<&mut TextureUnitState> {
        if index < self.texture_units.len() {
            self.mark_dirty();
        }
        self.texture_units.get_mut(index)
    }

    /// The first unit with the given name.
    pub fn texture_unit_state_by_name(&self, name: &str) -> Option<&TextureUnitState> {
        self.texture_units.iter().find(|u| u.name() == name)
    }

    /// All units, in order.
    pub fn texture_unit_states(&self) -> &[TextureUnitState] {
        &self.texture_units
    }

    /// Number of units.
    pub fn num_texture_unit_states(&self) -> usize {
        self.texture_units.len()
    }

    /// Detaches and returns the unit at `index`.
    pub fn remove_texture_unit_state(&mut self, index: usize) -> Result<TextureUnitState> {
        if index >= self.texture_units.len() {
            return Err(MaterialError::TextureUnitIndexOutOfRange {
                index,
                count: self.texture_units.len(),
            });
        }
        let mut unit = self.texture_units.remove(index);
        unit.detach();
        self.mark_dirty();
        Ok(unit)
    }

    /// Drops every unit.
    pub fn remove_all_texture_unit_states(&mut self) {
        if !self.texture_units.is_empty() {
            self.texture_units.clear();
            self.mark_dirty();
        }
    }

    /// Moves the units from `available_units` onward into a new pass.
    ///
    /// The first moved unit is changed to replace the colour with its
    /// texture, and the new pass blends with the scene using that unit's
    /// multipass fallback factors. The caller appends the returned pass to
    /// the technique.
    pub fn split(&mut self, available_units: usize) -> Result<Pass> {
        if self.is_programmable() {
            return Err(MaterialError::ProgrammablePassSplit { pass: self.id });
        }
        if available_units >= self.texture_units.len() {
            return Err(MaterialError::NothingToSplit {
                at: available_units,
                count: self.texture_units.len(),
            });
        }

        let mut new_pass = Pass::new(self.context.clone(), self.index);
        let moved = self.texture_units.split_off(available_units);
        let (src, dest) = moved[0].colour_blend_fallback();
        new_pass.set_scene_blending_factors(src, dest);

        for (i, mut unit) in moved.into_iter().enumerate() {
            if i == 0 {
                unit.set_colour_operation_ex(
                    LayerBlendOperationEx::Source1,
                    LayerBlendSource::Texture,
                    LayerBlendSource::Current,
                );
            }
            unit.detach();
            new_pass.add_texture_unit_state(unit)?;
        }
        self.mark_dirty();
        Ok(new_pass)
    }

    /// Applies a filtering preset to every unit.
    pub fn set_texture_filtering(&mut self, filtering: TextureFilterOptions) {
        self.texture_units
            .iter_mut()
            .for_each(|u| u.set_texture_filtering(filtering));
    }

    /// Applies an anisotropy level to every unit.
    pub fn set_texture_anisotropy(&mut self, max_anisotropy: u32) {
        self.texture_units
            .iter_mut()
            .for_each(|u| u.set_texture_anisotropy(max_anisotropy));
    }

    /// Advances texture animations of every unit to `time` seconds. A
    /// frame change on either of the first two units marks the pass dirty.
    pub fn update_effects(&mut self, time: f32) {
        let frames_before = self.leading_frames();
        self.texture_units
            .iter_mut()
            .for_each(|u| u.update_effects(time));
        if self.leading_frames() != frames_before {
            self.mark_dirty();
        }
    }

    fn leading_frames(&self) -> [Option<usize>; 2] {
        [0, 1].map(|i| self.texture_units.get(i).map(TextureUnitState::current_frame))
    }

    // --- Programs ---

    /// Binds `program` to `slot`, or clears the slot with `None`.
    ///
    /// New parameter sets take the transpose and auto-add flags from the
    /// pipeline settings.
    pub fn set_program(&mut self, slot: ProgramSlot, program: Option<Arc<GpuProgram>>) {
        self.programs[slot.index()] = program.map(|program| {
            let mut usage = GpuProgramUsage::new(program);
            usage.parameters_mut().apply_settings(self.context.settings());
            usage
        });
    }

    /// The usage bound to `slot`.
    pub fn program_usage(&self, slot: ProgramSlot) -> Option<&GpuProgramUsage> {
        self.programs[slot.index()].as_ref()
    }

    /// Mutable access to the usage bound to `slot`.
    pub fn program_usage_mut(&mut self, slot: ProgramSlot) -> Option<&mut GpuProgramUsage> {
        self.programs[slot.index()].as_mut()
    }

    /// Returns `true` if `slot` has a program.
    pub fn has_program(&self, slot: ProgramSlot) -> bool {
        self.programs[slot.index()].is_some()
    }

    /// Returns `true` if a main vertex program is bound.
    pub fn has_vertex_program(&self) -> bool {
        self.has_program(ProgramSlot::Vertex)
    }

    /// Returns `true` if a main fragment program is bound.
    pub fn has_fragment_program(&self) -> bool {
        self.has_program(ProgramSlot::Fragment)
    }

    /// Returns `true` if the pass uses a main vertex or fragment program.
    pub fn is_programmable(&self) -> bool {
        self.has_vertex_program() || self.has_fragment_program()
    }

    // --- Resources ---

    /// Loads the textures of every unit.
    pub fn load(&mut self, textures: &dyn TextureManager) {
        self.texture_units.iter_mut().for_each(|u| u.load(textures));
    }

    /// Releases the textures of every unit.
    pub fn unload(&mut self) {
        self.texture_units.iter_mut().for_each(TextureUnitState::unload);
    }

    /// Returns `true` if every unit is loaded.
    pub fn is_loaded(&self) -> bool {
        self.texture_units.iter().all(TextureUnitState::is_loaded)
    }
}

impl fmt::Debug for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pass")
            .field("id", &self.id)
            .field("index", &self.index)
            .field("name", &self.name)
            .field("hash", &format_args!("{:#010x}", self.hash))
            .field("texture_units", &self.texture_units.len())
            .field("programmable", &self.is_programmable())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::GpuProgramType;

    fn context() -> Arc<MaterialContext> {
        Arc::new(MaterialContext::default())
    }

    #[test]
    fn test_alpha_blend_is_transparent() {
        let mut pass = Pass::new(context(), 0);
        pass.set_scene_blending(SceneBlendType::TransparentAlpha);
        assert!(pass.is_transparent());
    }

    #[test]
    fn test_replace_is_opaque() {
        let mut pass = Pass::new(context(), 0);
        pass.set_scene_blending_factors(SceneBlendFactor::One, SceneBlendFactor::Zero);
        assert!(!pass.is_transparent());
    }

    #[test]
    fn test_reading_destination_is_transparent() {
        let mut pass = Pass::new(context(), 0);
        pass.set_scene_blending_factors(SceneBlendFactor::DestColour, SceneBlendFactor::Zero);
        assert!(pass.is_transparent());
    }

    #[test]
    fn test_hash_layout() {
        let mut pass = Pass::new(context(), 3);
        assert_eq!(pass.hash(), 3 << 28);

        pass.create_texture_unit_state("");
        pass.create_texture_unit_state("detail.png");
        pass.recalculate_hash();
        assert_eq!(pass.hash() >> 28, 3);
        assert_eq!((pass.hash() >> 14) & 0x3FFF, 0, "blank first unit contributes nothing");
        assert_eq!(pass.hash() & 0x3FFF, name_hash("detail.png"));
    }

    #[test]
    fn test_hash_index_uses_four_bits() {
        let pass = Pass::new(context(), 17);
        assert_eq!(pass.hash(), 1 << 28);
    }

    #[test]
    fn test_unit_owned_by_other_pass_is_rejected() {
        let ctx = context();
        let mut a = Pass::new(ctx.clone(), 0);
        let mut b = Pass::new(ctx, 1);
        a.create_texture_unit_state("a.png");
        let unit = a.texture_unit_state(0).cloned().unwrap();

        assert_eq!(
            b.add_texture_unit_state(unit.clone()),
            Err(MaterialError::TextureUnitOwned { owner: a.id() })
        );

        let mut detached = unit;
        detached.detach();
        b.add_texture_unit_state(detached).unwrap();
        assert_eq!(b.texture_unit_state(0).unwrap().parent(), Some(b.id()));
    }

    #[test]
    fn test_split_moves_trailing_units() {
        let mut pass = Pass::new(context(), 0);
        for name in ["a.png", "b.png", "c.png"] {
            pass.create_texture_unit_state(name);
        }
        pass.texture_unit_state_mut(1)
            .unwrap()
            .set_colour_op_multipass_fallback(SceneBlendFactor::One, SceneBlendFactor::One);

        let new_pass = pass.split(1).unwrap();
        assert_eq!(pass.num_texture_unit_states(), 1);
        assert_eq!(new_pass.num_texture_unit_states(), 2);
        assert_eq!(new_pass.source_blend_factor(), SceneBlendFactor::One);
        assert_eq!(new_pass.dest_blend_factor(), SceneBlendFactor::One);

        let first = new_pass.texture_unit_state(0).unwrap();
        assert_eq!(first.texture_name(), "b.png");
        assert_eq!(first.colour_blend_mode().operation, LayerBlendOperationEx::Source1);
        assert_eq!(first.colour_blend_mode().source1, LayerBlendSource::Texture);
        assert_eq!(first.parent(), Some(new_pass.id()));
    }

    #[test]
    fn test_programmable_pass_cannot_split() {
        let mut pass = Pass::new(context(), 0);
        pass.create_texture_unit_state("a.png");
        pass.create_texture_unit_state("b.png");
        let program = Arc::new(GpuProgram::new("fp", GpuProgramType::Fragment, "wgsl"));
        pass.set_program(ProgramSlot::Fragment, Some(program));
        assert!(matches!(
            pass.split(1),
            Err(MaterialError::ProgrammablePassSplit { .. })
        ));
    }

    #[test]
    fn test_ambient_only() {
        let mut pass = Pass::new(context(), 0);
        assert!(!pass.is_ambient_only());
        pass.set_diffuse(LinearRgba::BLACK);
        assert!(pass.is_ambient_only());
        pass.set_diffuse(LinearRgba::WHITE);
        pass.set_lighting_enabled(false);
        assert!(pass.is_ambient_only());
    }

    #[test]
    fn test_duplicate_reparents_units() {
        let mut pass = Pass::new(context(), 0);
        pass.create_texture_unit_state("a.png");
        pass.set_shininess(12.0);
        let copy = pass.duplicate(1);
        assert_ne!(copy.id(), pass.id());
        assert_eq!(copy.index(), 1);
        assert_eq!(copy.shininess(), 12.0);
        assert_eq!(copy.texture_unit_state(0).unwrap().parent(), Some(copy.id()));
    }
}
