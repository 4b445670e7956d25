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

//! Texture unit state: one texture layer of a pass.
//!
//! A unit references up to [`MAX_FRAMES`] texture names (animated or cube
//! faces), describes how the layer blends with the previous stage, and
//! carries a texture-coordinate transform that is rebuilt lazily from its
//! scroll, scale and rotation parameters. Animated effects (scrolling,
//! rotation, waveform transforms, frame animation) are advanced with
//! [`TextureUnitState::update_effects`].

use crate::blend::{
    LayerBlendModeEx, LayerBlendOperation, LayerBlendOperationEx, LayerBlendSource,
    LayerBlendType,
};
use crate::error::{MaterialError, Result};
use crate::pass_registry::PassId;
use prism_core::math::{Affine2, LinearRgba, Vec2, TAU};
use prism_core::renderer::{
    Capabilities, FilterOptions, Frustum, RenderSystemCapabilities, SceneBlendFactor,
    TextureAddressingMode, TextureFilterOptions, TextureType,
};
use prism_core::{PipelineSettings, TextureHandle, TextureManager};

/// Maximum number of frames a texture unit can reference.
pub const MAX_FRAMES: usize = 32;

const CUBE_SUFFIXES: [&str; 6] = ["_fr", "_bk", "_lf", "_rt", "_up", "_dn"];

/// Periodic functions driving waveform transform effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveformType {
    /// Smooth sine wave.
    Sine,
    /// Linear ramp up and down.
    Triangle,
    /// Alternates between the maximum and minimum.
    Square,
    /// Ramps from minimum to maximum, then jumps back.
    Sawtooth,
    /// Ramps from maximum to minimum, then jumps back.
    InverseSawtooth,
}

impl WaveformType {
    /// Evaluates the waveform at `time`.
    ///
    /// The raw wave oscillates in `[-1, 1]` and is remapped to
    /// `[base, base + amplitude]`.
    pub fn evaluate(self, base: f32, frequency: f32, phase: f32, amplitude: f32, time: f32) -> f32 {
        let input = (time * frequency + phase).rem_euclid(1.0);
        let output = match self {
            Self::Sine => (input * TAU).sin(),
            Self::Triangle => {
                if input < 0.25 {
                    input * 4.0
                } else if input < 0.75 {
                    1.0 - (input - 0.25) * 4.0
                } else {
                    (input - 0.75) * 4.0 - 1.0
                }
            }
            Self::Square => {
                if input <= 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::Sawtooth => input * 2.0 - 1.0,
            Self::InverseSawtooth => -(input * 2.0 - 1.0),
        };
        base + (output + 1.0) * 0.5 * amplitude
    }
}

/// Texture coordinate generation for environment mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvMapType {
    /// Planar projection.
    Planar,
    /// Spherical projection.
    Curved,
    /// Cube map reflection vector.
    Reflection,
    /// Cube map normal vector.
    Normal,
}

/// Which texture-coordinate parameter a waveform transform drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTransformType {
    /// Horizontal scroll.
    TranslateU,
    /// Vertical scroll.
    TranslateV,
    /// Horizontal scale.
    ScaleU,
    /// Vertical scale.
    ScaleV,
    /// Rotation, in full turns.
    Rotate,
}

/// Discriminant of a [`TextureEffect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureEffectType {
    /// Environment mapping.
    EnvironmentMap,
    /// Constant horizontal scroll.
    UScroll,
    /// Constant vertical scroll.
    VScroll,
    /// Constant scroll on both axes.
    UVScroll,
    /// Constant rotation.
    Rotate,
    /// Waveform-driven transform.
    Transform,
    /// Projection from a frustum.
    ProjectiveTexture,
}

/// An automatic texture-coordinate effect.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureEffect {
    /// Generates coordinates from the view for environment mapping.
    EnvironmentMap(EnvMapType),
    /// Scrolls horizontally at `speed` texture widths per second.
    UScroll {
        /// Scroll speed.
        speed: f32,
    },
    /// Scrolls vertically at `speed` texture heights per second.
    VScroll {
        /// Scroll speed.
        speed: f32,
    },
    /// Scrolls on both axes at the same speed.
    UVScroll {
        /// Scroll speed.
        speed: f32,
    },
    /// Rotates anticlockwise at `speed` full turns per second.
    Rotate {
        /// Rotation speed.
        speed: f32,
    },
    /// Drives one transform parameter with a waveform.
    Transform {
        /// The driven parameter.
        transform: TextureTransformType,
        /// The wave shape.
        waveform: WaveformType,
        /// Minimum output.
        base: f32,
        /// Cycles per second.
        frequency: f32,
        /// Offset into the cycle, in `[0, 1)`.
        phase: f32,
        /// Output range above `base`.
        amplitude: f32,
    },
    /// Projects the texture from `projector`.
    ProjectiveTexture {
        /// The projecting frustum.
        projector: Frustum,
    },
}

impl TextureEffect {
    /// Returns the effect's discriminant.
    pub fn effect_type(&self) -> TextureEffectType {
        match self {
            Self::EnvironmentMap(_) => TextureEffectType::EnvironmentMap,
            Self::UScroll { .. } => TextureEffectType::UScroll,
            Self::VScroll { .. } => TextureEffectType::VScroll,
            Self::UVScroll { .. } => TextureEffectType::UVScroll,
            Self::Rotate { .. } => TextureEffectType::Rotate,
            Self::Transform { .. } => TextureEffectType::Transform,
            Self::ProjectiveTexture { .. } => TextureEffectType::ProjectiveTexture,
        }
    }
}

impl TextureEffectType {
    /// Returns `true` if a unit may carry at most one effect of this type.
    /// Waveform transforms stack; every other effect replaces its
    /// predecessor.
    pub fn is_unique(self) -> bool {
        self != Self::Transform
    }
}

/// Addressing modes for the three texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UvwAddressingMode {
    /// Horizontal.
    pub u: TextureAddressingMode,
    /// Vertical.
    pub v: TextureAddressingMode,
    /// Depth.
    pub w: TextureAddressingMode,
}

/// One texture layer of a [`Pass`](crate::Pass).
#[derive(Debug, Clone)]
pub struct TextureUnitState {
    parent: Option<PassId>,
    name: String,
    frames: Vec<String>,
    frame_handles: Vec<Option<TextureHandle>>,
    current_frame: usize,
    animation_duration: f32,
    cubic: bool,
    texture_type: TextureType,
    tex_coord_set: u32,
    address_mode: UvwAddressingMode,
    border_colour: LinearRgba,
    colour_blend: LayerBlendModeEx,
    alpha_blend: LayerBlendModeEx,
    colour_fallback: (SceneBlendFactor, SceneBlendFactor),
    min_filter: FilterOptions,
    mag_filter: FilterOptions,
    mip_filter: FilterOptions,
    max_anisotropy: u32,
    mipmap_bias: f32,
    u_scroll: f32,
    v_scroll: f32,
    u_scale: f32,
    v_scale: f32,
    rotation: f32,
    transform: Affine2,
    transform_dirty: bool,
    effects: Vec<TextureEffect>,
    loaded: bool,
}

impl TextureUnitState {
    /// Creates a blank unit with default filtering.
    pub fn new() -> Self {
        Self::with_settings(&PipelineSettings::default())
    }

    /// Creates a blank unit that filters according to `settings`.
    pub fn with_settings(settings: &PipelineSettings) -> Self {
        let (min_filter, mag_filter, mip_filter) = settings.default_texture_filtering.to_filters();
        Self {
            parent: None,
            name: String::new(),
            frames: Vec::new(),
            frame_handles: Vec::new(),
            current_frame: 0,
            animation_duration: 0.0,
            cubic: false,
            texture_type: TextureType::TwoD,
            tex_coord_set: 0,
            address_mode: UvwAddressingMode::default(),
            border_colour: LinearRgba::BLACK,
            colour_blend: LayerBlendModeEx::modulate(LayerBlendType::Colour),
            alpha_blend: LayerBlendModeEx::modulate(LayerBlendType::Alpha),
            colour_fallback: (SceneBlendFactor::DestColour, SceneBlendFactor::Zero),
            min_filter,
            mag_filter,
            mip_filter,
            max_anisotropy: settings.default_max_anisotropy,
            mipmap_bias: 0.0,
            u_scroll: 0.0,
            v_scroll: 0.0,
            u_scale: 1.0,
            v_scale: 1.0,
            rotation: 0.0,
            transform: Affine2::IDENTITY,
            transform_dirty: false,
            effects: Vec::new(),
            loaded: false,
        }
    }

    /// Creates a unit showing a single 2D texture.
    pub fn with_texture(texture_name: &str) -> Self {
        let mut unit = Self::new();
        unit.set_texture_name(texture_name, TextureType::TwoD);
        unit
    }

    /// Copies every setting of `other` into `self`, keeping this unit's
    /// parent link.
    pub fn copy_from(&mut self, other: &TextureUnitState) {
        let parent = self.parent;
        *self = other.clone();
        self.parent = parent;
        self.transform_dirty = true;
    }

    // --- Ownership ---

    /// The pass this unit is attached to.
    pub fn parent(&self) -> Option<PassId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<PassId>) {
        self.parent = parent;
    }

    /// Releases the unit from its pass so it can be added to another one.
    pub fn detach(&mut self) {
        self.parent = None;
    }

    // --- Naming and frames ---

    /// The unit's own name (not the texture's).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the unit's own name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Shows a single texture. A cube map type is treated as a combined
    /// cube texture.
    pub fn set_texture_name(&mut self, texture_name: &str, texture_type: TextureType) {
        if texture_type == TextureType::CubeMap {
            self.set_cubic_texture_name(texture_name, true);
            return;
        }
        self.set_frames(vec![texture_name.to_owned()]);
        self.texture_type = texture_type;
        self.cubic = false;
        self.animation_duration = 0.0;
    }

    /// Shows a cube texture.
    ///
    /// With `for_uvw` the name is a single combined cube map sampled with
    /// 3D coordinates. Otherwise six separate 2D faces are derived from the
    /// name by inserting `_fr`, `_bk`, `_lf`, `_rt`, `_up` and `_dn` before
    /// the extension.
    pub fn set_cubic_texture_name(&mut self, texture_name: &str, for_uvw: bool) {
        if for_uvw {
            self.set_frames(vec![texture_name.to_owned()]);
            self.texture_type = TextureType::CubeMap;
        } else {
            let (base, ext) = split_extension(texture_name);
            let faces = CUBE_SUFFIXES
                .iter()
                .map(|suffix| format!("{base}{suffix}{ext}"))
                .collect();
            self.set_frames(faces);
            self.texture_type = TextureType::TwoD;
        }
        self.cubic = true;
        self.animation_duration = 0.0;
    }

    /// Shows a cube texture made of six explicitly named faces, in the
    /// order front, back, left, right, up, down.
    pub fn set_cubic_texture_names(&mut self, faces: &[&str; 6], for_uvw: bool) {
        self.set_frames(faces.iter().map(|f| (*f).to_owned()).collect());
        self.texture_type = if for_uvw {
            TextureType::CubeMap
        } else {
            TextureType::TwoD
        };
        self.cubic = true;
        self.animation_duration = 0.0;
    }

    /// Shows an animated texture whose frames are named `base_0.ext`,
    /// `base_1.ext` and so on. A `duration` of zero disables automatic
    /// frame advance.
    pub fn set_animated_texture_name(
        &mut self,
        texture_name: &str,
        num_frames: usize,
        duration: f32,
    ) -> Result<()> {
        if num_frames > MAX_FRAMES {
            return Err(MaterialError::TooManyFrames {
                requested: num_frames,
                max: MAX_FRAMES,
            });
        }
        let (base, ext) = split_extension(texture_name);
        let frames = (0..num_frames)
            .map(|i| format!("{base}_{i}{ext}"))
            .collect();
        self.set_frames(frames);
        self.animation_duration = duration;
        self.cubic = false;
        Ok(())
    }

    /// Shows an animated texture made of explicitly named frames.
    pub fn set_animated_texture_names(&mut self, names: &[&str], duration: f32) -> Result<()> {
        if names.len() > MAX_FRAMES {
            return Err(MaterialError::TooManyFrames {
                requested: names.len(),
                max: MAX_FRAMES,
            });
        }
        self.set_frames(names.iter().map(|n| (*n).to_owned()).collect());
        self.animation_duration = duration;
        self.cubic = false;
        Ok(())
    }

    fn set_frames(&mut self, frames: Vec<String>) {
        self.frame_handles = vec![None; frames.len()];
        self.frames = frames;
        self.current_frame = 0;
        self.loaded = false;
    }

    /// Replaces the name of one frame.
    pub fn set_frame_texture_name(&mut self, texture_name: &str, frame: usize) -> Result<()> {
        let count = self.frames.len();
        let slot = self
            .frames
            .get_mut(frame)
            .ok_or(MaterialError::FrameIndexOutOfRange { index: frame, count })?;
        *slot = texture_name.to_owned();
        self.frame_handles[frame] = None;
        Ok(())
    }

    /// Appends a frame.
    pub fn add_frame_texture_name(&mut self, texture_name: &str) -> Result<()> {
        if self.frames.len() >= MAX_FRAMES {
            return Err(MaterialError::TooManyFrames {
                requested: self.frames.len() + 1,
                max: MAX_FRAMES,
            });
        }
        self.frames.push(texture_name.to_owned());
        self.frame_handles.push(None);
        Ok(())
    }

    /// Removes a frame.
    pub fn delete_frame_texture_name(&mut self, frame: usize) -> Result<()> {
        if frame >= self.frames.len() {
            return Err(MaterialError::FrameIndexOutOfRange {
                index: frame,
                count: self.frames.len(),
            });
        }
        self.frames.remove(frame);
        self.frame_handles.remove(frame);
        if self.current_frame >= self.frames.len() {
            self.current_frame = 0;
        }
        Ok(())
    }

    /// The name of one frame.
    pub fn frame_texture_name(&self, frame: usize) -> Option<&str> {
        self.frames.get(frame).map(String::as_str)
    }

    /// Number of frames.
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Selects the frame to display.
    pub fn set_current_frame(&mut self, frame: usize) -> Result<()> {
        if frame >= self.frames.len() {
            return Err(MaterialError::FrameIndexOutOfRange {
                index: frame,
                count: self.frames.len(),
            });
        }
        self.current_frame = frame;
        Ok(())
    }

    /// The frame currently displayed.
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Seconds for one cycle through all frames.
    pub fn animation_duration(&self) -> f32 {
        self.animation_duration
    }

    /// The name of the texture currently displayed, or `""`.
    pub fn texture_name(&self) -> &str {
        self.frames
            .get(self.current_frame)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Returns `true` if the unit shows no texture.
    pub fn is_blank(&self) -> bool {
        self.frames.first().is_none_or(|f| f.is_empty())
    }

    /// Returns `true` for cube textures, combined or separate.
    pub fn is_cubic(&self) -> bool {
        self.cubic
    }

    /// Returns `true` for volume textures.
    pub fn is_3d(&self) -> bool {
        self.texture_type == TextureType::ThreeD
    }

    /// The texture type requested from the loader.
    pub fn texture_type(&self) -> TextureType {
        self.texture_type
    }

    // --- Sampling ---

    /// Which vertex texture-coordinate set feeds this unit.
    pub fn tex_coord_set(&self) -> u32 {
        self.tex_coord_set
    }

    /// Selects the vertex texture-coordinate set.
    pub fn set_tex_coord_set(&mut self, set: u32) {
        self.tex_coord_set = set;
    }

    /// The addressing modes.
    pub fn addressing_mode(&self) -> UvwAddressingMode {
        self.address_mode
    }

    /// Uses the same addressing mode on all three axes.
    pub fn set_addressing_mode(&mut self, mode: TextureAddressingMode) {
        self.address_mode = UvwAddressingMode {
            u: mode,
            v: mode,
            w: mode,
        };
    }

    /// Sets per-axis addressing modes.
    pub fn set_addressing_mode_uvw(&mut self, mode: UvwAddressingMode) {
        self.address_mode = mode;
    }

    /// Colour used by [`TextureAddressingMode::Border`].
    pub fn border_colour(&self) -> LinearRgba {
        self.border_colour
    }

    /// Sets the border colour.
    pub fn set_border_colour(&mut self, colour: LinearRgba) {
        self.border_colour = colour;
    }

    /// Applies a filtering preset.
    pub fn set_texture_filtering(&mut self, filtering: TextureFilterOptions) {
        let (min, mag, mip) = filtering.to_filters();
        self.set_filtering(min, mag, mip);
    }

    /// Sets the min, mag and mip filters.
    pub fn set_filtering(&mut self, min: FilterOptions, mag: FilterOptions, mip: FilterOptions) {
        self.min_filter = min;
        self.mag_filter = mag;
        self.mip_filter = mip;
    }

    /// Returns `(min, mag, mip)` filters.
    pub fn filtering(&self) -> (FilterOptions, FilterOptions, FilterOptions) {
        (self.min_filter, self.mag_filter, self.mip_filter)
    }

    /// Sets the anisotropy level.
    pub fn set_texture_anisotropy(&mut self, max_anisotropy: u32) {
        self.max_anisotropy = max_anisotropy;
    }

    /// The anisotropy level.
    pub fn texture_anisotropy(&self) -> u32 {
        self.max_anisotropy
    }

    /// Sets the mipmap level-of-detail bias.
    pub fn set_texture_mipmap_bias(&mut self, bias: f32) {
        self.mipmap_bias = bias;
    }

    /// The mipmap level-of-detail bias.
    pub fn texture_mipmap_bias(&self) -> f32 {
        self.mipmap_bias
    }

    // --- Blending ---

    /// Applies a simple colour blend preset together with its multipass
    /// fallback.
    pub fn set_colour_operation(&mut self, op: LayerBlendOperation) {
        let (operation, source1, source2) = op.to_ex();
        self.set_colour_operation_ex(operation, source1, source2);
        let (src, dest) = op.multipass_fallback();
        self.set_colour_op_multipass_fallback(src, dest);
    }

    /// Sets the colour blend operation and its inputs.
    pub fn set_colour_operation_ex(
        &mut self,
        operation: LayerBlendOperationEx,
        source1: LayerBlendSource,
        source2: LayerBlendSource,
    ) {
        self.colour_blend.operation = operation;
        self.colour_blend.source1 = source1;
        self.colour_blend.source2 = source2;
    }

    /// Replaces the whole colour blend description.
    pub fn set_colour_blend_mode(&mut self, mode: LayerBlendModeEx) {
        self.colour_blend = LayerBlendModeEx {
            blend_type: LayerBlendType::Colour,
            ..mode
        };
    }

    /// The colour blend description.
    pub fn colour_blend_mode(&self) -> &LayerBlendModeEx {
        &self.colour_blend
    }

    /// Sets the alpha blend operation and its inputs.
    pub fn set_alpha_operation(
        &mut self,
        operation: LayerBlendOperationEx,
        source1: LayerBlendSource,
        source2: LayerBlendSource,
    ) {
        self.alpha_blend.operation = operation;
        self.alpha_blend.source1 = source1;
        self.alpha_blend.source2 = source2;
    }

    /// Replaces the whole alpha blend description.
    pub fn set_alpha_blend_mode(&mut self, mode: LayerBlendModeEx) {
        self.alpha_blend = LayerBlendModeEx {
            blend_type: LayerBlendType::Alpha,
            ..mode
        };
    }

    /// The alpha blend description.
    pub fn alpha_blend_mode(&self) -> &LayerBlendModeEx {
        &self.alpha_blend
    }

    /// Sets the scene blend used when this layer is rendered in a pass of
    /// its own.
    pub fn set_colour_op_multipass_fallback(&mut self, src: SceneBlendFactor, dest: SceneBlendFactor) {
        self.colour_fallback = (src, dest);
    }

    /// Returns `(source, destination)` multipass fallback factors.
    pub fn colour_blend_fallback(&self) -> (SceneBlendFactor, SceneBlendFactor) {
        self.colour_fallback
    }

    // --- Texture transform ---

    /// Sets the scroll offsets.
    pub fn set_texture_scroll(&mut self, u: f32, v: f32) {
        self.u_scroll = u;
        self.v_scroll = v;
        self.transform_dirty = true;
    }

    /// Sets the horizontal scroll offset.
    pub fn set_texture_u_scroll(&mut self, u: f32) {
        self.u_scroll = u;
        self.transform_dirty = true;
    }

    /// Sets the vertical scroll offset.
    pub fn set_texture_v_scroll(&mut self, v: f32) {
        self.v_scroll = v;
        self.transform_dirty = true;
    }

    /// Sets the scale factors. Values above one shrink the texture.
    pub fn set_texture_scale(&mut self, u: f32, v: f32) {
        self.u_scale = u;
        self.v_scale = v;
        self.transform_dirty = true;
    }

    /// Sets the anticlockwise rotation, in radians.
    pub fn set_texture_rotate(&mut self, angle: f32) {
        self.rotation = angle;
        self.transform_dirty = true;
    }

    /// Returns `(u_scroll, v_scroll)`.
    pub fn texture_scroll(&self) -> Vec2 {
        Vec2::new(self.u_scroll, self.v_scroll)
    }

    /// Returns `(u_scale, v_scale)`.
    pub fn texture_scale(&self) -> Vec2 {
        Vec2::new(self.u_scale, self.v_scale)
    }

    /// The rotation, in radians.
    pub fn texture_rotate(&self) -> f32 {
        self.rotation
    }

    /// Overrides the texture transform. Subsequent scroll, scale or rotate
    /// changes rebuild it from those parameters again.
    pub fn set_texture_transform(&mut self, transform: Affine2) {
        self.transform = transform;
        self.transform_dirty = false;
    }

    /// Returns the texture-coordinate transform, rebuilding it if any of
    /// its parameters changed.
    pub fn texture_transform(&mut self) -> Affine2 {
        if self.transform_dirty {
            self.transform = self.build_transform();
            self.transform_dirty = false;
        }
        self.transform
    }

    // Scale about the centre, then scroll, then rotate about the centre.
    fn build_transform(&self) -> Affine2 {
        let mut xform = Affine2::IDENTITY;
        if self.u_scale != 1.0 || self.v_scale != 1.0 {
            let inv = Vec2::new(1.0 / self.u_scale, 1.0 / self.v_scale);
            xform = Affine2::from_scale_angle_translation(inv, 0.0, Vec2::splat(0.5) - inv * 0.5);
        }
        if self.u_scroll != 0.0 || self.v_scroll != 0.0 {
            xform = Affine2::from_translation(Vec2::new(self.u_scroll, self.v_scroll)) * xform;
        }
        if self.rotation != 0.0 {
            let (sin, cos) = self.rotation.sin_cos();
            let centre = Vec2::new(0.5 - 0.5 * cos + 0.5 * sin, 0.5 - 0.5 * sin - 0.5 * cos);
            xform = Affine2::from_angle_translation(self.rotation, centre) * xform;
        }
        xform
    }

    // --- Effects ---

    /// Adds an effect. Effects of a unique type replace any existing effect
    /// of the same type.
    pub fn add_effect(&mut self, effect: TextureEffect) {
        let ty = effect.effect_type();
        if ty.is_unique() {
            self.remove_effect(ty);
        }
        self.effects.push(effect);
    }

    /// Removes every effect of the given type.
    pub fn remove_effect(&mut self, ty: TextureEffectType) {
        self.effects.retain(|e| e.effect_type() != ty);
    }

    /// Removes every effect.
    pub fn remove_all_effects(&mut self) {
        self.effects.clear();
    }

    /// The effects, in insertion order.
    pub fn effects(&self) -> &[TextureEffect] {
        &self.effects
    }

    /// Turns environment mapping on or off.
    pub fn set_environment_map(&mut self, enable: bool, env_type: EnvMapType) {
        if enable {
            self.add_effect(TextureEffect::EnvironmentMap(env_type));
        } else {
            self.remove_effect(TextureEffectType::EnvironmentMap);
        }
    }

    /// Scrolls the texture at constant speeds. Equal speeds use a single
    /// combined effect.
    pub fn set_scroll_animation(&mut self, u_speed: f32, v_speed: f32) {
        self.remove_effect(TextureEffectType::UVScroll);
        self.remove_effect(TextureEffectType::UScroll);
        self.remove_effect(TextureEffectType::VScroll);
        if u_speed == 0.0 && v_speed == 0.0 {
            return;
        }
        if u_speed == v_speed {
            self.add_effect(TextureEffect::UVScroll { speed: u_speed });
        } else {
            if u_speed != 0.0 {
                self.add_effect(TextureEffect::UScroll { speed: u_speed });
            }
            if v_speed != 0.0 {
                self.add_effect(TextureEffect::VScroll { speed: v_speed });
            }
        }
    }

    /// Rotates the texture at `speed` turns per second. Zero disables it.
    pub fn set_rotate_animation(&mut self, speed: f32) {
        self.remove_effect(TextureEffectType::Rotate);
        if speed != 0.0 {
            self.add_effect(TextureEffect::Rotate { speed });
        }
    }

    /// Drives one transform parameter with a waveform.
    pub fn set_transform_animation(
        &mut self,
        transform: TextureTransformType,
        waveform: WaveformType,
        base: f32,
        frequency: f32,
        phase: f32,
        amplitude: f32,
    ) {
        self.add_effect(TextureEffect::Transform {
            transform,
            waveform,
            base,
            frequency,
            phase,
            amplitude,
        });
    }

    /// Projects the texture from `projector`, or stops projecting.
    pub fn set_projective_texturing(&mut self, projector: Option<Frustum>) {
        match projector {
            Some(projector) => self.add_effect(TextureEffect::ProjectiveTexture { projector }),
            None => self.remove_effect(TextureEffectType::ProjectiveTexture),
        }
    }

    /// The frustum projecting this texture, if any.
    pub fn projector(&self) -> Option<&Frustum> {
        self.effects.iter().find_map(|e| match e {
            TextureEffect::ProjectiveTexture { projector } => Some(projector),
            _ => None,
        })
    }

    /// Returns `true` if coordinates are generated from the view, which
    /// makes the unit camera dependent.
    pub fn has_view_relative_texture_coordinate_generation(&self) -> bool {
        self.effects.iter().any(|e| {
            matches!(
                e,
                TextureEffect::EnvironmentMap(EnvMapType::Reflection | EnvMapType::Normal)
                    | TextureEffect::ProjectiveTexture { .. }
            )
        })
    }

    /// Advances every animated effect and the frame animation to `time`
    /// seconds.
    pub fn update_effects(&mut self, time: f32) {
        let mut changed = false;
        for effect in &self.effects {
            match *effect {
                TextureEffect::UScroll { speed } => {
                    self.u_scroll = (speed * time).rem_euclid(1.0);
                    changed = true;
                }
                TextureEffect::VScroll { speed } => {
                    self.v_scroll = (speed * time).rem_euclid(1.0);
                    changed = true;
                }
                TextureEffect::UVScroll { speed } => {
                    let offset = (speed * time).rem_euclid(1.0);
                    self.u_scroll = offset;
                    self.v_scroll = offset;
                    changed = true;
                }
                TextureEffect::Rotate { speed } => {
                    self.rotation = (speed * time).rem_euclid(1.0) * TAU;
                    changed = true;
                }
                TextureEffect::Transform {
                    transform,
                    waveform,
                    base,
                    frequency,
                    phase,
                    amplitude,
                } => {
                    let value = waveform.evaluate(base, frequency, phase, amplitude, time);
                    match transform {
                        TextureTransformType::TranslateU => self.u_scroll = value,
                        TextureTransformType::TranslateV => self.v_scroll = value,
                        TextureTransformType::ScaleU => self.u_scale = value,
                        TextureTransformType::ScaleV => self.v_scale = value,
                        TextureTransformType::Rotate => self.rotation = value * TAU,
                    }
                    changed = true;
                }
                TextureEffect::EnvironmentMap(_) | TextureEffect::ProjectiveTexture { .. } => {}
            }
        }
        if changed {
            self.transform_dirty = true;
        }

        let frames = self.frames.len();
        if self.animation_duration > 0.0 && frames > 1 && !self.cubic {
            let cycle = (time / self.animation_duration).rem_euclid(1.0);
            self.current_frame = ((cycle * frames as f32) as usize).min(frames - 1);
        }
    }

    // --- Capability checks and loading ---

    /// Names the hardware feature this unit needs but `caps` lacks.
    pub fn unsupported_feature(&self, caps: &RenderSystemCapabilities) -> Option<&'static str> {
        if self.texture_type == TextureType::CubeMap
            && !caps.has_capability(Capabilities::CUBE_MAPPING)
        {
            return Some("Cube maps");
        }
        if self.texture_type == TextureType::ThreeD && !caps.has_capability(Capabilities::TEXTURE_3D)
        {
            return Some("Volume textures");
        }
        if self.colour_blend.requires_dot3() && !caps.has_capability(Capabilities::DOT3) {
            return Some("DOT3 blending");
        }
        None
    }

    /// Resolves every frame through `textures`. Frames that fail to load
    /// stay empty and are reported through the log.
    pub fn load(&mut self, textures: &dyn TextureManager) {
        for (name, handle) in self.frames.iter().zip(self.frame_handles.iter_mut()) {
            if name.is_empty() {
                continue;
            }
            *handle = textures.load(name, self.texture_type);
            if handle.is_none() {
                log::error!("Error loading texture '{name}': texture unit will be blank");
            }
        }
        self.loaded = true;
    }

    /// Releases every resolved frame.
    pub fn unload(&mut self) {
        self.frame_handles.iter_mut().for_each(|h| *h = None);
        self.loaded = false;
    }

    /// Returns `true` after [`TextureUnitState::load`].
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The loaded texture of the current frame.
    pub fn current_texture(&self) -> Option<&TextureHandle> {
        self.frame_handles
            .get(self.current_frame)
            .and_then(Option::as_ref)
    }
}

impl Default for TextureUnitState {
    fn default() -> Self {
        Self::new()
    }
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => name.split_at(pos),
        None => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_animated_frame_names() {
        let mut unit = TextureUnitState::new();
        unit.set_animated_texture_name("flame.png", 3, 1.5).unwrap();
        assert_eq!(unit.num_frames(), 3);
        assert_eq!(unit.frame_texture_name(0), Some("flame_0.png"));
        assert_eq!(unit.frame_texture_name(2), Some("flame_2.png"));
        assert_eq!(unit.texture_name(), "flame_0.png");
    }

    #[test]
    fn test_too_many_frames_is_rejected() {
        let mut unit = TextureUnitState::new();
        let err = unit.set_animated_texture_name("x.png", MAX_FRAMES + 1, 1.0);
        assert!(matches!(err, Err(MaterialError::TooManyFrames { .. })));
    }

    #[test]
    fn test_separate_cube_faces() {
        let mut unit = TextureUnitState::new();
        unit.set_cubic_texture_name("sky.jpg", false);
        assert!(unit.is_cubic());
        assert_eq!(unit.texture_type(), TextureType::TwoD);
        assert_eq!(unit.frame_texture_name(0), Some("sky_fr.jpg"));
        assert_eq!(unit.frame_texture_name(5), Some("sky_dn.jpg"));
    }

    #[test]
    fn test_combined_cube_needs_cube_mapping() {
        let mut unit = TextureUnitState::new();
        unit.set_texture_name("env.dds", TextureType::CubeMap);
        let caps = RenderSystemCapabilities::new(8);
        assert_eq!(unit.unsupported_feature(&caps), Some("Cube maps"));
        let caps = caps.with(Capabilities::CUBE_MAPPING);
        assert_eq!(unit.unsupported_feature(&caps), None);
    }

    #[test]
    fn test_blank_unit() {
        assert!(TextureUnitState::new().is_blank());
        assert!(!TextureUnitState::with_texture("a.png").is_blank());
    }

    #[test]
    fn test_scale_is_about_the_centre() {
        let mut unit = TextureUnitState::new();
        unit.set_texture_scale(2.0, 2.0);
        let xform = unit.texture_transform();
        let centre = xform.transform_point2(Vec2::splat(0.5));
        assert_relative_eq!(centre.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(centre.y, 0.5, epsilon = 1e-6);
        let corner = xform.transform_point2(Vec2::ONE);
        assert_relative_eq!(corner.x, 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_is_about_the_centre() {
        let mut unit = TextureUnitState::new();
        unit.set_texture_rotate(std::f32::consts::FRAC_PI_2);
        let xform = unit.texture_transform();
        let centre = xform.transform_point2(Vec2::splat(0.5));
        assert_relative_eq!(centre.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(centre.y, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_transform_is_rebuilt_lazily() {
        let mut unit = TextureUnitState::new();
        assert_eq!(unit.texture_transform(), Affine2::IDENTITY);
        unit.set_texture_scroll(0.25, 0.0);
        let moved = unit.texture_transform().transform_point2(Vec2::ZERO);
        assert_relative_eq!(moved.x, 0.25);
    }

    #[test]
    fn test_unique_effects_replace_and_transforms_stack() {
        let mut unit = TextureUnitState::new();
        unit.set_rotate_animation(1.0);
        unit.set_rotate_animation(2.0);
        unit.set_transform_animation(TextureTransformType::ScaleU, WaveformType::Sine, 1.0, 1.0, 0.0, 0.5);
        unit.set_transform_animation(TextureTransformType::ScaleV, WaveformType::Sine, 1.0, 1.0, 0.0, 0.5);
        assert_eq!(unit.effects().len(), 3);
        assert!(unit.effects().contains(&TextureEffect::Rotate { speed: 2.0 }));
    }

    #[test]
    fn test_scroll_animation_splits_unequal_speeds() {
        let mut unit = TextureUnitState::new();
        unit.set_scroll_animation(0.5, 0.5);
        assert_eq!(unit.effects(), &[TextureEffect::UVScroll { speed: 0.5 }]);
        unit.set_scroll_animation(0.5, 0.25);
        assert_eq!(unit.effects().len(), 2);
    }

    #[test]
    fn test_update_effects_scrolls_and_wraps() {
        let mut unit = TextureUnitState::new();
        unit.set_scroll_animation(0.5, 0.0);
        unit.update_effects(3.0);
        assert_relative_eq!(unit.texture_scroll().x, 0.5);
        unit.update_effects(1.0);
        assert_relative_eq!(unit.texture_scroll().x, 0.5);
        unit.update_effects(0.5);
        assert_relative_eq!(unit.texture_scroll().x, 0.25);
    }

    #[test]
    fn test_update_effects_advances_frames() {
        let mut unit = TextureUnitState::new();
        unit.set_animated_texture_name("f.png", 4, 2.0).unwrap();
        unit.update_effects(1.0);
        assert_eq!(unit.current_frame(), 2);
        unit.update_effects(2.5);
        assert_eq!(unit.current_frame(), 1);
    }

    #[test]
    fn test_waveforms() {
        assert_relative_eq!(WaveformType::Sine.evaluate(0.0, 1.0, 0.0, 2.0, 0.25), 2.0, epsilon = 1e-5);
        assert_relative_eq!(WaveformType::Square.evaluate(1.0, 1.0, 0.0, 1.0, 0.75), 1.0);
        assert_relative_eq!(WaveformType::Sawtooth.evaluate(0.0, 1.0, 0.0, 1.0, 0.5), 0.5);
        assert_relative_eq!(WaveformType::InverseSawtooth.evaluate(0.0, 1.0, 0.0, 1.0, 0.25), 0.75);
        assert_relative_eq!(WaveformType::Triangle.evaluate(0.0, 1.0, 0.0, 1.0, 0.25), 1.0);
    }

    #[test]
    fn test_copy_from_keeps_parent() {
        let mut source = TextureUnitState::with_texture("a.png");
        source.set_texture_scale(2.0, 2.0);
        let mut target = TextureUnitState::new();
        target.copy_from(&source);
        assert_eq!(target.texture_name(), "a.png");
        assert_eq!(target.parent(), None);
        assert_eq!(target.texture_scale(), Vec2::splat(2.0));
    }

    #[test]
    fn test_simple_colour_op_sets_fallback() {
        let mut unit = TextureUnitState::new();
        unit.set_colour_operation(LayerBlendOperation::Add);
        assert_eq!(unit.colour_blend_mode().operation, LayerBlendOperationEx::Add);
        assert_eq!(
            unit.colour_blend_fallback(),
            (SceneBlendFactor::One, SceneBlendFactor::One)
        );
    }
}
