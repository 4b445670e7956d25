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

//! The per-render cache of scene values read by auto-constants.
//!
//! [`AutoParamDataSource`] holds references to the current renderable,
//! camera, viewport, pass, scene manager and light list, and derives
//! matrices and vectors from them on demand. Every derived field has a dirty
//! bit; the upstream setters clear the bits of every field that depends on
//! them according to one dependency table, [`DEPENDENCIES`], so no setter
//! can forget a dependent field.

use crate::pass::Pass;
use crate::render_state::{FogState, RenderState};
use prism_core::math::{LinearRgba, Mat4, Vec3, Vec4};
use prism_core::renderer::{
    Camera, Frustum, Light, LightType, RenderSystemCapabilities, RenderTarget, Viewport,
};
use prism_core::{Renderable, SceneManager, VisibleObjectsBoundsInfo};
use std::sync::OnceLock;

/// Number of texture projector slots.
pub const MAX_TEXTURE_PROJECTORS: usize = 8;

/// Depth range reported when no real range is known.
pub const DUMMY_DEPTH_RANGE: Vec4 = Vec4::new(0.0, 100_000.0, 100_000.0, 1.0 / 100_000.0);

/// Maps clip space `[-1, 1]` to texture space `[0, 1]`, flipping `v`.
const CLIP_TO_IMAGE: Mat4 = Mat4::from_cols(
    Vec4::new(0.5, 0.0, 0.0, 0.0),
    Vec4::new(0.0, -0.5, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 1.0, 0.0),
    Vec4::new(0.5, 0.5, 0.0, 1.0),
);

/// A value the data source derives and caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DerivedField {
    /// World matrix, world matrix count and world matrix array.
    World,
    View,
    InverseView,
    Projection,
    InverseProjection,
    ViewProj,
    InverseViewProj,
    InverseWorld,
    InverseTransposeWorld,
    WorldView,
    InverseWorldView,
    InverseTransposeWorldView,
    WorldViewProj,
    InverseWorldViewProj,
    CameraPosition,
    CameraPositionObjectSpace,
    SceneDepthRange,
    ShadowSceneDepthRange,
}

impl DerivedField {
    /// Every field, in declaration order.
    pub const ALL: [Self; 18] = [
        Self::World,
        Self::View,
        Self::InverseView,
        Self::Projection,
        Self::InverseProjection,
        Self::ViewProj,
        Self::InverseViewProj,
        Self::InverseWorld,
        Self::InverseTransposeWorld,
        Self::WorldView,
        Self::InverseWorldView,
        Self::InverseTransposeWorldView,
        Self::WorldViewProj,
        Self::InverseWorldViewProj,
        Self::CameraPosition,
        Self::CameraPositionObjectSpace,
        Self::SceneDepthRange,
        Self::ShadowSceneDepthRange,
    ];

    fn bit(self) -> u64 {
        1 << self as u32
    }
}

/// A piece of state set from outside the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Upstream {
    Renderable,
    Camera,
    RenderTarget,
    LightList,
    MainCamBoundsInfo,
    SceneManager,
}

impl Upstream {
    /// Every upstream input, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Renderable,
        Self::Camera,
        Self::RenderTarget,
        Self::LightList,
        Self::MainCamBoundsInfo,
        Self::SceneManager,
    ];
}

/// Something a derived field is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// State set from outside.
    Upstream(Upstream),
    /// Another derived field.
    Field(DerivedField),
}

use DerivedField as F;
use Input::{Field as D, Upstream as U};

/// Direct inputs of every derived field.
pub const DEPENDENCIES: &[(DerivedField, &[Input])] = &[
    (F::World, &[U(Upstream::Renderable)]),
    (F::View, &[U(Upstream::Renderable), U(Upstream::Camera)]),
    (F::InverseView, &[D(F::View)]),
    (
        F::Projection,
        &[U(Upstream::Renderable), U(Upstream::Camera), U(Upstream::RenderTarget)],
    ),
    (F::InverseProjection, &[D(F::Projection)]),
    (F::ViewProj, &[D(F::View), D(F::Projection)]),
    (F::InverseViewProj, &[D(F::ViewProj)]),
    (F::InverseWorld, &[D(F::World)]),
    (F::InverseTransposeWorld, &[D(F::InverseWorld)]),
    (F::WorldView, &[D(F::World), D(F::View)]),
    (F::InverseWorldView, &[D(F::WorldView)]),
    (F::InverseTransposeWorldView, &[D(F::InverseWorldView)]),
    (F::WorldViewProj, &[D(F::Projection), D(F::WorldView)]),
    (F::InverseWorldViewProj, &[D(F::WorldViewProj)]),
    (F::CameraPosition, &[U(Upstream::Camera)]),
    (F::CameraPositionObjectSpace, &[U(Upstream::Camera), D(F::InverseWorld)]),
    (F::SceneDepthRange, &[U(Upstream::MainCamBoundsInfo)]),
    (
        F::ShadowSceneDepthRange,
        &[U(Upstream::LightList), U(Upstream::SceneManager)],
    ),
];

/// Bit mask of every field that transitively depends on `upstream`.
pub fn invalidation_mask(upstream: Upstream) -> u64 {
    static MASKS: OnceLock<[u64; Upstream::ALL.len()]> = OnceLock::new();
    let masks = MASKS.get_or_init(|| {
        let mut masks = [0; Upstream::ALL.len()];
        for upstream in Upstream::ALL {
            let mut mask = 0u64;
            loop {
                let before = mask;
                for (field, inputs) in DEPENDENCIES {
                    let affected = inputs.iter().any(|input| match *input {
                        Input::Upstream(u) => u == upstream,
                        Input::Field(f) => mask & f.bit() != 0,
                    });
                    if affected {
                        mask |= field.bit();
                    }
                }
                if mask == before {
                    break;
                }
            }
            masks[upstream as usize] = mask;
        }
        masks
    });
    masks[upstream as usize]
}

/// Returns the fields invalidated by setting `upstream`.
pub fn invalidated_fields(upstream: Upstream) -> impl Iterator<Item = DerivedField> {
    let mask = invalidation_mask(upstream);
    DerivedField::ALL
        .into_iter()
        .filter(move |f| mask & f.bit() != 0)
}

/// Lazily derived scene values for one render.
///
/// Not thread-safe; one instance lives on the render thread and is updated
/// as objects are drawn.
pub struct AutoParamDataSource<'a> {
    renderable: Option<&'a dyn Renderable>,
    camera: Option<&'a Camera>,
    viewport: Option<&'a Viewport>,
    render_target: Option<&'a RenderTarget>,
    pass: Option<&'a Pass>,
    scene_manager: Option<&'a dyn SceneManager>,
    lights: &'a [Light],
    main_cam_bounds: Option<&'a VisibleObjectsBoundsInfo>,
    texture_projectors: [Option<&'a Frustum>; MAX_TEXTURE_PROJECTORS],

    ambient: LinearRgba,
    fog: FogState,
    time: f32,
    frame_time: f32,
    fps: f32,
    pass_number: usize,
    pass_iteration_number: usize,
    horizontal_texel_offset: f32,
    vertical_texel_offset: f32,
    blank_light: Light,

    dirty: u64,
    world_matrices: Vec<Mat4>,
    view: Mat4,
    inverse_view: Mat4,
    projection: Mat4,
    inverse_projection: Mat4,
    view_proj: Mat4,
    inverse_view_proj: Mat4,
    inverse_world: Mat4,
    inverse_transpose_world: Mat4,
    world_view: Mat4,
    inverse_world_view: Mat4,
    inverse_transpose_world_view: Mat4,
    world_view_proj: Mat4,
    inverse_world_view_proj: Mat4,
    camera_position: Vec3,
    camera_position_object_space: Vec3,
    scene_depth_range: Vec4,
    shadow_depth_ranges: Vec<Vec4>,
    texture_view_proj: [Mat4; MAX_TEXTURE_PROJECTORS],
    texture_view_proj_dirty: [bool; MAX_TEXTURE_PROJECTORS],
}

impl Default for AutoParamDataSource<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> AutoParamDataSource<'a> {
    /// Creates a data source with every derived field dirty.
    pub fn new() -> Self {
        Self {
            renderable: None,
            camera: None,
            viewport: None,
            render_target: None,
            pass: None,
            scene_manager: None,
            lights: &[],
            main_cam_bounds: None,
            texture_projectors: [None; MAX_TEXTURE_PROJECTORS],
            ambient: LinearRgba::BLACK,
            fog: FogState::default(),
            time: 0.0,
            frame_time: 0.0,
            fps: 0.0,
            pass_number: 0,
            pass_iteration_number: 0,
            horizontal_texel_offset: 0.0,
            vertical_texel_offset: 0.0,
            blank_light: Light::blank(),
            dirty: u64::MAX,
            world_matrices: Vec::new(),
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            inverse_projection: Mat4::IDENTITY,
            view_proj: Mat4::IDENTITY,
            inverse_view_proj: Mat4::IDENTITY,
            inverse_world: Mat4::IDENTITY,
            inverse_transpose_world: Mat4::IDENTITY,
            world_view: Mat4::IDENTITY,
            inverse_world_view: Mat4::IDENTITY,
            inverse_transpose_world_view: Mat4::IDENTITY,
            world_view_proj: Mat4::IDENTITY,
            inverse_world_view_proj: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            camera_position_object_space: Vec3::ZERO,
            scene_depth_range: DUMMY_DEPTH_RANGE,
            shadow_depth_ranges: Vec::new(),
            texture_view_proj: [Mat4::IDENTITY; MAX_TEXTURE_PROJECTORS],
            texture_view_proj_dirty: [true; MAX_TEXTURE_PROJECTORS],
        }
    }

    /// Uses `buffer` as scratch space for world matrices.
    pub fn with_world_matrix_buffer(mut self, mut buffer: Vec<Mat4>) -> Self {
        buffer.clear();
        self.world_matrices = buffer;
        self.dirty |= F::World.bit();
        self
    }

    /// Hands the world matrix buffer back to the caller.
    pub fn into_world_matrix_buffer(self) -> Vec<Mat4> {
        self.world_matrices
    }

    fn invalidate(&mut self, upstream: Upstream) {
        self.dirty |= invalidation_mask(upstream);
    }

    // Clears the field's dirty bit and reports whether it was set.
    fn take_dirty(&mut self, field: DerivedField) -> bool {
        let was_dirty = self.dirty & field.bit() != 0;
        self.dirty &= !field.bit();
        was_dirty
    }

    /// Returns `true` if `field` will be recomputed on its next read.
    pub fn is_dirty(&self, field: DerivedField) -> bool {
        self.dirty & field.bit() != 0
    }

    /// Returns `true` if projector slot `index` will be recomputed on its
    /// next read.
    pub fn is_texture_projector_dirty(&self, index: usize) -> bool {
        self.texture_view_proj_dirty.get(index).copied().unwrap_or(true)
    }

    // --- Upstream setters ---

    /// Sets the object being drawn.
    pub fn set_current_renderable(&mut self, renderable: &'a dyn Renderable) {
        self.renderable = Some(renderable);
        self.invalidate(Upstream::Renderable);
    }

    /// Sets the camera rendering the scene.
    pub fn set_current_camera(&mut self, camera: &'a Camera) {
        self.camera = Some(camera);
        self.invalidate(Upstream::Camera);
    }

    /// Sets the viewport, and with it the render target.
    pub fn set_current_viewport(&mut self, viewport: &'a Viewport) {
        self.viewport = Some(viewport);
        self.set_current_render_target(&viewport.target);
    }

    /// Sets the render target.
    pub fn set_current_render_target(&mut self, target: &'a RenderTarget) {
        self.render_target = Some(target);
        self.invalidate(Upstream::RenderTarget);
    }

    /// Sets the lights affecting the current object, shadow casters first.
    pub fn set_current_light_list(&mut self, lights: &'a [Light]) {
        self.lights = lights;
        self.invalidate(Upstream::LightList);
    }

    /// Sets the bounds of objects seen from the main camera.
    pub fn set_main_cam_bounds_info(&mut self, bounds: Option<&'a VisibleObjectsBoundsInfo>) {
        self.main_cam_bounds = bounds;
        self.invalidate(Upstream::MainCamBoundsInfo);
    }

    /// Sets the scene manager.
    pub fn set_current_scene_manager(&mut self, scene_manager: Option<&'a dyn SceneManager>) {
        self.scene_manager = scene_manager;
        self.invalidate(Upstream::SceneManager);
    }

    /// Sets the pass being rendered.
    pub fn set_current_pass(&mut self, pass: &'a Pass) {
        self.pass = Some(pass);
    }

    /// Sets the frustum projecting texture `index`.
    pub fn set_texture_projector(&mut self, frustum: &'a Frustum, index: usize) {
        if index < MAX_TEXTURE_PROJECTORS {
            self.texture_projectors[index] = Some(frustum);
            self.texture_view_proj_dirty[index] = true;
        }
    }

    /// Sets the scene ambient light.
    pub fn set_ambient_light_colour(&mut self, colour: LinearRgba) {
        self.ambient = colour;
    }

    /// Sets the active fog.
    pub fn set_fog(&mut self, fog: FogState) {
        self.fog = fog;
    }

    /// Sets the timing values.
    pub fn set_time(&mut self, time: f32, frame_time: f32, fps: f32) {
        self.time = time;
        self.frame_time = frame_time;
        self.fps = fps;
    }

    /// Sets the index of the pass being rendered within its technique.
    pub fn set_pass_number(&mut self, number: usize) {
        self.pass_number = number;
    }

    /// Advances the pass number by one.
    pub fn inc_pass_number(&mut self) {
        self.pass_number += 1;
    }

    /// Sets how many times the current pass has already been iterated.
    pub fn set_pass_iteration_number(&mut self, number: usize) {
        self.pass_iteration_number = number;
    }

    /// Sets the backend's texel-to-pixel offsets.
    pub fn set_texel_offsets(&mut self, horizontal: f32, vertical: f32) {
        self.horizontal_texel_offset = horizontal;
        self.vertical_texel_offset = vertical;
    }

    /// Takes the texel offsets from `caps`.
    pub fn set_render_system_capabilities(&mut self, caps: &RenderSystemCapabilities) {
        self.set_texel_offsets(caps.horizontal_texel_offset, caps.vertical_texel_offset);
    }

    /// Applies everything in `state` through the regular setters.
    pub fn apply_render_state(&mut self, state: &RenderState<'a>) {
        self.set_current_camera(state.camera);
        self.set_current_viewport(state.viewport);
        self.set_current_light_list(state.lights);
        self.set_current_scene_manager(state.scene_manager);
        self.set_main_cam_bounds_info(state.main_cam_bounds);
        self.set_ambient_light_colour(state.ambient);
        self.set_fog(state.fog);
        self.set_time(state.time, state.frame_time, state.fps);
    }

    // --- Plain accessors ---

    /// The object being drawn.
    pub fn renderable(&self) -> Option<&'a dyn Renderable> {
        self.renderable
    }

    /// The light at `index`, or a blank light when out of range.
    pub fn light(&self, index: usize) -> &Light {
        self.lights.get(index).unwrap_or(&self.blank_light)
    }

    /// Number of lights in the current list.
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Scene ambient light.
    pub fn ambient_light_colour(&self) -> LinearRgba {
        self.ambient
    }

    /// Active fog, overridden by the current pass if it sets its own.
    pub fn fog(&self) -> FogState {
        self.pass
            .and_then(|p| p.fog_override().copied())
            .unwrap_or(self.fog)
    }

    /// Seconds since start-up.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Seconds since the previous frame.
    pub fn frame_time(&self) -> f32 {
        self.frame_time
    }

    /// Frames per second.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Index of the current pass.
    pub fn pass_number(&self) -> usize {
        self.pass_number
    }

    /// Iteration of the current pass.
    pub fn pass_iteration_number(&self) -> usize {
        self.pass_iteration_number
    }

    /// Ambient reflectance of the current pass.
    pub fn surface_ambient_colour(&self) -> LinearRgba {
        self.pass.map_or(LinearRgba::WHITE, Pass::ambient)
    }

    /// Diffuse reflectance of the current pass.
    pub fn surface_diffuse_colour(&self) -> LinearRgba {
        self.pass.map_or(LinearRgba::WHITE, Pass::diffuse)
    }

    /// Specular reflectance of the current pass.
    pub fn surface_specular_colour(&self) -> LinearRgba {
        self.pass.map_or(LinearRgba::BLACK, Pass::specular)
    }

    /// Emissive colour of the current pass.
    pub fn surface_emissive_colour(&self) -> LinearRgba {
        self.pass.map_or(LinearRgba::BLACK, Pass::self_illumination)
    }

    /// Specular exponent of the current pass.
    pub fn surface_shininess(&self) -> f32 {
        self.pass.map_or(0.0, Pass::shininess)
    }

    /// Ambient light scaled by the pass's ambient reflectance.
    pub fn derived_ambient_light_colour(&self) -> LinearRgba {
        self.ambient * self.surface_ambient_colour()
    }

    /// Derived ambient plus emissive, with the pass's diffuse alpha.
    pub fn derived_scene_colour(&self) -> LinearRgba {
        let mut colour = self.derived_ambient_light_colour() + self.surface_emissive_colour();
        colour.a = self.surface_diffuse_colour().a;
        colour
    }

    /// `-1` when the render target is flipped, `1` otherwise.
    pub fn render_target_flipping(&self) -> f32 {
        match self.render_target {
            Some(target) if target.requires_texture_flipping => -1.0,
            _ => 1.0,
        }
    }

    /// Viewport width in pixels.
    pub fn viewport_width(&self) -> f32 {
        self.viewport.map_or(0.0, |v| v.actual_width as f32)
    }

    /// Viewport height in pixels.
    pub fn viewport_height(&self) -> f32 {
        self.viewport.map_or(0.0, |v| v.actual_height as f32)
    }

    /// Texel offsets packed as `(h, v, h / width, v / height)`.
    pub fn texel_offsets(&self) -> Vec4 {
        let (h, v) = (self.horizontal_texel_offset, self.vertical_texel_offset);
        let (w, ht) = (self.viewport_width(), self.viewport_height());
        let ratio = |offset: f32, size: f32| if size > 0.0 { offset / size } else { 0.0 };
        Vec4::new(h, v, ratio(h, w), ratio(v, ht))
    }

    /// Camera forward vector.
    pub fn view_direction(&self) -> Vec3 {
        self.camera.map_or(Vec3::NEG_Z, |c| c.frustum.direction())
    }

    /// Camera right vector.
    pub fn view_side_vector(&self) -> Vec3 {
        self.camera.map_or(Vec3::X, |c| c.frustum.right())
    }

    /// Camera up vector.
    pub fn view_up_vector(&self) -> Vec3 {
        self.camera.map_or(Vec3::Y, |c| c.frustum.up())
    }

    /// Camera vertical field of view in radians.
    pub fn fov(&self) -> f32 {
        self.camera.map_or(0.0, |c| c.frustum.fov_y)
    }

    /// Camera near clip distance.
    pub fn near_clip_distance(&self) -> f32 {
        self.camera.map_or(0.0, |c| c.frustum.near)
    }

    /// Camera far clip distance.
    pub fn far_clip_distance(&self) -> f32 {
        self.camera.map_or(0.0, |c| c.frustum.far)
    }

    fn texture_dimensions(&self, unit: usize) -> Option<Vec4> {
        let texture = self.pass?.texture_unit_state(unit)?.current_texture()?;
        Some(Vec4::new(
            texture.width as f32,
            texture.height as f32,
            texture.depth as f32,
            1.0,
        ))
    }

    /// `(width, height, depth, 1)` of the texture bound to `unit`.
    pub fn texture_size(&self, unit: usize) -> Vec4 {
        self.texture_dimensions(unit).unwrap_or(Vec4::ONE)
    }

    /// Reciprocal of [`texture_size`](Self::texture_size), `w` kept at 1.
    pub fn inverse_texture_size(&self, unit: usize) -> Vec4 {
        let size = self.texture_size(unit);
        Vec4::new(1.0 / size.x, 1.0 / size.y, 1.0 / size.z, 1.0)
    }

    /// `(width, height, 1 / width, 1 / height)` of the texture bound to
    /// `unit`.
    pub fn packed_texture_size(&self, unit: usize) -> Vec4 {
        let size = self.texture_size(unit);
        Vec4::new(size.x, size.y, 1.0 / size.x, 1.0 / size.y)
    }

    /// Colour of modulative shadows.
    pub fn shadow_colour(&self) -> LinearRgba {
        self.scene_manager
            .map_or(LinearRgba::rgb(0.25, 0.25, 0.25), |sm| sm.shadow_colour())
    }

    // --- Derived values ---

    /// The first world matrix of the current renderable.
    pub fn world_matrix(&mut self) -> Mat4 {
        self.world_matrix_array().first().copied().unwrap_or(Mat4::IDENTITY)
    }

    /// Number of world matrices of the current renderable.
    pub fn world_matrix_count(&mut self) -> usize {
        self.world_matrix_array().len()
    }

    /// Every world matrix of the current renderable.
    pub fn world_matrix_array(&mut self) -> &[Mat4] {
        if self.take_dirty(F::World) {
            self.world_matrices.clear();
            if let Some(renderable) = self.renderable {
                renderable.world_transforms(&mut self.world_matrices);
            }
            if self.world_matrices.is_empty() {
                self.world_matrices.push(Mat4::IDENTITY);
            }
        }
        &self.world_matrices
    }

    /// World-to-view transform.
    pub fn view_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::View) {
            let identity = self.renderable.is_some_and(|r| r.use_identity_view());
            self.view = match self.camera {
                Some(camera) if !identity => camera.frustum.view_matrix(),
                _ => Mat4::IDENTITY,
            };
        }
        self.view
    }

    /// Inverse of the view matrix.
    pub fn inverse_view_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::InverseView) {
            self.inverse_view = self.view_matrix().inverse();
        }
        self.inverse_view
    }

    /// View-to-clip transform, flipped vertically for flipped targets.
    pub fn projection_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::Projection) {
            let identity = self.renderable.is_some_and(|r| r.use_identity_projection());
            let mut projection = match self.camera {
                Some(camera) if !identity => camera.frustum.projection_matrix_with_depth(),
                _ => Mat4::IDENTITY,
            };
            if self.render_target.is_some_and(|t| t.requires_texture_flipping) {
                // Negate the second row.
                projection.x_axis.y = -projection.x_axis.y;
                projection.y_axis.y = -projection.y_axis.y;
                projection.z_axis.y = -projection.z_axis.y;
                projection.w_axis.y = -projection.w_axis.y;
            }
            self.projection = projection;
        }
        self.projection
    }

    /// Inverse of the projection matrix.
    pub fn inverse_projection_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::InverseProjection) {
            self.inverse_projection = self.projection_matrix().inverse();
        }
        self.inverse_projection
    }

    /// Projection times view.
    pub fn view_projection_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::ViewProj) {
            self.view_proj = self.projection_matrix() * self.view_matrix();
        }
        self.view_proj
    }

    /// Inverse of the view-projection matrix.
    pub fn inverse_view_projection_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::InverseViewProj) {
            self.inverse_view_proj = self.view_projection_matrix().inverse();
        }
        self.inverse_view_proj
    }

    /// Inverse of the world matrix.
    pub fn inverse_world_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::InverseWorld) {
            self.inverse_world = self.world_matrix().inverse();
        }
        self.inverse_world
    }

    /// Inverse transpose of the world matrix, for transforming normals.
    pub fn inverse_transpose_world_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::InverseTransposeWorld) {
            self.inverse_transpose_world = self.inverse_world_matrix().transpose();
        }
        self.inverse_transpose_world
    }

    /// View times world.
    pub fn world_view_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::WorldView) {
            self.world_view = self.view_matrix() * self.world_matrix();
        }
        self.world_view
    }

    /// Inverse of the world-view matrix.
    pub fn inverse_world_view_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::InverseWorldView) {
            self.inverse_world_view = self.world_view_matrix().inverse();
        }
        self.inverse_world_view
    }

    /// Inverse transpose of the world-view matrix.
    pub fn inverse_transpose_world_view_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::InverseTransposeWorldView) {
            self.inverse_transpose_world_view = self.inverse_world_view_matrix().transpose();
        }
        self.inverse_transpose_world_view
    }

    /// Projection times world-view.
    pub fn world_view_proj_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::WorldViewProj) {
            self.world_view_proj = self.projection_matrix() * self.world_view_matrix();
        }
        self.world_view_proj
    }

    /// Inverse of the world-view-projection matrix.
    pub fn inverse_world_view_proj_matrix(&mut self) -> Mat4 {
        if self.take_dirty(F::InverseWorldViewProj) {
            self.inverse_world_view_proj = self.world_view_proj_matrix().inverse();
        }
        self.inverse_world_view_proj
    }

    /// World-space camera position.
    pub fn camera_position(&mut self) -> Vec3 {
        if self.take_dirty(F::CameraPosition) {
            self.camera_position = self.camera.map_or(Vec3::ZERO, |c| c.frustum.position);
        }
        self.camera_position
    }

    /// Camera position in the current object's space.
    pub fn camera_position_object_space(&mut self) -> Vec3 {
        if self.take_dirty(F::CameraPositionObjectSpace) {
            let position = self.camera.map_or(Vec3::ZERO, |c| c.frustum.position);
            self.camera_position_object_space =
                self.inverse_world_matrix().transform_point3(position);
        }
        self.camera_position_object_space
    }

    /// Depth range of objects seen from the main camera.
    pub fn scene_depth_range(&mut self) -> Vec4 {
        if self.take_dirty(F::SceneDepthRange) {
            self.scene_depth_range = self
                .main_cam_bounds
                .map_or(DUMMY_DEPTH_RANGE, VisibleObjectsBoundsInfo::depth_range);
        }
        self.scene_depth_range
    }

    fn update_shadow_depth_ranges(&mut self) {
        if !self.take_dirty(F::ShadowSceneDepthRange) {
            return;
        }
        self.shadow_depth_ranges.clear();
        let Some(scene_manager) = self.scene_manager else {
            return;
        };
        if scene_manager.is_shadow_technique_texture_based() {
            return;
        }
        // Shadow casters are sorted to the front of the list.
        for light in self.lights.iter().take_while(|l| l.casts_shadows) {
            let bounds = scene_manager.shadow_caster_bounds_info(light);
            self.shadow_depth_ranges.push(bounds.depth_range());
        }
    }

    /// Depth range of shadow casters seen from light `index`, or
    /// [`DUMMY_DEPTH_RANGE`] if the light is not a leading shadow caster.
    pub fn shadow_scene_depth_range(&mut self, index: usize) -> Vec4 {
        self.update_shadow_depth_ranges();
        self.shadow_depth_ranges
            .get(index)
            .copied()
            .unwrap_or(DUMMY_DEPTH_RANGE)
    }

    /// Number of lights with a real shadow depth range.
    pub fn shadow_depth_range_count(&mut self) -> usize {
        self.update_shadow_depth_ranges();
        self.shadow_depth_ranges.len()
    }

    /// Maps world space to the texture space of projector `index`.
    pub fn texture_view_proj_matrix(&mut self, index: usize) -> Mat4 {
        if index >= MAX_TEXTURE_PROJECTORS {
            return Mat4::IDENTITY;
        }
        if self.texture_view_proj_dirty[index] {
            self.texture_view_proj[index] = match self.texture_projectors[index] {
                Some(frustum) => {
                    CLIP_TO_IMAGE * frustum.projection_matrix_with_depth() * frustum.view_matrix()
                }
                None => Mat4::IDENTITY,
            };
            self.texture_view_proj_dirty[index] = false;
        }
        self.texture_view_proj[index]
    }

    /// How far shadow volumes of light `index` are extruded.
    pub fn shadow_extrusion_distance(&mut self, index: usize) -> f32 {
        let light = self.light(index);
        if light.light_type == LightType::Directional {
            return self
                .scene_manager
                .map_or(10_000.0, |sm| sm.shadow_directional_light_extrusion_distance());
        }
        let (position, range) = (light.position, light.attenuation_range);
        let object_position = self.inverse_world_matrix().transform_point3(position);
        range - object_position.length()
    }
}

impl std::fmt::Debug for AutoParamDataSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoParamDataSource")
            .field("camera", &self.camera.map(|c| &c.name))
            .field("lights", &self.lights.len())
            .field("pass_number", &self.pass_number)
            .field("dirty", &format_args!("{:#x}", self.dirty))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_renderable_invalidates_everything_but_scene_ranges() {
        let fields: Vec<_> = invalidated_fields(Upstream::Renderable).collect();
        assert!(fields.contains(&F::World));
        assert!(fields.contains(&F::CameraPositionObjectSpace));
        assert!(fields.contains(&F::InverseWorldViewProj));
        assert!(!fields.contains(&F::CameraPosition));
        assert!(!fields.contains(&F::SceneDepthRange));
        assert!(!fields.contains(&F::ShadowSceneDepthRange));
    }

    #[test]
    fn test_light_list_only_invalidates_shadow_ranges() {
        let fields: Vec<_> = invalidated_fields(Upstream::LightList).collect();
        assert_eq!(fields, vec![F::ShadowSceneDepthRange]);
    }

    #[test]
    fn test_flipped_target_negates_second_row() {
        let camera = Camera::new("cam");
        let mut target = RenderTarget::new("rtt", 64, 64);
        let mut source = AutoParamDataSource::new();
        source.set_current_camera(&camera);
        let upright = source.projection_matrix();

        target.requires_texture_flipping = true;
        source.set_current_render_target(&target);
        let flipped = source.projection_matrix();
        assert_relative_eq!(flipped.row(1), -upright.row(1));
        assert_relative_eq!(flipped.row(0), upright.row(0));
        assert_relative_eq!(source.render_target_flipping(), -1.0);
    }

    #[test]
    fn test_projector_slots_are_independent() {
        let frustum = Frustum::default();
        let mut source = AutoParamDataSource::new();
        source.set_texture_projector(&frustum, 1);
        let m = source.texture_view_proj_matrix(1);
        assert!(!source.is_texture_projector_dirty(1));
        assert!(source.is_texture_projector_dirty(0));
        assert_ne!(m, Mat4::IDENTITY);
        assert_eq!(source.texture_view_proj_matrix(0), Mat4::IDENTITY);
    }

    #[test]
    fn test_world_defaults_to_identity() {
        let mut source = AutoParamDataSource::new();
        assert_eq!(source.world_matrix(), Mat4::IDENTITY);
        assert_eq!(source.world_matrix_count(), 1);
    }
}
