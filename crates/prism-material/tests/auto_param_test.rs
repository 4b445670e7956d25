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

use anyhow::Result;
use approx::assert_relative_eq;
use prism_core::math::{Mat4, Quat, Vec3, Vec4};
use prism_core::renderer::{Camera, Light, LightType, RenderTarget, Viewport};
use prism_core::{Renderable, SceneManager, VisibleObjectsBoundsInfo};
use prism_material::auto_source::{
    invalidated_fields, DerivedField, Upstream, DUMMY_DEPTH_RANGE,
};
use prism_material::AutoParamDataSource;
use std::cell::Cell;
use std::collections::HashSet;

struct CountingRenderable {
    world: Mat4,
    calls: Cell<usize>,
}

impl CountingRenderable {
    fn at(position: Vec3) -> Self {
        Self {
            world: Mat4::from_translation(position),
            calls: Cell::new(0),
        }
    }
}

impl Renderable for CountingRenderable {
    fn world_transforms(&self, out: &mut Vec<Mat4>) {
        self.calls.set(self.calls.get() + 1);
        out.push(self.world);
    }
}

struct StubScene {
    texture_based: bool,
}

impl SceneManager for StubScene {
    fn shadow_caster_bounds_info(&self, light: &Light) -> VisibleObjectsBoundsInfo {
        VisibleObjectsBoundsInfo {
            min_distance: light.position.x,
            max_distance: light.position.x + 10.0,
        }
    }

    fn is_shadow_technique_texture_based(&self) -> bool {
        self.texture_based
    }
}

fn camera_at(name: &str, position: Vec3) -> Camera {
    let mut camera = Camera::new(name);
    camera.frustum.position = position;
    camera
}

fn read_every_field(source: &mut AutoParamDataSource<'_>) {
    source.world_matrix();
    source.view_matrix();
    source.inverse_view_matrix();
    source.projection_matrix();
    source.inverse_projection_matrix();
    source.view_projection_matrix();
    source.inverse_view_projection_matrix();
    source.inverse_world_matrix();
    source.inverse_transpose_world_matrix();
    source.world_view_matrix();
    source.inverse_world_view_matrix();
    source.inverse_transpose_world_view_matrix();
    source.world_view_proj_matrix();
    source.inverse_world_view_proj_matrix();
    source.camera_position();
    source.camera_position_object_space();
    source.scene_depth_range();
    source.shadow_scene_depth_range(0);
}

fn expected_invalidations(upstream: Upstream) -> HashSet<DerivedField> {
    use DerivedField::*;
    let per_object = [
        View,
        InverseView,
        Projection,
        InverseProjection,
        ViewProj,
        InverseViewProj,
        WorldView,
        InverseWorldView,
        InverseTransposeWorldView,
        WorldViewProj,
        InverseWorldViewProj,
        CameraPositionObjectSpace,
    ];
    match upstream {
        Upstream::Renderable => per_object
            .into_iter()
            .chain([World, InverseWorld, InverseTransposeWorld])
            .collect(),
        Upstream::Camera => per_object.into_iter().chain([CameraPosition]).collect(),
        Upstream::RenderTarget => [
            Projection,
            InverseProjection,
            ViewProj,
            InverseViewProj,
            WorldViewProj,
            InverseWorldViewProj,
        ]
        .into_iter()
        .collect(),
        Upstream::LightList | Upstream::SceneManager => [ShadowSceneDepthRange].into_iter().collect(),
        Upstream::MainCamBoundsInfo => [SceneDepthRange].into_iter().collect(),
    }
}

#[test]
fn test_dependency_table_matches_documented_invalidations() {
    for upstream in Upstream::ALL {
        let actual: HashSet<_> = invalidated_fields(upstream).collect();
        assert_eq!(actual, expected_invalidations(upstream), "{upstream:?}");
    }
}

#[test]
fn test_every_setter_dirties_exactly_its_dependents() -> Result<()> {
    let renderable = CountingRenderable::at(Vec3::new(1.0, 0.0, 0.0));
    let camera = camera_at("main", Vec3::new(0.0, 0.0, 10.0));
    let viewport = Viewport::full(RenderTarget::new("screen", 800, 600));
    let lights = [Light::new("sun", LightType::Directional)];
    let bounds = VisibleObjectsBoundsInfo {
        min_distance: 1.0,
        max_distance: 5.0,
    };
    let scene = StubScene {
        texture_based: false,
    };

    for upstream in Upstream::ALL {
        let mut source = AutoParamDataSource::new();
        source.set_current_renderable(&renderable);
        source.set_current_camera(&camera);
        source.set_current_viewport(&viewport);
        source.set_current_light_list(&lights);
        source.set_main_cam_bounds_info(Some(&bounds));
        source.set_current_scene_manager(Some(&scene));

        read_every_field(&mut source);
        for field in DerivedField::ALL {
            assert!(!source.is_dirty(field), "{field:?} still dirty after read");
        }

        match upstream {
            Upstream::Renderable => source.set_current_renderable(&renderable),
            Upstream::Camera => source.set_current_camera(&camera),
            Upstream::RenderTarget => source.set_current_render_target(&viewport.target),
            Upstream::LightList => source.set_current_light_list(&lights),
            Upstream::MainCamBoundsInfo => source.set_main_cam_bounds_info(Some(&bounds)),
            Upstream::SceneManager => source.set_current_scene_manager(Some(&scene)),
        }

        let expected = expected_invalidations(upstream);
        for field in DerivedField::ALL {
            assert_eq!(
                source.is_dirty(field),
                expected.contains(&field),
                "{field:?} after setting {upstream:?}"
            );
        }

        let before = renderable.calls.get();
        read_every_field(&mut source);
        let refetched = renderable.calls.get() - before;
        assert_eq!(refetched, usize::from(upstream == Upstream::Renderable), "{upstream:?}");
    }
    Ok(())
}

#[test]
fn test_reads_are_cached_until_invalidated() -> Result<()> {
    let renderable = CountingRenderable::at(Vec3::new(3.0, 2.0, 1.0));
    let camera = camera_at("main", Vec3::new(0.0, 1.0, 8.0));
    let mut source = AutoParamDataSource::new();
    source.set_current_renderable(&renderable);
    source.set_current_camera(&camera);

    let first = source.world_view_proj_matrix();
    let second = source.world_view_proj_matrix();
    assert_eq!(first.to_cols_array(), second.to_cols_array());
    source.inverse_world_matrix();
    source.camera_position_object_space();
    assert_eq!(renderable.calls.get(), 1);
    Ok(())
}

#[test]
fn test_camera_switch_recomputes_world_view_proj() -> Result<()> {
    let renderable = CountingRenderable::at(Vec3::new(0.0, 0.0, -5.0));
    let first_camera = camera_at("a", Vec3::ZERO);
    let mut second_camera = camera_at("b", Vec3::new(4.0, 0.0, 0.0));
    second_camera.frustum.orientation = Quat::from_rotation_y(0.5);

    let mut source = AutoParamDataSource::new();
    source.set_current_renderable(&renderable);
    source.set_current_camera(&first_camera);
    let v1 = source.world_view_proj_matrix();

    source.set_current_camera(&second_camera);
    let v2 = source.world_view_proj_matrix();
    assert_ne!(v1, v2);

    let expected = second_camera.frustum.projection_matrix_with_depth()
        * second_camera.frustum.view_matrix()
        * renderable.world;
    assert_relative_eq!(v2, expected, epsilon = 1e-5);
    assert_eq!(renderable.calls.get(), 1);
    Ok(())
}

#[test]
fn test_renderable_switch_keeps_camera_position() -> Result<()> {
    let a = CountingRenderable::at(Vec3::X);
    let b = CountingRenderable::at(Vec3::Y);
    let camera = camera_at("main", Vec3::new(0.0, 0.0, 4.0));
    let mut source = AutoParamDataSource::new();
    source.set_current_camera(&camera);
    source.set_current_renderable(&a);
    assert_relative_eq!(source.camera_position_object_space(), Vec3::new(-1.0, 0.0, 4.0));

    source.set_current_renderable(&b);
    assert!(!source.is_dirty(DerivedField::CameraPosition));
    assert_relative_eq!(source.camera_position_object_space(), Vec3::new(0.0, -1.0, 4.0));
    Ok(())
}

#[test]
fn test_shadow_depth_ranges_stop_at_first_non_caster() -> Result<()> {
    let mut caster1 = Light::new("caster1", LightType::Point);
    caster1.position = Vec3::new(2.0, 0.0, 0.0);
    let mut caster2 = Light::new("caster2", LightType::Point);
    caster2.position = Vec3::new(6.0, 0.0, 0.0);
    let mut non_caster = Light::new("fill", LightType::Point);
    non_caster.casts_shadows = false;
    non_caster.position = Vec3::new(50.0, 0.0, 0.0);
    let lights = [caster1, caster2, non_caster];

    let scene = StubScene {
        texture_based: false,
    };
    let mut source = AutoParamDataSource::new();
    source.set_current_scene_manager(Some(&scene));
    source.set_current_light_list(&lights);

    assert_eq!(source.shadow_depth_range_count(), 2);
    assert_relative_eq!(source.shadow_scene_depth_range(0), Vec4::new(2.0, 12.0, 10.0, 0.1));
    assert_relative_eq!(source.shadow_scene_depth_range(1), Vec4::new(6.0, 16.0, 10.0, 0.1));
    assert_eq!(source.shadow_scene_depth_range(2), DUMMY_DEPTH_RANGE);
    assert_eq!(
        source.shadow_scene_depth_range(2),
        Vec4::new(0.0, 100_000.0, 100_000.0, 1e-5)
    );
    Ok(())
}

#[test]
fn test_texture_based_shadows_use_dummy_range() -> Result<()> {
    let lights = [Light::new("caster", LightType::Point)];
    let scene = StubScene {
        texture_based: true,
    };
    let mut source = AutoParamDataSource::new();
    source.set_current_scene_manager(Some(&scene));
    source.set_current_light_list(&lights);
    assert_eq!(source.shadow_depth_range_count(), 0);
    assert_eq!(source.shadow_scene_depth_range(0), DUMMY_DEPTH_RANGE);
    Ok(())
}

#[test]
fn test_identity_view_renderable() -> Result<()> {
    struct Overlay;
    impl Renderable for Overlay {
        fn world_transforms(&self, out: &mut Vec<Mat4>) {
            out.push(Mat4::IDENTITY);
        }
        fn use_identity_view(&self) -> bool {
            true
        }
        fn use_identity_projection(&self) -> bool {
            true
        }
    }

    let camera = camera_at("main", Vec3::new(3.0, 3.0, 3.0));
    let mut source = AutoParamDataSource::new();
    source.set_current_camera(&camera);
    source.set_current_renderable(&Overlay);
    assert_eq!(source.world_view_proj_matrix(), Mat4::IDENTITY);
    Ok(())
}

#[test]
fn test_world_matrix_buffer_is_reused() -> Result<()> {
    struct Skinned;
    impl Renderable for Skinned {
        fn world_transforms(&self, out: &mut Vec<Mat4>) {
            out.extend((0..3).map(|i| Mat4::from_translation(Vec3::splat(i as f32))));
        }
    }

    let buffer = Vec::with_capacity(64);
    let mut source = AutoParamDataSource::new().with_world_matrix_buffer(buffer);
    source.set_current_renderable(&Skinned);
    assert_eq!(source.world_matrix_count(), 3);
    assert_eq!(source.world_matrix_array()[2], Mat4::from_translation(Vec3::splat(2.0)));

    let buffer = source.into_world_matrix_buffer();
    assert!(buffer.capacity() >= 64);
    Ok(())
}
