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

//! Resolution tables mapping auto-constant semantics to scene values.
//!
//! Two tables share one binding list: [`scene_resolver`] covers everything
//! that stays fixed while lights are iterated, [`light_resolver`] covers the
//! light-dependent semantics. A semantic missing from a table is skipped by
//! that update.

use super::{AutoConstantEntry, AutoConstantType};
use crate::auto_source::AutoParamDataSource;
use prism_core::math::{LinearRgba, Mat4, Vec3, Vec4, TAU};
use prism_core::renderer::{Light, LightType};

/// A resolved constant, ready to be written to its slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// Written as `(v, 0, 0, 0)`.
    Scalar(f32),
    /// One slot.
    Vec4(Vec4),
    /// Four slots.
    Matrix(Mat4),
    /// Three slots, the matrix's first three rows.
    Matrix3x4(Mat4),
    /// One slot per value.
    Vec4Array(Vec<Vec4>),
    /// Four slots per matrix.
    MatrixArray(Vec<Mat4>),
    /// Three slots per matrix.
    Matrix3x4Array(Vec<Mat4>),
}

impl From<LinearRgba> for ConstantValue {
    fn from(colour: LinearRgba) -> Self {
        Self::Vec4(colour.to_vec4())
    }
}

impl From<Vec3> for ConstantValue {
    fn from(v: Vec3) -> Self {
        Self::Vec4(v.extend(1.0))
    }
}

/// Computes the value of one binding.
pub type Resolver = fn(&mut AutoParamDataSource<'_>, &AutoConstantEntry) -> Option<ConstantValue>;

fn matrix(m: Mat4) -> Option<ConstantValue> {
    Some(ConstantValue::Matrix(m))
}

fn scalar(v: f32) -> Option<ConstantValue> {
    Some(ConstantValue::Scalar(v))
}

fn time_0_x(s: &AutoParamDataSource<'_>, e: &AutoConstantEntry) -> f32 {
    let period = e.real_data();
    if period == 0.0 {
        0.0
    } else {
        s.time() % period
    }
}

fn time_0_1(s: &AutoParamDataSource<'_>, e: &AutoConstantEntry) -> f32 {
    let period = e.real_data();
    if period == 0.0 {
        0.0
    } else {
        time_0_x(s, e) / period
    }
}

fn time_0_2pi(s: &AutoParamDataSource<'_>, e: &AutoConstantEntry) -> f32 {
    time_0_1(s, e) * TAU
}

fn packed(t: f32) -> Option<ConstantValue> {
    Some(ConstantValue::Vec4(Vec4::new(t, t.sin(), t.cos(), t.tan())))
}

/// Returns the resolver for semantics that do not depend on lights.
pub fn scene_resolver(ty: AutoConstantType) -> Option<Resolver> {
    use AutoConstantType as T;
    let resolver: Resolver = match ty {
        T::WorldMatrix => |s, _| matrix(s.world_matrix()),
        T::InverseWorldMatrix => |s, _| matrix(s.inverse_world_matrix()),
        T::TransposeWorldMatrix => |s, _| matrix(s.world_matrix().transpose()),
        T::InverseTransposeWorldMatrix => |s, _| matrix(s.inverse_transpose_world_matrix()),
        T::WorldMatrixArray3x4 => |s, _| Some(ConstantValue::Matrix3x4Array(s.world_matrix_array().to_vec())),
        T::WorldMatrixArray => |s, _| Some(ConstantValue::MatrixArray(s.world_matrix_array().to_vec())),
        T::ViewMatrix => |s, _| matrix(s.view_matrix()),
        T::InverseViewMatrix => |s, _| matrix(s.inverse_view_matrix()),
        T::TransposeViewMatrix => |s, _| matrix(s.view_matrix().transpose()),
        T::InverseTransposeViewMatrix => |s, _| matrix(s.inverse_view_matrix().transpose()),
        T::ProjectionMatrix => |s, _| matrix(s.projection_matrix()),
        T::InverseProjectionMatrix => |s, _| matrix(s.inverse_projection_matrix()),
        T::TransposeProjectionMatrix => |s, _| matrix(s.projection_matrix().transpose()),
        T::InverseTransposeProjectionMatrix => |s, _| matrix(s.inverse_projection_matrix().transpose()),
        T::ViewProjMatrix => |s, _| matrix(s.view_projection_matrix()),
        T::InverseViewProjMatrix => |s, _| matrix(s.inverse_view_projection_matrix()),
        T::TransposeViewProjMatrix => |s, _| matrix(s.view_projection_matrix().transpose()),
        T::InverseTransposeViewProjMatrix => |s, _| matrix(s.inverse_view_projection_matrix().transpose()),
        T::WorldViewMatrix => |s, _| matrix(s.world_view_matrix()),
        T::InverseWorldViewMatrix => |s, _| matrix(s.inverse_world_view_matrix()),
        T::TransposeWorldViewMatrix => |s, _| matrix(s.world_view_matrix().transpose()),
        T::InverseTransposeWorldViewMatrix => |s, _| matrix(s.inverse_transpose_world_view_matrix()),
        T::WorldViewProjMatrix => |s, _| matrix(s.world_view_proj_matrix()),
        T::InverseWorldViewProjMatrix => |s, _| matrix(s.inverse_world_view_proj_matrix()),
        T::TransposeWorldViewProjMatrix => |s, _| matrix(s.world_view_proj_matrix().transpose()),
        T::InverseTransposeWorldViewProjMatrix => |s, _| matrix(s.inverse_world_view_proj_matrix().transpose()),
        T::RenderTargetFlipping => |s, _| scalar(s.render_target_flipping()),
        T::FogColour => |s, _| Some(s.fog().colour.into()),
        T::FogParams => |s, _| Some(ConstantValue::Vec4(s.fog().params())),
        T::SurfaceAmbientColour => |s, _| Some(s.surface_ambient_colour().into()),
        T::SurfaceDiffuseColour => |s, _| Some(s.surface_diffuse_colour().into()),
        T::SurfaceSpecularColour => |s, _| Some(s.surface_specular_colour().into()),
        T::SurfaceEmissiveColour => |s, _| Some(s.surface_emissive_colour().into()),
        T::SurfaceShininess => |s, _| scalar(s.surface_shininess()),
        T::AmbientLightColour => |s, _| Some(s.ambient_light_colour().into()),
        T::DerivedAmbientLightColour => |s, _| Some(s.derived_ambient_light_colour().into()),
        T::DerivedSceneColour => |s, _| Some(s.derived_scene_colour().into()),
        T::CameraPosition => |s, _| Some(s.camera_position().into()),
        T::CameraPositionObjectSpace => |s, _| Some(s.camera_position_object_space().into()),
        T::TextureViewProjMatrix => |s, e| matrix(s.texture_view_proj_matrix(e.int_data())),
        T::Custom | T::AnimationParametric => |s, e| {
            s.renderable()
                .and_then(|r| r.update_custom_gpu_parameter(e.int_data()))
                .map(ConstantValue::Vec4)
        },
        T::Time => |s, e| scalar(s.time() * e.real_data()),
        T::Time0X => |s, e| scalar(time_0_x(s, e)),
        T::CosTime0X => |s, e| scalar(time_0_x(s, e).cos()),
        T::SinTime0X => |s, e| scalar(time_0_x(s, e).sin()),
        T::TanTime0X => |s, e| scalar(time_0_x(s, e).tan()),
        T::Time0XPacked => |s, e| packed(time_0_x(s, e)),
        T::Time01 => |s, e| scalar(time_0_1(s, e)),
        T::CosTime01 => |s, e| scalar(time_0_1(s, e).cos()),
        T::SinTime01 => |s, e| scalar(time_0_1(s, e).sin()),
        T::TanTime01 => |s, e| scalar(time_0_1(s, e).tan()),
        T::Time01Packed => |s, e| packed(time_0_1(s, e)),
        T::Time02Pi => |s, e| scalar(time_0_2pi(s, e)),
        T::CosTime02Pi => |s, e| scalar(time_0_2pi(s, e).cos()),
        T::SinTime02Pi => |s, e| scalar(time_0_2pi(s, e).sin()),
        T::TanTime02Pi => |s, e| scalar(time_0_2pi(s, e).tan()),
        T::Time02PiPacked => |s, e| packed(time_0_2pi(s, e)),
        T::FrameTime => |s, e| scalar(s.frame_time() * e.real_data()),
        T::Fps => |s, _| scalar(s.fps()),
        T::ViewportWidth => |s, _| scalar(s.viewport_width()),
        T::ViewportHeight => |s, _| scalar(s.viewport_height()),
        T::InverseViewportWidth => |s, _| scalar(1.0 / s.viewport_width()),
        T::InverseViewportHeight => |s, _| scalar(1.0 / s.viewport_height()),
        T::ViewportSize => |s, _| {
            let (w, h) = (s.viewport_width(), s.viewport_height());
            Some(ConstantValue::Vec4(Vec4::new(w, h, 1.0 / w, 1.0 / h)))
        },
        T::ViewDirection => |s, _| Some(s.view_direction().into()),
        T::ViewSideVector => |s, _| Some(s.view_side_vector().into()),
        T::ViewUpVector => |s, _| Some(s.view_up_vector().into()),
        T::Fov => |s, _| scalar(s.fov()),
        T::NearClipDistance => |s, _| scalar(s.near_clip_distance()),
        T::FarClipDistance => |s, _| scalar(s.far_clip_distance()),
        T::PassNumber => |s, _| scalar(s.pass_number() as f32),
        T::PassIterationNumber => |s, _| scalar(s.pass_iteration_number() as f32),
        T::TextureSize => |s, e| Some(ConstantValue::Vec4(s.texture_size(e.int_data()))),
        T::InverseTextureSize => |s, e| Some(ConstantValue::Vec4(s.inverse_texture_size(e.int_data()))),
        T::PackedTextureSize => |s, e| Some(ConstantValue::Vec4(s.packed_texture_size(e.int_data()))),
        T::TexelOffsets => |s, _| Some(ConstantValue::Vec4(s.texel_offsets())),
        T::SceneDepthRange => |s, _| Some(ConstantValue::Vec4(s.scene_depth_range())),
        T::ShadowColour => |s, _| Some(s.shadow_colour().into()),
        _ => return None,
    };
    Some(resolver)
}

fn spotlight_params(light: &Light) -> Vec4 {
    if light.light_type == LightType::Spotlight {
        Vec4::new(
            (light.spot_inner * 0.5).cos(),
            (light.spot_outer * 0.5).cos(),
            light.spot_falloff,
            1.0,
        )
    } else {
        Vec4::new(1.0, 0.0, 0.0, 1.0)
    }
}

fn position_object_space(inverse_world: &Mat4, light: &Light) -> Vec4 {
    *inverse_world * light.as_4d_vector()
}

fn direction_object_space(inverse_world: &Mat4, light: &Light) -> Vec4 {
    inverse_world
        .transform_vector3(light.direction)
        .normalize_or_zero()
        .extend(1.0)
}

fn distance_object_space(inverse_world: &Mat4, light: &Light) -> Vec4 {
    let distance = inverse_world.transform_point3(light.position).length();
    Vec4::new(distance, 0.0, 0.0, 0.0)
}

fn position_view_space(view: &Mat4, light: &Light) -> Vec4 {
    *view * light.as_4d_vector()
}

fn direction_view_space(view: &Mat4, light: &Light) -> Vec4 {
    view.transform_vector3(light.direction)
        .normalize_or_zero()
        .extend(1.0)
}

// Collects one value per light for lights 0..count.
fn per_light(
    s: &AutoParamDataSource<'_>,
    e: &AutoConstantEntry,
    f: impl Fn(&Light) -> Vec4,
) -> Option<ConstantValue> {
    let values = (0..e.int_data()).map(|i| f(s.light(i))).collect();
    Some(ConstantValue::Vec4Array(values))
}

/// Returns the resolver for light-dependent semantics.
pub fn light_resolver(ty: AutoConstantType) -> Option<Resolver> {
    use AutoConstantType as T;
    let resolver: Resolver = match ty {
        T::LightDiffuseColour => |s, e| Some(s.light(e.int_data()).diffuse.into()),
        T::LightSpecularColour => |s, e| Some(s.light(e.int_data()).specular.into()),
        T::LightAttenuation => |s, e| Some(ConstantValue::Vec4(s.light(e.int_data()).attenuation())),
        T::SpotlightParams => |s, e| Some(ConstantValue::Vec4(spotlight_params(s.light(e.int_data())))),
        T::LightPosition => |s, e| Some(ConstantValue::Vec4(s.light(e.int_data()).as_4d_vector())),
        T::LightPositionObjectSpace => |s, e| {
            let inverse_world = s.inverse_world_matrix();
            Some(ConstantValue::Vec4(position_object_space(&inverse_world, s.light(e.int_data()))))
        },
        T::LightPositionViewSpace => |s, e| {
            let view = s.view_matrix();
            Some(ConstantValue::Vec4(position_view_space(&view, s.light(e.int_data()))))
        },
        T::LightDirection => |s, e| Some(s.light(e.int_data()).direction.into()),
        T::LightDirectionObjectSpace => |s, e| {
            let inverse_world = s.inverse_world_matrix();
            Some(ConstantValue::Vec4(direction_object_space(&inverse_world, s.light(e.int_data()))))
        },
        T::LightDirectionViewSpace => |s, e| {
            let view = s.view_matrix();
            Some(ConstantValue::Vec4(direction_view_space(&view, s.light(e.int_data()))))
        },
        T::LightDistanceObjectSpace => |s, e| {
            let inverse_world = s.inverse_world_matrix();
            Some(ConstantValue::Vec4(distance_object_space(&inverse_world, s.light(e.int_data()))))
        },
        T::LightPowerScale => |s, e| scalar(s.light(e.int_data()).power_scale),
        T::LightDiffuseColourArray => |s, e| per_light(s, e, |l| l.diffuse.to_vec4()),
        T::LightSpecularColourArray => |s, e| per_light(s, e, |l| l.specular.to_vec4()),
        T::LightAttenuationArray => |s, e| per_light(s, e, Light::attenuation),
        T::LightPositionArray => |s, e| per_light(s, e, Light::as_4d_vector),
        T::LightPositionObjectSpaceArray => |s, e| {
            let inverse_world = s.inverse_world_matrix();
            per_light(s, e, |l| position_object_space(&inverse_world, l))
        },
        T::LightPositionViewSpaceArray => |s, e| {
            let view = s.view_matrix();
            per_light(s, e, |l| position_view_space(&view, l))
        },
        T::LightDirectionArray => |s, e| per_light(s, e, |l| l.direction.extend(1.0)),
        T::LightDirectionObjectSpaceArray => |s, e| {
            let inverse_world = s.inverse_world_matrix();
            per_light(s, e, |l| direction_object_space(&inverse_world, l))
        },
        T::LightDirectionViewSpaceArray => |s, e| {
            let view = s.view_matrix();
            per_light(s, e, |l| direction_view_space(&view, l))
        },
        T::LightDistanceObjectSpaceArray => |s, e| {
            let inverse_world = s.inverse_world_matrix();
            per_light(s, e, |l| distance_object_space(&inverse_world, l))
        },
        T::LightPowerScaleArray => |s, e| per_light(s, e, |l| Vec4::new(l.power_scale, 0.0, 0.0, 0.0)),
        T::SpotlightParamsArray => |s, e| per_light(s, e, spotlight_params),
        T::DerivedLightDiffuseColour => |s, e| {
            Some((s.light(e.int_data()).diffuse * s.surface_diffuse_colour()).into())
        },
        T::DerivedLightSpecularColour => |s, e| {
            Some((s.light(e.int_data()).specular * s.surface_specular_colour()).into())
        },
        T::DerivedLightDiffuseColourArray => |s, e| {
            let surface = s.surface_diffuse_colour();
            per_light(s, e, |l| (l.diffuse * surface).to_vec4())
        },
        T::DerivedLightSpecularColourArray => |s, e| {
            let surface = s.surface_specular_colour();
            per_light(s, e, |l| (l.specular * surface).to_vec4())
        },
        T::ShadowExtrusionDistance => |s, e| scalar(s.shadow_extrusion_distance(e.int_data())),
        T::ShadowSceneDepthRange => |s, e| Some(ConstantValue::Vec4(s.shadow_scene_depth_range(e.int_data()))),
        T::TextureViewProjMatrix => |s, e| matrix(s.texture_view_proj_matrix(e.int_data())),
        _ => return None,
    };
    Some(resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::AUTO_CONSTANT_DEFINITIONS;

    #[test]
    fn test_every_semantic_has_a_resolver() {
        for def in AUTO_CONSTANT_DEFINITIONS {
            assert!(
                scene_resolver(def.ty).is_some() || light_resolver(def.ty).is_some(),
                "{} is never resolved",
                def.name
            );
        }
    }

    #[test]
    fn test_tables_are_disjoint_except_projectors() {
        for def in AUTO_CONSTANT_DEFINITIONS {
            let both = scene_resolver(def.ty).is_some() && light_resolver(def.ty).is_some();
            assert_eq!(both, def.ty == AutoConstantType::TextureViewProjMatrix, "{}", def.name);
        }
    }

    #[test]
    fn test_spotlight_sentinel_for_point_lights() {
        let light = Light::new("p", LightType::Point);
        assert_eq!(spotlight_params(&light), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }
}
