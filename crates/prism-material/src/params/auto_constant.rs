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

//! Auto-constant semantics and their static definition table.

/// A scene value a GPU program constant can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum AutoConstantType {
    WorldMatrix,
    InverseWorldMatrix,
    TransposeWorldMatrix,
    InverseTransposeWorldMatrix,
    WorldMatrixArray3x4,
    WorldMatrixArray,
    ViewMatrix,
    InverseViewMatrix,
    TransposeViewMatrix,
    InverseTransposeViewMatrix,
    ProjectionMatrix,
    InverseProjectionMatrix,
    TransposeProjectionMatrix,
    InverseTransposeProjectionMatrix,
    ViewProjMatrix,
    InverseViewProjMatrix,
    TransposeViewProjMatrix,
    InverseTransposeViewProjMatrix,
    WorldViewMatrix,
    InverseWorldViewMatrix,
    TransposeWorldViewMatrix,
    InverseTransposeWorldViewMatrix,
    WorldViewProjMatrix,
    InverseWorldViewProjMatrix,
    TransposeWorldViewProjMatrix,
    InverseTransposeWorldViewProjMatrix,
    RenderTargetFlipping,
    FogColour,
    FogParams,
    SurfaceAmbientColour,
    SurfaceDiffuseColour,
    SurfaceSpecularColour,
    SurfaceEmissiveColour,
    SurfaceShininess,
    AmbientLightColour,
    LightDiffuseColour,
    LightSpecularColour,
    LightAttenuation,
    SpotlightParams,
    LightPosition,
    LightPositionObjectSpace,
    LightPositionViewSpace,
    LightDirection,
    LightDirectionObjectSpace,
    LightDirectionViewSpace,
    LightDistanceObjectSpace,
    LightPowerScale,
    LightDiffuseColourArray,
    LightSpecularColourArray,
    LightAttenuationArray,
    LightPositionArray,
    LightPositionObjectSpaceArray,
    LightPositionViewSpaceArray,
    LightDirectionArray,
    LightDirectionObjectSpaceArray,
    LightDirectionViewSpaceArray,
    LightDistanceObjectSpaceArray,
    LightPowerScaleArray,
    SpotlightParamsArray,
    DerivedAmbientLightColour,
    DerivedSceneColour,
    DerivedLightDiffuseColour,
    DerivedLightSpecularColour,
    DerivedLightDiffuseColourArray,
    DerivedLightSpecularColourArray,
    ShadowExtrusionDistance,
    CameraPosition,
    CameraPositionObjectSpace,
    TextureViewProjMatrix,
    Custom,
    AnimationParametric,
    Time,
    Time0X,
    CosTime0X,
    SinTime0X,
    TanTime0X,
    Time0XPacked,
    Time01,
    CosTime01,
    SinTime01,
    TanTime01,
    Time01Packed,
    Time02Pi,
    CosTime02Pi,
    SinTime02Pi,
    TanTime02Pi,
    Time02PiPacked,
    FrameTime,
    Fps,
    ViewportWidth,
    ViewportHeight,
    InverseViewportWidth,
    InverseViewportHeight,
    ViewportSize,
    ViewDirection,
    ViewSideVector,
    ViewUpVector,
    Fov,
    NearClipDistance,
    FarClipDistance,
    PassNumber,
    PassIterationNumber,
    TextureSize,
    InverseTextureSize,
    PackedTextureSize,
    TexelOffsets,
    SceneDepthRange,
    ShadowSceneDepthRange,
    ShadowColour,
}

/// Scalar type of the constant an auto-constant writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 32-bit floats.
    Real,
    /// 32-bit signed integers.
    Int,
}

/// What the extra data of an auto-constant entry means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoDataKind {
    /// No extra data.
    None,
    /// An integer selector, e.g. a light or texture unit index.
    Int,
    /// A real factor, e.g. a time scale.
    Real,
}

/// Static description of an auto-constant semantic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoConstantDefinition {
    /// The semantic.
    pub ty: AutoConstantType,
    /// Name used by material scripts.
    pub name: &'static str,
    /// Number of scalar elements written per unit of data.
    pub element_count: usize,
    /// Scalar type written.
    pub element_type: ElementType,
    /// Meaning of the entry's extra data.
    pub data_kind: AutoDataKind,
}

macro_rules! definitions {
    ($(($ty:ident, $name:literal, $count:literal, $elem:ident, $data:ident)),* $(,)?) => {
        /// Every auto-constant semantic, in declaration order.
        pub static AUTO_CONSTANT_DEFINITIONS: &[AutoConstantDefinition] = &[
            $(AutoConstantDefinition {
                ty: AutoConstantType::$ty,
                name: $name,
                element_count: $count,
                element_type: ElementType::$elem,
                data_kind: AutoDataKind::$data,
            }),*
        ];
    };
}

definitions![
    (WorldMatrix, "world_matrix", 16, Real, None),
    (InverseWorldMatrix, "inverse_world_matrix", 16, Real, None),
    (TransposeWorldMatrix, "transpose_world_matrix", 16, Real, None),
    (InverseTransposeWorldMatrix, "inverse_transpose_world_matrix", 16, Real, None),
    (WorldMatrixArray3x4, "world_matrix_array_3x4", 12, Real, None),
    (WorldMatrixArray, "world_matrix_array", 16, Real, None),
    (ViewMatrix, "view_matrix", 16, Real, None),
    (InverseViewMatrix, "inverse_view_matrix", 16, Real, None),
    (TransposeViewMatrix, "transpose_view_matrix", 16, Real, None),
    (InverseTransposeViewMatrix, "inverse_transpose_view_matrix", 16, Real, None),
    (ProjectionMatrix, "projection_matrix", 16, Real, None),
    (InverseProjectionMatrix, "inverse_projection_matrix", 16, Real, None),
    (TransposeProjectionMatrix, "transpose_projection_matrix", 16, Real, None),
    (InverseTransposeProjectionMatrix, "inverse_transpose_projection_matrix", 16, Real, None),
    (ViewProjMatrix, "viewproj_matrix", 16, Real, None),
    (InverseViewProjMatrix, "inverse_viewproj_matrix", 16, Real, None),
    (TransposeViewProjMatrix, "transpose_viewproj_matrix", 16, Real, None),
    (InverseTransposeViewProjMatrix, "inverse_transpose_viewproj_matrix", 16, Real, None),
    (WorldViewMatrix, "worldview_matrix", 16, Real, None),
    (InverseWorldViewMatrix, "inverse_worldview_matrix", 16, Real, None),
    (TransposeWorldViewMatrix, "transpose_worldview_matrix", 16, Real, None),
    (InverseTransposeWorldViewMatrix, "inverse_transpose_worldview_matrix", 16, Real, None),
    (WorldViewProjMatrix, "worldviewproj_matrix", 16, Real, None),
    (InverseWorldViewProjMatrix, "inverse_worldviewproj_matrix", 16, Real, None),
    (TransposeWorldViewProjMatrix, "transpose_worldviewproj_matrix", 16, Real, None),
    (InverseTransposeWorldViewProjMatrix, "inverse_transpose_worldviewproj_matrix", 16, Real, None),
    (RenderTargetFlipping, "render_target_flipping", 1, Real, None),
    (FogColour, "fog_colour", 4, Real, None),
    (FogParams, "fog_params", 4, Real, None),
    (SurfaceAmbientColour, "surface_ambient_colour", 4, Real, None),
    (SurfaceDiffuseColour, "surface_diffuse_colour", 4, Real, None),
    (SurfaceSpecularColour, "surface_specular_colour", 4, Real, None),
    (SurfaceEmissiveColour, "surface_emissive_colour", 4, Real, None),
    (SurfaceShininess, "surface_shininess", 1, Real, None),
    (AmbientLightColour, "ambient_light_colour", 4, Real, None),
    (LightDiffuseColour, "light_diffuse_colour", 4, Real, Int),
    (LightSpecularColour, "light_specular_colour", 4, Real, Int),
    (LightAttenuation, "light_attenuation", 4, Real, Int),
    (SpotlightParams, "spotlight_params", 4, Real, Int),
    (LightPosition, "light_position", 4, Real, Int),
    (LightPositionObjectSpace, "light_position_object_space", 4, Real, Int),
    (LightPositionViewSpace, "light_position_view_space", 4, Real, Int),
    (LightDirection, "light_direction", 4, Real, Int),
    (LightDirectionObjectSpace, "light_direction_object_space", 4, Real, Int),
    (LightDirectionViewSpace, "light_direction_view_space", 4, Real, Int),
    (LightDistanceObjectSpace, "light_distance_object_space", 1, Real, Int),
    (LightPowerScale, "light_power", 1, Real, Int),
    (LightDiffuseColourArray, "light_diffuse_colour_array", 4, Real, Int),
    (LightSpecularColourArray, "light_specular_colour_array", 4, Real, Int),
    (LightAttenuationArray, "light_attenuation_array", 4, Real, Int),
    (LightPositionArray, "light_position_array", 4, Real, Int),
    (LightPositionObjectSpaceArray, "light_position_object_space_array", 4, Real, Int),
    (LightPositionViewSpaceArray, "light_position_view_space_array", 4, Real, Int),
    (LightDirectionArray, "light_direction_array", 4, Real, Int),
    (LightDirectionObjectSpaceArray, "light_direction_object_space_array", 4, Real, Int),
    (LightDirectionViewSpaceArray, "light_direction_view_space_array", 4, Real, Int),
    (LightDistanceObjectSpaceArray, "light_distance_object_space_array", 1, Real, Int),
    (LightPowerScaleArray, "light_power_array", 1, Real, Int),
    (SpotlightParamsArray, "spotlight_params_array", 4, Real, Int),
    (DerivedAmbientLightColour, "derived_ambient_light_colour", 4, Real, None),
    (DerivedSceneColour, "derived_scene_colour", 4, Real, None),
    (DerivedLightDiffuseColour, "derived_light_diffuse_colour", 4, Real, Int),
    (DerivedLightSpecularColour, "derived_light_specular_colour", 4, Real, Int),
    (DerivedLightDiffuseColourArray, "derived_light_diffuse_colour_array", 4, Real, Int),
    (DerivedLightSpecularColourArray, "derived_light_specular_colour_array", 4, Real, Int),
    (ShadowExtrusionDistance, "shadow_extrusion_distance", 1, Real, Int),
    (CameraPosition, "camera_position", 3, Real, None),
    (CameraPositionObjectSpace, "camera_position_object_space", 3, Real, None),
    (TextureViewProjMatrix, "texture_viewproj_matrix", 16, Real, Int),
    (Custom, "custom", 4, Real, Int),
    (AnimationParametric, "animation_parametric", 4, Real, Int),
    (Time, "time", 1, Real, Real),
    (Time0X, "time_0_x", 4, Real, Real),
    (CosTime0X, "costime_0_x", 4, Real, Real),
    (SinTime0X, "sintime_0_x", 4, Real, Real),
    (TanTime0X, "tantime_0_x", 4, Real, Real),
    (Time0XPacked, "time_0_x_packed", 4, Real, Real),
    (Time01, "time_0_1", 4, Real, Real),
    (CosTime01, "costime_0_1", 4, Real, Real),
    (SinTime01, "sintime_0_1", 4, Real, Real),
    (TanTime01, "tantime_0_1", 4, Real, Real),
    (Time01Packed, "time_0_1_packed", 4, Real, Real),
    (Time02Pi, "time_0_2pi", 4, Real, Real),
    (CosTime02Pi, "costime_0_2pi", 4, Real, Real),
    (SinTime02Pi, "sintime_0_2pi", 4, Real, Real),
    (TanTime02Pi, "tantime_0_2pi", 4, Real, Real),
    (Time02PiPacked, "time_0_2pi_packed", 4, Real, Real),
    (FrameTime, "frame_time", 1, Real, Real),
    (Fps, "fps", 1, Real, None),
    (ViewportWidth, "viewport_width", 1, Real, None),
    (ViewportHeight, "viewport_height", 1, Real, None),
    (InverseViewportWidth, "inverse_viewport_width", 1, Real, None),
    (InverseViewportHeight, "inverse_viewport_height", 1, Real, None),
    (ViewportSize, "viewport_size", 4, Real, None),
    (ViewDirection, "view_direction", 3, Real, None),
    (ViewSideVector, "view_side_vector", 3, Real, None),
    (ViewUpVector, "view_up_vector", 3, Real, None),
    (Fov, "fov", 1, Real, None),
    (NearClipDistance, "near_clip_distance", 1, Real, None),
    (FarClipDistance, "far_clip_distance", 1, Real, None),
    (PassNumber, "pass_number", 1, Real, None),
    (PassIterationNumber, "pass_iteration_number", 1, Real, None),
    (TextureSize, "texture_size", 4, Real, Int),
    (InverseTextureSize, "inverse_texture_size", 4, Real, Int),
    (PackedTextureSize, "packed_texture_size", 4, Real, Int),
    (TexelOffsets, "texel_offsets", 4, Real, None),
    (SceneDepthRange, "scene_depth_range", 4, Real, None),
    (ShadowSceneDepthRange, "shadow_scene_depth_range", 4, Real, Int),
    (ShadowColour, "shadow_colour", 4, Real, None),
];

impl AutoConstantType {
    /// The static definition of this semantic.
    pub fn definition(self) -> &'static AutoConstantDefinition {
        // The table is declared in enum order.
        &AUTO_CONSTANT_DEFINITIONS[self as usize]
    }

    /// Name used by material scripts.
    pub fn name(self) -> &'static str {
        self.definition().name
    }
}

/// Looks up a definition by its script name.
pub fn auto_constant_definition_by_name(name: &str) -> Option<&'static AutoConstantDefinition> {
    AUTO_CONSTANT_DEFINITIONS.iter().find(|d| d.name == name)
}

/// Extra data stored with an auto-constant binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutoConstantData {
    /// No extra data.
    None,
    /// Integer selector.
    Int(usize),
    /// Real factor.
    Real(f32),
}

/// One binding of a constant slot to an auto-constant semantic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoConstantEntry {
    /// The semantic.
    pub ty: AutoConstantType,
    /// First float4 slot written.
    pub index: usize,
    /// Extra data.
    pub data: AutoConstantData,
}

impl AutoConstantEntry {
    /// Integer data, `0` when the entry carries none.
    pub fn int_data(&self) -> usize {
        match self.data {
            AutoConstantData::Int(v) => v,
            AutoConstantData::Real(v) => v.max(0.0) as usize,
            AutoConstantData::None => 0,
        }
    }

    /// Real data, `1.0` when the entry carries none.
    pub fn real_data(&self) -> f32 {
        match self.data {
            AutoConstantData::Real(v) => v,
            AutoConstantData::Int(v) => v as f32,
            AutoConstantData::None => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_in_enum_order() {
        for (i, def) in AUTO_CONSTANT_DEFINITIONS.iter().enumerate() {
            assert_eq!(def.ty as usize, i, "{} out of order", def.name);
        }
        assert_eq!(AutoConstantType::ShadowColour.definition().name, "shadow_colour");
    }

    #[test]
    fn test_lookup_by_name() {
        let def = auto_constant_definition_by_name("worldviewproj_matrix").unwrap();
        assert_eq!(def.ty, AutoConstantType::WorldViewProjMatrix);
        assert_eq!(def.element_count, 16);
        assert!(auto_constant_definition_by_name("nope").is_none());
    }

    #[test]
    fn test_entry_data_defaults() {
        let entry = AutoConstantEntry {
            ty: AutoConstantType::Time,
            index: 0,
            data: AutoConstantData::None,
        };
        assert_eq!(entry.real_data(), 1.0);
        assert_eq!(entry.int_data(), 0);
    }
}
