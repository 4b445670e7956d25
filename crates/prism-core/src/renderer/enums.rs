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

//! Enumerations describing fixed-function render state.

use serde::{Deserialize, Serialize};

/// A factor in the frame-buffer blend equation
/// `final = src * src_factor + dest * dest_factor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneBlendFactor {
    /// `1.0`.
    One,
    /// `0.0`.
    Zero,
    /// The colour already in the frame buffer.
    DestColour,
    /// The colour produced by the pass.
    SourceColour,
    /// `1.0 - dest colour`.
    OneMinusDestColour,
    /// `1.0 - source colour`.
    OneMinusSourceColour,
    /// The alpha already in the frame buffer.
    DestAlpha,
    /// The alpha produced by the pass.
    SourceAlpha,
    /// `1.0 - dest alpha`.
    OneMinusDestAlpha,
    /// `1.0 - source alpha`.
    OneMinusSourceAlpha,
}

impl SceneBlendFactor {
    /// Returns `true` if the factor reads back from the frame buffer.
    pub fn reads_destination(self) -> bool {
        matches!(
            self,
            Self::DestColour | Self::OneMinusDestColour | Self::DestAlpha | Self::OneMinusDestAlpha
        )
    }
}

/// Common blend presets expressed as a pair of [`SceneBlendFactor`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneBlendType {
    /// Classic alpha blending.
    TransparentAlpha,
    /// Blends using the source colour as the weight.
    TransparentColour,
    /// Adds the source to the destination.
    Add,
    /// Multiplies the destination by the source.
    Modulate,
    /// Overwrites the destination. This is the default for opaque passes.
    Replace,
}

impl SceneBlendType {
    /// Returns `(source, destination)` factors for this preset.
    pub fn factors(self) -> (SceneBlendFactor, SceneBlendFactor) {
        use SceneBlendFactor as F;
        match self {
            Self::TransparentAlpha => (F::SourceAlpha, F::OneMinusSourceAlpha),
            Self::TransparentColour => (F::SourceColour, F::OneMinusSourceColour),
            Self::Add => (F::One, F::One),
            Self::Modulate => (F::DestColour, F::Zero),
            Self::Replace => (F::One, F::Zero),
        }
    }
}

/// The comparison function used for depth, alpha-reject and stencil testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// The test never passes.
    Never,
    /// Passes if the new value is less than the existing value.
    Less,
    /// Passes if the new value is equal to the existing value.
    Equal,
    /// Passes if the new value is less than or equal to the existing value.
    LessEqual,
    /// Passes if the new value is greater than the existing value.
    Greater,
    /// Passes if the new value is not equal to the existing value.
    NotEqual,
    /// Passes if the new value is greater than or equal to the existing value.
    GreaterEqual,
    /// The test always passes.
    #[default]
    Always,
}

/// An operation to perform on a stencil buffer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Keep the existing stencil value.
    #[default]
    Keep,
    /// Set the stencil value to 0.
    Zero,
    /// Replace the stencil value with the reference value.
    Replace,
    /// Bitwise invert the stencil value.
    Invert,
    /// Increment, clamping at the maximum value.
    IncrementClamp,
    /// Decrement, clamping at 0.
    DecrementClamp,
    /// Increment, wrapping to 0 on overflow.
    IncrementWrap,
    /// Decrement, wrapping to the maximum value on underflow.
    DecrementWrap,
}

/// Hardware culling based on vertex winding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullingMode {
    /// Nothing is culled.
    None,
    /// Cull triangles whose vertices wind clockwise.
    #[default]
    Clockwise,
    /// Cull triangles whose vertices wind anticlockwise.
    Anticlockwise,
}

/// Software culling performed against the camera before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ManualCullingMode {
    /// No manual culling.
    None,
    /// Cull triangles facing away from the camera.
    #[default]
    Back,
    /// Cull triangles facing the camera.
    Front,
}

/// Light interpolation across a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadeOptions {
    /// One colour per face.
    Flat,
    /// Colours interpolated across the face.
    #[default]
    Gouraud,
    /// Normals interpolated across the face.
    Phong,
}

/// Defines how polygons are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    /// Polygon vertices are rendered as points.
    Point,
    /// Polygons are rendered as outlines (wireframe).
    Line,
    /// Polygons are filled.
    #[default]
    Fill,
}

/// Fog falloff curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FogMode {
    /// No fog.
    #[default]
    None,
    /// Exponential density.
    Exp,
    /// Squared exponential density.
    Exp2,
    /// Linear between start and end distances.
    Linear,
}

/// The filter applied for one sampling stage (min, mag or mip).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterOptions {
    /// No filtering. Only meaningful for mip filtering.
    None,
    /// Nearest texel.
    #[default]
    Point,
    /// Linear interpolation between texels.
    Linear,
    /// Anisotropic filtering.
    Anisotropic,
}

/// Convenience presets that set min, mag and mip filtering together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFilterOptions {
    /// Point sampling with no mipmapping.
    None,
    /// Linear sampling, nearest mip level.
    #[default]
    Bilinear,
    /// Linear sampling between mip levels.
    Trilinear,
    /// Anisotropic sampling.
    Anisotropic,
}

impl TextureFilterOptions {
    /// Expands the preset into `(min, mag, mip)` filters.
    pub fn to_filters(self) -> (FilterOptions, FilterOptions, FilterOptions) {
        use FilterOptions as F;
        match self {
            Self::None => (F::Point, F::Point, F::None),
            Self::Bilinear => (F::Linear, F::Linear, F::Point),
            Self::Trilinear => (F::Linear, F::Linear, F::Linear),
            Self::Anisotropic => (F::Anisotropic, F::Anisotropic, F::Linear),
        }
    }
}

/// How texture coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureAddressingMode {
    /// Repeat the texture.
    #[default]
    Wrap,
    /// Repeat the texture, flipping on every boundary.
    Mirror,
    /// Clamp to the edge texel.
    Clamp,
    /// Use the border colour.
    Border,
}

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureType {
    /// A one dimensional texture.
    OneD,
    /// A two dimensional texture.
    #[default]
    TwoD,
    /// A volume texture.
    ThreeD,
    /// A six-faced cube map.
    CubeMap,
}

/// Pixel formats that can be requested for render textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// Unknown or unspecified.
    #[default]
    Unknown,
    /// 8-bit luminance.
    L8,
    /// 24-bit RGB.
    R8G8B8,
    /// 32-bit ARGB.
    A8R8G8B8,
    /// 32-bit ABGR.
    A8B8G8R8,
    /// 32-bit RGB with an unused byte.
    X8R8G8B8,
    /// Single 16-bit float channel.
    FloatR16,
    /// Four 16-bit float channels.
    FloatR16G16B16A16,
    /// Single 32-bit float channel.
    FloatR32,
    /// Four 32-bit float channels.
    FloatR32G32B32A32,
}

impl PixelFormat {
    /// Looks up a format by its script name, e.g. `PF_A8R8G8B8`.
    pub fn from_name(name: &str) -> Option<Self> {
        let format = match name {
            "PF_L8" => Self::L8,
            "PF_R8G8B8" => Self::R8G8B8,
            "PF_A8R8G8B8" => Self::A8R8G8B8,
            "PF_A8B8G8R8" => Self::A8B8G8R8,
            "PF_X8R8G8B8" => Self::X8R8G8B8,
            "PF_FLOAT16_R" => Self::FloatR16,
            "PF_FLOAT16_RGBA" => Self::FloatR16G16B16A16,
            "PF_FLOAT32_R" => Self::FloatR32,
            "PF_FLOAT32_RGBA" => Self::FloatR32G32B32A32,
            _ => return None,
        };
        Some(format)
    }

    /// Returns `true` for floating-point formats.
    pub fn is_floating_point(self) -> bool {
        matches!(
            self,
            Self::FloatR16 | Self::FloatR16G16B16A16 | Self::FloatR32 | Self::FloatR32G32B32A32
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_type_factors() {
        use SceneBlendFactor as F;
        assert_eq!(
            SceneBlendType::TransparentAlpha.factors(),
            (F::SourceAlpha, F::OneMinusSourceAlpha)
        );
        assert_eq!(SceneBlendType::Replace.factors(), (F::One, F::Zero));
        assert_eq!(SceneBlendType::Modulate.factors(), (F::DestColour, F::Zero));
    }

    #[test]
    fn test_pixel_format_names() {
        assert_eq!(PixelFormat::from_name("PF_A8R8G8B8"), Some(PixelFormat::A8R8G8B8));
        assert!(PixelFormat::from_name("PF_FLOAT16_RGBA")
            .is_some_and(PixelFormat::is_floating_point));
        assert_eq!(PixelFormat::from_name("PF_NOPE"), None);
    }

    #[test]
    fn test_filter_presets() {
        assert_eq!(
            TextureFilterOptions::Trilinear.to_filters(),
            (FilterOptions::Linear, FilterOptions::Linear, FilterOptions::Linear)
        );
        assert_eq!(TextureFilterOptions::None.to_filters().2, FilterOptions::None);
    }
}
