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

//! Fixed-function texture layer blending.

use prism_core::math::LinearRgba;
use prism_core::renderer::SceneBlendFactor;

/// Which channel group a [`LayerBlendModeEx`] applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerBlendType {
    /// RGB channels.
    Colour,
    /// The alpha channel.
    Alpha,
}

/// Simple blend presets between a texture layer and what lies beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerBlendOperation {
    /// Replace everything with the texture.
    Replace,
    /// Add the texture to the existing colour.
    Add,
    /// Multiply the existing colour by the texture.
    Modulate,
    /// Blend using the texture's alpha.
    AlphaBlend,
}

/// The full set of layer blend operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerBlendOperationEx {
    /// Use `source1` unmodified.
    Source1,
    /// Use `source2` unmodified.
    Source2,
    /// `source1 * source2`.
    Modulate,
    /// `source1 * source2 * 2`.
    ModulateX2,
    /// `source1 * source2 * 4`.
    ModulateX4,
    /// `source1 + source2`.
    Add,
    /// `source1 + source2 - 0.5`.
    AddSigned,
    /// `source1 + source2 - source1 * source2`.
    AddSmooth,
    /// `source1 - source2`.
    Subtract,
    /// Interpolate using the interpolated vertex alpha.
    BlendDiffuseAlpha,
    /// Interpolate using the texture alpha.
    BlendTextureAlpha,
    /// Interpolate using the alpha of the previous stage.
    BlendCurrentAlpha,
    /// Interpolate using a manual factor.
    BlendManual,
    /// Dot product of the two sources (DOT3 bump mapping).
    DotProduct,
    /// Interpolate using the interpolated vertex colour.
    BlendDiffuseColour,
}

/// An input to a layer blend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerBlendSource {
    /// The output of the previous stage.
    Current,
    /// The texture of this unit.
    Texture,
    /// The interpolated diffuse colour.
    Diffuse,
    /// The interpolated specular colour.
    Specular,
    /// A constant given with the operation.
    Manual,
}

/// A complete description of how one channel group of a texture layer is
/// combined with the previous stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerBlendModeEx {
    /// Colour or alpha.
    pub blend_type: LayerBlendType,
    /// The operation.
    pub operation: LayerBlendOperationEx,
    /// The first input.
    pub source1: LayerBlendSource,
    /// The second input.
    pub source2: LayerBlendSource,
    /// Constant for `source1` when it is [`LayerBlendSource::Manual`] (colour blends).
    pub colour_arg1: LinearRgba,
    /// Constant for `source2` when it is [`LayerBlendSource::Manual`] (colour blends).
    pub colour_arg2: LinearRgba,
    /// Constant for `source1` when it is [`LayerBlendSource::Manual`] (alpha blends).
    pub alpha_arg1: f32,
    /// Constant for `source2` when it is [`LayerBlendSource::Manual`] (alpha blends).
    pub alpha_arg2: f32,
    /// Factor for [`LayerBlendOperationEx::BlendManual`].
    pub factor: f32,
}

impl LayerBlendModeEx {
    /// The default blend: texture modulated with the previous stage.
    pub fn modulate(blend_type: LayerBlendType) -> Self {
        Self {
            blend_type,
            operation: LayerBlendOperationEx::Modulate,
            source1: LayerBlendSource::Texture,
            source2: LayerBlendSource::Current,
            colour_arg1: LinearRgba::WHITE,
            colour_arg2: LinearRgba::WHITE,
            alpha_arg1: 1.0,
            alpha_arg2: 1.0,
            factor: 0.0,
        }
    }

    /// Returns `true` if the blend needs DOT3 hardware support.
    pub fn requires_dot3(&self) -> bool {
        self.operation == LayerBlendOperationEx::DotProduct
    }
}

impl LayerBlendOperation {
    /// Expands the preset into `(operation, source1, source2)`.
    pub fn to_ex(self) -> (LayerBlendOperationEx, LayerBlendSource, LayerBlendSource) {
        use LayerBlendOperationEx as Op;
        use LayerBlendSource as Src;
        match self {
            Self::Replace => (Op::Source1, Src::Texture, Src::Current),
            Self::Add => (Op::Add, Src::Texture, Src::Current),
            Self::Modulate => (Op::Modulate, Src::Texture, Src::Current),
            Self::AlphaBlend => (Op::BlendTextureAlpha, Src::Texture, Src::Current),
        }
    }

    /// Scene blend factors that emulate this preset when the layer has to
    /// be rendered in a pass of its own.
    pub fn multipass_fallback(self) -> (SceneBlendFactor, SceneBlendFactor) {
        use SceneBlendFactor as F;
        match self {
            Self::Replace => (F::One, F::Zero),
            Self::Add => (F::One, F::One),
            Self::Modulate => (F::DestColour, F::Zero),
            Self::AlphaBlend => (F::SourceAlpha, F::OneMinusSourceAlpha),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_expands_to_source1() {
        let (op, s1, s2) = LayerBlendOperation::Replace.to_ex();
        assert_eq!(op, LayerBlendOperationEx::Source1);
        assert_eq!(s1, LayerBlendSource::Texture);
        assert_eq!(s2, LayerBlendSource::Current);
    }

    #[test]
    fn test_fallbacks() {
        use SceneBlendFactor as F;
        assert_eq!(LayerBlendOperation::Add.multipass_fallback(), (F::One, F::One));
        assert_eq!(
            LayerBlendOperation::Modulate.multipass_fallback(),
            (F::DestColour, F::Zero)
        );
    }
}
