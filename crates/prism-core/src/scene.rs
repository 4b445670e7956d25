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

//! Interfaces through which the pipeline queries the scene graph.

use crate::math::{LinearRgba, Mat4, Vec4};
use crate::renderer::Light;

/// Something that can be drawn with a material.
///
/// The auto-parameter data source queries the current renderable for its
/// world transforms and for any custom per-object shader parameters.
pub trait Renderable {
    /// Appends this object's world transforms to `out`.
    ///
    /// Skinned objects append one matrix per bone; everything else appends
    /// exactly one. `out` is cleared by the caller beforehand.
    fn world_transforms(&self, out: &mut Vec<Mat4>);

    /// Returns `true` if the view matrix should be replaced by identity,
    /// e.g. for screen-space overlays.
    fn use_identity_view(&self) -> bool {
        false
    }

    /// Returns `true` if the projection matrix should be replaced by identity.
    fn use_identity_projection(&self) -> bool {
        false
    }

    /// Returns the custom parameter stored under `index`, if any.
    fn custom_parameter(&self, _index: usize) -> Option<Vec4> {
        None
    }

    /// Produces the value of a custom auto-constant.
    ///
    /// `data` is the binding's extra data. The default forwards to
    /// [`Renderable::custom_parameter`], so a renderable without a matching
    /// parameter leaves the constant untouched.
    fn update_custom_gpu_parameter(&self, data: usize) -> Option<Vec4> {
        self.custom_parameter(data)
    }
}

/// The distance range covered by a set of visible objects, measured from
/// the camera or light that saw them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleObjectsBoundsInfo {
    /// Distance of the closest object.
    pub min_distance: f32,
    /// Distance of the furthest object.
    pub max_distance: f32,
}

impl VisibleObjectsBoundsInfo {
    /// Widens the range to include `distance`.
    pub fn merge(&mut self, distance: f32) {
        self.min_distance = self.min_distance.min(distance);
        self.max_distance = self.max_distance.max(distance);
    }

    /// Packs the range as `(min, max, max - min, 1 / (max - min))`.
    pub fn depth_range(&self) -> Vec4 {
        let span = self.max_distance - self.min_distance;
        let inverse = if span != 0.0 { 1.0 / span } else { 0.0 };
        Vec4::new(self.min_distance, self.max_distance, span, inverse)
    }
}

impl Default for VisibleObjectsBoundsInfo {
    fn default() -> Self {
        Self {
            min_distance: f32::INFINITY,
            max_distance: 0.0,
        }
    }
}

/// Scene-level services needed while resolving auto-constants.
pub trait SceneManager {
    /// Returns the range covered by the shadow casters seen from `light`.
    fn shadow_caster_bounds_info(&self, light: &Light) -> VisibleObjectsBoundsInfo;

    /// Returns `true` when shadows are rendered through shadow textures.
    fn is_shadow_technique_texture_based(&self) -> bool;

    /// How far shadow volumes of directional lights are extruded.
    fn shadow_directional_light_extrusion_distance(&self) -> f32 {
        10_000.0
    }

    /// The colour used for modulative shadows.
    fn shadow_colour(&self) -> LinearRgba {
        LinearRgba::rgb(0.25, 0.25, 0.25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_depth_range_packing() {
        let mut info = VisibleObjectsBoundsInfo::default();
        info.merge(2.0);
        info.merge(10.0);
        let range = info.depth_range();
        assert_relative_eq!(range.x, 2.0);
        assert_relative_eq!(range.y, 10.0);
        assert_relative_eq!(range.z, 8.0);
        assert_relative_eq!(range.w, 0.125);
    }
}
