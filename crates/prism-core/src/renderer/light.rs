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

//! Defines the light description consumed by auto-parameter resolution.

use crate::math::{LinearRgba, Vec3, Vec4};

/// The kind of light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightType {
    /// Emits in all directions from a point.
    #[default]
    Point,
    /// Parallel rays from an infinitely distant source.
    Directional,
    /// A cone of light from a point.
    Spotlight,
}

/// A light as seen by the material pipeline.
///
/// Positions and directions are expressed in world space; the scene graph is
/// responsible for deriving them before the light list is handed over.
///
/// # Examples
///
/// ```
/// use prism_core::renderer::{Light, LightType};
/// use prism_core::math::{LinearRgba, Vec3};
///
/// let mut lamp = Light::new("lamp", LightType::Point);
/// lamp.position = Vec3::new(0.0, 5.0, 0.0);
/// lamp.diffuse = LinearRgba::rgb(1.0, 0.9, 0.7);
/// assert_eq!(lamp.as_4d_vector().w, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// A name used in diagnostics.
    pub name: String,
    /// The kind of light source.
    pub light_type: LightType,
    /// World-space position. Ignored for directional lights.
    pub position: Vec3,
    /// World-space direction (normalized). Ignored for point lights.
    pub direction: Vec3,
    /// Diffuse colour.
    pub diffuse: LinearRgba,
    /// Specular colour.
    pub specular: LinearRgba,
    /// Distance beyond which the light has no effect.
    pub attenuation_range: f32,
    /// Constant attenuation factor.
    pub attenuation_constant: f32,
    /// Linear attenuation factor.
    pub attenuation_linear: f32,
    /// Quadratic attenuation factor.
    pub attenuation_quadratic: f32,
    /// Spotlight inner cone angle, in radians.
    pub spot_inner: f32,
    /// Spotlight outer cone angle, in radians.
    pub spot_outer: f32,
    /// Falloff between the inner and outer cone.
    pub spot_falloff: f32,
    /// Scale applied to the light's colour for HDR rendering.
    pub power_scale: f32,
    /// Whether the light casts shadows.
    pub casts_shadows: bool,
}

impl Light {
    /// Creates a white light of the given type with default attenuation.
    pub fn new(name: impl Into<String>, light_type: LightType) -> Self {
        Self {
            name: name.into(),
            light_type,
            ..Default::default()
        }
    }

    /// A light that contributes nothing.
    ///
    /// Used to pad light-dependent parameters when fewer lights than
    /// requested are in range.
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            diffuse: LinearRgba::BLACK,
            specular: LinearRgba::BLACK,
            attenuation_range: 0.0,
            attenuation_constant: 1.0,
            attenuation_linear: 0.0,
            attenuation_quadratic: 0.0,
            casts_shadows: false,
            ..Default::default()
        }
    }

    /// Returns the light as a homogeneous vector.
    ///
    /// Directional lights yield the direction *towards* the light with
    /// `w = 0`; other lights yield their position with `w = 1`.
    pub fn as_4d_vector(&self) -> Vec4 {
        match self.light_type {
            LightType::Directional => (-self.direction).extend(0.0),
            _ => self.position.extend(1.0),
        }
    }

    /// Returns `(range, constant, linear, quadratic)`.
    pub fn attenuation(&self) -> Vec4 {
        Vec4::new(
            self.attenuation_range,
            self.attenuation_constant,
            self.attenuation_linear,
            self.attenuation_quadratic,
        )
    }

    /// Sets all four attenuation terms.
    pub fn set_attenuation(&mut self, range: f32, constant: f32, linear: f32, quadratic: f32) {
        self.attenuation_range = range;
        self.attenuation_constant = constant;
        self.attenuation_linear = linear;
        self.attenuation_quadratic = quadratic;
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            name: String::new(),
            light_type: LightType::Point,
            position: Vec3::ZERO,
            direction: Vec3::Z,
            diffuse: LinearRgba::WHITE,
            specular: LinearRgba::BLACK,
            attenuation_range: 100_000.0,
            attenuation_constant: 1.0,
            attenuation_linear: 0.0,
            attenuation_quadratic: 0.0,
            spot_inner: 30f32.to_radians(),
            spot_outer: 40f32.to_radians(),
            spot_falloff: 1.0,
            power_scale: 1.0,
            casts_shadows: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_directional_4d_vector_points_to_light() {
        let mut sun = Light::new("sun", LightType::Directional);
        sun.direction = Vec3::new(0.0, -1.0, 0.0);
        let v = sun.as_4d_vector();
        assert_relative_eq!(v.y, 1.0);
        assert_relative_eq!(v.w, 0.0);
    }

    #[test]
    fn test_blank_light_is_black() {
        let blank = Light::blank();
        assert!(blank.diffuse.is_black());
        assert!(blank.specular.is_black());
        assert_eq!(blank.attenuation(), Vec4::new(0.0, 1.0, 0.0, 0.0));
        assert!(!blank.casts_shadows);
    }
}
