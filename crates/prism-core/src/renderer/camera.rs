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

//! Viewing volumes: the [`Frustum`] shared by cameras and texture
//! projectors, and the [`Camera`] that renders a scene.

use crate::math::{Mat4, Quat, Vec3};

/// The projection used by a [`Frustum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProjectionType {
    /// Perspective projection with a vertical field of view.
    #[default]
    Perspective,
    /// Orthographic projection with a fixed window height.
    Orthographic,
}

/// A right-handed viewing volume looking down its local `-Z` axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// World-space position of the eye.
    pub position: Vec3,
    /// World-space orientation.
    pub orientation: Quat,
    /// Vertical field of view, in radians.
    pub fov_y: f32,
    /// Width divided by height.
    pub aspect: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance. `0.0` means an infinite far plane.
    pub far: f32,
    /// Perspective or orthographic.
    pub projection_type: ProjectionType,
    /// Height of the orthographic window in world units.
    pub ortho_height: f32,
}

impl Frustum {
    /// Builds the world-to-view transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.orientation.conjugate()) * Mat4::from_translation(-self.position)
    }

    /// Builds the projection matrix with the backend's `[0, 1]` depth range.
    pub fn projection_matrix_with_depth(&self) -> Mat4 {
        match self.projection_type {
            ProjectionType::Perspective if self.far == 0.0 => {
                Mat4::perspective_infinite_rh(self.fov_y, self.aspect, self.near)
            }
            ProjectionType::Perspective => {
                Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
            }
            ProjectionType::Orthographic => {
                let half_h = self.ortho_height * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }

    /// The direction the frustum looks along.
    pub fn direction(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// The frustum's local up axis.
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    /// The frustum's local right axis.
    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    /// Rotates the frustum so that it looks at `target`.
    pub fn look_at(&mut self, target: Vec3) {
        let view = Mat4::look_at_rh(self.position, target, Vec3::Y);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.orientation = rotation;
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            fov_y: 45f32.to_radians(),
            aspect: 4.0 / 3.0,
            near: 0.1,
            far: 1000.0,
            projection_type: ProjectionType::Perspective,
            ortho_height: 100.0,
        }
    }
}

/// A named viewpoint from which a scene is rendered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Camera {
    /// The camera's name.
    pub name: String,
    /// The viewing volume.
    pub frustum: Frustum,
}

impl Camera {
    /// Creates a camera with the default frustum.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frustum: Frustum::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_matrix_moves_eye_to_origin() {
        let mut frustum = Frustum::default();
        frustum.position = Vec3::new(1.0, 2.0, 3.0);
        let eye = frustum.view_matrix().transform_point3(frustum.position);
        assert_relative_eq!(eye.length(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_look_at_faces_target() {
        let mut frustum = Frustum {
            position: Vec3::new(0.0, 0.0, 10.0),
            ..Default::default()
        };
        frustum.look_at(Vec3::new(10.0, 0.0, 10.0));
        let dir = frustum.direction();
        assert_relative_eq!(dir.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(dir.z, 0.0, epsilon = 1e-5);
    }
}
