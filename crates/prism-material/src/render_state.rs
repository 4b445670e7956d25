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

//! Per-draw renderer state handed to the auto-parameter data source.

use prism_core::math::{LinearRgba, Vec4};
use prism_core::renderer::{Camera, FogMode, Light, Viewport};
use prism_core::{SceneManager, VisibleObjectsBoundsInfo};

/// Fog settings, either scene-wide or overridden by a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogState {
    /// Falloff curve.
    pub mode: FogMode,
    /// Fog colour.
    pub colour: LinearRgba,
    /// Density for exponential modes.
    pub density: f32,
    /// Distance where linear fog starts.
    pub start: f32,
    /// Distance where linear fog is total.
    pub end: f32,
}

impl FogState {
    /// Packs the parameters as `(density, start, end, 1 / (end - start))`.
    pub fn params(&self) -> Vec4 {
        let span = self.end - self.start;
        let inverse = if span != 0.0 { 1.0 / span } else { 0.0 };
        Vec4::new(self.density, self.start, self.end, inverse)
    }
}

impl Default for FogState {
    fn default() -> Self {
        Self {
            mode: FogMode::None,
            colour: LinearRgba::WHITE,
            density: 0.001,
            start: 0.0,
            end: 1.0,
        }
    }
}

/// Everything the renderer knows about the current draw that does not
/// change per object.
///
/// Built once per frame (or per viewport) and applied to an
/// [`AutoParamDataSource`](crate::AutoParamDataSource) with
/// [`apply_render_state`](crate::AutoParamDataSource::apply_render_state).
#[derive(Clone, Copy)]
pub struct RenderState<'a> {
    /// The camera rendering the scene.
    pub camera: &'a Camera,
    /// The viewport being drawn into.
    pub viewport: &'a Viewport,
    /// Lights affecting the current object, shadow casters first.
    pub lights: &'a [Light],
    /// Scene ambient light.
    pub ambient: LinearRgba,
    /// Active fog.
    pub fog: FogState,
    /// Seconds since start-up.
    pub time: f32,
    /// Seconds since the previous frame.
    pub frame_time: f32,
    /// Frames per second.
    pub fps: f32,
    /// The scene being rendered.
    pub scene_manager: Option<&'a dyn SceneManager>,
    /// Depth range of objects visible from the main camera.
    pub main_cam_bounds: Option<&'a VisibleObjectsBoundsInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fog_params_packing() {
        let fog = FogState {
            mode: FogMode::Linear,
            start: 10.0,
            end: 30.0,
            ..Default::default()
        };
        let params = fog.params();
        assert_relative_eq!(params.y, 10.0);
        assert_relative_eq!(params.z, 30.0);
        assert_relative_eq!(params.w, 0.05);
    }
}
