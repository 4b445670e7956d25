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

//! # Prism Core
//!
//! Contracts and plain data consumed by the material and compositor pipeline:
//! colours, hardware capabilities, render state enums, lights, cameras,
//! render targets and the traits through which the pipeline talks to the
//! scene graph and the texture loader.

#![warn(missing_docs)]

pub mod math;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod texture;

pub use math::LinearRgba;
pub use renderer::{
    Camera, Capabilities, Frustum, Light, LightType, ProjectionType, RenderSystemCapabilities,
    RenderTarget, Viewport,
};
pub use scene::{Renderable, SceneManager, VisibleObjectsBoundsInfo};
pub use settings::{PipelineSettings, SettingsError};
pub use texture::{TextureHandle, TextureManager};
