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

//! # Prism Compositor
//!
//! Post-processing chains described by compositor scripts. A [`Compositor`]
//! holds alternative [`CompositionTechnique`]s, each declaring the render
//! textures it needs and the target passes that render into them. Scripts
//! are loaded with [`parse_script`] or through a [`CompositorManager`],
//! which also registers the material schemes target passes refer to.

#![warn(missing_docs)]

pub mod error;
pub mod manager;
pub mod model;
pub mod script;

pub use error::{ParseReport, ScriptError};
pub use manager::CompositorManager;
pub use model::{
    ClearState, CompositionPass, CompositionTargetPass, CompositionTechnique, Compositor,
    InputMode, PassType, StencilState, TextureDefinition,
};
pub use script::parse_script;
