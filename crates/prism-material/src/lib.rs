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

//! # Prism Material
//!
//! The material model (material, technique, pass, texture unit), its
//! compilation against hardware capabilities, the pass maintenance queue,
//! and the resolution of GPU program auto-constants from scene state.

#![warn(missing_docs)]

pub mod auto_source;
pub mod blend;
pub mod context;
pub mod error;
pub mod manager;
pub mod material;
pub mod params;
pub mod pass;
pub mod pass_registry;
pub mod program;
pub mod render_state;
pub mod technique;
pub mod texture_unit;

pub use auto_source::AutoParamDataSource;
pub use context::{MaterialContext, SchemeRegistry};
pub use error::{MaterialError, ParamError};
pub use manager::MaterialManager;
pub use material::{CompileReport, Material};
pub use params::{AutoConstantType, GpuProgramParameters};
pub use pass::Pass;
pub use pass_registry::{PassId, PassRegistry};
pub use program::{GpuProgram, GpuProgramType, GpuProgramUsage, ProgramSlot};
pub use render_state::{FogState, RenderState};
pub use technique::{IlluminationPass, IlluminationStage, Technique};
pub use texture_unit::TextureUnitState;
