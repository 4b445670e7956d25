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

//! GPU program descriptors and their per-pass usages.
//!
//! Shader compilation happens in the backend; the material pipeline only
//! needs to know whether a program is usable and how many samplers it
//! declares.

use crate::params::GpuProgramParameters;
use std::sync::Arc;

/// The pipeline stage a program runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuProgramType {
    /// Per-vertex program.
    Vertex,
    /// Per-fragment program.
    Fragment,
}

/// A compiled (or failed) GPU program as reported by the backend.
#[derive(Debug, Clone)]
pub struct GpuProgram {
    /// The program's name.
    pub name: String,
    /// The stage it runs in.
    pub program_type: GpuProgramType,
    /// Shader syntax, e.g. `"wgsl"` or `"ps_2_0"`.
    pub syntax: String,
    /// Whether the current hardware can run the syntax.
    pub supported: bool,
    /// Whether compiling the source failed.
    pub compile_error: bool,
    /// Number of texture samplers the program can bind.
    pub sampler_count: usize,
    /// Whether the program samples textures in the vertex stage.
    pub uses_vertex_textures: bool,
    /// Whether the program performs skeletal animation itself.
    pub skeletal_animation: bool,
    /// Parameters every usage of the program starts with.
    pub default_parameters: GpuProgramParameters,
}

impl GpuProgram {
    /// Creates a supported program with sixteen samplers.
    pub fn new(name: impl Into<String>, program_type: GpuProgramType, syntax: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program_type,
            syntax: syntax.into(),
            supported: true,
            compile_error: false,
            sampler_count: 16,
            uses_vertex_textures: false,
            skeletal_animation: false,
            default_parameters: GpuProgramParameters::new(),
        }
    }

    /// Returns `true` if the program loaded and the hardware can run it.
    pub fn is_supported(&self) -> bool {
        self.supported && !self.compile_error
    }

    /// Creates a fresh parameter set initialised from the defaults.
    pub fn create_parameters(&self) -> GpuProgramParameters {
        self.default_parameters.clone()
    }
}

/// A program bound to one slot of a pass, with its own parameters.
#[derive(Debug, Clone)]
pub struct GpuProgramUsage {
    program: Arc<GpuProgram>,
    parameters: GpuProgramParameters,
}

impl GpuProgramUsage {
    /// Binds `program` with a copy of its default parameters.
    pub fn new(program: Arc<GpuProgram>) -> Self {
        let parameters = program.create_parameters();
        Self {
            program,
            parameters,
        }
    }

    /// The bound program.
    pub fn program(&self) -> &Arc<GpuProgram> {
        &self.program
    }

    /// The usage's parameters.
    pub fn parameters(&self) -> &GpuProgramParameters {
        &self.parameters
    }

    /// Mutable access to the usage's parameters.
    pub fn parameters_mut(&mut self) -> &mut GpuProgramParameters {
        &mut self.parameters
    }

    /// Replaces the usage's parameters.
    pub fn set_parameters(&mut self, parameters: GpuProgramParameters) {
        self.parameters = parameters;
    }
}

/// The six program slots of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramSlot {
    /// Main vertex program.
    Vertex,
    /// Main fragment program.
    Fragment,
    /// Vertex program used while rendering shadow casters.
    ShadowCasterVertex,
    /// Fragment program used while rendering shadow casters.
    ShadowCasterFragment,
    /// Vertex program used while rendering shadow receivers.
    ShadowReceiverVertex,
    /// Fragment program used while rendering shadow receivers.
    ShadowReceiverFragment,
}

impl ProgramSlot {
    /// Every slot, in storage order.
    pub const ALL: [Self; 6] = [
        Self::Vertex,
        Self::Fragment,
        Self::ShadowCasterVertex,
        Self::ShadowCasterFragment,
        Self::ShadowReceiverVertex,
        Self::ShadowReceiverFragment,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// The stage programs in this slot must target.
    pub fn program_type(self) -> GpuProgramType {
        match self {
            Self::Vertex | Self::ShadowCasterVertex | Self::ShadowReceiverVertex => {
                GpuProgramType::Vertex
            }
            _ => GpuProgramType::Fragment,
        }
    }
}
