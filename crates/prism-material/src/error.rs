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

//! Error types for the material model and GPU program parameters.

use crate::pass_registry::PassId;

/// A structural misuse of the material model.
///
/// Hardware limitations are not errors; they are reported as diagnostics in
/// a [`CompileReport`](crate::CompileReport).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaterialError {
    /// A technique index was out of range.
    #[error("technique index {index} is out of range ({count} techniques)")]
    TechniqueIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of techniques.
        count: usize,
    },
    /// A pass index was out of range.
    #[error("pass index {index} is out of range ({count} passes)")]
    PassIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of passes.
        count: usize,
    },
    /// A texture unit index was out of range.
    #[error("texture unit index {index} is out of range ({count} units)")]
    TextureUnitIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of texture units.
        count: usize,
    },
    /// The texture unit is still attached to another pass.
    #[error("texture unit already belongs to pass {owner}, detach it first")]
    TextureUnitOwned {
        /// The pass that owns the unit.
        owner: PassId,
    },
    /// Passes using GPU programs must not be split across several passes.
    #[error("pass {pass} uses GPU programs and cannot be split")]
    ProgrammablePassSplit {
        /// The pass that was asked to split.
        pass: PassId,
    },
    /// The pass does not have more units than the split point.
    #[error("cannot split a pass of {count} texture units at unit {at}")]
    NothingToSplit {
        /// The split point.
        at: usize,
        /// The number of texture units.
        count: usize,
    },
    /// A texture frame index was out of range.
    #[error("frame index {index} is out of range ({count} frames)")]
    FrameIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of frames.
        count: usize,
    },
    /// A texture unit can hold at most [`MAX_FRAMES`](crate::texture_unit::MAX_FRAMES) frames.
    #[error("a texture unit holds at most {max} frames, {requested} requested")]
    TooManyFrames {
        /// The requested frame count.
        requested: usize,
        /// The limit.
        max: usize,
    },
    /// A material with the same name already exists.
    #[error("material '{0}' already exists")]
    DuplicateMaterial(String),
}

/// An error raised while writing GPU program constants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    /// The named constant is not mapped and auto-allocation is disabled.
    #[error("named constant '{0}' does not exist")]
    NameNotFound(String),
    /// No auto-constant has this script name.
    #[error("unknown auto constant '{0}'")]
    UnknownAutoConstant(String),
}

/// Result alias for material operations.
pub type Result<T, E = MaterialError> = std::result::Result<T, E>;
