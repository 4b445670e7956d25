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

//! Render targets and the viewports that draw into them.

/// A surface the renderer draws into.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderTarget {
    /// The target's name.
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `true` for render textures whose rows are stored bottom-up, which
    /// requires the projection to be flipped vertically.
    pub requires_texture_flipping: bool,
}

impl RenderTarget {
    /// Creates a target of the given size that needs no flipping.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            requires_texture_flipping: false,
        }
    }
}

/// A rectangle of a [`RenderTarget`], in pixels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Viewport {
    /// Left edge.
    pub actual_left: i32,
    /// Top edge.
    pub actual_top: i32,
    /// Width.
    pub actual_width: u32,
    /// Height.
    pub actual_height: u32,
    /// The target this viewport belongs to.
    pub target: RenderTarget,
}

impl Viewport {
    /// Creates a viewport covering all of `target`.
    pub fn full(target: RenderTarget) -> Self {
        Self {
            actual_left: 0,
            actual_top: 0,
            actual_width: target.width,
            actual_height: target.height,
            target,
        }
    }
}
