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

//! Texture handles and the loader interface used by texture units.

use crate::renderer::TextureType;

/// A loaded texture as seen by the material pipeline.
///
/// The pixel data lives in the backend; the pipeline only needs the
/// metadata exposed to shaders (e.g. texture size auto-constants).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    /// The resource name the texture was loaded from.
    pub name: String,
    /// Dimensionality.
    pub texture_type: TextureType,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth in texels. `1` for non-volume textures.
    pub depth: u32,
}

/// Resolves texture names to loaded textures.
pub trait TextureManager {
    /// Loads (or fetches from cache) the named texture.
    ///
    /// Returns `None` when the texture cannot be found or decoded.
    fn load(&self, name: &str, texture_type: TextureType) -> Option<TextureHandle>;
}
