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

//! Hardware capabilities reported by the graphics backend.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A set of optional hardware features.
///
/// Combine flags with `|` and test them with [`Capabilities::contains`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities {
    bits: u32,
}

impl Capabilities {
    /// No optional features.
    pub const NONE: Self = Self { bits: 0 };
    /// Cube map textures.
    pub const CUBE_MAPPING: Self = Self { bits: 1 << 0 };
    /// Volume (3D) textures.
    pub const TEXTURE_3D: Self = Self { bits: 1 << 1 };
    /// DOT3 texture blending.
    pub const DOT3: Self = Self { bits: 1 << 2 };
    /// Texture sampling from vertex programs.
    pub const VERTEX_TEXTURE_FETCH: Self = Self { bits: 1 << 3 };
    /// Anisotropic texture filtering.
    pub const ANISOTROPY: Self = Self { bits: 1 << 4 };
    /// Floating-point render textures.
    pub const TEXTURE_FLOAT: Self = Self { bits: 1 << 5 };
    /// Hardware stencil buffer.
    pub const HW_STENCIL: Self = Self { bits: 1 << 6 };
    /// Separate front and back stencil state.
    pub const TWO_SIDED_STENCIL: Self = Self { bits: 1 << 7 };

    const NAMES: [(Self, &'static str); 8] = [
        (Self::CUBE_MAPPING, "CUBE_MAPPING"),
        (Self::TEXTURE_3D, "TEXTURE_3D"),
        (Self::DOT3, "DOT3"),
        (Self::VERTEX_TEXTURE_FETCH, "VERTEX_TEXTURE_FETCH"),
        (Self::ANISOTROPY, "ANISOTROPY"),
        (Self::TEXTURE_FLOAT, "TEXTURE_FLOAT"),
        (Self::HW_STENCIL, "HW_STENCIL"),
        (Self::TWO_SIDED_STENCIL, "TWO_SIDED_STENCIL"),
    ];

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Returns `true` if every flag in `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Returns `true` if no flag is set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Sets the flags in `other`.
    pub fn insert(&mut self, other: Self) {
        self.bits |= other.bits;
    }

    /// Clears the flags in `other`.
    pub fn remove(&mut self, other: Self) {
        self.bits &= !other.bits;
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

/// What the active graphics backend can do.
///
/// Material compilation checks techniques against this description and
/// rejects (or splits) passes the hardware cannot render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSystemCapabilities {
    /// Number of fixed-function texture units.
    pub num_texture_units: usize,
    /// Number of texture units readable from vertex programs.
    pub num_vertex_texture_units: usize,
    /// Optional features.
    pub capabilities: Capabilities,
    /// Largest supported anisotropy level.
    pub max_anisotropy: u32,
    /// Horizontal offset applied to map texels to pixels.
    pub horizontal_texel_offset: f32,
    /// Vertical offset applied to map texels to pixels.
    pub vertical_texel_offset: f32,
}

impl RenderSystemCapabilities {
    /// Creates a capability set with the given texture unit count and no
    /// optional features.
    pub fn new(num_texture_units: usize) -> Self {
        Self {
            num_texture_units,
            ..Default::default()
        }
    }

    /// Builder-style helper that adds `flags` to the feature set.
    #[must_use]
    pub fn with(mut self, flags: Capabilities) -> Self {
        self.capabilities.insert(flags);
        self
    }

    /// Returns `true` if every feature in `flags` is supported.
    pub fn has_capability(&self, flags: Capabilities) -> bool {
        self.capabilities.contains(flags)
    }
}

impl Default for RenderSystemCapabilities {
    fn default() -> Self {
        Self {
            num_texture_units: 8,
            num_vertex_texture_units: 0,
            capabilities: Capabilities::NONE,
            max_anisotropy: 1,
            horizontal_texel_offset: 0.0,
            vertical_texel_offset: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_capability() {
        let caps = RenderSystemCapabilities::new(4).with(Capabilities::CUBE_MAPPING | Capabilities::DOT3);
        assert!(caps.has_capability(Capabilities::CUBE_MAPPING));
        assert!(caps.has_capability(Capabilities::CUBE_MAPPING | Capabilities::DOT3));
        assert!(!caps.has_capability(Capabilities::TEXTURE_3D));
        assert_eq!(caps.num_texture_units, 4);
    }

    #[test]
    fn test_debug_lists_names() {
        let flags = Capabilities::DOT3 | Capabilities::HW_STENCIL;
        assert_eq!(format!("{flags:?}"), "{DOT3, HW_STENCIL}");
        assert_eq!(format!("{:?}", Capabilities::NONE), "{}");
    }
}
