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

//! The compositor data model.

use prism_core::math::LinearRgba;
use prism_core::renderer::{
    Capabilities, CompareFunction, PixelFormat, RenderSystemCapabilities, StencilOperation,
};
use prism_material::MaterialManager;

/// Where a target pass takes its initial contents from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Start from whatever the target already holds.
    #[default]
    None,
    /// Start from the output of the previous compositor in the chain.
    Previous,
}

/// What a composition pass does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassType {
    /// Clear buffers of the target.
    Clear,
    /// Change stencil state for the following passes.
    Stencil,
    /// Render part of the scene.
    RenderScene,
    /// Render a full-screen quad with a material.
    #[default]
    RenderQuad,
}

/// A render texture local to a composition technique.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDefinition {
    /// Name other passes refer to the texture by.
    pub name: String,
    /// Width in pixels, or 0 to follow the final target.
    pub width: u32,
    /// Height in pixels, or 0 to follow the final target.
    pub height: u32,
    /// Pixel format.
    pub format: PixelFormat,
}

impl TextureDefinition {
    /// Resolves the definition against a final target of the given size.
    pub fn resolved_size(&self, target_width: u32, target_height: u32) -> (u32, u32) {
        let width = if self.width == 0 { target_width } else { self.width };
        let height = if self.height == 0 { target_height } else { self.height };
        (width, height)
    }
}

/// Buffers and values a clear pass writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearState {
    /// Clear the colour buffer.
    pub colour: bool,
    /// Clear the depth buffer.
    pub depth: bool,
    /// Clear the stencil buffer.
    pub stencil: bool,
    /// Colour written by the clear.
    pub colour_value: LinearRgba,
    /// Depth written by the clear.
    pub depth_value: f32,
    /// Stencil value written by the clear.
    pub stencil_value: u32,
}

impl Default for ClearState {
    fn default() -> Self {
        Self {
            colour: true,
            depth: true,
            stencil: false,
            colour_value: LinearRgba::TRANSPARENT,
            depth_value: 1.0,
            stencil_value: 0,
        }
    }
}

/// Stencil state a stencil pass applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilState {
    /// Enables the stencil test.
    pub check: bool,
    /// Test function.
    pub function: CompareFunction,
    /// Reference value.
    pub reference: u32,
    /// Mask applied to both the reference and the buffer.
    pub mask: u32,
    /// Operation when the stencil test fails.
    pub fail_op: StencilOperation,
    /// Operation when the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// Operation when both tests pass.
    pub pass_op: StencilOperation,
    /// Applies the inverse operations to back faces.
    pub two_sided: bool,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            check: false,
            function: CompareFunction::Always,
            reference: 0,
            mask: u32::MAX,
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
            two_sided: false,
        }
    }
}

/// One operation inside a target pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionPass {
    /// What the pass does.
    pub pass_type: PassType,
    /// Material used by quad passes.
    pub material_name: Option<String>,
    /// Identifier handed to listeners.
    pub identifier: u32,
    /// First render queue drawn by scene passes.
    pub first_render_queue: u8,
    /// Last render queue drawn by scene passes.
    pub last_render_queue: u8,
    /// Local textures bound to the material, by sampler index.
    pub inputs: Vec<Option<String>>,
    /// Clear settings of clear passes.
    pub clear: ClearState,
    /// Stencil settings of stencil passes.
    pub stencil: StencilState,
}

impl CompositionPass {
    /// Creates a pass of the given type with default state.
    pub fn new(pass_type: PassType) -> Self {
        Self {
            pass_type,
            material_name: None,
            identifier: 0,
            first_render_queue: 0,
            last_render_queue: 95,
            inputs: Vec::new(),
            clear: ClearState::default(),
            stencil: StencilState::default(),
        }
    }

    /// Binds the local texture `name` to sampler `index`.
    pub fn set_input(&mut self, index: usize, name: impl Into<String>) {
        if self.inputs.len() <= index {
            self.inputs.resize(index + 1, None);
        }
        self.inputs[index] = Some(name.into());
    }

    /// Texture bound to sampler `index`.
    pub fn input(&self, index: usize) -> Option<&str> {
        self.inputs.get(index).and_then(|i| i.as_deref())
    }

    fn is_supported(&self, caps: &RenderSystemCapabilities) -> bool {
        match self.pass_type {
            PassType::Stencil => {
                caps.has_capability(Capabilities::HW_STENCIL)
                    && (!self.stencil.two_sided
                        || caps.has_capability(Capabilities::TWO_SIDED_STENCIL))
            }
            _ => true,
        }
    }
}

/// A sequence of passes rendering into one target.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionTargetPass {
    /// Initial contents of the target.
    pub input_mode: InputMode,
    /// Local texture rendered into, or `None` for the technique output.
    pub output_name: Option<String>,
    /// Render only on the first frame.
    pub only_initial: bool,
    /// Scene objects drawn by scene passes.
    pub visibility_mask: u32,
    /// Multiplier applied to the camera LOD bias.
    pub lod_bias: f32,
    /// Material scheme used by scene passes, empty for the active one.
    pub material_scheme: String,
    /// Index of `material_scheme` once registered.
    pub scheme_index: Option<u16>,
    /// The passes, in render order.
    pub passes: Vec<CompositionPass>,
}

impl CompositionTargetPass {
    /// Creates a target pass writing into `output_name`.
    pub fn new(output_name: Option<String>) -> Self {
        Self {
            input_mode: InputMode::None,
            output_name,
            only_initial: false,
            visibility_mask: u32::MAX,
            lod_bias: 1.0,
            material_scheme: String::new(),
            scheme_index: None,
            passes: Vec::new(),
        }
    }

    /// Returns `true` if this target pass writes the technique output.
    pub fn is_output(&self) -> bool {
        self.output_name.is_none()
    }
}

/// One way of implementing a compositor.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionTechnique {
    /// Local render textures.
    pub textures: Vec<TextureDefinition>,
    /// Target passes rendering into local textures, in order.
    pub target_passes: Vec<CompositionTargetPass>,
    /// The target pass producing the final image.
    pub output_target: CompositionTargetPass,
}

impl Default for CompositionTechnique {
    fn default() -> Self {
        Self {
            textures: Vec::new(),
            target_passes: Vec::new(),
            output_target: CompositionTargetPass::new(None),
        }
    }
}

impl CompositionTechnique {
    /// Local texture called `name`.
    pub fn texture(&self, name: &str) -> Option<&TextureDefinition> {
        self.textures.iter().find(|t| t.name == name)
    }

    /// All target passes, output last.
    pub fn all_target_passes(&self) -> impl Iterator<Item = &CompositionTargetPass> + '_ {
        self.target_passes
            .iter()
            .chain(std::iter::once(&self.output_target))
    }

    /// Returns `true` if the hardware can run this technique.
    ///
    /// Floating point textures need float texture support and stencil passes
    /// need a hardware stencil buffer.
    pub fn is_supported(&self, caps: &RenderSystemCapabilities) -> bool {
        let float_ok = caps.has_capability(Capabilities::TEXTURE_FLOAT);
        let textures_ok = self
            .textures
            .iter()
            .all(|t| float_ok || !t.format.is_floating_point());
        textures_ok
            && self
                .all_target_passes()
                .flat_map(|t| &t.passes)
                .all(|p| p.is_supported(caps))
    }

    /// Names of quad materials that are unknown to `materials` or have no
    /// supported technique.
    pub fn missing_materials(&self, materials: &MaterialManager) -> Vec<String> {
        let mut missing: Vec<String> = self
            .all_target_passes()
            .flat_map(|t| &t.passes)
            .filter(|p| p.pass_type == PassType::RenderQuad)
            .filter_map(|p| p.material_name.as_deref())
            .filter(|name| {
                materials
                    .get(name)
                    .is_none_or(|m| m.num_supported_techniques() == 0)
            })
            .map(str::to_owned)
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}

/// A named post-processing effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Compositor {
    name: String,
    techniques: Vec<CompositionTechnique>,
    supported: Vec<usize>,
    compiled: bool,
}

impl Compositor {
    /// Creates an empty compositor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            techniques: Vec::new(),
            supported: Vec::new(),
            compiled: false,
        }
    }

    /// The compositor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a technique and returns it.
    pub fn create_technique(&mut self) -> &mut CompositionTechnique {
        self.compiled = false;
        self.techniques.push(CompositionTechnique::default());
        let last = self.techniques.len() - 1;
        &mut self.techniques[last]
    }

    pub(crate) fn push_technique(&mut self, technique: CompositionTechnique) {
        self.compiled = false;
        self.techniques.push(technique);
    }

    /// All techniques in declaration order.
    pub fn techniques(&self) -> &[CompositionTechnique] {
        &self.techniques
    }

    /// Mutable access to every technique. Marks the compositor for
    /// recompilation.
    pub fn techniques_mut(&mut self) -> &mut [CompositionTechnique] {
        self.compiled = false;
        &mut self.techniques
    }

    /// Checks every technique against `caps` and returns how many are
    /// supported.
    pub fn compile(&mut self, caps: &RenderSystemCapabilities) -> usize {
        self.supported = self
            .techniques
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_supported(caps))
            .map(|(i, _)| i)
            .collect();
        self.compiled = true;
        if self.supported.is_empty() {
            log::warn!(
                "Compositor '{}' has no technique supported by the current hardware",
                self.name
            );
        }
        self.supported.len()
    }

    /// Returns `true` if [`compile`](Self::compile) ran since the last
    /// structural change.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Returns `true` if at least one technique is supported.
    pub fn is_supported(&self) -> bool {
        !self.supported.is_empty()
    }

    /// Supported techniques in preference order.
    pub fn supported_techniques(&self) -> impl Iterator<Item = &CompositionTechnique> + '_ {
        self.supported.iter().filter_map(|&i| self.techniques.get(i))
    }
}
