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

//! GPU program constant storage and auto-constant bindings.
//!
//! Constants are stored as packed `float4` slots (plus a separate `int4`
//! bank) ready to be copied into a uniform buffer. Auto-constants bind a slot
//! to a scene value; [`GpuProgramParameters::update_auto_params_no_lights`]
//! and [`GpuProgramParameters::update_auto_params_lights_only`] resolve them
//! against an [`AutoParamDataSource`].

mod auto_constant;
mod resolve;

pub use auto_constant::{
    auto_constant_definition_by_name, AutoConstantData, AutoConstantDefinition,
    AutoConstantEntry, AutoConstantType, AutoDataKind, ElementType, AUTO_CONSTANT_DEFINITIONS,
};
pub use resolve::{light_resolver, scene_resolver, ConstantValue, Resolver};

use crate::auto_source::AutoParamDataSource;
use crate::error::ParamError;
use ahash::AHashMap;
use prism_core::math::{LinearRgba, Mat4, Vec3, Vec4};
use prism_core::PipelineSettings;

/// Floats per constant slot.
const SLOT_WIDTH: usize = 4;

/// The constants of one GPU program usage.
#[derive(Debug, Clone, Default)]
pub struct GpuProgramParameters {
    float_constants: Vec<f32>,
    float_set: Vec<bool>,
    int_constants: Vec<[i32; 4]>,
    int_set: Vec<bool>,
    named: AHashMap<String, usize>,
    int_named: AHashMap<String, usize>,
    auto_constants: Vec<AutoConstantEntry>,
    transpose_matrices: bool,
    auto_add_param_name: bool,
    pass_iteration_index: Option<usize>,
}

impl GpuProgramParameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty parameter set configured from `settings`.
    pub fn with_settings(settings: &PipelineSettings) -> Self {
        let mut params = Self::new();
        params.apply_settings(settings);
        params
    }

    /// Takes the matrix layout and name policy from `settings`.
    pub fn apply_settings(&mut self, settings: &PipelineSettings) {
        self.transpose_matrices = settings.transpose_matrices;
        self.auto_add_param_name = settings.auto_add_param_name;
    }

    /// Whether matrices are written column by column.
    pub fn transpose_matrices(&self) -> bool {
        self.transpose_matrices
    }

    /// Sets whether matrices are written column by column.
    pub fn set_transpose_matrices(&mut self, transpose: bool) {
        self.transpose_matrices = transpose;
    }

    /// Whether unknown names are allocated a slot instead of failing.
    pub fn auto_add_param_name(&self) -> bool {
        self.auto_add_param_name
    }

    /// Sets whether unknown names are allocated a slot instead of failing.
    pub fn set_auto_add_param_name(&mut self, enabled: bool) {
        self.auto_add_param_name = enabled;
    }

    // --- Float constants ---

    /// Number of allocated `float4` slots.
    pub fn float_vec_constant_count(&self) -> usize {
        self.float_set.len()
    }

    /// Number of allocated `int4` slots.
    pub fn int_constant_count(&self) -> usize {
        self.int_set.len()
    }

    fn ensure_float_slots(&mut self, count: usize) {
        if count > self.float_set.len() {
            self.float_constants.resize(count * SLOT_WIDTH, 0.0);
            self.float_set.resize(count, false);
        }
    }

    /// Writes `values` starting at slot `index`, padding the last slot with
    /// zeros.
    pub fn set_constant_floats(&mut self, index: usize, values: &[f32]) {
        let slots = values.len().div_ceil(SLOT_WIDTH);
        self.ensure_float_slots(index + slots);
        let start = index * SLOT_WIDTH;
        let end = start + slots * SLOT_WIDTH;
        let dst = &mut self.float_constants[start..end];
        dst[..values.len()].copy_from_slice(values);
        dst[values.len()..].fill(0.0);
        self.float_set[index..index + slots].fill(true);
    }

    /// Writes a four-component vector.
    pub fn set_constant_vec4(&mut self, index: usize, value: Vec4) {
        self.set_constant_floats(index, &value.to_array());
    }

    /// Writes a three-component vector with `w = 1`.
    pub fn set_constant_vec3(&mut self, index: usize, value: Vec3) {
        self.set_constant_vec4(index, value.extend(1.0));
    }

    /// Writes a scalar as `(value, 0, 0, 0)`.
    pub fn set_constant_f32(&mut self, index: usize, value: f32) {
        self.set_constant_vec4(index, Vec4::new(value, 0.0, 0.0, 0.0));
    }

    /// Writes a colour as `(r, g, b, a)`.
    pub fn set_constant_colour(&mut self, index: usize, colour: LinearRgba) {
        self.set_constant_floats(index, &colour.to_array());
    }

    /// Writes a matrix over four slots, one row per slot, or one column per
    /// slot when matrices are transposed.
    pub fn set_constant_matrix(&mut self, index: usize, matrix: &Mat4) {
        let data = if self.transpose_matrices {
            matrix.to_cols_array()
        } else {
            matrix.transpose().to_cols_array()
        };
        self.set_constant_floats(index, &data);
    }

    /// Writes consecutive matrices, four slots each.
    pub fn set_constant_matrices(&mut self, index: usize, matrices: &[Mat4]) {
        for (i, matrix) in matrices.iter().enumerate() {
            self.set_constant_matrix(index + i * 4, matrix);
        }
    }

    /// Writes the first three rows of a matrix over three slots.
    pub fn set_constant_matrix_3x4(&mut self, index: usize, matrix: &Mat4) {
        let rows = matrix.transpose().to_cols_array();
        self.set_constant_floats(index, &rows[..12]);
    }

    /// Writes consecutive 3x4 matrices, three slots each.
    pub fn set_constant_matrices_3x4(&mut self, index: usize, matrices: &[Mat4]) {
        for (i, matrix) in matrices.iter().enumerate() {
            self.set_constant_matrix_3x4(index + i * 3, matrix);
        }
    }

    /// Reads back slot `index`, if it was ever written.
    pub fn float_constant(&self, index: usize) -> Option<Vec4> {
        if !self.is_float_constant_set(index) {
            return None;
        }
        let start = index * SLOT_WIDTH;
        Some(Vec4::from_slice(&self.float_constants[start..start + SLOT_WIDTH]))
    }

    /// Returns `true` if slot `index` was ever written.
    pub fn is_float_constant_set(&self, index: usize) -> bool {
        self.float_set.get(index).copied().unwrap_or(false)
    }

    /// The packed float buffer.
    pub fn float_constants(&self) -> &[f32] {
        &self.float_constants
    }

    /// The packed float buffer as bytes, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.float_constants)
    }

    // --- Int constants ---

    /// Writes `values` into consecutive `int4` slots starting at `index`.
    pub fn set_constant_ints(&mut self, index: usize, values: &[i32]) {
        for (i, chunk) in values.chunks(SLOT_WIDTH).enumerate() {
            let mut slot = [0; 4];
            slot[..chunk.len()].copy_from_slice(chunk);
            self.set_constant_int4(index + i, slot);
        }
    }

    /// Writes one `int4` slot.
    pub fn set_constant_int4(&mut self, index: usize, value: [i32; 4]) {
        if index >= self.int_set.len() {
            self.int_constants.resize(index + 1, [0; 4]);
            self.int_set.resize(index + 1, false);
        }
        self.int_constants[index] = value;
        self.int_set[index] = true;
    }

    /// Reads back `int4` slot `index`, if it was ever written.
    pub fn int_constant(&self, index: usize) -> Option<[i32; 4]> {
        match self.int_set.get(index) {
            Some(true) => Some(self.int_constants[index]),
            _ => None,
        }
    }

    // --- Named constants ---

    /// Maps `name` to slot `index`.
    pub fn map_param_name(&mut self, name: impl Into<String>, index: usize) {
        self.named.insert(name.into(), index);
    }

    /// The slot mapped to `name`.
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.named.get(name).copied()
    }

    /// Maps `name` to `int4` slot `index`.
    pub fn map_int_param_name(&mut self, name: impl Into<String>, index: usize) {
        self.int_named.insert(name.into(), index);
    }

    /// The `int4` slot mapped to `name`.
    pub fn int_param_index(&self, name: &str) -> Option<usize> {
        self.int_named.get(name).copied()
    }

    fn resolve_int_name(&mut self, name: &str, slots: usize) -> Result<usize, ParamError> {
        if let Some(index) = self.int_param_index(name) {
            return Ok(index);
        }
        if !self.auto_add_param_name {
            return Err(ParamError::NameNotFound(name.to_owned()));
        }
        let index = self.int_constant_count();
        if slots > 0 {
            self.int_constants.resize(index + slots, [0; 4]);
            self.int_set.resize(index + slots, false);
        }
        self.int_named.insert(name.to_owned(), index);
        log::trace!("Allocated int slot {index} for parameter '{name}'");
        Ok(index)
    }

    fn resolve_name(&mut self, name: &str, slots: usize) -> Result<usize, ParamError> {
        if let Some(index) = self.param_index(name) {
            return Ok(index);
        }
        if !self.auto_add_param_name {
            return Err(ParamError::NameNotFound(name.to_owned()));
        }
        let index = self.float_vec_constant_count();
        self.ensure_float_slots(index + slots);
        self.named.insert(name.to_owned(), index);
        log::trace!("Allocated slot {index} for parameter '{name}'");
        Ok(index)
    }

    /// Writes a vector to the named slot.
    pub fn set_named_constant_vec4(&mut self, name: &str, value: Vec4) -> Result<(), ParamError> {
        let index = self.resolve_name(name, 1)?;
        self.set_constant_vec4(index, value);
        Ok(())
    }

    /// Writes a three-component vector (`w = 1`) to the named slot.
    pub fn set_named_constant_vec3(&mut self, name: &str, value: Vec3) -> Result<(), ParamError> {
        let index = self.resolve_name(name, 1)?;
        self.set_constant_vec3(index, value);
        Ok(())
    }

    /// Writes a scalar to the named slot.
    pub fn set_named_constant_f32(&mut self, name: &str, value: f32) -> Result<(), ParamError> {
        let index = self.resolve_name(name, 1)?;
        self.set_constant_f32(index, value);
        Ok(())
    }

    /// Writes a colour to the named slot.
    pub fn set_named_constant_colour(&mut self, name: &str, colour: LinearRgba) -> Result<(), ParamError> {
        let index = self.resolve_name(name, 1)?;
        self.set_constant_colour(index, colour);
        Ok(())
    }

    /// Writes a matrix to the named slots.
    pub fn set_named_constant_matrix(&mut self, name: &str, matrix: &Mat4) -> Result<(), ParamError> {
        let index = self.resolve_name(name, 4)?;
        self.set_constant_matrix(index, matrix);
        Ok(())
    }

    /// Writes matrices to the named slots.
    pub fn set_named_constant_matrices(&mut self, name: &str, matrices: &[Mat4]) -> Result<(), ParamError> {
        let index = self.resolve_name(name, matrices.len() * 4)?;
        self.set_constant_matrices(index, matrices);
        Ok(())
    }

    /// Writes raw floats to the named slots.
    pub fn set_named_constant_floats(&mut self, name: &str, values: &[f32]) -> Result<(), ParamError> {
        let index = self.resolve_name(name, values.len().div_ceil(SLOT_WIDTH))?;
        self.set_constant_floats(index, values);
        Ok(())
    }

    /// Writes raw ints to the named `int4` slots.
    pub fn set_named_constant_ints(&mut self, name: &str, values: &[i32]) -> Result<(), ParamError> {
        let index = self.resolve_int_name(name, values.len().div_ceil(SLOT_WIDTH))?;
        self.set_constant_ints(index, values);
        Ok(())
    }

    // --- Auto constants ---

    fn insert_auto_constant(&mut self, entry: AutoConstantEntry) {
        if entry.ty == AutoConstantType::PassIterationNumber {
            self.pass_iteration_index = Some(entry.index);
        } else if self.pass_iteration_index == Some(entry.index) {
            self.pass_iteration_index = None;
        }
        match self.auto_constants.iter_mut().find(|e| e.index == entry.index) {
            Some(existing) => *existing = entry,
            None => self.auto_constants.push(entry),
        }
    }

    /// Binds slot `index` to `ty` with an integer selector.
    ///
    /// A slot holds at most one binding: rebinding it replaces the existing
    /// entry in place, keeping its registration order.
    pub fn set_auto_constant(&mut self, index: usize, ty: AutoConstantType, data: usize) {
        let data = match ty.definition().data_kind {
            AutoDataKind::None => AutoConstantData::None,
            AutoDataKind::Int => AutoConstantData::Int(data),
            AutoDataKind::Real => AutoConstantData::Real(data as f32),
        };
        self.insert_auto_constant(AutoConstantEntry { ty, index, data });
    }

    /// Binds slot `index` to `ty` with a real factor. Rebinding a slot
    /// replaces its entry in place.
    pub fn set_auto_constant_real(&mut self, index: usize, ty: AutoConstantType, data: f32) {
        self.insert_auto_constant(AutoConstantEntry {
            ty,
            index,
            data: AutoConstantData::Real(data),
        });
    }

    /// Binds slot `index` to the auto-constant called `script_name`.
    pub fn set_auto_constant_by_name(&mut self, index: usize, script_name: &str, data: usize) -> Result<(), ParamError> {
        let definition = auto_constant_definition_by_name(script_name)
            .ok_or_else(|| ParamError::UnknownAutoConstant(script_name.to_owned()))?;
        self.set_auto_constant(index, definition.ty, data);
        Ok(())
    }

    /// Binds the named slot to `ty` with an integer selector.
    pub fn set_named_auto_constant(&mut self, name: &str, ty: AutoConstantType, data: usize) -> Result<(), ParamError> {
        let definition = ty.definition();
        let index = self.resolve_name(name, definition.element_count.div_ceil(SLOT_WIDTH))?;
        self.set_auto_constant(index, ty, data);
        Ok(())
    }

    /// Binds the named slot to `ty` with a real factor.
    pub fn set_named_auto_constant_real(&mut self, name: &str, ty: AutoConstantType, data: f32) -> Result<(), ParamError> {
        let index = self.resolve_name(name, ty.definition().element_count.div_ceil(SLOT_WIDTH))?;
        self.set_auto_constant_real(index, ty, data);
        Ok(())
    }

    /// Removes the binding of slot `index`.
    pub fn clear_auto_constant(&mut self, index: usize) {
        self.auto_constants.retain(|e| e.index != index);
        if self.pass_iteration_index == Some(index) {
            self.pass_iteration_index = None;
        }
    }

    /// Removes every binding.
    pub fn clear_auto_constants(&mut self) {
        self.auto_constants.clear();
        self.pass_iteration_index = None;
    }

    /// The bindings, in registration order.
    pub fn auto_constants(&self) -> &[AutoConstantEntry] {
        &self.auto_constants
    }

    /// Returns `true` if any slot is bound to an auto-constant.
    pub fn has_auto_constants(&self) -> bool {
        !self.auto_constants.is_empty()
    }

    /// Copies every constant, name and binding from `other`. Settings
    /// flags are kept.
    pub fn copy_constants_from(&mut self, other: &GpuProgramParameters) {
        self.float_constants.clone_from(&other.float_constants);
        self.float_set.clone_from(&other.float_set);
        self.int_constants.clone_from(&other.int_constants);
        self.int_set.clone_from(&other.int_set);
        self.named.clone_from(&other.named);
        self.int_named.clone_from(&other.int_named);
        self.auto_constants.clone_from(&other.auto_constants);
        self.pass_iteration_index = other.pass_iteration_index;
    }

    /// Slot holding the pass iteration number, if one is bound.
    pub fn pass_iteration_index(&self) -> Option<usize> {
        self.pass_iteration_index
    }

    /// Increments the bound pass iteration number in place.
    pub fn inc_pass_iteration_number(&mut self) {
        if let Some(index) = self.pass_iteration_index {
            if self.is_float_constant_set(index) {
                self.float_constants[index * SLOT_WIDTH] += 1.0;
            }
        }
    }

    // --- Resolution ---

    fn write_value(&mut self, index: usize, value: ConstantValue) {
        match value {
            ConstantValue::Scalar(v) => self.set_constant_f32(index, v),
            ConstantValue::Vec4(v) => self.set_constant_vec4(index, v),
            ConstantValue::Matrix(m) => self.set_constant_matrix(index, &m),
            ConstantValue::Matrix3x4(m) => self.set_constant_matrix_3x4(index, &m),
            ConstantValue::Vec4Array(values) => {
                for (i, v) in values.into_iter().enumerate() {
                    self.set_constant_vec4(index + i, v);
                }
            }
            ConstantValue::MatrixArray(matrices) => self.set_constant_matrices(index, &matrices),
            ConstantValue::Matrix3x4Array(matrices) => {
                self.set_constant_matrices_3x4(index, &matrices)
            }
        }
    }

    fn update_with(&mut self, source: &mut AutoParamDataSource<'_>, table: fn(AutoConstantType) -> Option<Resolver>) {
        // Entries are copied out so resolvers can borrow the data source
        // while the buffer is written.
        for i in 0..self.auto_constants.len() {
            let entry = self.auto_constants[i];
            let Some(resolver) = table(entry.ty) else {
                continue;
            };
            if let Some(value) = resolver(source, &entry) {
                self.write_value(entry.index, value);
            }
        }
    }

    /// Resolves every binding that does not depend on the light list.
    pub fn update_auto_params_no_lights(&mut self, source: &mut AutoParamDataSource<'_>) {
        self.update_with(source, scene_resolver);
    }

    /// Resolves every binding that depends on the light list.
    pub fn update_auto_params_lights_only(&mut self, source: &mut AutoParamDataSource<'_>) {
        self.update_with(source, light_resolver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vec3_and_scalar_padding() {
        let mut params = GpuProgramParameters::new();
        params.set_constant_vec3(0, Vec3::new(1.0, 2.0, 3.0));
        params.set_constant_f32(2, 5.0);
        assert_eq!(params.float_constant(0), Some(Vec4::new(1.0, 2.0, 3.0, 1.0)));
        assert_eq!(params.float_constant(2), Some(Vec4::new(5.0, 0.0, 0.0, 0.0)));
        assert!(!params.is_float_constant_set(1));
        assert_eq!(params.float_vec_constant_count(), 3);
    }

    #[test]
    fn test_matrix_rows_and_transpose() {
        let m = Mat4::from_translation(Vec3::new(7.0, 8.0, 9.0));
        let mut params = GpuProgramParameters::new();
        params.set_constant_matrix(0, &m);
        // Row-major: translation ends up in the w column of the first rows.
        assert_eq!(params.float_constant(0), Some(Vec4::new(1.0, 0.0, 0.0, 7.0)));

        params.set_transpose_matrices(true);
        params.set_constant_matrix(0, &m);
        assert_eq!(params.float_constant(3), Some(Vec4::new(7.0, 8.0, 9.0, 1.0)));
    }

    #[test]
    fn test_matrix_3x4_uses_three_slots() {
        let mut params = GpuProgramParameters::new();
        params.set_constant_matrices_3x4(0, &[Mat4::IDENTITY, Mat4::IDENTITY]);
        assert_eq!(params.float_vec_constant_count(), 6);
        assert_eq!(params.float_constant(5), Some(Vec4::new(0.0, 0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_named_lookup_policy() {
        let mut params = GpuProgramParameters::new();
        assert_eq!(
            params.set_named_constant_f32("scale", 2.0),
            Err(ParamError::NameNotFound("scale".into()))
        );

        params.set_auto_add_param_name(true);
        params.set_named_constant_matrix("mvp", &Mat4::IDENTITY).unwrap();
        params.set_named_constant_f32("scale", 2.0).unwrap();
        assert_eq!(params.param_index("mvp"), Some(0));
        assert_eq!(params.param_index("scale"), Some(4));
        assert_relative_eq!(params.float_constant(4).unwrap().x, 2.0);
    }

    #[test]
    fn test_auto_constant_replaces_same_slot() {
        let mut params = GpuProgramParameters::new();
        params.set_auto_constant(0, AutoConstantType::WorldMatrix, 0);
        params.set_auto_constant(0, AutoConstantType::ViewMatrix, 0);
        params.set_auto_constant(4, AutoConstantType::LightDiffuseColour, 1);
        assert_eq!(params.auto_constants().len(), 2);
        assert_eq!(params.auto_constants()[0].ty, AutoConstantType::ViewMatrix);
        assert_eq!(params.auto_constants()[1].data, AutoConstantData::Int(1));
        assert!(params.set_auto_constant_by_name(8, "bogus", 0).is_err());
    }

    #[test]
    fn test_pass_iteration_increment() {
        let mut params = GpuProgramParameters::new();
        params.set_auto_constant(3, AutoConstantType::PassIterationNumber, 0);
        params.set_constant_f32(3, 0.0);
        params.inc_pass_iteration_number();
        params.inc_pass_iteration_number();
        assert_relative_eq!(params.float_constant(3).unwrap().x, 2.0);
    }

    #[test]
    fn test_rebinding_iteration_slot_stops_increment() {
        let mut params = GpuProgramParameters::new();
        params.set_auto_constant(0, AutoConstantType::PassIterationNumber, 0);
        params.set_auto_constant(0, AutoConstantType::WorldMatrix, 0);
        assert_eq!(params.pass_iteration_index(), None);

        params.set_constant_matrix(0, &Mat4::IDENTITY);
        params.inc_pass_iteration_number();
        assert_eq!(params.float_constant(0), Some(Vec4::new(1.0, 0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_int_constants() {
        let mut params = GpuProgramParameters::new();
        params.set_constant_ints(1, &[1, 2, 3, 4, 5]);
        assert_eq!(params.int_constant(1), Some([1, 2, 3, 4]));
        assert_eq!(params.int_constant(2), Some([5, 0, 0, 0]));
        assert_eq!(params.int_constant(0), None);
    }

    #[test]
    fn test_named_ints_allocate_int_slots() {
        let mut params = GpuProgramParameters::new();
        params.set_auto_add_param_name(true);
        params.set_named_constant_vec4("tint", Vec4::ONE).unwrap();
        params.set_named_constant_ints("flags", &[1, 2, 3, 4, 5]).unwrap();
        params.set_named_constant_ints("mode", &[7]).unwrap();

        assert_eq!(params.float_vec_constant_count(), 1);
        assert_eq!(params.int_param_index("flags"), Some(0));
        assert_eq!(params.int_param_index("mode"), Some(2));
        assert_eq!(params.param_index("flags"), None);
        assert_eq!(params.int_constant(1), Some([5, 0, 0, 0]));
        assert_eq!(params.int_constant(2), Some([7, 0, 0, 0]));
        assert_eq!(params.float_constant(0), Some(Vec4::ONE));
    }

    #[test]
    fn test_byte_view_length() {
        let mut params = GpuProgramParameters::new();
        params.set_constant_vec4(1, Vec4::ONE);
        assert_eq!(params.as_bytes().len(), 2 * 4 * std::mem::size_of::<f32>());
    }
}
