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

use anyhow::Result;
use prism_core::renderer::{
    Capabilities, RenderSystemCapabilities, SceneBlendFactor, SceneBlendType,
};
use prism_material::blend::{LayerBlendOperation, LayerBlendOperationEx, LayerBlendSource};
use prism_material::{
    GpuProgram, GpuProgramType, Material, MaterialContext, MaterialError, ProgramSlot,
};
use std::sync::Arc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn context() -> Arc<MaterialContext> {
    Arc::new(MaterialContext::default())
}

#[test]
fn test_split_conserves_texture_units() -> Result<()> {
    init_logger();
    let mut material = Material::new("layers", context());
    {
        let pass = material.technique_mut(0).unwrap().pass_mut(0).unwrap();
        for i in 0..7 {
            pass.create_texture_unit_state(&format!("layer{i}.png"))
                .set_colour_operation(LayerBlendOperation::Add);
        }
    }

    let report = material.compile(&RenderSystemCapabilities::new(3), true);
    assert!(report.is_supported(), "{:?}", report.diagnostics);

    let technique = material.technique(0).unwrap();
    let counts: Vec<_> = technique
        .passes()
        .iter()
        .map(|p| p.num_texture_unit_states())
        .collect();
    assert_eq!(counts, vec![3, 3, 1]);
    assert_eq!(counts.iter().sum::<usize>(), 7);

    for pass in &technique.passes()[1..] {
        let first = pass.texture_unit_state(0).unwrap().colour_blend_mode();
        assert_eq!(first.operation, LayerBlendOperationEx::Source1);
        assert_eq!(first.source1, LayerBlendSource::Texture);
        // Add falls back to additive scene blending.
        assert_eq!(pass.source_blend_factor(), SceneBlendFactor::One);
        assert_eq!(pass.dest_blend_factor(), SceneBlendFactor::One);
    }
    assert_eq!(
        technique.pass(1).unwrap().texture_unit_state(0).unwrap().texture_name(),
        "layer3.png"
    );
    Ok(())
}

#[test]
fn test_lod_fallback_prefers_lower_levels() -> Result<()> {
    let mut material = Material::new("lod", context());
    material.technique_mut(0).unwrap().set_name("near");
    let far = material.create_technique();
    far.set_name("far");
    far.set_lod_index(2);
    far.create_pass();

    material.compile(&RenderSystemCapabilities::default(), true);

    let name = |lod| material.best_technique(lod).map(|t| t.name().to_owned());
    assert_eq!(name(0).as_deref(), Some("near"));
    assert_eq!(name(1).as_deref(), Some("near"));
    assert_eq!(name(2).as_deref(), Some("far"));
    // The closest lower level wins.
    assert_eq!(name(5).as_deref(), Some("far"));
    Ok(())
}

#[test]
fn test_scheme_selection() -> Result<()> {
    let ctx = context();
    let mut material = Material::new("schemes", ctx.clone());
    material.technique_mut(0).unwrap().set_name("default");
    let hdr = material.create_technique();
    hdr.set_name("hdr");
    hdr.set_scheme_name("hdr");
    hdr.create_pass();
    material.compile(&RenderSystemCapabilities::default(), true);

    assert_eq!(material.best_technique(0).unwrap().name(), "default");
    ctx.schemes.set_active_scheme("hdr");
    assert_eq!(material.best_technique(0).unwrap().name(), "hdr");
    ctx.schemes.set_active_scheme("wireframe");
    assert_eq!(material.best_technique(0).unwrap().name(), "default");
    Ok(())
}

#[test]
fn test_unsupported_fragment_program_falls_back() -> Result<()> {
    init_logger();
    let mut material = Material::new("shiny", context());

    let mut program = GpuProgram::new("shiny_fp", GpuProgramType::Fragment, "ps_3_0");
    program.supported = false;
    material
        .technique_mut(0)
        .unwrap()
        .pass_mut(0)
        .unwrap()
        .set_program(ProgramSlot::Fragment, Some(Arc::new(program)));

    let fallback = material.create_technique();
    fallback.set_name("fixed");
    fallback.create_pass().create_texture_unit_state("base.png");

    let report = material.compile(&RenderSystemCapabilities::default(), true);
    assert_eq!(report.supported_count, 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert!(report.diagnostics[0].starts_with("Technique 0: Pass 0: Fragment program shiny_fp"));
    assert!(report.diagnostics[0].contains("not supported"));
    assert_eq!(material.best_technique(0).unwrap().name(), "fixed");
    assert_eq!(material.unsupported_reasons(), report.diagnostics.as_slice());
    Ok(())
}

#[test]
fn test_compile_error_is_reported_separately() -> Result<()> {
    let mut material = Material::new("broken", context());
    let mut program = GpuProgram::new("broken_vp", GpuProgramType::Vertex, "vs_2_0");
    program.compile_error = true;
    material
        .technique_mut(0)
        .unwrap()
        .pass_mut(0)
        .unwrap()
        .set_program(ProgramSlot::Vertex, Some(Arc::new(program)));

    let report = material.compile(&RenderSystemCapabilities::default(), true);
    assert!(!report.is_supported());
    assert!(report.diagnostics[0].contains("compile error"));
    assert!(material.best_technique(0).is_none());
    Ok(())
}

#[test]
fn test_programmable_passes_are_never_split() -> Result<()> {
    let mut material = Material::new("programmable", context());
    let mut program = GpuProgram::new("fp", GpuProgramType::Fragment, "ps_2_0");
    program.sampler_count = 2;
    {
        let pass = material.technique_mut(0).unwrap().pass_mut(0).unwrap();
        pass.set_program(ProgramSlot::Fragment, Some(Arc::new(program)));
        for name in ["a", "b", "c"] {
            pass.create_texture_unit_state(name);
        }
        assert!(matches!(
            pass.split(1),
            Err(MaterialError::ProgrammablePassSplit { .. })
        ));
    }

    let report = material.compile(&RenderSystemCapabilities::new(1), true);
    assert!(!report.is_supported());
    assert!(report.diagnostics[0].contains("Too many texture units for fragment program fp"));
    assert_eq!(material.technique(0).unwrap().num_passes(), 1);
    Ok(())
}

#[test]
fn test_vertex_programmable_pass_cannot_auto_split() -> Result<()> {
    let mut material = Material::new("skinned", context());
    {
        let pass = material.technique_mut(0).unwrap().pass_mut(0).unwrap();
        let program = GpuProgram::new("skin_vp", GpuProgramType::Vertex, "vs_2_0");
        pass.set_program(ProgramSlot::Vertex, Some(Arc::new(program)));
        pass.create_texture_unit_state("a");
        pass.create_texture_unit_state("b");
    }
    let report = material.compile(&RenderSystemCapabilities::new(1), true);
    assert!(!report.is_supported());
    assert!(report.diagnostics[0].contains("cannot auto-split"));
    Ok(())
}

#[test]
fn test_missing_cube_map_support() -> Result<()> {
    let mut material = Material::new("sky", context());
    material
        .technique_mut(0)
        .unwrap()
        .pass_mut(0)
        .unwrap()
        .create_texture_unit_state("")
        .set_cubic_texture_name("sky.dds", true);

    let caps = RenderSystemCapabilities::new(4).with(Capabilities::NONE);
    let report = material.compile(&caps, true);
    assert_eq!(
        report.diagnostics,
        vec!["Technique 0: Pass 0 Tex 0: Cube maps not supported by current environment.".to_owned()]
    );

    let caps = RenderSystemCapabilities::new(4).with(Capabilities::CUBE_MAPPING);
    assert!(material.compile(&caps, true).is_supported());
    Ok(())
}

#[test]
fn test_clone_round_trip_keeps_support_and_transparency() -> Result<()> {
    let ctx = context();
    let mut source = Material::new("A", ctx.clone());
    source.technique_mut(0).unwrap().set_scene_blending(SceneBlendType::TransparentAlpha);
    let second = source.create_technique();
    second.create_pass();
    second.set_lod_index(1);

    let clone = source.clone_as("B");
    let mut copy = Material::new("C", ctx);
    clone.copy_to(&mut copy);

    let caps = RenderSystemCapabilities::default();
    let mut clone = clone;
    let a = clone.compile(&caps, true);
    let b = copy.compile(&caps, true);
    assert_eq!(a.supported_count, b.supported_count);
    assert_eq!(clone.name(), "B");
    assert_eq!(copy.name(), "C");

    let transparency = |m: &Material| m.supported_techniques().map(|t| t.is_transparent()).collect::<Vec<_>>();
    assert_eq!(transparency(&clone), vec![true, false]);
    assert_eq!(transparency(&clone), transparency(&copy));
    assert!(copy.is_transparent());
    Ok(())
}

#[test]
fn test_blend_factors_decide_transparency() -> Result<()> {
    let mut material = Material::new("glass", context());
    let pass = material.technique_mut(0).unwrap().pass_mut(0).unwrap();
    pass.set_scene_blending_factors(SceneBlendFactor::SourceAlpha, SceneBlendFactor::OneMinusSourceAlpha);
    assert!(pass.is_transparent());
    pass.set_scene_blending_factors(SceneBlendFactor::One, SceneBlendFactor::Zero);
    assert!(!pass.is_transparent());
    Ok(())
}

#[test]
fn test_structural_changes_require_recompilation() -> Result<()> {
    let mut material = Material::new("dirty", context());
    material.compile(&RenderSystemCapabilities::default(), true);
    assert!(!material.is_compilation_required());
    material.technique_mut(0).unwrap().create_pass();
    assert!(material.is_compilation_required());
    Ok(())
}
