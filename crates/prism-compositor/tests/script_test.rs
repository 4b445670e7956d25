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
use prism_compositor::{CompositorManager, InputMode, PassType, ScriptError};
use prism_core::math::LinearRgba;
use prism_core::renderer::{
    Capabilities, CompareFunction, PixelFormat, RenderSystemCapabilities, StencilOperation,
};
use prism_core::PipelineSettings;
use prism_material::{MaterialContext, MaterialManager};
use std::io::Write;
use std::sync::Arc;

const BLOOM: &str = r#"
// Two pass bloom
compositor Bloom
{
    technique
    {
        texture rt0 target_width target_height PF_A8R8G8B8
        texture rt1 256 256 PF_FLOAT16_RGBA

        target rt0
        {
            input previous
            visibility_mask 0x0000FFFF
            lod_bias 0.5
            material_scheme Glow
        }

        target rt1
        {
            input none
            only_initial on
            pass clear
            {
                clear
                {
                    buffers colour depth
                    colour_value 0.1 0.2 0.3 1
                    depth_value 0.5
                }
            }
            pass render_quad
            {
                material Bloom/Blur
                input 0 rt0
                identifier 7
            }
        }

        target_output
        {
            input none
            pass stencil
            {
                stencil
                {
                    check on
                    comp_func greater_equal
                    ref_value 1
                    mask 0xFF
                    fail_op keep
                    depth_fail_op increment_wrap
                    pass_op replace
                    two_sided off
                }
            }
            pass render_quad
            {
                material Bloom/Combine
                input 0 rt0
                input 1 rt1
            }
        }
    }
}
"#;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn manager() -> CompositorManager {
    CompositorManager::new(Arc::new(MaterialContext::default()))
}

#[test]
fn test_full_script_builds_model() -> Result<()> {
    init_logger();
    let mut compositors = manager();
    let report = compositors.parse_str(BLOOM, "bloom.compositor");
    assert!(report.is_clean(), "{:?}", report.errors);
    assert_eq!(report.compositors, vec!["Bloom".to_owned()]);

    let bloom = compositors.get("Bloom").ok_or_else(|| anyhow::anyhow!("Bloom missing"))?;
    let technique = &bloom.techniques()[0];
    assert_eq!(technique.textures.len(), 2);
    assert_eq!(technique.textures[0].width, 0);
    assert_eq!(technique.textures[0].resolved_size(640, 480), (640, 480));
    assert_eq!(technique.textures[1].format, PixelFormat::FloatR16G16B16A16);

    let first = &technique.target_passes[0];
    assert_eq!(first.output_name.as_deref(), Some("rt0"));
    assert_eq!(first.input_mode, InputMode::Previous);
    assert_eq!(first.visibility_mask, 0xFFFF);
    assert_eq!(first.lod_bias, 0.5);
    assert_eq!(first.material_scheme, "Glow");

    let second = &technique.target_passes[1];
    assert!(second.only_initial);
    let clear = &second.passes[0];
    assert_eq!(clear.pass_type, PassType::Clear);
    assert!(clear.clear.colour && clear.clear.depth && !clear.clear.stencil);
    assert_eq!(clear.clear.colour_value, LinearRgba::new(0.1, 0.2, 0.3, 1.0));
    assert_eq!(clear.clear.depth_value, 0.5);
    let blur = &second.passes[1];
    assert_eq!(blur.material_name.as_deref(), Some("Bloom/Blur"));
    assert_eq!(blur.input(0), Some("rt0"));
    assert_eq!(blur.identifier, 7);

    let output = &technique.output_target;
    assert!(output.is_output());
    let stencil = &output.passes[0].stencil;
    assert!(stencil.check);
    assert_eq!(stencil.function, CompareFunction::GreaterEqual);
    assert_eq!(stencil.mask, 0xFF);
    assert_eq!(stencil.depth_fail_op, StencilOperation::IncrementWrap);
    assert_eq!(stencil.pass_op, StencilOperation::Replace);
    assert_eq!(output.passes[1].input(1), Some("rt1"));
    Ok(())
}

#[test]
fn test_material_schemes_are_registered() -> Result<()> {
    let context = Arc::new(MaterialContext::default());
    let mut compositors = CompositorManager::new(Arc::clone(&context));
    compositors.parse_str(BLOOM, "bloom.compositor");

    let glow = context.schemes.lookup("Glow");
    assert!(glow.is_some());
    let bloom = compositors.get("Bloom").ok_or_else(|| anyhow::anyhow!("Bloom missing"))?;
    assert_eq!(bloom.techniques()[0].target_passes[0].scheme_index, glow);
    assert_eq!(bloom.techniques()[0].output_target.scheme_index, None);
    Ok(())
}

#[test]
fn test_errors_are_reported_and_parsing_continues() -> Result<()> {
    init_logger();
    let source = "compositor Broken\n{\n    technique\n    {\n        texture rt0 target_width target_height PF_BOGUS\n        bogus_attribute 1\n        target_output\n        {\n            pass render_quad\n            {\n                material Grey\n                first_render_queue lots\n            }\n        }\n    }\n}\n";
    let mut compositors = manager();
    let report = compositors.parse_str(source, "broken.compositor");

    let lines: Vec<_> = report.errors.iter().filter_map(ScriptError::line).collect();
    assert_eq!(lines, vec![5, 6, 12]);
    assert!(report.errors[0].to_string().starts_with("broken.compositor:5:"));

    let broken = compositors.get("Broken").ok_or_else(|| anyhow::anyhow!("Broken missing"))?;
    let technique = &broken.techniques()[0];
    assert!(technique.textures.is_empty());
    assert_eq!(
        technique.output_target.passes[0].material_name.as_deref(),
        Some("Grey")
    );
    Ok(())
}

#[test]
fn test_missing_compositor_keyword_aborts() -> Result<()> {
    let source = "compositor First { technique { } }\nmaterial Oops\ncompositor Second { technique { } }\n";
    let mut compositors = manager();
    let report = compositors.parse_str(source, "abort.compositor");

    assert_eq!(report.compositors, vec!["First".to_owned()]);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        &report.errors[0],
        ScriptError::MissingCompositor { line: 2, found, .. } if found == "material"
    ));
    assert!(compositors.get("Second").is_none());
    Ok(())
}

#[test]
fn test_duplicate_names_keep_first() -> Result<()> {
    let source = "compositor Dup { technique { texture a 1 1 PF_L8 } }\ncompositor Dup { technique { } technique { } }\n";
    let mut compositors = manager();
    let report = compositors.parse_str(source, "dup.compositor");

    assert_eq!(report.compositors, vec!["Dup".to_owned()]);
    assert!(matches!(
        &report.errors[..],
        [ScriptError::DuplicateCompositor { name, .. }] if name == "Dup"
    ));
    let dup = compositors.get("Dup").ok_or_else(|| anyhow::anyhow!("Dup missing"))?;
    assert_eq!(dup.techniques().len(), 1);
    Ok(())
}

#[test]
fn test_unclosed_compositor_is_dropped() -> Result<()> {
    let mut compositors = manager();
    let report = compositors.parse_str("compositor Open {\n technique {\n", "open.compositor");
    assert_eq!(report.errors.len(), 1);
    assert!(compositors.is_empty());
    Ok(())
}

#[test]
fn test_parse_file_from_disk() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(BLOOM.as_bytes())?;
    file.flush()?;

    let mut compositors = manager();
    let report = compositors.parse_file(file.path());
    assert!(report.is_clean(), "{:?}", report.errors);
    assert_eq!(compositors.len(), 1);

    let dir = tempfile::tempdir()?;
    let report = compositors.parse_file(dir.path().join("missing.compositor"));
    assert!(matches!(&report.errors[..], [ScriptError::Io { .. }]));
    Ok(())
}

#[test]
fn test_compile_against_hardware() -> Result<()> {
    let mut compositors = manager();
    compositors.parse_str(BLOOM, "bloom.compositor");

    let basic = RenderSystemCapabilities::new(8).with(Capabilities::HW_STENCIL);
    assert_eq!(compositors.compile_all(&basic), vec!["Bloom".to_owned()]);

    let float = basic.with(Capabilities::TEXTURE_FLOAT);
    assert!(compositors.compile_all(&float).is_empty());
    let bloom = compositors.get("Bloom").ok_or_else(|| anyhow::anyhow!("Bloom missing"))?;
    assert!(bloom.is_supported());
    Ok(())
}

#[test]
fn test_quad_materials_resolved_against_manager() -> Result<()> {
    let mut compositors = manager();
    compositors.parse_str(BLOOM, "bloom.compositor");
    let mut materials = MaterialManager::new(PipelineSettings::default(), RenderSystemCapabilities::new(8));
    materials.create("Bloom/Blur")?;
    materials.compile_all();

    let bloom = compositors.get("Bloom").ok_or_else(|| anyhow::anyhow!("Bloom missing"))?;
    assert_eq!(
        bloom.techniques()[0].missing_materials(&materials),
        vec!["Bloom/Combine".to_owned()]
    );
    Ok(())
}
