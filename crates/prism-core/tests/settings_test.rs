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
use prism_core::renderer::TextureFilterOptions;
use prism_core::PipelineSettings;

#[test]
fn settings_survive_a_ron_round_trip() -> Result<()> {
    let settings = PipelineSettings {
        default_scheme: "LowEnd".to_owned(),
        auto_add_param_name: true,
        default_texture_filtering: TextureFilterOptions::Trilinear,
        ..Default::default()
    };
    let text = settings.to_ron_string()?;
    let parsed = PipelineSettings::from_ron_str(&text)?;
    assert_eq!(parsed, settings);
    Ok(())
}

#[test]
fn empty_settings_file_uses_defaults() -> Result<()> {
    let parsed = PipelineSettings::from_ron_str("()")?;
    assert_eq!(parsed, PipelineSettings::default());
    Ok(())
}
