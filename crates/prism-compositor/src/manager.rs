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

//! Registry of loaded compositors.

use crate::error::{ParseReport, ScriptError};
use crate::model::Compositor;
use crate::script::parse_script;
use ahash::AHashMap;
use prism_core::renderer::RenderSystemCapabilities;
use prism_material::MaterialContext;
use std::path::Path;
use std::sync::Arc;

/// Owns every compositor loaded from scripts, keyed by name.
///
/// Material schemes named by target passes are registered with the shared
/// [`MaterialContext`] as compositors are added, so scene passes can select
/// techniques by scheme index.
#[derive(Debug)]
pub struct CompositorManager {
    context: Arc<MaterialContext>,
    compositors: AHashMap<String, Compositor>,
}

impl CompositorManager {
    /// Creates an empty manager sharing `context` with the material manager.
    pub fn new(context: Arc<MaterialContext>) -> Self {
        Self {
            context,
            compositors: AHashMap::new(),
        }
    }

    /// Parses `source` and registers every compositor it defines.
    ///
    /// `file` labels diagnostics. A compositor whose name is taken is
    /// reported and dropped; the one registered first stays.
    pub fn parse_str(&mut self, source: &str, file: &str) -> ParseReport {
        let (compositors, mut errors) = parse_script(source, file);
        let mut report = ParseReport::default();
        for compositor in compositors {
            let name = compositor.name().to_owned();
            if self.compositors.contains_key(&name) {
                let error = ScriptError::DuplicateCompositor {
                    file: file.to_owned(),
                    name,
                };
                log::error!("{error}");
                errors.push(error);
                continue;
            }
            self.add(compositor);
            report.compositors.push(name);
        }
        report.errors = errors;
        log::debug!(
            "Loaded {} compositor(s) from '{file}' with {} error(s)",
            report.compositors.len(),
            report.errors.len()
        );
        report
    }

    /// Reads and parses the script at `path`.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> ParseReport {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(source) => self.parse_str(&source, &path.display().to_string()),
            Err(source) => {
                let error = ScriptError::Io {
                    path: path.to_path_buf(),
                    source,
                };
                log::error!("{error}");
                ParseReport {
                    compositors: Vec::new(),
                    errors: vec![error],
                }
            }
        }
    }

    /// Registers `compositor`, replacing any compositor with the same name.
    pub fn add(&mut self, mut compositor: Compositor) {
        for technique in compositor.techniques_mut() {
            let targets = technique
                .target_passes
                .iter_mut()
                .chain(std::iter::once(&mut technique.output_target));
            for target in targets.filter(|t| !t.material_scheme.is_empty()) {
                target.scheme_index = Some(self.context.schemes.scheme_index(&target.material_scheme));
            }
        }
        self.compositors
            .insert(compositor.name().to_owned(), compositor);
    }

    /// Compositor called `name`.
    pub fn get(&self, name: &str) -> Option<&Compositor> {
        self.compositors.get(name)
    }

    /// Mutable compositor called `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Compositor> {
        self.compositors.get_mut(name)
    }

    /// Removes the compositor called `name`, returning it.
    pub fn remove(&mut self, name: &str) -> Option<Compositor> {
        self.compositors.remove(name)
    }

    /// Number of registered compositors.
    pub fn len(&self) -> usize {
        self.compositors.len()
    }

    /// Returns `true` if no compositor is registered.
    pub fn is_empty(&self) -> bool {
        self.compositors.is_empty()
    }

    /// Compiles every compositor against `caps` and returns the names of
    /// those left without a supported technique, sorted.
    pub fn compile_all(&mut self, caps: &RenderSystemCapabilities) -> Vec<String> {
        let mut unsupported: Vec<String> = self
            .compositors
            .values_mut()
            .filter_map(|c| (c.compile(caps) == 0).then(|| c.name().to_owned()))
            .collect();
        unsupported.sort();
        unsupported
    }
}
