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

//! Errors raised while loading compositor scripts.

use std::path::PathBuf;

/// A problem found while loading a compositor script.
///
/// Syntax problems are recoverable: the loader logs them, skips the line and
/// carries on. Only a script that does not start with a `compositor` block
/// or cannot be read stops the load.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// A malformed or misplaced statement.
    #[error("{file}:{line}: {message}")]
    Syntax {
        /// Script name or path.
        file: String,
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// The first statement was not a `compositor` block.
    #[error("{file}:{line}: expected 'compositor' but found '{found}'")]
    MissingCompositor {
        /// Script name or path.
        file: String,
        /// One-based line number.
        line: usize,
        /// The token found instead.
        found: String,
    },
    /// A compositor with the same name was already registered.
    #[error("{file}: compositor '{name}' already exists, ignoring the new definition")]
    DuplicateCompositor {
        /// Script name or path.
        file: String,
        /// The clashing name.
        name: String,
    },
    /// The script file could not be read.
    #[error("failed to read compositor script '{}'", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl ScriptError {
    /// Line the error was found on, if it belongs to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. } | Self::MissingCompositor { line, .. } => Some(*line),
            Self::DuplicateCompositor { .. } | Self::Io { .. } => None,
        }
    }
}

/// Outcome of loading one script.
#[derive(Debug, Default)]
pub struct ParseReport {
    /// Names of the compositors that were registered.
    pub compositors: Vec<String>,
    /// Every problem found, in script order.
    pub errors: Vec<ScriptError>,
}

impl ParseReport {
    /// Returns `true` if the script loaded without any problem.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
