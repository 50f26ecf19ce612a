// Copyright 2024 Google LLC
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

use resflat_common::{ResError, Result};

use crate::config::ConfigDescription;

/// Everything the compiler derives from an input path. Resource file paths
/// are expected to look like `[--/res/]type[-config]/name[.ext]`; only the
/// last two components matter.
#[derive(Debug, Clone)]
pub struct ResourcePathData {
    /// The original path, kept verbatim for diagnostics.
    pub source: String,
    /// The directory token before any dash, eg. `values`, `layout`, `raw`.
    pub resource_dir: String,
    /// File name without the extension group.
    pub name: String,
    /// Empty, `xml`, `png`, `9.png`, or whatever else followed the first dot.
    pub extension: String,
    /// Raw qualifier segment after the first dash of the directory token.
    /// Kept even after parsing so output names can be computed without
    /// re-serialising the config (parsing may normalise qualifiers).
    pub config_str: String,
    pub config: ConfigDescription
}

/// Splits a path into a [ResourcePathData] or explains why it cannot be one.
pub fn extract_resource_path_data(path: &str) -> Result<ResourcePathData> {
    // Accept the platform separator as well as '/' so explicit file lists
    // behave the same on every OS.
    let parts: Vec<&str> = path
        .split(|c: char| c == '/' || c == std::path::MAIN_SEPARATOR)
        .collect();
    if parts.len() < 2 {
        return Err(ResError::BadResourcePath(path.into()));
    }

    let dir = parts[parts.len() - 2];
    let filename = parts[parts.len() - 1];
    if dir.is_empty() || filename.is_empty() {
        return Err(ResError::BadResourcePath(path.into()));
    }

    let (resource_dir, config_str) = match dir.find('-') {
        Some(dash_pos) => (&dir[..dash_pos], &dir[dash_pos + 1..]),
        None => (dir, "")
    };

    let config = if config_str.is_empty() {
        ConfigDescription::default()
    } else {
        ConfigDescription::parse(config_str)
            .ok_or_else(|| ResError::InvalidConfiguration(config_str.into()))?
    };

    // Split the file name on the FIRST dot so that `foo.9.png` keeps its
    // double extension. 9-patch classification depends on this.
    let (name, extension) = match filename.find('.') {
        Some(dot_pos) => (&filename[..dot_pos], &filename[dot_pos + 1..]),
        None => (filename, "")
    };

    Ok(ResourcePathData {
        source: path.into(),
        resource_dir: resource_dir.into(),
        name: name.into(),
        extension: extension.into(),
        config_str: config_str.into(),
        config
    })
}

/// The archive entry name for a classified input:
/// `type[-config]_name[.extension].flat`.
pub fn build_output_filename(data: &ResourcePathData) -> String {
    let mut name = data.resource_dir.clone();
    if !data.config_str.is_empty() {
        name.push('-');
        name.push_str(&data.config_str);
    }
    name.push('_');
    name.push_str(&data.name);
    if !data.extension.is_empty() {
        name.push('.');
        name.push_str(&data.extension);
    }
    name.push_str(".flat");
    name
}
