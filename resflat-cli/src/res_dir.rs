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

// Walks a res/ directory two levels deep: type directories at the top,
// resource files inside them. Dotted names are skipped at both levels, and
// stray files next to the type directories are ignored. Anything that
// survives the walk must classify; one bad path fails the whole walk, since
// a well-formed tree should only contain well-formed paths.

use std::fs;
use std::path::Path;

use resflat_common::Result;
use resflat_compiler::{extract_resource_path_data, ResourcePathData};

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

pub fn load_inputs_from_dir(root: &Path) -> Result<Vec<ResourcePathData>> {
    let mut inputs = vec![];

    let mut type_dirs: Vec<_> = fs::read_dir(root)?.collect::<std::io::Result<_>>()?;
    // Directory iteration order is filesystem-dependent; sort for
    // reproducible entry order and diagnostics.
    type_dirs.sort_by_key(|entry| entry.file_name());

    for type_dir in type_dirs {
        let dir_name = type_dir.file_name();
        if is_hidden(&dir_name.to_string_lossy()) {
            continue;
        }
        if !type_dir.file_type()?.is_dir() {
            continue;
        }

        let mut leaves: Vec<_> = fs::read_dir(type_dir.path())?.collect::<std::io::Result<_>>()?;
        leaves.sort_by_key(|entry| entry.file_name());

        for leaf in leaves {
            if is_hidden(&leaf.file_name().to_string_lossy()) {
                continue;
            }
            let path = leaf.path();
            inputs.push(extract_resource_path_data(&path.to_string_lossy())?);
        }
    }
    Ok(inputs)
}
