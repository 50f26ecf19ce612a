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

//! # RESFLAT compiler
//!
//! Compiles a tree of source UI resources into per-file intermediate
//! artifacts for a later link step. Every input is handled in isolation:
//! values documents become protobuf resource tables, layout/drawable XML is
//! flattened to binary XML (with inline `<aapt:attr>` fragments split into
//! documents of their own), PNGs are crunched and 9-patch borders folded
//! into metadata chunks, and everything else is embedded verbatim. Each
//! artifact is wrapped in a compiled-file envelope and written as one
//! archive entry.

pub mod chunk_types;
pub mod compile;
pub mod config;
pub mod envelope;
pub mod nine_patch;
pub mod path_data;
pub mod png_crunch;
pub mod proto;
pub mod pseudolocale;
pub mod resource_types;
pub mod string_pool;
pub mod table;
pub mod values_parser;
pub mod xml_flatten;
pub mod xml_tree;

pub use compile::{compile_inputs, CompileOptions};
pub use path_data::{build_output_filename, extract_resource_path_data, ResourcePathData};
