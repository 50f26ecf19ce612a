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

//! The per-input driver: picks the right pipeline for each classified input
//! (values table, XML flattening, PNG crunching, or verbatim file) and
//! writes one archive entry per input. Inputs never depend on each other; a
//! failed input is reported and the batch moves on.

use std::fs::{self, File};
use std::io::BufReader;

use memmap2::Mmap;
use resflat_archive::ArchiveWriter;
use resflat_common::{Diagnostics, ResError, Result};

use crate::envelope::{write_compiled_files_to_entry, write_table_to_entry};
use crate::nine_patch::{strip_border, NinePatch};
use crate::path_data::{build_output_filename, ResourcePathData};
use crate::png_crunch::{read_png, write_png, PngChunkFilter};
use crate::proto::{serialize_compiled_file_to_pb, serialize_table_to_pb};
use crate::pseudolocale::pseudolocalize;
use crate::resource_types::{ResourceFile, ResourceName, ResourceType};
use crate::table::ResourceTable;
use crate::values_parser::{ResourceParser, ResourceParserOptions};
use crate::xml_flatten::flatten_xml;
use crate::xml_tree::{collect_ids, extract_inline_xml, inflate, XmlResource};

/// Resources compile into the anonymous package; the linker renames it.
const COMPILATION_PACKAGE: &str = "";
/// Assigned to any package that finishes parsing without an id.
const DEFAULT_PACKAGE_ID: u8 = 0x0;

#[derive(Default)]
pub struct CompileOptions {
    /// Generate `en-XA` and `ar-XB` entries from default-config values.
    pub pseudolocalize: bool,
    /// Downgrade positional-argument misuse in strings to warnings.
    pub legacy_mode: bool,
    pub verbose: bool
}

/// Compiles every input in order. Failures are sticky: each failed input is
/// reported and skipped, and the return value is `true` only when every
/// input succeeded.
pub fn compile_inputs(
    inputs: &[ResourcePathData],
    options: &CompileOptions,
    writer: &mut dyn ArchiveWriter,
    diag: &dyn Diagnostics
) -> bool {
    let mut error = false;
    for input in inputs {
        let mut path_data = input.clone();
        if options.verbose {
            diag.note(Some(&path_data.source), "processing");
        }

        if path_data.resource_dir == "values" {
            // Values land in a table, not a flattened file; the entry name
            // reflects that with the historical `arsc` extension.
            path_data.extension = "arsc".into();
            let output_name = build_output_filename(&path_data);
            if compile_table(&path_data, options, writer, &output_name, diag).is_err() {
                error = true;
            }
            continue;
        }

        let output_name = build_output_filename(&path_data);
        let res_type = match ResourceType::parse(&path_data.resource_dir) {
            Some(res_type) => res_type,
            None => {
                diag.error(
                    None,
                    &ResError::InvalidFilePath(path_data.source.clone()).to_string()
                );
                error = true;
                continue;
            }
        };

        let result = if res_type == ResourceType::Raw {
            compile_file(&path_data, res_type, options, writer, &output_name, diag)
        } else if path_data.extension == "xml" {
            compile_xml(&path_data, res_type, options, writer, &output_name, diag)
        } else if path_data.extension == "png" || path_data.extension == "9.png" {
            compile_png(&path_data, res_type, options, writer, &output_name, diag)
        } else {
            compile_file(&path_data, res_type, options, writer, &output_name, diag)
        };
        if result.is_err() {
            error = true;
        }
    }
    !error
}

fn compile_table(
    path_data: &ResourcePathData,
    options: &CompileOptions,
    writer: &mut dyn ArchiveWriter,
    output_name: &str,
    diag: &dyn Diagnostics
) -> Result<()> {
    let file = open_input(path_data, diag)?;

    let mut table = ResourceTable::default();
    let parser_options = ResourceParserOptions {
        error_on_positional_arguments: !options.legacy_mode,
        // A `donottranslate` file defines strings translators never see.
        translatable: !path_data.name.contains("donottranslate")
    };
    let mut parser = ResourceParser::new(
        diag,
        &mut table,
        &path_data.source,
        path_data.config.clone(),
        parser_options
    );
    if let Err(err) = parser.parse(BufReader::new(file)) {
        // Grammar problems were reported as they were found; a reader
        // failure still needs its one report.
        if matches!(err, ResError::XmlParsingFailed(_)) {
            diag.error(Some(&path_data.source), &err.to_string());
        }
        return Err(err);
    }

    if options.pseudolocalize {
        pseudolocalize(&mut table);
    }

    // Ensure we have the compilation package at least.
    table.create_package(COMPILATION_PACKAGE);
    for package in &mut table.packages {
        if package.id.is_none() {
            package.id = Some(DEFAULT_PACKAGE_ID);
        }
    }

    let pb_table = serialize_table_to_pb(&table);
    write_table_to_entry(writer, output_name, &pb_table, diag)
}

fn compile_xml(
    path_data: &ResourcePathData,
    res_type: ResourceType,
    options: &CompileOptions,
    writer: &mut dyn ArchiveWriter,
    output_name: &str,
    diag: &dyn Diagnostics
) -> Result<()> {
    if options.verbose {
        diag.note(Some(&path_data.source), "compiling XML");
    }

    let file = open_input(path_data, diag)?;
    let root = match inflate(BufReader::new(file)) {
        Ok(root) => root,
        Err(err) => {
            diag.error(Some(&path_data.source), &err.to_string());
            return Err(err);
        }
    };

    let mut xml_res = XmlResource {
        file: ResourceFile::new(
            ResourceName::new(res_type, &path_data.name),
            path_data.config.clone(),
            &path_data.source
        ),
        root
    };

    collect_ids(&mut xml_res);

    let inline_documents = match extract_inline_xml(&mut xml_res) {
        Ok(docs) => docs,
        Err(err) => {
            diag.error(Some(&path_data.source), &err.to_string());
            return Err(err);
        }
    };

    // Primary document first, extracted fragments after it in document
    // order.
    let mut flattened: Vec<Vec<u8>> = vec![flatten_xml(&xml_res)?];
    for document in &inline_documents {
        flattened.push(flatten_xml(document)?);
    }

    let mut records = vec![(serialize_compiled_file_to_pb(&xml_res.file), &flattened[0][..])];
    for (document, payload) in inline_documents.iter().zip(flattened[1..].iter()) {
        records.push((serialize_compiled_file_to_pb(&document.file), &payload[..]));
    }

    write_compiled_files_to_entry(writer, output_name, &records, diag)
}

fn compile_png(
    path_data: &ResourcePathData,
    res_type: ResourceType,
    options: &CompileOptions,
    writer: &mut dyn ArchiveWriter,
    output_name: &str,
    diag: &dyn Diagnostics
) -> Result<()> {
    if options.verbose {
        diag.note(Some(&path_data.source), "compiling PNG");
    }

    let content = match fs::read(&path_data.source) {
        Ok(content) => content,
        Err(err) => {
            diag.error(Some(&path_data.source), &err.to_string());
            return Err(err.into());
        }
    };

    // Filtering up front gives both the minimal faithful byte count to
    // compare against and the fallback payload, without a second pass.
    let filtered = PngChunkFilter::new(&content)
        .and_then(|filter| filter.filter())
        .map_err(|err| {
            diag.error(Some(&path_data.source), &err.to_string());
            err
        })?;

    let mut image = read_png(&filtered).map_err(|err| {
        diag.error(Some(&path_data.source), &err.to_string());
        err
    })?;

    let nine_patch = if path_data.extension == "9.png" {
        let nine_patch = match NinePatch::create(&image) {
            Ok(nine_patch) => nine_patch,
            Err(err) => {
                diag.error(Some(&path_data.source), &err.to_string());
                return Err(err);
            }
        };
        // The border has served its purpose; what gets re-encoded is the
        // image without it.
        image = strip_border(&image);
        if options.verbose {
            diag.note(
                Some(&path_data.source),
                &format!(
                    "9-patch: xDivs={:?} yDivs={:?} padding={:?}",
                    nine_patch.x_divs, nine_patch.y_divs, nine_patch.padding
                )
            );
        }
        Some(nine_patch)
    } else {
        None
    };

    let crunched = write_png(&image, nine_patch.as_ref()).map_err(|err| {
        diag.error(Some(&path_data.source), &err.to_string());
        err
    })?;

    // 9-patches must use the re-encoded image since their borders are
    // stripped; otherwise whichever stream is smaller wins.
    let payload = if nine_patch.is_some() || crunched.len() <= filtered.len() {
        crunched
    } else {
        if options.verbose {
            diag.note(
                Some(&path_data.source),
                "original PNG is smaller than crunched PNG, using original"
            );
        }
        filtered
    };

    let res_file = ResourceFile::new(
        ResourceName::new(res_type, &path_data.name),
        path_data.config.clone(),
        &path_data.source
    );
    write_compiled_files_to_entry(
        writer,
        output_name,
        &[(serialize_compiled_file_to_pb(&res_file), &payload[..])],
        diag
    )
}

fn compile_file(
    path_data: &ResourcePathData,
    res_type: ResourceType,
    options: &CompileOptions,
    writer: &mut dyn ArchiveWriter,
    output_name: &str,
    diag: &dyn Diagnostics
) -> Result<()> {
    if options.verbose {
        diag.note(Some(&path_data.source), "compiling file");
    }

    let file = open_input(path_data, diag)?;
    let res_file = ResourceFile::new(
        ResourceName::new(res_type, &path_data.name),
        path_data.config.clone(),
        &path_data.source
    );
    let descriptor = serialize_compiled_file_to_pb(&res_file);

    // Zero-length files cannot be mapped; their payload is just empty.
    let length = file.metadata().map(|m| m.len()).unwrap_or(0);
    if length == 0 {
        return write_compiled_files_to_entry(writer, output_name, &[(descriptor, &[])], diag);
    }

    let map = match unsafe { Mmap::map(&file) } {
        Ok(map) => map,
        Err(err) => {
            diag.error(Some(&path_data.source), &err.to_string());
            return Err(err.into());
        }
    };
    write_compiled_files_to_entry(writer, output_name, &[(descriptor, &map[..])], diag)
}

fn open_input(path_data: &ResourcePathData, diag: &dyn Diagnostics) -> Result<File> {
    File::open(&path_data.source).map_err(|err| {
        diag.error(Some(&path_data.source), &err.to_string());
        err.into()
    })
}
