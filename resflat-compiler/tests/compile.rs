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

// End-to-end runs of the compile driver against a scratch res/ tree,
// reading the produced entries back through the documented artifact
// formats.

use std::fs;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use byteorder::{LittleEndian, ReadBytesExt};
use prost::Message;
use resflat_archive::DirectoryArchiveWriter;
use resflat_common::NullDiagnostics;
use resflat_compiler::compile::{compile_inputs, CompileOptions};
use resflat_compiler::path_data::extract_resource_path_data;
use resflat_compiler::png_crunch::{read_png, write_png, Image, PngChunkFilter};
use resflat_compiler::proto::pb;
use tempfile::TempDir;

struct Scratch {
    res: TempDir,
    out: TempDir
}

impl Scratch {
    fn new() -> Scratch {
        Scratch {
            res: TempDir::new().unwrap(),
            out: TempDir::new().unwrap()
        }
    }

    fn write(&self, rel_path: &str, contents: &[u8]) -> String {
        let path = self.res.path().join(rel_path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn compile(&self, paths: &[String], options: &CompileOptions) -> bool {
        let inputs: Vec<_> = paths
            .iter()
            .map(|path| extract_resource_path_data(path).unwrap())
            .collect();
        let mut writer = DirectoryArchiveWriter::create(self.out.path()).unwrap();
        compile_inputs(&inputs, options, &mut writer, &NullDiagnostics)
    }

    fn entry(&self, name: &str) -> Vec<u8> {
        fs::read(self.out.path().join(name)).unwrap()
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.out.path().join(name)
    }
}

/// Reads a standard envelope: LE32 count, then per file a LE32-delimited
/// descriptor and a LE64-delimited payload.
fn read_envelope(bytes: &[u8]) -> Vec<(pb::CompiledFile, Vec<u8>)> {
    let mut cursor = Cursor::new(bytes);
    let count = cursor.read_u32::<LittleEndian>().unwrap();
    let mut files = vec![];
    for _ in 0..count {
        let descriptor_len = cursor.read_u32::<LittleEndian>().unwrap() as usize;
        let mut descriptor = vec![0; descriptor_len];
        cursor.read_exact(&mut descriptor).unwrap();
        let payload_len = cursor.read_u64::<LittleEndian>().unwrap() as usize;
        let mut payload = vec![0; payload_len];
        cursor.read_exact(&mut payload).unwrap();
        files.push((pb::CompiledFile::decode(descriptor.as_slice()).unwrap(), payload));
    }
    assert_eq!(cursor.position() as usize, bytes.len());
    files
}

fn find_config_value<'a>(
    table: &'a pb::ResourceTable,
    type_name: &str,
    entry: &str,
    qualifiers: &str
) -> Option<&'a pb::ConfigValue> {
    table.packages.iter().find_map(|package| {
        package
            .types
            .iter()
            .find(|t| t.name == type_name)?
            .entries
            .iter()
            .find(|e| e.name == entry)?
            .config_values
            .iter()
            .find(|cv| cv.config.as_ref().map(|c| c.qualifiers.as_str()) == Some(qualifiers))
    })
}

#[test]
fn values_with_pseudolocales() {
    let scratch = Scratch::new();
    let strings = scratch.write(
        "res/values/strings.xml",
        br#"<resources><string name="hi">Hi</string></resources>"#
    );
    let options = CompileOptions {
        pseudolocalize: true,
        ..Default::default()
    };
    assert!(scratch.compile(&[strings], &options));

    // The values entry body is the serialised table itself, no envelope.
    let table = pb::ResourceTable::decode(
        scratch.entry("values_strings.arsc.flat").as_slice()
    )
    .unwrap();

    assert_eq!(table.packages.len(), 1);
    assert_eq!(table.packages[0].package_id, Some(0));
    for qualifiers in ["", "en-rXA", "ar-rXB"] {
        let config_value = find_config_value(&table, "string", "hi", qualifiers)
            .unwrap_or_else(|| panic!("missing config '{}'", qualifiers));
        assert_eq!(config_value.weak, !qualifiers.is_empty());
    }
}

#[test]
fn donottranslate_flips_the_default_flag() {
    let scratch = Scratch::new();
    let strings = scratch.write(
        "res/values-fr/donottranslate.xml",
        br#"<resources><string name="build">release</string></resources>"#
    );
    assert!(scratch.compile(&[strings], &CompileOptions::default()));

    let table = pb::ResourceTable::decode(
        scratch.entry("values-fr_donottranslate.arsc.flat").as_slice()
    )
    .unwrap();
    let config_value = find_config_value(&table, "string", "build", "fr").unwrap();
    match &config_value.value {
        Some(pb::Value::Str(s)) => {
            assert_eq!(s.value, "release");
            assert!(!s.translatable);
        }
        other => panic!("expected string, got {:?}", other)
    }
}

#[test]
fn layout_with_inline_fragment_embeds_two_documents() {
    let scratch = Scratch::new();
    let layout = scratch.write(
        "res/layout/main.xml",
        br#"<View xmlns:aapt="http://schemas.android.com/aapt">
              <aapt:attr name="background">
                <shape/>
              </aapt:attr>
            </View>"#
    );
    assert!(scratch.compile(&[layout.clone()], &CompileOptions::default()));

    let files = read_envelope(&scratch.entry("layout_main.xml.flat"));
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].0.resource_name, "layout/main");
    assert_eq!(files[1].0.resource_name, "layout/main_1");
    assert_eq!(files[0].0.source_path, layout);
    assert_eq!(files[1].0.source_path, layout);

    // The primary document references the fragment, and both payloads are
    // binary XML chunks (type 0x0003).
    let needle = b"@layout/main_1";
    assert!(files[0].1.windows(needle.len()).any(|w| w == needle));
    for (_, payload) in &files {
        assert_eq!(u16::from_le_bytes([payload[0], payload[1]]), 0x0003);
    }
}

#[test]
fn id_definitions_are_exported_in_the_descriptor() {
    let scratch = Scratch::new();
    let layout = scratch.write(
        "res/layout/labels.xml",
        br#"<LinearLayout xmlns:android="http://schemas.android.com/apk/res/android">
              <View android:id="@+id/title"/>
              <View android:id="@+id/body"/>
            </LinearLayout>"#
    );
    assert!(scratch.compile(&[layout], &CompileOptions::default()));

    let files = read_envelope(&scratch.entry("layout_labels.xml.flat"));
    assert_eq!(files[0].0.exported_ids, vec!["title", "body"]);
}

fn encode_png(image: &Image, extra_text: Option<&[u8]>) -> Vec<u8> {
    let mut out = vec![];
    let mut encoder = png::Encoder::new(&mut out, image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    if let Some(text) = extra_text {
        writer
            .write_chunk(png::chunk::ChunkType(*b"tEXt"), text)
            .unwrap();
    }
    writer.write_image_data(&image.pixels).unwrap();
    writer.finish().unwrap();
    out
}

fn nine_patch_source(size: u32) -> Image {
    let mut pixels = vec![0u8; (size * size * 4) as usize];
    for y in 1..size - 1 {
        for x in 1..size - 1 {
            let offset = ((y * size + x) * 4) as usize;
            pixels[offset..offset + 4].copy_from_slice(&[0x20, 0x40, 0x80, 0xFF]);
        }
    }
    // Stretch marks across the middle of the top and left edges.
    for i in size / 3..2 * size / 3 {
        let top = ((i) * 4) as usize;
        pixels[top..top + 4].copy_from_slice(&[0, 0, 0, 0xFF]);
        let left = ((i * size) * 4) as usize;
        pixels[left..left + 4].copy_from_slice(&[0, 0, 0, 0xFF]);
    }
    Image {
        width: size,
        height: size,
        pixels
    }
}

#[test]
fn nine_patch_is_stripped_and_re_encoded() {
    let scratch = Scratch::new();
    let source = nine_patch_source(12);
    let icon = scratch.write("res/drawable-hdpi/icon.9.png", &encode_png(&source, None));
    assert!(scratch.compile(&[icon], &CompileOptions::default()));

    let files = read_envelope(&scratch.entry("drawable-hdpi_icon.9.png.flat"));
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0.resource_name, "drawable/icon");
    assert_eq!(files[0].0.config.as_ref().unwrap().qualifiers, "hdpi");

    // Two pixels smaller on each axis, and the 9-patch chunk is embedded.
    let compiled = read_png(&files[0].1).unwrap();
    assert_eq!(compiled.width, 10);
    assert_eq!(compiled.height, 10);
    let needle = b"npTc";
    assert!(files[0].1.windows(4).any(|w| w == needle));
}

#[test]
fn plain_png_selection_follows_the_size_rule() {
    let scratch = Scratch::new();
    // Noisy pixels so the stream does not collapse to nothing.
    let image = Image {
        width: 16,
        height: 16,
        pixels: (0..16u32 * 16 * 4)
            .map(|i| (i.wrapping_mul(2654435761) >> 13) as u8)
            .collect()
    };
    let original = encode_png(&image, Some(&b"Comment\0metadata to drop"[..]));
    let photo = scratch.write("res/drawable/photo.png", &original);
    assert!(scratch.compile(&[photo], &CompileOptions::default()));

    let files = read_envelope(&scratch.entry("drawable_photo.png.flat"));
    let payload = &files[0].1;

    // Recompute both candidate streams and check the smaller one (ties to
    // the re-encoded stream) was chosen, byte for byte.
    let filtered = PngChunkFilter::new(&original).unwrap().filter().unwrap();
    let crunched = write_png(&read_png(&filtered).unwrap(), None).unwrap();
    let expected = if crunched.len() <= filtered.len() {
        &crunched
    } else {
        &filtered
    };
    assert_eq!(payload, expected);

    // Metadata never survives either path.
    assert!(!payload.windows(4).any(|w| w == b"tEXt"));
}

#[test]
fn raw_files_are_embedded_verbatim() {
    let scratch = Scratch::new();
    let blob: Vec<u8> = (0..512u32).map(|i| (i % 251) as u8).collect();
    let raw = scratch.write("res/raw/blob.bin", &blob);
    assert!(scratch.compile(&[raw], &CompileOptions::default()));

    let files = read_envelope(&scratch.entry("raw_blob.bin.flat"));
    assert_eq!(files[0].0.resource_name, "raw/blob");
    assert_eq!(files[0].1, blob);
}

#[test]
fn unknown_type_directories_fail_without_stopping_the_batch() {
    let scratch = Scratch::new();
    let bogus = scratch.write("res/bogus/file.txt", b"?");
    let raw = scratch.write("res/raw/keep.txt", b"kept");

    assert!(!scratch.compile(&[bogus, raw], &CompileOptions::default()));

    // The failing input produced nothing, the good one still compiled.
    assert!(!scratch.entry_path("bogus_file.txt.flat").exists());
    let files = read_envelope(&scratch.entry("raw_keep.txt.flat"));
    assert_eq!(files[0].1, b"kept");
}

#[test]
fn parse_errors_mark_the_input_failed() {
    let scratch = Scratch::new();
    let broken = scratch.write(
        "res/values/strings.xml",
        br#"<resources><string name="x">unclosed"#
    );
    assert!(!scratch.compile(&[broken], &CompileOptions::default()));
    assert!(!scratch.entry_path("values_strings.arsc.flat").exists());
}

#[test]
fn empty_raw_files_compile_to_empty_payloads() {
    let scratch = Scratch::new();
    let empty = scratch.write("res/raw/empty.bin", b"");
    assert!(scratch.compile(&[empty], &CompileOptions::default()));
    let files = read_envelope(&scratch.entry("raw_empty.bin.flat"));
    assert!(files[0].1.is_empty());
}
