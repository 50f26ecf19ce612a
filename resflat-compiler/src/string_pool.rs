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

use std::collections::HashMap;

use resflat_common::{ResError, Result};

use crate::chunk_types::*;

/// Deduplicating builder for the UTF-8 string pool that prefixes every
/// flattened XML document. Chunk references index into this pool.
#[derive(Default)]
pub struct StringPoolBuilder {
    strings: Vec<String>,
    ids: HashMap<String, u32>
}

impl StringPoolBuilder {
    pub fn new() -> Self {
        StringPoolBuilder::default()
    }

    /// Returns the pool index for `string`, interning it on first use.
    pub fn add(&mut self, string: &str) -> u32 {
        if let Some(id) = self.ids.get(string) {
            return *id;
        }
        let new_id = self.strings.len() as u32;
        self.strings.push(string.to_string());
        self.ids.insert(string.to_string(), new_id);
        new_id
    }

    pub fn build(&self) -> Result<ResChunk> {
        construct_string_pool(&self.strings)
    }
}

pub fn construct_string_pool(strings: &[String]) -> Result<ResChunk> {
    let mut string_indicies: Vec<u32> = vec![];
    let mut string_data: Vec<u8> = vec![];
    for string in strings {
        let index = string_data.len() as u32;
        string_indicies.push(index);

        if string.len() > 0x7FFF {
            // UTF-8 pools store lengths in signed 16-bit integers; longer
            // strings would need the UTF-16 encoding, which this pool does
            // not emit.
            return Err(ResError::ValuesParsingFailed(format!(
                "string too long for string pool ({} bytes)",
                string.len()
            )));
        }

        let char_count = string.chars().count();
        let byte_count = string.len();
        if byte_count < 128 && char_count < 128 {
            string_data.push(char_count as u8);
            string_data.push(byte_count as u8);
        } else {
            string_data.push(0x80 | ((char_count >> 8) & 0xFF) as u8);
            string_data.push((char_count & 0xFF) as u8);
            string_data.push(0x80 | ((byte_count >> 8) & 0xFF) as u8);
            string_data.push((byte_count & 0xFF) as u8);
        }

        string_data.extend(string.bytes());
        string_data.push(0);
    }

    // String data is a u8 array, but all chunks must fall on 32-bit
    // boundaries, so pad out to an even 4 bytes.
    let padding = (4 - string_data.len() % 4) % 4;
    string_data.resize(string_data.len() + padding, 0);

    let string_indicies_size_bytes = 4 * strings.len() as u32;
    let string_pool_header = StringPoolHeader {
        string_count: strings.len() as u32,
        style_count: 0,
        flags: STRING_POOL_UTF8_FLAG,
        strings_start: 0x1C + string_indicies_size_bytes,
        styles_start: 0
    };
    let string_pool_chunk = StringPoolChunk {
        string_pool_header,
        string_indicies,
        string_data
    };

    generate_res_chunk(ChunkType::StringPool, string_pool_chunk, 0x1C - 0x08)
}
