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

// On-disk chunk structs of the binary XML format. Every chunk is a header
// (type, header size, total size) followed by type-specific data, all
// little-endian, all 32-bit aligned.
use deku::prelude::*;

use resflat_common::Result as ResResult;

pub const RES_CHUNK_HEADER_SIZE: u16 = 8;
pub const UINT32_MINUS_ONE: u32 = 0xFFFFFFFF;
// Either a string index or UINT32_MINUS_ONE if empty
pub type ResStringPoolRef = u32;

#[derive(Debug, PartialEq, DekuWrite)]
#[deku(endian = "little")]
pub struct ResChunk {
    pub header: ResChunkHeader,
    pub data: Vec<u8>
}

#[derive(Debug, PartialEq, DekuWrite)]
#[deku(endian = "endian", ctx = "endian: deku::ctx::Endian")]
pub struct ResChunkHeader {
    pub chunk_type: ChunkType,
    pub header_size: u16,
    // Includes both this header and the data that follows
    pub chunk_size: u32
}

#[derive(Debug, PartialEq, DekuWrite)]
#[deku(id_type = "u16", endian = "endian", ctx = "endian: deku::ctx::Endian")]
pub enum ChunkType {
    #[deku(id = 0x0000)]
    Null,
    #[deku(id = 0x0001)]
    StringPool,
    #[deku(id = 0x0003)]
    XmlFile,

    // Types within an XmlFile
    #[deku(id = 0x0100)]
    XmlStartNamespace,
    #[deku(id = 0x0101)]
    XmlEndNamespace,
    #[deku(id = 0x0102)]
    XmlStartElement,
    #[deku(id = 0x0103)]
    XmlEndElement,
    #[deku(id = 0x0104)]
    XmlCdata
}

#[derive(Debug, PartialEq, DekuWrite)]
#[deku(endian = "little")]
pub struct XmlNodeChunk {
    // Where this node appeared in the original document
    // Not important for on-device parsing, only debugging and logs
    pub line_number: u32,
    // The XML comment that originally appeared above this node
    pub comment: ResStringPoolRef,

    pub node_data: Vec<u8>
}

// Used for both the start and end of a namespace
#[derive(Debug, PartialEq, DekuWrite)]
#[deku(endian = "little")]
pub struct XmlNamespaceChunk {
    pub prefix: ResStringPoolRef,
    pub uri: ResStringPoolRef
}

#[derive(Debug, PartialEq, DekuWrite)]
#[deku(endian = "little")]
pub struct XmlStartElementChunk {
    pub namespace: ResStringPoolRef,
    pub name: ResStringPoolRef,
    pub attribute_start: u16,
    pub attribute_size: u16,
    pub attribute_count: u16,
    // Index (1-based) of the "id" attribute, 0 if none
    pub id_index: u16,
    // Index (1-based) of the "class" attribute, 0 if none
    pub class_index: u16,
    // Index (1-based) of the "style" attribute, 0 if none
    pub style_index: u16,
    pub attribute_data: Vec<u8>
}

#[derive(Debug, PartialEq, DekuWrite)]
#[deku(endian = "little")]
pub struct XmlEndElementChunk {
    pub namespace: ResStringPoolRef,
    pub name: ResStringPoolRef
}

#[derive(Debug, PartialEq, DekuWrite)]
#[deku(endian = "little")]
pub struct XmlCdataChunk {
    pub raw_value: ResStringPoolRef,
    pub typed_value: XmlAttributeDataChunk
}

#[derive(Debug, PartialEq, DekuWrite)]
#[deku(endian = "little")]
pub struct XmlAttributeChunk {
    pub namespace: ResStringPoolRef,
    pub name: ResStringPoolRef,
    pub raw_value: ResStringPoolRef,
    pub typed_value: XmlAttributeDataChunk
}

#[derive(Debug, PartialEq, DekuWrite)]
#[deku(
    endian = "endian",
    ctx = "endian: deku::ctx::Endian",
    ctx_default = "deku::ctx::Endian::Little"
)]
pub struct XmlAttributeDataChunk {
    pub size: u16,
    pub res0: u8,
    pub data_type: AttributeDataType,
    pub data: u32
}

/// Binary type of an attribute value. The compiler keeps values raw, so
/// only the unresolved-reference and string cases are emitted here; the
/// linker re-parses the raw form into the full typed set.
#[derive(Debug, PartialEq, DekuWrite, Clone)]
#[deku(id_type = "u8", endian = "endian", ctx = "endian: deku::ctx::Endian")]
pub enum AttributeDataType {
    #[deku(id = 0x01)]
    Reference,
    #[deku(id = 0x03)]
    String
}

#[derive(Debug, PartialEq, DekuWrite)]
#[deku(endian = "little")]
pub struct StringPoolChunk {
    // Not the same thing as a ResChunkHeader,
    // the format has headers within headers
    pub string_pool_header: StringPoolHeader,
    pub string_indicies: Vec<u32>,
    pub string_data: Vec<u8>
}

pub const STRING_POOL_UTF8_FLAG: u32 = 1 << 8;

#[derive(Debug, PartialEq, DekuWrite)]
#[deku(endian = "endian", ctx = "endian: deku::ctx::Endian")]
pub struct StringPoolHeader {
    pub string_count: u32,
    pub style_count: u32,
    pub flags: u32,
    pub strings_start: u32,
    pub styles_start: u32
}

#[derive(Debug, PartialEq, DekuWrite)]
#[deku(endian = "little")]
pub struct RawBytes {
    pub data: Vec<u8>
}

pub fn generate_res_chunk<T: DekuContainerWrite>(
    chunk_type: ChunkType,
    data: T,
    extra_header_size: u16
) -> ResResult<ResChunk> {
    let data_bytes = data.to_bytes()?;
    Ok(ResChunk {
        header: ResChunkHeader {
            chunk_type,
            header_size: RES_CHUNK_HEADER_SIZE + extra_header_size,
            chunk_size: RES_CHUNK_HEADER_SIZE as u32 + data_bytes.len() as u32
        },
        data: data_bytes
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_serialise_little_endian() {
        let chunk = generate_res_chunk(
            ChunkType::XmlEndElement,
            XmlEndElementChunk {
                namespace: UINT32_MINUS_ONE,
                name: 7
            },
            0
        )
        .unwrap();
        let bytes = chunk.to_bytes().unwrap();
        // type 0x0103, header size 8, total size 8 + 8 payload
        assert_eq!(
            bytes,
            vec![
                0x03, 0x01, 0x08, 0x00, 0x10, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x07,
                0x00, 0x00, 0x00
            ]
        );
    }
}
