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

// Flattens an inflated XML tree into the binary XML wire format: one
// string pool followed by namespace/element/cdata chunks in document order.
// Attribute values stay raw; references are typed as unresolved so the
// linker can assign real ids later.

use deku::DekuContainerWrite;
use resflat_common::Result;

use crate::chunk_types::*;
use crate::string_pool::StringPoolBuilder;
use crate::xml_tree::{XmlElement, XmlNode, XmlResource};

fn generate_xml_chunk<T: DekuContainerWrite>(chunk_type: ChunkType, chunk: T) -> Result<Vec<u8>> {
    let chunk_bytes = chunk.to_bytes()?;
    let node_header = XmlNodeChunk {
        line_number: 1,
        comment: UINT32_MINUS_ONE,
        node_data: chunk_bytes
    };
    Ok(generate_res_chunk(chunk_type, node_header, 8)?.to_bytes()?)
}

fn generate_namespace_chunk(start: bool, prefix: u32, uri: u32) -> Result<Vec<u8>> {
    generate_xml_chunk(
        if start {
            ChunkType::XmlStartNamespace
        } else {
            ChunkType::XmlEndNamespace
        },
        XmlNamespaceChunk { prefix, uri }
    )
}

/// Serialises one document to its complete binary form.
pub fn flatten_xml(res: &XmlResource) -> Result<Vec<u8>> {
    let mut pool = StringPoolBuilder::new();
    let mut chunks: Vec<u8> = vec![];
    flatten_element(&res.root, &mut pool, &mut chunks)?;

    let mut body = pool.build()?.to_bytes()?;
    body.extend(chunks);
    Ok(generate_res_chunk(ChunkType::XmlFile, RawBytes { data: body }, 0)?.to_bytes()?)
}

fn flatten_element(
    element: &XmlElement,
    pool: &mut StringPoolBuilder,
    chunks: &mut Vec<u8>
) -> Result<()> {
    let mut opened_namespaces: Vec<(u32, u32)> = vec![];
    for decl in &element.namespace_decls {
        let prefix_id = pool.add(&decl.prefix);
        let uri_id = pool.add(&decl.uri);
        chunks.extend(generate_namespace_chunk(true, prefix_id, uri_id)?);
        opened_namespaces.push((prefix_id, uri_id));
    }

    let name_id = pool.add(&element.name);
    let namespace_id = match &element.namespace_uri {
        Some(uri) => pool.add(uri),
        None => UINT32_MINUS_ONE
    };

    let mut start = XmlStartElementChunk {
        namespace: namespace_id,
        name: name_id,
        // The size of this containing struct
        attribute_start: 0x14,
        // The size of XmlAttributeChunk (only coincidentally the same)
        attribute_size: 0x14,
        attribute_count: 0,
        id_index: 0,
        class_index: 0,
        style_index: 0,
        attribute_data: vec![]
    };

    for attr in &element.attributes {
        let attr_namespace = match &attr.namespace_uri {
            Some(uri) => pool.add(uri),
            None => UINT32_MINUS_ONE
        };
        let attr_name = pool.add(&attr.name);
        let raw_value = pool.add(&attr.value);

        // References keep their raw text; the id is unknown until link
        // time, so the typed data is zero.
        let typed_value = if attr.value.starts_with('@') || attr.value.starts_with('?') {
            XmlAttributeDataChunk {
                size: 8,
                res0: 0,
                data_type: AttributeDataType::Reference,
                data: 0
            }
        } else {
            XmlAttributeDataChunk {
                size: 8,
                res0: 0,
                data_type: AttributeDataType::String,
                data: raw_value
            }
        };

        let attr_chunk = XmlAttributeChunk {
            namespace: attr_namespace,
            name: attr_name,
            raw_value,
            typed_value
        };
        start.attribute_data.extend(attr_chunk.to_bytes()?);
        start.attribute_count += 1;
    }

    chunks.extend(generate_xml_chunk(ChunkType::XmlStartElement, start)?);

    for child in &element.children {
        match child {
            XmlNode::Element(child) => flatten_element(child, pool, chunks)?,
            XmlNode::Text(text) => {
                let raw_value = pool.add(text);
                chunks.extend(generate_xml_chunk(
                    ChunkType::XmlCdata,
                    XmlCdataChunk {
                        raw_value,
                        typed_value: XmlAttributeDataChunk {
                            size: 8,
                            res0: 0,
                            data_type: AttributeDataType::String,
                            data: raw_value
                        }
                    }
                )?);
            }
        }
    }

    chunks.extend(generate_xml_chunk(
        ChunkType::XmlEndElement,
        XmlEndElementChunk {
            namespace: namespace_id,
            name: name_id
        }
    )?);

    for (prefix_id, uri_id) in opened_namespaces.into_iter().rev() {
        chunks.extend(generate_namespace_chunk(false, prefix_id, uri_id)?);
    }
    Ok(())
}
