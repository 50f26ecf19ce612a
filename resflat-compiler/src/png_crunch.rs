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

// PNG crunching: strip every chunk that is not needed for rendering, decode
// to RGBA, and re-encode. The chunk filter output doubles as the fallback
// payload when the re-encoded image turns out larger than the original.

use std::io::Cursor;

use byteorder::{BigEndian, ByteOrder};
use png::{BitDepth, ColorType, Transformations};
use resflat_common::{ResError, Result};

use crate::nine_patch::NinePatch;

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

// Chunks a renderer actually consumes. Everything ancillary (tEXt, tIME,
// iCCP, eXIf, ...) is dropped; the 9-patch chunks survive round trips of
// already-compiled images.
const KEPT_CHUNKS: &[&[u8; 4]] = &[
    b"IHDR", b"PLTE", b"tRNS", b"IDAT", b"IEND", b"npTc", b"npLb", b"npOl"
];

/// Decoded RGBA raster, 4 bytes per pixel, rows top to bottom.
#[derive(Debug, Clone)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>
}

impl Image {
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 4;
        &self.pixels[y as usize * stride..(y as usize + 1) * stride]
    }
}

/// Streaming pass over the raw PNG byte framing that keeps only the
/// allow-listed chunks. CRCs are copied verbatim, so the output is a valid
/// PNG whenever the input was.
pub struct PngChunkFilter<'a> {
    data: &'a [u8]
}

impl<'a> PngChunkFilter<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < PNG_SIGNATURE.len() || &data[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
            return Err(ResError::CorruptPng("bad signature".into()));
        }
        Ok(PngChunkFilter { data })
    }

    pub fn filter(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.data.len());
        out.extend_from_slice(PNG_SIGNATURE);

        let mut pos = PNG_SIGNATURE.len();
        let mut seen_iend = false;
        while pos < self.data.len() {
            if pos + 8 > self.data.len() {
                return Err(ResError::CorruptPng("truncated chunk header".into()));
            }
            let length = BigEndian::read_u32(&self.data[pos..pos + 4]) as usize;
            let chunk_type: [u8; 4] = self.data[pos + 4..pos + 8].try_into().unwrap();
            let total = 8 + length + 4;
            if pos + total > self.data.len() {
                return Err(ResError::CorruptPng(format!(
                    "truncated {} chunk",
                    String::from_utf8_lossy(&chunk_type)
                )));
            }
            if KEPT_CHUNKS.iter().any(|kept| **kept == chunk_type) {
                out.extend_from_slice(&self.data[pos..pos + total]);
            }
            pos += total;
            if &chunk_type == b"IEND" {
                seen_iend = true;
                break;
            }
        }
        if !seen_iend {
            return Err(ResError::CorruptPng("missing IEND chunk".into()));
        }
        Ok(out)
    }
}

/// Decodes a PNG byte stream into an RGBA [Image], expanding palettes and
/// narrowing 16-bit channels on the way.
pub fn read_png(data: &[u8]) -> Result<Image> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buffer = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buffer)?;
    buffer.truncate(info.buffer_size());

    if info.bit_depth != BitDepth::Eight {
        return Err(ResError::CorruptPng(format!(
            "unsupported bit depth {:?} after expansion",
            info.bit_depth
        )));
    }

    let pixel_count = info.width as usize * info.height as usize;
    let pixels = match info.color_type {
        ColorType::Rgba => buffer,
        ColorType::Rgb => {
            let mut rgba = Vec::with_capacity(pixel_count * 4);
            for rgb in buffer.chunks_exact(3) {
                rgba.extend_from_slice(rgb);
                rgba.push(0xFF);
            }
            rgba
        }
        ColorType::Grayscale => {
            let mut rgba = Vec::with_capacity(pixel_count * 4);
            for gray in buffer {
                rgba.extend_from_slice(&[gray, gray, gray, 0xFF]);
            }
            rgba
        }
        ColorType::GrayscaleAlpha => {
            let mut rgba = Vec::with_capacity(pixel_count * 4);
            for ga in buffer.chunks_exact(2) {
                rgba.extend_from_slice(&[ga[0], ga[0], ga[0], ga[1]]);
            }
            rgba
        }
        ColorType::Indexed => {
            // EXPAND turns palettes into RGB(A) before we get here.
            return Err(ResError::CorruptPng("palette image was not expanded".into()));
        }
    };

    Ok(Image {
        width: info.width,
        height: info.height,
        pixels
    })
}

/// Re-encodes an RGBA image, embedding the 9-patch chunk when present.
pub fn write_png(image: &Image, nine_patch: Option<&NinePatch>) -> Result<Vec<u8>> {
    let mut out: Vec<u8> = vec![];
    {
        let mut encoder = png::Encoder::new(&mut out, image.width, image.height);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        if let Some(nine_patch) = nine_patch {
            writer.write_chunk(png::chunk::ChunkType(*b"npTc"), &nine_patch.serialize())?;
        }
        writer.write_image_data(&image.pixels)?;
        writer.finish()?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_with_text_chunk(width: u32, height: u32) -> Vec<u8> {
        let pixels = vec![0x7Fu8; (width * height * 4) as usize];
        let mut out: Vec<u8> = vec![];
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer
            .write_chunk(png::chunk::ChunkType(*b"tEXt"), b"Comment\0dropped")
            .unwrap();
        writer.write_image_data(&pixels).unwrap();
        writer.finish().unwrap();
        out
    }

    #[test]
    fn filter_drops_ancillary_chunks() {
        let original = encode_with_text_chunk(4, 4);
        let filter = PngChunkFilter::new(&original).unwrap();
        let filtered = filter.filter().unwrap();
        assert!(filtered.len() < original.len());

        let needle = b"tEXt";
        assert!(original.windows(4).any(|w| w == needle));
        assert!(!filtered.windows(4).any(|w| w == needle));

        // The filtered stream still decodes.
        let image = read_png(&filtered).unwrap();
        assert_eq!(image.width, 4);
        assert_eq!(image.height, 4);
    }

    #[test]
    fn filter_rejects_garbage() {
        assert!(PngChunkFilter::new(b"not a png").is_err());
        let original = encode_with_text_chunk(2, 2);
        let truncated = &original[..original.len() - 6];
        assert!(PngChunkFilter::new(truncated).unwrap().filter().is_err());
    }

    #[test]
    fn decode_round_trips_what_encode_produced() {
        let image = Image {
            width: 3,
            height: 2,
            pixels: (0..24).collect()
        };
        let encoded = write_png(&image, None).unwrap();
        let decoded = read_png(&encoded).unwrap();
        assert_eq!(decoded.width, 3);
        assert_eq!(decoded.height, 2);
        assert_eq!(decoded.pixels, image.pixels);
    }

    #[test]
    fn rgb_decodes_to_opaque_rgba() {
        let mut out: Vec<u8> = vec![];
        let mut encoder = png::Encoder::new(&mut out, 2, 1);
        encoder.set_color(ColorType::Rgb);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[10, 20, 30, 40, 50, 60]).unwrap();
        writer.finish().unwrap();

        let image = read_png(&out).unwrap();
        assert_eq!(image.pixels, vec![10, 20, 30, 0xFF, 40, 50, 60, 0xFF]);
    }
}
