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

// A 9-patch source image carries a 1-pixel border: black runs along the top
// and left edges mark the stretchable regions, black runs along the bottom
// and right edges mark the content padding. The border is consumed at
// compile time, turned into an `npTc` chunk, and stripped from the pixels.

use byteorder::{BigEndian, WriteBytesExt};
use resflat_common::{ResError, Result};

use crate::png_crunch::Image;

// Region color meaning "no fill hint"; the renderer samples the patch.
const NO_COLOR: u32 = 0x0000_0001;

const BLACK: [u8; 4] = [0, 0, 0, 0xFF];

/// Stretch and padding metadata extracted from a 9-patch border. Div
/// positions are in stripped-image coordinates, stored as half-open
/// `[start, end)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NinePatch {
    pub x_divs: Vec<u32>,
    pub y_divs: Vec<u32>,
    /// left, right, top, bottom
    pub padding: [u32; 4]
}

impl NinePatch {
    /// Reads the 1-pixel border of `image`. Fails when the image is too
    /// small, a border pixel is neither transparent nor black, or no
    /// stretch region is marked.
    pub fn create(image: &Image) -> Result<NinePatch> {
        if image.width < 3 || image.height < 3 {
            return Err(ResError::NinePatchFailed(format!(
                "image must be at least 3x3 to hold a 9-patch border, got {}x{}",
                image.width, image.height
            )));
        }

        let top: Vec<[u8; 4]> = (1..image.width - 1).map(|x| pixel(image, x, 0)).collect();
        let left: Vec<[u8; 4]> = (1..image.height - 1).map(|y| pixel(image, 0, y)).collect();
        let bottom: Vec<[u8; 4]> = (1..image.width - 1)
            .map(|x| pixel(image, x, image.height - 1))
            .collect();
        let right: Vec<[u8; 4]> = (1..image.height - 1)
            .map(|y| pixel(image, image.width - 1, y))
            .collect();

        for corner in [
            pixel(image, 0, 0),
            pixel(image, image.width - 1, 0),
            pixel(image, 0, image.height - 1),
            pixel(image, image.width - 1, image.height - 1)
        ] {
            if !is_transparent(&corner) {
                return Err(ResError::NinePatchFailed(
                    "border corner pixels must be transparent".into()
                ));
            }
        }

        let x_divs = marked_runs(&top, "top")?;
        let y_divs = marked_runs(&left, "left")?;
        if x_divs.is_empty() || y_divs.is_empty() {
            return Err(ResError::NinePatchFailed(
                "no stretch region marked on the top or left border".into()
            ));
        }

        let padding_h = padding_run(&bottom, "bottom")?;
        let padding_v = padding_run(&right, "right")?;

        Ok(NinePatch {
            x_divs,
            y_divs,
            padding: [padding_h.0, padding_h.1, padding_v.0, padding_v.1]
        })
    }

    /// Serialised `npTc` chunk data: the on-file layout of the platform's
    /// 9-patch struct with big-endian integers and NO_COLOR for every
    /// region.
    pub fn serialize(&self) -> Vec<u8> {
        let num_x_divs = self.x_divs.len() as u8;
        let num_y_divs = self.y_divs.len() as u8;
        // Half-open pairs: n divs split an axis into n/2 stretch regions
        // plus their fixed neighbours.
        let regions_x = self.x_divs.len() as u32 + 1;
        let regions_y = self.y_divs.len() as u32 + 1;
        let num_colors = regions_x * regions_y;

        let header_size = 32u32;
        let x_divs_offset = header_size;
        let y_divs_offset = x_divs_offset + 4 * num_x_divs as u32;
        let colors_offset = y_divs_offset + 4 * num_y_divs as u32;

        let mut out = vec![];
        out.write_u8(0).unwrap(); // wasDeserialized
        out.write_u8(num_x_divs).unwrap();
        out.write_u8(num_y_divs).unwrap();
        out.write_u8(num_colors as u8).unwrap();
        out.write_u32::<BigEndian>(x_divs_offset).unwrap();
        out.write_u32::<BigEndian>(y_divs_offset).unwrap();
        out.write_u32::<BigEndian>(self.padding[0]).unwrap();
        out.write_u32::<BigEndian>(self.padding[1]).unwrap();
        out.write_u32::<BigEndian>(self.padding[2]).unwrap();
        out.write_u32::<BigEndian>(self.padding[3]).unwrap();
        out.write_u32::<BigEndian>(colors_offset).unwrap();
        for div in self.x_divs.iter().chain(self.y_divs.iter()) {
            out.write_u32::<BigEndian>(*div).unwrap();
        }
        for _ in 0..num_colors {
            out.write_u32::<BigEndian>(NO_COLOR).unwrap();
        }
        out
    }
}

/// Copies the image without its 1-pixel border.
pub fn strip_border(image: &Image) -> Image {
    let width = image.width - 2;
    let height = image.height - 2;
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 1..image.height - 1 {
        let row = image.row(y);
        pixels.extend_from_slice(&row[4..row.len() - 4]);
    }
    Image {
        width,
        height,
        pixels
    }
}

fn pixel(image: &Image, x: u32, y: u32) -> [u8; 4] {
    let offset = (y as usize * image.width as usize + x as usize) * 4;
    image.pixels[offset..offset + 4].try_into().unwrap()
}

fn is_transparent(pixel: &[u8; 4]) -> bool {
    pixel[3] == 0
}

/// Finds the black runs along one border edge as `[start, end)` pairs in
/// stripped coordinates.
fn marked_runs(edge: &[[u8; 4]], edge_name: &str) -> Result<Vec<u32>> {
    let mut runs = vec![];
    let mut run_start: Option<u32> = None;
    for (i, px) in edge.iter().enumerate() {
        let marked = *px == BLACK;
        if !marked && !is_transparent(px) {
            return Err(ResError::NinePatchFailed(format!(
                "{} border pixel {} is neither transparent nor black",
                edge_name,
                i + 1
            )));
        }
        match (marked, run_start) {
            (true, None) => run_start = Some(i as u32),
            (false, Some(start)) => {
                runs.push(start);
                runs.push(i as u32);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        runs.push(start);
        runs.push(edge.len() as u32);
    }
    Ok(runs)
}

/// Padding is a single black run; its distances from each end of the edge
/// are the padding amounts. No run means no padding.
fn padding_run(edge: &[[u8; 4]], edge_name: &str) -> Result<(u32, u32)> {
    let runs = marked_runs(edge, edge_name)?;
    match runs.len() {
        0 => Ok((0, 0)),
        2 => Ok((runs[0], edge.len() as u32 - runs[1])),
        _ => Err(ResError::NinePatchFailed(format!(
            "{} border defines more than one padding run",
            edge_name
        )))
    }
}
