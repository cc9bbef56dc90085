//! Deserializers for the 0.1 format line.

use std::collections::{BTreeMap, HashSet};
use std::io;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{Rgba, RgbaImage};

use crate::error::Error;
use crate::geometry::Vertex;
use crate::palette;
use crate::shape::{BoardshapesData, ShapeRecord};

use super::{
    DeserializationOptions, JsonData, CHUNK_COLOR_TABLE, CHUNK_SHAPE_COLOR, CHUNK_SHAPE_GEOMETRY,
    CHUNK_SHAPE_IMAGE, CHUNK_SHAPE_MASK, CHUNK_VERSION,
};

pub(super) fn binary_deserialize(
    bytes: &[u8],
    options: &DeserializationOptions,
) -> Result<BoardshapesData, Error> {
    let mut r = Reader::new(bytes);
    let mut version = String::new();
    let mut color_names: Vec<(Rgba<u8>, String)> = Vec::new();
    let mut shapes: BTreeMap<u32, ShapeRecord> = BTreeMap::new();
    let mut colored: HashSet<u32> = HashSet::new();
    let mut masked: Vec<u32> = Vec::new();

    while !r.is_empty() {
        let tag = r.read_u8()?;
        match tag {
            CHUNK_VERSION => version = r.read_cstring()?,
            CHUNK_COLOR_TABLE => {
                let count = r.read_u32()?;
                for _ in 0..count {
                    let color = r.read_rgba()?;
                    let name = r.read_cstring()?;
                    color_names.push((color, name));
                }
            }
            CHUNK_SHAPE_GEOMETRY => {
                let number = r.read_u32()?;
                let shape = shapes.entry(number).or_insert_with(|| empty_shape(number));
                shape.corner_x = r.read_u16()?;
                shape.corner_y = r.read_u16()?;
                let vertices = r.read_u32()?;
                let mut path = Vec::new();
                for _ in 0..vertices {
                    let x = r.read_u16()?;
                    let y = r.read_u16()?;
                    path.push(Vertex { x, y });
                }
                shape.path = path;
            }
            CHUNK_SHAPE_COLOR => {
                let number = r.read_u32()?;
                let shape = shapes.entry(number).or_insert_with(|| empty_shape(number));
                shape.color = r.read_rgba()?;
                colored.insert(number);
            }
            CHUNK_SHAPE_IMAGE => {
                let number = r.read_u32()?;
                let shape = shapes.entry(number).or_insert_with(|| empty_shape(number));
                let len = r.read_u32()? as usize;
                let png = r.read_slice(len)?;
                shape.image =
                    Some(image::load_from_memory_with_format(png, image::ImageFormat::Png)?.to_rgba8());
            }
            CHUNK_SHAPE_MASK => {
                let number = r.read_u32()?;
                masked.push(number);
                let mask = read_mask(&mut r)?;
                let shape = shapes.entry(number).or_insert_with(|| empty_shape(number));
                shape.image = Some(mask);
            }
            tag => return Err(Error::UnknownChunkType(tag)),
        }
    }

    // attach table names to shapes whose color arrived
    for shape in shapes.values_mut() {
        if !colored.contains(&shape.number) {
            continue;
        }
        if let Some((_, name)) = color_names.iter().find(|(color, _)| *color == shape.color) {
            shape.color_name = name.clone();
        }
    }

    // mask decode paints BLACK/BLANK; restore real colors from the base
    // image when given, otherwise from the shape's own color
    for number in masked {
        let Some(shape) = shapes.get_mut(&number) else {
            continue;
        };
        if options.base_image.is_none() && !colored.contains(&number) {
            continue;
        }
        let corner = (u32::from(shape.corner_x), u32::from(shape.corner_y));
        let color = shape.color;
        let Some(image) = shape.image.as_mut() else {
            continue;
        };
        for y in 0..image.height() {
            for x in 0..image.width() {
                if image.get_pixel(x, y).0[3] == 0 {
                    continue;
                }
                let restored = match options.base_image {
                    Some(base) => base
                        .get_pixel_checked(corner.0 + x, corner.1 + y)
                        .copied()
                        .unwrap_or(palette::BLANK),
                    None => color,
                };
                image.put_pixel(x, y, restored);
            }
        }
    }

    Ok(BoardshapesData {
        version,
        shapes: shapes.into_values().collect(),
    })
}

pub(super) fn json_deserialize(
    bytes: &[u8],
    _options: &DeserializationOptions,
) -> Result<BoardshapesData, Error> {
    let json: JsonData = serde_json::from_slice(bytes)?;

    let mut shapes = Vec::with_capacity(json.shapes.len());
    for shape in json.shapes {
        let mut path = Vec::with_capacity(shape.path.len() / 2);
        for pair in shape.path.chunks_exact(2) {
            path.push(Vertex {
                x: pair[0],
                y: pair[1],
            });
        }

        let image = if shape.image.is_empty() {
            None
        } else {
            let png = BASE64.decode(shape.image.as_bytes())?;
            Some(image::load_from_memory_with_format(&png, image::ImageFormat::Png)?.to_rgba8())
        };

        shapes.push(ShapeRecord {
            number: shape.number,
            color: shape.color.into(),
            color_name: shape.color_string,
            corner_x: shape.corner_x,
            corner_y: shape.corner_y,
            image,
            path,
        });
    }

    Ok(BoardshapesData {
        version: json.version,
        shapes,
    })
}

fn empty_shape(number: u32) -> ShapeRecord {
    ShapeRecord {
        number,
        color: palette::BLANK,
        color_name: String::new(),
        corner_x: 0,
        corner_y: 0,
        image: None,
        path: Vec::new(),
    }
}

/// Decode a SHAPE_MASK payload into a BLACK/BLANK image.
///
/// The run-length stream ends at the first zero byte read where a varint
/// would start; the decoder then checks the runs fill whole rows.
fn read_mask(r: &mut Reader) -> Result<RgbaImage, Error> {
    let width = r.read_u16()?;
    let mut filled = r.read_u8()? > 0;

    let mut runs: Vec<u64> = Vec::new();
    let mut total: u64 = 0;
    while r.peek()? != 0 {
        let run = r.read_uvarint()?;
        total += run;
        runs.push(run);
    }
    r.read_u8()?;

    if width == 0 || total % u64::from(width) != 0 {
        return Err(Error::MaskMisaligned { total, width });
    }
    let height = (total / u64::from(width)) as u32;

    let mut image = RgbaImage::new(u32::from(width), height);
    let mut i: u64 = 0;
    for run in runs {
        for _ in 0..run {
            let x = (i % u64::from(width)) as u32;
            let y = (i / u64::from(width)) as u32;
            image.put_pixel(x, y, if filled { palette::BLACK } else { palette::BLANK });
            i += 1;
        }
        filled = !filled;
    }
    Ok(image)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Result<u8, Error> {
        self.bytes.get(self.pos).copied().ok_or_else(unexpected_eof)
    }

    fn read_u8(&mut self) -> Result<u8, Error> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self.pos.checked_add(len).ok_or_else(unexpected_eof)?;
        let slice = self.bytes.get(self.pos..end).ok_or_else(unexpected_eof)?;
        self.pos = end;
        Ok(slice)
    }

    fn read_u16(&mut self) -> Result<u16, Error> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, Error> {
        let bytes = self.read_slice(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_rgba(&mut self) -> Result<Rgba<u8>, Error> {
        let bytes = self.read_slice(4)?;
        Ok(Rgba([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_cstring(&mut self) -> Result<String, Error> {
        let nul = self.bytes[self.pos..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(unexpected_eof)?;
        let s = std::str::from_utf8(&self.bytes[self.pos..self.pos + nul])
            .map_err(|_| invalid_data("string is not valid UTF-8"))?;
        self.pos += nul + 1;
        Ok(s.to_string())
    }

    fn read_uvarint(&mut self) -> Result<u64, Error> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 64 {
                return Err(invalid_data("varint is too long"));
            }
        }
    }
}

fn unexpected_eof() -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "unexpected end of data",
    ))
}

fn invalid_data(msg: &str) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::InvalidData, msg.to_string()))
}
