//! Serialization of [`BoardshapesData`]: a chunked big-endian binary
//! container and a JSON mirror of the same schema.
//!
//! The binary stream is a sequence of tagged chunks. The first chunk is
//! always VERSION; deserialization dispatches on the version's
//! major.minor prefix so archived outputs stay readable as the format
//! evolves. Shape chunks are joined on their shape number. Footprint
//! images travel either as embedded PNGs or as run-length-encoded alpha
//! masks (`use_masks`), whichever the serializer was asked for.

mod v0_1;

use std::io::Write;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::shape::{BoardshapesData, ShapeRecord, VERSION};

pub const CHUNK_VERSION: u8 = 0;
pub const CHUNK_COLOR_TABLE: u8 = 2;
pub const CHUNK_SHAPE_GEOMETRY: u8 = 8;
pub const CHUNK_SHAPE_COLOR: u8 = 9;
pub const CHUNK_SHAPE_IMAGE: u8 = 10;
pub const CHUNK_SHAPE_MASK: u8 = 11;

#[derive(Debug, Clone, Copy)]
pub struct SerializationOptions {
    /// Emit SHAPE_MASK chunks instead of embedded PNGs.
    pub use_masks: bool,
}

impl Default for SerializationOptions {
    fn default() -> Self {
        Self { use_masks: true }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeserializationOptions<'a> {
    /// When set, opaque mask pixels are restored from this image at the
    /// shape's corner offset instead of from the shape's color.
    pub base_image: Option<&'a RgbaImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Binary,
    Json,
}

/// Decide the format of serialized data by peeking at the first byte.
#[must_use]
pub fn detect_format(bytes: &[u8]) -> DataFormat {
    if bytes.first() == Some(&b'{') {
        DataFormat::Json
    } else {
        DataFormat::Binary
    }
}

/// Deserialize either format, auto-detected via [`detect_format`].
pub fn deserialize(bytes: &[u8], options: &DeserializationOptions) -> Result<BoardshapesData, Error> {
    match detect_format(bytes) {
        DataFormat::Json => json_deserialize(bytes, options),
        DataFormat::Binary => binary_deserialize(bytes, options),
    }
}

/// Serialize `data` to the binary chunk stream.
///
/// The stream is assembled in one growable buffer and flushed to `w` at
/// the end: VERSION first, then a COLOR_TABLE of the distinct named
/// colors, then per shape GEOMETRY, COLOR, and MASK or IMAGE.
pub fn binary_serialize(
    w: &mut impl Write,
    data: &BoardshapesData,
    options: SerializationOptions,
) -> Result<(), Error> {
    let mut buf: Vec<u8> = Vec::new();

    // always stamped with the current version, upgrading whatever
    // version the data was read as
    buf.push(CHUNK_VERSION);
    buf.extend_from_slice(VERSION.as_bytes());
    buf.push(0);

    // distinct color -> name associations, in first-appearance order so
    // identical inputs serialize to identical bytes
    let mut color_names: Vec<(Rgba<u8>, &str)> = Vec::new();
    for shape in &data.shapes {
        if !shape.color_name.is_empty() && !color_names.iter().any(|(c, _)| *c == shape.color) {
            color_names.push((shape.color, &shape.color_name));
        }
    }

    buf.push(CHUNK_COLOR_TABLE);
    buf.extend_from_slice(&(color_names.len() as u32).to_be_bytes());
    for (color, name) in &color_names {
        buf.extend_from_slice(&color.0);
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
    }

    for shape in &data.shapes {
        buf.push(CHUNK_SHAPE_GEOMETRY);
        buf.extend_from_slice(&shape.number.to_be_bytes());
        buf.extend_from_slice(&shape.corner_x.to_be_bytes());
        buf.extend_from_slice(&shape.corner_y.to_be_bytes());
        buf.extend_from_slice(&(shape.path.len() as u32).to_be_bytes());
        for vertex in &shape.path {
            buf.extend_from_slice(&vertex.x.to_be_bytes());
            buf.extend_from_slice(&vertex.y.to_be_bytes());
        }

        buf.push(CHUNK_SHAPE_COLOR);
        buf.extend_from_slice(&shape.number.to_be_bytes());
        buf.extend_from_slice(&shape.color.0);

        if let Some(image) = &shape.image {
            if image.width() > 0 && image.height() > 0 {
                if options.use_masks {
                    write_mask_chunk(&mut buf, shape.number, image);
                } else {
                    write_image_chunk(&mut buf, shape.number, image)?;
                }
            }
        }
    }

    w.write_all(&buf)?;
    Ok(())
}

/// Deserialize the binary chunk stream, dispatching on the VERSION
/// chunk's major.minor prefix.
pub fn binary_deserialize(
    bytes: &[u8],
    options: &DeserializationOptions,
) -> Result<BoardshapesData, Error> {
    let version = peek_version(bytes)?;
    match major_minor(&version)?.as_str() {
        "0.1" => v0_1::binary_deserialize(bytes, options),
        _ => Err(Error::IncompatibleVersion(version)),
    }
}

/// Serialize `data` as the JSON mirror of the binary schema.
pub fn json_serialize(w: &mut impl Write, data: &BoardshapesData) -> Result<(), Error> {
    let shapes = data
        .shapes
        .iter()
        .map(shape_to_json)
        .collect::<Result<Vec<_>, Error>>()?;
    let json = JsonData {
        version: data.version.clone(),
        shapes,
    };
    serde_json::to_writer(&mut *w, &json)?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Deserialize the JSON format, dispatching on the `version` field.
pub fn json_deserialize(
    bytes: &[u8],
    options: &DeserializationOptions,
) -> Result<BoardshapesData, Error> {
    #[derive(Deserialize)]
    struct VersionHeader {
        version: Option<String>,
    }

    let header: VersionHeader = serde_json::from_slice(bytes)?;
    let version = header.version.ok_or(Error::VersionNotFound)?;
    match major_minor(&version)?.as_str() {
        "0.1" => v0_1::json_deserialize(bytes, options),
        _ => Err(Error::IncompatibleVersion(version)),
    }
}

#[derive(Serialize, Deserialize)]
pub(crate) struct JsonData {
    pub(crate) version: String,
    pub(crate) shapes: Vec<JsonShape>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct JsonShape {
    pub(crate) number: u32,
    #[serde(rename = "cornerX")]
    pub(crate) corner_x: u16,
    #[serde(rename = "cornerY")]
    pub(crate) corner_y: u16,
    /// Flat `[x0, y0, x1, y1, ...]` vertex array.
    pub(crate) path: Vec<u16>,
    pub(crate) color: JsonColor,
    #[serde(rename = "colorString")]
    pub(crate) color_string: String,
    /// Base64-encoded PNG, or empty when the shape carries no image.
    pub(crate) image: String,
}

#[derive(Serialize, Deserialize, Clone, Copy)]
pub(crate) struct JsonColor {
    #[serde(rename = "R")]
    pub(crate) r: u8,
    #[serde(rename = "G")]
    pub(crate) g: u8,
    #[serde(rename = "B")]
    pub(crate) b: u8,
    #[serde(rename = "A")]
    pub(crate) a: u8,
}

impl From<Rgba<u8>> for JsonColor {
    fn from(color: Rgba<u8>) -> Self {
        let Rgba([r, g, b, a]) = color;
        Self { r, g, b, a }
    }
}

impl From<JsonColor> for Rgba<u8> {
    fn from(color: JsonColor) -> Self {
        Rgba([color.r, color.g, color.b, color.a])
    }
}

fn shape_to_json(shape: &ShapeRecord) -> Result<JsonShape, Error> {
    let mut path = Vec::with_capacity(shape.path.len() * 2);
    for vertex in &shape.path {
        path.push(vertex.x);
        path.push(vertex.y);
    }
    let image = match &shape.image {
        Some(image) => BASE64.encode(encode_png(image)?),
        None => String::new(),
    };
    Ok(JsonShape {
        number: shape.number,
        corner_x: shape.corner_x,
        corner_y: shape.corner_y,
        path,
        color: shape.color.into(),
        color_string: shape.color_name.clone(),
        image,
    })
}

/// Encode the alpha channel of `image` as alternating run lengths over
/// the row-major pixel sequence. Runs are LEB128 uvarints; a lone zero
/// byte terminates the stream (a zero-length run is never emitted).
fn write_mask_chunk(buf: &mut Vec<u8>, number: u32, image: &RgbaImage) {
    buf.push(CHUNK_SHAPE_MASK);
    buf.extend_from_slice(&number.to_be_bytes());
    buf.extend_from_slice(&(image.width() as u16).to_be_bytes());

    let mut filled = image.get_pixel(0, 0).0[3] > 0;
    buf.push(u8::from(filled));

    let mut run: u64 = 0;
    for pixel in image.pixels() {
        let opaque = pixel.0[3] > 0;
        if opaque == filled {
            run += 1;
        } else {
            write_uvarint(buf, run);
            run = 1;
            filled = opaque;
        }
    }
    write_uvarint(buf, run);
    buf.push(0);
}

fn write_image_chunk(buf: &mut Vec<u8>, number: u32, image: &RgbaImage) -> Result<(), Error> {
    buf.push(CHUNK_SHAPE_IMAGE);
    buf.extend_from_slice(&number.to_be_bytes());
    let png = encode_png(image)?;
    buf.extend_from_slice(&(png.len() as u32).to_be_bytes());
    buf.extend_from_slice(&png);
    Ok(())
}

pub(crate) fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    image.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

pub(crate) fn write_uvarint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            return;
        }
    }
}

fn peek_version(bytes: &[u8]) -> Result<String, Error> {
    if bytes.first() != Some(&CHUNK_VERSION) {
        return Err(Error::VersionNotFound);
    }
    let rest = &bytes[1..];
    let nul = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(Error::VersionNotFound)?;
    let version = std::str::from_utf8(&rest[..nul]).map_err(|_| Error::VersionNotFound)?;
    Ok(version.to_string())
}

fn major_minor(version: &str) -> Result<String, Error> {
    let mut parts = version.split('.');
    match (parts.next(), parts.next()) {
        (Some(major), Some(minor)) if !minor.is_empty() => Ok(format!("{major}.{minor}")),
        _ => Err(Error::InvalidVersion(version.to_string())),
    }
}
