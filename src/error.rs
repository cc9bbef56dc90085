use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    RegionEmpty,
    RegionTooThin,
    ShapeGenerationFailed,
    CouldNotCloseShape,
    UnknownChunkType(u8),
    MaskMisaligned { total: u64, width: u16 },
    VersionNotFound,
    InvalidVersion(String),
    IncompatibleVersion(String),
    Resize(String),
    Io(io::Error),
    Image(image::ImageError),
    Json(serde_json::Error),
    Base64(base64::DecodeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RegionEmpty => write!(f, "region is empty"),
            Error::RegionTooThin => write!(f, "region is too thin to trace"),
            Error::ShapeGenerationFailed => {
                write!(f, "shape generation failed: boundary vertex has an unexpected neighbor count")
            }
            Error::CouldNotCloseShape => write!(f, "could not close shape"),
            Error::UnknownChunkType(tag) => {
                write!(f, "unknown chunk type encountered during deserialization: {tag}")
            }
            Error::MaskMisaligned { total, width } => {
                write!(f, "mask width {width} does not divide evenly into the {total} pixels of the mask")
            }
            Error::VersionNotFound => write!(f, "version of the data could not be found"),
            Error::InvalidVersion(version) => write!(f, "version of the data is invalid: {version}"),
            Error::IncompatibleVersion(version) => {
                write!(f, "no deserializer is compatible with data version {version}")
            }
            Error::Resize(msg) => write!(f, "resize failed: {msg}"),
            Error::Io(err) => write!(f, "{err}"),
            Error::Image(err) => write!(f, "{err}"),
            Error::Json(err) => write!(f, "{err}"),
            Error::Base64(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Image(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Base64(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Base64(err)
    }
}

impl From<fast_image_resize::ImageBufferError> for Error {
    fn from(err: fast_image_resize::ImageBufferError) -> Self {
        Error::Resize(err.to_string())
    }
}

impl From<fast_image_resize::ResizeError> for Error {
    fn from(err: fast_image_resize::ResizeError) -> Self {
        Error::Resize(err.to_string())
    }
}
