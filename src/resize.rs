use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbaImage;

use crate::error::Error;

pub const MAX_WIDTH: u32 = 1920;
pub const MAX_HEIGHT: u32 = 1080;

/// Constrain `img` to the default 1920x1080 bounds. Uses [`resize_to`].
pub fn resize(img: &RgbaImage) -> Result<RgbaImage, Error> {
    resize_to(img, MAX_WIDTH as i64, MAX_HEIGHT as i64)
}

/// Constrain `img` to fit within the given dimensions, preserving aspect
/// ratio, sampling nearest-neighbor. A dimension of zero or less is
/// ignored, as if it were infinite. Images already within bounds are
/// returned unscaled.
pub fn resize_to(img: &RgbaImage, width: i64, height: i64) -> Result<RgbaImage, Error> {
    let src_w = i64::from(img.width());
    let src_h = i64::from(img.height());

    let (width, height) = if (width <= 0 && height <= 0) || (width >= src_w && height >= src_h) {
        (src_w, src_h)
    } else if width <= 0 {
        let scale = height as f64 / src_h as f64;
        ((src_w as f64 * scale).round() as i64, height)
    } else if height <= 0 {
        let scale = width as f64 / src_w as f64;
        (width, (src_h as f64 * scale).round() as i64)
    } else {
        let scale = (height as f64 / src_h as f64).min(width as f64 / src_w as f64);
        (
            (src_w as f64 * scale).round() as i64,
            (src_h as f64 * scale).round() as i64,
        )
    };

    if width == src_w && height == src_h {
        return Ok(img.clone());
    }

    let src = Image::from_vec_u8(
        img.width(),
        img.height(),
        img.as_raw().clone(),
        PixelType::U8x4,
    )?;
    let mut dst = Image::new(width as u32, height as u32, PixelType::U8x4);

    let mut resizer = Resizer::new();
    let mut options = ResizeOptions::new();
    options.algorithm = ResizeAlg::Nearest;
    // nearest-neighbor copies source pixels verbatim; the alpha
    // multiply/divide pass would only add rounding loss
    options.mul_div_alpha = false;
    resizer.resize(&src, &mut dst, Some(&options))?;

    RgbaImage::from_raw(width as u32, height as u32, dst.into_vec())
        .ok_or_else(|| Error::Resize("resized buffer has unexpected length".to_string()))
}
