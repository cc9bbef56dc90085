use image::{GenericImageView, Rgba, RgbaImage};

use crate::palette;

/// A rectangular grid whose every pixel is one of the palette colors.
///
/// Produced by [`simplify_image`] and only mutated afterwards by
/// small-region elimination, which paints dropped pixels back to the
/// background color.
#[derive(Debug, Clone)]
pub struct SimplifiedImage {
    width: u32,
    height: u32,
    pixels: Vec<Rgba<u8>>,
}

impl SimplifiedImage {
    #[must_use]
    pub fn new(width: u32, height: u32, fill: Rgba<u8>) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; (width * height) as usize],
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Rgba<u8> {
        debug_assert!(x < self.width && y < self.height);
        self.pixels[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        debug_assert!(x < self.width && y < self.height);
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Expand back into an RGBA buffer, e.g. for writing a preview image.
    #[must_use]
    pub fn to_rgba(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| self.get(x, y))
    }
}

/// Classify every pixel of `img` into the palette.
///
/// With `allow_white` the palette includes `BLANK` and transparent input
/// stays transparent; otherwise transparent input becomes `WHITE`.
#[must_use]
pub fn simplify_image<I>(img: &I, allow_white: bool) -> SimplifiedImage
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let (width, height) = img.dimensions();
    let mut simplified = SimplifiedImage::new(width, height, palette::WHITE);
    for y in 0..height {
        for x in 0..width {
            simplified.set(x, y, palette::classify(img.get_pixel(x, y), allow_white));
        }
    }
    simplified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{BLACK, BLANK, BLUE, GREEN, RED, WHITE};

    fn classify(rgba: [u8; 4], allow_white: bool) -> Rgba<u8> {
        palette::classify(Rgba(rgba), allow_white)
    }

    #[test]
    fn transparent_pixels_follow_allow_white() {
        assert_eq!(classify([90, 20, 200, 0], false), WHITE);
        assert_eq!(classify([90, 20, 200, 0], true), BLANK);
        assert_eq!(classify([0, 0, 0, 9], true), BLANK);
    }

    #[test]
    fn near_grayscale_splits_on_brightness() {
        assert_eq!(classify([200, 200, 200, 255], false), WHITE);
        assert_eq!(classify([120, 118, 116, 255], false), WHITE);
        assert_eq!(classify([40, 40, 40, 255], false), BLACK);
        assert_eq!(classify([115, 112, 110, 255], false), BLACK);
    }

    #[test]
    fn dominant_channels_pick_their_color() {
        assert_eq!(classify([200, 40, 40, 255], false), RED);
        assert_eq!(classify([30, 180, 30, 255], false), GREEN);
        assert_eq!(classify([20, 20, 220, 255], false), BLUE);
    }

    #[test]
    fn teal_leans_green() {
        // blue barely ahead of green still reads as green
        assert_eq!(classify([0, 200, 205, 255], false), GREEN);
        assert_eq!(classify([0, 180, 250, 255], false), BLUE);
    }

    #[test]
    fn unclassifiable_colors_fall_back_to_white() {
        // yellow: no single dominant channel
        assert_eq!(classify([255, 255, 0, 255], false), WHITE);
    }

    #[test]
    fn every_output_pixel_is_a_palette_color() {
        let img = RgbaImage::from_fn(16, 16, |x, y| {
            Rgba([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8, 255])
        });
        let simplified = simplify_image(&img, false);
        let allowed = [WHITE, BLACK, RED, GREEN, BLUE];
        for y in 0..simplified.height() {
            for x in 0..simplified.width() {
                assert!(allowed.contains(&simplified.get(x, y)));
            }
        }
    }
}
