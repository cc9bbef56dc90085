//! The fixed color palette every simplified pixel is drawn from.

use image::Rgba;

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Fully transparent; only part of the palette when transparency is preserved.
pub const BLANK: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Symbolic name of a palette color, or `None` for colors outside the
/// nameable palette (`BLANK` included).
pub fn color_name(color: Rgba<u8>) -> Option<&'static str> {
    if color == RED {
        Some("Red")
    } else if color == GREEN {
        Some("Green")
    } else if color == BLUE {
        Some("Blue")
    } else if color == BLACK {
        Some("Black")
    } else if color == WHITE {
        Some("White")
    } else {
        None
    }
}

/// Classify one source pixel into the palette.
///
/// Transparent pixels become `BLANK` when `allow_white` is set (the
/// palette keeps transparency) and `WHITE` otherwise. Colors are expected
/// non-premultiplied, which is what [`image::Rgba`] stores.
pub fn classify(color: Rgba<u8>, allow_white: bool) -> Rgba<u8> {
    let Rgba([r, g, b, a]) = color;
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let avg = (r + g + b) / 3;

    if i32::from(a) < 10 {
        if allow_white {
            BLANK
        } else {
            WHITE
        }
    } else if (avg - r).abs().max((avg - g).abs()).max((avg - b).abs()) < 10 {
        // near-grayscale
        if r.max(g).max(b) > 115 {
            WHITE
        } else {
            BLACK
        }
    } else if r > g && r > b {
        RED
    } else if g > r && (g > b || b - g < 10) {
        GREEN
    } else if b > r && b > g {
        BLUE
    } else {
        WHITE
    }
}
