use image::{Rgba, RgbaImage};

use crate::error::Error;
use crate::geometry::Vertex;
use crate::palette;
use crate::region::{self, RegionOptions};
use crate::resize;
use crate::simplified::simplify_image;
use crate::simplify::{self, Epsilon};
use crate::trace;

pub const VERSION: &str = "0.1.1";

#[derive(Debug, Clone, Default)]
pub struct ShapeOptions {
    /// Label touching regions as one shape regardless of color.
    pub no_color_separation: bool,
    /// Keep white as a shape color and preserve input transparency.
    pub allow_white: bool,
    /// Paint shape images from the source pixels instead of the
    /// palette color.
    pub preserve_color: bool,
    /// Skip the small-region filter.
    pub keep_small_regions: bool,
    /// RDP tolerance for path simplification.
    pub epsilon: Epsilon,
}

/// One detected shape: a colored region with its footprint image and
/// simplified boundary polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    /// Raster-scan ordinal, stable within one output. Not reused when a
    /// region fails to trace.
    pub number: u32,
    pub color: Rgba<u8>,
    /// Symbolic palette name, empty when the color has none.
    pub color_name: String,
    pub corner_x: u16,
    pub corner_y: u16,
    /// Footprint sized to the region's bounding box; pixels outside the
    /// region stay transparent.
    pub image: Option<RgbaImage>,
    /// Closed polygon relative to the corner; the first vertex is not
    /// repeated at the end.
    pub path: Vec<Vertex>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoardshapesData {
    pub version: String,
    pub shapes: Vec<ShapeRecord>,
}

/// Run the full pipeline: constrain size, simplify the palette, label
/// regions, and trace each region into a [`ShapeRecord`].
///
/// Regions whose boundary cannot be traced are skipped; their ordinal is
/// not reused.
pub fn create_shapes(img: &RgbaImage, options: &ShapeOptions) -> Result<BoardshapesData, Error> {
    let img = resize::resize(img)?;
    let mut simplified = simplify_image(&img, options.allow_white);

    let mut region_map = region::build_region_map(
        &simplified,
        RegionOptions {
            no_color_separation: options.no_color_separation,
            allow_white: options.allow_white,
        },
    );
    if !options.keep_small_regions {
        region::remove_small_regions(&mut region_map, &mut simplified, options.allow_white);
    }

    let mut shapes = Vec::with_capacity(region_map.regions().len());
    for (i, region) in region_map.regions().iter().enumerate() {
        let path = match trace::trace_region(region) {
            Ok(path) => path,
            Err(_) => continue,
        };
        let path = simplify::simplify_path(path, options.epsilon);

        let bounds = region.bounds();
        let color = region.color(&simplified, options.no_color_separation);
        let color_name = palette::color_name(color).unwrap_or_default().to_string();

        let mut image = RgbaImage::new(u32::from(bounds.width()), u32::from(bounds.height()));
        for pixel in region.pixels() {
            let x = u32::from(pixel.x - bounds.min_x);
            let y = u32::from(pixel.y - bounds.min_y);
            let painted = if options.preserve_color {
                *img.get_pixel(u32::from(pixel.x), u32::from(pixel.y))
            } else {
                color
            };
            image.put_pixel(x, y, painted);
        }

        shapes.push(ShapeRecord {
            number: i as u32,
            color,
            color_name,
            corner_x: bounds.min_x,
            corner_y: bounds.min_y,
            image: Some(image),
            path,
        });
    }

    Ok(BoardshapesData {
        version: VERSION.to_string(),
        shapes,
    })
}
