use image::Rgba;

use crate::grid;
use crate::palette;
use crate::simplified::SimplifiedImage;

/// Regions with fewer pixels than this are dropped by
/// [`remove_small_regions`].
pub const MIN_REGION_PIXELS: usize = 50;

/// An image pixel coordinate. The pipeline guarantees dimensions fit in
/// 16 bits via the constraining resize step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub x: u16,
    pub y: u16,
}

/// Axis-aligned bounding box with exclusive maxima.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: u16,
    pub min_y: u16,
    pub max_x: u16,
    pub max_y: u16,
}

impl Bounds {
    #[inline]
    #[must_use]
    pub fn width(&self) -> u16 {
        self.max_x - self.min_x
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u16 {
        self.max_y - self.min_y
    }
}

/// A maximal 4-connected set of same-color pixels, in flood-fill
/// discovery order. Never empty.
#[derive(Debug, Clone)]
pub struct Region {
    pixels: Vec<Pixel>,
}

impl Region {
    fn new(seed: Pixel) -> Self {
        Self { pixels: vec![seed] }
    }

    fn push(&mut self, pixel: Pixel) {
        self.pixels.push(pixel);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds {
            min_x: u16::MAX,
            min_y: u16::MAX,
            max_x: 0,
            max_y: 0,
        };
        for pixel in &self.pixels {
            bounds.min_x = bounds.min_x.min(pixel.x);
            bounds.min_y = bounds.min_y.min(pixel.y);
            bounds.max_x = bounds.max_x.max(pixel.x + 1);
            bounds.max_y = bounds.max_y.max(pixel.y + 1);
        }
        bounds
    }

    /// The region's minimum coordinate.
    #[must_use]
    pub fn corner(&self) -> (u16, u16) {
        let bounds = self.bounds();
        (bounds.min_x, bounds.min_y)
    }

    /// Representative color of the region in `img`.
    ///
    /// With `majority` each member pixel votes and ties go to the color
    /// seen first in pixel order; otherwise the first pixel decides.
    /// Under color-separated labeling the two always agree.
    #[must_use]
    pub fn color(&self, img: &SimplifiedImage, majority: bool) -> Rgba<u8> {
        let first = self.pixels[0];
        if !majority {
            return img.get(u32::from(first.x), u32::from(first.y));
        }

        let mut counts: Vec<(Rgba<u8>, usize)> = Vec::new();
        for pixel in &self.pixels {
            let color = img.get(u32::from(pixel.x), u32::from(pixel.y));
            match counts.iter_mut().find(|(c, _)| *c == color) {
                Some((_, n)) => *n += 1,
                None => counts.push((color, 1)),
            }
        }
        let mut best = counts[0];
        for &entry in &counts[1..] {
            if entry.1 > best.1 {
                best = entry;
            }
        }
        best.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegionOptions {
    /// Merge touching regions regardless of color: the flood admits any
    /// non-background neighbor.
    pub no_color_separation: bool,
    /// Treat white as a foreground color instead of background.
    pub allow_white: bool,
}

/// The labeled regions of a simplified image, in raster-scan discovery
/// order of each region's first pixel.
#[derive(Debug, Clone)]
pub struct RegionMap {
    regions: Vec<Region>,
}

impl RegionMap {
    #[inline]
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[must_use]
    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }

    /// Drop regions rejected by `keep`, preserving the order of
    /// survivors.
    pub fn filter(&mut self, mut keep: impl FnMut(&Region) -> bool) {
        self.regions.retain(|region| keep(region));
    }
}

/// Partition `img` into connected same-color regions.
///
/// Pixels are scanned in raster order; each unlabeled non-background
/// pixel seeds an iterative depth-first 4-connected flood fill. `BLANK`
/// is always background, and `WHITE` is background unless
/// `options.allow_white`.
#[must_use]
pub fn build_region_map(img: &SimplifiedImage, options: RegionOptions) -> RegionMap {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let mut regions: Vec<Region> = Vec::with_capacity(20);
    let mut lookup: Vec<Option<u32>> = vec![None; width * height];

    let background = |color: Rgba<u8>| {
        color == palette::BLANK || (!options.allow_white && color == palette::WHITE)
    };

    for y in 0..height {
        for x in 0..width {
            if lookup[y * width + x].is_some() {
                continue;
            }
            let seed_color = img.get(x as u32, y as u32);
            if background(seed_color) {
                continue;
            }

            let id = regions.len() as u32;
            let seed = Pixel {
                x: x as u16,
                y: y as u16,
            };
            let mut region = Region::new(seed);
            lookup[y * width + x] = Some(id);

            let mut to_visit = vec![seed];
            while let Some(pixel) = to_visit.pop() {
                grid::neighbors4(pixel.x as usize, pixel.y as usize, width, height, |nx, ny| {
                    if lookup[ny * width + nx].is_some() {
                        return;
                    }
                    let color = img.get(nx as u32, ny as u32);
                    let admit = if options.no_color_separation {
                        !background(color)
                    } else {
                        color == seed_color
                    };
                    if admit {
                        let neighbor = Pixel {
                            x: nx as u16,
                            y: ny as u16,
                        };
                        lookup[ny * width + nx] = Some(id);
                        region.push(neighbor);
                        to_visit.push(neighbor);
                    }
                });
            }

            regions.push(region);
        }
    }

    RegionMap { regions }
}

/// Drop every region below [`MIN_REGION_PIXELS`], painting its pixels
/// back to the background color in `img`.
pub fn remove_small_regions(region_map: &mut RegionMap, img: &mut SimplifiedImage, allow_white: bool) {
    let background = if allow_white {
        palette::BLANK
    } else {
        palette::WHITE
    };
    region_map.filter(|region| {
        if region.len() >= MIN_REGION_PIXELS {
            return true;
        }
        for pixel in region.pixels() {
            img.set(u32::from(pixel.x), u32::from(pixel.y), background);
        }
        false
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simplified::simplify_image;
    use image::RgbaImage;

    fn image_with_squares(sizes: &[(u32, u32, u32)]) -> SimplifiedImage {
        // (origin_x, origin_y, side) black squares on a white canvas
        let img = RgbaImage::from_fn(64, 64, |x, y| {
            for &(ox, oy, side) in sizes {
                if x >= ox && x < ox + side && y >= oy && y < oy + side {
                    return image::Rgba([0, 0, 0, 255]);
                }
            }
            image::Rgba([255, 255, 255, 255])
        });
        simplify_image(&img, false)
    }

    #[test]
    fn regions_are_discovered_in_raster_order() {
        let simplified = image_with_squares(&[(40, 2, 10), (2, 20, 10)]);
        let map = build_region_map(&simplified, RegionOptions::default());
        assert_eq!(map.regions().len(), 2);
        assert_eq!(map.regions()[0].corner(), (40, 2));
        assert_eq!(map.regions()[1].corner(), (2, 20));
    }

    #[test]
    fn region_pixels_share_one_color_and_stay_connected() {
        let simplified = image_with_squares(&[(5, 5, 12)]);
        let map = build_region_map(&simplified, RegionOptions::default());
        assert_eq!(map.regions().len(), 1);
        let region = &map.regions()[0];
        assert_eq!(region.len(), 144);
        let color = region.color(&simplified, false);
        for pixel in region.pixels() {
            assert_eq!(simplified.get(u32::from(pixel.x), u32::from(pixel.y)), color);
        }
    }

    #[test]
    fn small_regions_are_dropped_and_painted_over() {
        // 7x7 = 49 pixels, one short of the threshold
        let mut simplified = image_with_squares(&[(2, 2, 7), (20, 20, 10)]);
        let mut map = build_region_map(&simplified, RegionOptions::default());
        assert_eq!(map.regions().len(), 2);
        remove_small_regions(&mut map, &mut simplified, false);
        assert_eq!(map.regions().len(), 1);
        assert_eq!(map.regions()[0].corner(), (20, 20));
        assert_eq!(simplified.get(3, 3), palette::WHITE);
    }

    #[test]
    fn threshold_sized_regions_are_kept() {
        // 50 pixels exactly: a 5x10 rectangle
        let img = RgbaImage::from_fn(32, 32, |x, y| {
            if x >= 4 && x < 9 && y >= 4 && y < 14 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let mut simplified = simplify_image(&img, false);
        let mut map = build_region_map(&simplified, RegionOptions::default());
        remove_small_regions(&mut map, &mut simplified, false);
        assert_eq!(map.regions().len(), 1);
        assert_eq!(map.regions()[0].len(), 50);
    }

    #[test]
    fn allow_white_labels_white_regions() {
        let simplified = image_with_squares(&[(10, 10, 8)]);
        let map = build_region_map(
            &simplified,
            RegionOptions {
                allow_white: true,
                ..RegionOptions::default()
            },
        );
        // the white canvas becomes a region alongside the black square
        assert_eq!(map.regions().len(), 2);
    }

    #[test]
    fn no_color_separation_merges_touching_colors() {
        let img = RgbaImage::from_fn(32, 32, |x, y| {
            if y >= 8 && y < 16 && x >= 4 && x < 28 {
                if x < 16 {
                    image::Rgba([255, 0, 0, 255])
                } else {
                    image::Rgba([0, 0, 255, 255])
                }
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let simplified = simplify_image(&img, false);

        let separated = build_region_map(&simplified, RegionOptions::default());
        assert_eq!(separated.regions().len(), 2);

        let merged = build_region_map(
            &simplified,
            RegionOptions {
                no_color_separation: true,
                ..RegionOptions::default()
            },
        );
        assert_eq!(merged.regions().len(), 1);
        // both halves are 12 columns wide; the vote ties and the color
        // seen first in pixel order wins
        assert_eq!(merged.regions()[0].color(&simplified, true), palette::RED);
    }
}
