//! Connectivity Mask Builder
//!
//! Turns a diagram image into a binary wire mask: Canny edges, thickened by
//! square dilation so broken hand-drawn strokes join up, then cut at every
//! component body so two leads of one component are never bridged through
//! its footprint.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;

use crate::detection::ComponentRecord;

const WIRE: u8 = 255;
const BACKGROUND: u8 = 0;

/// Inset applied along the longer side of a bounding box
pub const LONG_SIDE_MARGIN: i64 = 12;
/// Inset applied along the shorter side of a bounding box
pub const SHORT_SIDE_MARGIN: i64 = 5;

/// Tuning for [`build_mask`]
#[derive(Debug, Clone, PartialEq)]
pub struct MaskOptions {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Side of the square structuring element
    pub dilation_kernel: u8,
    pub dilation_iterations: u32,
    pub long_side_margin: i64,
    pub short_side_margin: i64,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            dilation_kernel: 5,
            dilation_iterations: 2,
            long_side_margin: LONG_SIDE_MARGIN,
            short_side_margin: SHORT_SIDE_MARGIN,
        }
    }
}

/// Binary wire mask (255 = wire, 0 = background)
#[derive(Debug, Clone, PartialEq)]
pub struct WireMask {
    pixels: GrayImage,
}

impl WireMask {
    /// Empty mask of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::new(width, height),
        }
    }

    /// Binarize an existing image (`> 0` is wire)
    pub fn from_image(image: GrayImage) -> Self {
        let mut pixels = image;
        for p in pixels.pixels_mut() {
            p.0[0] = if p.0[0] > 0 { WIRE } else { BACKGROUND };
        }
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_wire(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.pixels.get_pixel(x, y).0[0] != BACKGROUND
    }

    pub fn set(&mut self, x: u32, y: u32, wire: bool) {
        if x < self.width() && y < self.height() {
            self.pixels
                .put_pixel(x, y, Luma([if wire { WIRE } else { BACKGROUND }]));
        }
    }

    /// Set every pixel of the inclusive rectangle, clipped to the mask
    pub fn fill_rect(&mut self, x1: u32, y1: u32, x2: u32, y2: u32, wire: bool) {
        if self.width() == 0 || self.height() == 0 {
            return;
        }
        let x2 = x2.min(self.width() - 1);
        let y2 = y2.min(self.height() - 1);
        for y in y1..=y2 {
            for x in x1..=x2 {
                self.set(x, y, wire);
            }
        }
    }

    pub fn wire_pixel_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p.0[0] != BACKGROUND).count()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.pixels
    }

    pub fn into_image(self) -> GrayImage {
        self.pixels
    }
}

/// Build the wire mask for one diagram image
pub fn build_mask(
    image: &DynamicImage,
    components: &[ComponentRecord],
    options: &MaskOptions,
) -> WireMask {
    let gray = image.to_luma8();
    let edges = imageproc::edges::canny(&gray, options.canny_low, options.canny_high);

    let radius = options.dilation_kernel / 2;
    let mut connected = edges;
    if radius > 0 {
        for _ in 0..options.dilation_iterations {
            connected = imageproc::morphology::dilate(&connected, Norm::LInf, radius);
        }
    }

    let mut mask = WireMask::from_image(connected);
    let before = mask.wire_pixel_count();
    mask_components(&mut mask, components, options);
    tracing::debug!(
        "Wire mask {}x{}: {} wire pixels, {} after cutting {} component bodies",
        mask.width(),
        mask.height(),
        before,
        mask.wire_pixel_count(),
        components.len()
    );

    mask
}

/// Zero an inset rectangle inside every component's bounding box
pub fn mask_components(mask: &mut WireMask, components: &[ComponentRecord], options: &MaskOptions) {
    for component in components {
        if let Some((x1, y1, x2, y2)) = body_rect(component, mask, options) {
            mask.fill_rect(x1, y1, x2, y2, false);
        }
    }
}

/// Inset body rectangle in mask coordinates, `None` for degenerate or off-image boxes
fn body_rect(
    component: &ComponentRecord,
    mask: &WireMask,
    options: &MaskOptions,
) -> Option<(u32, u32, u32, u32)> {
    let bbox = component.bounding_box;
    if bbox.is_degenerate() || mask.width() == 0 || mask.height() == 0 {
        return None;
    }

    let (width, height) = (bbox.width(), bbox.height());
    let shrink_x = if width >= height {
        options.long_side_margin
    } else {
        options.short_side_margin
    };
    let shrink_y = if height >= width {
        options.long_side_margin
    } else {
        options.short_side_margin
    };

    let x1 = bbox.x1.saturating_add(shrink_x).max(0);
    let y1 = bbox.y1.saturating_add(shrink_y).max(0);
    let x2 = bbox.x2.saturating_sub(shrink_x).max(0);
    let y2 = bbox.y2.saturating_sub(shrink_y).max(0);

    // A small box insets past its centre; the crossed corners still span a band
    let (x1, x2) = (x1.min(x2), x1.max(x2));
    let (y1, y2) = (y1.min(y2), y1.max(y2));

    let max_x = i64::from(mask.width()) - 1;
    let max_y = i64::from(mask.height()) - 1;
    if x1 > max_x || y1 > max_y {
        return None;
    }

    Some((
        x1 as u32,
        y1 as u32,
        x2.min(max_x) as u32,
        y2.min(max_y) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;

    fn full_mask(width: u32, height: u32) -> WireMask {
        let mut mask = WireMask::new(width, height);
        mask.fill_rect(0, 0, width - 1, height - 1, true);
        mask
    }

    fn component(x1: i64, y1: i64, x2: i64, y2: i64) -> ComponentRecord {
        ComponentRecord::new("R_1", BoundingBox::new(x1, y1, x2, y2), vec![])
    }

    #[test]
    fn test_wide_box_uses_long_margin_horizontally() {
        let mut mask = full_mask(100, 60);
        mask_components(&mut mask, &[component(10, 10, 70, 40)], &MaskOptions::default());

        // Cut spans x 22..=58, y 15..=35
        assert!(mask.is_wire(21, 20));
        assert!(!mask.is_wire(22, 20));
        assert!(!mask.is_wire(58, 20));
        assert!(mask.is_wire(59, 20));
        assert!(mask.is_wire(30, 14));
        assert!(!mask.is_wire(30, 15));
        assert!(!mask.is_wire(30, 35));
        assert!(mask.is_wire(30, 36));
    }

    #[test]
    fn test_tall_box_uses_long_margin_vertically() {
        let mut mask = full_mask(60, 100);
        mask_components(&mut mask, &[component(10, 10, 40, 70)], &MaskOptions::default());

        assert!(mask.is_wire(14, 30));
        assert!(!mask.is_wire(15, 30));
        assert!(mask.is_wire(20, 21));
        assert!(!mask.is_wire(20, 22));
    }

    #[test]
    fn test_thin_box_cuts_crossed_band() {
        let mut mask = full_mask(80, 40);
        // 60x8 box: the vertical inset crosses over, leaving y 13..=15
        mask_components(&mut mask, &[component(10, 10, 70, 18)], &MaskOptions::default());

        assert!(!mask.is_wire(40, 14));
        assert!(!mask.is_wire(22, 13));
        assert!(!mask.is_wire(58, 15));
        assert!(mask.is_wire(21, 14));
        assert!(mask.is_wire(59, 14));
        assert!(mask.is_wire(40, 12));
        assert!(mask.is_wire(40, 16));
    }

    #[test]
    fn test_small_box_crossed_on_both_axes() {
        let mut mask = full_mask(50, 50);
        // 20x8 box: x 22/18 and y 15/13 both cross
        mask_components(&mut mask, &[component(10, 10, 30, 18)], &MaskOptions::default());

        assert!(!mask.is_wire(20, 14));
        assert!(!mask.is_wire(18, 13));
        assert!(!mask.is_wire(22, 15));
        assert!(mask.is_wire(17, 14));
        assert!(mask.is_wire(20, 16));
        assert_eq!(mask.wire_pixel_count(), 50 * 50 - 5 * 3);
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let mut mask = full_mask(20, 20);
        let huge = component(i64::MIN, i64::MIN, i64::MAX, i64::MAX);
        mask_components(&mut mask, &[huge], &MaskOptions::default());
        assert_eq!(mask.wire_pixel_count(), 0);
    }

    #[test]
    fn test_degenerate_box_is_noop() {
        let mut mask = full_mask(20, 20);
        mask_components(&mut mask, &[component(5, 5, 5, 15)], &MaskOptions::default());
        assert_eq!(mask.wire_pixel_count(), 400);
    }

    #[test]
    fn test_box_past_image_edge_is_clipped() {
        let mut mask = full_mask(40, 40);
        mask_components(&mut mask, &[component(-20, -20, 80, 30)], &MaskOptions::default());

        assert!(!mask.is_wire(0, 0));
        assert!(!mask.is_wire(39, 25));
        assert!(mask.is_wire(10, 26));
    }

    #[test]
    fn test_build_mask_on_blank_image_is_empty() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([255])));
        let mask = build_mask(&image, &[], &MaskOptions::default());
        assert_eq!(mask.wire_pixel_count(), 0);
    }

    #[test]
    fn test_build_mask_thickens_drawn_line() {
        let mut gray = GrayImage::from_pixel(80, 40, Luma([255]));
        for x in 10..70 {
            for y in 18..21 {
                gray.put_pixel(x, y, Luma([0]));
            }
        }

        let mask = build_mask(&DynamicImage::ImageLuma8(gray), &[], &MaskOptions::default());
        assert!(mask.is_wire(40, 20));
        assert!(mask.is_wire(40, 16));
        assert!(!mask.is_wire(40, 2));
    }
}
