//! Region Labeler
//!
//! Connected-component labelling of the wire mask. Every maximal connected
//! set of wire pixels becomes a region with a non-zero label; background is
//! label 0. Label values carry no ordering meaning; the only stable order is
//! geometric, through [`RegionMap::top_left`].

use image::{ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity as PixelConnectivity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::mask::WireMask;

/// Background label
pub const BACKGROUND_LABEL: u32 = 0;

/// Pixel adjacency used when growing regions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connectivity {
    /// Edge-adjacent neighbours only
    #[default]
    Four,
    /// Edge- and corner-adjacent neighbours
    Eight,
}

impl From<Connectivity> for PixelConnectivity {
    fn from(c: Connectivity) -> Self {
        match c {
            Connectivity::Four => PixelConnectivity::Four,
            Connectivity::Eight => PixelConnectivity::Eight,
        }
    }
}

/// Top-left-most pixel of a region: smallest row, then smallest column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Anchor {
    pub y: u32,
    pub x: u32,
}

/// Labelled wire mask
#[derive(Debug, Clone)]
pub struct RegionMap {
    labels: ImageBuffer<Luma<u32>, Vec<u32>>,
    anchors: BTreeMap<u32, Anchor>,
}

impl RegionMap {
    /// Wrap a label image. Anchors are recomputed from the pixels.
    pub fn from_labels(labels: ImageBuffer<Luma<u32>, Vec<u32>>) -> Self {
        let mut anchors = BTreeMap::new();
        for (x, y, p) in labels.enumerate_pixels() {
            let label = p.0[0];
            if label != BACKGROUND_LABEL {
                // Row-major scan: the first hit is the top-left-most pixel
                anchors.entry(label).or_insert(Anchor { y, x });
            }
        }
        Self { labels, anchors }
    }

    pub fn width(&self) -> u32 {
        self.labels.width()
    }

    pub fn height(&self) -> u32 {
        self.labels.height()
    }

    pub fn region_count(&self) -> usize {
        self.anchors.len()
    }

    /// Label at a pixel; background outside the image
    pub fn label_at(&self, x: u32, y: u32) -> u32 {
        if x < self.width() && y < self.height() {
            self.labels.get_pixel(x, y).0[0]
        } else {
            BACKGROUND_LABEL
        }
    }

    pub fn top_left(&self, label: u32) -> Option<Anchor> {
        self.anchors.get(&label).copied()
    }

    /// Region labels in use
    pub fn labels(&self) -> impl Iterator<Item = u32> + '_ {
        self.anchors.keys().copied()
    }

    /// Labelled pixels as `(x, y, label)` in row-major order
    pub fn labeled_pixels(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        self.labels
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] != BACKGROUND_LABEL)
            .map(|(x, y, p)| (x, y, p.0[0]))
    }

    pub fn as_image(&self) -> &ImageBuffer<Luma<u32>, Vec<u32>> {
        &self.labels
    }
}

/// Partition the wire pixels of `mask` into connected regions
pub fn label_regions(mask: &WireMask, connectivity: Connectivity) -> RegionMap {
    let labels = connected_components(mask.as_image(), connectivity.into(), Luma([0u8]));
    let regions = RegionMap::from_labels(labels);
    tracing::debug!(
        "Labelled {} regions ({:?} connectivity)",
        regions.region_count(),
        connectivity
    );
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bars() -> WireMask {
        let mut mask = WireMask::new(20, 10);
        mask.fill_rect(2, 1, 17, 2, true);
        mask.fill_rect(5, 6, 12, 7, true);
        mask
    }

    #[test]
    fn test_separate_bars_get_separate_regions() {
        let regions = label_regions(&two_bars(), Connectivity::Four);

        assert_eq!(regions.region_count(), 2);
        let top = regions.label_at(2, 1);
        let bottom = regions.label_at(5, 6);
        assert_ne!(top, BACKGROUND_LABEL);
        assert_ne!(bottom, BACKGROUND_LABEL);
        assert_ne!(top, bottom);
        assert_eq!(regions.label_at(17, 2), top);
        assert_eq!(regions.label_at(0, 0), BACKGROUND_LABEL);
    }

    #[test]
    fn test_anchor_is_top_left_most_pixel() {
        let mut mask = WireMask::new(10, 10);
        // L shape whose lowest-x pixel is not on its top row
        mask.fill_rect(5, 2, 8, 2, true);
        mask.fill_rect(1, 3, 5, 3, true);

        let regions = label_regions(&mask, Connectivity::Four);
        let label = regions.label_at(1, 3);
        assert_eq!(regions.top_left(label), Some(Anchor { y: 2, x: 5 }));
    }

    #[test]
    fn test_diagonal_touch_depends_on_connectivity() {
        let mut mask = WireMask::new(4, 4);
        mask.set(1, 1, true);
        mask.set(2, 2, true);

        assert_eq!(label_regions(&mask, Connectivity::Four).region_count(), 2);
        assert_eq!(label_regions(&mask, Connectivity::Eight).region_count(), 1);
    }

    #[test]
    fn test_empty_mask_has_no_regions() {
        let regions = label_regions(&WireMask::new(8, 8), Connectivity::Four);
        assert_eq!(regions.region_count(), 0);
        assert_eq!(regions.labeled_pixels().count(), 0);
    }

    #[test]
    fn test_out_of_bounds_is_background() {
        let regions = label_regions(&two_bars(), Connectivity::Four);
        assert_eq!(regions.label_at(100, 100), BACKGROUND_LABEL);
    }
}
