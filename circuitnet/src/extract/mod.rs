//! Node Extraction
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │    Image +   │───▶│  Wire Mask   │───▶│    Region    │
//! │  Detections  │    │   Builder    │    │   Labeler    │
//! └──────────────┘    └──────────────┘    └──────┬───────┘
//!                                                │
//!                                                ▼
//!                                        ┌──────────────┐
//!                                        │     Node     │───▶ Netlist
//!                                        │   Assigner   │
//!                                        └──────────────┘
//! ```
//!
//! All state is local to one image; nothing is cached between calls.

pub mod debug;
pub mod mask;
pub mod nodes;
pub mod regions;

pub use mask::{build_mask, mask_components, MaskOptions, WireMask};
pub use nodes::{assign_nodes, NodeAssignment, NodeInfo, NodeOptions};
pub use regions::{label_regions, Anchor, Connectivity, RegionMap};

use image::DynamicImage;

use crate::detection::ComponentRecord;

/// Options for one extraction run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionOptions {
    pub mask: MaskOptions,
    pub connectivity: Connectivity,
    pub nodes: NodeOptions,
}

/// Every intermediate of one extraction, kept for debug rendering
#[derive(Debug, Clone)]
pub struct Extraction {
    pub mask: WireMask,
    pub regions: RegionMap,
    pub assignment: NodeAssignment,
}

/// Run mask building, region labelling and node assignment on one image
pub fn extract(
    image: &DynamicImage,
    components: &[ComponentRecord],
    options: &ExtractionOptions,
) -> Extraction {
    let mask = build_mask(image, components, &options.mask);
    extract_from_mask(mask, components, options)
}

/// Same as [`extract`] for a wire mask produced elsewhere
pub fn extract_from_mask(
    mask: WireMask,
    components: &[ComponentRecord],
    options: &ExtractionOptions,
) -> Extraction {
    let regions = label_regions(&mask, options.connectivity);
    let assignment = assign_nodes(&regions, components, &options.nodes);
    Extraction {
        mask,
        regions,
        assignment,
    }
}
