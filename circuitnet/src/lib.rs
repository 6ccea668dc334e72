//! CircuitNet - netlists from circuit-diagram images
//!
//! This library turns a diagram image plus the detector's component boxes
//! and terminal keypoints into a netlist (`label node node ...` per
//! component), and checks whether two netlists with unrelated node
//! numbering describe the same circuit.
//!
//! # Quick Start
//!
//! ```no_run
//! use circuitnet::{CircuitNetCore, ExtractionOptions, VerifyOptions};
//! use std::path::Path;
//!
//! let result = CircuitNetCore::extract_file(
//!     Path::new("circuit.png"),
//!     Path::new("circuit_info.json"),
//!     &ExtractionOptions::default(),
//!     None,
//! ).unwrap();
//! print!("{}", result.netlist());
//!
//! let comparison = CircuitNetCore::compare_files(
//!     Path::new("generated/circuit.txt"),
//!     Path::new("ground_truth/circuit.txt"),
//!     &VerifyOptions::default(),
//! ).unwrap();
//! println!("equivalent: {}", comparison.equivalent);
//! ```
//!
//! # Features
//!
//! - **Node extraction**: wire mask, region labelling, terminal-to-node
//!   assignment with canonical node numbering
//! - **Equivalence checking**: backtracking search for a consistent node
//!   renaming between two netlists
//! - **Debug rasters**: detections, node regions and node anchors

pub mod core;
pub mod detection;
pub mod extract;
pub mod netlist;
pub mod verify;

// Re-export main types
pub use crate::core::{
    discover_netlists, BatchReport, CircuitNetCore, CircuitNetError, Comparison,
    ExtractionResult, FileOutcome,
};
pub use detection::{BoundingBox, ComponentRecord, Point};
pub use extract::{
    assign_nodes, build_mask, extract, label_regions, Connectivity, ExtractionOptions,
    NodeAssignment, WireMask,
};
pub use netlist::{Netlist, NetlistEntry};
pub use verify::{find_correspondence, verify, Correspondence, VerifyOptions};

/// Parse a netlist file (convenience wrapper).
pub fn read_netlist(path: &std::path::Path) -> Result<Netlist, CircuitNetError> {
    Netlist::read(path)
}

/// Load a detector JSON file (convenience wrapper).
pub fn read_detections(
    path: &std::path::Path,
) -> Result<Vec<ComponentRecord>, CircuitNetError> {
    detection::load_detections(path)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CircuitNetCore, CircuitNetError, ComponentRecord, ExtractionOptions, Netlist,
        NetlistEntry, VerifyOptions,
    };
}
