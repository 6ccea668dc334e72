//! Node Assigner
//!
//! Resolves every component terminal to the wire region it touches, merges
//! terminals on the same region into one electrical node and numbers the
//! nodes canonically by the position of each region's top-left-most pixel.
//!
//! Resolution order for a terminal:
//! 1. Terminal outside the image: skipped.
//! 2. Direct hit: the terminal pixel, or else the first labelled pixel (row
//!    major) inside the `neighborhood` window around it.
//! 3. Fallback: the region of the Euclidean-nearest labelled pixel anywhere
//!    in the image. Detector keypoints often land a few pixels off the
//!    stroke.
//! 4. No labelled pixel at all: the terminal is unconnected.

use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::{BTreeSet, HashMap};

use super::regions::{Anchor, RegionMap, BACKGROUND_LABEL};
use crate::detection::{ComponentRecord, Point};
use crate::netlist::{Netlist, NetlistEntry};

/// Tuning for [`assign_nodes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOptions {
    /// Side of the square window searched around a terminal
    pub neighborhood: u32,
    /// Fall back to the nearest labelled pixel when the window is empty
    pub nearest_fallback: bool,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            neighborhood: 3,
            nearest_fallback: true,
        }
    }
}

/// One electrical node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Canonical ID, ordered by `anchor`
    pub id: u32,
    /// Region label in the [`RegionMap`] this node was derived from
    pub region: u32,
    pub anchor: Anchor,
    /// A ground symbol touches this node
    pub ground: bool,
    /// ID from the first pass, in terminal-processing order
    pub first_seen: u32,
}

/// Output of node assignment for one image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAssignment {
    pub netlist: Netlist,
    pub node_count: usize,
    pub ground_nodes: BTreeSet<u32>,
    pub nodes: Vec<NodeInfo>,
}

impl NodeAssignment {
    pub fn node(&self, id: u32) -> Option<&NodeInfo> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Canonical node ID of a region label, if that region became a node
    pub fn node_for_region(&self, region: u32) -> Option<u32> {
        self.nodes.iter().find(|n| n.region == region).map(|n| n.id)
    }
}

/// Maps terminal points to region labels
struct TerminalResolver<'a> {
    regions: &'a RegionMap,
    half: i64,
    nearest_fallback: bool,
    wire_pixels: OnceCell<Vec<(u32, u32, u32)>>,
}

impl<'a> TerminalResolver<'a> {
    fn new(regions: &'a RegionMap, options: &NodeOptions) -> Self {
        Self {
            regions,
            half: i64::from(options.neighborhood / 2),
            nearest_fallback: options.nearest_fallback,
            wire_pixels: OnceCell::new(),
        }
    }

    fn resolve(&self, point: Point) -> Option<u32> {
        let (w, h) = (i64::from(self.regions.width()), i64::from(self.regions.height()));
        if point.x < 0 || point.y < 0 || point.x >= w || point.y >= h {
            tracing::trace!("Terminal ({}, {}) outside {}x{} image", point.x, point.y, w, h);
            return None;
        }

        if let Some(label) = self.direct(point, w, h) {
            return Some(label);
        }

        if self.nearest_fallback {
            let nearest = self.nearest(point);
            if let Some(label) = nearest {
                tracing::trace!(
                    "Terminal ({}, {}) resolved to region {} via nearest wire",
                    point.x,
                    point.y,
                    label
                );
            }
            return nearest;
        }

        None
    }

    fn direct(&self, point: Point, w: i64, h: i64) -> Option<u32> {
        let center = self.regions.label_at(point.x as u32, point.y as u32);
        if center != BACKGROUND_LABEL {
            return Some(center);
        }

        let (y0, y1) = ((point.y - self.half).max(0), (point.y + self.half).min(h - 1));
        let (x0, x1) = ((point.x - self.half).max(0), (point.x + self.half).min(w - 1));
        for y in y0..=y1 {
            for x in x0..=x1 {
                let label = self.regions.label_at(x as u32, y as u32);
                if label != BACKGROUND_LABEL {
                    return Some(label);
                }
            }
        }
        None
    }

    fn nearest(&self, point: Point) -> Option<u32> {
        let pixels = self
            .wire_pixels
            .get_or_init(|| self.regions.labeled_pixels().collect());

        let mut best: Option<(i64, u32)> = None;
        for &(x, y, label) in pixels {
            let dx = i64::from(x) - point.x;
            let dy = i64::from(y) - point.y;
            let d2 = dx * dx + dy * dy;
            if best.map_or(true, |(bd, _)| d2 < bd) {
                best = Some((d2, label));
            }
        }
        best.map(|(_, label)| label)
    }
}

/// Derive the netlist for one image from its labelled wire regions
pub fn assign_nodes(
    regions: &RegionMap,
    components: &[ComponentRecord],
    options: &NodeOptions,
) -> NodeAssignment {
    let resolver = TerminalResolver::new(regions, options);

    // First pass: provisional IDs in the order regions are first touched
    let mut first_seen: HashMap<u32, u32> = HashMap::new();
    let mut ground_regions: BTreeSet<u32> = BTreeSet::new();
    let mut listed: Vec<(&ComponentRecord, Vec<u32>)> = Vec::new();

    for component in components {
        let touched: Vec<u32> = component
            .connection_points
            .iter()
            .filter_map(|&p| resolver.resolve(p))
            .collect();

        if component.is_ground() {
            ground_regions.extend(touched);
            continue;
        }

        for &region in &touched {
            let next_id = first_seen.len() as u32 + 1;
            first_seen.entry(region).or_insert(next_id);
        }
        listed.push((component, touched));
    }

    // Second pass: canonical IDs by top-left-most pixel
    let mut ordered: Vec<(Anchor, u32)> = first_seen
        .keys()
        .filter_map(|&region| regions.top_left(region).map(|a| (a, region)))
        .collect();
    ordered.sort();

    let mut canonical: HashMap<u32, u32> = HashMap::new();
    let mut nodes = Vec::with_capacity(ordered.len());
    for (idx, (anchor, region)) in ordered.into_iter().enumerate() {
        let id = idx as u32 + 1;
        canonical.insert(region, id);
        nodes.push(NodeInfo {
            id,
            region,
            anchor,
            ground: ground_regions.contains(&region),
            first_seen: first_seen[&region],
        });
    }

    let mut netlist = Netlist::new();
    for (component, touched) in listed {
        let ids: BTreeSet<u32> = touched
            .iter()
            .filter_map(|region| canonical.get(region).copied())
            .collect();

        if ids.is_empty() {
            tracing::debug!("Dropping {}: no connected nodes", component.label);
            continue;
        }
        netlist
            .entries
            .push(NetlistEntry::new(component.label.clone(), ids.into_iter().collect()));
    }

    let ground_nodes = nodes.iter().filter(|n| n.ground).map(|n| n.id).collect();

    tracing::debug!(
        "Assigned {} nodes to {} of {} components",
        nodes.len(),
        netlist.len(),
        components.len()
    );

    NodeAssignment {
        netlist,
        node_count: nodes.len(),
        ground_nodes,
        nodes,
    }
}
