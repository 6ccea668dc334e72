//! Debug rasters for eyeballing an extraction. None of this feeds the
//! netlist.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use std::collections::{HashMap, HashSet};

use super::mask::WireMask;
use super::nodes::NodeAssignment;
use super::regions::RegionMap;
use crate::detection::ComponentRecord;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TERMINAL_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const GROUND_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const NODE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const WIRE_GRAY: Rgb<u8> = Rgb([128, 128, 128]);

/// tab20
const PALETTE: [[u8; 3]; 20] = [
    [31, 119, 180],
    [174, 199, 232],
    [255, 127, 14],
    [255, 187, 120],
    [44, 160, 44],
    [152, 223, 138],
    [214, 39, 40],
    [255, 152, 150],
    [148, 103, 189],
    [197, 176, 213],
    [140, 86, 75],
    [196, 156, 148],
    [227, 119, 194],
    [247, 182, 210],
    [127, 127, 127],
    [199, 199, 199],
    [188, 189, 34],
    [219, 219, 141],
    [23, 190, 207],
    [158, 218, 229],
];

fn palette_color(id: u32) -> Rgb<u8> {
    Rgb(PALETTE[(id.saturating_sub(1) as usize) % PALETTE.len()])
}

const OFF_CANVAS: i64 = 16;

/// Clamp a detector coordinate to just outside the canvas
fn clip(v: i64, limit: u32) -> i32 {
    v.clamp(-OFF_CANVAS, i64::from(limit) + OFF_CANVAS) as i32
}

/// Source image with detector boxes and terminals drawn on top
pub fn render_detections(image: &DynamicImage, components: &[ComponentRecord]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (width, height) = canvas.dimensions();

    for component in components {
        let bbox = component.bounding_box;
        if !bbox.is_degenerate() {
            let (x1, y1) = (clip(bbox.x1, width), clip(bbox.y1, height));
            let (x2, y2) = (clip(bbox.x2, width), clip(bbox.y2, height));
            // Two nested outlines for a 2px stroke
            for inset in 0..2 {
                let (w, h) = (x2 - x1 - 2 * inset, y2 - y1 - 2 * inset);
                if w > 0 && h > 0 {
                    let rect = Rect::at(x1 + inset, y1 + inset).of_size(w as u32 + 1, h as u32 + 1);
                    draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
                }
            }
        }
        for p in &component.connection_points {
            let center = (clip(p.x, width), clip(p.y, height));
            draw_filled_circle_mut(&mut canvas, center, 5, TERMINAL_COLOR);
        }
    }

    canvas
}

/// Node regions in palette colours, ground regions white, rest black
pub fn render_regions(regions: &RegionMap, assignment: &NodeAssignment) -> RgbImage {
    let colors: HashMap<u32, Rgb<u8>> = assignment
        .nodes
        .iter()
        .map(|n| {
            let color = if n.ground { GROUND_COLOR } else { palette_color(n.id) };
            (n.region, color)
        })
        .collect();

    let mut canvas = RgbImage::new(regions.width(), regions.height());
    for (x, y, label) in regions.labeled_pixels() {
        if let Some(&color) = colors.get(&label) {
            canvas.put_pixel(x, y, color);
        }
    }
    canvas
}

/// Wire mask in gray, node regions in blue, a red dot on each node anchor
pub fn render_nodes(mask: &WireMask, regions: &RegionMap, assignment: &NodeAssignment) -> RgbImage {
    let mut canvas = RgbImage::new(mask.width(), mask.height());
    for (x, y, p) in mask.as_image().enumerate_pixels() {
        if p.0[0] != 0 {
            canvas.put_pixel(x, y, WIRE_GRAY);
        }
    }

    let node_regions: HashSet<u32> = assignment.nodes.iter().map(|n| n.region).collect();
    for (x, y, label) in regions.labeled_pixels() {
        if node_regions.contains(&label) {
            canvas.put_pixel(x, y, NODE_COLOR);
        }
    }

    for node in &assignment.nodes {
        draw_filled_circle_mut(
            &mut canvas,
            (node.anchor.x as i32, node.anchor.y as i32),
            7,
            MARKER_COLOR,
        );
    }
    canvas
}
