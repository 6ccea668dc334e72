//! Extract a netlist from a circuit image and its detector output.

use circuitnet::prelude::*;
use std::path::{Path, PathBuf};

fn main() -> Result<(), CircuitNetError> {
    let mut args = std::env::args().skip(1);
    let (Some(image), Some(detections)) = (args.next(), args.next()) else {
        eprintln!(
            "Usage: cargo run --example extract_netlist <image.png> <circuit_info.json> [debug_dir]"
        );
        std::process::exit(1);
    };
    let debug_dir = args.next().map(PathBuf::from);

    let result = CircuitNetCore::extract_file(
        Path::new(&image),
        Path::new(&detections),
        &ExtractionOptions::default(),
        debug_dir.as_deref(),
    )?;

    println!(
        "{} detections, {} nodes",
        result.components, result.assignment.node_count
    );
    print!("{}", result.netlist());
    for artifact in &result.artifacts {
        println!("wrote {}", artifact.display());
    }
    Ok(())
}
