//! Compare a directory of generated netlists against ground truth.

use circuitnet::prelude::*;
use circuitnet::FileOutcome;
use std::path::Path;

fn main() -> Result<(), CircuitNetError> {
    let mut args = std::env::args().skip(1);
    let (Some(generated), Some(ground_truth)) = (args.next(), args.next()) else {
        eprintln!("Usage: cargo run --example compare_netlists <generated_dir> <ground_truth_dir>");
        std::process::exit(1);
    };

    let report = CircuitNetCore::compare_directories(
        Path::new(&generated),
        Path::new(&ground_truth),
        &VerifyOptions::default(),
    )?;

    for outcome in &report.outcomes {
        if let FileOutcome::Compared(c) = outcome {
            let verdict = if c.equivalent { "match" } else { "no match" };
            println!("{}: {}", c.generated.display(), verdict);
        }
    }
    println!(
        "Accuracy: {:.2}% ({} of {})",
        report.accuracy(),
        report.equivalent(),
        report.compared()
    );
    Ok(())
}
