//! CircuitNet CLI - netlist extraction and netlist comparison from the command line.

use circuitnet::{
    BatchReport, CircuitNetCore, Comparison, Connectivity, ExtractionOptions, ExtractionResult,
    FileOutcome, VerifyOptions,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use tracing::Level;

#[derive(Parser)]
#[command(name = "circuitnet")]
#[command(about = "Circuit diagram netlist extraction and verification tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a netlist from a circuit image and its detector output
    Extract {
        /// Circuit diagram image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Detector JSON with component boxes and connection points
        #[arg(value_name = "DETECTIONS")]
        detections: PathBuf,

        /// Write the netlist to this file
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Write debug images into this directory
        #[arg(long, value_name = "DIR")]
        debug_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Pixel adjacency for wire regions
        #[arg(long, value_enum, default_value = "four")]
        connectivity: ConnectivityArg,
    },

    /// Check whether a generated netlist matches its ground truth
    Verify {
        /// Generated netlist
        #[arg(value_name = "GENERATED")]
        generated: PathBuf,

        /// Ground-truth netlist
        #[arg(value_name = "GROUND_TRUTH")]
        ground_truth: PathBuf,

        /// Require equal component counts
        #[arg(long)]
        strict: bool,

        /// Only pair components of the same type
        #[arg(long)]
        match_types: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Compare every generated netlist with the same-named ground truth
    VerifyDir {
        /// Directory of generated netlists
        #[arg(value_name = "GENERATED_DIR")]
        generated_dir: PathBuf,

        /// Directory of ground-truth netlists
        #[arg(value_name = "GROUND_TRUTH_DIR")]
        ground_truth_dir: PathBuf,

        /// Require equal component counts
        #[arg(long)]
        strict: bool,

        /// Only pair components of the same type
        #[arg(long)]
        match_types: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if accuracy (percent) is below this value
        #[arg(long, value_name = "PCT")]
        fail_under: Option<f64>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ConnectivityArg {
    Four,
    Eight,
}

impl From<ConnectivityArg> for Connectivity {
    fn from(arg: ConnectivityArg) -> Self {
        match arg {
            ConnectivityArg::Four => Connectivity::Four,
            ConnectivityArg::Eight => Connectivity::Eight,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Extract {
            image,
            detections,
            output,
            debug_dir,
            format,
            connectivity,
        } => handle_extract(
            &image,
            &detections,
            output.as_deref(),
            debug_dir.as_deref(),
            format,
            connectivity,
        ),
        Commands::Verify {
            generated,
            ground_truth,
            strict,
            match_types,
            format,
        } => handle_verify(
            &generated,
            &ground_truth,
            verify_options(strict, match_types),
            format,
        ),
        Commands::VerifyDir {
            generated_dir,
            ground_truth_dir,
            strict,
            match_types,
            format,
            fail_under,
        } => handle_verify_dir(
            &generated_dir,
            &ground_truth_dir,
            verify_options(strict, match_types),
            format,
            fail_under,
        ),
    };

    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn verify_options(strict: bool, match_types: bool) -> VerifyOptions {
    VerifyOptions {
        strict,
        match_types,
    }
}

fn handle_extract(
    image: &Path,
    detections: &Path,
    output: Option<&Path>,
    debug_dir: Option<&Path>,
    format: OutputFormat,
    connectivity: ConnectivityArg,
) -> i32 {
    let options = ExtractionOptions {
        connectivity: connectivity.into(),
        ..ExtractionOptions::default()
    };

    let result = match CircuitNetCore::extract_file(image, detections, &options, debug_dir) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if let Some(path) = output {
        if let Err(e) = CircuitNetCore::write_netlist(path, result.netlist()) {
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    match format {
        OutputFormat::Human => output_extraction_human(&result, output),
        OutputFormat::Json => output_extraction_json(&result, output),
    }
    0
}

fn handle_verify(
    generated: &Path,
    ground_truth: &Path,
    options: VerifyOptions,
    format: OutputFormat,
) -> i32 {
    match CircuitNetCore::compare_files(generated, ground_truth, &options) {
        Ok(comparison) => {
            match format {
                OutputFormat::Human => output_comparison_human(&comparison),
                OutputFormat::Json => output_comparison_json(&comparison),
            }
            if comparison.equivalent {
                0
            } else {
                1
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn handle_verify_dir(
    generated_dir: &Path,
    ground_truth_dir: &Path,
    options: VerifyOptions,
    format: OutputFormat,
    fail_under: Option<f64>,
) -> i32 {
    match CircuitNetCore::compare_directories(generated_dir, ground_truth_dir, &options) {
        Ok(report) => {
            match format {
                OutputFormat::Human => output_report_human(&report),
                OutputFormat::Json => output_report_json(&report),
            }
            match fail_under {
                Some(threshold) if report.accuracy() < threshold => 1,
                _ => 0,
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn output_extraction_human(result: &ExtractionResult, output: Option<&Path>) {
    let assignment = &result.assignment;

    println!("\nImage: {}", result.image.display());
    println!("{}", "─".repeat(60));
    if assignment.netlist.is_empty() {
        println!("  No connected components found");
    }
    for entry in &assignment.netlist {
        println!("  {}", entry);
    }

    println!("\n  Summary:");
    println!("    Detections: {}", result.components);
    println!("    Listed:     {}", assignment.netlist.len());
    println!("    Nodes:      {}", assignment.node_count);
    if !assignment.ground_nodes.is_empty() {
        let ground: Vec<String> = assignment.ground_nodes.iter().map(u32::to_string).collect();
        println!("    Ground:     {}", ground.join(", "));
    }
    if let Some(path) = output {
        println!("\n  Netlist written to {}", path.display());
    }
    for artifact in &result.artifacts {
        println!("  Debug image: {}", artifact.display());
    }
}

fn output_extraction_json(result: &ExtractionResult, output: Option<&Path>) {
    let assignment = &result.assignment;
    let value = serde_json::json!({
        "image": result.image.display().to_string(),
        "detections": result.components,
        "netlist": assignment.netlist.entries,
        "node_count": assignment.node_count,
        "ground_nodes": assignment.ground_nodes,
        "nodes": assignment.nodes,
        "output": output.map(|p| p.display().to_string()),
        "artifacts": result.artifacts.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
    });
    print_json(&value);
}

fn output_comparison_human(comparison: &Comparison) {
    println!("\nGenerated:    {}", comparison.generated.display());
    println!("Ground truth: {}", comparison.ground_truth.display());
    println!("{}", "─".repeat(60));

    match &comparison.correspondence {
        Some(found) => {
            println!("  MATCH");
            println!("\n  Node mapping (ground truth -> generated):");
            for (truth, test) in &found.node_mapping {
                println!("    {} -> {}", truth, test);
            }
        }
        None => println!("  NO MATCH"),
    }
}

fn output_comparison_json(comparison: &Comparison) {
    let value = serde_json::json!({
        "generated": comparison.generated.display().to_string(),
        "ground_truth": comparison.ground_truth.display().to_string(),
        "equivalent": comparison.equivalent,
        "correspondence": comparison.correspondence,
    });
    print_json(&value);
}

fn output_report_human(report: &BatchReport) {
    println!();
    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Compared(c) => println!(
                "  {:<9} {}",
                if c.equivalent { "MATCH" } else { "NO MATCH" },
                c.generated.display()
            ),
            FileOutcome::Skipped { generated } => {
                println!("  {:<9} {} (no ground truth)", "SKIPPED", generated.display())
            }
            FileOutcome::Failed { generated, error } => {
                println!("  {:<9} {}: {}", "FAILED", generated.display(), error)
            }
        }
    }

    println!("\n  Summary:");
    println!("    Compared:   {}", report.compared());
    println!("    Equivalent: {}", report.equivalent());
    println!("    Skipped:    {}", report.skipped());
    println!("    Failed:     {}", report.failed());
    println!("    Accuracy:   {:.2}%", report.accuracy());
}

fn output_report_json(report: &BatchReport) {
    let value = serde_json::json!({
        "outcomes": report.outcomes,
        "summary": {
            "compared": report.compared(),
            "equivalent": report.equivalent(),
            "skipped": report.skipped(),
            "failed": report.failed(),
            "accuracy": report.accuracy(),
        }
    });
    print_json(&value);
}
