use clap::Parser;
use log::{error, info};

use labels2yolo::{process_neon_dataset, NeonArgs};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = NeonArgs::parse();

    if !args.input.is_dir() {
        error!("The specified input does not exist: {}", args.input.display());
        std::process::exit(1);
    }

    info!("Starting NEON to YOLO conversion...");

    match process_neon_dataset(&args.input, args.split, args.seed) {
        Ok(stats) => {
            stats.print_summary();
            info!("Conversion process completed successfully.");
        }
        Err(e) => {
            error!("Failed to process dataset: {}", e);
            std::process::exit(1);
        }
    }
}
