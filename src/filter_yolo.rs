use clap::Parser;
use log::{error, info};

use labels2yolo::{process_filter_dataset, ClassFilter, FilterArgs};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = FilterArgs::parse();

    if !args.input.is_dir() {
        error!("The specified input does not exist: {}", args.input.display());
        std::process::exit(1);
    }

    info!("Keeping classes {:?}, merged into class 0", args.classes.0);

    let filter = ClassFilter::new(args.classes.0.iter().copied());
    match process_filter_dataset(&args.input, &filter) {
        Ok(stats) => stats.print_summary(),
        Err(e) => {
            error!("Failed to filter dataset: {}", e);
            std::process::exit(1);
        }
    }
}
