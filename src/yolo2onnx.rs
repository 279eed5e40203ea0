use clap::Parser;
use log::{error, info};

use labels2yolo::{export_model, ExportArgs};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = ExportArgs::parse();

    if !args.input.is_file() {
        error!("The specified weights do not exist: {}", args.input.display());
        std::process::exit(1);
    }

    match export_model(&args) {
        Ok(paths) => info!("Export completed: {}", paths.quantized.display()),
        Err(e) => {
            error!("Failed to export model: {}", e);
            std::process::exit(1);
        }
    }
}
