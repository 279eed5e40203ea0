use clap::Parser;
use log::{error, info};

use labels2yolo::io::create_dataset_yaml;
use labels2yolo::{process_dota_dataset, ClassRegistry, DotaArgs};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = DotaArgs::parse();

    if !args.input.is_dir() {
        error!("The specified input does not exist: {}", args.input.display());
        std::process::exit(1);
    }

    info!("Starting DOTA to YOLO conversion...");

    let mut classes = ClassRegistry::with_allow_list(&args.classes);
    match process_dota_dataset(&args.input, &mut classes) {
        Ok(stats) => stats.print_summary(),
        Err(e) => {
            error!("Failed to process dataset: {}", e);
            std::process::exit(1);
        }
    }

    for (name, id) in classes.mapping() {
        info!("Class {}: {}", id, name);
    }
    println!("{}", classes);

    if args.write_yaml {
        match create_dataset_yaml(&args.input, &classes) {
            Ok(path) => info!("Wrote {}", path.display()),
            Err(e) => {
                error!("Failed to create dataset.yaml: {}", e);
                std::process::exit(1);
            }
        }
    }
}
