use clap::Parser;
use log::error;

use labels2yolo::{process_draw, DrawArgs};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = DrawArgs::parse();

    match process_draw(&args.input) {
        Ok((_, stats)) => stats.print_summary(),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
