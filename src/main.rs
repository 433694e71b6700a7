mod app;
mod bloom;
mod camera;
mod catalog;
mod config;
mod input;
mod logging;
mod math;
mod raycast;
mod scene;
mod shade;
mod surface;
mod term;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = config::Cli::parse();
    app::run(cli)
}
