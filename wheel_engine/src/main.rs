use anyhow::Result;
use clap::Parser;

mod bridge;
mod cli;
mod geometry;
mod menu;
mod paginate;
mod render;
mod session;

use cli::Args;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    session::execute(args)
}
