use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Replays a scripted host session through the wheel menu controller",
    version
)]
pub struct Args {
    /// Path to the JSON replay script (host pushes and user gestures)
    #[arg(long)]
    pub script: PathBuf,

    /// Path to write the per-step render frames and controller events as JSON
    #[arg(long)]
    pub frames_json: Option<PathBuf>,

    /// Path to write the outbound bridge call log as JSON
    #[arg(long)]
    pub event_log_json: Option<PathBuf>,

    /// Path to write the framed outbound wire traffic as raw WheelStream bytes
    #[arg(long)]
    pub wire_capture: Option<PathBuf>,

    /// Print every controller event while replaying
    #[arg(long)]
    pub verbose: bool,
}
