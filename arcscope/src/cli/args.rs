//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_SVG_WIDTH;
use crate::domain::Micros;
use crate::export::DEFAULT_MODEL_FILE_NAME;

#[derive(Parser)]
#[command(
    name = "arcscope",
    version,
    about = "Browse graphics tracing models: pipeline bands, CPU activity and counters",
    after_help = "\
EXAMPLES:
    arcscope trace.json                          Interactive viewer
    arcscope trace.json --svg overview.svg       Render the overview to SVG
    arcscope trace.json --svg cpu.svg --detail 1500000
                                                 Render the CPU detail around 1.5s
    arcscope trace.json --headless --save        Validate and save a copy"
)]
pub struct Args {
    /// Tracing model file (JSON)
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Render to an SVG file instead of opening the viewer
    #[arg(long, value_name = "FILE")]
    pub svg: Option<PathBuf>,

    /// Open the CPU detail view centered on this timestamp (microseconds)
    #[arg(long, value_name = "TS", allow_negative_numbers = true)]
    pub detail: Option<Micros>,

    /// SVG content width in pixels
    #[arg(long, value_name = "PX", default_value_t = DEFAULT_SVG_WIDTH)]
    pub width: u32,

    /// Save the loaded model (to FILE, or a directory, or the working directory)
    #[arg(
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_MODEL_FILE_NAME
    )]
    pub save: Option<PathBuf>,

    /// Run without TUI
    #[arg(long)]
    pub headless: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Whether to skip the interactive viewer
    #[must_use]
    pub fn is_headless(&self) -> bool {
        self.headless || self.svg.is_some()
    }
}
