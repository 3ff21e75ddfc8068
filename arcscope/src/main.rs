//! # arcscope - Main Entry Point
//!
//! Supports two operational modes:
//! - **Viewer** (`arcscope <MODEL>`): Interactive terminal timeline
//! - **Headless** (`--svg FILE` or `--headless`): Render and/or save without a TUI

use anyhow::{Context, Result};
use arcscope::app::App;
use arcscope::cli::Args;
use arcscope::config::ViewConfig;
use arcscope::domain::ModelError;
use arcscope::export::{export_svg, load_model, save_model, save_path};
use arcscope::tui;
use clap::Parser;
use log::info;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_DATAERR: i32 = 65;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ModelError>() {
        Some(ModelError::Io(_)) | None => EXIT_ERROR,
        Some(_) => EXIT_DATAERR,
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    if !args.quiet {
        println!("arcscope v{}", env!("CARGO_PKG_VERSION"));
    }

    let model = load_model(&args.model)?;
    info!(
        "Loaded {} ({} cpus, {} views, duration {}us)",
        args.model.display(),
        model.system.cpu.len(),
        model.views.len(),
        model.duration
    );

    if !args.is_headless() {
        if args.save.is_some() {
            let path = save_path(args.save.as_deref());
            save_model(&model, &path)?;
            if !args.quiet {
                println!("saved: {}", path.display());
            }
        }
        return tui::run(model, args.detail);
    }

    let mut app = App::new(ViewConfig::svg(args.width));
    app.set_model(model);

    if let Some(timestamp) = args.detail {
        app.open_detail(timestamp, None);
    }

    if let Some(path) = &args.svg {
        let layout = match app.detail() {
            Some(view) => view.layout(),
            None => app.overview().context("no layout to render")?,
        };
        export_svg(layout, path).with_context(|| format!("failed to write {}", path.display()))?;
        if !args.quiet {
            println!("rendered: {}", path.display());
        }
    }

    if args.save.is_some() {
        let path = app.save_model(args.save.as_deref())?;
        if !args.quiet {
            println!("saved: {}", path.display());
        }
    }

    if !args.quiet {
        if let Some(layout) = app.overview() {
            println!(
                "{} bands, {} charts, {} global series",
                layout.bands().len(),
                layout.charts().len(),
                layout.globals().len()
            );
        }
    }

    Ok(())
}
