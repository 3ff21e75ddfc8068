//! # Arcscope - Graphics Tracing Timeline Viewer
//!
//! Arcscope loads a tracing model (a JSON capture of graphics pipeline, CPU,
//! memory and counter events) and presents it as stacked horizontal bands on
//! a shared time axis, either in the terminal or as an SVG document.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ TraceModel   │──▶│ EventSeries  │──▶│  BandLayout  │
//! │ (JSON file)  │   │ + Sequence   │   │  (overview,  │
//! │              │   │  Classifier  │   │  CPU detail) │
//! └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                              │ Surface
//!                            ┌─────────────────┼─────────────────┐
//!                            ▼                 ▼                 ▼
//!                     ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//!                     │ CellCanvas   │  │ SvgSurface   │  │ Recording    │
//!                     │ (TUI)        │  │ (export)     │  │ (tests)      │
//!                     └──────────────┘  └──────────────┘  └──────────────┘
//! ```
//!
//! ## Module Structure
//!
//! ### Event Index
//!
//! - [`trace_model`]: Model file parsing into typed, time-ordered events
//! - [`series`]: Read-only view over an event sequence with type-filtered queries
//! - [`sequence`]: Pipeline stage ordering and sequence boundaries
//!
//! ### Rendering
//!
//! - [`layout`]: Bands, charts and global marks on a shared time axis
//! - [`overview`]: Builds the main layout from a model
//! - [`detail`]: CPU detail view reconstructing per-thread activity
//! - [`surface`]: Drawing backend trait
//! - [`export`]: SVG output and model save/load
//!
//! ### Interaction
//!
//! - [`interaction`]: Hit testing and tooltip content
//! - [`app`]: Window, detail view and input state
//! - [`tui`]: Terminal viewer
//! - [`cli`]: Command-line argument parsing
//!
//! ### Shared
//!
//! - [`config`]: Geometry for SVG and terminal rendering
//! - [`domain`]: Core types (Micros, Pid, Tid) and errors
//!
//! ## Key Concepts
//!
//! - **Band**: One horizontal strip drawing a single event series
//! - **Sequence**: A run of pipeline stages for one buffer, ended by a terminator
//! - **Global event**: A mark (vsync, jank, custom) drawn across every band
//! - **Window**: The `[min, max]` timestamp range currently on screen

pub mod app;
pub mod cli;
pub mod config;
pub mod detail;
pub mod domain;
pub mod export;
pub mod interaction;
pub mod layout;
pub mod overview;
pub mod sequence;
pub mod series;
pub mod surface;
pub mod trace_model;
pub mod tui;
