//! Output formats
//!
//! - `svg`: render a layout (overview or CPU detail) as an SVG document
//! - `model_file`: save the loaded tracing model verbatim and load it back

pub mod model_file;
pub mod svg;

pub use model_file::{load_model, save_model, save_path, DEFAULT_MODEL_FILE_NAME};
pub use svg::{export_svg, render_svg, write_svg, SvgSurface};
