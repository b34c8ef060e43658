//! Dataset reading, tree rendering, and result writing for quercus.

mod error;
mod reader;
mod render;
mod writer;

pub use error::IoError;
pub use reader::DatasetReader;
pub use render::{NodeColor, render_forest, write_forest};
pub use writer::{write_predictions, write_summary};
