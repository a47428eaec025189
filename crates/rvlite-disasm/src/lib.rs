pub mod analyze;
pub mod model;

pub use analyze::{analyze_entries, target_labels, Analysis, Edge, EdgeKind};
pub use model::{load_text_bin, read_u32, Image};
