mod convert;
mod format;

pub use convert::raw_to_ui;
pub use format::short_id;
