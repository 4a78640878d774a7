pub mod export;

pub use export::{LineWriter, format_record, open_output};
