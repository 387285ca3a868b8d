pub mod jsonl;
pub mod text;

pub use jsonl::JsonlRendererPlugin;
pub use text::{format_table, TextRendererPlugin};
