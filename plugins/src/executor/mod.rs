pub mod renderers;
pub mod strategies;

pub use renderers::{format_table, JsonlRendererPlugin, TextRendererPlugin};
pub use strategies::{AdaptiveConcurrencyPlugin, FixedConcurrencyPlugin};
