pub mod load;
pub mod types;

pub use load::{apply_env_overrides, get_calcflow_data_dir, load_default, load_from};
pub use types::*;
