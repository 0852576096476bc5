pub mod export_manager;

pub use export_manager::*;
