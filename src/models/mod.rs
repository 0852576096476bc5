pub mod sales_models;
pub mod sales_table;

pub use sales_models::*;
pub use sales_table::*;
