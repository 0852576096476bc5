pub mod controls;
pub mod presenter;
pub mod render;
pub mod session;

pub use controls::*;
pub use presenter::*;
pub use render::*;
pub use session::*;
