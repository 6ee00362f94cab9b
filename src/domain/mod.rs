pub mod controls;
pub mod month;
pub mod result;

pub use controls::*;
pub use month::*;
pub use result::*;
