pub mod pass;
pub mod status;
pub mod worker;

pub use pass::*;
pub use status::*;
pub use worker::*;
