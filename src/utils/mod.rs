pub mod logging;
pub mod paths;

pub use logging::{filter_directive, init_logging};
