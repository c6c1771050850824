//! Commands invoked by the user interface

pub mod diagnostics;
pub mod projects;
pub mod settings;
