pub mod config;
pub mod diagnostics;
pub mod features;
pub mod gate;
pub mod hardware;
pub mod identity;
pub mod runtime;
