// Crate root for the gesture broadcast server modules.

pub mod app;
pub mod config;
pub mod constants;
pub mod http;
pub mod hub;
pub mod model;
pub mod net;
pub mod source;
pub mod tasks;
pub mod utils;
pub mod ws;
