pub mod app;
pub mod config;
pub mod csv_loader;
pub mod intake;
pub mod logging;
pub mod utils;
