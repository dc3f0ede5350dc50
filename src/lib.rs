pub mod config;
pub mod driver;
pub mod error;
pub mod headless;
pub mod logging;
pub mod menubar;
pub mod preview;
pub mod render;
pub mod source;
pub mod terminal;
pub mod types;
pub mod viewer;
