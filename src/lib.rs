pub mod browser;
pub mod cli;
pub mod lifecycle;
pub mod options;
pub mod page;
pub mod paper;
pub mod render;

pub use render::render;
