pub mod content;
pub mod render;
