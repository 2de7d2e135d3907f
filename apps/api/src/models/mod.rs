pub mod assets;
pub mod content;
