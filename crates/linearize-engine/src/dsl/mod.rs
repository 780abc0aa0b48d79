//! Problem file formats.

pub mod text;
pub mod yaml;
