//! # Directory Scanning
//!
//! Finds the still images in an input folder and puts them in natural
//! filename order (`img2.jpg` before `img10.jpg`).

pub mod natural;
pub mod scanner;

pub use natural::NaturalKey;
pub use scanner::{scan_directory, ExtensionFilter, ImageFileEntry};
