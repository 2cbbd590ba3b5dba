pub mod fallback;
pub mod generation;
pub mod sanitizer;
pub mod speech;
