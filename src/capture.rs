pub mod source;
pub mod media;
