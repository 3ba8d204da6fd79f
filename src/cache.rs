pub mod directory;
pub mod frame_cache;
