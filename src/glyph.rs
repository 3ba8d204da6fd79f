pub mod charset;
pub mod luma;
