pub mod schema;
pub mod ascache;
