pub mod api;
pub mod candidate;
pub mod chunk;
