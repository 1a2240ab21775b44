pub mod error;
pub mod instruction;
pub mod map;
pub mod grid;
pub mod engine;
pub mod session;
pub mod batch;
