pub mod memory;
pub mod reader;
