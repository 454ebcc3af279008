pub mod codec;
pub mod sparse;
