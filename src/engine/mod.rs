pub mod cooccurrence;
pub mod engine;
pub mod frequency;
pub mod pool;
pub mod progress;
pub mod table;
