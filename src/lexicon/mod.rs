pub mod lexicon;
pub mod term;
