pub mod regression;

pub use regression::Analyzer;
