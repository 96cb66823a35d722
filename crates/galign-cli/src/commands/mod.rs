pub mod alpha;
pub mod experiment;
pub mod method;
pub mod sweep;
