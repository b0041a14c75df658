//! Presentation documents: typed model, override merging and loading.

pub mod load;
pub mod merge;
pub mod model;
