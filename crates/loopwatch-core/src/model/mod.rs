//! Value types passed between the analysis stages.

pub mod cycle;
pub mod record;
pub mod result;
