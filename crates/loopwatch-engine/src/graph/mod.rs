//! Transition graph module.
//!
//! # Overview
//!
//! Builds the petgraph-based directed transition graph the rest of the
//! engine works on, and decomposes it into strongly connected components.
//!
//! ## Pipeline
//!
//! ```text
//! &[TransitionRecord]
//!        ↓  build::TransitionGraph::build()
//! TransitionGraph (DiGraph<station, EdgeSamples>)
//!        ↓  components::ordered_components()
//! Vec<Component> (SCCs, sorted)
//! ```

pub mod build;
pub mod components;

pub use build::{EdgeSamples, TransitionGraph};
pub use components::{Component, ordered_components};
