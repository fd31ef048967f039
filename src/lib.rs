//! Domain-grid layout and progressive disclosure for supply-chain bottleneck graphs.
//!
//! Raw records go through [`graph::build_graph`] (classification and tightness scoring),
//! then a [`session::GraphSession`] owns expansion state and lays the visible subset out
//! into bounded domain cells.

pub mod classify;
pub mod config;
pub mod disclosure;
pub mod error;
pub mod graph;
pub mod highlight;
pub mod layout;
pub mod report;
pub mod scoring;
pub mod session;
pub mod transition;
pub mod util;

pub use config::EngineConfig;
pub use error::LayoutError;
pub use session::{Command, Dispatch, GraphSession};
