pub mod build;
pub mod load;
pub mod model;
pub mod rank;

pub use build::build_graph;
pub use load::{RawDataset, load_dataset, parse_dataset};
pub use model::{Confidence, Edge, Graph, Layer, Node, NodeKind, RelationType};
