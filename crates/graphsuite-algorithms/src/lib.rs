pub mod common;
pub mod centrality;
pub mod pagerank;
pub mod pathfinding;

pub use common::{GraphView, NodeId};
pub use centrality::betweenness_centrality;
pub use pagerank::{page_rank, PageRankConfig};
pub use pathfinding::{k_shortest_paths, PathResult};
