pub mod csv_reader;
pub mod edge_planner;
pub mod import;
pub mod node_planner;
pub mod reconcile;

pub use csv_reader::*;
pub use edge_planner::*;
pub use import::*;
pub use node_planner::*;
pub use reconcile::*;
