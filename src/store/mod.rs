pub mod memory;
pub mod neo4j;
pub mod traits;

pub use memory::*;
pub use neo4j::*;
pub use traits::*;
