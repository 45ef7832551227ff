pub mod component;
pub mod edge;
pub mod import_result;
pub mod report;

pub use component::*;
pub use edge::*;
pub use import_result::*;
pub use report::*;

pub type Id = String;
