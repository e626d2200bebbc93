mod cache;
mod colors;
mod execution;
mod link;
mod module;
mod registry;
mod signature;
mod theme;

pub use cache::*;
pub use colors::*;
pub use execution::*;
pub use link::*;
pub use module::*;
pub use registry::*;
pub use signature::*;
pub use theme::*;
