pub mod archive;
pub mod error;
pub mod event;
pub mod id;
pub mod tracelog;

pub use error::*;
pub use event::*;
pub use id::*;
pub use tracelog::*;
