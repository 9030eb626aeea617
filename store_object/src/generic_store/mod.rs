pub mod core;
pub mod iterate;
pub mod read;
pub mod stream;
pub mod write;

pub use self::core::{GenericStore, Row};
pub use iterate::EntityIter;
pub use stream::{RowStream, StreamEvent};
