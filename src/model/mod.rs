pub mod bound;
pub mod collection;
pub mod document;

pub use bound::Model;
pub use collection::{Collection, MemoryCollection};
pub use document::Document;
