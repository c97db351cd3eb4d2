mod counter;
mod documents;
mod migrate;

pub use counter::PgCounterStore;
pub use documents::PgCollection;
pub use migrate::migrate;
