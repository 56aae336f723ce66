pub mod dbs;
pub mod error;
pub mod memory;
pub mod models;
pub mod resolver;
pub mod store;

pub use error::{PersistError, Result};
pub use memory::InMemoryStore;
pub use models::{Generation, NewGeneration, RootId};
pub use resolver::{resolve_thread, Thread, ThreadResolver, THREAD_SEPARATOR};
pub use store::GenerationStore;

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoGenerationStore;
