mod client;
mod models;

pub use client::MongoGenerationStore;
pub use models::MongoGeneration;
