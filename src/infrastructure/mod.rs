//! Infrastructure module for the task store.
//!
//! This module contains the repository trait, its in-memory and
//! `PostgreSQL` implementations, and the factory selecting between them.

pub mod factory;
pub mod in_memory;
pub mod postgres;
pub mod repository;

pub use factory::{
    ConfigurationError, FactoryError, RepositoryConfig, RepositoryConfigBuilder,
    RepositoryFactory, StorageMode,
};
pub use in_memory::InMemoryTaskRepository;
pub use postgres::PostgresTaskRepository;
pub use repository::{RepositoryError, StoreFuture, TaskRepository};
