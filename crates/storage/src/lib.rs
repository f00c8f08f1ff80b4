#![forbid(unsafe_code)]

pub mod repository;

pub use repository::{
    InMemoryRepository, QuizRepository, ResultRepository, Storage, StorageError,
};
