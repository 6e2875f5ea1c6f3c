pub mod core;
pub mod repository;
pub mod statements;

pub use core::PersistentRepository;
