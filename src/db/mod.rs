// src/db/mod.rs
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod store;

pub use memory::MemoryRepo;
pub use self::mongodb::MongoRepo;
pub use models::{Reservation, ReservationStatus, Settings, Table};
pub use store::{ReservationFilter, ReservationStore};
