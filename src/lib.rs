//! # Reservation Scheduler
//!
//! Servicio de reservas de mesas para restaurantes: asigna mesa a cada
//! reserva sin solapes, calcula las franjas libres de cada mesa según la
//! configuración de turnos y persiste todo en MongoDB.
//!
//! ## Arquitectura
//!
//! ```text
//! API REST (Actix Web)
//!     ↓
//! Scheduler / TableRegistry / SettingsService
//!     ↓ ReservationStore
//! MongoRepo (MongoDB) | MemoryRepo
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod scheduler;
pub mod settings;
pub mod tables;
pub mod time;
