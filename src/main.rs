//! # Reservation Scheduler Server
//!
//! ## Configuración
//!
//! El servidor se configura mediante variables de entorno (archivo `.env`):
//!
//! ```env
//! # Base de datos MongoDB
//! MONGODB_URI=mongodb://localhost:27017
//! MONGODB_DATABASE=reservation_scheduler
//!
//! # mongodb | memory
//! STORAGE_BACKEND=mongodb
//!
//! # Servidor
//! BIND_ADDRESS=0.0.0.0:8080
//! REQUEST_TIMEOUT_MS=3000
//! READ_RETRIES=3
//!
//! # Logging
//! RUST_LOG=reservation_scheduler=debug,mongodb=info
//! ```
//!
//! ## Ejecución
//!
//! ```bash
//! # Con MongoDB local
//! docker run -d --name mongo -p 27017:27017 mongo:latest
//! cargo run
//!
//! # Sin base de datos (los datos se pierden al reiniciar)
//! STORAGE_BACKEND=memory cargo run
//! ```

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use reservation_scheduler::api::{self, AppState};
use reservation_scheduler::config::{Config, StorageBackend};
use reservation_scheduler::db::{MemoryRepo, MongoRepo, ReservationStore};
use reservation_scheduler::time::SystemClock;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Sin RUST_LOG: debug para la app, info para MongoDB
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reservation_scheduler=debug,mongodb=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Iniciando Reservation Scheduler Server...");

    let config = Config::load();

    let store: Arc<dyn ReservationStore> = match config.storage {
        StorageBackend::MongoDb => {
            let repo = MongoRepo::init(&config).await.map_err(|e| {
                tracing::error!("Error conectando a MongoDB: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, format!("Error de MongoDB: {}", e))
            })?;

            // No es un error fatal, continuamos sin índices
            if let Err(e) = repo.create_indexes().await {
                tracing::warn!("Advertencia creando índices: {}", e);
            }

            Arc::new(repo)
        }
        StorageBackend::Memory => {
            tracing::warn!("Usando almacenamiento en memoria: los datos no se persisten");
            Arc::new(MemoryRepo::new())
        }
    };

    // Un único estado para todos los workers: los cerrojos de reserva se comparten
    let state = web::Data::new(AppState::new(store, Arc::new(SystemClock), config.request_timeout));

    tracing::info!(bind_address = %config.bind_address, storage = %config.storage, "Servidor iniciando");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(api::init_routes)
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
