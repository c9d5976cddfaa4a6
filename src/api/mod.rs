//! # Módulo API
//!
//! Rutas y controladores de la API REST. Todo cuelga de `/api` y va acotado
//! por el parámetro `resturant_id` (se acepta también `restaurant_id`).
//!
//! ## Módulos principales
//!
//! - [`reservation`] - Reservas, franjas libres y mesas disponibles
//! - [`table`] - CRUD de mesas
//! - [`setting`] - Configuración de turnos
//! - [`errors`] - Manejo de errores de la aplicación

pub mod errors;
pub mod middleware;
pub mod reservation;
pub mod setting;
pub mod table;

// Re-exportar tipos comunes para facilitar su uso
pub use errors::{AppError, AppResult, ErrorResponse};

use std::sync::Arc;
use std::time::Duration;

use actix_web::{get, web, HttpResponse, Responder};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;

use crate::db::ReservationStore;
use crate::scheduler::Scheduler;
use crate::settings::SettingsService;
use crate::tables::TableRegistry;
use crate::time::Clock;

/// Estado compartido por todos los workers de Actix
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Scheduler,
    pub tables: TableRegistry,
    pub settings: SettingsService,
}

impl AppState {
    pub fn new(store: Arc<dyn ReservationStore>, clock: Arc<dyn Clock>, deadline: Duration) -> Self {
        let scheduler = Scheduler::new(store.clone(), clock.clone(), deadline);
        Self {
            tables: TableRegistry::new(store.clone(), clock, scheduler.locks().clone()),
            settings: SettingsService::new(store),
            scheduler,
        }
    }
}

/// Parámetro común a todas las rutas
#[derive(Debug, Deserialize)]
pub struct RestaurantQuery {
    #[serde(rename = "resturant_id", alias = "restaurant_id")]
    pub restaurant_id: String,
}

impl RestaurantQuery {
    pub fn id(&self) -> AppResult<ObjectId> {
        parse_object_id("resturant_id", &self.restaurant_id)
    }
}

/// Convierte un ObjectId recibido como texto, indicando el campo si es inválido
pub fn parse_object_id(field: &str, value: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(value.trim())
        .map_err(|_| AppError::validation_field(field, "identificador inválido"))
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Configura todas las rutas de la API
///
/// - `/health`
/// - `/api/reservations`, `/api/reservation/*`, `/api/available-*` - Ver [`reservation::routes`]
/// - `/api/tables/*` - Ver [`table::routes`]
/// - `/api/setting` - Ver [`setting::routes`]
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // JSON o query mal formados también responden con ErrorResponse
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    );
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    );

    cfg.service(health);
    cfg.service(
        web::scope("/api")
            .configure(reservation::routes)
            .configure(table::routes)
            .configure(setting::routes),
    );
}
