//! # Configuración de turnos
//!
//! Una sola fila por restaurante. `POST` la crea o la reemplaza, `PUT` solo
//! reemplaza una existente.

use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use serde::Deserialize;

use crate::api::{AppError, AppResult};
use crate::db::models::{current_timestamp, Settings, DEFAULT_SLOT_INTERVAL};
use crate::db::ReservationStore;
use crate::time::{parse_clock, MINUTES_PER_DAY};

/// Parámetros de turno enviados por el cliente.
///
/// Acepta los nombres antiguos (`shift_start_time`, `time_slot_intervel`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsRequest {
    #[serde(alias = "shift_start_time")]
    pub shift_start: String,
    #[serde(alias = "shift_end_time")]
    pub shift_end: String,
    #[serde(default, alias = "time_slot_interval", alias = "time_slot_intervel")]
    pub slot_interval: Option<i32>,
    #[serde(alias = "turn_around_time")]
    pub turnaround_time: i32,
    #[serde(default)]
    pub buffer_time: i32,
}

/// Duraciones en minutos acotadas a un día: con hora de inicio < 1440 las
/// sumas de franjas e intervalos nunca desbordan un `i32`.
fn check_minutes(field: &str, value: i32, min: i32) -> AppResult<()> {
    if (min..=MINUTES_PER_DAY).contains(&value) {
        Ok(())
    } else {
        Err(AppError::validation_field(
            field,
            &format!("debe estar entre {} y {} minutos", min, MINUTES_PER_DAY),
        ))
    }
}

impl SettingsRequest {
    /// Valida y construye la fila; `id` y `created_at` se conservan al reemplazar
    fn into_settings(&self, restaurant_id: ObjectId, previous: Option<&Settings>) -> AppResult<Settings> {
        let shift_start = parse_clock(&self.shift_start)
            .ok_or_else(|| AppError::validation_field("shift_start", "hora inválida, use HH:MM o H:MM AM/PM"))?;
        let shift_end = parse_clock(&self.shift_end)
            .ok_or_else(|| AppError::validation_field("shift_end", "hora inválida, use HH:MM o H:MM AM/PM"))?;

        if shift_start >= shift_end {
            return Err(AppError::validation_field("shift_end", "el turno debe terminar después de empezar"));
        }

        let slot_interval = self.slot_interval.unwrap_or(DEFAULT_SLOT_INTERVAL);
        check_minutes("slot_interval", slot_interval, 1)?;
        check_minutes("turnaround_time", self.turnaround_time, 1)?;
        check_minutes("buffer_time", self.buffer_time, 0)?;

        let now = current_timestamp();
        Ok(Settings {
            id: previous.map_or_else(ObjectId::new, |p| p.id),
            restaurant_id,
            shift_start,
            shift_end,
            slot_interval,
            turnaround_time: self.turnaround_time,
            buffer_time: self.buffer_time,
            reservation_duration: self.turnaround_time + self.buffer_time,
            created_at: previous.map_or(now, |p| p.created_at),
            updated_at: now,
        })
    }
}

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn ReservationStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, restaurant_id: ObjectId) -> AppResult<Option<Settings>> {
        self.store.get_settings(restaurant_id).await
    }

    /// Crea la configuración o reemplaza la existente
    pub async fn save(&self, restaurant_id: ObjectId, request: &SettingsRequest) -> AppResult<Settings> {
        let previous = self.store.get_settings(restaurant_id).await?;
        let settings = request.into_settings(restaurant_id, previous.as_ref())?;
        let settings = self.store.upsert_settings(settings).await?;
        tracing::info!(
            restaurant_id = %restaurant_id.to_hex(),
            replaced = previous.is_some(),
            duration = settings.duration(),
            "Configuración guardada"
        );
        Ok(settings)
    }

    /// Reemplaza una configuración existente; `NotFound` si no hay ninguna
    pub async fn update(&self, restaurant_id: ObjectId, request: &SettingsRequest) -> AppResult<Settings> {
        let previous = self
            .store
            .get_settings(restaurant_id)
            .await?
            .ok_or_else(|| AppError::not_found_id("Configuración", &restaurant_id.to_hex()))?;
        let settings = request.into_settings(restaurant_id, Some(&previous))?;
        self.store.upsert_settings(settings).await
    }
}
