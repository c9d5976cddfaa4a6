//! # Scheduler de reservas
//!
//! Asigna mesa a cada petición (primer ajuste, en orden ascendente de id),
//! calcula las franjas libres de una mesa y mantiene la invariante de que dos
//! reservas activas de la misma mesa y día nunca se solapan.
//!
//! Reservar y editar siguen el mismo camino:
//!
//! 1. mesas candidatas (capacidad, disponibilidad, preferencia)
//! 2. configuración del restaurante
//! 3. límite de turno: `inicio + turnaround <= fin de turno`
//! 4. por cada candidata, con la mesa tomada en modo compartido y el cerrojo
//!    (restaurante, mesa, fecha) tomado: leer reservas, comprobar solapamiento
//!    y escribir

pub mod locks;
pub mod slots;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;

use crate::api::{AppError, AppResult};
use crate::db::models::{current_timestamp, Reservation, ReservationStatus, Settings, Table, DEFAULT_SOURCE};
use crate::db::{ReservationFilter, ReservationStore};
use crate::time::{minutes_to_time, parse_clock, Clock};

pub use locks::BookingLocks;
use slots::{booked_intervals, conflicts, fits_shift, free_slots, occupied_interval};

/// Datos de una reserva tal y como llegan del cliente.
///
/// No hay `end_time`: la hora de salida siempre se calcula (un `end_time` en el JSON se ignora).
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationRequest {
    pub name: String,
    pub phone_number: String,
    #[serde(default)]
    pub email: Option<String>,
    pub party_size: i32,
    /// Fecha (formato YYYY-MM-DD)
    pub date: String,
    /// Nombre de mesa preferida; si viene, es un filtro estricto
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Hora de inicio, "HH:MM" o "H:MM AM/PM"
    pub start_time: String,
    #[serde(default)]
    pub status: Option<ReservationStatus>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Petición validada: fecha y hora ya convertidas
#[derive(Debug, Clone, Copy)]
struct Validated {
    date: NaiveDate,
    start: i32,
}

/// Valida y parsea una fecha en formato YYYY-MM-DD
pub fn validate_date(date_str: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation_field("date", "formato de fecha inválido, use YYYY-MM-DD"))
}

/// Valida un email de forma básica
fn validate_email(email: &str) -> bool {
    email.contains('@') && email.contains('.')
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ReservationRequest {
    fn validate(&self) -> AppResult<Validated> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation_field("name", "el nombre del cliente es requerido"));
        }
        if self.phone_number.trim().is_empty() {
            return Err(AppError::validation_field("phone_number", "el teléfono del cliente es requerido"));
        }
        if let Some(email) = non_empty(&self.email) {
            if !validate_email(email) {
                return Err(AppError::validation_field("email", "email inválido"));
            }
        }
        if self.party_size <= 0 {
            return Err(AppError::validation_field("party_size", "el número de personas debe ser mayor a 0"));
        }

        let date = validate_date(&self.date)?;
        let start = parse_clock(&self.start_time).ok_or_else(|| {
            AppError::validation_field("start_time", "hora inválida, use HH:MM o H:MM AM/PM")
        })?;

        Ok(Validated { date, start })
    }

    fn preferred_table(&self) -> Option<&str> {
        non_empty(&self.table)
    }
}

#[derive(Clone)]
pub struct Scheduler {
    store: Arc<dyn ReservationStore>,
    locks: BookingLocks,
    clock: Arc<dyn Clock>,
    deadline: Duration,
}

impl Scheduler {
    pub fn new(store: Arc<dyn ReservationStore>, clock: Arc<dyn Clock>, deadline: Duration) -> Self {
        Self {
            store,
            locks: BookingLocks::new(),
            clock,
            deadline,
        }
    }

    /// Cerrojos compartidos con el registro de mesas (borrado de mesas)
    pub fn locks(&self) -> &BookingLocks {
        &self.locks
    }

    /// Reserva la primera mesa libre que cumpla capacidad, disponibilidad y preferencia.
    ///
    /// `table_id`, si viene, restringe las candidatas a esa mesa.
    pub async fn book(
        &self,
        restaurant_id: ObjectId,
        table_id: Option<ObjectId>,
        request: &ReservationRequest,
    ) -> AppResult<Reservation> {
        self.with_deadline("book", self.book_inner(restaurant_id, table_id, request))
            .await
    }

    /// Franjas libres de una mesa en una fecha, en orden cronológico
    pub async fn available_slots(
        &self,
        restaurant_id: ObjectId,
        table_id: ObjectId,
        date: NaiveDate,
    ) -> AppResult<Vec<String>> {
        self.with_deadline("available_slots", async {
            let Some(settings) = self.store.get_settings(restaurant_id).await? else {
                return Ok(Vec::new());
            };

            let reservations = self
                .store
                .reservations_for_table(restaurant_id, table_id, date)
                .await?;
            let booked = booked_intervals(&reservations, &settings, None);

            let not_before = (date == self.clock.today()).then(|| self.clock.minutes_now());

            Ok(free_slots(&settings, &booked, not_before)
                .into_iter()
                .map(minutes_to_time)
                .collect())
        })
        .await
    }

    /// Edita una reserva pasando por la misma comprobación de conflictos que `book`,
    /// sin contar el intervalo previo de la propia reserva.
    pub async fn edit(
        &self,
        restaurant_id: ObjectId,
        reservation_id: ObjectId,
        request: &ReservationRequest,
    ) -> AppResult<Reservation> {
        self.with_deadline("edit_reservation", self.edit_inner(restaurant_id, reservation_id, request))
            .await
    }

    /// Marca la reserva como cancelada; la mesa queda libre en ese horario
    pub async fn cancel(&self, restaurant_id: ObjectId, reservation_id: ObjectId) -> AppResult<Reservation> {
        self.with_deadline("cancel_reservation", async {
            let (mut reservation, _guard) = loop {
                let current = self.find_reservation(restaurant_id, reservation_id).await?;
                let guard = self
                    .locks
                    .acquire(restaurant_id, current.table_id, current.date)
                    .await;

                // releer con el cerrojo tomado
                let fresh = self.find_reservation(restaurant_id, reservation_id).await?;
                if same_slot_key(&fresh, &current) {
                    break (fresh, guard);
                }
            };

            if reservation.status == ReservationStatus::Cancelled {
                return Err(AppError::NotFound("Reserva no encontrada o ya cancelada".to_string()));
            }

            reservation.status = ReservationStatus::Cancelled;
            reservation.updated_at = current_timestamp();
            if !self.store.replace_reservation(&reservation).await? {
                return Err(AppError::not_found_id("Reserva", &reservation_id.to_hex()));
            }

            tracing::info!(reservation_id = %reservation_id.to_hex(), "Reserva cancelada");
            Ok(reservation)
        })
        .await
    }

    pub async fn list(&self, restaurant_id: ObjectId, filter: &ReservationFilter) -> AppResult<Vec<Reservation>> {
        self.with_deadline("list_reservations", self.store.list_reservations(restaurant_id, filter))
            .await
    }

    async fn book_inner(
        &self,
        restaurant_id: ObjectId,
        table_id: Option<ObjectId>,
        request: &ReservationRequest,
    ) -> AppResult<Reservation> {
        let valid = request.validate()?;

        let tables = self
            .store
            .tables_for_party(restaurant_id, request.party_size)
            .await?;
        if tables.is_empty() {
            return Err(AppError::NoTableForPartySize {
                party_size: request.party_size,
            });
        }

        let settings = self.settings_for(restaurant_id).await?;
        ensure_fits_shift(valid.start, &settings)?;
        let wanted = occupied_interval(valid.start, &settings);
        let preferred = request.preferred_table();

        let candidates = tables
            .iter()
            .filter(|t| table_id.map_or(true, |id| t.id == id))
            .filter(|t| preferred.map_or(true, |name| t.table_name == name));

        for table in candidates {
            let _table_guard = self.locks.share_table(restaurant_id, table.id).await;
            let _guard = self.locks.acquire(restaurant_id, table.id, valid.date).await;

            // la mesa pudo borrarse mientras esperábamos el cerrojo
            if self.store.find_table(restaurant_id, table.id).await?.is_none() {
                tracing::debug!(table = %table.table_name, "Mesa eliminada, probando la siguiente");
                continue;
            }

            let existing = self
                .store
                .reservations_for_table(restaurant_id, table.id, valid.date)
                .await?;
            if conflicts(&booked_intervals(&existing, &settings, None), wanted) {
                tracing::debug!(table = %table.table_name, date = %valid.date, "Mesa ocupada, probando la siguiente");
                continue;
            }

            let now = current_timestamp();
            let reservation = Reservation {
                id: ObjectId::new(),
                restaurant_id,
                table_id: table.id,
                table_name: table.table_name.clone(),
                name: request.name.trim().to_string(),
                phone_number: request.phone_number.trim().to_string(),
                email: non_empty(&request.email).map(str::to_string),
                party_size: request.party_size,
                date: valid.date,
                start_time: minutes_to_time(wanted.0),
                end_time: minutes_to_time(wanted.1),
                start_minutes: wanted.0,
                end_minutes: wanted.1,
                notes: request.notes.clone(),
                status: request.status.unwrap_or_default(),
                source: non_empty(&request.source).unwrap_or(DEFAULT_SOURCE).to_string(),
                created_at: now,
                updated_at: now,
            };

            let saved = self.store.insert_reservation(reservation).await?;
            tracing::info!(
                reservation_id = %saved.id.to_hex(),
                table = %saved.table_name,
                date = %saved.date,
                start = %saved.start_time,
                party_size = saved.party_size,
                "Reserva creada"
            );
            return Ok(saved);
        }

        Err(AppError::NoAvailableTable {
            date: valid.date.to_string(),
            start: minutes_to_time(valid.start),
        })
    }

    async fn edit_inner(
        &self,
        restaurant_id: ObjectId,
        reservation_id: ObjectId,
        request: &ReservationRequest,
    ) -> AppResult<Reservation> {
        let valid = request.validate()?;

        loop {
            let current = self.find_reservation(restaurant_id, reservation_id).await?;
            let table = self.target_table(restaurant_id, &current, request).await?;

            if table.capacity < request.party_size {
                return Err(AppError::NoTableForPartySize {
                    party_size: request.party_size,
                });
            }

            let settings = self.settings_for(restaurant_id).await?;
            ensure_fits_shift(valid.start, &settings)?;
            let wanted = occupied_interval(valid.start, &settings);

            // origen y destino: cancelar o editar a la vez el origen también se serializa
            let _table_guard = self.locks.share_table(restaurant_id, table.id).await;
            let _guards = self
                .locks
                .acquire_all(&[
                    (restaurant_id, current.table_id, current.date),
                    (restaurant_id, table.id, valid.date),
                ])
                .await;

            // releer con los cerrojos tomados: estado y origen pueden haber cambiado
            let fresh = self.find_reservation(restaurant_id, reservation_id).await?;
            if !same_slot_key(&fresh, &current) {
                tracing::debug!(reservation_id = %reservation_id.to_hex(), "La reserva cambió de mesa o fecha, reintentando");
                continue;
            }
            if self.store.find_table(restaurant_id, table.id).await?.is_none() {
                return Err(AppError::not_found_id("Mesa", &table.table_name));
            }

            let status = request.status.unwrap_or(fresh.status);
            if status.holds_table() {
                let existing = self
                    .store
                    .reservations_for_table(restaurant_id, table.id, valid.date)
                    .await?;
                if conflicts(&booked_intervals(&existing, &settings, Some(reservation_id)), wanted) {
                    return Err(AppError::NoAvailableTable {
                        date: valid.date.to_string(),
                        start: minutes_to_time(valid.start),
                    });
                }
            }

            let updated = Reservation {
                id: fresh.id,
                restaurant_id,
                table_id: table.id,
                table_name: table.table_name.clone(),
                name: request.name.trim().to_string(),
                phone_number: request.phone_number.trim().to_string(),
                email: non_empty(&request.email).map(str::to_string),
                party_size: request.party_size,
                date: valid.date,
                start_time: minutes_to_time(wanted.0),
                end_time: minutes_to_time(wanted.1),
                start_minutes: wanted.0,
                end_minutes: wanted.1,
                notes: request.notes.clone(),
                status,
                source: non_empty(&request.source)
                    .map(str::to_string)
                    .unwrap_or(fresh.source),
                created_at: fresh.created_at,
                updated_at: current_timestamp(),
            };

            if !self.store.replace_reservation(&updated).await? {
                return Err(AppError::not_found_id("Reserva", &reservation_id.to_hex()));
            }

            tracing::info!(
                reservation_id = %reservation_id.to_hex(),
                table = %updated.table_name,
                date = %updated.date,
                start = %updated.start_time,
                status = updated.status.as_str(),
                "Reserva actualizada"
            );
            return Ok(updated);
        }
    }

    /// Mesa destino de una edición: la indicada por nombre o la actual
    async fn target_table(
        &self,
        restaurant_id: ObjectId,
        current: &Reservation,
        request: &ReservationRequest,
    ) -> AppResult<Table> {
        match request.preferred_table() {
            Some(name) if name != current.table_name => {
                let table = self
                    .store
                    .find_table_by_name(restaurant_id, name)
                    .await?
                    .ok_or_else(|| AppError::not_found_id("Mesa", name))?;
                if !table.is_available {
                    return Err(AppError::Conflict(format!("La mesa '{}' no está disponible", name)));
                }
                Ok(table)
            }
            _ => self
                .store
                .find_table(restaurant_id, current.table_id)
                .await?
                .ok_or_else(|| AppError::not_found_id("Mesa", &current.table_id.to_hex())),
        }
    }

    async fn find_reservation(&self, restaurant_id: ObjectId, reservation_id: ObjectId) -> AppResult<Reservation> {
        self.store
            .find_reservation(restaurant_id, reservation_id)
            .await?
            .ok_or_else(|| AppError::not_found_id("Reserva", &reservation_id.to_hex()))
    }

    async fn settings_for(&self, restaurant_id: ObjectId) -> AppResult<Settings> {
        self.store
            .get_settings(restaurant_id)
            .await?
            .ok_or_else(|| AppError::NotConfigured("el restaurante no tiene configuración de turnos".to_string()))
    }

    async fn with_deadline<T>(&self, operation: &str, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        match tokio::time::timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation = %operation, deadline = ?self.deadline, "Operación cancelada por tiempo");
                Err(AppError::timeout(operation))
            }
        }
    }
}

/// Misma clave de cerrojo (mesa y fecha) en dos lecturas de la reserva
fn same_slot_key(a: &Reservation, b: &Reservation) -> bool {
    a.table_id == b.table_id && a.date == b.date
}

fn ensure_fits_shift(start: i32, settings: &Settings) -> AppResult<()> {
    if fits_shift(start, settings) {
        Ok(())
    } else {
        Err(AppError::OutsideOperatingHours {
            start: minutes_to_time(start),
            shift_end: minutes_to_time(settings.shift_end),
        })
    }
}
