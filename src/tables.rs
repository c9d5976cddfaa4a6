//! # Registro de mesas
//!
//! CRUD de mesas acotado por restaurante. Aquí no se comprueban solapes: eso
//! vive en el scheduler. Lo único que se protege es el borrado de mesas con
//! reservas pendientes, con la mesa tomada en exclusiva frente a las reservas
//! en curso.

use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use serde::Deserialize;

use crate::api::{AppError, AppResult};
use crate::db::models::{current_timestamp, Table};
use crate::db::ReservationStore;
use crate::scheduler::BookingLocks;
use crate::time::Clock;

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableRequest {
    pub table_name: String,
    #[serde(default)]
    pub table_number: String,
    pub capacity: i32,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

impl TableRequest {
    fn validate(&self) -> AppResult<()> {
        if self.table_name.trim().is_empty() {
            return Err(AppError::validation_field("table_name", "el nombre de la mesa es requerido"));
        }
        if self.capacity <= 0 {
            return Err(AppError::validation_field("capacity", "la capacidad debe ser mayor a 0"));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct TableRegistry {
    store: Arc<dyn ReservationStore>,
    clock: Arc<dyn Clock>,
    locks: BookingLocks,
}

impl TableRegistry {
    /// `locks` deben ser los del `Scheduler` que reserva sobre estas mesas
    pub fn new(store: Arc<dyn ReservationStore>, clock: Arc<dyn Clock>, locks: BookingLocks) -> Self {
        Self { store, clock, locks }
    }

    pub async fn list(&self, restaurant_id: ObjectId) -> AppResult<Vec<Table>> {
        self.store.list_tables(restaurant_id).await
    }

    /// Nombres de las mesas marcadas como disponibles
    pub async fn available_names(&self, restaurant_id: ObjectId) -> AppResult<Vec<String>> {
        Ok(self
            .store
            .list_tables(restaurant_id)
            .await?
            .into_iter()
            .filter(|t| t.is_available)
            .map(|t| t.table_name)
            .collect())
    }

    pub async fn create(&self, restaurant_id: ObjectId, request: &TableRequest) -> AppResult<Table> {
        request.validate()?;
        let name = request.table_name.trim();

        if self.store.find_table_by_name(restaurant_id, name).await?.is_some() {
            return Err(AppError::Conflict(format!("Ya existe una mesa llamada '{}'", name)));
        }

        let table = Table {
            id: ObjectId::new(),
            restaurant_id,
            table_name: name.to_string(),
            table_number: request.table_number.trim().to_string(),
            capacity: request.capacity,
            is_available: request.is_available,
            created_at: current_timestamp(),
        };

        let table = self.store.insert_table(table).await?;
        tracing::info!(table = %table.table_name, capacity = table.capacity, "Mesa creada");
        Ok(table)
    }

    /// Reemplaza los campos editables de la mesa `name`; permite renombrar
    pub async fn update(&self, restaurant_id: ObjectId, name: &str, request: &TableRequest) -> AppResult<Table> {
        request.validate()?;
        let mut table = self.find_by_name(restaurant_id, name).await?;
        let new_name = request.table_name.trim();

        if new_name != table.table_name
            && self.store.find_table_by_name(restaurant_id, new_name).await?.is_some()
        {
            return Err(AppError::Conflict(format!("Ya existe una mesa llamada '{}'", new_name)));
        }

        table.table_name = new_name.to_string();
        table.table_number = request.table_number.trim().to_string();
        table.capacity = request.capacity;
        table.is_available = request.is_available;

        if !self.store.replace_table(&table).await? {
            return Err(AppError::not_found_id("Mesa", name));
        }
        tracing::info!(table = %table.table_name, "Mesa actualizada");
        Ok(table)
    }

    /// Borra la mesa si no tiene reservas activas de hoy en adelante
    pub async fn delete(&self, restaurant_id: ObjectId, name: &str) -> AppResult<Table> {
        let table = self.find_by_name(restaurant_id, name).await?;

        // ninguna reserva puede entrar entre el recuento y el borrado
        let _exclusive = self.locks.exclusive_table(restaurant_id, table.id).await;

        let upcoming = self
            .store
            .count_upcoming_for_table(restaurant_id, table.id, self.clock.today())
            .await?;
        if upcoming > 0 {
            return Err(AppError::Conflict(format!(
                "La mesa '{}' tiene {} reservas pendientes",
                name, upcoming
            )));
        }

        if !self.store.delete_table(restaurant_id, table.id).await? {
            return Err(AppError::not_found_id("Mesa", name));
        }
        tracing::info!(table = %table.table_name, "Mesa eliminada");
        Ok(table)
    }

    async fn find_by_name(&self, restaurant_id: ObjectId, name: &str) -> AppResult<Table> {
        self.store
            .find_table_by_name(restaurant_id, name)
            .await?
            .ok_or_else(|| AppError::not_found_id("Mesa", name))
    }
}
