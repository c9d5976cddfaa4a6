//! Contrato de persistencia compartido por MongoDB y el almacén en memoria.
//!
//! Todas las consultas van acotadas por restaurante. Las listas de mesas se
//! devuelven siempre en orden ascendente de id.

use async_trait::async_trait;
use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;

use super::models::{Reservation, ReservationStatus, Settings, Table};
use crate::api::AppResult;

/// Filtros opcionales para listar reservas
#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub date: Option<NaiveDate>,
    pub status: Option<ReservationStatus>,
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    // ---- Mesas ----
    async fn list_tables(&self, restaurant_id: ObjectId) -> AppResult<Vec<Table>>;

    /// Mesas con `capacity >= party_size` e `is_available == true`
    async fn tables_for_party(&self, restaurant_id: ObjectId, party_size: i32) -> AppResult<Vec<Table>>;

    async fn find_table(&self, restaurant_id: ObjectId, table_id: ObjectId) -> AppResult<Option<Table>>;

    async fn find_table_by_name(&self, restaurant_id: ObjectId, name: &str) -> AppResult<Option<Table>>;

    async fn insert_table(&self, table: Table) -> AppResult<Table>;

    /// Reemplaza la fila completa. Devuelve `false` si no existía.
    async fn replace_table(&self, table: &Table) -> AppResult<bool>;

    async fn delete_table(&self, restaurant_id: ObjectId, table_id: ObjectId) -> AppResult<bool>;

    // ---- Configuración ----
    async fn get_settings(&self, restaurant_id: ObjectId) -> AppResult<Option<Settings>>;

    /// Inserta o reemplaza la única fila del restaurante
    async fn upsert_settings(&self, settings: Settings) -> AppResult<Settings>;

    // ---- Reservas ----
    async fn list_reservations(
        &self,
        restaurant_id: ObjectId,
        filter: &ReservationFilter,
    ) -> AppResult<Vec<Reservation>>;

    async fn find_reservation(&self, restaurant_id: ObjectId, id: ObjectId) -> AppResult<Option<Reservation>>;

    /// Todas las reservas (de cualquier estado) de una mesa en una fecha
    async fn reservations_for_table(
        &self,
        restaurant_id: ObjectId,
        table_id: ObjectId,
        date: NaiveDate,
    ) -> AppResult<Vec<Reservation>>;

    /// Reservas que aún ocupan la mesa con fecha `>= from`
    async fn count_upcoming_for_table(
        &self,
        restaurant_id: ObjectId,
        table_id: ObjectId,
        from: NaiveDate,
    ) -> AppResult<u64>;

    async fn insert_reservation(&self, reservation: Reservation) -> AppResult<Reservation>;

    async fn replace_reservation(&self, reservation: &Reservation) -> AppResult<bool>;
}
