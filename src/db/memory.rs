//! Almacén en memoria con la misma semántica que `MongoRepo`.
//!
//! Sirve para ejecutar el servidor sin MongoDB (`STORAGE_BACKEND=memory`) y
//! para los tests. Nada se persiste entre reinicios.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::models::{Reservation, Settings, Table};
use super::store::{ReservationFilter, ReservationStore};
use crate::api::{AppError, AppResult};

#[derive(Debug, Default)]
struct Collections {
    // BTreeMap: iteración en orden ascendente de id
    tables: BTreeMap<ObjectId, Table>,
    settings: BTreeMap<ObjectId, Settings>,
    reservations: BTreeMap<ObjectId, Reservation>,
}

#[derive(Debug, Default)]
pub struct MemoryRepo {
    inner: RwLock<Collections>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate_table_name(collections: &Collections, table: &Table) -> bool {
    collections.tables.values().any(|existing| {
        existing.id != table.id
            && existing.restaurant_id == table.restaurant_id
            && existing.table_name == table.table_name
    })
}

#[async_trait]
impl ReservationStore for MemoryRepo {
    async fn list_tables(&self, restaurant_id: ObjectId) -> AppResult<Vec<Table>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tables
            .values()
            .filter(|t| t.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn tables_for_party(&self, restaurant_id: ObjectId, party_size: i32) -> AppResult<Vec<Table>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tables
            .values()
            .filter(|t| t.restaurant_id == restaurant_id && t.capacity >= party_size && t.is_available)
            .cloned()
            .collect())
    }

    async fn find_table(&self, restaurant_id: ObjectId, table_id: ObjectId) -> AppResult<Option<Table>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tables
            .get(&table_id)
            .filter(|t| t.restaurant_id == restaurant_id)
            .cloned())
    }

    async fn find_table_by_name(&self, restaurant_id: ObjectId, name: &str) -> AppResult<Option<Table>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tables
            .values()
            .find(|t| t.restaurant_id == restaurant_id && t.table_name == name)
            .cloned())
    }

    async fn insert_table(&self, table: Table) -> AppResult<Table> {
        let mut inner = self.inner.write().await;
        if inner.tables.contains_key(&table.id) || duplicate_table_name(&inner, &table) {
            return Err(AppError::Conflict("registro duplicado en 'insert_table'".to_string()));
        }
        inner.tables.insert(table.id, table.clone());
        Ok(table)
    }

    async fn replace_table(&self, table: &Table) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let exists = inner
            .tables
            .get(&table.id)
            .is_some_and(|t| t.restaurant_id == table.restaurant_id);
        if !exists {
            return Ok(false);
        }
        if duplicate_table_name(&inner, table) {
            return Err(AppError::Conflict("registro duplicado en 'replace_table'".to_string()));
        }
        inner.tables.insert(table.id, table.clone());
        Ok(true)
    }

    async fn delete_table(&self, restaurant_id: ObjectId, table_id: ObjectId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .tables
            .get(&table_id)
            .is_some_and(|t| t.restaurant_id == restaurant_id);
        if owned {
            inner.tables.remove(&table_id);
        }
        Ok(owned)
    }

    async fn get_settings(&self, restaurant_id: ObjectId) -> AppResult<Option<Settings>> {
        let inner = self.inner.read().await;
        Ok(inner.settings.get(&restaurant_id).cloned())
    }

    async fn upsert_settings(&self, settings: Settings) -> AppResult<Settings> {
        let mut inner = self.inner.write().await;
        inner.settings.insert(settings.restaurant_id, settings.clone());
        Ok(settings)
    }

    async fn list_reservations(
        &self,
        restaurant_id: ObjectId,
        filter: &ReservationFilter,
    ) -> AppResult<Vec<Reservation>> {
        let inner = self.inner.read().await;
        let mut results: Vec<Reservation> = inner
            .reservations
            .values()
            .filter(|r| r.restaurant_id == restaurant_id)
            .filter(|r| filter.date.map_or(true, |d| r.date == d))
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        results.sort_by_key(|r| (r.date, r.start_minutes, r.id));
        Ok(results)
    }

    async fn find_reservation(&self, restaurant_id: ObjectId, id: ObjectId) -> AppResult<Option<Reservation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reservations
            .get(&id)
            .filter(|r| r.restaurant_id == restaurant_id)
            .cloned())
    }

    async fn reservations_for_table(
        &self,
        restaurant_id: ObjectId,
        table_id: ObjectId,
        date: NaiveDate,
    ) -> AppResult<Vec<Reservation>> {
        let inner = self.inner.read().await;
        let mut results: Vec<Reservation> = inner
            .reservations
            .values()
            .filter(|r| r.restaurant_id == restaurant_id && r.table_id == table_id && r.date == date)
            .cloned()
            .collect();
        results.sort_by_key(|r| r.start_minutes);
        Ok(results)
    }

    async fn count_upcoming_for_table(
        &self,
        restaurant_id: ObjectId,
        table_id: ObjectId,
        from: NaiveDate,
    ) -> AppResult<u64> {
        let inner = self.inner.read().await;
        let count = inner
            .reservations
            .values()
            .filter(|r| {
                r.restaurant_id == restaurant_id
                    && r.table_id == table_id
                    && r.date >= from
                    && r.status.holds_table()
            })
            .count();
        Ok(count as u64)
    }

    async fn insert_reservation(&self, reservation: Reservation) -> AppResult<Reservation> {
        let mut inner = self.inner.write().await;
        if inner.reservations.contains_key(&reservation.id) {
            return Err(AppError::Conflict("registro duplicado en 'insert_reservation'".to_string()));
        }
        inner.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn replace_reservation(&self, reservation: &Reservation) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.reservations.get_mut(&reservation.id) {
            Some(existing) if existing.restaurant_id == reservation.restaurant_id => {
                *existing = reservation.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
