//! Cerrojos de reserva.
//!
//! - Por (restaurante, mesa, fecha): la comprobación de solapamiento y la
//!   escritura se hacen con el cerrojo tomado, así dos reservas concurrentes
//!   sobre la misma mesa y día nunca pasan ambas la comprobación.
//! - Por (restaurante, mesa): reservar y editar lo toman compartido, borrar la
//!   mesa lo toma exclusivo.
//!
//! Orden de adquisición: primero el de mesa (uno como mucho), después los de
//! fecha en orden de clave.

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use mongodb::bson::oid::ObjectId;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

pub type LockKey = (ObjectId, ObjectId, NaiveDate);
type TableKey = (ObjectId, ObjectId);

/// Por encima de este número de entradas se purgan los cerrojos sin uso
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Default)]
pub struct BookingLocks {
    locks: Arc<DashMap<LockKey, Arc<Mutex<()>>>>,
    tables: Arc<DashMap<TableKey, Arc<RwLock<()>>>>,
}

impl BookingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Espera y devuelve el cerrojo de la clave; se libera al soltar el guard
    pub async fn acquire(
        &self,
        restaurant_id: ObjectId,
        table_id: ObjectId,
        date: NaiveDate,
    ) -> OwnedMutexGuard<()> {
        if self.locks.len() > PRUNE_THRESHOLD {
            self.prune();
        }

        // el guard de DashMap se suelta al final de la sentencia, antes del await
        let lock = self
            .locks
            .entry((restaurant_id, table_id, date))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        lock.lock_owned().await
    }

    /// Toma varios cerrojos en orden de clave; las claves repetidas se toman una vez
    pub async fn acquire_all(&self, keys: &[LockKey]) -> Vec<OwnedMutexGuard<()>> {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for (restaurant_id, table_id, date) in keys {
            guards.push(self.acquire(restaurant_id, table_id, date).await);
        }
        guards
    }

    /// Acceso compartido a una mesa mientras se reserva o edita sobre ella
    pub async fn share_table(&self, restaurant_id: ObjectId, table_id: ObjectId) -> OwnedRwLockReadGuard<()> {
        self.table_lock(restaurant_id, table_id).read_owned().await
    }

    /// Acceso exclusivo: espera a que terminen las reservas en curso sobre la mesa
    pub async fn exclusive_table(&self, restaurant_id: ObjectId, table_id: ObjectId) -> OwnedRwLockWriteGuard<()> {
        self.table_lock(restaurant_id, table_id).write_owned().await
    }

    fn table_lock(&self, restaurant_id: ObjectId, table_id: ObjectId) -> Arc<RwLock<()>> {
        if self.tables.len() > PRUNE_THRESHOLD {
            self.prune();
        }

        self.tables
            .entry((restaurant_id, table_id))
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Elimina los cerrojos que nadie tiene ni espera
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        self.tables.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len() + self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty() && self.tables.is_empty()
    }
}
