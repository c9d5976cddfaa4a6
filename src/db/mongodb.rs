use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::{Client, Collection, Cursor, Database};
use serde::de::DeserializeOwned;

use super::models::{Reservation, Settings, Table};
use super::store::{ReservationFilter, ReservationStore};
use crate::api::middleware::{error_chain, log_error_chain, ErrorLogExt};
use crate::api::{AppError, AppResult};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct MongoRepo {
    pub client: Client,
    pub database: Database,
    read_retries: u32,
}

impl MongoRepo {
    pub async fn init(config: &Config) -> AppResult<MongoRepo> {
        let client = Client::with_uri_str(&config.mongodb_uri)
            .await
            .map_err(|e| AppError::Internal(format!("Error conectando a MongoDB: {}", e)))?;

        let database = client.database(&config.mongodb_database);

        // Test connection
        database
            .run_command(doc! {"ping": 1})
            .await
            .map_err(|e| AppError::Internal(format!("Error validando conexión MongoDB: {}", e)))?;

        tracing::info!(database = %config.mongodb_database, "Conexión a MongoDB establecida exitosamente");

        Ok(MongoRepo {
            client,
            database,
            read_retries: config.read_retries.max(1),
        })
    }

    pub fn tables(&self) -> Collection<Table> {
        self.database.collection("party_table")
    }

    pub fn settings(&self) -> Collection<Settings> {
        self.database.collection("settings")
    }

    pub fn reservations(&self) -> Collection<Reservation> {
        self.database.collection("reservations")
    }

    pub async fn create_indexes(&self) -> AppResult<()> {
        use mongodb::{options::IndexOptions, IndexModel};

        let table_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "restaurant_id": 1 })
                .build(),
            IndexModel::builder()
                .keys(doc! { "restaurant_id": 1, "table_name": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        ];

        self.tables()
            .create_indexes(table_indexes)
            .await
            .map_err(|e| AppError::Internal(format!("Error creando índices de mesas: {}", e)))?;

        let settings_indexes = vec![IndexModel::builder()
            .keys(doc! { "restaurant_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build()];

        self.settings()
            .create_indexes(settings_indexes)
            .await
            .map_err(|e| AppError::Internal(format!("Error creando índices de configuración: {}", e)))?;

        let reservation_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "restaurant_id": 1 })
                .build(),
            IndexModel::builder()
                .keys(doc! { "table_id": 1, "date": 1 })
                .build(),
        ];

        self.reservations()
            .create_indexes(reservation_indexes)
            .await
            .map_err(|e| AppError::Internal(format!("Error creando índices de reservas: {}", e)))?;

        tracing::info!("Índices MongoDB creados exitosamente");
        Ok(())
    }

    /// Ejecuta una lectura con reintentos acotados y espera lineal entre intentos
    async fn read<T, F, Fut>(&self, operation: &str, mut attempt: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = mongodb::error::Result<T>>,
    {
        let mut tries = 1;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if tries < self.read_retries => {
                    tracing::warn!(
                        operation = %operation,
                        attempt = tries,
                        error_chain = ?error_chain(&e),
                        "Lectura fallida, reintentando"
                    );
                    tokio::time::sleep(Duration::from_millis(50 * tries as u64)).await;
                    tries += 1;
                }
                Err(e) => {
                    log_error_chain(&e, Some(operation));
                    return Err(AppError::database(operation, e));
                }
            }
        }
    }

    async fn find_all<T>(&self, collection: &Collection<T>, operation: &str, filter: Document, sort: Document) -> AppResult<Vec<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        self.read(operation, || {
            let filter = filter.clone();
            let sort = sort.clone();
            async move { collect(collection.find(filter).sort(sort).await?).await }
        })
        .await
    }

    async fn find_first<T>(&self, collection: &Collection<T>, operation: &str, filter: Document) -> AppResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        self.read(operation, || {
            let filter = filter.clone();
            async move { collection.find_one(filter).await }
        })
        .await
    }
}

async fn collect<T>(mut cursor: Cursor<T>) -> mongodb::error::Result<Vec<T>>
where
    T: DeserializeOwned + Send + Sync,
{
    let mut results = Vec::new();
    while cursor.advance().await? {
        results.push(cursor.deserialize_current()?);
    }
    Ok(results)
}

#[async_trait]
impl ReservationStore for MongoRepo {
    async fn list_tables(&self, restaurant_id: ObjectId) -> AppResult<Vec<Table>> {
        self.find_all(
            &self.tables(),
            "list_tables",
            doc! { "restaurant_id": restaurant_id },
            doc! { "_id": 1 },
        )
        .await
    }

    async fn tables_for_party(&self, restaurant_id: ObjectId, party_size: i32) -> AppResult<Vec<Table>> {
        self.find_all(
            &self.tables(),
            "tables_for_party",
            doc! {
                "restaurant_id": restaurant_id,
                "capacity": { "$gte": party_size },
                "is_available": true
            },
            doc! { "_id": 1 },
        )
        .await
    }

    async fn find_table(&self, restaurant_id: ObjectId, table_id: ObjectId) -> AppResult<Option<Table>> {
        self.find_first(
            &self.tables(),
            "find_table",
            doc! { "_id": table_id, "restaurant_id": restaurant_id },
        )
        .await
    }

    async fn find_table_by_name(&self, restaurant_id: ObjectId, name: &str) -> AppResult<Option<Table>> {
        self.find_first(
            &self.tables(),
            "find_table_by_name",
            doc! { "restaurant_id": restaurant_id, "table_name": name },
        )
        .await
    }

    async fn insert_table(&self, table: Table) -> AppResult<Table> {
        self.tables()
            .insert_one(&table)
            .await
            .log_error_context("inserting table")
            .map_err(|e| AppError::database("insert_table", e))?;
        Ok(table)
    }

    async fn replace_table(&self, table: &Table) -> AppResult<bool> {
        let result = self
            .tables()
            .replace_one(doc! { "_id": table.id, "restaurant_id": table.restaurant_id }, table)
            .await
            .log_error_context("replacing table")
            .map_err(|e| AppError::database("replace_table", e))?;
        Ok(result.matched_count > 0)
    }

    async fn delete_table(&self, restaurant_id: ObjectId, table_id: ObjectId) -> AppResult<bool> {
        let result = self
            .tables()
            .delete_one(doc! { "_id": table_id, "restaurant_id": restaurant_id })
            .await
            .log_error_context("deleting table")
            .map_err(|e| AppError::database("delete_table", e))?;
        Ok(result.deleted_count > 0)
    }

    async fn get_settings(&self, restaurant_id: ObjectId) -> AppResult<Option<Settings>> {
        self.find_first(
            &self.settings(),
            "get_settings",
            doc! { "restaurant_id": restaurant_id },
        )
        .await
    }

    async fn upsert_settings(&self, settings: Settings) -> AppResult<Settings> {
        self.settings()
            .replace_one(doc! { "restaurant_id": settings.restaurant_id }, &settings)
            .upsert(true)
            .await
            .log_error_context("upserting settings")
            .map_err(|e| AppError::database("upsert_settings", e))?;
        Ok(settings)
    }

    async fn list_reservations(
        &self,
        restaurant_id: ObjectId,
        filter: &ReservationFilter,
    ) -> AppResult<Vec<Reservation>> {
        // Construir filtro dinámico basado en parámetros
        let mut query = doc! { "restaurant_id": restaurant_id };
        if let Some(date) = filter.date {
            query.insert("date", date.to_string());
        }
        if let Some(status) = filter.status {
            query.insert("status", status.as_str());
        }

        self.find_all(
            &self.reservations(),
            "list_reservations",
            query,
            doc! { "date": 1, "start_minutes": 1, "_id": 1 },
        )
        .await
    }

    async fn find_reservation(&self, restaurant_id: ObjectId, id: ObjectId) -> AppResult<Option<Reservation>> {
        self.find_first(
            &self.reservations(),
            "find_reservation",
            doc! { "_id": id, "restaurant_id": restaurant_id },
        )
        .await
    }

    async fn reservations_for_table(
        &self,
        restaurant_id: ObjectId,
        table_id: ObjectId,
        date: NaiveDate,
    ) -> AppResult<Vec<Reservation>> {
        self.find_all(
            &self.reservations(),
            "reservations_for_table",
            doc! {
                "restaurant_id": restaurant_id,
                "table_id": table_id,
                "date": date.to_string()
            },
            doc! { "start_minutes": 1 },
        )
        .await
    }

    async fn count_upcoming_for_table(
        &self,
        restaurant_id: ObjectId,
        table_id: ObjectId,
        from: NaiveDate,
    ) -> AppResult<u64> {
        let collection = &self.reservations();
        let filter = doc! {
            "restaurant_id": restaurant_id,
            "table_id": table_id,
            // YYYY-MM-DD ordena igual como texto que como fecha
            "date": { "$gte": from.to_string() },
            "status": { "$ne": "Cancelled" }
        };

        self.read("count_upcoming_for_table", || {
            let filter = filter.clone();
            async move { collection.count_documents(filter).await }
        })
        .await
    }

    async fn insert_reservation(&self, reservation: Reservation) -> AppResult<Reservation> {
        self.reservations()
            .insert_one(&reservation)
            .await
            .log_error_context("inserting reservation")
            .map_err(|e| AppError::database("insert_reservation", e))?;
        Ok(reservation)
    }

    async fn replace_reservation(&self, reservation: &Reservation) -> AppResult<bool> {
        let result = self
            .reservations()
            .replace_one(
                doc! { "_id": reservation.id, "restaurant_id": reservation.restaurant_id },
                reservation,
            )
            .await
            .log_error_context("replacing reservation")
            .map_err(|e| AppError::database("replace_reservation", e))?;
        Ok(result.matched_count > 0)
    }
}
