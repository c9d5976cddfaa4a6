use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use super::{AppResult, AppState, RestaurantQuery};
use crate::db::models::Table;
use crate::tables::TableRequest;

#[derive(Debug, Serialize, Deserialize)]
pub struct TableResponse {
    pub id: String,
    pub table_name: String,
    pub table_number: String,
    pub capacity: i32,
    pub is_available: bool,
}

impl From<Table> for TableResponse {
    fn from(table: Table) -> Self {
        TableResponse {
            id: table.id.to_hex(),
            table_name: table.table_name,
            table_number: table.table_number,
            capacity: table.capacity,
            is_available: table.is_available,
        }
    }
}

#[get("/tables")]
async fn get_tables(
    state: web::Data<AppState>,
    query: web::Query<RestaurantQuery>,
) -> AppResult<impl Responder> {
    let tables = state.tables.list(query.id()?).await?;
    let results: Vec<TableResponse> = tables.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(results))
}

#[post("/tables")]
async fn create_table(
    state: web::Data<AppState>,
    query: web::Query<RestaurantQuery>,
    data: web::Json<TableRequest>,
) -> AppResult<impl Responder> {
    let table = state.tables.create(query.id()?, &data).await?;
    Ok(HttpResponse::Created().json(TableResponse::from(table)))
}

#[put("/tables/{name}")]
async fn edit_table(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RestaurantQuery>,
    data: web::Json<TableRequest>,
) -> AppResult<impl Responder> {
    let table = state
        .tables
        .update(query.id()?, &path.into_inner(), &data)
        .await?;
    Ok(HttpResponse::Ok().json(TableResponse::from(table)))
}

/// Falla con 409 si la mesa tiene reservas activas de hoy en adelante
#[delete("/tables/{name}")]
async fn delete_table(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RestaurantQuery>,
) -> AppResult<impl Responder> {
    let table = state.tables.delete(query.id()?, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(TableResponse::from(table)))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_tables);
    cfg.service(create_table);
    cfg.service(edit_table);
    cfg.service(delete_table);
}
