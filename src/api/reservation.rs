//! # API de Reservas
//!
//! - Listar reservas (filtros opcionales por fecha y estado)
//! - Crear reservas: la mesa la asigna el scheduler
//! - Editar y cancelar reservas
//! - Consultar franjas libres y mesas disponibles

use actix_web::{get, post, put, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use super::{parse_object_id, AppResult, AppState, RestaurantQuery};
use crate::db::models::{Reservation, ReservationStatus};
use crate::db::ReservationFilter;
use crate::scheduler::{validate_date, ReservationRequest};

/// Reserva tal y como la ve el frontend, con los ObjectId como texto
#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub id: String,
    pub restaurant_id: String,
    pub table_id: String,
    /// Nombre de la mesa asignada
    pub table: String,
    pub name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub party_size: i32,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub notes: Option<String>,
    pub status: ReservationStatus,
    pub source: String,
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        ReservationResponse {
            id: reservation.id.to_hex(),
            restaurant_id: reservation.restaurant_id.to_hex(),
            table_id: reservation.table_id.to_hex(),
            table: reservation.table_name,
            name: reservation.name,
            phone_number: reservation.phone_number,
            email: reservation.email,
            party_size: reservation.party_size,
            date: reservation.date.to_string(),
            start_time: reservation.start_time,
            end_time: reservation.end_time,
            notes: reservation.notes,
            status: reservation.status,
            source: reservation.source,
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(rename = "resturant_id", alias = "restaurant_id")]
    restaurant_id: String,
    /// Filtrar por fecha específica (formato YYYY-MM-DD)
    date: Option<String>,
    status: Option<ReservationStatus>,
}

#[derive(Deserialize)]
struct BookQuery {
    #[serde(rename = "resturant_id", alias = "restaurant_id")]
    restaurant_id: String,
    /// Restringe la reserva a esta mesa
    table_id: Option<String>,
}

#[derive(Deserialize)]
struct SlotsQuery {
    #[serde(rename = "resturant_id", alias = "restaurant_id")]
    restaurant_id: String,
    table_id: String,
    selected_date: String,
}

/// Lista las reservas de un restaurante ordenadas por fecha y hora
#[get("/reservations")]
async fn get_reservations(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<impl Responder> {
    let restaurant_id = parse_object_id("resturant_id", &query.restaurant_id)?;
    let filter = ReservationFilter {
        date: query.date.as_deref().map(validate_date).transpose()?,
        status: query.status,
    };

    let reservations = state.scheduler.list(restaurant_id, &filter).await?;
    let results: Vec<ReservationResponse> = reservations.into_iter().map(Into::into).collect();

    Ok(HttpResponse::Ok().json(results))
}

/// Crea una nueva reserva
///
/// # Errores
/// - `400 Bad Request`: Datos de validación incorrectos
/// - `409 Conflict`: sin mesa para ese tamaño (`no_table_for_party_size`),
///   fuera de turno (`outside_operating_hours`) o todo ocupado (`no_available_table`)
/// - `412 Precondition Failed`: el restaurante no tiene configuración
/// - `503 Service Unavailable`: error de base de datos o tiempo agotado (reintentable)
#[post("/reservations")]
async fn make_reservation(
    state: web::Data<AppState>,
    query: web::Query<BookQuery>,
    data: web::Json<ReservationRequest>,
) -> AppResult<impl Responder> {
    let restaurant_id = parse_object_id("resturant_id", &query.restaurant_id)?;
    let table_id = query
        .table_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(|id| parse_object_id("table_id", id))
        .transpose()?;

    let reservation = state.scheduler.book(restaurant_id, table_id, &data).await?;

    Ok(HttpResponse::Created().json(ReservationResponse::from(reservation)))
}

/// Edita una reserva; vuelve a comprobar conflictos en la mesa destino
#[put("/reservation/{id}")]
async fn edit_reservation(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RestaurantQuery>,
    data: web::Json<ReservationRequest>,
) -> AppResult<impl Responder> {
    let restaurant_id = query.id()?;
    let reservation_id = parse_object_id("id", &path.into_inner())?;

    let reservation = state
        .scheduler
        .edit(restaurant_id, reservation_id, &data)
        .await?;

    Ok(HttpResponse::Ok().json(ReservationResponse::from(reservation)))
}

/// Cancela una reserva
#[post("/reservation/{id}/cancel")]
async fn cancel_reservation(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RestaurantQuery>,
) -> AppResult<impl Responder> {
    let restaurant_id = query.id()?;
    let reservation_id = parse_object_id("id", &path.into_inner())?;

    let reservation = state.scheduler.cancel(restaurant_id, reservation_id).await?;

    Ok(HttpResponse::Ok().json(ReservationResponse::from(reservation)))
}

/// Horas de inicio libres para una mesa y fecha, en orden cronológico
#[get("/available-slots")]
async fn get_available_slots(
    state: web::Data<AppState>,
    query: web::Query<SlotsQuery>,
) -> AppResult<impl Responder> {
    let restaurant_id = parse_object_id("resturant_id", &query.restaurant_id)?;
    let table_id = parse_object_id("table_id", &query.table_id)?;
    let date = validate_date(&query.selected_date)?;

    let slots = state
        .scheduler
        .available_slots(restaurant_id, table_id, date)
        .await?;

    Ok(HttpResponse::Ok().json(slots))
}

/// Nombres de las mesas marcadas como disponibles
#[get("/available-tables")]
async fn get_available_tables(
    state: web::Data<AppState>,
    query: web::Query<RestaurantQuery>,
) -> AppResult<impl Responder> {
    let names = state.tables.available_names(query.id()?).await?;
    Ok(HttpResponse::Ok().json(names))
}

/// Configura las rutas relacionadas con reservas
///
/// - `GET /reservations`
/// - `POST /reservations`
/// - `PUT /reservation/{id}`
/// - `POST /reservation/{id}/cancel`
/// - `GET /available-slots`
/// - `GET /available-tables`
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_reservations);
    cfg.service(make_reservation);
    cfg.service(edit_reservation);
    cfg.service(cancel_reservation);
    cfg.service(get_available_slots);
    cfg.service(get_available_tables);
}
