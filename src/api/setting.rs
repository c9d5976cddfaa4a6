use actix_web::{get, post, put, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use super::{AppError, AppResult, AppState, RestaurantQuery};
use crate::db::models::Settings;
use crate::settings::SettingsRequest;
use crate::time::minutes_to_time;

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub id: String,
    pub restaurant_id: String,
    pub shift_start: String,
    pub shift_end: String,
    pub slot_interval: i32,
    pub turnaround_time: i32,
    pub buffer_time: i32,
    pub reservation_duration: i32,
}

impl From<Settings> for SettingsResponse {
    fn from(settings: Settings) -> Self {
        SettingsResponse {
            id: settings.id.to_hex(),
            restaurant_id: settings.restaurant_id.to_hex(),
            shift_start: minutes_to_time(settings.shift_start),
            shift_end: minutes_to_time(settings.shift_end),
            slot_interval: settings.slot_interval,
            turnaround_time: settings.turnaround_time,
            buffer_time: settings.buffer_time,
            reservation_duration: settings.reservation_duration,
        }
    }
}

/// Crea la configuración del restaurante o reemplaza la existente
#[post("/setting")]
async fn save_setting(
    state: web::Data<AppState>,
    query: web::Query<RestaurantQuery>,
    data: web::Json<SettingsRequest>,
) -> AppResult<impl Responder> {
    let settings = state.settings.save(query.id()?, &data).await?;
    Ok(HttpResponse::Ok().json(SettingsResponse::from(settings)))
}

#[put("/setting")]
async fn update_setting(
    state: web::Data<AppState>,
    query: web::Query<RestaurantQuery>,
    data: web::Json<SettingsRequest>,
) -> AppResult<impl Responder> {
    let settings = state.settings.update(query.id()?, &data).await?;
    Ok(HttpResponse::Ok().json(SettingsResponse::from(settings)))
}

#[get("/setting")]
async fn get_setting(
    state: web::Data<AppState>,
    query: web::Query<RestaurantQuery>,
) -> AppResult<impl Responder> {
    let restaurant_id = query.id()?;
    let settings = state
        .settings
        .get(restaurant_id)
        .await?
        .ok_or_else(|| AppError::not_found_id("Configuración", &restaurant_id.to_hex()))?;
    Ok(HttpResponse::Ok().json(SettingsResponse::from(settings)))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(save_setting);
    cfg.service(update_setting);
    cfg.service(get_setting);
}
