use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::NaiveDateTime;
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use reservation_scheduler::api::reservation::ReservationResponse;
use reservation_scheduler::api::setting::SettingsResponse;
use reservation_scheduler::api::table::TableResponse;
use reservation_scheduler::api::{self, AppState, ErrorResponse};
use reservation_scheduler::db::MemoryRepo;
use reservation_scheduler::time::FixedClock;

fn state() -> web::Data<AppState> {
    let now = NaiveDateTime::parse_from_str("2024-05-31 10:00", "%Y-%m-%d %H:%M").unwrap();
    web::Data::new(AppState::new(
        Arc::new(MemoryRepo::new()),
        Arc::new(FixedClock(now)),
        Duration::from_secs(3),
    ))
}

fn settings_body() -> serde_json::Value {
    json!({
        "shift_start": "09:00",
        "shift_end": "22:00",
        "slot_interval": 30,
        "turnaround_time": 90,
        "buffer_time": 15
    })
}

fn booking_body(start: &str, party_size: i32) -> serde_json::Value {
    json!({
        "name": "Luis Pérez",
        "phone_number": "600111222",
        "party_size": party_size,
        "date": "2024-06-01",
        "start_time": start
    })
}

#[actix_web::test]
async fn health_is_outside_the_api_scope() {
    let app = test::init_service(App::new().app_data(state()).configure(api::init_routes)).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn full_booking_flow() {
    let app = test::init_service(App::new().app_data(state()).configure(api::init_routes)).await;
    let rid = ObjectId::new().to_hex();

    // Configuración con los alias del frontend
    let req = test::TestRequest::post()
        .uri(&format!("/api/setting?resturant_id={rid}"))
        .set_json(json!({
            "shift_start_time": "9:00 AM",
            "shift_end_time": "10:00 PM",
            "time_slot_intervel": 30,
            "turn_around_time": 90,
            "buffer_time": 15
        }))
        .to_request();
    let saved: SettingsResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(saved.shift_start, "9:00 AM");
    assert_eq!(saved.reservation_duration, 105);

    let req = test::TestRequest::post()
        .uri(&format!("/api/tables?resturant_id={rid}"))
        .set_json(json!({ "table_name": "A", "table_number": "1", "capacity": 4 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let table: TableResponse = test::read_body_json(resp).await;
    assert!(table.is_available);

    let req = test::TestRequest::post()
        .uri(&format!("/api/reservations?resturant_id={rid}"))
        .set_json(booking_body("12:00", 2))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let booked: ReservationResponse = test::read_body_json(resp).await;
    assert_eq!(booked.table, "A");
    assert_eq!(booked.table_id, table.id);
    assert_eq!(booked.end_time, "1:45 PM");

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/available-slots?resturant_id={rid}&table_id={}&selected_date=2024-06-01",
            table.id
        ))
        .to_request();
    let slots: Vec<String> = test::call_and_read_body_json(&app, req).await;
    assert!(slots.contains(&"10:00 AM".to_string()));
    assert!(!slots.contains(&"12:00 PM".to_string()));
    assert!(slots.contains(&"2:00 PM".to_string()));

    let req = test::TestRequest::get()
        .uri(&format!("/api/reservations?restaurant_id={rid}&date=2024-06-01"))
        .to_request();
    let listed: Vec<ReservationResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, booked.id);

    let req = test::TestRequest::post()
        .uri(&format!("/api/reservation/{}/cancel?resturant_id={rid}", booked.id))
        .to_request();
    let cancelled: ReservationResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(cancelled.id, booked.id);

    let req = test::TestRequest::get()
        .uri(&format!("/api/reservations?resturant_id={rid}&status=Confirmed"))
        .to_request();
    let confirmed: Vec<ReservationResponse> = test::call_and_read_body_json(&app, req).await;
    assert!(confirmed.is_empty());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/tables/A?resturant_id={rid}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn booking_errors_map_to_status_and_code() {
    let app = test::init_service(App::new().app_data(state()).configure(api::init_routes)).await;
    let rid = ObjectId::new().to_hex();

    let req = test::TestRequest::post()
        .uri(&format!("/api/tables?resturant_id={rid}"))
        .set_json(json!({ "table_name": "A", "capacity": 4 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    // Sin configuración
    let req = test::TestRequest::post()
        .uri(&format!("/api/reservations?resturant_id={rid}"))
        .set_json(booking_body("12:00", 2))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "settings_not_configured");
    assert!(!body.retryable);

    let req = test::TestRequest::post()
        .uri(&format!("/api/setting?resturant_id={rid}"))
        .set_json(settings_body())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let cases = [
        (booking_body("12:00", 9), "no_table_for_party_size"),
        (booking_body("20:45", 2), "outside_operating_hours"),
    ];
    for (body, code) in cases {
        let req = test::TestRequest::post()
            .uri(&format!("/api/reservations?resturant_id={rid}"))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let error: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(error.error, code);
    }

    let req = test::TestRequest::post()
        .uri(&format!("/api/reservations?resturant_id={rid}"))
        .set_json(booking_body("19:00", 2))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri(&format!("/api/reservations?resturant_id={rid}"))
        .set_json(booking_body("19:30", 2))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(error.error, "no_available_table");

    // Con reservas pendientes la mesa no se puede borrar
    let req = test::TestRequest::delete()
        .uri(&format!("/api/tables/A?resturant_id={rid}"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn malformed_requests_are_validation_errors() {
    let app = test::init_service(App::new().app_data(state()).configure(api::init_routes)).await;
    let rid = ObjectId::new().to_hex();

    // restaurante inválido
    let req = test::TestRequest::get()
        .uri("/api/tables?resturant_id=no-es-un-id")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(error.error, "validation_error");

    // falta el parámetro
    let req = test::TestRequest::get().uri("/api/tables").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    // JSON sin campos obligatorios
    let req = test::TestRequest::post()
        .uri(&format!("/api/reservations?resturant_id={rid}"))
        .set_json(json!({ "name": "Sin fecha" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(error.error, "validation_error");

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/available-slots?resturant_id={rid}&table_id={}&selected_date=01-06-2024",
            ObjectId::new().to_hex()
        ))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/api/setting?resturant_id={rid}"))
        .set_json(json!({
            "shift_start": "22:00",
            "shift_end": "09:00",
            "slot_interval": 30,
            "turnaround_time": 90
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn settings_can_be_read_back_and_updated() {
    let app = test::init_service(App::new().app_data(state()).configure(api::init_routes)).await;
    let rid = ObjectId::new().to_hex();

    let req = test::TestRequest::get()
        .uri(&format!("/api/setting?resturant_id={rid}"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::put()
        .uri(&format!("/api/setting?resturant_id={rid}"))
        .set_json(settings_body())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/setting?resturant_id={rid}"))
        .set_json(settings_body())
        .to_request();
    let created: SettingsResponse = test::call_and_read_body_json(&app, req).await;

    let mut changed = settings_body();
    changed["buffer_time"] = json!(30);
    let req = test::TestRequest::put()
        .uri(&format!("/api/setting?resturant_id={rid}"))
        .set_json(changed)
        .to_request();
    let updated: SettingsResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.reservation_duration, 120);

    let req = test::TestRequest::get()
        .uri(&format!("/api/setting?resturant_id={rid}"))
        .to_request();
    let fetched: SettingsResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.buffer_time, 30);
    assert_eq!(fetched.shift_end, "10:00 PM");
}
