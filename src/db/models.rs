use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SLOT_INTERVAL: i32 = 30;
pub const DEFAULT_SOURCE: &str = "Phone";

/// Mesa de un restaurante. Su ocupación nunca se guarda aquí: se deriva de las reservas.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Table {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub restaurant_id: ObjectId,
    pub table_name: String,
    pub table_number: String,
    pub capacity: i32,
    /// Interruptor manual, independiente de las reservas
    pub is_available: bool,
    pub created_at: i64, // timestamp unix
}

/// Parámetros de operación de un restaurante (una fila por restaurante).
///
/// Las horas se guardan en minutos desde medianoche.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub restaurant_id: ObjectId,
    pub shift_start: i32,
    pub shift_end: i32,
    pub slot_interval: i32,
    pub turnaround_time: i32,
    pub buffer_time: i32,
    pub reservation_duration: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Settings {
    /// Minutos que una reserva bloquea la mesa: turnaround + buffer
    pub fn duration(&self) -> i32 {
        self.turnaround_time + self.buffer_time
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReservationStatus {
    #[default]
    Confirmed,
    Pending,
    Completed,
    Cancelled,
    #[serde(rename = "No Show", alias = "No-show", alias = "NoShow")]
    NoShow,
}

impl ReservationStatus {
    /// Las reservas canceladas liberan la mesa
    pub fn holds_table(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Valor tal y como se guarda en la base de datos
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "Confirmed",
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::NoShow => "No Show",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Reservation {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub restaurant_id: ObjectId,
    pub table_id: ObjectId,
    /// Nombre de la mesa en el momento de la reserva
    pub table_name: String,
    pub name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub party_size: i32,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub start_minutes: i32,
    pub end_minutes: i32,
    pub notes: Option<String>,
    pub status: ReservationStatus,
    pub source: String,
    pub created_at: i64,
    pub updated_at: i64,
}

pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
