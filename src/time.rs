//! # Utilidades de tiempo
//!
//! Conversión entre horas de reloj ("9:30 PM", "21:30") y minutos desde
//! medianoche. Todo el cálculo de franjas y solapamientos trabaja en minutos.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Parsea una hora en formato 12h ("H:MM AM/PM") o 24h ("HH:MM").
///
/// Devuelve `None` si el texto está vacío o no encaja en ninguno de los dos formatos.
pub fn parse_clock(text: &str) -> Option<i32> {
    let text = text.trim().to_uppercase();
    if text.is_empty() {
        return None;
    }

    let parsed = if text.contains("AM") || text.contains("PM") {
        NaiveTime::parse_from_str(&text, "%I:%M %p")
    } else {
        NaiveTime::parse_from_str(&text, "%H:%M")
    };

    parsed.ok().map(minutes_of_day)
}

/// Versión tolerante de [`parse_clock`]: cualquier entrada inválida vale medianoche (`0`).
///
/// Las entradas de usuario pasan por [`parse_clock`] y se rechazan si no son válidas.
pub fn time_to_minutes(text: &str) -> i32 {
    parse_clock(text).unwrap_or(0)
}

/// Convierte minutos desde medianoche a "H:MM AM/PM".
///
/// La hora se normaliza módulo 24, así que `minutes_to_time(1440 + 30)` es "12:30 AM".
pub fn minutes_to_time(minutes: i32) -> String {
    let hour = minutes.div_euclid(60).rem_euclid(24);
    let minute = minutes.rem_euclid(60);
    let period = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, minute, period)
}

pub fn minutes_of_day(time: NaiveTime) -> i32 {
    (time.hour() * 60 + time.minute()) as i32
}

/// Fuente de la hora actual, inyectable para poder fijar "hoy" en tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn minutes_now(&self) -> i32 {
        minutes_of_day(self.now().time())
    }
}

/// Reloj local del servidor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Reloj detenido en un instante concreto.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
