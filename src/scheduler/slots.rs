//! Aritmética de intervalos y recorrido de franjas.
//!
//! Un intervalo es `[inicio, fin)` en minutos desde medianoche.

use mongodb::bson::oid::ObjectId;

use crate::db::models::{Reservation, Settings};

pub type Interval = (i32, i32);

/// Intervalo que bloquea una reserva que empieza en `start`: `[start, start + turnaround + buffer)`
pub fn occupied_interval(start: i32, settings: &Settings) -> Interval {
    (start, start + settings.duration())
}

/// Test clásico de solapamiento de intervalos semiabiertos
pub fn overlaps(a: Interval, b: Interval) -> bool {
    a.0 < b.1 && b.0 < a.1
}

/// El cliente debe poder salir antes del cierre; el buffer no cuenta contra el turno.
///
/// Solo se limita el final: una hora anterior a la apertura se acepta, aunque
/// el recorrido de franjas nunca la ofrezca.
pub fn fits_shift(start: i32, settings: &Settings) -> bool {
    start + settings.turnaround_time <= settings.shift_end
}

/// Intervalos ocupados por las reservas que retienen la mesa.
///
/// La duración sale de la configuración actual, no del `end_minutes` guardado.
pub fn booked_intervals(
    reservations: &[Reservation],
    settings: &Settings,
    exclude: Option<ObjectId>,
) -> Vec<Interval> {
    reservations
        .iter()
        .filter(|r| r.status.holds_table())
        .filter(|r| exclude != Some(r.id))
        .map(|r| occupied_interval(r.start_minutes, settings))
        .collect()
}

pub fn conflicts(booked: &[Interval], wanted: Interval) -> bool {
    booked.iter().any(|&b| overlaps(wanted, b))
}

/// Recorre el turno en pasos de `slot_interval` y devuelve los inicios libres.
///
/// `not_before` descarta las franjas anteriores (hoy, antes de la hora actual)
/// sin cortar el recorrido.
pub fn free_slots(settings: &Settings, booked: &[Interval], not_before: Option<i32>) -> Vec<i32> {
    let mut slots = Vec::new();
    if settings.slot_interval <= 0 {
        return slots;
    }

    let mut current = settings.shift_start;
    while current + settings.turnaround_time <= settings.shift_end {
        let past = not_before.is_some_and(|cutoff| current < cutoff);
        if !past && !conflicts(booked, occupied_interval(current, settings)) {
            slots.push(current);
        }
        current += settings.slot_interval;
    }

    slots
}
