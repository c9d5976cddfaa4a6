//! # Manejo de errores
//!
//! Un único `AppError` para toda la aplicación. Cada variante sabe su código
//! HTTP y un código estable (`error`) para que el frontend distinga "no hay mesa
//! para ese tamaño" de "no hay hueco a esa hora" o de "fallo del sistema".

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::error::Error;
use thiserror::Error;

/// Tipos de error de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    /// Error de base de datos con la operación que lo provocó
    #[error("Error de base de datos en operación '{operation}': {source}")]
    Database {
        operation: String,
        #[source]
        source: mongodb::error::Error,
    },

    /// Error de validación con campo específico
    #[error("Error de validación en campo '{field}': {message}")]
    ValidationWithField { field: String, message: String },

    /// Error de validación general
    #[error("Error de validación: {0}")]
    Validation(String),

    /// El restaurante no tiene configuración de turnos
    #[error("Configuración no disponible: {0}")]
    NotConfigured(String),

    /// Ninguna mesa disponible tiene capacidad suficiente
    #[error("No hay mesas con capacidad para {party_size} personas")]
    NoTableForPartySize { party_size: i32 },

    /// La reserva terminaría después del cierre del turno
    #[error("La reserva de las {start} termina después del cierre del turno ({shift_end})")]
    OutsideOperatingHours { start: String, shift_end: String },

    /// Todas las mesas candidatas están ocupadas en ese horario
    #[error("No hay mesas libres para las {start} del {date}")]
    NoAvailableTable { date: String, start: String },

    /// Error de recurso no encontrado
    #[error("No encontrado: {resource_type} con ID '{id}'")]
    NotFoundWithId { resource_type: String, id: String },

    /// Error de no encontrado simple
    #[error("No encontrado: {0}")]
    NotFound(String),

    /// Error de conflicto
    #[error("Conflicto: {0}")]
    Conflict(String),

    /// La operación superó su plazo
    #[error("La operación '{operation}' superó el tiempo máximo")]
    Timeout { operation: String },

    /// Error interno (conexión o índices al arrancar)
    #[error("Error interno: {0}")]
    Internal(String),
}

// Métodos helper para crear errores con contexto
impl AppError {
    /// Crea un error de base de datos con contexto de operación.
    ///
    /// Las violaciones de índice único se convierten en `Conflict`.
    pub fn database(operation: &str, source: mongodb::error::Error) -> Self {
        if is_duplicate_key(&source) {
            return Self::Conflict(format!("registro duplicado en '{}'", operation));
        }
        Self::Database {
            operation: operation.to_string(),
            source,
        }
    }

    /// Crea un error de validación con campo específico
    pub fn validation_field(field: &str, message: &str) -> Self {
        Self::ValidationWithField {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    /// Crea un error de no encontrado con ID
    pub fn not_found_id(resource_type: &str, id: &str) -> Self {
        Self::NotFoundWithId {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn timeout(operation: &str) -> Self {
        Self::Timeout {
            operation: operation.to_string(),
        }
    }

    /// Código estable que recibe el cliente en el campo `error`
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database { .. } => "storage_error",
            Self::ValidationWithField { .. } | Self::Validation(_) => "validation_error",
            Self::NotConfigured(_) => "settings_not_configured",
            Self::NoTableForPartySize { .. } => "no_table_for_party_size",
            Self::OutsideOperatingHours { .. } => "outside_operating_hours",
            Self::NoAvailableTable { .. } => "no_available_table",
            Self::NotFoundWithId { .. } | Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Timeout { .. } => "timeout",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Si el cliente puede reintentar la misma petición sin cambiarla
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database { .. } | Self::Timeout { .. })
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        _ => false,
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Database { .. } | Self::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::ValidationWithField { .. } | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotConfigured(_) => StatusCode::PRECONDITION_FAILED,
            Self::NoTableForPartySize { .. }
            | Self::OutsideOperatingHours { .. }
            | Self::NoAvailableTable { .. }
            | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFoundWithId { .. } | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Log detallado del error antes de responder
        let message = match self {
            Self::Database { operation, source } => {
                tracing::error!(
                    operation = %operation,
                    error = %source,
                    error_chain = ?source.source(),
                    "Database error occurred"
                );
                "Error de base de datos, inténtelo de nuevo".to_string()
            }
            Self::ValidationWithField { field, message } => {
                tracing::warn!(field = %field, message = %message, "Validation error");
                format!("Campo '{}': {}", field, message)
            }
            Self::NotFoundWithId { resource_type, id } => {
                tracing::info!(resource_type = %resource_type, id = %id, "Resource not found");
                format!("{} con ID '{}' no encontrado", resource_type, id)
            }
            Self::Internal(message) => {
                tracing::error!(message = %message, "Internal error");
                "Error interno del servidor".to_string()
            }
            Self::Timeout { operation } => {
                tracing::warn!(operation = %operation, "Operation timed out");
                self.to_string()
            }
            error => {
                tracing::info!(code = error.code(), error = %error, "Request rejected");
                error.to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.code().to_string(),
            message,
            retryable: self.is_retryable(),
        })
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub retryable: bool,
}

pub type AppResult<T> = Result<T, AppError>;

// Conversión automática desde mongodb::error::Error
impl From<mongodb::error::Error> for AppError {
    fn from(error: mongodb::error::Error) -> Self {
        Self::database("database_operation", error)
    }
}

// Conversión desde errores de ObjectId
impl From<mongodb::bson::oid::Error> for AppError {
    fn from(e: mongodb::bson::oid::Error) -> Self {
        Self::validation_field("ObjectId", &e.to_string())
    }
}
