//! # Configuración
//!
//! Todo se lee de variables de entorno (cargadas antes desde `.env` con `dotenvy`).
//! Un valor ausente o inválido usa el valor por defecto y queda registrado en el log.

use std::{env, fmt, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

/// Backend de persistencia
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    MongoDb,
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MongoDb => f.write_str("mongodb"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            "memory" => Ok(Self::Memory),
            other => Err(format!("backend desconocido '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub bind_address: String,
    pub storage: StorageBackend,
    /// Plazo máximo de cada operación del scheduler
    pub request_timeout: Duration,
    /// Intentos para lecturas de base de datos (las escrituras nunca se reintentan)
    pub read_retries: u32,
}

impl Config {
    pub fn load() -> Self {
        let defaults = Self::default();
        Self {
            mongodb_uri: try_load("MONGODB_URI", defaults.mongodb_uri),
            mongodb_database: try_load("MONGODB_DATABASE", defaults.mongodb_database),
            bind_address: try_load("BIND_ADDRESS", defaults.bind_address),
            storage: try_load("STORAGE_BACKEND", defaults.storage),
            request_timeout: Duration::from_millis(try_load("REQUEST_TIMEOUT_MS", 3000u64)),
            read_retries: try_load("READ_RETRIES", defaults.read_retries).max(1),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_database: "reservation_scheduler".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
            storage: StorageBackend::MongoDb,
            request_timeout: Duration::from_millis(3000),
            read_retries: 3,
        }
    }
}

fn try_load<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => parse_or_default(key, &raw, default),
        Err(_) => {
            info!("{key} no definido, usando valor por defecto: {default}");
            default
        }
    }
}

fn parse_or_default<T: FromStr + Display>(key: &str, raw: &str, default: T) -> T
where
    T::Err: Display,
{
    raw.parse().unwrap_or_else(|e| {
        warn!("Valor inválido para {key} ('{raw}'): {e}; usando {default}");
        default
    })
}
