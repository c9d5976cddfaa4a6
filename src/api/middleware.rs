//! # Logging de cadenas de error
//!
//! Recorre `source()` hasta el final para que el log muestre la causa real
//! (p. ej. el error de red debajo de un fallo de MongoDB).

use std::error::Error as StdError;

/// Mensajes de la cadena completa, del error exterior a la causa raíz
pub fn error_chain<E>(error: &E) -> Vec<String>
where
    E: StdError + 'static,
{
    let mut chain = Vec::new();
    let mut current: Option<&dyn StdError> = Some(error);

    while let Some(err) = current {
        chain.push(err.to_string());
        current = err.source();
    }

    chain
}

/// Registra la cadena completa de errores con un contexto opcional
pub fn log_error_chain<E>(error: &E, context: Option<&str>)
where
    E: StdError + 'static,
{
    let chain = error_chain(error);

    match context {
        Some(ctx) => tracing::error!(context = %ctx, error_chain = ?chain, "Error with full chain"),
        None => tracing::error!(error_chain = ?chain, "Error with full chain"),
    }
}

/// Extension trait para Results que registra la cadena de errores sin consumirla
///
/// ```ignore
/// collection
///     .insert_one(reservation)
///     .await
///     .log_error_context("inserting reservation")
///     .map_err(|e| AppError::database("insert_reservation", e))?;
/// ```
pub trait ErrorLogExt<T, E> {
    fn log_error_context(self, context: &str) -> Result<T, E>;
}

impl<T, E> ErrorLogExt<T, E> for Result<T, E>
where
    E: StdError + 'static,
{
    fn log_error_context(self, context: &str) -> Result<T, E> {
        if let Err(ref error) = self {
            log_error_chain(error, Some(context));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(Inner);

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("outer failure")
        }
    }

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection reset")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    impl StdError for Inner {}

    #[test]
    fn chain_walks_to_root_cause() {
        let chain = error_chain(&Outer(Inner));
        assert_eq!(chain, vec!["outer failure", "connection reset"]);
    }

    #[test]
    fn logging_leaves_result_untouched() {
        let result: Result<u8, Outer> = Err(Outer(Inner));
        assert!(result.log_error_context("test").is_err());

        let ok: Result<u8, Outer> = Ok(7);
        assert_eq!(ok.log_error_context("test").ok(), Some(7));
    }
}
