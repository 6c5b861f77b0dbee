use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NoEncontrado(String),
    #[error("{0}")]
    Conflicto(String),
    #[error("{0}")]
    SolicitudInvalida(String),
    #[error("Datos inválidos")]
    Validacion(#[from] ValidationErrors),
    #[error("{0}")]
    NoAutorizado(String),
    #[error("{0}")]
    Prohibido(String),
    #[error("Error de base de datos: {0}")]
    BaseDatos(#[from] sqlx::Error),
    #[error("{0}")]
    Interno(String),
}

impl ApiError {
    pub fn no_encontrado(etiqueta: &str) -> Self {
        ApiError::NoEncontrado(format!("{} no encontrado", etiqueta))
    }

    fn es_duplicado(&self) -> bool {
        match self {
            ApiError::BaseDatos(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoEncontrado(_) => StatusCode::NOT_FOUND,
            ApiError::Conflicto(_) => StatusCode::CONFLICT,
            ApiError::SolicitudInvalida(_) | ApiError::Validacion(_) => StatusCode::BAD_REQUEST,
            ApiError::NoAutorizado(_) => StatusCode::UNAUTHORIZED,
            ApiError::Prohibido(_) => StatusCode::FORBIDDEN,
            ApiError::BaseDatos(_) if self.es_duplicado() => StatusCode::CONFLICT,
            ApiError::BaseDatos(_) | ApiError::Interno(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let cuerpo = match self {
            ApiError::Validacion(errores) => json!({
                "error": self.to_string(),
                "detalles": errores,
            }),
            ApiError::BaseDatos(_) if status == StatusCode::CONFLICT => json!({
                "error": "El registro ya existe",
            }),
            ApiError::BaseDatos(e) => {
                tracing::error!(error = %e, "error de base de datos");
                json!({ "error": "Error interno del servidor" })
            }
            ApiError::Interno(mensaje) => {
                tracing::error!(%mensaje, "error interno");
                json!({ "error": "Error interno del servidor" })
            }
            _ => json!({ "error": self.to_string() }),
        };

        HttpResponse::build(status).json(cuerpo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn codigos_http() {
        assert_eq!(ApiError::no_encontrado("Banco").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflicto("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::SolicitudInvalida("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NoAutorizado("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Prohibido("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::BaseDatos(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn mensaje_no_encontrado() {
        assert_eq!(ApiError::no_encontrado("Cliente").to_string(), "Cliente no encontrado");
    }

    #[test]
    fn validacion_es_400() {
        let mut errores = ValidationErrors::new();
        errores.add("nombre", ValidationError::new("length"));
        let err = ApiError::from(errores);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST);
    }
}
