pub mod auth;
pub mod catalogos;
pub mod clientes;
pub mod cuentas_bancarias;
pub mod equipos;
pub mod inventario;
pub mod permisos;
pub mod plantillas;
pub mod proveedores;
pub mod refacciones;
pub mod usuarios;

use actix_web::{error, web, HttpResponse};

use crate::error::ApiError;

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "mensaje": "API de servicio de campo",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Errores de extracción (JSON, query, path) con el mismo formato que el resto.
fn extractores(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        error::Error::from(ApiError::SolicitudInvalida(format!("JSON inválido: {}", err)))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        error::Error::from(ApiError::SolicitudInvalida(format!("Parámetros inválidos: {}", err)))
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        error::Error::from(ApiError::SolicitudInvalida(format!("Ruta inválida: {}", err)))
    }));
}

/// Registra todas las rutas bajo `/api`.
pub fn configurar(cfg: &mut web::ServiceConfig) {
    extractores(cfg);
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .configure(auth::configurar)
            .configure(catalogos::configurar)
            .configure(proveedores::configurar)
            .configure(refacciones::configurar)
            .configure(clientes::configurar)
            .configure(equipos::configurar)
            .configure(plantillas::configurar)
            .configure(cuentas_bancarias::configurar)
            .configure(inventario::configurar)
            .configure(permisos::configurar)
            .configure(usuarios::configurar),
    );
}
