use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::UsuarioActual;
use crate::error::ApiError;
use crate::models::inventario::{FiltroExistencias, FiltroKardex, NuevoMovimientoInventario};
use crate::models::validar;
use crate::services::inventario;

pub async fn existencias(
    pool: web::Data<PgPool>,
    filtro: web::Query<FiltroExistencias>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(inventario::existencias(&pool, &filtro).await?))
}

pub async fn kardex(
    pool: web::Data<PgPool>,
    filtro: web::Query<FiltroKardex>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(inventario::kardex(&pool, &filtro).await?))
}

pub async fn registrar_movimiento(
    pool: web::Data<PgPool>,
    datos: web::Json<NuevoMovimientoInventario>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let movimiento = inventario::registrar_movimiento(&pool, datos.into_inner(), usuario.id).await?;
    Ok(HttpResponse::Created().json(movimiento))
}

pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/inventario")
            .route("/existencias", web::get().to(existencias))
            .route("/kardex", web::get().to(kardex))
            .route("/movimientos", web::post().to(registrar_movimiento)),
    );
}
