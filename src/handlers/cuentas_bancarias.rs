use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UsuarioActual;
use crate::error::ApiError;
use crate::models::cuenta_bancaria::{
    ActualizarCuentaBancaria, FiltroCuentas, NuevaCuentaBancaria, NuevoMovimientoCuenta,
};
use crate::models::validar;
use crate::services::cuentas_bancarias;
use crate::services::estado::{cambiar_estado, Entidad};

pub async fn listar(
    pool: web::Data<PgPool>,
    filtro: web::Query<FiltroCuentas>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(cuentas_bancarias::listar(&pool, &filtro).await?))
}

pub async fn obtener(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(cuentas_bancarias::obtener(&pool, id.into_inner()).await?))
}

pub async fn crear(
    pool: web::Data<PgPool>,
    datos: web::Json<NuevaCuentaBancaria>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let cuenta = cuentas_bancarias::crear(&pool, datos.into_inner(), usuario.id).await?;
    Ok(HttpResponse::Created().json(cuenta))
}

pub async fn actualizar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    datos: web::Json<ActualizarCuentaBancaria>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let cuenta = cuentas_bancarias::actualizar(&pool, id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(cuenta))
}

pub async fn dar_de_baja(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let estado =
        cambiar_estado(&pool, Entidad::CuentaBancaria, id.into_inner(), None, false).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub async fn activar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let estado = cambiar_estado(&pool, Entidad::CuentaBancaria, id.into_inner(), None, true).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub async fn registrar_movimiento(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    datos: web::Json<NuevoMovimientoCuenta>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let movimiento = cuentas_bancarias::registrar_movimiento(
        &pool,
        id.into_inner(),
        datos.into_inner(),
        usuario.id,
    )
    .await?;
    Ok(HttpResponse::Created().json(movimiento))
}

pub async fn listar_movimientos(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let movimientos = cuentas_bancarias::listar_movimientos(&pool, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(movimientos))
}

pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cuentas-bancarias")
            .route("", web::get().to(listar))
            .route("", web::post().to(crear))
            .route("/{id}", web::get().to(obtener))
            .route("/{id}", web::put().to(actualizar))
            .route("/{id}/baja", web::patch().to(dar_de_baja))
            .route("/{id}/activar", web::patch().to(activar))
            .route("/{id}/movimientos", web::get().to(listar_movimientos))
            .route("/{id}/movimientos", web::post().to(registrar_movimiento)),
    );
}
