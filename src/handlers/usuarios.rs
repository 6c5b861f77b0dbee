use actix_web::{web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UsuarioActual;
use crate::error::ApiError;
use crate::models::usuario::{ActualizarUsuario, CambiarPassword, NuevoUsuario};
use crate::models::{validar, FiltroActivo};
use crate::services::estado::{cambiar_estado, Entidad};
use crate::services::usuarios;

// Toda la administración de usuarios exige rol admin.

pub async fn listar(
    pool: web::Data<PgPool>,
    filtro: web::Query<FiltroActivo>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    Ok(HttpResponse::Ok().json(usuarios::listar(&pool, filtro.activo).await?))
}

pub async fn obtener(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    Ok(HttpResponse::Ok().json(usuarios::obtener(&pool, id.into_inner()).await?))
}

pub async fn crear(
    pool: web::Data<PgPool>,
    datos: web::Json<NuevoUsuario>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    validar(&*datos)?;
    Ok(HttpResponse::Created().json(usuarios::crear(&pool, datos.into_inner()).await?))
}

pub async fn actualizar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    datos: web::Json<ActualizarUsuario>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    validar(&*datos)?;
    let actualizado = usuarios::actualizar(&pool, id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(actualizado))
}

pub async fn cambiar_password(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    datos: web::Json<CambiarPassword>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    validar(&*datos)?;
    usuarios::cambiar_password(&pool, id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "mensaje": "Contraseña actualizada" })))
}

pub async fn dar_de_baja(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    Ok(HttpResponse::Ok().json(usuarios::dar_de_baja(&pool, id.into_inner(), usuario.id).await?))
}

pub async fn activar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    let estado = cambiar_estado(&pool, Entidad::Usuario, id.into_inner(), None, true).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/usuarios")
            .route("", web::get().to(listar))
            .route("", web::post().to(crear))
            .route("/{id}", web::get().to(obtener))
            .route("/{id}", web::put().to(actualizar))
            .route("/{id}/password", web::put().to(cambiar_password))
            .route("/{id}/baja", web::patch().to(dar_de_baja))
            .route("/{id}/activar", web::patch().to(activar)),
    );
}
