use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UsuarioActual;
use crate::error::ApiError;
use crate::models::refaccion::{ActualizarRefaccion, FiltroRefacciones, NuevaRefaccion};
use crate::models::validar;
use crate::services::estado::{cambiar_estado, Entidad};
use crate::services::refacciones;

pub async fn listar(
    pool: web::Data<PgPool>,
    filtro: web::Query<FiltroRefacciones>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(refacciones::listar(&pool, &filtro).await?))
}

pub async fn obtener(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(refacciones::obtener(&pool, id.into_inner()).await?))
}

pub async fn crear(
    pool: web::Data<PgPool>,
    datos: web::Json<NuevaRefaccion>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let refaccion = refacciones::crear(&pool, datos.into_inner()).await?;
    Ok(HttpResponse::Created().json(refaccion))
}

pub async fn actualizar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    datos: web::Json<ActualizarRefaccion>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let refaccion = refacciones::actualizar(&pool, id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(refaccion))
}

pub async fn dar_de_baja(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let estado = cambiar_estado(&pool, Entidad::Refaccion, id.into_inner(), None, false).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub async fn activar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let estado = cambiar_estado(&pool, Entidad::Refaccion, id.into_inner(), None, true).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/refacciones")
            .route("", web::get().to(listar))
            .route("", web::post().to(crear))
            .route("/{id}", web::get().to(obtener))
            .route("/{id}", web::put().to(actualizar))
            .route("/{id}/baja", web::patch().to(dar_de_baja))
            .route("/{id}/activar", web::patch().to(activar)),
    );
}
