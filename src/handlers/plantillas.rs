use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UsuarioActual;
use crate::error::ApiError;
use crate::models::plantilla::{ActualizarPlantilla, NuevaPlantilla};
use crate::models::{validar, FiltroActivo};
use crate::services::estado::{cambiar_estado, Entidad};
use crate::services::plantillas;

pub async fn listar(
    pool: web::Data<PgPool>,
    filtro: web::Query<FiltroActivo>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(plantillas::listar(&pool, filtro.activo).await?))
}

pub async fn obtener(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(plantillas::obtener(&pool, id.into_inner()).await?))
}

pub async fn crear(
    pool: web::Data<PgPool>,
    datos: web::Json<NuevaPlantilla>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let plantilla = plantillas::crear(&pool, datos.into_inner()).await?;
    Ok(HttpResponse::Created().json(plantilla))
}

pub async fn actualizar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    datos: web::Json<ActualizarPlantilla>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let plantilla = plantillas::actualizar(&pool, id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(plantilla))
}

pub async fn recalcular(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(plantillas::recalcular(&pool, id.into_inner()).await?))
}

pub async fn dar_de_baja(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let estado = cambiar_estado(&pool, Entidad::Plantilla, id.into_inner(), None, false).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub async fn activar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let estado = cambiar_estado(&pool, Entidad::Plantilla, id.into_inner(), None, true).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/plantillas-equipo")
            .route("", web::get().to(listar))
            .route("", web::post().to(crear))
            .route("/{id}", web::get().to(obtener))
            .route("/{id}", web::put().to(actualizar))
            .route("/{id}/recalcular", web::post().to(recalcular))
            .route("/{id}/baja", web::patch().to(dar_de_baja))
            .route("/{id}/activar", web::patch().to(activar)),
    );
}
