use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UsuarioActual;
use crate::error::ApiError;
use crate::models::equipo::{
    ActualizarEquipo, AsignarEquipo, FiltroEquipos, NuevoEquipo, RetirarEquipo,
};
use crate::models::validar;
use crate::services::equipos;
use crate::services::estado::{cambiar_estado, Entidad};

pub async fn listar(
    pool: web::Data<PgPool>,
    filtro: web::Query<FiltroEquipos>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(equipos::listar(&pool, &filtro).await?))
}

pub async fn obtener(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(equipos::obtener(&pool, id.into_inner()).await?))
}

pub async fn crear(
    pool: web::Data<PgPool>,
    datos: web::Json<NuevoEquipo>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    Ok(HttpResponse::Created().json(equipos::crear(&pool, datos.into_inner()).await?))
}

pub async fn actualizar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    datos: web::Json<ActualizarEquipo>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let equipo = equipos::actualizar(&pool, id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(equipo))
}

pub async fn dar_de_baja(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(equipos::dar_de_baja(&pool, id.into_inner()).await?))
}

pub async fn activar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let estado = cambiar_estado(&pool, Entidad::Equipo, id.into_inner(), None, true).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub async fn asignar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    datos: web::Json<AsignarEquipo>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let equipo = equipos::asignar(&pool, id.into_inner(), datos.into_inner(), usuario.id).await?;
    Ok(HttpResponse::Ok().json(equipo))
}

pub async fn retirar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    datos: Option<web::Json<RetirarEquipo>>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    // El cuerpo es opcional: retirar sin notas.
    let datos = datos.map(web::Json::into_inner).unwrap_or_default();
    validar(&datos)?;
    let equipo = equipos::retirar(&pool, id.into_inner(), datos).await?;
    Ok(HttpResponse::Ok().json(equipo))
}

pub async fn asignaciones(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(equipos::historial(&pool, id.into_inner()).await?))
}

pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/equipos")
            .route("", web::get().to(listar))
            .route("", web::post().to(crear))
            .route("/{id}", web::get().to(obtener))
            .route("/{id}", web::put().to(actualizar))
            .route("/{id}/baja", web::patch().to(dar_de_baja))
            .route("/{id}/activar", web::patch().to(activar))
            .route("/{id}/asignar", web::post().to(asignar))
            .route("/{id}/retirar", web::post().to(retirar))
            .route("/{id}/asignaciones", web::get().to(asignaciones)),
    );
}
