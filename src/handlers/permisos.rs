use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UsuarioActual;
use crate::error::ApiError;
use crate::models::permiso::{AsignarPermisos, NuevoModulo, NuevoSubmodulo};
use crate::models::validar;
use crate::services::estado::{cambiar_estado, Entidad};
use crate::services::permisos;

pub async fn arbol(
    pool: web::Data<PgPool>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    Ok(HttpResponse::Ok().json(permisos::arbol(&pool).await?))
}

pub async fn arbol_usuario(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    Ok(HttpResponse::Ok().json(permisos::arbol_usuario(&pool, id.into_inner()).await?))
}

pub async fn asignar(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    datos: web::Json<AsignarPermisos>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    validar(&*datos)?;
    let arbol = permisos::asignar(&pool, id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(arbol))
}

pub async fn sidebar(
    pool: web::Data<PgPool>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(permisos::sidebar(&pool, &usuario).await?))
}

pub async fn crear_modulo(
    pool: web::Data<PgPool>,
    datos: web::Json<NuevoModulo>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    validar(&*datos)?;
    Ok(HttpResponse::Created().json(permisos::crear_modulo(&pool, datos.into_inner()).await?))
}

pub async fn crear_submodulo(
    pool: web::Data<PgPool>,
    modulo_id: web::Path<Uuid>,
    datos: web::Json<NuevoSubmodulo>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    validar(&*datos)?;
    let submodulo =
        permisos::crear_submodulo(&pool, modulo_id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Created().json(submodulo))
}

async fn cambiar(
    pool: &PgPool,
    usuario: &UsuarioActual,
    entidad: Entidad,
    id: Uuid,
    activo: bool,
) -> Result<HttpResponse, ApiError> {
    usuario.exigir_admin()?;
    let estado = cambiar_estado(pool, entidad, id, None, activo).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub async fn baja_modulo(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    cambiar(&pool, &usuario, Entidad::Modulo, id.into_inner(), false).await
}

pub async fn activar_modulo(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    cambiar(&pool, &usuario, Entidad::Modulo, id.into_inner(), true).await
}

pub async fn baja_submodulo(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    cambiar(&pool, &usuario, Entidad::Submodulo, id.into_inner(), false).await
}

pub async fn activar_submodulo(
    pool: web::Data<PgPool>,
    id: web::Path<Uuid>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    cambiar(&pool, &usuario, Entidad::Submodulo, id.into_inner(), true).await
}

pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/permisos")
            .route("/arbol", web::get().to(arbol))
            .route("/sidebar", web::get().to(sidebar))
            .route("/usuarios/{id}", web::get().to(arbol_usuario))
            .route("/usuarios/{id}", web::put().to(asignar)),
    )
    .service(
        web::scope("/modulos")
            .route("", web::post().to(crear_modulo))
            .route("/{id}/submodulos", web::post().to(crear_submodulo))
            .route("/{id}/baja", web::patch().to(baja_modulo))
            .route("/{id}/activar", web::patch().to(activar_modulo)),
    )
    .service(
        web::scope("/submodulos")
            .route("/{id}/baja", web::patch().to(baja_submodulo))
            .route("/{id}/activar", web::patch().to(activar_submodulo)),
    );
}
