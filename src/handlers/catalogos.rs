use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UsuarioActual;
use crate::error::ApiError;
use crate::models::catalogo::{ActualizarElementoCatalogo, Catalogo, NuevoElementoCatalogo};
use crate::models::{validar, FiltroActivo};
use crate::services::catalogos;
use crate::services::estado::{cambiar_estado, Entidad};

// Los cuatro catálogos comparten handlers; el scope de cada uno registra su `Catalogo`.

pub async fn listar(
    pool: web::Data<PgPool>,
    catalogo: web::Data<Catalogo>,
    filtro: web::Query<FiltroActivo>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let elementos = catalogos::listar(&pool, **catalogo, filtro.activo).await?;
    Ok(HttpResponse::Ok().json(elementos))
}

pub async fn obtener(
    pool: web::Data<PgPool>,
    catalogo: web::Data<Catalogo>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let elemento = catalogos::obtener(&pool, **catalogo, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(elemento))
}

pub async fn crear(
    pool: web::Data<PgPool>,
    catalogo: web::Data<Catalogo>,
    datos: web::Json<NuevoElementoCatalogo>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let elemento = catalogos::crear(&pool, **catalogo, datos.into_inner()).await?;
    Ok(HttpResponse::Created().json(elemento))
}

pub async fn actualizar(
    pool: web::Data<PgPool>,
    catalogo: web::Data<Catalogo>,
    id: web::Path<Uuid>,
    datos: web::Json<ActualizarElementoCatalogo>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let elemento =
        catalogos::actualizar(&pool, **catalogo, id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(elemento))
}

pub async fn dar_de_baja(
    pool: web::Data<PgPool>,
    catalogo: web::Data<Catalogo>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let estado =
        cambiar_estado(&pool, Entidad::Catalogo(**catalogo), id.into_inner(), None, false).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub async fn activar(
    pool: web::Data<PgPool>,
    catalogo: web::Data<Catalogo>,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let estado =
        cambiar_estado(&pool, Entidad::Catalogo(**catalogo), id.into_inner(), None, true).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub fn configurar(cfg: &mut web::ServiceConfig) {
    for catalogo in Catalogo::TODOS {
        cfg.service(
            web::scope(catalogo.ruta())
                .app_data(web::Data::new(catalogo))
                .route("", web::get().to(listar))
                .route("", web::post().to(crear))
                .route("/{id}", web::get().to(obtener))
                .route("/{id}", web::put().to(actualizar))
                .route("/{id}/baja", web::patch().to(dar_de_baja))
                .route("/{id}/activar", web::patch().to(activar)),
        );
    }
}
