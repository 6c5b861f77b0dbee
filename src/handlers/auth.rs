use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::UsuarioActual;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::usuario::LoginRequest;
use crate::models::validar;
use crate::services::usuarios;

pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    datos: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let respuesta = usuarios::login(&pool, &config, datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(respuesta))
}

pub async fn perfil(
    pool: web::Data<PgPool>,
    usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(usuarios::obtener(&pool, usuario.id).await?))
}

pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(login))
            .route("/perfil", web::get().to(perfil)),
    );
}
