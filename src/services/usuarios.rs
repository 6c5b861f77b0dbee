use sqlx::PgPool;
use uuid::Uuid;

use super::estado::{cambiar_estado, Entidad};
use super::hay_duplicado;
use crate::auth::{self, ROL_USUARIO};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::usuario::{
    ActualizarUsuario, CambiarPassword, LoginRequest, LoginResponse, NuevoUsuario, Usuario,
};
use crate::models::{fusionar, opcional, requerido, EstadoRespuesta};

const COLUMNAS: &str = "id, nombre, usuario, email, rol, activo, created_at, updated_at";

const SQL_USUARIO_DUPLICADO: &str = "SELECT EXISTS(SELECT 1 FROM usuarios \
     WHERE LOWER(usuario) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))";

const SQL_EMAIL_DUPLICADO: &str = "SELECT EXISTS(SELECT 1 FROM usuarios \
     WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))";

#[derive(sqlx::FromRow)]
struct Credenciales {
    id: Uuid,
    password_hash: String,
    activo: bool,
}

pub async fn listar(pool: &PgPool, activo: Option<bool>) -> Result<Vec<Usuario>, ApiError> {
    let sql = format!(
        "SELECT {} FROM usuarios WHERE ($1::boolean IS NULL OR activo = $1) ORDER BY nombre",
        COLUMNAS
    );
    Ok(sqlx::query_as::<_, Usuario>(&sql).bind(activo).fetch_all(pool).await?)
}

pub async fn obtener(pool: &PgPool, id: Uuid) -> Result<Usuario, ApiError> {
    let sql = format!("SELECT {} FROM usuarios WHERE id = $1", COLUMNAS);
    sqlx::query_as::<_, Usuario>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Usuario"))
}

async fn verificar_unicidad(
    pool: &PgPool,
    usuario: &str,
    email: Option<&str>,
    excluir: Option<Uuid>,
) -> Result<(), ApiError> {
    if hay_duplicado(pool, SQL_USUARIO_DUPLICADO, usuario, excluir).await? {
        return Err(ApiError::Conflicto(format!("El usuario '{}' ya existe", usuario)));
    }
    if let Some(email) = email {
        if hay_duplicado(pool, SQL_EMAIL_DUPLICADO, email, excluir).await? {
            return Err(ApiError::Conflicto(format!("El email '{}' ya está registrado", email)));
        }
    }
    Ok(())
}

pub async fn crear(pool: &PgPool, datos: NuevoUsuario) -> Result<Usuario, ApiError> {
    let usuario = datos.usuario.trim().to_string();
    let email = opcional(&datos.email);
    verificar_unicidad(pool, &usuario, email.as_deref(), None).await?;

    let hash = auth::hash_password(&datos.password)?;
    let rol = opcional(&datos.rol).unwrap_or_else(|| ROL_USUARIO.to_string());

    let sql = format!(
        "INSERT INTO usuarios (nombre, usuario, email, password_hash, rol) VALUES ($1, $2, $3, $4, $5) \
         RETURNING {}",
        COLUMNAS
    );
    let creado = sqlx::query_as::<_, Usuario>(&sql)
        .bind(datos.nombre.trim())
        .bind(&usuario)
        .bind(&email)
        .bind(&hash)
        .bind(&rol)
        .fetch_one(pool)
        .await?;

    tracing::info!(id = %creado.id, usuario = %creado.usuario, rol = %creado.rol, "usuario creado");
    Ok(creado)
}

pub async fn actualizar(
    pool: &PgPool,
    id: Uuid,
    datos: ActualizarUsuario,
) -> Result<Usuario, ApiError> {
    let existente = obtener(pool, id).await?;

    let usuario = requerido(&datos.usuario, &existente.usuario);
    let email = fusionar(&datos.email, existente.email);
    verificar_unicidad(pool, &usuario, email.as_deref(), Some(id)).await?;

    let sql = format!(
        "UPDATE usuarios SET nombre = $1, usuario = $2, email = $3, rol = $4, updated_at = NOW() \
         WHERE id = $5 RETURNING {}",
        COLUMNAS
    );
    Ok(sqlx::query_as::<_, Usuario>(&sql)
        .bind(requerido(&datos.nombre, &existente.nombre))
        .bind(&usuario)
        .bind(&email)
        .bind(requerido(&datos.rol, &existente.rol))
        .bind(id)
        .fetch_one(pool)
        .await?)
}

pub async fn cambiar_password(
    pool: &PgPool,
    id: Uuid,
    datos: CambiarPassword,
) -> Result<(), ApiError> {
    let hash = auth::hash_password(&datos.password)?;
    let resultado = sqlx::query("UPDATE usuarios SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(&hash)
        .bind(id)
        .execute(pool)
        .await?;

    if resultado.rows_affected() == 0 {
        return Err(ApiError::no_encontrado("Usuario"));
    }
    tracing::info!(%id, "contraseña actualizada");
    Ok(())
}

pub async fn dar_de_baja(
    pool: &PgPool,
    id: Uuid,
    solicitante: Uuid,
) -> Result<EstadoRespuesta, ApiError> {
    if id == solicitante {
        return Err(ApiError::SolicitudInvalida(
            "No puede darse de baja a sí mismo".into(),
        ));
    }
    cambiar_estado(pool, Entidad::Usuario, id, None, false).await
}

/// Verifica credenciales de un usuario activo y emite su token.
pub async fn login(
    pool: &PgPool,
    config: &Config,
    datos: LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let credenciales = sqlx::query_as::<_, Credenciales>(
        "SELECT id, password_hash, activo FROM usuarios WHERE LOWER(usuario) = LOWER($1)",
    )
    .bind(datos.usuario.trim())
    .fetch_optional(pool)
    .await?;

    let credenciales = match credenciales {
        Some(c) if c.activo && auth::verificar_password(&datos.password, &c.password_hash) => c,
        _ => {
            tracing::warn!(usuario = %datos.usuario.trim(), "intento de acceso rechazado");
            return Err(ApiError::NoAutorizado("Usuario o contraseña incorrectos".into()));
        }
    };

    let usuario = obtener(pool, credenciales.id).await?;
    let token = auth::emitir_token(config, usuario.id, &usuario.rol)?;

    tracing::info!(id = %usuario.id, "inicio de sesión");
    Ok(LoginResponse { token, usuario })
}
