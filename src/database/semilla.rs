use sqlx::PgPool;

use crate::auth::{hash_password, ROL_ADMIN};
use crate::config::Config;
use crate::error::ApiError;

/// Crea el usuario administrador inicial cuando la tabla `usuarios` está vacía.
pub async fn sembrar_admin(pool: &PgPool, config: &Config) -> Result<(), ApiError> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM usuarios")
        .fetch_one(pool)
        .await?;

    if total > 0 {
        tracing::debug!(total, "usuarios existentes, se omite la semilla");
        return Ok(());
    }

    let Some(password) = config.admin_password.as_deref() else {
        tracing::warn!("no hay usuarios y ADMIN_PASSWORD no está definido; no se creó administrador");
        return Ok(());
    };

    let password_hash = hash_password(password)?;

    sqlx::query(
        "INSERT INTO usuarios (nombre, usuario, password_hash, rol) VALUES ('Administrador', $1, $2, $3)",
    )
    .bind(&config.admin_usuario)
    .bind(password_hash)
    .bind(ROL_ADMIN)
    .execute(pool)
    .await?;

    tracing::info!(usuario = %config.admin_usuario, "usuario administrador creado");
    Ok(())
}
