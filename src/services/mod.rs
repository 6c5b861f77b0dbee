pub mod catalogos;
pub mod clientes;
pub mod cuentas_bancarias;
pub mod equipos;
pub mod estado;
pub mod inventario;
pub mod permisos;
pub mod plantillas;
pub mod proveedores;
pub mod refacciones;
pub mod usuarios;

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::error::ApiError;

/// Verifica que `id` exista en `tabla` y esté activo.
pub(crate) async fn exigir_activo<'e, E>(
    ejecutor: E,
    tabla: &'static str,
    id: Uuid,
    etiqueta: &str,
) -> Result<(), ApiError>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT activo FROM {} WHERE id = $1", tabla);
    let activo: Option<bool> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(ejecutor)
        .await?;

    match activo {
        None => Err(ApiError::no_encontrado(etiqueta)),
        Some(false) => Err(ApiError::SolicitudInvalida(format!("{} está dado de baja", etiqueta))),
        Some(true) => Ok(()),
    }
}

/// Ejecuta una consulta `SELECT EXISTS(...)` con `$1 = valor` y `$2 = id a excluir`.
pub(crate) async fn hay_duplicado<'e, E>(
    ejecutor: E,
    sql: &str,
    valor: &str,
    excluir: Option<Uuid>,
) -> Result<bool, ApiError>
where
    E: PgExecutor<'e>,
{
    let existe: bool = sqlx::query_scalar(sql)
        .bind(valor)
        .bind(excluir)
        .fetch_one(ejecutor)
        .await?;
    Ok(existe)
}

/// Igual que [`hay_duplicado`] pero acotado a un registro padre en `$3`.
pub(crate) async fn hay_duplicado_en<'e, E>(
    ejecutor: E,
    sql: &str,
    valor: &str,
    excluir: Option<Uuid>,
    padre: Uuid,
) -> Result<bool, ApiError>
where
    E: PgExecutor<'e>,
{
    let existe: bool = sqlx::query_scalar(sql)
        .bind(valor)
        .bind(excluir)
        .bind(padre)
        .fetch_one(ejecutor)
        .await?;
    Ok(existe)
}
