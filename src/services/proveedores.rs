use sqlx::PgPool;
use uuid::Uuid;

use super::hay_duplicado;
use crate::error::ApiError;
use crate::models::proveedor::{ActualizarProveedor, NuevoProveedor, Proveedor};
use crate::models::{fusionar, opcional, requerido};

const COLUMNAS: &str =
    "id, nombre, rfc, contacto, telefono, email, direccion, activo, created_at, updated_at";

const SQL_NOMBRE_DUPLICADO: &str = "SELECT EXISTS(SELECT 1 FROM proveedores \
     WHERE LOWER(nombre) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))";
const SQL_RFC_DUPLICADO: &str = "SELECT EXISTS(SELECT 1 FROM proveedores \
     WHERE UPPER(rfc) = UPPER($1) AND ($2::uuid IS NULL OR id <> $2))";

pub async fn listar(pool: &PgPool, activo: Option<bool>) -> Result<Vec<Proveedor>, ApiError> {
    let sql = format!(
        "SELECT {} FROM proveedores WHERE ($1::boolean IS NULL OR activo = $1) ORDER BY nombre",
        COLUMNAS
    );
    Ok(sqlx::query_as::<_, Proveedor>(&sql)
        .bind(activo)
        .fetch_all(pool)
        .await?)
}

pub async fn obtener(pool: &PgPool, id: Uuid) -> Result<Proveedor, ApiError> {
    let sql = format!("SELECT {} FROM proveedores WHERE id = $1", COLUMNAS);
    sqlx::query_as::<_, Proveedor>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Proveedor"))
}

async fn verificar_unicos(
    pool: &PgPool,
    nombre: &str,
    rfc: Option<&str>,
    excluir: Option<Uuid>,
) -> Result<(), ApiError> {
    if hay_duplicado(pool, SQL_NOMBRE_DUPLICADO, nombre, excluir).await? {
        return Err(ApiError::Conflicto(format!(
            "Ya existe un proveedor con el nombre '{}'",
            nombre
        )));
    }
    if let Some(rfc) = rfc {
        if hay_duplicado(pool, SQL_RFC_DUPLICADO, rfc, excluir).await? {
            return Err(ApiError::Conflicto(format!(
                "Ya existe un proveedor con el RFC '{}'",
                rfc
            )));
        }
    }
    Ok(())
}

pub async fn crear(pool: &PgPool, datos: NuevoProveedor) -> Result<Proveedor, ApiError> {
    let nombre = datos.nombre.trim().to_string();
    let rfc = opcional(&datos.rfc).map(|r| r.to_uppercase());
    verificar_unicos(pool, &nombre, rfc.as_deref(), None).await?;

    let sql = format!(
        "INSERT INTO proveedores (nombre, rfc, contacto, telefono, email, direccion) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        COLUMNAS
    );
    let proveedor = sqlx::query_as::<_, Proveedor>(&sql)
        .bind(&nombre)
        .bind(rfc)
        .bind(opcional(&datos.contacto))
        .bind(opcional(&datos.telefono))
        .bind(opcional(&datos.email))
        .bind(opcional(&datos.direccion))
        .fetch_one(pool)
        .await?;

    tracing::info!(id = %proveedor.id, "proveedor creado");
    Ok(proveedor)
}

pub async fn actualizar(
    pool: &PgPool,
    id: Uuid,
    datos: ActualizarProveedor,
) -> Result<Proveedor, ApiError> {
    let existente = obtener(pool, id).await?;

    let nombre = requerido(&datos.nombre, &existente.nombre);
    let rfc = fusionar(&datos.rfc, existente.rfc).map(|r| r.to_uppercase());
    verificar_unicos(pool, &nombre, rfc.as_deref(), Some(id)).await?;

    let sql = format!(
        "UPDATE proveedores SET nombre = $1, rfc = $2, contacto = $3, telefono = $4, email = $5, \
         direccion = $6, updated_at = NOW() WHERE id = $7 RETURNING {}",
        COLUMNAS
    );
    Ok(sqlx::query_as::<_, Proveedor>(&sql)
        .bind(&nombre)
        .bind(rfc)
        .bind(fusionar(&datos.contacto, existente.contacto))
        .bind(fusionar(&datos.telefono, existente.telefono))
        .bind(fusionar(&datos.email, existente.email))
        .bind(fusionar(&datos.direccion, existente.direccion))
        .bind(id)
        .fetch_one(pool)
        .await?)
}
