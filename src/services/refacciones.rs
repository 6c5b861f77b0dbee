use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{exigir_activo, hay_duplicado};
use crate::error::ApiError;
use crate::models::refaccion::{ActualizarRefaccion, FiltroRefacciones, NuevaRefaccion, Refaccion};
use crate::models::{fusionar, opcional, patron_busqueda, referencia, requerido};

const SELECT: &str = "SELECT r.id, r.clave, r.nombre, r.descripcion, r.unidad_id, u.nombre AS unidad, \
     r.proveedor_id, p.nombre AS proveedor, r.costo, r.existencia, r.stock_minimo, r.activo, \
     r.created_at, r.updated_at \
     FROM refacciones r \
     JOIN unidades u ON u.id = r.unidad_id \
     LEFT JOIN proveedores p ON p.id = r.proveedor_id";

const SQL_CLAVE_DUPLICADA: &str = "SELECT EXISTS(SELECT 1 FROM refacciones \
     WHERE UPPER(clave) = UPPER($1) AND ($2::uuid IS NULL OR id <> $2))";

pub async fn listar(pool: &PgPool, filtro: &FiltroRefacciones) -> Result<Vec<Refaccion>, ApiError> {
    let sql = format!(
        "{} WHERE ($1::boolean IS NULL OR r.activo = $1) \
         AND ($2::text IS NULL OR r.clave ILIKE $2 OR r.nombre ILIKE $2) \
         ORDER BY r.clave",
        SELECT
    );
    Ok(sqlx::query_as::<_, Refaccion>(&sql)
        .bind(filtro.activo)
        .bind(patron_busqueda(&filtro.busqueda))
        .fetch_all(pool)
        .await?)
}

pub async fn obtener(pool: &PgPool, id: Uuid) -> Result<Refaccion, ApiError> {
    let sql = format!("{} WHERE r.id = $1", SELECT);
    sqlx::query_as::<_, Refaccion>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Refacción"))
}

async fn verificar_clave(
    pool: &PgPool,
    clave: &str,
    excluir: Option<Uuid>,
) -> Result<(), ApiError> {
    if hay_duplicado(pool, SQL_CLAVE_DUPLICADA, clave, excluir).await? {
        return Err(ApiError::Conflicto(format!(
            "Ya existe una refacción con la clave '{}'",
            clave
        )));
    }
    Ok(())
}

pub async fn crear(pool: &PgPool, datos: NuevaRefaccion) -> Result<Refaccion, ApiError> {
    let clave = datos.clave.trim().to_uppercase();
    verificar_clave(pool, &clave, None).await?;
    exigir_activo(pool, "unidades", datos.unidad_id, "Unidad").await?;
    if let Some(proveedor_id) = datos.proveedor_id {
        exigir_activo(pool, "proveedores", proveedor_id, "Proveedor").await?;
    }

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO refacciones (clave, nombre, descripcion, unidad_id, proveedor_id, costo, stock_minimo) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
    )
    .bind(&clave)
    .bind(datos.nombre.trim())
    .bind(opcional(&datos.descripcion))
    .bind(datos.unidad_id)
    .bind(datos.proveedor_id)
    .bind(datos.costo)
    .bind(datos.stock_minimo.unwrap_or(Decimal::ZERO))
    .fetch_one(pool)
    .await?;

    tracing::info!(%id, %clave, "refacción creada");
    obtener(pool, id).await
}

pub async fn actualizar(
    pool: &PgPool,
    id: Uuid,
    datos: ActualizarRefaccion,
) -> Result<Refaccion, ApiError> {
    let existente = obtener(pool, id).await?;

    let clave = requerido(&datos.clave, &existente.clave).to_uppercase();
    if clave != existente.clave {
        verificar_clave(pool, &clave, Some(id)).await?;
    }

    let unidad_id = datos.unidad_id.unwrap_or(existente.unidad_id);
    if unidad_id != existente.unidad_id {
        exigir_activo(pool, "unidades", unidad_id, "Unidad").await?;
    }
    let proveedor_id = referencia(datos.proveedor_id, existente.proveedor_id);
    if let Some(nuevo) = proveedor_id.filter(|p| Some(*p) != existente.proveedor_id) {
        exigir_activo(pool, "proveedores", nuevo, "Proveedor").await?;
    }

    sqlx::query(
        "UPDATE refacciones SET clave = $1, nombre = $2, descripcion = $3, unidad_id = $4, \
         proveedor_id = $5, costo = $6, stock_minimo = $7, updated_at = NOW() WHERE id = $8",
    )
    .bind(&clave)
    .bind(requerido(&datos.nombre, &existente.nombre))
    .bind(fusionar(&datos.descripcion, existente.descripcion))
    .bind(unidad_id)
    .bind(proveedor_id)
    .bind(datos.costo.unwrap_or(existente.costo))
    .bind(datos.stock_minimo.unwrap_or(existente.stock_minimo))
    .bind(id)
    .execute(pool)
    .await?;

    obtener(pool, id).await
}
