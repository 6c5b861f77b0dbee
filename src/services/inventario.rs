use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::inventario::{
    Existencia, FiltroExistencias, FiltroKardex, MovimientoInventario, NuevoMovimientoInventario,
};
use crate::models::{opcional, patron_busqueda};

const SELECT_KARDEX: &str = "SELECT m.id, m.refaccion_id, r.clave, r.nombre AS refaccion, m.tipo, m.cantidad, \
     m.existencia_anterior, m.existencia_nueva, m.costo_unitario, m.referencia, m.usuario_id, \
     u.nombre AS usuario, m.fecha \
     FROM movimientos_inventario m \
     JOIN refacciones r ON r.id = m.refaccion_id \
     LEFT JOIN usuarios u ON u.id = m.usuario_id";

pub async fn existencias(
    pool: &PgPool,
    filtro: &FiltroExistencias,
) -> Result<Vec<Existencia>, ApiError> {
    let busqueda = patron_busqueda(&filtro.busqueda);

    Ok(sqlx::query_as::<_, Existencia>(
        "SELECT r.id AS refaccion_id, r.clave, r.nombre, u.nombre AS unidad, r.existencia, r.stock_minimo, \
         r.costo, ROUND(r.existencia * r.costo, 2) AS valor, (r.existencia < r.stock_minimo) AS bajo_minimo \
         FROM refacciones r \
         JOIN unidades u ON u.id = r.unidad_id \
         WHERE r.activo \
         AND ($1::boolean IS NULL OR (r.existencia < r.stock_minimo) = $1) \
         AND ($2::text IS NULL OR r.clave ILIKE $2 OR r.nombre ILIKE $2) \
         ORDER BY r.clave",
    )
    .bind(filtro.bajo_minimo)
    .bind(busqueda)
    .fetch_all(pool)
    .await?)
}

/// Arma la consulta del kardex con solo los filtros presentes.
fn consulta_kardex(filtro: &FiltroKardex) -> QueryBuilder<'_, Postgres> {
    let mut consulta = QueryBuilder::new(SELECT_KARDEX);
    consulta.push(" WHERE TRUE");

    if let Some(refaccion_id) = filtro.refaccion_id {
        consulta.push(" AND m.refaccion_id = ").push_bind(refaccion_id);
    }
    if let Some(inicio) = filtro.fecha_inicio {
        consulta.push(" AND m.fecha::date >= ").push_bind(inicio);
    }
    if let Some(fin) = filtro.fecha_fin {
        consulta.push(" AND m.fecha::date <= ").push_bind(fin);
    }
    if let Some(tipo) = filtro.tipo {
        consulta.push(" AND m.tipo = ").push_bind(tipo.como_str());
    }

    consulta.push(" ORDER BY m.fecha, m.id");
    consulta
}

pub async fn kardex(
    pool: &PgPool,
    filtro: &FiltroKardex,
) -> Result<Vec<MovimientoInventario>, ApiError> {
    filtro.validar_rango()?;

    let mut consulta = consulta_kardex(filtro);
    let movimientos = consulta
        .build_query_as::<MovimientoInventario>()
        .fetch_all(pool)
        .await?;
    Ok(movimientos)
}

pub async fn registrar_movimiento(
    pool: &PgPool,
    datos: NuevoMovimientoInventario,
    usuario_id: Uuid,
) -> Result<MovimientoInventario, ApiError> {
    datos.validar_cantidad()?;

    let mut tx = pool.begin().await?;

    let refaccion: Option<(Decimal, bool)> =
        sqlx::query_as("SELECT existencia, activo FROM refacciones WHERE id = $1 FOR UPDATE")
            .bind(datos.refaccion_id)
            .fetch_optional(&mut *tx)
            .await?;

    let anterior = match refaccion {
        None => return Err(ApiError::no_encontrado("Refacción")),
        Some((_, false)) => {
            return Err(ApiError::SolicitudInvalida("La refacción está dada de baja".into()))
        }
        Some((existencia, true)) => existencia,
    };

    let (nueva, cantidad) = datos.tipo.aplicar(anterior, datos.cantidad)?;

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO movimientos_inventario \
         (refaccion_id, tipo, cantidad, existencia_anterior, existencia_nueva, costo_unitario, referencia, usuario_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
    )
    .bind(datos.refaccion_id)
    .bind(datos.tipo.como_str())
    .bind(cantidad)
    .bind(anterior)
    .bind(nueva)
    .bind(datos.costo_unitario)
    .bind(opcional(&datos.referencia))
    .bind(usuario_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE refacciones SET existencia = $1, updated_at = NOW() WHERE id = $2")
        .bind(nueva)
        .bind(datos.refaccion_id)
        .execute(&mut *tx)
        .await?;

    let sql = format!("{} WHERE m.id = $1", SELECT_KARDEX);
    let movimiento = sqlx::query_as::<_, MovimientoInventario>(&sql)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        refaccion_id = %datos.refaccion_id,
        tipo = datos.tipo.como_str(),
        %anterior,
        %nueva,
        "movimiento de inventario registrado"
    );
    Ok(movimiento)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventario::TipoMovimiento;
    use chrono::NaiveDate;

    #[test]
    fn kardex_sin_filtros() {
        let filtro = FiltroKardex::default();
        let consulta = consulta_kardex(&filtro);
        let sql = consulta.sql();
        assert!(sql.ends_with("WHERE TRUE ORDER BY m.fecha, m.id"));
        assert!(!sql.contains('$'));
    }

    #[test]
    fn kardex_numera_los_filtros_en_orden() {
        let filtro = FiltroKardex {
            refaccion_id: Some(Uuid::new_v4()),
            fecha_inicio: NaiveDate::from_ymd_opt(2024, 1, 1),
            fecha_fin: None,
            tipo: Some(TipoMovimiento::Salida),
        };
        let consulta = consulta_kardex(&filtro);
        let sql = consulta.sql();
        assert!(sql.contains("m.refaccion_id = $1"));
        assert!(sql.contains("m.fecha::date >= $2"));
        assert!(sql.contains("m.tipo = $3"));
        assert!(!sql.contains("<="));
    }
}
