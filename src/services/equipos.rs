use sqlx::PgPool;
use uuid::Uuid;

use super::{clientes, exigir_activo, hay_duplicado};
use crate::error::ApiError;
use crate::models::equipo::{
    ActualizarEquipo, AsignarEquipo, Asignacion, Equipo, FiltroEquipos, NuevoEquipo, RetirarEquipo,
};
use crate::models::{opcional, referencia, requerido, EstadoRespuesta};

const SELECT: &str = "SELECT e.id, e.numero_serie, e.nombre, e.plantilla_id, p.nombre AS plantilla, \
     e.cliente_id, c.nombre AS cliente, e.sucursal_id, s.nombre AS sucursal, e.fecha_asignacion, \
     e.activo, e.created_at, e.updated_at \
     FROM equipos e \
     LEFT JOIN plantillas_equipo p ON p.id = e.plantilla_id \
     LEFT JOIN clientes c ON c.id = e.cliente_id \
     LEFT JOIN cliente_sucursales s ON s.id = e.sucursal_id";

// Las condiciones en el WHERE sostienen las reglas aun con bajas y asignaciones concurrentes.
const SQL_BAJA: &str = "UPDATE equipos SET activo = FALSE, updated_at = NOW() \
     WHERE id = $1 AND activo AND cliente_id IS NULL RETURNING id";

const SQL_ASIGNAR: &str = "UPDATE equipos SET cliente_id = $1, sucursal_id = $2, fecha_asignacion = NOW(), \
     updated_at = NOW() WHERE id = $3 AND activo AND cliente_id IS NULL";

const SQL_SERIE_DUPLICADA: &str = "SELECT EXISTS(SELECT 1 FROM equipos \
     WHERE UPPER(numero_serie) = UPPER($1) AND ($2::uuid IS NULL OR id <> $2))";

pub async fn listar(pool: &PgPool, filtro: &FiltroEquipos) -> Result<Vec<Equipo>, ApiError> {
    let sql = format!(
        "{} WHERE ($1::boolean IS NULL OR e.activo = $1) \
         AND ($2::uuid IS NULL OR e.cliente_id = $2) \
         AND ($3::boolean IS NULL OR (e.cliente_id IS NULL) = $3) \
         ORDER BY e.numero_serie",
        SELECT
    );
    Ok(sqlx::query_as::<_, Equipo>(&sql)
        .bind(filtro.activo)
        .bind(filtro.cliente_id)
        .bind(filtro.disponible)
        .fetch_all(pool)
        .await?)
}

pub async fn obtener(pool: &PgPool, id: Uuid) -> Result<Equipo, ApiError> {
    let sql = format!("{} WHERE e.id = $1", SELECT);
    sqlx::query_as::<_, Equipo>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Equipo"))
}

async fn verificar_serie(
    pool: &PgPool,
    serie: &str,
    excluir: Option<Uuid>,
) -> Result<(), ApiError> {
    if hay_duplicado(pool, SQL_SERIE_DUPLICADA, serie, excluir).await? {
        return Err(ApiError::Conflicto(format!(
            "Ya existe un equipo con el número de serie '{}'",
            serie
        )));
    }
    Ok(())
}

pub async fn crear(pool: &PgPool, datos: NuevoEquipo) -> Result<Equipo, ApiError> {
    let serie = datos.numero_serie.trim().to_uppercase();
    verificar_serie(pool, &serie, None).await?;
    if let Some(plantilla_id) = datos.plantilla_id {
        exigir_activo(pool, "plantillas_equipo", plantilla_id, "Plantilla de equipo").await?;
    }

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO equipos (numero_serie, nombre, plantilla_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&serie)
    .bind(datos.nombre.trim())
    .bind(datos.plantilla_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(%id, numero_serie = %serie, "equipo creado");
    obtener(pool, id).await
}

pub async fn actualizar(
    pool: &PgPool,
    id: Uuid,
    datos: ActualizarEquipo,
) -> Result<Equipo, ApiError> {
    let existente = obtener(pool, id).await?;

    let serie = requerido(&datos.numero_serie, &existente.numero_serie).to_uppercase();
    if serie != existente.numero_serie {
        verificar_serie(pool, &serie, Some(id)).await?;
    }
    let plantilla_id = referencia(datos.plantilla_id, existente.plantilla_id);
    if let Some(nueva) = plantilla_id.filter(|p| Some(*p) != existente.plantilla_id) {
        exigir_activo(pool, "plantillas_equipo", nueva, "Plantilla de equipo").await?;
    }

    sqlx::query(
        "UPDATE equipos SET numero_serie = $1, nombre = $2, plantilla_id = $3, updated_at = NOW() WHERE id = $4",
    )
    .bind(&serie)
    .bind(requerido(&datos.nombre, &existente.nombre))
    .bind(plantilla_id)
    .bind(id)
    .execute(pool)
    .await?;

    obtener(pool, id).await
}

fn baja_rechazada(equipo: &Equipo) -> ApiError {
    if equipo.asignado() {
        return ApiError::Conflicto(
            "El equipo está asignado a un cliente; retírelo antes de darlo de baja".into(),
        );
    }
    ApiError::Conflicto("Equipo: el registro ya se encuentra dado de baja".into())
}

fn asignacion_rechazada(equipo: &Equipo) -> ApiError {
    if !equipo.activo {
        return ApiError::SolicitudInvalida("El equipo está dado de baja".into());
    }
    ApiError::Conflicto("El equipo ya está asignado a un cliente".into())
}

/// Un equipo asignado a un cliente no puede darse de baja.
pub async fn dar_de_baja(pool: &PgPool, id: Uuid) -> Result<EstadoRespuesta, ApiError> {
    let actualizado: Option<Uuid> =
        sqlx::query_scalar(SQL_BAJA).bind(id).fetch_optional(pool).await?;
    if actualizado.is_none() {
        let equipo = obtener(pool, id).await?;
        return Err(baja_rechazada(&equipo));
    }

    tracing::info!(%id, "equipo dado de baja");
    Ok(EstadoRespuesta { id, activo: false })
}

pub async fn asignar(
    pool: &PgPool,
    id: Uuid,
    datos: AsignarEquipo,
    usuario_id: Uuid,
) -> Result<Equipo, ApiError> {
    let equipo = obtener(pool, id).await?;
    if !equipo.activo || equipo.asignado() {
        return Err(asignacion_rechazada(&equipo));
    }

    clientes::verificar_cliente(pool, datos.cliente_id, true).await?;
    if let Some(sucursal_id) = datos.sucursal_id {
        let sucursal = clientes::obtener_sucursal(pool, datos.cliente_id, sucursal_id).await?;
        if !sucursal.activo {
            return Err(ApiError::SolicitudInvalida("La sucursal está dada de baja".into()));
        }
    }

    let mut tx = pool.begin().await?;

    let actualizado = sqlx::query(SQL_ASIGNAR)
        .bind(datos.cliente_id)
        .bind(datos.sucursal_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if actualizado.rows_affected() == 0 {
        tx.rollback().await?;
        let equipo = obtener(pool, id).await?;
        return Err(asignacion_rechazada(&equipo));
    }

    sqlx::query(
        "INSERT INTO equipo_asignaciones (equipo_id, cliente_id, sucursal_id, notas, asignado_por) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(datos.cliente_id)
    .bind(datos.sucursal_id)
    .bind(opcional(&datos.notas))
    .bind(usuario_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(equipo_id = %id, cliente_id = %datos.cliente_id, "equipo asignado");
    obtener(pool, id).await
}

pub async fn retirar(pool: &PgPool, id: Uuid, datos: RetirarEquipo) -> Result<Equipo, ApiError> {
    let equipo = obtener(pool, id).await?;
    if !equipo.asignado() {
        return Err(ApiError::Conflicto("El equipo no está asignado".into()));
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE equipos SET cliente_id = NULL, sucursal_id = NULL, fecha_asignacion = NULL, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE equipo_asignaciones SET fecha_retiro = NOW(), notas_retiro = $2 \
         WHERE equipo_id = $1 AND fecha_retiro IS NULL",
    )
    .bind(id)
    .bind(opcional(&datos.notas))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(equipo_id = %id, "equipo retirado del cliente");
    obtener(pool, id).await
}

pub async fn historial(pool: &PgPool, id: Uuid) -> Result<Vec<Asignacion>, ApiError> {
    obtener(pool, id).await?;
    Ok(sqlx::query_as::<_, Asignacion>(
        "SELECT a.id, a.equipo_id, a.cliente_id, c.nombre AS cliente, a.sucursal_id, s.nombre AS sucursal, \
         a.notas, a.notas_retiro, a.asignado_por, a.fecha_asignacion, a.fecha_retiro \
         FROM equipo_asignaciones a \
         JOIN clientes c ON c.id = a.cliente_id \
         LEFT JOIN cliente_sucursales s ON s.id = a.sucursal_id \
         WHERE a.equipo_id = $1 ORDER BY a.fecha_asignacion DESC",
    )
    .bind(id)
    .fetch_all(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn equipo(activo: bool, cliente_id: Option<Uuid>) -> Equipo {
        Equipo {
            id: Uuid::new_v4(),
            numero_serie: "CMP-001".into(),
            nombre: "Compresor".into(),
            plantilla_id: None,
            plantilla: None,
            cliente_id,
            cliente: None,
            sucursal_id: None,
            sucursal: None,
            fecha_asignacion: None,
            activo,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn baja_y_asignacion_se_condicionan_en_el_update() {
        assert!(SQL_BAJA.contains("AND activo AND cliente_id IS NULL"));
        assert!(SQL_ASIGNAR.contains("AND activo AND cliente_id IS NULL"));
    }

    #[test]
    fn baja_de_equipo_asignado_es_conflicto() {
        let asignado = equipo(true, Some(Uuid::new_v4()));
        match baja_rechazada(&asignado) {
            ApiError::Conflicto(mensaje) => assert!(mensaje.contains("asignado")),
            otro => panic!("se esperaba conflicto, se obtuvo {:?}", otro),
        }
        assert!(matches!(baja_rechazada(&equipo(false, None)), ApiError::Conflicto(_)));
    }

    #[test]
    fn asignar_equipo_inactivo_es_invalido() {
        assert!(matches!(
            asignacion_rechazada(&equipo(false, None)),
            ApiError::SolicitudInvalida(_)
        ));
        assert!(matches!(
            asignacion_rechazada(&equipo(true, Some(Uuid::new_v4()))),
            ApiError::Conflicto(_)
        ));
    }
}
