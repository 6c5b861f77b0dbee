//! Plantillas de equipo: encabezado, líneas de refacciones y costeo.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::hay_duplicado;
use crate::error::ApiError;
use crate::models::plantilla::{
    calcular_totales, importe, ActualizarPlantilla, DetallePlantilla, LineaPlantilla,
    NuevaPlantilla, Plantilla, PlantillaConDetalles, TotalesPlantilla,
};
use crate::models::{fusionar, opcional, requerido};

const COLUMNAS: &str =
    "id, nombre, descripcion, costo, precio_venta, precio_renta, activo, created_at, updated_at";

const SQL_NOMBRE_DUPLICADO: &str = "SELECT EXISTS(SELECT 1 FROM plantillas_equipo \
     WHERE LOWER(nombre) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))";

/// Línea ya guardada, tal como la necesita la conciliación.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DetallePersistido {
    pub id: Uuid,
    pub refaccion_id: Uuid,
    pub activo: bool,
}

/// Cambios a aplicar sobre las líneas de una plantilla.
#[derive(Debug, Default, PartialEq)]
pub struct PlanDetalles {
    pub insertar: Vec<LineaPlantilla>,
    /// Actualiza y deja activa la fila (reactiva las dadas de baja).
    pub actualizar: Vec<(Uuid, LineaPlantilla)>,
    pub desactivar: Vec<Uuid>,
}

fn verificar_refacciones_unicas(lineas: &[LineaPlantilla]) -> Result<(), ApiError> {
    let mut vistas = HashSet::new();
    for linea in lineas {
        if !vistas.insert(linea.refaccion_id) {
            return Err(ApiError::SolicitudInvalida(format!(
                "La refacción {} aparece más de una vez en la plantilla",
                linea.refaccion_id
            )));
        }
    }
    Ok(())
}

/// Concilia las líneas enviadas por el cliente con las guardadas.
///
/// Las líneas con `id` deben existir en la plantilla y conservar su refacción.
/// Una línea sin `id` cuya refacción ya tiene fila reutiliza esa fila.
/// Las filas activas que no se enviaron se dan de baja.
pub fn planear_detalles(
    persistidos: &[DetallePersistido],
    enviados: &[LineaPlantilla],
) -> Result<PlanDetalles, ApiError> {
    verificar_refacciones_unicas(enviados)?;

    let por_id: HashMap<Uuid, &DetallePersistido> = persistidos.iter().map(|d| (d.id, d)).collect();
    let por_refaccion: HashMap<Uuid, &DetallePersistido> =
        persistidos.iter().map(|d| (d.refaccion_id, d)).collect();

    let mut plan = PlanDetalles::default();
    let mut usados = HashSet::new();

    for linea in enviados {
        let destino = match linea.id {
            Some(id) => {
                let persistido = por_id.get(&id).ok_or_else(|| {
                    ApiError::NoEncontrado(format!("El detalle {} no pertenece a la plantilla", id))
                })?;
                if persistido.refaccion_id != linea.refaccion_id {
                    return Err(ApiError::SolicitudInvalida(format!(
                        "El detalle {} no puede cambiar de refacción",
                        id
                    )));
                }
                Some(persistido.id)
            }
            None => por_refaccion.get(&linea.refaccion_id).map(|d| d.id),
        };

        match destino {
            Some(id) => {
                usados.insert(id);
                plan.actualizar.push((id, linea.clone()));
            }
            None => plan.insertar.push(linea.clone()),
        }
    }

    plan.desactivar = persistidos
        .iter()
        .filter(|d| d.activo && !usados.contains(&d.id))
        .map(|d| d.id)
        .collect();

    Ok(plan)
}

pub async fn listar(pool: &PgPool, activo: Option<bool>) -> Result<Vec<Plantilla>, ApiError> {
    let sql = format!(
        "SELECT {} FROM plantillas_equipo WHERE ($1::boolean IS NULL OR activo = $1) ORDER BY nombre",
        COLUMNAS
    );
    Ok(sqlx::query_as::<_, Plantilla>(&sql).bind(activo).fetch_all(pool).await?)
}

pub async fn obtener(pool: &PgPool, id: Uuid) -> Result<PlantillaConDetalles, ApiError> {
    let sql = format!("SELECT {} FROM plantillas_equipo WHERE id = $1", COLUMNAS);
    let plantilla = sqlx::query_as::<_, Plantilla>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Plantilla de equipo"))?;

    let detalles = sqlx::query_as::<_, DetallePlantilla>(
        "SELECT d.id, d.plantilla_id, d.refaccion_id, r.clave, r.nombre AS refaccion, d.cantidad, \
         d.costo_unitario, d.importe, d.activo \
         FROM plantilla_equipo_detalles d \
         JOIN refacciones r ON r.id = d.refaccion_id \
         WHERE d.plantilla_id = $1 AND d.activo \
         ORDER BY r.clave",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(PlantillaConDetalles { plantilla, detalles })
}

async fn verificar_nombre(
    pool: &PgPool,
    nombre: &str,
    excluir: Option<Uuid>,
) -> Result<(), ApiError> {
    if hay_duplicado(pool, SQL_NOMBRE_DUPLICADO, nombre, excluir).await? {
        return Err(ApiError::Conflicto(format!(
            "Ya existe una plantilla con el nombre '{}'",
            nombre
        )));
    }
    Ok(())
}

/// Costo vigente de cada refacción referida. Todas deben existir;
/// las de `exigir_activas` además deben estar activas.
async fn costos_refacciones(
    conn: &mut PgConnection,
    ids: Vec<Uuid>,
    exigir_activas: &HashSet<Uuid>,
) -> Result<HashMap<Uuid, Decimal>, ApiError> {
    let filas: Vec<(Uuid, Decimal, bool)> =
        sqlx::query_as("SELECT id, costo, activo FROM refacciones WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *conn)
            .await?;

    let encontradas: HashMap<Uuid, (Decimal, bool)> =
        filas.into_iter().map(|(id, costo, activo)| (id, (costo, activo))).collect();

    if let Some(faltante) = ids.iter().find(|id| !encontradas.contains_key(id)) {
        return Err(ApiError::NoEncontrado(format!("Refacción {} no encontrada", faltante)));
    }
    if let Some(inactiva) = exigir_activas
        .iter()
        .find(|id| matches!(encontradas.get(id), Some((_, false))))
    {
        return Err(ApiError::SolicitudInvalida(format!(
            "La refacción {} está dada de baja",
            inactiva
        )));
    }

    Ok(encontradas.into_iter().map(|(id, (costo, _))| (id, costo)).collect())
}

fn costo_linea(linea: &LineaPlantilla, costos: &HashMap<Uuid, Decimal>) -> Decimal {
    linea
        .costo_unitario
        .or_else(|| costos.get(&linea.refaccion_id).copied())
        .unwrap_or(Decimal::ZERO)
}

async fn insertar_linea(
    conn: &mut PgConnection,
    plantilla_id: Uuid,
    linea: &LineaPlantilla,
    costos: &HashMap<Uuid, Decimal>,
) -> Result<(), ApiError> {
    let costo_unitario = costo_linea(linea, costos);
    sqlx::query(
        "INSERT INTO plantilla_equipo_detalles (plantilla_id, refaccion_id, cantidad, costo_unitario, importe) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(plantilla_id)
    .bind(linea.refaccion_id)
    .bind(linea.cantidad)
    .bind(costo_unitario)
    .bind(importe(linea.cantidad, costo_unitario))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Recalcula costo y precios del encabezado con sus líneas activas.
async fn actualizar_totales(
    conn: &mut PgConnection,
    plantilla_id: Uuid,
) -> Result<TotalesPlantilla, ApiError> {
    let importes: Vec<Decimal> = sqlx::query_scalar(
        "SELECT importe FROM plantilla_equipo_detalles WHERE plantilla_id = $1 AND activo",
    )
    .bind(plantilla_id)
    .fetch_all(&mut *conn)
    .await?;

    let totales = calcular_totales(importes);

    sqlx::query(
        "UPDATE plantillas_equipo SET costo = $1, precio_venta = $2, precio_renta = $3, updated_at = NOW() \
         WHERE id = $4",
    )
    .bind(totales.costo)
    .bind(totales.precio_venta)
    .bind(totales.precio_renta)
    .bind(plantilla_id)
    .execute(&mut *conn)
    .await?;

    Ok(totales)
}

pub async fn crear(pool: &PgPool, datos: NuevaPlantilla) -> Result<PlantillaConDetalles, ApiError> {
    let nombre = datos.nombre.trim();
    verificar_nombre(pool, nombre, None).await?;
    verificar_refacciones_unicas(&datos.detalles)?;

    let mut tx = pool.begin().await?;

    let refacciones: Vec<Uuid> = datos.detalles.iter().map(|l| l.refaccion_id).collect();
    let activas: HashSet<Uuid> = refacciones.iter().copied().collect();
    let costos = costos_refacciones(&mut tx, refacciones, &activas).await?;

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO plantillas_equipo (nombre, descripcion) VALUES ($1, $2) RETURNING id",
    )
    .bind(nombre)
    .bind(opcional(&datos.descripcion))
    .fetch_one(&mut *tx)
    .await?;

    for linea in &datos.detalles {
        insertar_linea(&mut tx, id, linea, &costos).await?;
    }

    let totales = actualizar_totales(&mut tx, id).await?;
    tx.commit().await?;

    tracing::info!(%id, costo = %totales.costo, lineas = datos.detalles.len(), "plantilla de equipo creada");
    obtener(pool, id).await
}

pub async fn actualizar(
    pool: &PgPool,
    id: Uuid,
    datos: ActualizarPlantilla,
) -> Result<PlantillaConDetalles, ApiError> {
    let existente = obtener(pool, id).await?.plantilla;
    let nombre = requerido(&datos.nombre, &existente.nombre);
    verificar_nombre(pool, &nombre, Some(id)).await?;

    let mut tx = pool.begin().await?;

    // Serializa ediciones concurrentes de la misma plantilla.
    sqlx::query("SELECT id FROM plantillas_equipo WHERE id = $1 FOR UPDATE")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE plantillas_equipo SET nombre = $1, descripcion = $2, updated_at = NOW() WHERE id = $3")
        .bind(&nombre)
        .bind(fusionar(&datos.descripcion, existente.descripcion))
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if let Some(enviados) = &datos.detalles {
        let persistidos = sqlx::query_as::<_, DetallePersistido>(
            "SELECT id, refaccion_id, activo FROM plantilla_equipo_detalles WHERE plantilla_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let plan = planear_detalles(&persistidos, enviados)?;

        // Las líneas nuevas o reactivadas requieren refacción activa.
        let activas_antes: HashSet<Uuid> =
            persistidos.iter().filter(|d| d.activo).map(|d| d.id).collect();
        let mut exigir: HashSet<Uuid> = plan.insertar.iter().map(|l| l.refaccion_id).collect();
        exigir.extend(
            plan.actualizar
                .iter()
                .filter(|(detalle, _)| !activas_antes.contains(detalle))
                .map(|(_, l)| l.refaccion_id),
        );
        let refacciones: Vec<Uuid> = enviados.iter().map(|l| l.refaccion_id).collect();
        let costos = costos_refacciones(&mut tx, refacciones, &exigir).await?;

        for (detalle_id, linea) in &plan.actualizar {
            let costo_unitario = costo_linea(linea, &costos);
            sqlx::query(
                "UPDATE plantilla_equipo_detalles SET cantidad = $1, costo_unitario = $2, importe = $3, \
                 activo = TRUE, updated_at = NOW() WHERE id = $4",
            )
            .bind(linea.cantidad)
            .bind(costo_unitario)
            .bind(importe(linea.cantidad, costo_unitario))
            .bind(detalle_id)
            .execute(&mut *tx)
            .await?;
        }

        for linea in &plan.insertar {
            insertar_linea(&mut tx, id, linea, &costos).await?;
        }

        if !plan.desactivar.is_empty() {
            sqlx::query(
                "UPDATE plantilla_equipo_detalles SET activo = FALSE, updated_at = NOW() WHERE id = ANY($1)",
            )
            .bind(&plan.desactivar)
            .execute(&mut *tx)
            .await?;
        }

        tracing::debug!(
            plantilla_id = %id,
            insertadas = plan.insertar.len(),
            actualizadas = plan.actualizar.len(),
            desactivadas = plan.desactivar.len(),
            "detalles conciliados"
        );
    }

    actualizar_totales(&mut tx, id).await?;
    tx.commit().await?;

    obtener(pool, id).await
}

/// Toma el costo vigente de cada refacción y recalcula la plantilla.
pub async fn recalcular(pool: &PgPool, id: Uuid) -> Result<PlantillaConDetalles, ApiError> {
    obtener(pool, id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("SELECT id FROM plantillas_equipo WHERE id = $1 FOR UPDATE")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE plantilla_equipo_detalles d SET costo_unitario = r.costo, \
         importe = ROUND(d.cantidad * r.costo, 2), updated_at = NOW() \
         FROM refacciones r \
         WHERE r.id = d.refaccion_id AND d.plantilla_id = $1 AND d.activo",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let totales = actualizar_totales(&mut tx, id).await?;
    tx.commit().await?;

    tracing::info!(%id, costo = %totales.costo, "plantilla recalculada");
    obtener(pool, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linea(id: Option<Uuid>, refaccion_id: Uuid, cantidad: i64) -> LineaPlantilla {
        LineaPlantilla {
            id,
            refaccion_id,
            cantidad: Decimal::from(cantidad),
            costo_unitario: None,
        }
    }

    fn persistido(refaccion_id: Uuid, activo: bool) -> DetallePersistido {
        DetallePersistido {
            id: Uuid::new_v4(),
            refaccion_id,
            activo,
        }
    }

    #[test]
    fn sin_persistidos_todo_se_inserta() {
        let r1 = Uuid::new_v4();
        let r2 = Uuid::new_v4();
        let enviados = vec![linea(None, r1, 1), linea(None, r2, 2)];

        let plan = planear_detalles(&[], &enviados).unwrap();
        assert_eq!(plan.insertar, enviados);
        assert!(plan.actualizar.is_empty());
        assert!(plan.desactivar.is_empty());
    }

    #[test]
    fn actualiza_inserta_y_desactiva() {
        let (r1, r2, r3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let a = persistido(r1, true);
        let b = persistido(r2, true);

        let enviados = vec![linea(Some(a.id), r1, 5), linea(None, r3, 1)];
        let plan = planear_detalles(&[a.clone(), b.clone()], &enviados).unwrap();

        assert_eq!(plan.actualizar, vec![(a.id, enviados[0].clone())]);
        assert_eq!(plan.insertar, vec![enviados[1].clone()]);
        assert_eq!(plan.desactivar, vec![b.id]);
    }

    #[test]
    fn reutiliza_fila_dada_de_baja_de_la_misma_refaccion() {
        let r1 = Uuid::new_v4();
        let baja = persistido(r1, false);

        let enviados = vec![linea(None, r1, 3)];
        let plan = planear_detalles(&[baja.clone()], &enviados).unwrap();

        assert!(plan.insertar.is_empty());
        assert_eq!(plan.actualizar, vec![(baja.id, enviados[0].clone())]);
        assert!(plan.desactivar.is_empty());
    }

    #[test]
    fn no_vuelve_a_desactivar_filas_inactivas() {
        let inactiva = persistido(Uuid::new_v4(), false);
        let activa = persistido(Uuid::new_v4(), true);
        let enviados = vec![linea(Some(activa.id), activa.refaccion_id, 1)];

        let plan = planear_detalles(&[inactiva, activa], &enviados).unwrap();
        assert!(plan.desactivar.is_empty());
    }

    #[test]
    fn detalle_ajeno_es_no_encontrado() {
        let enviados = vec![linea(Some(Uuid::new_v4()), Uuid::new_v4(), 1)];
        assert!(matches!(
            planear_detalles(&[], &enviados),
            Err(ApiError::NoEncontrado(_))
        ));
    }

    #[test]
    fn detalle_no_cambia_de_refaccion() {
        let a = persistido(Uuid::new_v4(), true);
        let enviados = vec![linea(Some(a.id), Uuid::new_v4(), 1)];
        assert!(matches!(
            planear_detalles(&[a], &enviados),
            Err(ApiError::SolicitudInvalida(_))
        ));
    }

    #[test]
    fn refaccion_repetida_es_invalida() {
        let r1 = Uuid::new_v4();
        let enviados = vec![linea(None, r1, 1), linea(None, r1, 2)];
        assert!(matches!(
            planear_detalles(&[], &enviados),
            Err(ApiError::SolicitudInvalida(_))
        ));
    }

    #[test]
    fn costo_de_linea_usa_el_de_la_refaccion_por_defecto() {
        let r1 = Uuid::new_v4();
        let costos: HashMap<Uuid, Decimal> = [(r1, Decimal::new(1250, 2))].into_iter().collect();

        let sin_costo = linea(None, r1, 2);
        assert_eq!(costo_linea(&sin_costo, &costos), Decimal::new(1250, 2));

        let con_costo = LineaPlantilla {
            costo_unitario: Some(Decimal::new(999, 2)),
            ..sin_costo
        };
        assert_eq!(costo_linea(&con_costo, &costos), Decimal::new(999, 2));
    }
}
