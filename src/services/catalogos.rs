use sqlx::PgPool;
use uuid::Uuid;

use super::hay_duplicado;
use crate::error::ApiError;
use crate::models::catalogo::{
    ActualizarElementoCatalogo, Catalogo, ElementoCatalogo, NuevoElementoCatalogo,
};
use crate::models::{fusionar, opcional, requerido};

const COLUMNAS: &str = "id, nombre, descripcion, activo, created_at, updated_at";

pub async fn listar(
    pool: &PgPool,
    catalogo: Catalogo,
    activo: Option<bool>,
) -> Result<Vec<ElementoCatalogo>, ApiError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE ($1::boolean IS NULL OR activo = $1) ORDER BY nombre",
        COLUMNAS,
        catalogo.tabla()
    );
    let elementos = sqlx::query_as::<_, ElementoCatalogo>(&sql)
        .bind(activo)
        .fetch_all(pool)
        .await?;
    Ok(elementos)
}

pub async fn obtener(
    pool: &PgPool,
    catalogo: Catalogo,
    id: Uuid,
) -> Result<ElementoCatalogo, ApiError> {
    let sql = format!("SELECT {} FROM {} WHERE id = $1", COLUMNAS, catalogo.tabla());
    sqlx::query_as::<_, ElementoCatalogo>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::no_encontrado(catalogo.etiqueta()))
}

async fn verificar_nombre(
    pool: &PgPool,
    catalogo: Catalogo,
    nombre: &str,
    excluir: Option<Uuid>,
) -> Result<(), ApiError> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE LOWER(nombre) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        catalogo.tabla()
    );
    if hay_duplicado(pool, &sql, nombre, excluir).await? {
        return Err(ApiError::Conflicto(format!(
            "{} con el nombre '{}' ya existe",
            catalogo.etiqueta(),
            nombre
        )));
    }
    Ok(())
}

pub async fn crear(
    pool: &PgPool,
    catalogo: Catalogo,
    datos: NuevoElementoCatalogo,
) -> Result<ElementoCatalogo, ApiError> {
    let nombre = datos.nombre.trim();
    verificar_nombre(pool, catalogo, nombre, None).await?;

    let sql = format!(
        "INSERT INTO {} (nombre, descripcion) VALUES ($1, $2) RETURNING {}",
        catalogo.tabla(),
        COLUMNAS
    );
    let elemento = sqlx::query_as::<_, ElementoCatalogo>(&sql)
        .bind(nombre)
        .bind(opcional(&datos.descripcion))
        .fetch_one(pool)
        .await?;

    tracing::info!(tabla = catalogo.tabla(), id = %elemento.id, "registro de catálogo creado");
    Ok(elemento)
}

pub async fn actualizar(
    pool: &PgPool,
    catalogo: Catalogo,
    id: Uuid,
    datos: ActualizarElementoCatalogo,
) -> Result<ElementoCatalogo, ApiError> {
    let existente = obtener(pool, catalogo, id).await?;

    let nombre = requerido(&datos.nombre, &existente.nombre);
    if !nombre.eq_ignore_ascii_case(&existente.nombre) {
        verificar_nombre(pool, catalogo, &nombre, Some(id)).await?;
    }
    let descripcion = fusionar(&datos.descripcion, existente.descripcion);

    let sql = format!(
        "UPDATE {} SET nombre = $1, descripcion = $2, updated_at = NOW() WHERE id = $3 RETURNING {}",
        catalogo.tabla(),
        COLUMNAS
    );
    let elemento = sqlx::query_as::<_, ElementoCatalogo>(&sql)
        .bind(&nombre)
        .bind(descripcion)
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(elemento)
}
