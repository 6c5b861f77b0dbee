use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use super::exigir_activo;
use crate::auth::UsuarioActual;
use crate::error::ApiError;
use crate::models::permiso::{
    construir_arbol, podar_arbol, AsignarPermisos, Modulo, NodoModulo, NuevoModulo, NuevoSubmodulo,
    Submodulo,
};
use crate::models::opcional;

const COLUMNAS_MODULO: &str = "id, clave, nombre, icono, orden, activo, created_at, updated_at";
const COLUMNAS_SUBMODULO: &str =
    "id, modulo_id, clave, nombre, ruta, orden, activo, created_at, updated_at";

async fn catalogo_activo(pool: &PgPool) -> Result<(Vec<Modulo>, Vec<Submodulo>), ApiError> {
    let sql = format!("SELECT {} FROM modulos WHERE activo", COLUMNAS_MODULO);
    let modulos = sqlx::query_as::<_, Modulo>(&sql).fetch_all(pool).await?;

    let sql = format!("SELECT {} FROM submodulos WHERE activo", COLUMNAS_SUBMODULO);
    let submodulos = sqlx::query_as::<_, Submodulo>(&sql).fetch_all(pool).await?;

    Ok((modulos, submodulos))
}

async fn concedidos(pool: &PgPool, usuario_id: Uuid) -> Result<HashSet<Uuid>, ApiError> {
    let ids: Vec<Uuid> = sqlx::query_scalar("SELECT submodulo_id FROM permisos WHERE usuario_id = $1")
        .bind(usuario_id)
        .fetch_all(pool)
        .await?;
    Ok(ids.into_iter().collect())
}

async fn exigir_usuario(pool: &PgPool, usuario_id: Uuid) -> Result<(), ApiError> {
    let existe: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM usuarios WHERE id = $1)")
        .bind(usuario_id)
        .fetch_one(pool)
        .await?;
    if !existe {
        return Err(ApiError::no_encontrado("Usuario"));
    }
    Ok(())
}

/// Árbol global de módulos activos, todo marcado como asignado.
pub async fn arbol(pool: &PgPool) -> Result<Vec<NodoModulo>, ApiError> {
    let (modulos, submodulos) = catalogo_activo(pool).await?;
    Ok(construir_arbol(&modulos, &submodulos, None))
}

pub async fn arbol_usuario(pool: &PgPool, usuario_id: Uuid) -> Result<Vec<NodoModulo>, ApiError> {
    exigir_usuario(pool, usuario_id).await?;
    let (modulos, submodulos) = catalogo_activo(pool).await?;
    let concedidos = concedidos(pool, usuario_id).await?;
    Ok(construir_arbol(&modulos, &submodulos, Some(&concedidos)))
}

/// Reemplaza los permisos del usuario por los submódulos recibidos.
pub async fn asignar(
    pool: &PgPool,
    usuario_id: Uuid,
    datos: AsignarPermisos,
) -> Result<Vec<NodoModulo>, ApiError> {
    exigir_usuario(pool, usuario_id).await?;

    let ids = datos.sin_duplicados();
    let validos: Vec<Uuid> = sqlx::query_scalar(
        "SELECT s.id FROM submodulos s JOIN modulos m ON m.id = s.modulo_id \
         WHERE s.id = ANY($1) AND s.activo AND m.activo",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;
    let validos: HashSet<Uuid> = validos.into_iter().collect();

    let invalidos: Vec<String> = ids
        .iter()
        .filter(|id| !validos.contains(id))
        .map(Uuid::to_string)
        .collect();
    if !invalidos.is_empty() {
        return Err(ApiError::SolicitudInvalida(format!(
            "Submódulos inexistentes o inactivos: {}",
            invalidos.join(", ")
        )));
    }

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM permisos WHERE usuario_id = $1")
        .bind(usuario_id)
        .execute(&mut *tx)
        .await?;

    if !ids.is_empty() {
        sqlx::query(
            "INSERT INTO permisos (usuario_id, submodulo_id) SELECT $1, UNNEST($2::uuid[])",
        )
        .bind(usuario_id)
        .bind(&ids)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(%usuario_id, permisos = ids.len(), "permisos reemplazados");
    arbol_usuario(pool, usuario_id).await
}

/// Navegación del usuario en sesión: solo las ramas concedidas.
pub async fn sidebar(pool: &PgPool, usuario: &UsuarioActual) -> Result<Vec<NodoModulo>, ApiError> {
    if usuario.es_admin() {
        return arbol(pool).await;
    }
    Ok(podar_arbol(arbol_usuario(pool, usuario.id).await?))
}

pub async fn crear_modulo(pool: &PgPool, datos: NuevoModulo) -> Result<Modulo, ApiError> {
    let clave = datos.clave.trim().to_lowercase();
    let existe: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM modulos WHERE clave = $1)")
        .bind(&clave)
        .fetch_one(pool)
        .await?;
    if existe {
        return Err(ApiError::Conflicto(format!("Ya existe el módulo '{}'", clave)));
    }

    let sql = format!(
        "INSERT INTO modulos (clave, nombre, icono, orden) VALUES ($1, $2, $3, $4) RETURNING {}",
        COLUMNAS_MODULO
    );
    let modulo = sqlx::query_as::<_, Modulo>(&sql)
        .bind(&clave)
        .bind(datos.nombre.trim())
        .bind(opcional(&datos.icono))
        .bind(datos.orden.unwrap_or(0))
        .fetch_one(pool)
        .await?;

    tracing::info!(id = %modulo.id, %clave, "módulo creado");
    Ok(modulo)
}

pub async fn crear_submodulo(
    pool: &PgPool,
    modulo_id: Uuid,
    datos: NuevoSubmodulo,
) -> Result<Submodulo, ApiError> {
    exigir_activo(pool, "modulos", modulo_id, "Módulo").await?;

    let clave = datos.clave.trim().to_lowercase();
    let existe: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM submodulos WHERE clave = $1)")
        .bind(&clave)
        .fetch_one(pool)
        .await?;
    if existe {
        return Err(ApiError::Conflicto(format!("Ya existe el submódulo '{}'", clave)));
    }

    let sql = format!(
        "INSERT INTO submodulos (modulo_id, clave, nombre, ruta, orden) VALUES ($1, $2, $3, $4, $5) \
         RETURNING {}",
        COLUMNAS_SUBMODULO
    );
    let submodulo = sqlx::query_as::<_, Submodulo>(&sql)
        .bind(modulo_id)
        .bind(&clave)
        .bind(datos.nombre.trim())
        .bind(datos.ruta.trim())
        .bind(datos.orden.unwrap_or(0))
        .fetch_one(pool)
        .await?;

    tracing::info!(id = %submodulo.id, %modulo_id, %clave, "submódulo creado");
    Ok(submodulo)
}
