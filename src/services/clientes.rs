//! Clientes y sus sub-recursos: contactos, direcciones, sucursales, empleados y datos fiscales.

use sqlx::PgPool;
use uuid::Uuid;

use super::{exigir_activo, hay_duplicado, hay_duplicado_en};
use crate::error::ApiError;
use crate::models::cliente::*;
use crate::models::{fusionar, opcional, referencia, requerido};

const COLUMNAS_CLIENTE: &str = "id, nombre, telefono, email, notas, activo, created_at, updated_at";

const SQL_NOMBRE_DUPLICADO: &str = "SELECT EXISTS(SELECT 1 FROM clientes \
     WHERE LOWER(nombre) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))";

pub async fn listar(pool: &PgPool, activo: Option<bool>) -> Result<Vec<Cliente>, ApiError> {
    let sql = format!(
        "SELECT {} FROM clientes WHERE ($1::boolean IS NULL OR activo = $1) ORDER BY nombre",
        COLUMNAS_CLIENTE
    );
    Ok(sqlx::query_as::<_, Cliente>(&sql).bind(activo).fetch_all(pool).await?)
}

pub async fn obtener(pool: &PgPool, id: Uuid) -> Result<Cliente, ApiError> {
    let sql = format!("SELECT {} FROM clientes WHERE id = $1", COLUMNAS_CLIENTE);
    sqlx::query_as::<_, Cliente>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Cliente"))
}

async fn verificar_nombre(
    pool: &PgPool,
    nombre: &str,
    excluir: Option<Uuid>,
) -> Result<(), ApiError> {
    if hay_duplicado(pool, SQL_NOMBRE_DUPLICADO, nombre, excluir).await? {
        return Err(ApiError::Conflicto(format!(
            "Ya existe un cliente con el nombre '{}'",
            nombre
        )));
    }
    Ok(())
}

pub async fn crear(pool: &PgPool, datos: NuevoCliente) -> Result<Cliente, ApiError> {
    let nombre = datos.nombre.trim();
    verificar_nombre(pool, nombre, None).await?;

    let sql = format!(
        "INSERT INTO clientes (nombre, telefono, email, notas) VALUES ($1, $2, $3, $4) RETURNING {}",
        COLUMNAS_CLIENTE
    );
    let cliente = sqlx::query_as::<_, Cliente>(&sql)
        .bind(nombre)
        .bind(opcional(&datos.telefono))
        .bind(opcional(&datos.email))
        .bind(opcional(&datos.notas))
        .fetch_one(pool)
        .await?;

    tracing::info!(id = %cliente.id, "cliente creado");
    Ok(cliente)
}

pub async fn actualizar(
    pool: &PgPool,
    id: Uuid,
    datos: ActualizarCliente,
) -> Result<Cliente, ApiError> {
    let existente = obtener(pool, id).await?;
    let nombre = requerido(&datos.nombre, &existente.nombre);
    verificar_nombre(pool, &nombre, Some(id)).await?;

    let sql = format!(
        "UPDATE clientes SET nombre = $1, telefono = $2, email = $3, notas = $4, updated_at = NOW() \
         WHERE id = $5 RETURNING {}",
        COLUMNAS_CLIENTE
    );
    Ok(sqlx::query_as::<_, Cliente>(&sql)
        .bind(&nombre)
        .bind(fusionar(&datos.telefono, existente.telefono))
        .bind(fusionar(&datos.email, existente.email))
        .bind(fusionar(&datos.notas, existente.notas))
        .bind(id)
        .fetch_one(pool)
        .await?)
}

/// El cliente debe existir; para altas de sub-recursos además debe estar activo.
pub async fn verificar_cliente(
    pool: &PgPool,
    cliente_id: Uuid,
    para_alta: bool,
) -> Result<(), ApiError> {
    if para_alta {
        return exigir_activo(pool, "clientes", cliente_id, "Cliente").await;
    }
    let existe: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM clientes WHERE id = $1)")
        .bind(cliente_id)
        .fetch_one(pool)
        .await?;
    if !existe {
        return Err(ApiError::no_encontrado("Cliente"));
    }
    Ok(())
}

// Contactos

const COLUMNAS_CONTACTO: &str =
    "id, cliente_id, nombre, puesto, telefono, email, activo, created_at, updated_at";

const SQL_CONTACTO_EMAIL: &str = "SELECT EXISTS(SELECT 1 FROM cliente_contactos \
     WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2) AND cliente_id = $3)";

pub async fn listar_contactos(
    pool: &PgPool,
    cliente_id: Uuid,
    activo: Option<bool>,
) -> Result<Vec<Contacto>, ApiError> {
    verificar_cliente(pool, cliente_id, false).await?;
    let sql = format!(
        "SELECT {} FROM cliente_contactos WHERE cliente_id = $1 AND ($2::boolean IS NULL OR activo = $2) \
         ORDER BY nombre",
        COLUMNAS_CONTACTO
    );
    Ok(sqlx::query_as::<_, Contacto>(&sql)
        .bind(cliente_id)
        .bind(activo)
        .fetch_all(pool)
        .await?)
}

pub async fn obtener_contacto(
    pool: &PgPool,
    cliente_id: Uuid,
    id: Uuid,
) -> Result<Contacto, ApiError> {
    let sql = format!(
        "SELECT {} FROM cliente_contactos WHERE id = $1 AND cliente_id = $2",
        COLUMNAS_CONTACTO
    );
    sqlx::query_as::<_, Contacto>(&sql)
        .bind(id)
        .bind(cliente_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Contacto"))
}

async fn verificar_email_contacto(
    pool: &PgPool,
    cliente_id: Uuid,
    email: Option<&str>,
    excluir: Option<Uuid>,
) -> Result<(), ApiError> {
    if let Some(email) = email {
        if hay_duplicado_en(pool, SQL_CONTACTO_EMAIL, email, excluir, cliente_id).await? {
            return Err(ApiError::Conflicto(format!(
                "El cliente ya tiene un contacto con el email '{}'",
                email
            )));
        }
    }
    Ok(())
}

pub async fn crear_contacto(
    pool: &PgPool,
    cliente_id: Uuid,
    datos: NuevoContacto,
) -> Result<Contacto, ApiError> {
    verificar_cliente(pool, cliente_id, true).await?;
    let email = opcional(&datos.email);
    verificar_email_contacto(pool, cliente_id, email.as_deref(), None).await?;

    let sql = format!(
        "INSERT INTO cliente_contactos (cliente_id, nombre, puesto, telefono, email) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        COLUMNAS_CONTACTO
    );
    Ok(sqlx::query_as::<_, Contacto>(&sql)
        .bind(cliente_id)
        .bind(datos.nombre.trim())
        .bind(opcional(&datos.puesto))
        .bind(opcional(&datos.telefono))
        .bind(email)
        .fetch_one(pool)
        .await?)
}

pub async fn actualizar_contacto(
    pool: &PgPool,
    cliente_id: Uuid,
    id: Uuid,
    datos: ActualizarContacto,
) -> Result<Contacto, ApiError> {
    let existente = obtener_contacto(pool, cliente_id, id).await?;
    let email = fusionar(&datos.email, existente.email);
    verificar_email_contacto(pool, cliente_id, email.as_deref(), Some(id)).await?;

    let sql = format!(
        "UPDATE cliente_contactos SET nombre = $1, puesto = $2, telefono = $3, email = $4, \
         updated_at = NOW() WHERE id = $5 RETURNING {}",
        COLUMNAS_CONTACTO
    );
    Ok(sqlx::query_as::<_, Contacto>(&sql)
        .bind(requerido(&datos.nombre, &existente.nombre))
        .bind(fusionar(&datos.puesto, existente.puesto))
        .bind(fusionar(&datos.telefono, existente.telefono))
        .bind(email)
        .bind(id)
        .fetch_one(pool)
        .await?)
}

// Direcciones

const COLUMNAS_DIRECCION: &str = "id, cliente_id, alias, calle, numero_exterior, numero_interior, \
     colonia, municipio, estado, codigo_postal, activo, created_at, updated_at";

const SQL_DIRECCION_ALIAS: &str = "SELECT EXISTS(SELECT 1 FROM cliente_direcciones \
     WHERE LOWER(alias) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2) AND cliente_id = $3)";

pub async fn listar_direcciones(
    pool: &PgPool,
    cliente_id: Uuid,
    activo: Option<bool>,
) -> Result<Vec<Direccion>, ApiError> {
    verificar_cliente(pool, cliente_id, false).await?;
    let sql = format!(
        "SELECT {} FROM cliente_direcciones WHERE cliente_id = $1 AND ($2::boolean IS NULL OR activo = $2) \
         ORDER BY alias",
        COLUMNAS_DIRECCION
    );
    Ok(sqlx::query_as::<_, Direccion>(&sql)
        .bind(cliente_id)
        .bind(activo)
        .fetch_all(pool)
        .await?)
}

pub async fn obtener_direccion(
    pool: &PgPool,
    cliente_id: Uuid,
    id: Uuid,
) -> Result<Direccion, ApiError> {
    let sql = format!(
        "SELECT {} FROM cliente_direcciones WHERE id = $1 AND cliente_id = $2",
        COLUMNAS_DIRECCION
    );
    sqlx::query_as::<_, Direccion>(&sql)
        .bind(id)
        .bind(cliente_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Dirección"))
}

async fn verificar_alias(
    pool: &PgPool,
    cliente_id: Uuid,
    alias: &str,
    excluir: Option<Uuid>,
) -> Result<(), ApiError> {
    if hay_duplicado_en(pool, SQL_DIRECCION_ALIAS, alias, excluir, cliente_id).await? {
        return Err(ApiError::Conflicto(format!(
            "El cliente ya tiene una dirección con el alias '{}'",
            alias
        )));
    }
    Ok(())
}

pub async fn crear_direccion(
    pool: &PgPool,
    cliente_id: Uuid,
    datos: NuevaDireccion,
) -> Result<Direccion, ApiError> {
    verificar_cliente(pool, cliente_id, true).await?;
    let alias = datos.alias.trim();
    verificar_alias(pool, cliente_id, alias, None).await?;

    let sql = format!(
        "INSERT INTO cliente_direcciones (cliente_id, alias, calle, numero_exterior, numero_interior, \
         colonia, municipio, estado, codigo_postal) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
        COLUMNAS_DIRECCION
    );
    Ok(sqlx::query_as::<_, Direccion>(&sql)
        .bind(cliente_id)
        .bind(alias)
        .bind(datos.calle.trim())
        .bind(opcional(&datos.numero_exterior))
        .bind(opcional(&datos.numero_interior))
        .bind(opcional(&datos.colonia))
        .bind(opcional(&datos.municipio))
        .bind(opcional(&datos.estado))
        .bind(&datos.codigo_postal)
        .fetch_one(pool)
        .await?)
}

pub async fn actualizar_direccion(
    pool: &PgPool,
    cliente_id: Uuid,
    id: Uuid,
    datos: ActualizarDireccion,
) -> Result<Direccion, ApiError> {
    let existente = obtener_direccion(pool, cliente_id, id).await?;
    let alias = requerido(&datos.alias, &existente.alias);
    verificar_alias(pool, cliente_id, &alias, Some(id)).await?;

    let sql = format!(
        "UPDATE cliente_direcciones SET alias = $1, calle = $2, numero_exterior = $3, numero_interior = $4, \
         colonia = $5, municipio = $6, estado = $7, codigo_postal = $8, updated_at = NOW() \
         WHERE id = $9 RETURNING {}",
        COLUMNAS_DIRECCION
    );
    Ok(sqlx::query_as::<_, Direccion>(&sql)
        .bind(&alias)
        .bind(requerido(&datos.calle, &existente.calle))
        .bind(fusionar(&datos.numero_exterior, existente.numero_exterior))
        .bind(fusionar(&datos.numero_interior, existente.numero_interior))
        .bind(fusionar(&datos.colonia, existente.colonia))
        .bind(fusionar(&datos.municipio, existente.municipio))
        .bind(fusionar(&datos.estado, existente.estado))
        .bind(datos.codigo_postal.unwrap_or(existente.codigo_postal))
        .bind(id)
        .fetch_one(pool)
        .await?)
}

// Sucursales

const COLUMNAS_SUCURSAL: &str =
    "id, cliente_id, direccion_id, nombre, telefono, activo, created_at, updated_at";

const SQL_SUCURSAL_NOMBRE: &str = "SELECT EXISTS(SELECT 1 FROM cliente_sucursales \
     WHERE LOWER(nombre) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2) AND cliente_id = $3)";

pub async fn listar_sucursales(
    pool: &PgPool,
    cliente_id: Uuid,
    activo: Option<bool>,
) -> Result<Vec<Sucursal>, ApiError> {
    verificar_cliente(pool, cliente_id, false).await?;
    let sql = format!(
        "SELECT {} FROM cliente_sucursales WHERE cliente_id = $1 AND ($2::boolean IS NULL OR activo = $2) \
         ORDER BY nombre",
        COLUMNAS_SUCURSAL
    );
    Ok(sqlx::query_as::<_, Sucursal>(&sql)
        .bind(cliente_id)
        .bind(activo)
        .fetch_all(pool)
        .await?)
}

pub async fn obtener_sucursal(
    pool: &PgPool,
    cliente_id: Uuid,
    id: Uuid,
) -> Result<Sucursal, ApiError> {
    let sql = format!(
        "SELECT {} FROM cliente_sucursales WHERE id = $1 AND cliente_id = $2",
        COLUMNAS_SUCURSAL
    );
    sqlx::query_as::<_, Sucursal>(&sql)
        .bind(id)
        .bind(cliente_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Sucursal"))
}

async fn verificar_nombre_sucursal(
    pool: &PgPool,
    cliente_id: Uuid,
    nombre: &str,
    excluir: Option<Uuid>,
) -> Result<(), ApiError> {
    if hay_duplicado_en(pool, SQL_SUCURSAL_NOMBRE, nombre, excluir, cliente_id).await? {
        return Err(ApiError::Conflicto(format!(
            "El cliente ya tiene una sucursal llamada '{}'",
            nombre
        )));
    }
    Ok(())
}

/// La dirección debe pertenecer al mismo cliente y estar activa.
async fn verificar_direccion_propia(
    pool: &PgPool,
    cliente_id: Uuid,
    direccion_id: Uuid,
) -> Result<(), ApiError> {
    let direccion = obtener_direccion(pool, cliente_id, direccion_id).await?;
    if !direccion.activo {
        return Err(ApiError::SolicitudInvalida("La dirección está dada de baja".into()));
    }
    Ok(())
}

pub async fn crear_sucursal(
    pool: &PgPool,
    cliente_id: Uuid,
    datos: NuevaSucursal,
) -> Result<Sucursal, ApiError> {
    verificar_cliente(pool, cliente_id, true).await?;
    let nombre = datos.nombre.trim();
    verificar_nombre_sucursal(pool, cliente_id, nombre, None).await?;
    if let Some(direccion_id) = datos.direccion_id {
        verificar_direccion_propia(pool, cliente_id, direccion_id).await?;
    }

    let sql = format!(
        "INSERT INTO cliente_sucursales (cliente_id, direccion_id, nombre, telefono) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        COLUMNAS_SUCURSAL
    );
    Ok(sqlx::query_as::<_, Sucursal>(&sql)
        .bind(cliente_id)
        .bind(datos.direccion_id)
        .bind(nombre)
        .bind(opcional(&datos.telefono))
        .fetch_one(pool)
        .await?)
}

pub async fn actualizar_sucursal(
    pool: &PgPool,
    cliente_id: Uuid,
    id: Uuid,
    datos: ActualizarSucursal,
) -> Result<Sucursal, ApiError> {
    let existente = obtener_sucursal(pool, cliente_id, id).await?;
    let nombre = requerido(&datos.nombre, &existente.nombre);
    verificar_nombre_sucursal(pool, cliente_id, &nombre, Some(id)).await?;
    let direccion_id = referencia(datos.direccion_id, existente.direccion_id);
    if let Some(nueva) = direccion_id.filter(|d| Some(*d) != existente.direccion_id) {
        verificar_direccion_propia(pool, cliente_id, nueva).await?;
    }

    let sql = format!(
        "UPDATE cliente_sucursales SET nombre = $1, direccion_id = $2, telefono = $3, updated_at = NOW() \
         WHERE id = $4 RETURNING {}",
        COLUMNAS_SUCURSAL
    );
    Ok(sqlx::query_as::<_, Sucursal>(&sql)
        .bind(&nombre)
        .bind(direccion_id)
        .bind(fusionar(&datos.telefono, existente.telefono))
        .bind(id)
        .fetch_one(pool)
        .await?)
}

// Empleados

const SELECT_EMPLEADO: &str = "SELECT e.id, e.cliente_id, e.puesto_id, p.nombre AS puesto, e.sucursal_id, \
     e.nombre, e.telefono, e.email, e.activo, e.created_at, e.updated_at \
     FROM cliente_empleados e LEFT JOIN puestos p ON p.id = e.puesto_id";

const SQL_EMPLEADO_EMAIL: &str = "SELECT EXISTS(SELECT 1 FROM cliente_empleados \
     WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2) AND cliente_id = $3)";

pub async fn listar_empleados(
    pool: &PgPool,
    cliente_id: Uuid,
    activo: Option<bool>,
) -> Result<Vec<Empleado>, ApiError> {
    verificar_cliente(pool, cliente_id, false).await?;
    let sql = format!(
        "{} WHERE e.cliente_id = $1 AND ($2::boolean IS NULL OR e.activo = $2) ORDER BY e.nombre",
        SELECT_EMPLEADO
    );
    Ok(sqlx::query_as::<_, Empleado>(&sql)
        .bind(cliente_id)
        .bind(activo)
        .fetch_all(pool)
        .await?)
}

pub async fn obtener_empleado(
    pool: &PgPool,
    cliente_id: Uuid,
    id: Uuid,
) -> Result<Empleado, ApiError> {
    let sql = format!("{} WHERE e.id = $1 AND e.cliente_id = $2", SELECT_EMPLEADO);
    sqlx::query_as::<_, Empleado>(&sql)
        .bind(id)
        .bind(cliente_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Empleado"))
}

async fn verificar_referencias_empleado(
    pool: &PgPool,
    cliente_id: Uuid,
    puesto_id: Option<Uuid>,
    sucursal_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if let Some(puesto_id) = puesto_id {
        exigir_activo(pool, "puestos", puesto_id, "Puesto").await?;
    }
    if let Some(sucursal_id) = sucursal_id {
        let sucursal = obtener_sucursal(pool, cliente_id, sucursal_id).await?;
        if !sucursal.activo {
            return Err(ApiError::SolicitudInvalida("La sucursal está dada de baja".into()));
        }
    }
    Ok(())
}

async fn verificar_email_empleado(
    pool: &PgPool,
    cliente_id: Uuid,
    email: Option<&str>,
    excluir: Option<Uuid>,
) -> Result<(), ApiError> {
    if let Some(email) = email {
        if hay_duplicado_en(pool, SQL_EMPLEADO_EMAIL, email, excluir, cliente_id).await? {
            return Err(ApiError::Conflicto(format!(
                "El cliente ya tiene un empleado con el email '{}'",
                email
            )));
        }
    }
    Ok(())
}

pub async fn crear_empleado(
    pool: &PgPool,
    cliente_id: Uuid,
    datos: NuevoEmpleado,
) -> Result<Empleado, ApiError> {
    verificar_cliente(pool, cliente_id, true).await?;
    verificar_referencias_empleado(pool, cliente_id, datos.puesto_id, datos.sucursal_id).await?;
    let email = opcional(&datos.email);
    verificar_email_empleado(pool, cliente_id, email.as_deref(), None).await?;

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO cliente_empleados (cliente_id, puesto_id, sucursal_id, nombre, telefono, email) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(cliente_id)
    .bind(datos.puesto_id)
    .bind(datos.sucursal_id)
    .bind(datos.nombre.trim())
    .bind(opcional(&datos.telefono))
    .bind(email)
    .fetch_one(pool)
    .await?;

    obtener_empleado(pool, cliente_id, id).await
}

pub async fn actualizar_empleado(
    pool: &PgPool,
    cliente_id: Uuid,
    id: Uuid,
    datos: ActualizarEmpleado,
) -> Result<Empleado, ApiError> {
    let existente = obtener_empleado(pool, cliente_id, id).await?;
    let puesto_id = referencia(datos.puesto_id, existente.puesto_id);
    let sucursal_id = referencia(datos.sucursal_id, existente.sucursal_id);
    let nuevo_puesto = puesto_id.filter(|p| Some(*p) != existente.puesto_id);
    let nueva_sucursal = sucursal_id.filter(|s| Some(*s) != existente.sucursal_id);
    verificar_referencias_empleado(pool, cliente_id, nuevo_puesto, nueva_sucursal).await?;
    let email = fusionar(&datos.email, existente.email);
    verificar_email_empleado(pool, cliente_id, email.as_deref(), Some(id)).await?;

    sqlx::query(
        "UPDATE cliente_empleados SET nombre = $1, puesto_id = $2, sucursal_id = $3, telefono = $4, \
         email = $5, updated_at = NOW() WHERE id = $6",
    )
    .bind(requerido(&datos.nombre, &existente.nombre))
    .bind(puesto_id)
    .bind(sucursal_id)
    .bind(fusionar(&datos.telefono, existente.telefono))
    .bind(email)
    .bind(id)
    .execute(pool)
    .await?;

    obtener_empleado(pool, cliente_id, id).await
}

// Datos fiscales

const COLUMNAS_FISCALES: &str = "cliente_id, rfc, razon_social, regimen_fiscal, uso_cfdi, codigo_postal, \
     email_facturacion, created_at, updated_at";

const SQL_RFC_DUPLICADO: &str = "SELECT EXISTS(SELECT 1 FROM cliente_datos_fiscales \
     WHERE UPPER(rfc) = UPPER($1) AND ($2::uuid IS NULL OR cliente_id <> $2))";

pub async fn obtener_datos_fiscales(
    pool: &PgPool,
    cliente_id: Uuid,
) -> Result<DatosFiscales, ApiError> {
    verificar_cliente(pool, cliente_id, false).await?;
    let sql = format!(
        "SELECT {} FROM cliente_datos_fiscales WHERE cliente_id = $1",
        COLUMNAS_FISCALES
    );
    sqlx::query_as::<_, DatosFiscales>(&sql)
        .bind(cliente_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NoEncontrado("El cliente no tiene datos fiscales registrados".into()))
}

pub async fn guardar_datos_fiscales(
    pool: &PgPool,
    cliente_id: Uuid,
    datos: GuardarDatosFiscales,
) -> Result<DatosFiscales, ApiError> {
    verificar_cliente(pool, cliente_id, true).await?;
    let rfc = datos.rfc.trim().to_uppercase();
    if hay_duplicado(pool, SQL_RFC_DUPLICADO, &rfc, Some(cliente_id)).await? {
        return Err(ApiError::Conflicto(format!(
            "El RFC '{}' ya está registrado para otro cliente",
            rfc
        )));
    }

    let sql = format!(
        "INSERT INTO cliente_datos_fiscales \
         (cliente_id, rfc, razon_social, regimen_fiscal, uso_cfdi, codigo_postal, email_facturacion) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (cliente_id) DO UPDATE SET rfc = EXCLUDED.rfc, razon_social = EXCLUDED.razon_social, \
         regimen_fiscal = EXCLUDED.regimen_fiscal, uso_cfdi = EXCLUDED.uso_cfdi, \
         codigo_postal = EXCLUDED.codigo_postal, email_facturacion = EXCLUDED.email_facturacion, \
         updated_at = NOW() \
         RETURNING {}",
        COLUMNAS_FISCALES
    );
    let fiscales = sqlx::query_as::<_, DatosFiscales>(&sql)
        .bind(cliente_id)
        .bind(&rfc)
        .bind(datos.razon_social.trim())
        .bind(datos.regimen_fiscal.trim())
        .bind(opcional(&datos.uso_cfdi))
        .bind(&datos.codigo_postal)
        .bind(opcional(&datos.email_facturacion))
        .fetch_one(pool)
        .await?;

    tracing::info!(%cliente_id, "datos fiscales guardados");
    Ok(fiscales)
}
