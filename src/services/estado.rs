use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::catalogo::Catalogo;
use crate::models::EstadoRespuesta;

/// Entidades con ciclo de vida `baja` / `activar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entidad {
    Catalogo(Catalogo),
    Proveedor,
    Refaccion,
    Cliente,
    Contacto,
    Direccion,
    Sucursal,
    Empleado,
    Equipo,
    Plantilla,
    CuentaBancaria,
    Modulo,
    Submodulo,
    Usuario,
}

impl Entidad {
    pub fn tabla(self) -> &'static str {
        match self {
            Entidad::Catalogo(c) => c.tabla(),
            Entidad::Proveedor => "proveedores",
            Entidad::Refaccion => "refacciones",
            Entidad::Cliente => "clientes",
            Entidad::Contacto => "cliente_contactos",
            Entidad::Direccion => "cliente_direcciones",
            Entidad::Sucursal => "cliente_sucursales",
            Entidad::Empleado => "cliente_empleados",
            Entidad::Equipo => "equipos",
            Entidad::Plantilla => "plantillas_equipo",
            Entidad::CuentaBancaria => "cuentas_bancarias",
            Entidad::Modulo => "modulos",
            Entidad::Submodulo => "submodulos",
            Entidad::Usuario => "usuarios",
        }
    }

    pub fn etiqueta(self) -> &'static str {
        match self {
            Entidad::Catalogo(c) => c.etiqueta(),
            Entidad::Proveedor => "Proveedor",
            Entidad::Refaccion => "Refacción",
            Entidad::Cliente => "Cliente",
            Entidad::Contacto => "Contacto",
            Entidad::Direccion => "Dirección",
            Entidad::Sucursal => "Sucursal",
            Entidad::Empleado => "Empleado",
            Entidad::Equipo => "Equipo",
            Entidad::Plantilla => "Plantilla de equipo",
            Entidad::CuentaBancaria => "Cuenta bancaria",
            Entidad::Modulo => "Módulo",
            Entidad::Submodulo => "Submódulo",
            Entidad::Usuario => "Usuario",
        }
    }

    fn pertenece_a_cliente(self) -> bool {
        matches!(
            self,
            Entidad::Contacto | Entidad::Direccion | Entidad::Sucursal | Entidad::Empleado
        )
    }
}

pub(crate) fn sql_cambio(entidad: Entidad, con_cliente: bool) -> String {
    let mut sql = format!(
        "UPDATE {} SET activo = $1, updated_at = NOW() WHERE id = $2 AND activo <> $1",
        entidad.tabla()
    );
    if con_cliente {
        sql.push_str(" AND cliente_id = $3");
    }
    sql.push_str(" RETURNING id");
    sql
}

pub(crate) fn sql_existencia(entidad: Entidad, con_cliente: bool) -> String {
    let mut sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1", entidad.tabla());
    if con_cliente {
        sql.push_str(" AND cliente_id = $2");
    }
    sql.push(')');
    sql
}

/// Cambia la bandera `activo`. Sin fila → 404; fila ya en ese estado → 409.
///
/// Para contactos, direcciones, sucursales y empleados `cliente_id` acota la fila al cliente.
pub async fn cambiar_estado(
    pool: &PgPool,
    entidad: Entidad,
    id: Uuid,
    cliente_id: Option<Uuid>,
    activo: bool,
) -> Result<EstadoRespuesta, ApiError> {
    let con_cliente = entidad.pertenece_a_cliente() && cliente_id.is_some();

    let sql = sql_cambio(entidad, con_cliente);
    let mut cambio = sqlx::query_scalar::<_, Uuid>(&sql)
        .bind(activo)
        .bind(id);
    if con_cliente {
        cambio = cambio.bind(cliente_id);
    }
    let actualizado = cambio.fetch_optional(pool).await?;

    if actualizado.is_some() {
        tracing::info!(tabla = entidad.tabla(), %id, activo, "estado actualizado");
        return Ok(EstadoRespuesta { id, activo });
    }

    let sql = sql_existencia(entidad, con_cliente);
    let mut consulta = sqlx::query_scalar::<_, bool>(&sql).bind(id);
    if con_cliente {
        consulta = consulta.bind(cliente_id);
    }
    let existe = consulta.fetch_one(pool).await?;

    if !existe {
        return Err(ApiError::no_encontrado(entidad.etiqueta()));
    }

    let estado = if activo { "activo" } else { "dado de baja" };
    Err(ApiError::Conflicto(format!(
        "{}: el registro ya se encuentra {}",
        entidad.etiqueta(),
        estado
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_de_cambio_simple() {
        assert_eq!(
            sql_cambio(Entidad::Catalogo(Catalogo::Bancos), false),
            "UPDATE bancos SET activo = $1, updated_at = NOW() WHERE id = $2 AND activo <> $1 RETURNING id"
        );
    }

    #[test]
    fn sql_acotado_a_cliente() {
        let sql = sql_cambio(Entidad::Sucursal, true);
        assert!(sql.starts_with("UPDATE cliente_sucursales"));
        assert!(sql.contains("AND cliente_id = $3 RETURNING id"));
        assert_eq!(
            sql_existencia(Entidad::Contacto, true),
            "SELECT EXISTS(SELECT 1 FROM cliente_contactos WHERE id = $1 AND cliente_id = $2)"
        );
    }

    #[test]
    fn solo_subrecursos_pertenecen_a_cliente() {
        assert!(Entidad::Empleado.pertenece_a_cliente());
        assert!(!Entidad::Cliente.pertenece_a_cliente());
        assert!(!Entidad::Catalogo(Catalogo::Unidades).pertenece_a_cliente());
    }
}
