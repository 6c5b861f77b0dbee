use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{anulable, codigo_postal_valido, email_opcional, no_vacio, rfc_valido};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cliente {
    pub id: Uuid,
    pub nombre: String,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub notas: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevoCliente {
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: String,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(custom(function = "email_opcional"))]
    pub email: Option<String>,
    pub notas: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActualizarCliente {
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: Option<String>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(custom(function = "email_opcional"))]
    pub email: Option<String>,
    pub notas: Option<String>,
}

// Contactos

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contacto {
    pub id: Uuid,
    pub cliente_id: Uuid,
    pub nombre: String,
    pub puesto: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevoContacto {
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: String,
    #[validate(length(max = 120))]
    pub puesto: Option<String>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(custom(function = "email_opcional"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActualizarContacto {
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: Option<String>,
    #[validate(length(max = 120))]
    pub puesto: Option<String>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(custom(function = "email_opcional"))]
    pub email: Option<String>,
}

// Direcciones

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Direccion {
    pub id: Uuid,
    pub cliente_id: Uuid,
    pub alias: String,
    pub calle: String,
    pub numero_exterior: Option<String>,
    pub numero_interior: Option<String>,
    pub colonia: Option<String>,
    pub municipio: Option<String>,
    pub estado: Option<String>,
    pub codigo_postal: String,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevaDireccion {
    #[validate(length(min = 1, max = 80), custom(function = "no_vacio"))]
    pub alias: String,
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub calle: String,
    #[validate(length(max = 20))]
    pub numero_exterior: Option<String>,
    #[validate(length(max = 20))]
    pub numero_interior: Option<String>,
    #[validate(length(max = 120))]
    pub colonia: Option<String>,
    #[validate(length(max = 120))]
    pub municipio: Option<String>,
    #[validate(length(max = 80))]
    pub estado: Option<String>,
    #[validate(custom(function = "codigo_postal_valido"))]
    pub codigo_postal: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActualizarDireccion {
    #[validate(length(min = 1, max = 80), custom(function = "no_vacio"))]
    pub alias: Option<String>,
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub calle: Option<String>,
    #[validate(length(max = 20))]
    pub numero_exterior: Option<String>,
    #[validate(length(max = 20))]
    pub numero_interior: Option<String>,
    #[validate(length(max = 120))]
    pub colonia: Option<String>,
    #[validate(length(max = 120))]
    pub municipio: Option<String>,
    #[validate(length(max = 80))]
    pub estado: Option<String>,
    #[validate(custom(function = "codigo_postal_valido"))]
    pub codigo_postal: Option<String>,
}

// Sucursales

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sucursal {
    pub id: Uuid,
    pub cliente_id: Uuid,
    pub direccion_id: Option<Uuid>,
    pub nombre: String,
    pub telefono: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevaSucursal {
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: String,
    pub direccion_id: Option<Uuid>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActualizarSucursal {
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "anulable")]
    pub direccion_id: Option<Option<Uuid>>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
}

// Empleados

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Empleado {
    pub id: Uuid,
    pub cliente_id: Uuid,
    pub puesto_id: Option<Uuid>,
    pub puesto: Option<String>,
    pub sucursal_id: Option<Uuid>,
    pub nombre: String,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevoEmpleado {
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: String,
    pub puesto_id: Option<Uuid>,
    pub sucursal_id: Option<Uuid>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(custom(function = "email_opcional"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActualizarEmpleado {
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "anulable")]
    pub puesto_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "anulable")]
    pub sucursal_id: Option<Option<Uuid>>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(custom(function = "email_opcional"))]
    pub email: Option<String>,
}

// Datos fiscales

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DatosFiscales {
    pub cliente_id: Uuid,
    pub rfc: String,
    pub razon_social: String,
    pub regimen_fiscal: String,
    pub uso_cfdi: Option<String>,
    pub codigo_postal: String,
    pub email_facturacion: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GuardarDatosFiscales {
    #[validate(custom(function = "rfc_valido"))]
    pub rfc: String,
    #[validate(length(min = 1, max = 200), custom(function = "no_vacio"))]
    pub razon_social: String,
    #[validate(length(min = 3, max = 10))]
    pub regimen_fiscal: String,
    #[validate(length(min = 3, max = 10))]
    pub uso_cfdi: Option<String>,
    #[validate(custom(function = "codigo_postal_valido"))]
    pub codigo_postal: String,
    #[validate(custom(function = "email_opcional"))]
    pub email_facturacion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direccion_con_codigo_postal_invalido() {
        let datos = NuevaDireccion {
            alias: "Matriz".into(),
            calle: "Av. Reforma".into(),
            numero_exterior: Some("100".into()),
            numero_interior: None,
            colonia: None,
            municipio: None,
            estado: None,
            codigo_postal: "123".into(),
        };
        assert!(datos.validate().unwrap_err().field_errors().contains_key("codigo_postal"));
    }

    #[test]
    fn datos_fiscales_validos() {
        let datos = GuardarDatosFiscales {
            rfc: "XAXX010101000".into(),
            razon_social: "Público en general".into(),
            regimen_fiscal: "616".into(),
            uso_cfdi: Some("S01".into()),
            codigo_postal: "64000".into(),
            email_facturacion: Some("facturas@cliente.mx".into()),
        };
        assert!(datos.validate().is_ok());
    }

    #[test]
    fn email_de_contacto_en_blanco_se_borra() {
        let datos = ActualizarContacto {
            nombre: None,
            puesto: None,
            telefono: None,
            email: Some(String::new()),
        };
        assert!(datos.validate().is_ok());
        assert_eq!(crate::models::fusionar(&datos.email, Some("ana@cliente.mx".into())), None);

        let invalido = ActualizarContacto {
            email: Some("ana@".into()),
            ..datos
        };
        assert!(invalido.validate().unwrap_err().field_errors().contains_key("email"));
    }
}
