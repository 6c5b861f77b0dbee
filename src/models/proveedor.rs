use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{email_opcional, no_vacio, rfc_opcional};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Proveedor {
    pub id: Uuid,
    pub nombre: String,
    pub rfc: Option<String>,
    pub contacto: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub direccion: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevoProveedor {
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: String,
    #[validate(custom(function = "rfc_opcional"))]
    pub rfc: Option<String>,
    #[validate(length(max = 120))]
    pub contacto: Option<String>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(custom(function = "email_opcional"))]
    pub email: Option<String>,
    pub direccion: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActualizarProveedor {
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: Option<String>,
    #[validate(custom(function = "rfc_opcional"))]
    pub rfc: Option<String>,
    #[validate(length(max = 120))]
    pub contacto: Option<String>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(custom(function = "email_opcional"))]
    pub email: Option<String>,
    pub direccion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rechaza_email_y_rfc_invalidos() {
        let datos = NuevoProveedor {
            nombre: "Refaccionaria del Norte".into(),
            rfc: Some("123".into()),
            contacto: None,
            telefono: None,
            email: Some("no-es-correo".into()),
            direccion: None,
        };
        let errores = datos.validate().unwrap_err();
        let campos = errores.field_errors();
        assert!(campos.contains_key("rfc"));
        assert!(campos.contains_key("email"));
    }
}
