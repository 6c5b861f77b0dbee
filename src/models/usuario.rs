use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{email_opcional, no_vacio};
use crate::auth::{ROL_ADMIN, ROL_USUARIO};

/// Usuario tal como se expone; el hash de la contraseña nunca sale de la base.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Usuario {
    pub id: Uuid,
    pub nombre: String,
    pub usuario: String,
    pub email: Option<String>,
    pub rol: String,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn rol_valido(valor: &str) -> Result<(), ValidationError> {
    if valor != ROL_ADMIN && valor != ROL_USUARIO {
        return Err(ValidationError::new("rol"));
    }
    Ok(())
}

fn nombre_usuario(valor: &str) -> Result<(), ValidationError> {
    if !valor
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
    {
        return Err(ValidationError::new("usuario"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevoUsuario {
    #[validate(length(min = 1, max = 120), custom(function = "no_vacio"))]
    pub nombre: String,
    #[validate(length(min = 3, max = 60), custom(function = "nombre_usuario"))]
    pub usuario: String,
    #[validate(custom(function = "email_opcional"))]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(custom(function = "rol_valido"))]
    pub rol: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActualizarUsuario {
    #[validate(length(min = 1, max = 120), custom(function = "no_vacio"))]
    pub nombre: Option<String>,
    #[validate(length(min = 3, max = 60), custom(function = "nombre_usuario"))]
    pub usuario: Option<String>,
    #[validate(custom(function = "email_opcional"))]
    pub email: Option<String>,
    #[validate(custom(function = "rol_valido"))]
    pub rol: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CambiarPassword {
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub usuario: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub usuario: Usuario,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_corto_y_rol_desconocido() {
        let datos = NuevoUsuario {
            nombre: "Ana López".into(),
            usuario: "alopez".into(),
            email: None,
            password: "corta".into(),
            rol: Some("superusuario".into()),
        };
        let errores = datos.validate().unwrap_err();
        let campos = errores.field_errors();
        assert!(campos.contains_key("password"));
        assert!(campos.contains_key("rol"));
    }

    #[test]
    fn usuario_con_espacios_es_invalido() {
        let datos = ActualizarUsuario {
            nombre: None,
            usuario: Some("a lopez".into()),
            email: None,
            rol: None,
        };
        assert!(datos.validate().unwrap_err().field_errors().contains_key("usuario"));
    }
}
