use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use futures_util::future::{ready, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;

pub const ROL_ADMIN: &str = "admin";
pub const ROL_USUARIO: &str = "usuario";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub rol: String,
    pub exp: usize,
}

/// Usuario autenticado por el token `Bearer` de la petición.
#[derive(Debug, Clone)]
pub struct UsuarioActual {
    pub id: Uuid,
    pub rol: String,
}

impl UsuarioActual {
    pub fn es_admin(&self) -> bool {
        self.rol == ROL_ADMIN
    }

    pub fn exigir_admin(&self) -> Result<(), ApiError> {
        if self.es_admin() {
            Ok(())
        } else {
            Err(ApiError::Prohibido("Se requiere rol de administrador".into()))
        }
    }
}

pub fn emitir_token(config: &Config, usuario_id: Uuid, rol: &str) -> Result<String, ApiError> {
    let expiracion = Utc::now()
        .checked_add_signed(Duration::hours(config.jwt_horas))
        .ok_or_else(|| ApiError::Interno("Fecha de expiración inválida".into()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: usuario_id.to_string(),
        rol: rol.to_string(),
        exp: expiracion,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Interno(format!("Error al generar token: {}", e)))
}

pub fn verificar_token(config: &Config, token: &str) -> Result<UsuarioActual, ApiError> {
    let datos = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::NoAutorizado("Token inválido".into()))?;

    let id = Uuid::parse_str(&datos.claims.sub)
        .map_err(|_| ApiError::NoAutorizado("Token inválido".into()))?;

    Ok(UsuarioActual {
        id,
        rol: datos.claims.rol,
    })
}

fn extraer(req: &HttpRequest) -> Result<UsuarioActual, ApiError> {
    let config = req
        .app_data::<web::Data<Config>>()
        .ok_or_else(|| ApiError::Interno("Configuración no registrada".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::NoAutorizado("Se requiere el encabezado Authorization".into()))?;

    verificar_token(config, token.trim())
}

impl FromRequest for UsuarioActual {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extraer(req))
    }
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Interno(format!("Error al cifrar contraseña: {}", e)))
}

pub fn verificar_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            database_url: "postgres://localhost/test".into(),
            host: "127.0.0.1".into(),
            port: 8080,
            max_conexiones: 1,
            jwt_secret: "secreto-de-prueba".into(),
            jwt_horas: 1,
            cors_origenes: vec![],
            admin_usuario: "admin".into(),
            admin_password: None,
        }
    }

    #[test]
    fn token_ida_y_vuelta() {
        let config = config();
        let id = Uuid::new_v4();
        let token = emitir_token(&config, id, ROL_ADMIN).unwrap();
        let usuario = verificar_token(&config, &token).unwrap();
        assert_eq!(usuario.id, id);
        assert!(usuario.es_admin());
    }

    #[test]
    fn token_con_otro_secreto_es_rechazado() {
        let config = config();
        let token = emitir_token(&config, Uuid::new_v4(), ROL_USUARIO).unwrap();
        let otra = Config {
            jwt_secret: "otro".into(),
            ..config
        };
        assert!(matches!(verificar_token(&otra, &token), Err(ApiError::NoAutorizado(_))));
    }

    #[test]
    fn usuario_normal_no_es_admin() {
        let usuario = UsuarioActual {
            id: Uuid::new_v4(),
            rol: ROL_USUARIO.into(),
        };
        assert!(matches!(usuario.exigir_admin(), Err(ApiError::Prohibido(_))));
    }
}
