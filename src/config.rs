use std::env;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Falta la variable de entorno {0}")]
    Falta(&'static str),
    #[error("Valor inválido para {variable}: '{valor}'")]
    Invalida { variable: &'static str, valor: String },
}

/// Configuración del servidor, leída del entorno (y de `.env` si existe).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_conexiones: u32,
    pub jwt_secret: String,
    pub jwt_horas: i64,
    pub cors_origenes: Vec<String>,
    pub admin_usuario: String,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::desde(|clave| env::var(clave).ok())
    }

    /// Construye la configuración con una fuente de variables arbitraria.
    pub fn desde<F>(leer: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let requerida = |clave: &'static str| {
            leer(clave)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Falta(clave))
        };

        Ok(Config {
            database_url: requerida("DATABASE_URL")?,
            host: leer("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: numero(&leer, "PORT", 8080)?,
            max_conexiones: numero(&leer, "DB_MAX_CONEXIONES", 10)?,
            jwt_secret: requerida("JWT_SECRET")?,
            jwt_horas: numero(&leer, "JWT_HORAS", 24)?,
            cors_origenes: leer("CORS_ORIGENES")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            admin_usuario: leer("ADMIN_USUARIO").unwrap_or_else(|| "admin".to_string()),
            admin_password: leer("ADMIN_PASSWORD").filter(|v| !v.is_empty()),
        })
    }

    pub fn direccion(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn numero<F, T>(leer: &F, variable: &'static str, defecto: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match leer(variable) {
        None => Ok(defecto),
        Some(valor) => valor
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalida { variable, valor }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fuente(pares: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let mapa: HashMap<String, String> = pares
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |clave| mapa.get(clave).cloned()
    }

    #[test]
    fn usa_valores_por_defecto() {
        let config = Config::desde(fuente(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("JWT_SECRET", "s3cr3t"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.max_conexiones, 10);
        assert_eq!(config.jwt_horas, 24);
        assert_eq!(config.admin_usuario, "admin");
        assert!(config.admin_password.is_none());
        assert!(config.cors_origenes.is_empty());
    }

    #[test]
    fn separa_origenes_cors() {
        let config = Config::desde(fuente(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("JWT_SECRET", "s3cr3t"),
            ("CORS_ORIGENES", "http://a.test, ,http://b.test"),
        ]))
        .unwrap();

        assert_eq!(config.cors_origenes, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn falta_secreto() {
        let err = Config::desde(fuente(&[("DATABASE_URL", "postgres://localhost/db")])).unwrap_err();
        assert!(matches!(err, ConfigError::Falta("JWT_SECRET")));
    }

    #[test]
    fn puerto_invalido() {
        let err = Config::desde(fuente(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("JWT_SECRET", "x"),
            ("PORT", "ochenta"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalida { variable: "PORT", .. }));
    }
}
