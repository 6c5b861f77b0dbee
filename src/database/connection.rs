use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;

const REINTENTOS: u32 = 10;

pub async fn init(config: &Config) -> Result<PgPool, sqlx::Error> {
    let connect_options = PgConnectOptions::from_str(&config.database_url)?
        .application_name("servicio-campo-backend");

    let mut restantes = REINTENTOS;
    loop {
        match PgPoolOptions::new()
            .max_connections(config.max_conexiones)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(connect_options.clone())
            .await
        {
            Ok(pool) => {
                tracing::info!("conexión a base de datos establecida");
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("migraciones aplicadas");
                return Ok(pool);
            }
            Err(e) => {
                restantes -= 1;
                if restantes == 0 {
                    tracing::error!(error = %e, "no fue posible conectar a la base de datos");
                    return Err(e);
                }
                tracing::warn!(error = %e, restantes, "fallo al conectar, reintentando");
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
