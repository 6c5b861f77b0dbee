//! Verifica la conexión a PostgreSQL y el estado de las migraciones.

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use servicio_campo::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    tracing::info!("probando conexión a la base de datos");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "fallo la conexión; revise DATABASE_URL y que PostgreSQL esté corriendo");
            e
        })?;

    let version: String = sqlx::query_scalar("SELECT version()").fetch_one(&pool).await?;
    tracing::info!(%version, "conexión exitosa");

    let aplicadas: Option<i64> = sqlx::query_scalar(
        "SELECT COUNT(*) FROM _sqlx_migrations WHERE success",
    )
    .fetch_optional(&pool)
    .await
    .unwrap_or(None);

    match aplicadas {
        Some(n) => tracing::info!(migraciones = n, "migraciones aplicadas"),
        None => tracing::warn!("la base aún no tiene migraciones; inicie el servidor para aplicarlas"),
    }

    let usuarios: Option<i64> = sqlx::query_scalar("SELECT COUNT(*) FROM usuarios")
        .fetch_optional(&pool)
        .await
        .unwrap_or(None);
    if let Some(n) = usuarios {
        tracing::info!(usuarios = n, "usuarios registrados");
    }

    Ok(())
}
