use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use servicio_campo::config::Config;
use servicio_campo::{database, handlers};

fn cors(origenes: &[String]) -> Cors {
    let permitidos = origenes.to_vec();
    Cors::default()
        .allowed_origin_fn(move |origin, _req_head| {
            let origin = origin.as_bytes();
            origin.starts_with(b"http://localhost")
                || origin.starts_with(b"http://127.0.0.1")
                || permitidos.iter().any(|o| o.as_bytes() == origin)
        })
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuración inválida");
            std::process::exit(1);
        }
    };

    let pool = match database::init(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "no se pudo inicializar la base de datos");
            std::process::exit(1);
        }
    };

    if let Err(e) = database::sembrar_admin(&pool, &config).await {
        tracing::error!(error = %e, "no se pudo crear el usuario administrador");
        std::process::exit(1);
    }

    let direccion = config.direccion();
    tracing::info!(host = %direccion.0, puerto = direccion.1, "servidor iniciado");

    let config = web::Data::new(config);
    let pool = web::Data::new(pool);

    HttpServer::new(move || {
        App::new()
            .wrap(cors(&config.cors_origenes))
            .wrap(Logger::default())
            .app_data(pool.clone())
            .app_data(config.clone())
            .configure(handlers::configurar)
    })
    .bind(direccion)?
    .run()
    .await
}
