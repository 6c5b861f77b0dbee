use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UsuarioActual;
use crate::error::ApiError;
use crate::models::cliente::{
    ActualizarCliente, ActualizarContacto, ActualizarDireccion, ActualizarEmpleado,
    ActualizarSucursal, GuardarDatosFiscales, NuevaDireccion, NuevaSucursal, NuevoCliente,
    NuevoContacto, NuevoEmpleado,
};
use crate::models::{validar, FiltroActivo};
use crate::services::clientes;
use crate::services::estado::{cambiar_estado, Entidad};

type Pool = web::Data<PgPool>;
type Ruta = web::Path<(Uuid, Uuid)>;

// Clientes

pub async fn listar(
    pool: Pool,
    filtro: web::Query<FiltroActivo>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(clientes::listar(&pool, filtro.activo).await?))
}

pub async fn obtener(
    pool: Pool,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(clientes::obtener(&pool, id.into_inner()).await?))
}

pub async fn crear(
    pool: Pool,
    datos: web::Json<NuevoCliente>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    Ok(HttpResponse::Created().json(clientes::crear(&pool, datos.into_inner()).await?))
}

pub async fn actualizar(
    pool: Pool,
    id: web::Path<Uuid>,
    datos: web::Json<ActualizarCliente>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let cliente = clientes::actualizar(&pool, id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(cliente))
}

pub async fn dar_de_baja(
    pool: Pool,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let estado = cambiar_estado(&pool, Entidad::Cliente, id.into_inner(), None, false).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub async fn activar(
    pool: Pool,
    id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let estado = cambiar_estado(&pool, Entidad::Cliente, id.into_inner(), None, true).await?;
    Ok(HttpResponse::Ok().json(estado))
}

/// `baja` / `activar` de los sub-recursos; cada scope registra su `Entidad`.
async fn cambiar_estado_sub(
    pool: &PgPool,
    entidad: Entidad,
    ruta: Ruta,
    activo: bool,
) -> Result<HttpResponse, ApiError> {
    let (cliente_id, id) = ruta.into_inner();
    clientes::verificar_cliente(pool, cliente_id, false).await?;
    let estado = cambiar_estado(pool, entidad, id, Some(cliente_id), activo).await?;
    Ok(HttpResponse::Ok().json(estado))
}

pub async fn dar_de_baja_sub(
    pool: Pool,
    entidad: web::Data<Entidad>,
    ruta: Ruta,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    cambiar_estado_sub(&pool, **entidad, ruta, false).await
}

pub async fn activar_sub(
    pool: Pool,
    entidad: web::Data<Entidad>,
    ruta: Ruta,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    cambiar_estado_sub(&pool, **entidad, ruta, true).await
}

// Contactos

pub async fn listar_contactos(
    pool: Pool,
    cliente_id: web::Path<Uuid>,
    filtro: web::Query<FiltroActivo>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let contactos =
        clientes::listar_contactos(&pool, cliente_id.into_inner(), filtro.activo).await?;
    Ok(HttpResponse::Ok().json(contactos))
}

pub async fn obtener_contacto(
    pool: Pool,
    ruta: Ruta,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let (cliente_id, id) = ruta.into_inner();
    Ok(HttpResponse::Ok().json(clientes::obtener_contacto(&pool, cliente_id, id).await?))
}

pub async fn crear_contacto(
    pool: Pool,
    cliente_id: web::Path<Uuid>,
    datos: web::Json<NuevoContacto>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let contacto =
        clientes::crear_contacto(&pool, cliente_id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Created().json(contacto))
}

pub async fn actualizar_contacto(
    pool: Pool,
    ruta: Ruta,
    datos: web::Json<ActualizarContacto>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let (cliente_id, id) = ruta.into_inner();
    let contacto = clientes::actualizar_contacto(&pool, cliente_id, id, datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(contacto))
}

// Direcciones

pub async fn listar_direcciones(
    pool: Pool,
    cliente_id: web::Path<Uuid>,
    filtro: web::Query<FiltroActivo>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let direcciones =
        clientes::listar_direcciones(&pool, cliente_id.into_inner(), filtro.activo).await?;
    Ok(HttpResponse::Ok().json(direcciones))
}

pub async fn obtener_direccion(
    pool: Pool,
    ruta: Ruta,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let (cliente_id, id) = ruta.into_inner();
    Ok(HttpResponse::Ok().json(clientes::obtener_direccion(&pool, cliente_id, id).await?))
}

pub async fn crear_direccion(
    pool: Pool,
    cliente_id: web::Path<Uuid>,
    datos: web::Json<NuevaDireccion>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let direccion =
        clientes::crear_direccion(&pool, cliente_id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Created().json(direccion))
}

pub async fn actualizar_direccion(
    pool: Pool,
    ruta: Ruta,
    datos: web::Json<ActualizarDireccion>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let (cliente_id, id) = ruta.into_inner();
    let direccion =
        clientes::actualizar_direccion(&pool, cliente_id, id, datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(direccion))
}

// Sucursales

pub async fn listar_sucursales(
    pool: Pool,
    cliente_id: web::Path<Uuid>,
    filtro: web::Query<FiltroActivo>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let sucursales =
        clientes::listar_sucursales(&pool, cliente_id.into_inner(), filtro.activo).await?;
    Ok(HttpResponse::Ok().json(sucursales))
}

pub async fn obtener_sucursal(
    pool: Pool,
    ruta: Ruta,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let (cliente_id, id) = ruta.into_inner();
    Ok(HttpResponse::Ok().json(clientes::obtener_sucursal(&pool, cliente_id, id).await?))
}

pub async fn crear_sucursal(
    pool: Pool,
    cliente_id: web::Path<Uuid>,
    datos: web::Json<NuevaSucursal>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let sucursal =
        clientes::crear_sucursal(&pool, cliente_id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Created().json(sucursal))
}

pub async fn actualizar_sucursal(
    pool: Pool,
    ruta: Ruta,
    datos: web::Json<ActualizarSucursal>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let (cliente_id, id) = ruta.into_inner();
    let sucursal = clientes::actualizar_sucursal(&pool, cliente_id, id, datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(sucursal))
}

// Empleados

pub async fn listar_empleados(
    pool: Pool,
    cliente_id: web::Path<Uuid>,
    filtro: web::Query<FiltroActivo>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let empleados =
        clientes::listar_empleados(&pool, cliente_id.into_inner(), filtro.activo).await?;
    Ok(HttpResponse::Ok().json(empleados))
}

pub async fn obtener_empleado(
    pool: Pool,
    ruta: Ruta,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let (cliente_id, id) = ruta.into_inner();
    Ok(HttpResponse::Ok().json(clientes::obtener_empleado(&pool, cliente_id, id).await?))
}

pub async fn crear_empleado(
    pool: Pool,
    cliente_id: web::Path<Uuid>,
    datos: web::Json<NuevoEmpleado>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let empleado =
        clientes::crear_empleado(&pool, cliente_id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Created().json(empleado))
}

pub async fn actualizar_empleado(
    pool: Pool,
    ruta: Ruta,
    datos: web::Json<ActualizarEmpleado>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let (cliente_id, id) = ruta.into_inner();
    let empleado = clientes::actualizar_empleado(&pool, cliente_id, id, datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(empleado))
}

// Datos fiscales

pub async fn obtener_datos_fiscales(
    pool: Pool,
    cliente_id: web::Path<Uuid>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    let datos = clientes::obtener_datos_fiscales(&pool, cliente_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(datos))
}

pub async fn guardar_datos_fiscales(
    pool: Pool,
    cliente_id: web::Path<Uuid>,
    datos: web::Json<GuardarDatosFiscales>,
    _usuario: UsuarioActual,
) -> Result<HttpResponse, ApiError> {
    validar(&*datos)?;
    let guardados =
        clientes::guardar_datos_fiscales(&pool, cliente_id.into_inner(), datos.into_inner()).await?;
    Ok(HttpResponse::Ok().json(guardados))
}

fn estado_sub(entidad: Entidad, ruta: &str) -> actix_web::Scope {
    web::scope(ruta)
        .app_data(web::Data::new(entidad))
        .route("/{id}/baja", web::patch().to(dar_de_baja_sub))
        .route("/{id}/activar", web::patch().to(activar_sub))
}

pub fn configurar(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/clientes")
            .route("", web::get().to(listar))
            .route("", web::post().to(crear))
            .route("/{cliente_id}/contactos", web::get().to(listar_contactos))
            .route("/{cliente_id}/contactos", web::post().to(crear_contacto))
            .route("/{cliente_id}/contactos/{id}", web::get().to(obtener_contacto))
            .route("/{cliente_id}/contactos/{id}", web::put().to(actualizar_contacto))
            .route("/{cliente_id}/direcciones", web::get().to(listar_direcciones))
            .route("/{cliente_id}/direcciones", web::post().to(crear_direccion))
            .route("/{cliente_id}/direcciones/{id}", web::get().to(obtener_direccion))
            .route("/{cliente_id}/direcciones/{id}", web::put().to(actualizar_direccion))
            .route("/{cliente_id}/sucursales", web::get().to(listar_sucursales))
            .route("/{cliente_id}/sucursales", web::post().to(crear_sucursal))
            .route("/{cliente_id}/sucursales/{id}", web::get().to(obtener_sucursal))
            .route("/{cliente_id}/sucursales/{id}", web::put().to(actualizar_sucursal))
            .route("/{cliente_id}/empleados", web::get().to(listar_empleados))
            .route("/{cliente_id}/empleados", web::post().to(crear_empleado))
            .route("/{cliente_id}/empleados/{id}", web::get().to(obtener_empleado))
            .route("/{cliente_id}/empleados/{id}", web::put().to(actualizar_empleado))
            .route("/{cliente_id}/datos-fiscales", web::get().to(obtener_datos_fiscales))
            .route("/{cliente_id}/datos-fiscales", web::put().to(guardar_datos_fiscales))
            .service(estado_sub(Entidad::Contacto, "/{cliente_id}/contactos"))
            .service(estado_sub(Entidad::Direccion, "/{cliente_id}/direcciones"))
            .service(estado_sub(Entidad::Sucursal, "/{cliente_id}/sucursales"))
            .service(estado_sub(Entidad::Empleado, "/{cliente_id}/empleados"))
            .route("/{id}", web::get().to(obtener))
            .route("/{id}", web::put().to(actualizar))
            .route("/{id}/baja", web::patch().to(dar_de_baja))
            .route("/{id}/activar", web::patch().to(activar)),
    );
}
