//! Reglas que dependen de la base de datos: saldos de cuentas, ciclo
//! baja / activar, unicidad y conciliación de plantillas.
//!
//! Cada prueba corre sobre una base nueva con las migraciones aplicadas
//! (`DATABASE_URL` debe apuntar a un servidor PostgreSQL).

use std::str::FromStr;

use actix_web::http::StatusCode;
use actix_web::ResponseError;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use servicio_campo::error::ApiError;
use servicio_campo::models::catalogo::Catalogo;
use servicio_campo::services::estado::{cambiar_estado, Entidad};
use servicio_campo::services::{
    catalogos, clientes, cuentas_bancarias, equipos, plantillas, refacciones, usuarios,
};

fn datos<T: DeserializeOwned>(valor: Value) -> T {
    serde_json::from_value(valor).unwrap()
}

fn d(valor: &str) -> Decimal {
    Decimal::from_str(valor).unwrap()
}

fn estado_http(resultado: Result<impl std::fmt::Debug, ApiError>) -> StatusCode {
    resultado.unwrap_err().status_code()
}

async fn usuario(pool: &PgPool) -> Uuid {
    let nuevo = datos(json!({
        "nombre": "Capturista",
        "usuario": "capturista",
        "password": "contrasena-segura",
    }));
    usuarios::crear(pool, nuevo).await.unwrap().id
}

async fn elemento(pool: &PgPool, catalogo: Catalogo, nombre: &str) -> Uuid {
    let nuevo = datos(json!({ "nombre": nombre }));
    catalogos::crear(pool, catalogo, nuevo).await.unwrap().id
}

async fn refaccion(pool: &PgPool, unidad_id: Uuid, clave: &str, costo: &str) -> Uuid {
    let nueva = datos(json!({
        "clave": clave,
        "nombre": format!("Refacción {}", clave),
        "unidad_id": unidad_id,
        "costo": costo,
    }));
    refacciones::crear(pool, nueva).await.unwrap().id
}

#[sqlx::test(migrations = "./migrations")]
async fn ajuste_de_saldo_inicial_recorre_los_saldos(pool: PgPool) {
    let usuario_id = usuario(&pool).await;
    let banco_id = elemento(&pool, Catalogo::Bancos, "Banco del Norte").await;

    let nueva = datos(json!({
        "banco_id": banco_id,
        "nombre": "Operación",
        "numero_cuenta": "0011223344",
        "saldo_inicial": "1000.00",
        "fecha_saldo_inicial": "2024-01-01",
    }));
    let cuenta = cuentas_bancarias::crear(&pool, nueva, usuario_id).await.unwrap();
    assert_eq!(cuenta.saldo_actual, d("1000"));

    let deposito = datos(json!({ "tipo": "DEPOSITO", "monto": "500.00", "concepto": "Cobro" }));
    cuentas_bancarias::registrar_movimiento(&pool, cuenta.id, deposito, usuario_id)
        .await
        .unwrap();
    let retiro = datos(json!({ "tipo": "RETIRO", "monto": "1200.00", "concepto": "Proveedor" }));
    cuentas_bancarias::registrar_movimiento(&pool, cuenta.id, retiro, usuario_id)
        .await
        .unwrap();

    let ajuste = datos(json!({ "saldo_inicial": "800.00" }));
    let cuenta = cuentas_bancarias::actualizar(&pool, cuenta.id, ajuste).await.unwrap();
    assert_eq!(cuenta.saldo_inicial, d("800"));
    assert_eq!(cuenta.saldo_actual, d("100"));

    let movimientos = cuentas_bancarias::listar_movimientos(&pool, cuenta.id).await.unwrap();
    let saldos: Vec<Decimal> = movimientos.iter().map(|m| m.saldo_resultante).collect();
    assert_eq!(saldos, vec![d("800"), d("1300"), d("100")]);
    assert_eq!(movimientos[0].tipo, "SALDO_INICIAL");
    assert_eq!(movimientos[0].monto, d("800"));

    // 100 - 300 dejaría el último saldo en negativo.
    let excesivo = datos(json!({ "saldo_inicial": "500.00" }));
    let resultado = cuentas_bancarias::actualizar(&pool, cuenta.id, excesivo).await;
    assert_eq!(estado_http(resultado), StatusCode::BAD_REQUEST);

    let sin_cambio = cuentas_bancarias::obtener(&pool, cuenta.id).await.unwrap();
    assert_eq!(sin_cambio.saldo_inicial, d("800"));
    assert_eq!(sin_cambio.saldo_actual, d("100"));
}

#[sqlx::test(migrations = "./migrations")]
async fn retiro_sin_fondos_se_rechaza(pool: PgPool) {
    let usuario_id = usuario(&pool).await;
    let banco_id = elemento(&pool, Catalogo::Bancos, "Banco del Sur").await;

    let nueva = datos(json!({
        "banco_id": banco_id,
        "nombre": "Caja chica",
        "numero_cuenta": "99887766",
        "saldo_inicial": "50.00",
    }));
    let cuenta = cuentas_bancarias::crear(&pool, nueva, usuario_id).await.unwrap();

    let retiro = datos(json!({ "tipo": "RETIRO", "monto": "50.01", "concepto": "Viáticos" }));
    let resultado =
        cuentas_bancarias::registrar_movimiento(&pool, cuenta.id, retiro, usuario_id).await;
    assert_eq!(estado_http(resultado), StatusCode::BAD_REQUEST);

    let cuenta = cuentas_bancarias::obtener(&pool, cuenta.id).await.unwrap();
    assert_eq!(cuenta.saldo_actual, d("50"));
}

#[sqlx::test(migrations = "./migrations")]
async fn baja_y_activar_distinguen_inexistente_de_repetido(pool: PgPool) {
    let id = elemento(&pool, Catalogo::Puestos, "Técnico").await;
    let entidad = Entidad::Catalogo(Catalogo::Puestos);

    let baja = cambiar_estado(&pool, entidad, id, None, false).await.unwrap();
    assert!(!baja.activo);

    let repetida = cambiar_estado(&pool, entidad, id, None, false).await;
    assert_eq!(estado_http(repetida), StatusCode::CONFLICT);

    let inexistente = cambiar_estado(&pool, entidad, Uuid::new_v4(), None, true).await;
    assert_eq!(estado_http(inexistente), StatusCode::NOT_FOUND);

    let activado = cambiar_estado(&pool, entidad, id, None, true).await.unwrap();
    assert!(activado.activo);
}

#[sqlx::test(migrations = "./migrations")]
async fn nombres_duplicados_sin_importar_mayusculas(pool: PgPool) {
    elemento(&pool, Catalogo::Unidades, "Pieza").await;

    let repetido = datos(json!({ "nombre": "  PIEZA " }));
    let resultado = catalogos::crear(&pool, Catalogo::Unidades, repetido).await;
    assert_eq!(estado_http(resultado), StatusCode::CONFLICT);

    // El mismo nombre en otro catálogo no choca.
    elemento(&pool, Catalogo::Puestos, "Pieza").await;
}

#[sqlx::test(migrations = "./migrations")]
async fn conciliacion_reutiliza_la_linea_dada_de_baja(pool: PgPool) {
    let unidad_id = elemento(&pool, Catalogo::Unidades, "Pieza").await;
    let filtro = refaccion(&pool, unidad_id, "FLT-01", "120.50").await;
    let banda = refaccion(&pool, unidad_id, "BND-02", "80.00").await;

    let nueva = datos(json!({
        "nombre": "Compresor 5HP",
        "detalles": [
            { "refaccion_id": filtro, "cantidad": "2" },
            { "refaccion_id": banda, "cantidad": "1" },
        ],
    }));
    let creada = plantillas::crear(&pool, nueva).await.unwrap();
    let id = creada.plantilla.id;
    assert_eq!(creada.plantilla.costo, d("321.00"));
    assert_eq!(creada.plantilla.precio_venta, d("433.35"));
    assert_eq!(creada.plantilla.precio_renta, d("32.10"));
    let linea_banda = creada
        .detalles
        .iter()
        .find(|l| l.refaccion_id == banda)
        .map(|l| l.id)
        .unwrap();

    let sin_banda = datos(json!({ "detalles": [{ "refaccion_id": filtro, "cantidad": "2" }] }));
    let editada = plantillas::actualizar(&pool, id, sin_banda).await.unwrap();
    assert_eq!(editada.detalles.len(), 1);
    assert_eq!(editada.plantilla.costo, d("241.00"));

    let con_banda = datos(json!({
        "detalles": [
            { "refaccion_id": filtro, "cantidad": "2" },
            { "refaccion_id": banda, "cantidad": "3", "costo_unitario": "10.01" },
        ],
    }));
    let editada = plantillas::actualizar(&pool, id, con_banda).await.unwrap();
    assert_eq!(editada.detalles.len(), 2);
    let reactivada = editada.detalles.iter().find(|l| l.refaccion_id == banda).unwrap();
    assert_eq!(reactivada.id, linea_banda);
    assert_eq!(reactivada.importe, reactivada.cantidad * reactivada.costo_unitario);
    assert_eq!(editada.plantilla.costo, d("271.03"));

    let filas: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM plantilla_equipo_detalles WHERE plantilla_id = $1",
    )
    .bind(id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(filas, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn equipo_asignado_no_se_da_de_baja(pool: PgPool) {
    let usuario_id = usuario(&pool).await;
    let cliente = clientes::crear(&pool, datos(json!({ "nombre": "Constructora Delta" })))
        .await
        .unwrap();
    let nuevo = datos(json!({ "numero_serie": "cmp-001", "nombre": "Compresor" }));
    let equipo = equipos::crear(&pool, nuevo).await.unwrap();

    let asignacion = datos(json!({ "cliente_id": cliente.id }));
    equipos::asignar(&pool, equipo.id, asignacion, usuario_id).await.unwrap();

    let baja = equipos::dar_de_baja(&pool, equipo.id).await;
    assert_eq!(estado_http(baja), StatusCode::CONFLICT);
    assert!(equipos::obtener(&pool, equipo.id).await.unwrap().activo);

    equipos::retirar(&pool, equipo.id, Default::default()).await.unwrap();
    let baja = equipos::dar_de_baja(&pool, equipo.id).await.unwrap();
    assert!(!baja.activo);

    let otra = datos(json!({ "cliente_id": cliente.id }));
    let resultado = equipos::asignar(&pool, equipo.id, otra, usuario_id).await;
    assert_eq!(estado_http(resultado), StatusCode::BAD_REQUEST);
}
