use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{exigir_activo, hay_duplicado, hay_duplicado_en};
use crate::error::ApiError;
use crate::models::cuenta_bancaria::{
    ActualizarCuentaBancaria, CuentaBancaria, FiltroCuentas, MovimientoCuenta, NuevaCuentaBancaria,
    NuevoMovimientoCuenta, MOVIMIENTO_SALDO_INICIAL,
};
use crate::models::{fusionar, opcional, requerido};

const SELECT: &str = "SELECT c.id, c.banco_id, b.nombre AS banco, c.nombre, c.numero_cuenta, c.clabe, \
     c.moneda, c.saldo_inicial, c.fecha_saldo_inicial, c.saldo_actual, c.activo, c.created_at, c.updated_at \
     FROM cuentas_bancarias c \
     JOIN bancos b ON b.id = c.banco_id";

const SQL_NUMERO_DUPLICADO: &str = "SELECT EXISTS(SELECT 1 FROM cuentas_bancarias \
     WHERE numero_cuenta = $1 AND ($2::uuid IS NULL OR id <> $2) AND banco_id = $3)";

const SQL_CLABE_DUPLICADA: &str = "SELECT EXISTS(SELECT 1 FROM cuentas_bancarias \
     WHERE clabe = $1 AND ($2::uuid IS NULL OR id <> $2))";

const COLUMNAS_MOVIMIENTO: &str =
    "id, cuenta_id, tipo, monto, saldo_resultante, concepto, forma_pago_id, fecha, usuario_id, created_at";

pub async fn listar(
    pool: &PgPool,
    filtro: &FiltroCuentas,
) -> Result<Vec<CuentaBancaria>, ApiError> {
    let sql = format!(
        "{} WHERE ($1::boolean IS NULL OR c.activo = $1) \
         AND ($2::uuid IS NULL OR c.banco_id = $2) \
         ORDER BY b.nombre, c.nombre",
        SELECT
    );
    Ok(sqlx::query_as::<_, CuentaBancaria>(&sql)
        .bind(filtro.activo)
        .bind(filtro.banco_id)
        .fetch_all(pool)
        .await?)
}

pub async fn obtener(pool: &PgPool, id: Uuid) -> Result<CuentaBancaria, ApiError> {
    let sql = format!("{} WHERE c.id = $1", SELECT);
    sqlx::query_as::<_, CuentaBancaria>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::no_encontrado("Cuenta bancaria"))
}

async fn verificar_unicidad(
    pool: &PgPool,
    banco_id: Uuid,
    numero_cuenta: &str,
    clabe: Option<&str>,
    excluir: Option<Uuid>,
) -> Result<(), ApiError> {
    if hay_duplicado_en(pool, SQL_NUMERO_DUPLICADO, numero_cuenta, excluir, banco_id).await? {
        return Err(ApiError::Conflicto(format!(
            "Ya existe la cuenta '{}' en ese banco",
            numero_cuenta
        )));
    }
    if let Some(clabe) = clabe {
        if hay_duplicado(pool, SQL_CLABE_DUPLICADA, clabe, excluir).await? {
            return Err(ApiError::Conflicto(format!("La CLABE '{}' ya está registrada", clabe)));
        }
    }
    Ok(())
}

pub async fn crear(
    pool: &PgPool,
    datos: NuevaCuentaBancaria,
    usuario_id: Uuid,
) -> Result<CuentaBancaria, ApiError> {
    exigir_activo(pool, "bancos", datos.banco_id, "Banco").await?;

    let numero_cuenta = datos.numero_cuenta.trim().to_string();
    let clabe = opcional(&datos.clabe);
    verificar_unicidad(pool, datos.banco_id, &numero_cuenta, clabe.as_deref(), None).await?;

    let fecha = datos.fecha_saldo_inicial.unwrap_or_else(|| Utc::now().date_naive());
    let moneda = opcional(&datos.moneda).unwrap_or_else(|| "MXN".to_string());

    let mut tx = pool.begin().await?;

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO cuentas_bancarias \
         (banco_id, nombre, numero_cuenta, clabe, moneda, saldo_inicial, fecha_saldo_inicial, saldo_actual) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $6) RETURNING id",
    )
    .bind(datos.banco_id)
    .bind(datos.nombre.trim())
    .bind(&numero_cuenta)
    .bind(&clabe)
    .bind(&moneda)
    .bind(datos.saldo_inicial)
    .bind(fecha)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO movimientos_cuenta \
         (cuenta_id, tipo, monto, saldo_resultante, concepto, fecha, usuario_id) \
         VALUES ($1, $2, $3, $3, 'Saldo inicial', $4, $5)",
    )
    .bind(id)
    .bind(MOVIMIENTO_SALDO_INICIAL)
    .bind(datos.saldo_inicial)
    .bind(fecha)
    .bind(usuario_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(%id, saldo_inicial = %datos.saldo_inicial, "cuenta bancaria creada");
    obtener(pool, id).await
}

pub async fn actualizar(
    pool: &PgPool,
    id: Uuid,
    datos: ActualizarCuentaBancaria,
) -> Result<CuentaBancaria, ApiError> {
    let existente = obtener(pool, id).await?;

    let banco_id = datos.banco_id.unwrap_or(existente.banco_id);
    if banco_id != existente.banco_id {
        exigir_activo(pool, "bancos", banco_id, "Banco").await?;
    }

    let numero_cuenta = requerido(&datos.numero_cuenta, &existente.numero_cuenta);
    let clabe = fusionar(&datos.clabe, existente.clabe);
    verificar_unicidad(pool, banco_id, &numero_cuenta, clabe.as_deref(), Some(id)).await?;

    let mut tx = pool.begin().await?;

    // El saldo se relee bajo bloqueo; pudo cambiar por un movimiento concurrente.
    let (saldo_inicial, saldo_actual): (Decimal, Decimal) = sqlx::query_as(
        "SELECT saldo_inicial, saldo_actual FROM cuentas_bancarias WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    let nuevo_inicial = datos.saldo_inicial.unwrap_or(saldo_inicial);
    let delta = nuevo_inicial - saldo_inicial;
    let fecha = datos.fecha_saldo_inicial.unwrap_or(existente.fecha_saldo_inicial);

    if !delta.is_zero() {
        let minimo: Option<Decimal> =
            sqlx::query_scalar("SELECT MIN(saldo_resultante) FROM movimientos_cuenta WHERE cuenta_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        let minimo = minimo.unwrap_or(saldo_actual).min(saldo_actual);
        if minimo + delta < Decimal::ZERO {
            return Err(ApiError::SolicitudInvalida(
                "El nuevo saldo inicial dejaría la cuenta con saldo negativo".into(),
            ));
        }

        sqlx::query(
            "UPDATE movimientos_cuenta SET saldo_resultante = saldo_resultante + $1 WHERE cuenta_id = $2",
        )
        .bind(delta)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE movimientos_cuenta SET monto = $1, fecha = $2 WHERE cuenta_id = $3 AND tipo = $4")
        .bind(nuevo_inicial)
        .bind(fecha)
        .bind(id)
        .bind(MOVIMIENTO_SALDO_INICIAL)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE cuentas_bancarias SET banco_id = $1, nombre = $2, numero_cuenta = $3, clabe = $4, \
         moneda = $5, saldo_inicial = $6, fecha_saldo_inicial = $7, saldo_actual = saldo_actual + $8, \
         updated_at = NOW() WHERE id = $9",
    )
    .bind(banco_id)
    .bind(requerido(&datos.nombre, &existente.nombre))
    .bind(&numero_cuenta)
    .bind(&clabe)
    .bind(requerido(&datos.moneda, &existente.moneda))
    .bind(nuevo_inicial)
    .bind(fecha)
    .bind(delta)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    if !delta.is_zero() {
        tracing::info!(%id, %delta, "saldo inicial ajustado");
    }
    obtener(pool, id).await
}

pub async fn registrar_movimiento(
    pool: &PgPool,
    cuenta_id: Uuid,
    datos: NuevoMovimientoCuenta,
    usuario_id: Uuid,
) -> Result<MovimientoCuenta, ApiError> {
    if let Some(forma_pago_id) = datos.forma_pago_id {
        exigir_activo(pool, "formas_pago", forma_pago_id, "Forma de pago").await?;
    }

    let mut tx = pool.begin().await?;

    let cuenta: Option<(Decimal, bool)> =
        sqlx::query_as("SELECT saldo_actual, activo FROM cuentas_bancarias WHERE id = $1 FOR UPDATE")
            .bind(cuenta_id)
            .fetch_optional(&mut *tx)
            .await?;

    let saldo = match cuenta {
        None => return Err(ApiError::no_encontrado("Cuenta bancaria")),
        Some((_, false)) => {
            return Err(ApiError::SolicitudInvalida(
                "La cuenta bancaria está dada de baja".into(),
            ))
        }
        Some((saldo, true)) => saldo,
    };

    let nuevo_saldo = saldo + datos.tipo.efecto(datos.monto);
    if nuevo_saldo < Decimal::ZERO {
        return Err(ApiError::SolicitudInvalida(format!(
            "Saldo insuficiente: disponible {}, solicitado {}",
            saldo, datos.monto
        )));
    }

    let sql = format!(
        "INSERT INTO movimientos_cuenta \
         (cuenta_id, tipo, monto, saldo_resultante, concepto, forma_pago_id, fecha, usuario_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
        COLUMNAS_MOVIMIENTO
    );
    let movimiento = sqlx::query_as::<_, MovimientoCuenta>(&sql)
        .bind(cuenta_id)
        .bind(datos.tipo.como_str())
        .bind(datos.monto)
        .bind(nuevo_saldo)
        .bind(datos.concepto.trim())
        .bind(datos.forma_pago_id)
        .bind(datos.fecha.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(usuario_id)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query("UPDATE cuentas_bancarias SET saldo_actual = $1, updated_at = NOW() WHERE id = $2")
        .bind(nuevo_saldo)
        .bind(cuenta_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        %cuenta_id,
        tipo = datos.tipo.como_str(),
        monto = %datos.monto,
        saldo = %nuevo_saldo,
        "movimiento de cuenta registrado"
    );
    Ok(movimiento)
}

pub async fn listar_movimientos(
    pool: &PgPool,
    cuenta_id: Uuid,
) -> Result<Vec<MovimientoCuenta>, ApiError> {
    obtener(pool, cuenta_id).await?;

    // El orden de captura decide el saldo corrido, no la fecha contable.
    let sql = format!(
        "SELECT {} FROM movimientos_cuenta WHERE cuenta_id = $1 ORDER BY created_at, id",
        COLUMNAS_MOVIMIENTO
    );
    Ok(sqlx::query_as::<_, MovimientoCuenta>(&sql)
        .bind(cuenta_id)
        .fetch_all(pool)
        .await?)
}
