use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{importe_no_negativo, importe_positivo, no_vacio};

pub const MONEDAS: [&str; 2] = ["MXN", "USD"];

pub const MOVIMIENTO_SALDO_INICIAL: &str = "SALDO_INICIAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoMovimientoCuenta {
    Deposito,
    Retiro,
}

impl TipoMovimientoCuenta {
    pub fn como_str(self) -> &'static str {
        match self {
            TipoMovimientoCuenta::Deposito => "DEPOSITO",
            TipoMovimientoCuenta::Retiro => "RETIRO",
        }
    }

    /// Monto con signo que afecta al saldo.
    pub fn efecto(self, monto: Decimal) -> Decimal {
        match self {
            TipoMovimientoCuenta::Deposito => monto,
            TipoMovimientoCuenta::Retiro => -monto,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CuentaBancaria {
    pub id: Uuid,
    pub banco_id: Uuid,
    pub banco: String,
    pub nombre: String,
    pub numero_cuenta: String,
    pub clabe: Option<String>,
    pub moneda: String,
    pub saldo_inicial: Decimal,
    pub fecha_saldo_inicial: NaiveDate,
    pub saldo_actual: Decimal,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltroCuentas {
    pub activo: Option<bool>,
    pub banco_id: Option<Uuid>,
}

/// En blanco equivale a sin CLABE.
fn clabe_valida(valor: &str) -> Result<(), ValidationError> {
    let valor = valor.trim();
    if valor.is_empty() {
        return Ok(());
    }
    if valor.len() != 18 || !valor.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("clabe"));
    }
    Ok(())
}

fn moneda_valida(valor: &str) -> Result<(), ValidationError> {
    if !MONEDAS.contains(&valor) {
        return Err(ValidationError::new("moneda"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevaCuentaBancaria {
    pub banco_id: Uuid,
    #[validate(length(min = 1, max = 120), custom(function = "no_vacio"))]
    pub nombre: String,
    #[validate(length(min = 4, max = 30), custom(function = "no_vacio"))]
    pub numero_cuenta: String,
    #[validate(custom(function = "clabe_valida"))]
    pub clabe: Option<String>,
    #[validate(custom(function = "moneda_valida"))]
    pub moneda: Option<String>,
    #[validate(custom(function = "importe_no_negativo"))]
    pub saldo_inicial: Decimal,
    pub fecha_saldo_inicial: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActualizarCuentaBancaria {
    pub banco_id: Option<Uuid>,
    #[validate(length(min = 1, max = 120), custom(function = "no_vacio"))]
    pub nombre: Option<String>,
    #[validate(length(min = 4, max = 30), custom(function = "no_vacio"))]
    pub numero_cuenta: Option<String>,
    #[validate(custom(function = "clabe_valida"))]
    pub clabe: Option<String>,
    #[validate(custom(function = "moneda_valida"))]
    pub moneda: Option<String>,
    #[validate(custom(function = "importe_no_negativo"))]
    pub saldo_inicial: Option<Decimal>,
    pub fecha_saldo_inicial: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MovimientoCuenta {
    pub id: Uuid,
    pub cuenta_id: Uuid,
    pub tipo: String,
    pub monto: Decimal,
    pub saldo_resultante: Decimal,
    pub concepto: String,
    pub forma_pago_id: Option<Uuid>,
    pub fecha: NaiveDate,
    pub usuario_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevoMovimientoCuenta {
    pub tipo: TipoMovimientoCuenta,
    #[validate(custom(function = "importe_positivo"))]
    pub monto: Decimal,
    #[validate(length(min = 1, max = 200), custom(function = "no_vacio"))]
    pub concepto: String,
    pub forma_pago_id: Option<Uuid>,
    pub fecha: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efecto_del_movimiento() {
        let monto = Decimal::new(15050, 2);
        assert_eq!(TipoMovimientoCuenta::Deposito.efecto(monto), monto);
        assert_eq!(TipoMovimientoCuenta::Retiro.efecto(monto), -monto);
    }

    #[test]
    fn tipo_desde_json() {
        let tipo: TipoMovimientoCuenta = serde_json::from_str("\"RETIRO\"").unwrap();
        assert_eq!(tipo, TipoMovimientoCuenta::Retiro);
        assert!(serde_json::from_str::<TipoMovimientoCuenta>("\"SALDO_INICIAL\"").is_err());
    }

    #[test]
    fn clabe_y_moneda() {
        let datos = NuevaCuentaBancaria {
            banco_id: Uuid::new_v4(),
            nombre: "Operación".into(),
            numero_cuenta: "0123456789".into(),
            clabe: Some("01234".into()),
            moneda: Some("EUR".into()),
            saldo_inicial: Decimal::ZERO,
            fecha_saldo_inicial: None,
        };
        let errores = datos.validate().unwrap_err();
        let campos = errores.field_errors();
        assert!(campos.contains_key("clabe"));
        assert!(campos.contains_key("moneda"));
    }

    #[test]
    fn clabe_en_blanco_se_puede_borrar() {
        let datos = ActualizarCuentaBancaria {
            banco_id: None,
            nombre: None,
            numero_cuenta: None,
            clabe: Some(String::new()),
            moneda: None,
            saldo_inicial: None,
            fecha_saldo_inicial: None,
        };
        assert!(datos.validate().is_ok());
        assert_eq!(crate::models::fusionar(&datos.clabe, Some("012345678901234567".into())), None);
    }
}
