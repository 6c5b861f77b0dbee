use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{cantidad_no_negativa, importe_no_negativo, positivo};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoMovimiento {
    Entrada,
    Salida,
    Ajuste,
}

impl TipoMovimiento {
    pub fn como_str(self) -> &'static str {
        match self {
            TipoMovimiento::Entrada => "ENTRADA",
            TipoMovimiento::Salida => "SALIDA",
            TipoMovimiento::Ajuste => "AJUSTE",
        }
    }

    /// Calcula la nueva existencia y la cantidad con signo que se registra.
    ///
    /// En un `AJUSTE` la cantidad recibida es la existencia contada.
    pub fn aplicar(
        self,
        actual: Decimal,
        cantidad: Decimal,
    ) -> Result<(Decimal, Decimal), ApiError> {
        match self {
            TipoMovimiento::Entrada => Ok((actual + cantidad, cantidad)),
            TipoMovimiento::Salida => {
                if cantidad > actual {
                    return Err(ApiError::SolicitudInvalida(format!(
                        "Existencia insuficiente: disponible {}, solicitado {}",
                        actual, cantidad
                    )));
                }
                Ok((actual - cantidad, -cantidad))
            }
            TipoMovimiento::Ajuste => Ok((cantidad, cantidad - actual)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Existencia {
    pub refaccion_id: Uuid,
    pub clave: String,
    pub nombre: String,
    pub unidad: String,
    pub existencia: Decimal,
    pub stock_minimo: Decimal,
    pub costo: Decimal,
    pub valor: Decimal,
    pub bajo_minimo: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltroExistencias {
    pub bajo_minimo: Option<bool>,
    pub busqueda: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MovimientoInventario {
    pub id: Uuid,
    pub refaccion_id: Uuid,
    pub clave: String,
    pub refaccion: String,
    pub tipo: String,
    pub cantidad: Decimal,
    pub existencia_anterior: Decimal,
    pub existencia_nueva: Decimal,
    pub costo_unitario: Option<Decimal>,
    pub referencia: Option<String>,
    pub usuario_id: Option<Uuid>,
    pub usuario: Option<String>,
    pub fecha: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltroKardex {
    pub refaccion_id: Option<Uuid>,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    pub tipo: Option<TipoMovimiento>,
}

impl FiltroKardex {
    pub fn validar_rango(&self) -> Result<(), ApiError> {
        if let (Some(inicio), Some(fin)) = (self.fecha_inicio, self.fecha_fin) {
            if inicio > fin {
                return Err(ApiError::SolicitudInvalida(
                    "La fecha de inicio no puede ser posterior a la fecha fin".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevoMovimientoInventario {
    pub refaccion_id: Uuid,
    pub tipo: TipoMovimiento,
    #[validate(custom(function = "cantidad_no_negativa"))]
    pub cantidad: Decimal,
    #[validate(custom(function = "importe_no_negativo"))]
    pub costo_unitario: Option<Decimal>,
    #[validate(length(max = 200))]
    pub referencia: Option<String>,
}

impl NuevoMovimientoInventario {
    /// Entradas y salidas requieren cantidad mayor a cero; un ajuste puede llevar a cero.
    pub fn validar_cantidad(&self) -> Result<(), ApiError> {
        if self.tipo != TipoMovimiento::Ajuste && positivo(&self.cantidad).is_err() {
            return Err(ApiError::SolicitudInvalida("La cantidad debe ser mayor a cero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn entrada_suma() {
        assert_eq!(TipoMovimiento::Entrada.aplicar(d(5), d(3)).unwrap(), (d(8), d(3)));
    }

    #[test]
    fn salida_resta_y_registra_negativo() {
        assert_eq!(TipoMovimiento::Salida.aplicar(d(5), d(5)).unwrap(), (d(0), d(-5)));
    }

    #[test]
    fn salida_sin_existencia_falla() {
        assert!(matches!(
            TipoMovimiento::Salida.aplicar(d(2), d(3)),
            Err(ApiError::SolicitudInvalida(_))
        ));
    }

    #[test]
    fn ajuste_fija_existencia() {
        assert_eq!(TipoMovimiento::Ajuste.aplicar(d(10), d(7)).unwrap(), (d(7), d(-3)));
        assert_eq!(TipoMovimiento::Ajuste.aplicar(d(0), d(4)).unwrap(), (d(4), d(4)));
    }

    #[test]
    fn rango_de_fechas_invertido() {
        let filtro = FiltroKardex {
            fecha_inicio: NaiveDate::from_ymd_opt(2024, 5, 2),
            fecha_fin: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Default::default()
        };
        assert!(filtro.validar_rango().is_err());

        let mismo_dia = FiltroKardex {
            fecha_inicio: NaiveDate::from_ymd_opt(2024, 5, 1),
            fecha_fin: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Default::default()
        };
        assert!(mismo_dia.validar_rango().is_ok());
    }

    #[test]
    fn cantidad_cero_solo_en_ajuste() {
        let mut mov = NuevoMovimientoInventario {
            refaccion_id: Uuid::new_v4(),
            tipo: TipoMovimiento::Entrada,
            cantidad: Decimal::ZERO,
            costo_unitario: None,
            referencia: None,
        };
        assert!(mov.validar_cantidad().is_err());
        mov.tipo = TipoMovimiento::Ajuste;
        assert!(mov.validar_cantidad().is_ok());
    }
}
