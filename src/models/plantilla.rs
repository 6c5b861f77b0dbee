use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{cantidad_positiva, importe_no_negativo, no_vacio};

/// Margen sobre el costo para el precio de venta (35 %).
pub const MARGEN_VENTA: Decimal = Decimal::from_parts(35, 0, 0, false, 2);
/// Renta mensual como fracción del costo (10 %).
pub const FACTOR_RENTA: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plantilla {
    pub id: Uuid,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub costo: Decimal,
    pub precio_venta: Decimal,
    pub precio_renta: Decimal,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DetallePlantilla {
    pub id: Uuid,
    pub plantilla_id: Uuid,
    pub refaccion_id: Uuid,
    pub clave: String,
    pub refaccion: String,
    pub cantidad: Decimal,
    pub costo_unitario: Decimal,
    pub importe: Decimal,
    pub activo: bool,
}

#[derive(Debug, Serialize)]
pub struct PlantillaConDetalles {
    #[serde(flatten)]
    pub plantilla: Plantilla,
    pub detalles: Vec<DetallePlantilla>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LineaPlantilla {
    pub id: Option<Uuid>,
    pub refaccion_id: Uuid,
    #[validate(custom(function = "cantidad_positiva"))]
    pub cantidad: Decimal,
    #[validate(custom(function = "importe_no_negativo"))]
    pub costo_unitario: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevaPlantilla {
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: String,
    pub descripcion: Option<String>,
    #[validate(length(min = 1), nested)]
    pub detalles: Vec<LineaPlantilla>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActualizarPlantilla {
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    #[validate(length(min = 1), nested)]
    pub detalles: Option<Vec<LineaPlantilla>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TotalesPlantilla {
    pub costo: Decimal,
    pub precio_venta: Decimal,
    pub precio_renta: Decimal,
}

fn redondear(valor: Decimal) -> Decimal {
    valor.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn importe(cantidad: Decimal, costo_unitario: Decimal) -> Decimal {
    redondear(cantidad * costo_unitario)
}

/// Suma los importes de las líneas activas y deriva los precios.
pub fn calcular_totales<I>(importes: I) -> TotalesPlantilla
where
    I: IntoIterator<Item = Decimal>,
{
    let costo = redondear(importes.into_iter().sum());
    TotalesPlantilla {
        costo,
        precio_venta: redondear(costo * (Decimal::ONE + MARGEN_VENTA)),
        precio_renta: redondear(costo * FACTOR_RENTA),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(valor: &str) -> Decimal {
        Decimal::from_str(valor).unwrap()
    }

    #[test]
    fn margenes() {
        assert_eq!(MARGEN_VENTA, d("0.35"));
        assert_eq!(FACTOR_RENTA, d("0.10"));
    }

    #[test]
    fn importe_redondea_a_centavos() {
        assert_eq!(importe(d("3"), d("10.005")), d("30.02"));
        assert_eq!(importe(d("1.5"), d("0.03")), d("0.05"));
    }

    #[test]
    fn totales_de_varias_lineas() {
        let totales = calcular_totales(vec![d("100.00"), d("250.50"), d("49.50")]);
        assert_eq!(totales.costo, d("400.00"));
        assert_eq!(totales.precio_venta, d("540.00"));
        assert_eq!(totales.precio_renta, d("40.00"));
    }

    #[test]
    fn plantilla_sin_lineas_cuesta_cero() {
        let totales = calcular_totales(Vec::new());
        assert_eq!(totales.costo, Decimal::ZERO);
        assert_eq!(totales.precio_venta, Decimal::ZERO);
        assert_eq!(totales.precio_renta, Decimal::ZERO);
    }

    #[test]
    fn plantilla_requiere_lineas_validas() {
        let vacia = NuevaPlantilla {
            nombre: "Compresor 5HP".into(),
            descripcion: None,
            detalles: vec![],
        };
        assert!(vacia.validate().is_err());

        let cantidad_cero = NuevaPlantilla {
            nombre: "Compresor 5HP".into(),
            descripcion: None,
            detalles: vec![LineaPlantilla {
                id: None,
                refaccion_id: Uuid::new_v4(),
                cantidad: Decimal::ZERO,
                costo_unitario: None,
            }],
        };
        assert!(cantidad_cero.validate().is_err());
    }

    #[test]
    fn costo_con_mas_de_dos_decimales_se_rechaza() {
        let linea = LineaPlantilla {
            id: None,
            refaccion_id: Uuid::new_v4(),
            cantidad: d("3"),
            costo_unitario: Some(d("10.005")),
        };
        let errores = linea.validate().unwrap_err();
        assert!(errores.field_errors().contains_key("costo_unitario"));

        let con_centavos = LineaPlantilla {
            costo_unitario: Some(d("10.01")),
            ..linea
        };
        assert!(con_centavos.validate().is_ok());
        assert_eq!(importe(con_centavos.cantidad, d("10.01")), d("30.03"));
    }

    #[test]
    fn cantidad_con_mas_de_tres_decimales_se_rechaza() {
        let linea = LineaPlantilla {
            id: None,
            refaccion_id: Uuid::new_v4(),
            cantidad: d("1.0005"),
            costo_unitario: None,
        };
        assert!(linea.validate().unwrap_err().field_errors().contains_key("cantidad"));
    }
}
