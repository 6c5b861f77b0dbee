use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{anulable, cantidad_no_negativa, importe_no_negativo, no_vacio};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Refaccion {
    pub id: Uuid,
    pub clave: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub unidad_id: Uuid,
    pub unidad: Option<String>,
    pub proveedor_id: Option<Uuid>,
    pub proveedor: Option<String>,
    pub costo: Decimal,
    pub existencia: Decimal,
    pub stock_minimo: Decimal,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltroRefacciones {
    pub activo: Option<bool>,
    pub busqueda: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevaRefaccion {
    #[validate(length(min = 1, max = 40), custom(function = "no_vacio"))]
    pub clave: String,
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: String,
    pub descripcion: Option<String>,
    pub unidad_id: Uuid,
    pub proveedor_id: Option<Uuid>,
    #[validate(custom(function = "importe_no_negativo"))]
    pub costo: Decimal,
    #[validate(custom(function = "cantidad_no_negativa"))]
    pub stock_minimo: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActualizarRefaccion {
    #[validate(length(min = 1, max = 40), custom(function = "no_vacio"))]
    pub clave: Option<String>,
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub unidad_id: Option<Uuid>,
    #[serde(default, deserialize_with = "anulable")]
    pub proveedor_id: Option<Option<Uuid>>,
    #[validate(custom(function = "importe_no_negativo"))]
    pub costo: Option<Decimal>,
    #[validate(custom(function = "cantidad_no_negativa"))]
    pub stock_minimo: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn costo_negativo_es_invalido() {
        let datos = NuevaRefaccion {
            clave: "FLT-01".into(),
            nombre: "Filtro de aceite".into(),
            descripcion: None,
            unidad_id: Uuid::new_v4(),
            proveedor_id: None,
            costo: Decimal::new(-100, 2),
            stock_minimo: None,
        };
        assert!(datos.validate().unwrap_err().field_errors().contains_key("costo"));
    }
}
