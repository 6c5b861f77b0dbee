use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::no_vacio;

/// Catálogos simples de referencia; todos comparten la misma forma de tabla.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalogo {
    Bancos,
    FormasPago,
    Puestos,
    Unidades,
}

impl Catalogo {
    pub const TODOS: [Catalogo; 4] = [
        Catalogo::Bancos,
        Catalogo::FormasPago,
        Catalogo::Puestos,
        Catalogo::Unidades,
    ];

    pub fn tabla(self) -> &'static str {
        match self {
            Catalogo::Bancos => "bancos",
            Catalogo::FormasPago => "formas_pago",
            Catalogo::Puestos => "puestos",
            Catalogo::Unidades => "unidades",
        }
    }

    pub fn ruta(self) -> &'static str {
        match self {
            Catalogo::Bancos => "/bancos",
            Catalogo::FormasPago => "/formas-pago",
            Catalogo::Puestos => "/puestos",
            Catalogo::Unidades => "/unidades",
        }
    }

    pub fn etiqueta(self) -> &'static str {
        match self {
            Catalogo::Bancos => "Banco",
            Catalogo::FormasPago => "Forma de pago",
            Catalogo::Puestos => "Puesto",
            Catalogo::Unidades => "Unidad",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ElementoCatalogo {
    pub id: Uuid,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevoElementoCatalogo {
    #[validate(length(min = 1, max = 120), custom(function = "no_vacio"))]
    pub nombre: String,
    #[validate(length(max = 500))]
    pub descripcion: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActualizarElementoCatalogo {
    #[validate(length(min = 1, max = 120), custom(function = "no_vacio"))]
    pub nombre: Option<String>,
    #[validate(length(max = 500))]
    pub descripcion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn nombre_en_blanco_es_invalido() {
        let datos = NuevoElementoCatalogo {
            nombre: "   ".into(),
            descripcion: None,
        };
        let errores = datos.validate().unwrap_err();
        assert!(errores.field_errors().contains_key("nombre"));
    }

    #[test]
    fn actualizacion_vacia_es_valida() {
        let datos = ActualizarElementoCatalogo {
            nombre: None,
            descripcion: None,
        };
        assert!(datos.validate().is_ok());
    }

    #[test]
    fn rutas_unicas() {
        let mut rutas: Vec<_> = Catalogo::TODOS.iter().map(|c| c.ruta()).collect();
        rutas.dedup();
        assert_eq!(rutas.len(), 4);
    }
}
