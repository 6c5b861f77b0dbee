use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{anulable, no_vacio};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Equipo {
    pub id: Uuid,
    pub numero_serie: String,
    pub nombre: String,
    pub plantilla_id: Option<Uuid>,
    pub plantilla: Option<String>,
    pub cliente_id: Option<Uuid>,
    pub cliente: Option<String>,
    pub sucursal_id: Option<Uuid>,
    pub sucursal: Option<String>,
    pub fecha_asignacion: Option<DateTime<Utc>>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Equipo {
    pub fn asignado(&self) -> bool {
        self.cliente_id.is_some()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FiltroEquipos {
    pub activo: Option<bool>,
    pub cliente_id: Option<Uuid>,
    pub disponible: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevoEquipo {
    #[validate(length(min = 1, max = 80), custom(function = "no_vacio"))]
    pub numero_serie: String,
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: String,
    pub plantilla_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActualizarEquipo {
    #[validate(length(min = 1, max = 80), custom(function = "no_vacio"))]
    pub numero_serie: Option<String>,
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "anulable")]
    pub plantilla_id: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AsignarEquipo {
    pub cliente_id: Uuid,
    pub sucursal_id: Option<Uuid>,
    #[validate(length(max = 500))]
    pub notas: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RetirarEquipo {
    #[validate(length(max = 500))]
    pub notas: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Asignacion {
    pub id: Uuid,
    pub equipo_id: Uuid,
    pub cliente_id: Uuid,
    pub cliente: String,
    pub sucursal_id: Option<Uuid>,
    pub sucursal: Option<String>,
    pub notas: Option<String>,
    pub notas_retiro: Option<String>,
    pub asignado_por: Option<Uuid>,
    pub fecha_asignacion: DateTime<Utc>,
    pub fecha_retiro: Option<DateTime<Utc>>,
}
