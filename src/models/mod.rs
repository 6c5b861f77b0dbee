pub mod catalogo;
pub mod cliente;
pub mod cuenta_bancaria;
pub mod equipo;
pub mod inventario;
pub mod permiso;
pub mod plantilla;
pub mod proveedor;
pub mod refaccion;
pub mod usuario;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError};

use crate::error::ApiError;

/// Filtro `?activo=` común a todos los listados.
#[derive(Debug, Default, Deserialize)]
pub struct FiltroActivo {
    pub activo: Option<bool>,
}

/// Respuesta de `baja` / `activar`.
#[derive(Debug, Serialize)]
pub struct EstadoRespuesta {
    pub id: Uuid,
    pub activo: bool,
}

pub fn validar<T: Validate>(datos: &T) -> Result<(), ApiError> {
    datos.validate().map_err(ApiError::from)
}

/// Recorta espacios; las cadenas vacías se tratan como ausentes.
pub fn opcional(valor: &Option<String>) -> Option<String> {
    valor
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Texto libre para `ILIKE`: `%` y `_` del usuario se buscan literalmente.
pub fn patron_busqueda(valor: &Option<String>) -> Option<String> {
    opcional(valor).map(|texto| {
        let escapado = texto
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escapado)
    })
}

/// Campo opcional en una actualización: ausente conserva, vacío borra.
pub fn fusionar(nuevo: &Option<String>, existente: Option<String>) -> Option<String> {
    match nuevo {
        Some(_) => opcional(nuevo),
        None => existente,
    }
}

/// Para `#[serde(deserialize_with)]`: ausente queda `None`, `null` llega como `Some(None)`.
pub fn anulable<'de, D, T>(deserializador: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializador).map(Some)
}

/// Referencia opcional en una actualización: ausente conserva, `null` la quita.
pub fn referencia(nueva: Option<Option<Uuid>>, existente: Option<Uuid>) -> Option<Uuid> {
    nueva.unwrap_or(existente)
}

/// Campo obligatorio en una actualización: ausente conserva el valor guardado.
pub fn requerido(nuevo: &Option<String>, existente: &str) -> String {
    nuevo.as_deref().map(str::trim).unwrap_or(existente).to_string()
}

pub(crate) fn no_vacio(valor: &str) -> Result<(), ValidationError> {
    if valor.trim().is_empty() {
        return Err(ValidationError::new("vacio"));
    }
    Ok(())
}

/// Decimales que admiten las columnas `NUMERIC` de importes y de cantidades.
pub const DECIMALES_IMPORTE: u32 = 2;
pub const DECIMALES_CANTIDAD: u32 = 3;

pub(crate) fn no_negativo(valor: &Decimal) -> Result<(), ValidationError> {
    if *valor < Decimal::ZERO {
        return Err(ValidationError::new("negativo"));
    }
    Ok(())
}

pub(crate) fn positivo(valor: &Decimal) -> Result<(), ValidationError> {
    if *valor <= Decimal::ZERO {
        return Err(ValidationError::new("no_positivo"));
    }
    Ok(())
}

fn escala(valor: &Decimal, decimales: u32) -> Result<(), ValidationError> {
    if valor.normalize().scale() > decimales {
        return Err(ValidationError::new("decimales"));
    }
    Ok(())
}

pub(crate) fn importe_no_negativo(valor: &Decimal) -> Result<(), ValidationError> {
    no_negativo(valor)?;
    escala(valor, DECIMALES_IMPORTE)
}

pub(crate) fn importe_positivo(valor: &Decimal) -> Result<(), ValidationError> {
    positivo(valor)?;
    escala(valor, DECIMALES_IMPORTE)
}

pub(crate) fn cantidad_no_negativa(valor: &Decimal) -> Result<(), ValidationError> {
    no_negativo(valor)?;
    escala(valor, DECIMALES_CANTIDAD)
}

pub(crate) fn cantidad_positiva(valor: &Decimal) -> Result<(), ValidationError> {
    positivo(valor)?;
    escala(valor, DECIMALES_CANTIDAD)
}

pub(crate) fn codigo_postal_valido(valor: &str) -> Result<(), ValidationError> {
    if valor.len() != 5 || !valor.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("codigo_postal"));
    }
    Ok(())
}

pub(crate) fn rfc_valido(valor: &str) -> Result<(), ValidationError> {
    let valor = valor.trim();
    let largo = valor.chars().count();
    let caracteres_validos = valor
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '&' || c == 'Ñ');
    if !(12..=13).contains(&largo) || !caracteres_validos {
        return Err(ValidationError::new("rfc"));
    }
    Ok(())
}

/// RFC en un campo opcional: en blanco equivale a ausente (borra al actualizar).
pub(crate) fn rfc_opcional(valor: &str) -> Result<(), ValidationError> {
    if valor.trim().is_empty() {
        return Ok(());
    }
    rfc_valido(valor)
}

/// Email en un campo opcional: en blanco equivale a ausente (borra al actualizar).
pub(crate) fn email_opcional(valor: &str) -> Result<(), ValidationError> {
    let valor = valor.trim();
    if valor.is_empty() || valor.validate_email() {
        return Ok(());
    }
    Err(ValidationError::new("email"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcional_descarta_vacios() {
        assert_eq!(opcional(&Some("  ".into())), None);
        assert_eq!(opcional(&Some(" abc ".into())), Some("abc".into()));
        assert_eq!(opcional(&None), None);
    }

    #[test]
    fn busqueda_escapa_comodines() {
        assert_eq!(patron_busqueda(&Some(" filtro ".into())), Some("%filtro%".into()));
        assert_eq!(patron_busqueda(&Some("50%_a".into())), Some(r"%50\%\_a%".into()));
        assert_eq!(patron_busqueda(&Some(r"c:\x".into())), Some(r"%c:\\x%".into()));
        assert_eq!(patron_busqueda(&Some("   ".into())), None);
    }

    #[test]
    fn fusion_de_campos() {
        assert_eq!(fusionar(&None, Some("x".into())), Some("x".into()));
        assert_eq!(fusionar(&Some("".into()), Some("x".into())), None);
        assert_eq!(fusionar(&Some(" y ".into()), None), Some("y".into()));
        assert_eq!(requerido(&None, "actual"), "actual");
        assert_eq!(requerido(&Some(" nuevo ".into()), "actual"), "nuevo");
    }

    #[derive(Debug, Deserialize)]
    struct ConReferencia {
        #[serde(default, deserialize_with = "anulable")]
        proveedor_id: Option<Option<Uuid>>,
    }

    #[test]
    fn referencia_ausente_nula_o_nueva() {
        let actual = Some(Uuid::new_v4());
        let nueva = Uuid::new_v4();

        let ausente: ConReferencia = serde_json::from_str("{}").unwrap();
        assert_eq!(referencia(ausente.proveedor_id, actual), actual);

        let nula: ConReferencia = serde_json::from_str(r#"{"proveedor_id": null}"#).unwrap();
        assert_eq!(referencia(nula.proveedor_id, actual), None);

        let json = format!(r#"{{"proveedor_id": "{}"}}"#, nueva);
        let cambio: ConReferencia = serde_json::from_str(&json).unwrap();
        assert_eq!(referencia(cambio.proveedor_id, actual), Some(nueva));
    }

    #[test]
    fn reglas_numericas() {
        assert!(no_negativo(&Decimal::ZERO).is_ok());
        assert!(no_negativo(&Decimal::new(-1, 2)).is_err());
        assert!(positivo(&Decimal::ZERO).is_err());
        assert!(positivo(&Decimal::new(5, 1)).is_ok());
    }

    #[test]
    fn decimales_acotados_a_la_columna() {
        assert!(importe_no_negativo(&Decimal::new(10005, 3)).is_err());
        assert!(importe_no_negativo(&Decimal::new(10500, 3)).is_ok());
        assert!(importe_positivo(&Decimal::new(1, 2)).is_ok());
        assert!(importe_positivo(&Decimal::new(1, 3)).is_err());
        assert!(cantidad_positiva(&Decimal::new(12345, 4)).is_err());
        assert!(cantidad_positiva(&Decimal::new(1234, 3)).is_ok());
        assert!(cantidad_no_negativa(&Decimal::ZERO).is_ok());
    }

    #[test]
    fn reglas_de_formato() {
        assert!(codigo_postal_valido("06600").is_ok());
        assert!(codigo_postal_valido("6600").is_err());
        assert!(codigo_postal_valido("0660A").is_err());
        assert!(rfc_valido("XAXX010101000").is_ok());
        assert!(rfc_valido("ABC010101AB1").is_ok());
        assert!(rfc_valido("CORTO").is_err());
        assert!(rfc_valido("XAXX-10101000").is_err());
    }

    #[test]
    fn opcionales_en_blanco_son_validos() {
        assert!(email_opcional("").is_ok());
        assert!(email_opcional("  ").is_ok());
        assert!(email_opcional("ventas@proveedor.mx").is_ok());
        assert!(email_opcional("no-es-correo").is_err());
        assert!(rfc_opcional("").is_ok());
        assert!(rfc_opcional("123").is_err());
        assert!(rfc_valido("").is_err());
    }
}
