use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::no_vacio;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Modulo {
    pub id: Uuid,
    pub clave: String,
    pub nombre: String,
    pub icono: Option<String>,
    pub orden: i32,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submodulo {
    pub id: Uuid,
    pub modulo_id: Uuid,
    pub clave: String,
    pub nombre: String,
    pub ruta: String,
    pub orden: i32,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodoSubmodulo {
    pub id: Uuid,
    pub clave: String,
    pub nombre: String,
    pub ruta: String,
    pub asignado: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodoModulo {
    pub id: Uuid,
    pub clave: String,
    pub nombre: String,
    pub icono: Option<String>,
    pub asignado: bool,
    pub submodulos: Vec<NodoSubmodulo>,
}

/// Une el catálogo de módulos y submódulos con el conjunto concedido.
///
/// `concedidos = None` marca todo como asignado (administradores).
pub fn construir_arbol(
    modulos: &[Modulo],
    submodulos: &[Submodulo],
    concedidos: Option<&HashSet<Uuid>>,
) -> Vec<NodoModulo> {
    let mut modulos: Vec<&Modulo> = modulos.iter().collect();
    modulos.sort_by(|a, b| a.orden.cmp(&b.orden).then_with(|| a.nombre.cmp(&b.nombre)));

    modulos
        .into_iter()
        .map(|modulo| {
            let mut hijos: Vec<&Submodulo> = submodulos
                .iter()
                .filter(|s| s.modulo_id == modulo.id)
                .collect();
            hijos.sort_by(|a, b| a.orden.cmp(&b.orden).then_with(|| a.nombre.cmp(&b.nombre)));

            let submodulos: Vec<NodoSubmodulo> = hijos
                .into_iter()
                .map(|s| NodoSubmodulo {
                    id: s.id,
                    clave: s.clave.clone(),
                    nombre: s.nombre.clone(),
                    ruta: s.ruta.clone(),
                    asignado: concedidos.map_or(true, |c| c.contains(&s.id)),
                })
                .collect();

            NodoModulo {
                id: modulo.id,
                clave: modulo.clave.clone(),
                nombre: modulo.nombre.clone(),
                icono: modulo.icono.clone(),
                asignado: submodulos.iter().any(|s| s.asignado),
                submodulos,
            }
        })
        .collect()
}

/// Deja solo las ramas asignadas, para la navegación del usuario.
pub fn podar_arbol(arbol: Vec<NodoModulo>) -> Vec<NodoModulo> {
    arbol
        .into_iter()
        .filter(|m| m.asignado)
        .map(|mut m| {
            m.submodulos.retain(|s| s.asignado);
            m
        })
        .collect()
}

#[derive(Debug, Deserialize, Validate)]
pub struct AsignarPermisos {
    pub submodulos: Vec<Uuid>,
}

impl AsignarPermisos {
    /// Ids sin repetir, en el orden recibido.
    pub fn sin_duplicados(&self) -> Vec<Uuid> {
        let mut vistos = HashSet::new();
        self.submodulos
            .iter()
            .copied()
            .filter(|id| vistos.insert(*id))
            .collect()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevoModulo {
    #[validate(length(min = 1, max = 60), custom(function = "no_vacio"))]
    pub clave: String,
    #[validate(length(min = 1, max = 120), custom(function = "no_vacio"))]
    pub nombre: String,
    #[validate(length(max = 60))]
    pub icono: Option<String>,
    pub orden: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NuevoSubmodulo {
    #[validate(length(min = 1, max = 60), custom(function = "no_vacio"))]
    pub clave: String,
    #[validate(length(min = 1, max = 120), custom(function = "no_vacio"))]
    pub nombre: String,
    #[validate(length(min = 1, max = 160), custom(function = "no_vacio"))]
    pub ruta: String,
    pub orden: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modulo(clave: &str, orden: i32) -> Modulo {
        Modulo {
            id: Uuid::new_v4(),
            clave: clave.into(),
            nombre: clave.to_uppercase(),
            icono: None,
            orden,
            activo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn submodulo(modulo: &Modulo, clave: &str, orden: i32) -> Submodulo {
        Submodulo {
            id: Uuid::new_v4(),
            modulo_id: modulo.id,
            clave: clave.into(),
            nombre: clave.into(),
            ruta: format!("/{}", clave),
            orden,
            activo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn marca_asignados_y_ordena() {
        let catalogos = modulo("catalogos", 2);
        let clientes = modulo("clientes", 1);
        let bancos = submodulo(&catalogos, "bancos", 2);
        let unidades = submodulo(&catalogos, "unidades", 1);
        let lista = submodulo(&clientes, "clientes", 1);

        let concedidos: HashSet<Uuid> = [bancos.id].into_iter().collect();
        let arbol = construir_arbol(
            &[catalogos.clone(), clientes.clone()],
            &[bancos.clone(), unidades.clone(), lista.clone()],
            Some(&concedidos),
        );

        assert_eq!(arbol.len(), 2);
        assert_eq!(arbol[0].clave, "clientes");
        assert!(!arbol[0].asignado);
        assert_eq!(arbol[1].clave, "catalogos");
        assert!(arbol[1].asignado);
        assert_eq!(arbol[1].submodulos[0].clave, "unidades");
        assert!(!arbol[1].submodulos[0].asignado);
        assert!(arbol[1].submodulos[1].asignado);
    }

    #[test]
    fn sin_conjunto_todo_asignado() {
        let m = modulo("equipos", 1);
        let s = submodulo(&m, "plantillas", 1);
        let arbol = construir_arbol(&[m], &[s], None);
        assert!(arbol[0].asignado);
        assert!(arbol[0].submodulos[0].asignado);
    }

    #[test]
    fn descarta_submodulos_huerfanos() {
        let m = modulo("finanzas", 1);
        let otro = modulo("inactivo", 2);
        let huerfano = submodulo(&otro, "huerfano", 1);
        let arbol = construir_arbol(&[m], &[huerfano], Some(&HashSet::new()));
        assert_eq!(arbol.len(), 1);
        assert!(arbol[0].submodulos.is_empty());
    }

    #[test]
    fn poda_ramas_no_asignadas() {
        let a = modulo("a", 1);
        let b = modulo("b", 2);
        let a1 = submodulo(&a, "a1", 1);
        let a2 = submodulo(&a, "a2", 2);
        let b1 = submodulo(&b, "b1", 1);
        let concedidos: HashSet<Uuid> = [a2.id].into_iter().collect();

        let arbol = podar_arbol(construir_arbol(&[a, b], &[a1, a2, b1], Some(&concedidos)));
        assert_eq!(arbol.len(), 1);
        assert_eq!(arbol[0].submodulos.len(), 1);
        assert_eq!(arbol[0].submodulos[0].clave, "a2");
    }

    #[test]
    fn elimina_ids_repetidos() {
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();
        let datos = AsignarPermisos {
            submodulos: vec![x, y, x],
        };
        assert_eq!(datos.sin_duplicados(), vec![x, y]);
    }
}
