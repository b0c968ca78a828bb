//! Dashboard aggregation: pure functions over an already-fetched,
//! already-authorized ticket set. No database access here.

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::shared::db::models::SolicitudDetalle;
use crate::shared::workflow::{Criticidad, Estado, TipoSolicitud};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConteoBucket {
    pub clave: String,
    pub cantidad: usize,
    pub porcentaje: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResumenTecnico {
    pub nombre: String,
    pub total: usize,
    pub en_proceso: usize,
    pub finalizadas: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Estadisticas {
    pub total: usize,
    pub por_estado: Vec<ConteoBucket>,
    pub por_criticidad: Vec<ConteoBucket>,
    pub por_tipo: Vec<ConteoBucket>,
    pub por_tecnico: Vec<ResumenTecnico>,
    /// "<n>h" below a day, "<n.1>d" from a day up; None when no finalized
    /// ticket carries a completion timestamp.
    pub resolucion_promedio: Option<String>,
}

/// `round(cantidad / total * 100)`, with an empty set reported as 0%.
pub fn pct(cantidad: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((cantidad as f64 / total as f64) * 100.0).round() as u32
}

pub fn calcular(solicitudes: &[SolicitudDetalle]) -> Estadisticas {
    let total = solicitudes.len();

    let por_estado = Estado::TODOS
        .iter()
        .map(|e| {
            let cantidad = solicitudes.iter().filter(|s| s.estado == *e).count();
            ConteoBucket {
                clave: e.to_string(),
                cantidad,
                porcentaje: pct(cantidad, total),
            }
        })
        .collect();

    let por_criticidad = Criticidad::TODAS
        .iter()
        .map(|c| {
            let cantidad = solicitudes.iter().filter(|s| s.criticidad == *c).count();
            ConteoBucket {
                clave: c.to_string(),
                cantidad,
                porcentaje: pct(cantidad, total),
            }
        })
        .collect();

    let por_tipo = TipoSolicitud::TODOS
        .iter()
        .map(|t| {
            let cantidad = solicitudes
                .iter()
                .filter(|s| s.tipo_solicitud == *t)
                .count();
            ConteoBucket {
                clave: t.to_string(),
                cantidad,
                porcentaje: pct(cantidad, total),
            }
        })
        .collect();

    Estadisticas {
        total,
        por_estado,
        por_criticidad,
        por_tipo,
        por_tecnico: resumen_por_tecnico(solicitudes),
        resolucion_promedio: resolucion_promedio(solicitudes),
    }
}

fn resumen_por_tecnico(solicitudes: &[SolicitudDetalle]) -> Vec<ResumenTecnico> {
    let mut por_id: HashMap<Uuid, ResumenTecnico> = HashMap::new();

    for s in solicitudes {
        let Some(tecnico_id) = s.tecnico_asignado_id else {
            continue;
        };
        let entrada = por_id.entry(tecnico_id).or_insert_with(|| ResumenTecnico {
            nombre: s
                .tecnico_nombre
                .clone()
                .unwrap_or_else(|| "Sin nombre".to_string()),
            total: 0,
            en_proceso: 0,
            finalizadas: 0,
        });
        entrada.total += 1;
        if s.estado == Estado::EnProceso {
            entrada.en_proceso += 1;
        }
        if s.estado == Estado::Finalizada {
            entrada.finalizadas += 1;
        }
    }

    let mut resumen: Vec<ResumenTecnico> = por_id.into_values().collect();
    resumen.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.nombre.cmp(&b.nombre)));
    resumen
}

/// Mean of `fecha_finalizacion - created_at` over finalized tickets.
fn resolucion_promedio(solicitudes: &[SolicitudDetalle]) -> Option<String> {
    let duraciones: Vec<f64> = solicitudes
        .iter()
        .filter(|s| s.estado == Estado::Finalizada)
        .filter_map(|s| s.fecha_finalizacion.map(|fin| (fin - s.created_at)))
        .map(|delta| delta.num_seconds() as f64 / 3600.0)
        .collect();

    if duraciones.is_empty() {
        return None;
    }

    let promedio_horas = duraciones.iter().sum::<f64>() / duraciones.len() as f64;
    // The branch looks at the rounded value so that 23.8h reads "1.0d" and
    // never "24h".
    let horas_redondeadas = promedio_horas.round() as i64;
    if horas_redondeadas < 24 {
        Some(format!("{}h", horas_redondeadas))
    } else {
        Some(format!("{:.1}d", promedio_horas / 24.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn solicitud(estado: Estado, criticidad: Criticidad, tipo: TipoSolicitud) -> SolicitudDetalle {
        SolicitudDetalle {
            id: Uuid::new_v4(),
            usuario_id: Uuid::new_v4(),
            nombre_solicitante: "Ana".to_string(),
            tipo_solicitud: tipo,
            criticidad,
            descripcion: "Fuga de agua".to_string(),
            imagen_url: None,
            sector_id: None,
            equipo_id: None,
            estado,
            created_at: NaiveDate::from_ymd_opt(2025, 3, 10)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            fecha_recepcion_supervisor: None,
            fecha_vista_supervisor: None,
            fecha_derivacion_tecnico: None,
            derivado_por_id: None,
            tecnico_asignado_id: None,
            fecha_vista_tecnico: None,
            fecha_inicio_trabajo: None,
            fecha_estimada: None,
            fecha_finalizacion: None,
            usuario_nombre: None,
            tecnico_nombre: None,
            derivado_por_nombre: None,
            sector_nombre: None,
            equipo_nombre: None,
        }
    }

    #[test]
    fn pct_con_total_cero() {
        assert_eq!(pct(0, 0), 0);
        assert_eq!(pct(7, 0), 0);
        assert_eq!(pct(1, 4), 25);
        assert_eq!(pct(1, 3), 33);
        assert_eq!(pct(2, 3), 67);
    }

    #[test]
    fn buckets_con_relleno_en_cero() {
        let stats = calcular(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.por_estado.len(), 5);
        assert_eq!(stats.por_criticidad.len(), 4);
        assert_eq!(stats.por_tipo.len(), 3);
        assert!(stats.por_estado.iter().all(|b| b.cantidad == 0 && b.porcentaje == 0));
        assert_eq!(stats.resolucion_promedio, None);
    }

    #[test]
    fn conteo_por_estado_y_tipo() {
        let set = vec![
            solicitud(Estado::Pendiente, Criticidad::Bajo, TipoSolicitud::Reparacion),
            solicitud(Estado::Pendiente, Criticidad::Alto, TipoSolicitud::Inversion),
            solicitud(Estado::EnProceso, Criticidad::Alto, TipoSolicitud::Inversion),
            solicitud(Estado::Finalizada, Criticidad::Critico, TipoSolicitud::Mejora),
        ];
        let stats = calcular(&set);

        let pendientes = &stats.por_estado[0];
        assert_eq!(pendientes.clave, "Pendiente");
        assert_eq!(pendientes.cantidad, 2);
        assert_eq!(pendientes.porcentaje, 50);

        let inversiones = stats
            .por_tipo
            .iter()
            .find(|b| b.clave == "Inversión")
            .unwrap();
        assert_eq!(inversiones.cantidad, 2);

        let criticos = stats
            .por_criticidad
            .iter()
            .find(|b| b.clave == "Crítico")
            .unwrap();
        assert_eq!(criticos.cantidad, 1);
        assert_eq!(criticos.porcentaje, 25);
    }

    #[test]
    fn resumen_por_tecnico_ordenado() {
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let mut set = Vec::new();
        for _ in 0..3 {
            let mut s = solicitud(Estado::EnProceso, Criticidad::Medio, TipoSolicitud::Reparacion);
            s.tecnico_asignado_id = Some(t1);
            s.tecnico_nombre = Some("Carlos".to_string());
            set.push(s);
        }
        let mut s = solicitud(Estado::Finalizada, Criticidad::Medio, TipoSolicitud::Reparacion);
        s.tecnico_asignado_id = Some(t2);
        s.tecnico_nombre = Some("Berta".to_string());
        set.push(s);
        // Unassigned tickets never appear in the rollup.
        set.push(solicitud(Estado::Pendiente, Criticidad::Bajo, TipoSolicitud::Mejora));

        let stats = calcular(&set);
        assert_eq!(stats.por_tecnico.len(), 2);
        assert_eq!(stats.por_tecnico[0].nombre, "Carlos");
        assert_eq!(stats.por_tecnico[0].total, 3);
        assert_eq!(stats.por_tecnico[0].en_proceso, 3);
        assert_eq!(stats.por_tecnico[1].nombre, "Berta");
        assert_eq!(stats.por_tecnico[1].finalizadas, 1);
    }

    #[test]
    fn promedio_en_horas_y_en_dias() {
        let mut corta = solicitud(Estado::Finalizada, Criticidad::Bajo, TipoSolicitud::Reparacion);
        corta.fecha_finalizacion = Some(corta.created_at + chrono::Duration::hours(6));
        assert_eq!(calcular(&[corta.clone()]).resolucion_promedio, Some("6h".to_string()));

        let mut larga = solicitud(Estado::Finalizada, Criticidad::Bajo, TipoSolicitud::Reparacion);
        larga.fecha_finalizacion = Some(larga.created_at + chrono::Duration::hours(36));
        assert_eq!(calcular(&[larga]).resolucion_promedio, Some("1.5d".to_string()));
    }

    #[test]
    fn promedio_en_la_frontera_del_dia() {
        // 23h48m rounds to a full day and must render in days.
        let mut al_borde = solicitud(Estado::Finalizada, Criticidad::Bajo, TipoSolicitud::Reparacion);
        al_borde.fecha_finalizacion = Some(al_borde.created_at + chrono::Duration::minutes(23 * 60 + 48));
        assert_eq!(calcular(&[al_borde]).resolucion_promedio, Some("1.0d".to_string()));

        // 23h24m rounds down and stays in hours.
        let mut corta = solicitud(Estado::Finalizada, Criticidad::Bajo, TipoSolicitud::Reparacion);
        corta.fecha_finalizacion = Some(corta.created_at + chrono::Duration::minutes(23 * 60 + 24));
        assert_eq!(calcular(&[corta]).resolucion_promedio, Some("23h".to_string()));
    }

    #[test]
    fn finalizada_sin_fecha_no_divide_por_cero() {
        // estado Finalizada but fecha_finalizacion missing: excluded, and the
        // empty subset yields the sentinel instead of NaN.
        let s = solicitud(Estado::Finalizada, Criticidad::Bajo, TipoSolicitud::Reparacion);
        assert_eq!(calcular(&[s]).resolucion_promedio, None);
    }

    #[test]
    fn escenario_de_una_sola_solicitud() {
        // One ticket through the whole workflow; the average equals its
        // own resolution time exactly.
        let mut s = solicitud(Estado::Finalizada, Criticidad::Alto, TipoSolicitud::Inversion);
        s.fecha_finalizacion = Some(s.created_at + chrono::Duration::hours(5));
        let stats = calcular(&[s]);
        assert_eq!(stats.resolucion_promedio, Some("5h".to_string()));
        assert_eq!(stats.por_estado[4].cantidad, 1);
    }
}
