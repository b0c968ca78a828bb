//! Exportación del listado a CSV, con los mismos filtros y alcance por rol
//! que la vista de tabla.

use chrono::Utc;
use warp::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use warp::http::{HeaderValue, Response};
use warp::hyper::Body;

use super::rechazar;
use super::solicitudes::filtro_autorizado;
use crate::modules::api::routes::ConsultaSolicitudes;
use crate::shared::a_hora_local;
use crate::shared::db::models::SolicitudDetalle;
use crate::shared::db::DBAccessManager;
use crate::shared::errors::{AppError, ErrorType};
use crate::shared::session::Sesion;

const ENCABEZADO: &str =
    "Fecha,Solicitante,Tipo,Criticidad,Descripción,Estado,Técnico Asignado,Tiene Imagen";

/// Quotes a field when it carries commas, quotes or newlines.
fn campo_csv(valor: &str) -> String {
    if valor.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", valor.replace('"', "\"\""))
    } else {
        valor.to_string()
    }
}

/// Builds the full document. The BOM up front keeps Excel from mangling
/// the accented headers.
pub fn generar_csv(solicitudes: &[SolicitudDetalle]) -> String {
    let mut salida = String::from("\u{feff}");
    salida.push_str(ENCABEZADO);
    salida.push('\n');

    for s in solicitudes {
        let fecha = a_hora_local(s.created_at).format("%d/%m/%Y %H:%M").to_string();
        let tecnico = s.tecnico_nombre.as_deref().unwrap_or("Sin asignar");
        let tiene_imagen = if s.imagen_url.is_some() { "Sí" } else { "No" };

        let fila = [
            fecha.as_str(),
            s.nombre_solicitante.as_str(),
            s.tipo_solicitud.as_str(),
            s.criticidad.as_str(),
            s.descripcion.as_str(),
            s.estado.as_str(),
            tecnico,
            tiene_imagen,
        ]
        .iter()
        .map(|campo| campo_csv(campo))
        .collect::<Vec<_>>()
        .join(",");

        salida.push_str(&fila);
        salida.push('\n');
    }

    salida
}

#[utoipa::path(
    get,
    path = "/api/solicitudes/exportar",
    params(ConsultaSolicitudes),
    responses(
        (status = 200, description = "CSV adjunto con el listado filtrado"),
        (status = 403, description = "Sin acceso al listado", body = crate::shared::errors::ErrorMessage),
    )
)]
pub async fn exportar_csv_handler(
    consulta: ConsultaSolicitudes,
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    let filtro = filtro_autorizado(&consulta, &sesion).map_err(rechazar)?;
    let filas = db.listar_solicitudes(&filtro).map_err(rechazar)?;
    let detalles = db.detallar_solicitudes(filas).map_err(rechazar)?;

    let csv = generar_csv(&detalles);
    let nombre = format!(
        "solicitudes_{}.csv",
        a_hora_local(Utc::now().naive_utc()).format("%Y-%m-%d")
    );

    log::info!(
        "Exportación CSV de {} solicitudes por {}",
        detalles.len(),
        sesion.username
    );

    let mut respuesta = Response::new(Body::from(csv));
    respuesta.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    let disposicion = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", nombre))
        .map_err(|_| {
            rechazar(AppError::new(
                "No se pudo generar el nombre del archivo",
                ErrorType::Internal,
            ))
        })?;
    respuesta
        .headers_mut()
        .insert(CONTENT_DISPOSITION, disposicion);

    Ok(respuesta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::workflow::{Criticidad, Estado, TipoSolicitud};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn solicitud(descripcion: &str) -> SolicitudDetalle {
        SolicitudDetalle {
            id: Uuid::new_v4(),
            usuario_id: Uuid::new_v4(),
            nombre_solicitante: "Ana Pérez".to_string(),
            tipo_solicitud: TipoSolicitud::Reparacion,
            criticidad: Criticidad::Alto,
            descripcion: descripcion.to_string(),
            imagen_url: None,
            sector_id: None,
            equipo_id: None,
            estado: Estado::Pendiente,
            created_at: NaiveDate::from_ymd_opt(2025, 3, 10)
                .unwrap()
                .and_hms_opt(14, 30, 0)
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
    fn escapa_comas_y_comillas() {
        assert_eq!(campo_csv("simple"), "simple");
        assert_eq!(campo_csv("a, b"), "\"a, b\"");
        assert_eq!(campo_csv("dijo \"hola\""), "\"dijo \"\"hola\"\"\"");
        assert_eq!(campo_csv("dos\nlíneas"), "\"dos\nlíneas\"");
    }

    #[test]
    fn documento_con_bom_y_encabezado() {
        let csv = generar_csv(&[]);
        assert!(csv.starts_with('\u{feff}'));
        assert!(csv.contains("Fecha,Solicitante,Tipo"));
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn fila_con_fecha_local_y_campos_derivados() {
        let mut s = solicitud("Pérdida de aceite, urgente");
        s.imagen_url = Some("/uploads/foto.jpg".to_string());
        s.tecnico_nombre = Some("Carlos".to_string());

        let csv = generar_csv(&[s]);
        let fila = csv.lines().nth(1).unwrap();

        // 14:30 UTC es 11:30 local.
        assert!(fila.starts_with("10/03/2025 11:30,"));
        assert!(fila.contains("\"Pérdida de aceite, urgente\""));
        assert!(fila.contains("Reparación/Acondicionamiento"));
        assert!(fila.ends_with("Carlos,Sí"));
    }

    #[test]
    fn sin_tecnico_ni_imagen() {
        let csv = generar_csv(&[solicitud("Cambio de lámpara")]);
        let fila = csv.lines().nth(1).unwrap();
        assert!(fila.ends_with("Sin asignar,No"));
    }
}
