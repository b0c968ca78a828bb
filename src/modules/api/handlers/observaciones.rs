//! Notas sobre una solicitud: texto, imagen o ambas. Cada alta o baja se
//! publica a los sockets que miran esa solicitud.

use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;

use super::{leer_formulario, rechazar, ArchivoSubido};
use crate::modules::api::responder::respond;
use crate::modules::api::ws::{self, AccionNota, EventoNotas, Suscriptores};
use crate::shared::db::models::NuevaObservacion;
use crate::shared::db::DBAccessManager;
use crate::shared::errors::{AppError, ErrorType};
use crate::shared::session::Sesion;
use crate::shared::storage::{extension_de, Almacen};
use crate::shared::workflow::Rol;

/// Placeholder shown when a note carries only an image.
const TEXTO_SOLO_IMAGEN: &str = "📷 Imagen";

pub async fn listar_observaciones_handler(
    solicitud_id: Uuid,
    _sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    if db
        .buscar_solicitud(solicitud_id)
        .map_err(rechazar)?
        .is_none()
    {
        return Err(rechazar(AppError::new(
            "Solicitud no encontrada",
            ErrorType::NotFound,
        )));
    }

    let observaciones = db.listar_observaciones(solicitud_id).map_err(rechazar)?;
    respond(
        Ok(json!({ "success": true, "observaciones": observaciones })),
        StatusCode::OK,
    )
}

pub async fn crear_observacion_handler(
    solicitud_id: Uuid,
    sesion: Sesion,
    form: warp::multipart::FormData,
    mut db: DBAccessManager,
    almacen: Almacen,
    suscriptores: Suscriptores,
) -> Result<impl warp::Reply, warp::Rejection> {
    if db
        .buscar_solicitud(solicitud_id)
        .map_err(rechazar)?
        .is_none()
    {
        return Err(rechazar(AppError::new(
            "Solicitud no encontrada",
            ErrorType::NotFound,
        )));
    }

    let formulario = leer_formulario(form).await.map_err(rechazar)?;
    let texto = formulario.campo("texto").map(str::to_string);

    if texto.is_none() && formulario.archivo.is_none() {
        return Err(rechazar(AppError::new(
            "Debes escribir un texto o adjuntar una imagen",
            ErrorType::BadRequest,
        )));
    }

    let imagen_url = match &formulario.archivo {
        Some(ArchivoSubido { nombre, datos }) => {
            let ext = extension_de(nombre.as_deref());
            Some(
                almacen
                    .guardar_imagen_nota(sesion.id, &ext, datos)
                    .map_err(rechazar)?,
            )
        }
        None => None,
    };

    let observacion = db
        .crear_observacion(NuevaObservacion {
            solicitud_id,
            autor_id: sesion.id,
            autor_nombre: sesion.nombre_visible(),
            autor_rol: sesion.rol.as_str().to_string(),
            texto: texto.unwrap_or_else(|| TEXTO_SOLO_IMAGEN.to_string()),
            imagen_url,
        })
        .map_err(rechazar)?;

    log::info!(
        "Observación {} agregada a la solicitud {} por {}",
        observacion.id,
        solicitud_id,
        sesion.username
    );
    ws::publicar(
        &suscriptores,
        EventoNotas {
            solicitud_id,
            accion: AccionNota::Alta,
        },
    );

    respond(
        Ok(json!({ "success": true, "observacion": observacion })),
        StatusCode::CREATED,
    )
}

pub async fn eliminar_observacion_handler(
    observacion_id: Uuid,
    sesion: Sesion,
    mut db: DBAccessManager,
    suscriptores: Suscriptores,
) -> Result<impl warp::Reply, warp::Rejection> {
    let observacion = db
        .buscar_observacion(observacion_id)
        .map_err(rechazar)?
        .ok_or_else(|| {
            rechazar(AppError::new(
                "Observación no encontrada",
                ErrorType::NotFound,
            ))
        })?;

    if observacion.autor_id != sesion.id && sesion.rol != Rol::Admin {
        return Err(rechazar(AppError::new(
            "Solo puedes eliminar tus propias notas",
            ErrorType::Forbidden,
        )));
    }

    db.eliminar_observacion(observacion_id).map_err(rechazar)?;
    log::info!(
        "Observación {} eliminada por {}",
        observacion_id,
        sesion.username
    );
    ws::publicar(
        &suscriptores,
        EventoNotas {
            solicitud_id: observacion.solicitud_id,
            accion: AccionNota::Baja,
        },
    );

    respond(Ok(json!({ "success": true })), StatusCode::OK)
}
