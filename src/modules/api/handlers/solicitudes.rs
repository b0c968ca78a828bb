use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;

use super::{leer_formulario, rechazar};
use crate::modules::api::responder::respond;
use crate::modules::api::routes::ConsultaSolicitudes;
use crate::shared::db::models::{CambiosSolicitud, NuevaSolicitud, SolicitudDetalle};
use crate::shared::db::{DBAccessManager, FiltroSolicitudes};
use crate::shared::errors::{AppError, ErrorType};
use crate::shared::limite_de_fecha;
use crate::shared::session::Sesion;
use crate::shared::storage::{extension_de, Almacen};
use crate::shared::workflow::{autorizar_transicion, Estado, Rol, Transicion};

#[derive(Debug, Deserialize)]
pub struct DerivarBody {
    pub tecnico_id: Uuid,
    pub fecha_estimada: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IniciarBody {
    pub fecha_estimada: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ActualizarSolicitudBody {
    pub nombre_solicitante: Option<String>,
    pub tipo_solicitud: Option<String>,
    pub criticidad: Option<String>,
    pub descripcion: Option<String>,
    pub sector_id: Option<Uuid>,
    pub equipo_id: Option<Uuid>,
    pub tecnico_asignado_id: Option<Uuid>,
    pub fecha_estimada: Option<NaiveDate>,
    pub estado: Option<String>,
}

/// Translates the raw query string into typed filters, scoped by role:
/// gestores see everything, técnicos only their own assignments, and
/// solicitantes are turned away (they have `/api/solicitudes/propias`).
pub fn filtro_autorizado(
    consulta: &ConsultaSolicitudes,
    sesion: &Sesion,
) -> Result<FiltroSolicitudes, AppError> {
    if sesion.rol == Rol::Solicitante {
        return Err(AppError::new(
            "No tienes permisos para ver todas las solicitudes",
            ErrorType::Forbidden,
        ));
    }

    let mut filtro = FiltroSolicitudes {
        estado: consulta.estado.as_deref().map(str::parse).transpose()?,
        tipo_solicitud: consulta
            .tipo_solicitud
            .as_deref()
            .map(str::parse)
            .transpose()?,
        criticidad: consulta.criticidad.as_deref().map(str::parse).transpose()?,
        sector_id: consulta.sector_id,
        equipo_id: consulta.equipo_id,
        busqueda: consulta
            .busqueda
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string),
        desde: consulta
            .fecha_desde
            .as_deref()
            .map(|f| limite_de_fecha(f, false))
            .transpose()?,
        hasta: consulta
            .fecha_hasta
            .as_deref()
            .map(|f| limite_de_fecha(f, true))
            .transpose()?,
        tecnico_id: consulta.tecnico_id,
    };

    if sesion.rol == Rol::Tecnico {
        filtro.tecnico_id = Some(sesion.id);
    }

    Ok(filtro)
}

pub async fn crear_solicitud_handler(
    sesion: Sesion,
    form: warp::multipart::FormData,
    mut db: DBAccessManager,
    almacen: Almacen,
) -> Result<impl warp::Reply, warp::Rejection> {
    let formulario = leer_formulario(form).await.map_err(rechazar)?;

    let tipo: crate::shared::workflow::TipoSolicitud = formulario
        .requerido("tipo_solicitud")
        .and_then(str::parse)
        .map_err(rechazar)?;
    let criticidad: crate::shared::workflow::Criticidad = formulario
        .requerido("criticidad")
        .and_then(str::parse)
        .map_err(rechazar)?;
    let descripcion = formulario.requerido("descripcion").map_err(rechazar)?;

    let nombre_solicitante = formulario
        .campo("nombre_solicitante")
        .map(str::to_string)
        .unwrap_or_else(|| sesion.nombre_visible());

    let sector_id = formulario.uuid_opcional("sector_id").map_err(rechazar)?;
    let equipo_id = formulario.uuid_opcional("equipo_id").map_err(rechazar)?;

    let imagen_url = match &formulario.archivo {
        Some(archivo) => {
            let ext = extension_de(archivo.nombre.as_deref());
            Some(
                almacen
                    .guardar_imagen_solicitud(sesion.id, &ext, &archivo.datos)
                    .map_err(rechazar)?,
            )
        }
        None => None,
    };

    let fila = db
        .crear_solicitud(NuevaSolicitud {
            usuario_id: sesion.id,
            nombre_solicitante,
            tipo_solicitud: tipo.as_str().to_string(),
            criticidad: criticidad.as_str().to_string(),
            descripcion: descripcion.to_string(),
            imagen_url,
            sector_id,
            equipo_id,
            estado: Estado::Pendiente.as_str().to_string(),
        })
        .map_err(rechazar)?;

    log::info!("Solicitud {} creada por {}", fila.id, sesion.username);

    let detalle = detalle_de(&mut db, fila.id)?;
    respond(
        Ok(json!({ "success": true, "solicitud": detalle })),
        StatusCode::CREATED,
    )
}

#[utoipa::path(
    get,
    path = "/api/solicitudes",
    params(ConsultaSolicitudes),
    responses(
        (status = 200, description = "Listado filtrado según el rol", body = [SolicitudDetalle]),
        (status = 403, description = "Los solicitantes no acceden al listado global", body = crate::shared::errors::ErrorMessage),
    )
)]
pub async fn listar_solicitudes_handler(
    consulta: ConsultaSolicitudes,
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    let filtro = filtro_autorizado(&consulta, &sesion).map_err(rechazar)?;
    let filas = db.listar_solicitudes(&filtro).map_err(rechazar)?;
    let detalles = db.detallar_solicitudes(filas).map_err(rechazar)?;

    respond(
        Ok(json!({ "success": true, "solicitudes": detalles })),
        StatusCode::OK,
    )
}

/// Las del propio usuario, sin importar el rol.
pub async fn mis_solicitudes_handler(
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    let filas = db.solicitudes_de_usuario(sesion.id).map_err(rechazar)?;
    let detalles = db.detallar_solicitudes(filas).map_err(rechazar)?;

    respond(
        Ok(json!({ "success": true, "solicitudes": detalles })),
        StatusCode::OK,
    )
}

pub async fn obtener_solicitud_handler(
    solicitud_id: Uuid,
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    let fila = db
        .buscar_solicitud(solicitud_id)
        .map_err(rechazar)?
        .ok_or_else(|| rechazar(solicitud_no_encontrada()))?;

    let autorizado = sesion.rol.es_gestor()
        || fila.usuario_id == sesion.id
        || (sesion.rol == Rol::Tecnico && fila.tecnico_asignado_id == Some(sesion.id));
    if !autorizado {
        return Err(rechazar(AppError::new(
            "No tienes permisos para ver esta solicitud",
            ErrorType::Forbidden,
        )));
    }

    let detalle = detalle_de_fila(&mut db, fila)?;
    respond(
        Ok(json!({ "success": true, "solicitud": detalle })),
        StatusCode::OK,
    )
}

fn solicitud_no_encontrada() -> AppError {
    AppError::new("Solicitud no encontrada", ErrorType::NotFound)
}

fn detalle_de(db: &mut DBAccessManager, solicitud_id: Uuid) -> Result<SolicitudDetalle, warp::Rejection> {
    let fila = db
        .buscar_solicitud(solicitud_id)
        .map_err(rechazar)?
        .ok_or_else(|| rechazar(solicitud_no_encontrada()))?;
    detalle_de_fila(db, fila)
}

fn detalle_de_fila(
    db: &mut DBAccessManager,
    fila: crate::shared::db::models::Solicitud,
) -> Result<SolicitudDetalle, warp::Rejection> {
    db.detallar_solicitudes(vec![fila])
        .map_err(rechazar)?
        .pop()
        .ok_or_else(|| rechazar(solicitud_no_encontrada()))
}

/// Decides what a zero-row guarded update means, given the estado re-read
/// after the miss. Re-receiving an already-received ticket is treated as a
/// no-op win for whichever supervisor got there second; everything else is
/// a real error.
fn resolver_transicion_fallida(
    transicion: Transicion,
    actual: Option<Estado>,
) -> Result<(), AppError> {
    match actual {
        None => Err(solicitud_no_encontrada()),
        Some(actual)
            if transicion == Transicion::Recepcionar
                && actual.indice() >= transicion.estado_resultante().indice() =>
        {
            Ok(())
        }
        Some(actual) => Err(AppError::new(
            &format!(
                "No se puede {} una solicitud en estado {} (se requiere {})",
                transicion.nombre(),
                actual,
                transicion.estado_previo()
            ),
            ErrorType::BadRequest,
        )),
    }
}

fn verificar_transicion(
    db: &mut DBAccessManager,
    solicitud_id: Uuid,
    transicion: Transicion,
    filas: usize,
) -> Result<(), AppError> {
    if filas > 0 {
        return Ok(());
    }
    resolver_transicion_fallida(transicion, db.estado_solicitud(solicitud_id)?)
}

pub async fn recepcionar_handler(
    solicitud_id: Uuid,
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    autorizar_transicion(Transicion::Recepcionar, sesion.rol).map_err(rechazar)?;

    let ahora = Utc::now().naive_utc();
    let filas = db
        .recepcionar_solicitud(solicitud_id, ahora)
        .map_err(rechazar)?;
    verificar_transicion(&mut db, solicitud_id, Transicion::Recepcionar, filas)
        .map_err(rechazar)?;

    log::info!(
        "Solicitud {} recepcionada por {}",
        solicitud_id,
        sesion.username
    );
    let detalle = detalle_de(&mut db, solicitud_id)?;
    respond(
        Ok(json!({ "success": true, "solicitud": detalle })),
        StatusCode::OK,
    )
}

pub async fn derivar_handler(
    solicitud_id: Uuid,
    sesion: Sesion,
    body: DerivarBody,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    autorizar_transicion(Transicion::Derivar, sesion.rol).map_err(rechazar)?;

    let tecnico = db
        .buscar_usuario(body.tecnico_id)
        .map_err(rechazar)?
        .filter(|u| u.activo);
    let es_tecnico = match &tecnico {
        Some(u) => u.rol().map_err(rechazar)? == Rol::Tecnico,
        None => false,
    };
    if !es_tecnico {
        return Err(rechazar(AppError::new(
            "El técnico seleccionado no es válido",
            ErrorType::BadRequest,
        )));
    }

    let ahora = Utc::now().naive_utc();
    let filas = db
        .derivar_solicitud(
            solicitud_id,
            body.tecnico_id,
            sesion.id,
            body.fecha_estimada,
            ahora,
        )
        .map_err(rechazar)?;
    verificar_transicion(&mut db, solicitud_id, Transicion::Derivar, filas).map_err(rechazar)?;

    log::info!(
        "Solicitud {} derivada a {} por {}",
        solicitud_id,
        body.tecnico_id,
        sesion.username
    );
    let detalle = detalle_de(&mut db, solicitud_id)?;
    respond(
        Ok(json!({ "success": true, "solicitud": detalle })),
        StatusCode::OK,
    )
}

pub async fn iniciar_trabajo_handler(
    solicitud_id: Uuid,
    sesion: Sesion,
    body: IniciarBody,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    autorizar_transicion(Transicion::IniciarTrabajo, sesion.rol).map_err(rechazar)?;

    let ahora = Utc::now().naive_utc();
    let filas = db
        .iniciar_trabajo(solicitud_id, body.fecha_estimada, ahora)
        .map_err(rechazar)?;
    verificar_transicion(&mut db, solicitud_id, Transicion::IniciarTrabajo, filas)
        .map_err(rechazar)?;

    log::info!(
        "Trabajo iniciado en la solicitud {} por {}",
        solicitud_id,
        sesion.username
    );
    let detalle = detalle_de(&mut db, solicitud_id)?;
    respond(
        Ok(json!({ "success": true, "solicitud": detalle })),
        StatusCode::OK,
    )
}

pub async fn finalizar_handler(
    solicitud_id: Uuid,
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    autorizar_transicion(Transicion::Finalizar, sesion.rol).map_err(rechazar)?;

    let ahora = Utc::now().naive_utc();
    let filas = db
        .finalizar_solicitud(solicitud_id, ahora)
        .map_err(rechazar)?;
    verificar_transicion(&mut db, solicitud_id, Transicion::Finalizar, filas).map_err(rechazar)?;

    log::info!(
        "Solicitud {} finalizada por {}",
        solicitud_id,
        sesion.username
    );
    let detalle = detalle_de(&mut db, solicitud_id)?;
    respond(
        Ok(json!({ "success": true, "solicitud": detalle })),
        StatusCode::OK,
    )
}

pub async fn vista_supervisor_handler(
    solicitud_id: Uuid,
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    if !sesion.rol.es_gestor() {
        return Err(rechazar(AppError::new(
            "No tienes permisos para marcar la vista",
            ErrorType::Forbidden,
        )));
    }

    let ahora = Utc::now().naive_utc();
    let filas = db
        .marcar_vista_supervisor(solicitud_id, ahora)
        .map_err(rechazar)?;

    // Cero filas con la solicitud existente significa que ya estaba vista.
    if filas == 0 && db.estado_solicitud(solicitud_id).map_err(rechazar)?.is_none() {
        return Err(rechazar(solicitud_no_encontrada()));
    }

    respond(Ok(json!({ "success": true })), StatusCode::OK)
}

pub async fn vista_tecnico_handler(
    solicitud_id: Uuid,
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    let fila = db
        .buscar_solicitud(solicitud_id)
        .map_err(rechazar)?
        .ok_or_else(|| rechazar(solicitud_no_encontrada()))?;

    let autorizado = sesion.rol.es_gestor()
        || (sesion.rol == Rol::Tecnico && fila.tecnico_asignado_id == Some(sesion.id));
    if !autorizado {
        return Err(rechazar(AppError::new(
            "Solo el técnico asignado puede marcar la vista",
            ErrorType::Forbidden,
        )));
    }

    let ahora = Utc::now().naive_utc();
    db.marcar_vista_tecnico(solicitud_id, ahora)
        .map_err(rechazar)?;

    respond(Ok(json!({ "success": true })), StatusCode::OK)
}

/// Administrative patch outside the state machine. Every field is optional
/// and validated before it touches the row.
pub async fn actualizar_solicitud_handler(
    solicitud_id: Uuid,
    sesion: Sesion,
    body: ActualizarSolicitudBody,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    if !sesion.rol.es_gestor() {
        return Err(rechazar(AppError::new(
            "No tienes permisos para editar solicitudes",
            ErrorType::Forbidden,
        )));
    }

    let tipo = body
        .tipo_solicitud
        .as_deref()
        .map(str::parse::<crate::shared::workflow::TipoSolicitud>)
        .transpose()
        .map_err(rechazar)?;
    let criticidad = body
        .criticidad
        .as_deref()
        .map(str::parse::<crate::shared::workflow::Criticidad>)
        .transpose()
        .map_err(rechazar)?;
    let estado = body
        .estado
        .as_deref()
        .map(str::parse::<Estado>)
        .transpose()
        .map_err(rechazar)?;

    let cambios = CambiosSolicitud {
        nombre_solicitante: body
            .nombre_solicitante
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        tipo_solicitud: tipo.map(|t| t.as_str().to_string()),
        criticidad: criticidad.map(|c| c.as_str().to_string()),
        descripcion: body
            .descripcion
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        sector_id: body.sector_id,
        equipo_id: body.equipo_id,
        tecnico_asignado_id: body.tecnico_asignado_id,
        fecha_estimada: body.fecha_estimada,
        estado: estado.map(|e| e.as_str().to_string()),
    };

    if cambios.esta_vacio() {
        return Err(rechazar(AppError::new(
            "No hay cambios para aplicar",
            ErrorType::BadRequest,
        )));
    }

    let filas = db
        .actualizar_solicitud(solicitud_id, &cambios)
        .map_err(rechazar)?;
    if filas == 0 {
        return Err(rechazar(solicitud_no_encontrada()));
    }

    log::warn!(
        "Edición administrativa de la solicitud {} por {}",
        solicitud_id,
        sesion.username
    );
    let detalle = detalle_de(&mut db, solicitud_id)?;
    respond(
        Ok(json!({ "success": true, "solicitud": detalle })),
        StatusCode::OK,
    )
}

pub async fn eliminar_solicitud_handler(
    solicitud_id: Uuid,
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    if sesion.rol != Rol::Admin {
        return Err(rechazar(AppError::new(
            "Solo un administrador puede eliminar solicitudes",
            ErrorType::Forbidden,
        )));
    }

    let filas = db.eliminar_solicitud(solicitud_id).map_err(rechazar)?;
    if filas == 0 {
        return Err(rechazar(solicitud_no_encontrada()));
    }

    log::warn!(
        "Solicitud {} eliminada por {}",
        solicitud_id,
        sesion.username
    );
    respond(Ok(json!({ "success": true })), StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recepcionar_repetido_es_un_exito_silencioso() {
        // Two supervisors race; the loser's guarded UPDATE touches zero rows
        // but the ticket already moved forward, so nobody sees an error.
        assert!(resolver_transicion_fallida(Transicion::Recepcionar, Some(Estado::Recibida)).is_ok());
        assert!(
            resolver_transicion_fallida(Transicion::Recepcionar, Some(Estado::Finalizada)).is_ok()
        );
    }

    #[test]
    fn derivar_desde_pendiente_se_rechaza() {
        let err = resolver_transicion_fallida(Transicion::Derivar, Some(Estado::Pendiente))
            .unwrap_err();
        assert_eq!(err.err_type, ErrorType::BadRequest);
        assert!(err.message.contains("derivar"));
        assert!(err.message.contains("Pendiente"));
        assert!(err.message.contains("Recibida"));
    }

    #[test]
    fn finalizar_fuera_de_orden_nombra_el_estado_requerido() {
        let err = resolver_transicion_fallida(Transicion::Finalizar, Some(Estado::Recibida))
            .unwrap_err();
        assert_eq!(err.err_type, ErrorType::BadRequest);
        assert!(err.message.contains("En proceso"));
    }

    #[test]
    fn transicion_sobre_solicitud_inexistente() {
        let err = resolver_transicion_fallida(Transicion::Recepcionar, None).unwrap_err();
        assert_eq!(err.err_type, ErrorType::NotFound);
    }
}
