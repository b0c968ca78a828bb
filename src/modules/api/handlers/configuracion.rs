//! Catálogos de configuración: sectores y equipos/máquinas.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;

use super::rechazar;
use crate::modules::api::responder::respond;
use crate::shared::db::models::{NuevoEquipo, NuevoSector};
use crate::shared::db::DBAccessManager;
use crate::shared::errors::{AppError, ErrorType};
use crate::shared::session::Sesion;
use crate::shared::workflow::Rol;

#[derive(Debug, Deserialize)]
pub struct SectorBody {
    pub nombre: String,
}

#[derive(Debug, Deserialize)]
pub struct EquipoBody {
    pub nombre: String,
    pub sector_id: Option<Uuid>,
}

fn solo_gestores(sesion: &Sesion) -> Result<(), AppError> {
    if sesion.rol.es_gestor() {
        Ok(())
    } else {
        Err(AppError::new(
            "No tienes permisos para modificar la configuración",
            ErrorType::Forbidden,
        ))
    }
}

fn solo_admin(sesion: &Sesion) -> Result<(), AppError> {
    if sesion.rol == Rol::Admin {
        Ok(())
    } else {
        Err(AppError::new(
            "Solo un administrador puede hacer esto",
            ErrorType::Forbidden,
        ))
    }
}

fn nombre_valido(nombre: &str) -> Result<&str, AppError> {
    let limpio = nombre.trim();
    if limpio.is_empty() {
        return Err(AppError::new(
            "El nombre es requerido",
            ErrorType::BadRequest,
        ));
    }
    Ok(limpio)
}

pub async fn listar_sectores_handler(
    _sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    let sectores = db.listar_sectores().map_err(rechazar)?;
    respond(
        Ok(json!({ "success": true, "sectores": sectores })),
        StatusCode::OK,
    )
}

pub async fn crear_sector_handler(
    sesion: Sesion,
    body: SectorBody,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    solo_gestores(&sesion).map_err(rechazar)?;
    let nombre = nombre_valido(&body.nombre).map_err(rechazar)?;

    let sector = db
        .crear_sector(NuevoSector {
            nombre: nombre.to_string(),
        })
        .map_err(rechazar)?;

    log::info!("Sector {} creado por {}", sector.nombre, sesion.username);
    respond(
        Ok(json!({ "success": true, "sector": sector })),
        StatusCode::CREATED,
    )
}

pub async fn actualizar_sector_handler(
    sector_id: Uuid,
    sesion: Sesion,
    body: SectorBody,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    solo_admin(&sesion).map_err(rechazar)?;
    let nombre = nombre_valido(&body.nombre).map_err(rechazar)?;

    let sector = db
        .actualizar_sector(sector_id, nombre)
        .map_err(rechazar)?;
    respond(
        Ok(json!({ "success": true, "sector": sector })),
        StatusCode::OK,
    )
}

pub async fn eliminar_sector_handler(
    sector_id: Uuid,
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    solo_admin(&sesion).map_err(rechazar)?;
    db.desactivar_sector(sector_id).map_err(rechazar)?;
    log::info!("Sector {} dado de baja por {}", sector_id, sesion.username);
    respond(Ok(json!({ "success": true })), StatusCode::OK)
}

pub async fn listar_equipos_handler(
    _sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    let equipos = db.listar_equipos().map_err(rechazar)?;
    respond(
        Ok(json!({ "success": true, "equipos": equipos })),
        StatusCode::OK,
    )
}

pub async fn crear_equipo_handler(
    sesion: Sesion,
    body: EquipoBody,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    solo_gestores(&sesion).map_err(rechazar)?;
    let nombre = nombre_valido(&body.nombre).map_err(rechazar)?;

    let equipo = db
        .crear_equipo(NuevoEquipo {
            nombre: nombre.to_string(),
            sector_id: body.sector_id,
        })
        .map_err(rechazar)?;

    log::info!("Equipo {} creado por {}", equipo.nombre, sesion.username);
    respond(
        Ok(json!({ "success": true, "equipo": equipo })),
        StatusCode::CREATED,
    )
}

pub async fn actualizar_equipo_handler(
    equipo_id: Uuid,
    sesion: Sesion,
    body: EquipoBody,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    solo_admin(&sesion).map_err(rechazar)?;
    let nombre = nombre_valido(&body.nombre).map_err(rechazar)?;

    let equipo = db
        .actualizar_equipo(equipo_id, nombre, body.sector_id)
        .map_err(rechazar)?;
    respond(
        Ok(json!({ "success": true, "equipo": equipo })),
        StatusCode::OK,
    )
}

pub async fn eliminar_equipo_handler(
    equipo_id: Uuid,
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    solo_admin(&sesion).map_err(rechazar)?;

    let filas = db.desactivar_equipo(equipo_id).map_err(rechazar)?;
    if filas == 0 {
        return Err(rechazar(AppError::new(
            "Equipo no encontrado",
            ErrorType::NotFound,
        )));
    }

    log::info!("Equipo {} dado de baja por {}", equipo_id, sesion.username);
    respond(Ok(json!({ "success": true })), StatusCode::OK)
}
