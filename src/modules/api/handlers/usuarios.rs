use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;

use super::rechazar;
use crate::modules::api::responder::respond;
use crate::shared::db::models::{NuevoUsuario, UsuarioPublico};
use crate::shared::db::DBAccessManager;
use crate::shared::errors::{AppError, ErrorType};
use crate::shared::security;
use crate::shared::session::Sesion;
use crate::shared::workflow::Rol;

#[derive(Debug, Deserialize)]
pub struct CrearUsuarioBody {
    pub username: String,
    pub password: String,
    pub nombre_completo: Option<String>,
    pub rol: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordBody {
    pub nueva: String,
}

fn solo_gestores(sesion: &Sesion) -> Result<(), AppError> {
    if sesion.rol.es_gestor() {
        Ok(())
    } else {
        Err(AppError::new(
            "No tienes permisos para administrar usuarios",
            ErrorType::Forbidden,
        ))
    }
}

pub async fn listar_usuarios_handler(
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    solo_gestores(&sesion).map_err(rechazar)?;

    let usuarios: Vec<UsuarioPublico> = db
        .listar_usuarios()
        .map_err(rechazar)?
        .into_iter()
        .map(UsuarioPublico::from)
        .collect();

    respond(
        Ok(json!({ "success": true, "usuarios": usuarios })),
        StatusCode::OK,
    )
}

/// Técnicos activos, para el selector de derivación.
pub async fn listar_tecnicos_handler(
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    solo_gestores(&sesion).map_err(rechazar)?;

    let tecnicos: Vec<UsuarioPublico> = db
        .listar_tecnicos_activos()
        .map_err(rechazar)?
        .into_iter()
        .map(UsuarioPublico::from)
        .collect();

    respond(
        Ok(json!({ "success": true, "tecnicos": tecnicos })),
        StatusCode::OK,
    )
}

pub async fn crear_usuario_handler(
    sesion: Sesion,
    body: CrearUsuarioBody,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    solo_gestores(&sesion).map_err(rechazar)?;

    let rol: Rol = body.rol.parse().map_err(rechazar)?;

    // A supervisor cannot mint peers or admins.
    if sesion.rol == Rol::Supervisor && rol.es_gestor() {
        return Err(rechazar(AppError::new(
            "Los supervisores solo pueden crear técnicos y solicitantes",
            ErrorType::Forbidden,
        )));
    }

    let username = body.username.trim();
    security::validar_username(username).map_err(rechazar)?;
    security::validar_password(&body.password).map_err(rechazar)?;
    let hash = security::hash_password(&body.password).map_err(rechazar)?;

    let nombre_completo = body
        .nombre_completo
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let usuario = db
        .crear_usuario(NuevoUsuario {
            username: username.to_string(),
            nombre_completo,
            rol: rol.as_str().to_string(),
            password_hash: hash,
        })
        .map_err(rechazar)?;

    log::info!(
        "Usuario {} ({}) creado por {}",
        usuario.username,
        usuario.rol,
        sesion.username
    );

    respond(
        Ok(json!({ "success": true, "usuario": UsuarioPublico::from(usuario) })),
        StatusCode::CREATED,
    )
}

pub async fn eliminar_usuario_handler(
    usuario_id: Uuid,
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    if sesion.rol != Rol::Admin {
        return Err(rechazar(AppError::new(
            "Solo un administrador puede eliminar usuarios",
            ErrorType::Forbidden,
        )));
    }

    if usuario_id == sesion.id {
        return Err(rechazar(AppError::new(
            "No puedes eliminar tu propio usuario",
            ErrorType::BadRequest,
        )));
    }

    let objetivo = db
        .buscar_usuario(usuario_id)
        .map_err(rechazar)?
        .ok_or_else(|| rechazar(AppError::new("Usuario no encontrado", ErrorType::NotFound)))?;

    if objetivo.rol().map_err(rechazar)? == Rol::Admin {
        return Err(rechazar(AppError::new(
            "No puedes eliminar usuarios administradores",
            ErrorType::Forbidden,
        )));
    }

    db.eliminar_usuario(usuario_id).map_err(rechazar)?;
    log::info!(
        "Usuario {} eliminado por {}",
        objetivo.username,
        sesion.username
    );

    respond(Ok(json!({ "success": true })), StatusCode::OK)
}

/// Password reset by an admin, without knowing the current one.
pub async fn reset_password_handler(
    usuario_id: Uuid,
    sesion: Sesion,
    body: ResetPasswordBody,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    if sesion.rol != Rol::Admin {
        return Err(rechazar(AppError::new(
            "Solo un administrador puede restablecer contraseñas",
            ErrorType::Forbidden,
        )));
    }

    let objetivo = db
        .buscar_usuario(usuario_id)
        .map_err(rechazar)?
        .ok_or_else(|| rechazar(AppError::new("Usuario no encontrado", ErrorType::NotFound)))?;

    security::validar_password(&body.nueva).map_err(rechazar)?;
    let hash = security::hash_password(&body.nueva).map_err(rechazar)?;
    db.actualizar_password(usuario_id, &hash).map_err(rechazar)?;

    log::info!(
        "Contraseña de {} restablecida por {}",
        objetivo.username,
        sesion.username
    );
    respond(Ok(json!({ "success": true })), StatusCode::OK)
}
