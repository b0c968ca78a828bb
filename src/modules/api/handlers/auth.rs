use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use warp::http::header::SET_COOKIE;
use warp::http::StatusCode;
use warp_rate_limit::RateLimitInfo;

use super::{leer_formulario, rechazar};
use crate::modules::api::responder::respond;
use crate::shared::config::SesionConfig;
use crate::shared::db::models::{Usuario, UsuarioPublico};
use crate::shared::db::DBAccessManager;
use crate::shared::errors::{AppError, ErrorType};
use crate::shared::gate;
use crate::shared::security;
use crate::shared::session::{self, Sesion};
use crate::shared::storage::{extension_de, Almacen};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CambiarPasswordBody {
    pub actual: String,
    pub nueva: String,
}

#[derive(Debug, Deserialize)]
pub struct PerfilBody {
    pub nombre_completo: String,
}

fn credenciales_invalidas() -> AppError {
    AppError::new("Usuario o contraseña incorrectos", ErrorType::Unauthorized)
}

/// Emits the session cookie for the given user row.
fn abrir_sesion(usuario: &Usuario, cfg: &SesionConfig) -> Result<(Sesion, String), AppError> {
    let rol = usuario.rol()?;
    session::emitir(
        usuario.id,
        &usuario.username,
        usuario.nombre_completo.clone(),
        rol,
        usuario.avatar_url.clone(),
        &cfg.secreto,
        cfg.duracion_dias,
        cfg.cookie_segura,
    )
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Sesión abierta; la cookie viaja en Set-Cookie", body = UsuarioPublico),
        (status = 401, description = "Credenciales inválidas", body = crate::shared::errors::ErrorMessage),
        (status = 429, description = "Demasiados intentos"),
    )
)]
pub async fn login_handler(
    _rate_limit_info: RateLimitInfo,
    body: LoginBody,
    mut db: DBAccessManager,
    cfg: SesionConfig,
) -> Result<impl warp::Reply, warp::Rejection> {
    let usuario = db
        .buscar_usuario_por_username(body.username.trim())
        .map_err(rechazar)?
        .ok_or_else(|| rechazar(credenciales_invalidas()))?;

    let valida =
        security::verify_password(&body.password, &usuario.password_hash).map_err(rechazar)?;
    if !valida {
        log::warn!("Intento de login fallido para {}", usuario.username);
        return Err(rechazar(credenciales_invalidas()));
    }

    let (_, cookie) = abrir_sesion(&usuario, &cfg).map_err(rechazar)?;
    log::info!("Sesión abierta para {}", usuario.username);

    let cuerpo = json!({
        "success": true,
        "user": UsuarioPublico::from(usuario),
    });
    Ok(warp::reply::with_header(
        warp::reply::json(&cuerpo),
        SET_COOKIE,
        cookie,
    ))
}

pub async fn logout_handler(
    _sesion: Sesion,
    cfg: SesionConfig,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::with_header(
        warp::reply::json(&json!({ "success": true })),
        SET_COOKIE,
        session::cookie_de_cierre(cfg.cookie_segura),
    ))
}

/// The page gate asks here who the caller is.
pub async fn sesion_handler(sesion: Sesion) -> Result<impl warp::Reply, warp::Rejection> {
    respond(
        Ok(json!({
            "success": true,
            "user": {
                "id": sesion.id,
                "username": sesion.username,
                "nombre_completo": sesion.nombre_completo,
                "rol": sesion.rol,
                "avatar_url": sesion.avatar_url,
            },
        })),
        StatusCode::OK,
    )
}

#[derive(Debug, Deserialize)]
pub struct DestinoQuery {
    pub path: String,
}

/// Le dice al frontend si la página pedida se muestra o hacia dónde
/// redirigir según el rol de la sesión (si la hay).
pub async fn destino_handler(
    consulta: DestinoQuery,
    sesion: Option<Sesion>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let destino = gate::resolver(&consulta.path, sesion.map(|s| s.rol));
    let cuerpo = match destino {
        gate::Destino::Renderizar => json!({ "success": true, "renderizar": true }),
        gate::Destino::Redirigir(a) => {
            json!({ "success": true, "renderizar": false, "redirigir": a })
        }
    };
    respond(Ok(cuerpo), StatusCode::OK)
}

pub async fn cambiar_password_handler(
    sesion: Sesion,
    body: CambiarPasswordBody,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    let usuario = db
        .buscar_usuario(sesion.id)
        .map_err(rechazar)?
        .ok_or_else(|| rechazar(AppError::new("Usuario no encontrado", ErrorType::NotFound)))?;

    let valida = security::verify_password(&body.actual, &usuario.password_hash)
        .map_err(rechazar)?;
    if !valida {
        return Err(rechazar(AppError::new(
            "La contraseña actual es incorrecta",
            ErrorType::Unauthorized,
        )));
    }

    security::validar_password(&body.nueva).map_err(rechazar)?;
    let hash = security::hash_password(&body.nueva).map_err(rechazar)?;
    db.actualizar_password(sesion.id, &hash).map_err(rechazar)?;

    log::info!("Contraseña actualizada para {}", usuario.username);
    respond(Ok(json!({ "success": true })), StatusCode::OK)
}

/// Updating the profile re-issues the cookie so the new display name is
/// visible without a re-login.
pub async fn actualizar_perfil_handler(
    sesion: Sesion,
    body: PerfilBody,
    mut db: DBAccessManager,
    cfg: SesionConfig,
) -> Result<impl warp::Reply, warp::Rejection> {
    let nombre = body.nombre_completo.trim();
    if nombre.is_empty() {
        return Err(rechazar(AppError::new(
            "El nombre no puede estar vacío",
            ErrorType::BadRequest,
        )));
    }

    let usuario = db.actualizar_perfil(sesion.id, nombre).map_err(rechazar)?;
    let (_, cookie) = abrir_sesion(&usuario, &cfg).map_err(rechazar)?;

    let cuerpo = json!({
        "success": true,
        "user": UsuarioPublico::from(usuario),
    });
    Ok(warp::reply::with_header(
        warp::reply::json(&cuerpo),
        SET_COOKIE,
        cookie,
    ))
}

pub async fn subir_avatar_handler(
    sesion: Sesion,
    form: warp::multipart::FormData,
    mut db: DBAccessManager,
    almacen: Almacen,
    cfg: SesionConfig,
) -> Result<impl warp::Reply, warp::Rejection> {
    let formulario = leer_formulario(form).await.map_err(rechazar)?;
    let archivo = formulario
        .archivo
        .ok_or_else(|| rechazar(AppError::new("Falta la imagen", ErrorType::BadRequest)))?;

    let ext = extension_de(archivo.nombre.as_deref());
    let url = almacen
        .guardar_avatar(sesion.id, &ext, &archivo.datos)
        .map_err(rechazar)?;

    let usuario = db.actualizar_avatar(sesion.id, &url).map_err(rechazar)?;
    let (_, cookie) = abrir_sesion(&usuario, &cfg).map_err(rechazar)?;

    let cuerpo = json!({
        "success": true,
        "avatar_url": url,
        "user": UsuarioPublico::from(usuario),
    });
    Ok(warp::reply::with_header(
        warp::reply::json(&cuerpo),
        SET_COOKIE,
        cookie,
    ))
}
