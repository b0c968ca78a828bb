use serde::de::DeserializeOwned;
use warp::{self, http::Method, Filter};

use crate::shared::config::SesionConfig;
use crate::shared::db::{DBAccessManager, PgPool};
use crate::shared::errors::{AppError, ErrorType};
use crate::shared::session::{self, Sesion};
use crate::shared::storage::Almacen;

pub fn with_json_body<T: DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(1024 * 16).and(warp::body::json())
}

pub fn with_cors(origin: &str) -> warp::filters::cors::Cors {
    warp::cors()
        .allow_origin(origin)
        .allow_headers(vec!["Content-Type", "Authorization"])
        .allow_methods(&[
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_credentials(true)
        .build()
}

async fn extraer_sesion(
    header_cookie: Option<String>,
    header_auth: Option<String>,
    secreto: String,
) -> Result<Sesion, warp::Rejection> {
    // Cookie first; Authorization: Bearer as a fallback for API clients.
    let token = header_cookie
        .as_deref()
        .and_then(session::token_de_cabecera)
        .or_else(|| {
            header_auth
                .as_deref()
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_string)
        });

    match token {
        Some(valor) => session::decodificar(&valor, &secreto).map_err(warp::reject::custom),
        None => Err(warp::reject::custom(AppError::new(
            "No estás autenticado",
            ErrorType::Unauthorized,
        ))),
    }
}

pub fn with_sesion(
    cfg: SesionConfig,
) -> impl Filter<Extract = (Sesion,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("Cookie")
        .and(warp::header::optional::<String>("Authorization"))
        .and(warp::any().map(move || cfg.secreto.clone()))
        .and_then(extraer_sesion)
}

/// Como `with_sesion`, pero una cookie ausente o vencida extrae `None` en
/// lugar de rechazar. Lo usa el resolutor de navegación.
pub fn with_sesion_opcional(
    cfg: SesionConfig,
) -> impl Filter<Extract = (Option<Sesion>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("Cookie")
        .and(warp::any().map(move || cfg.secreto.clone()))
        .map(|header_cookie: Option<String>, secreto: String| {
            header_cookie
                .as_deref()
                .and_then(session::token_de_cabecera)
                .and_then(|token| session::decodificar(&token, &secreto).ok())
        })
}

pub fn with_sesion_config(
    cfg: SesionConfig,
) -> impl Filter<Extract = (SesionConfig,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || cfg.clone())
}

pub fn with_almacen(
    almacen: Almacen,
) -> impl Filter<Extract = (Almacen,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || almacen.clone())
}

pub fn with_db_access_manager(
    pool: PgPool,
) -> impl Filter<Extract = (DBAccessManager,), Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || pool.clone())
        .and_then(|pool: PgPool| async move {
            match pool.get() {
                Ok(conn) => Ok(DBAccessManager::new(conn)),
                Err(err) => Err(warp::reject::custom(AppError::new(
                    format!("Error getting connection from pool: {}", err).as_str(),
                    ErrorType::Internal,
                ))),
            }
        })
}
