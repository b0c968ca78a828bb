use serde_json::json;
use warp::http::StatusCode;

use super::rechazar;
use super::solicitudes::filtro_autorizado;
use crate::modules::api::responder::respond;
use crate::modules::api::routes::ConsultaSolicitudes;
use crate::shared::db::DBAccessManager;
use crate::shared::session::Sesion;
use crate::shared::stats;

/// Aggregates over the same role-scoped, filtered set the listing shows,
/// so the dashboard numbers always match the table next to them.
#[utoipa::path(
    get,
    path = "/api/estadisticas",
    params(ConsultaSolicitudes),
    responses(
        (status = 200, description = "Conteos y promedios del tablero", body = stats::Estadisticas),
        (status = 403, description = "Sin acceso al tablero", body = crate::shared::errors::ErrorMessage),
    )
)]
pub async fn estadisticas_handler(
    consulta: ConsultaSolicitudes,
    sesion: Sesion,
    mut db: DBAccessManager,
) -> Result<impl warp::Reply, warp::Rejection> {
    let filtro = filtro_autorizado(&consulta, &sesion).map_err(rechazar)?;
    let filas = db.listar_solicitudes(&filtro).map_err(rechazar)?;
    let detalles = db.detallar_solicitudes(filas).map_err(rechazar)?;

    let estadisticas = stats::calcular(&detalles);
    respond(
        Ok(json!({ "success": true, "estadisticas": estadisticas })),
        StatusCode::OK,
    )
}
