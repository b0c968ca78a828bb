use serde::Serialize;
use utoipa::ToSchema;
use warp::{http::StatusCode, reject::Reject, Rejection, Reply};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// No session cookie, or the cookie does not verify.
    Unauthorized,
    /// Session present but the role is not allowed to do this.
    Forbidden,
    BadRequest,
    NotFound,
    /// Unique-key violation surfaced by the data layer.
    Duplicate,
    /// Referential guard refused the operation (e.g. sector with active equipment).
    Conflict,
    /// Image could not be written to object storage.
    Storage,
    Internal,
}

#[derive(Debug)]
pub struct AppError {
    pub err_type: ErrorType,
    pub message: String,
}

impl AppError {
    pub fn new(message: &str, err_type: ErrorType) -> AppError {
        AppError {
            err_type,
            message: message.to_string(),
        }
    }

    pub fn to_http_status(&self) -> StatusCode {
        match self.err_type {
            ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorType::Forbidden => StatusCode::FORBIDDEN,
            ErrorType::BadRequest => StatusCode::BAD_REQUEST,
            ErrorType::NotFound => StatusCode::NOT_FOUND,
            ErrorType::Duplicate => StatusCode::CONFLICT,
            ErrorType::Conflict => StatusCode::CONFLICT,
            ErrorType::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps diesel failures to typed kinds so business code never has to
    /// pattern-match on the database's error text.
    pub fn from_diesel_err(err: diesel::result::Error, context: &str) -> AppError {
        match err {
            diesel::result::Error::NotFound => AppError {
                err_type: ErrorType::NotFound,
                message: format!("{} no encontrado", context),
            },
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            ) => AppError {
                err_type: ErrorType::Duplicate,
                message: format!("{} ya existe ({})", context, info.message()),
            },
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => AppError {
                err_type: ErrorType::Conflict,
                message: format!("{}: referencia inválida ({})", context, info.message()),
            },
            other => AppError {
                err_type: ErrorType::Internal,
                message: format!("{}: {}", context, other),
            },
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl Reject for AppError {}

/// Uniform error body: every failed action returns `{success: false, error}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorMessage {
    pub success: bool,
    pub error: String,
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Ruta no encontrada".to_string())
    } else if let Some(app_err) = err.find::<AppError>() {
        if app_err.err_type == ErrorType::Internal || app_err.err_type == ErrorType::Storage {
            log::error!("{}", app_err.message);
        } else {
            log::debug!("{}", app_err.message);
        }
        (app_err.to_http_status(), app_err.message.clone())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Cuerpo inválido: {}", e))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "El archivo supera el tamaño permitido".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Método no permitido".to_string(),
        )
    } else {
        log::error!("rechazo no manejado: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error interno del servidor".to_string(),
        )
    };

    let json = warp::reply::json(&ErrorMessage {
        success: false,
        error: message,
    });

    Ok(warp::reply::with_status(json, code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estados_http_por_tipo() {
        let casos = [
            (ErrorType::Unauthorized, StatusCode::UNAUTHORIZED),
            (ErrorType::Forbidden, StatusCode::FORBIDDEN),
            (ErrorType::BadRequest, StatusCode::BAD_REQUEST),
            (ErrorType::NotFound, StatusCode::NOT_FOUND),
            (ErrorType::Duplicate, StatusCode::CONFLICT),
            (ErrorType::Conflict, StatusCode::CONFLICT),
            (ErrorType::Storage, StatusCode::INTERNAL_SERVER_ERROR),
            (ErrorType::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (tipo, esperado) in casos {
            assert_eq!(AppError::new("x", tipo).to_http_status(), esperado);
        }
    }

    #[test]
    fn not_found_de_diesel() {
        let err = AppError::from_diesel_err(diesel::result::Error::NotFound, "Usuario");
        assert_eq!(err.err_type, ErrorType::NotFound);
        assert!(err.message.contains("Usuario"));
    }
}
