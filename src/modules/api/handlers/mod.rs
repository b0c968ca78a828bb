pub mod auth;
pub mod configuracion;
pub mod estadisticas;
pub mod exportar;
pub mod observaciones;
pub mod solicitudes;
pub mod usuarios;

use std::collections::HashMap;

use bytes::BufMut;
use futures_util::TryStreamExt;
use utoipa::OpenApi;
use uuid::Uuid;
use warp::multipart::FormData;

use crate::shared::errors::{AppError, ErrorType};

pub fn rechazar(err: AppError) -> warp::Rejection {
    warp::reject::custom(err)
}

pub struct ArchivoSubido {
    pub nombre: Option<String>,
    pub datos: Vec<u8>,
}

/// A parsed `multipart/form-data` body: text fields plus at most one file.
pub struct Formulario {
    pub campos: HashMap<String, String>,
    pub archivo: Option<ArchivoSubido>,
}

impl Formulario {
    pub fn campo(&self, nombre: &str) -> Option<&str> {
        self.campos
            .get(nombre)
            .map(|valor| valor.trim())
            .filter(|valor| !valor.is_empty())
    }

    pub fn requerido(&self, nombre: &str) -> Result<&str, AppError> {
        self.campo(nombre).ok_or_else(|| {
            AppError::new(
                &format!("El campo {} es requerido", nombre),
                ErrorType::BadRequest,
            )
        })
    }

    pub fn uuid_opcional(&self, nombre: &str) -> Result<Option<Uuid>, AppError> {
        match self.campo(nombre) {
            None => Ok(None),
            Some(valor) => Uuid::parse_str(valor).map(Some).map_err(|_| {
                AppError::new(
                    &format!("El campo {} no es un identificador válido", nombre),
                    ErrorType::BadRequest,
                )
            }),
        }
    }
}

pub async fn leer_formulario(form: FormData) -> Result<Formulario, AppError> {
    let partes: Vec<warp::multipart::Part> = form.try_collect().await.map_err(|err| {
        AppError::new(
            &format!("Error leyendo el formulario: {}", err),
            ErrorType::BadRequest,
        )
    })?;

    let mut campos = HashMap::new();
    let mut archivo = None;

    for parte in partes {
        let nombre = parte.name().to_string();
        let nombre_archivo = parte.filename().map(str::to_string);

        let datos = parte
            .stream()
            .try_fold(Vec::new(), |mut acumulado, fragmento| {
                acumulado.put(fragmento);
                async move { Ok(acumulado) }
            })
            .await
            .map_err(|err| {
                AppError::new(
                    &format!("Error leyendo el formulario: {}", err),
                    ErrorType::BadRequest,
                )
            })?;

        if nombre_archivo.is_some() {
            if !datos.is_empty() {
                archivo = Some(ArchivoSubido {
                    nombre: nombre_archivo,
                    datos,
                });
            }
        } else {
            campos.insert(nombre, String::from_utf8_lossy(&datos).into_owned());
        }
    }

    Ok(Formulario { campos, archivo })
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login_handler,
        solicitudes::listar_solicitudes_handler,
        estadisticas::estadisticas_handler,
        exportar::exportar_csv_handler,
    ),
    components(schemas(
        crate::shared::errors::ErrorMessage,
        crate::shared::db::models::UsuarioPublico,
        crate::shared::db::models::Sector,
        crate::shared::db::models::Equipo,
        crate::shared::db::models::Observacion,
        crate::shared::db::models::SolicitudDetalle,
        crate::shared::stats::Estadisticas,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    fn formulario_con(campos: &[(&str, &str)]) -> Formulario {
        Formulario {
            campos: campos
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            archivo: None,
        }
    }

    #[test]
    fn campo_vacio_cuenta_como_ausente() {
        let form = formulario_con(&[("descripcion", "   "), ("nombre", " Ana ")]);
        assert_eq!(form.campo("descripcion"), None);
        assert_eq!(form.campo("nombre"), Some("Ana"));
        assert!(form.requerido("descripcion").is_err());
    }

    #[test]
    fn uuid_opcional_valida_el_formato() {
        let id = Uuid::new_v4();
        let form = formulario_con(&[("sector_id", &id.to_string()), ("equipo_id", "no-uuid")]);
        assert_eq!(form.uuid_opcional("sector_id").unwrap(), Some(id));
        assert_eq!(form.uuid_opcional("otro").unwrap(), None);
        assert!(form.uuid_opcional("equipo_id").is_err());
    }
}
