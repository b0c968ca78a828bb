//! Local object storage for uploaded images, served back under `/uploads`.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use crate::shared::config::AlmacenamientoConfig;
use crate::shared::errors::{AppError, ErrorType};

/// Pre-compression cap for avatar uploads.
pub const AVATAR_MAX_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Almacen {
    directorio: PathBuf,
    url_base: String,
}

impl Almacen {
    pub fn new(cfg: &AlmacenamientoConfig) -> Almacen {
        Almacen {
            directorio: PathBuf::from(&cfg.directorio),
            url_base: cfg.url_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn directorio(&self) -> &PathBuf {
        &self.directorio
    }

    /// Writes the bytes under the relative path and returns the public URL.
    pub fn guardar(&self, ruta_relativa: &str, datos: &[u8]) -> Result<String, AppError> {
        let destino = self.directorio.join(ruta_relativa);

        if let Some(padre) = destino.parent() {
            fs::create_dir_all(padre).map_err(|err| {
                AppError::new(
                    &format!("Error creando directorio de imágenes: {}", err),
                    ErrorType::Storage,
                )
            })?;
        }

        fs::write(&destino, datos).map_err(|err| {
            AppError::new(
                &format!("Error al subir imagen: {}", err),
                ErrorType::Storage,
            )
        })?;

        Ok(format!("{}/{}", self.url_base, ruta_relativa))
    }

    /// Avatars live at a fixed per-user path; the cache-busting parameter
    /// makes the browser pick up the overwrite.
    pub fn guardar_avatar(&self, usuario_id: Uuid, ext: &str, datos: &[u8]) -> Result<String, AppError> {
        if datos.len() > AVATAR_MAX_BYTES {
            return Err(AppError::new(
                "El avatar no puede superar 5MB",
                ErrorType::BadRequest,
            ));
        }
        let url = self.guardar(&format!("avatars/{}.{}", usuario_id, ext), datos)?;
        Ok(format!("{}?v={}", url, Utc::now().timestamp()))
    }

    pub fn guardar_imagen_solicitud(
        &self,
        usuario_id: Uuid,
        ext: &str,
        datos: &[u8],
    ) -> Result<String, AppError> {
        self.guardar(
            &format!(
                "solicitudes/{}/{}.{}",
                usuario_id,
                Utc::now().timestamp_millis(),
                ext
            ),
            datos,
        )
    }

    pub fn guardar_imagen_nota(
        &self,
        autor_id: Uuid,
        ext: &str,
        datos: &[u8],
    ) -> Result<String, AppError> {
        self.guardar(
            &format!(
                "notas/{}/{}.{}",
                autor_id,
                Utc::now().timestamp_millis(),
                ext
            ),
            datos,
        )
    }
}

/// Extension inferred from the uploaded file name, with the original's
/// jpg fallback. Only short alphanumeric extensions are trusted; anything
/// else could smuggle a path separator into the storage key.
pub fn extension_de(nombre_archivo: Option<&str>) -> String {
    nombre_archivo
        .and_then(|n| n.rsplit('.').next())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "jpg".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn almacen_temporal() -> (tempfile::TempDir, Almacen) {
        let dir = tempfile::tempdir().unwrap();
        let almacen = Almacen::new(&AlmacenamientoConfig {
            directorio: dir.path().to_string_lossy().to_string(),
            url_base: "http://localhost:3030/uploads/".to_string(),
        });
        (dir, almacen)
    }

    #[test]
    fn guarda_y_devuelve_url_publica() {
        let (dir, almacen) = almacen_temporal();
        let url = almacen.guardar("notas/x/1.png", b"png").unwrap();
        assert_eq!(url, "http://localhost:3030/uploads/notas/x/1.png");
        assert_eq!(fs::read(dir.path().join("notas/x/1.png")).unwrap(), b"png");
    }

    #[test]
    fn avatar_con_cache_busting() {
        let (_dir, almacen) = almacen_temporal();
        let id = Uuid::new_v4();
        let url = almacen.guardar_avatar(id, "png", b"avatar").unwrap();
        assert!(url.contains(&format!("avatars/{}.png?v=", id)));
    }

    #[test]
    fn avatar_sobre_el_limite() {
        let (_dir, almacen) = almacen_temporal();
        let datos = vec![0u8; AVATAR_MAX_BYTES + 1];
        let err = almacen
            .guardar_avatar(Uuid::new_v4(), "png", &datos)
            .unwrap_err();
        assert_eq!(err.err_type, ErrorType::BadRequest);
    }

    #[test]
    fn extension_por_defecto() {
        assert_eq!(extension_de(Some("foto.JPEG")), "jpeg");
        assert_eq!(extension_de(Some("nombre_sin_extension")), "jpg");
        assert_eq!(extension_de(None), "jpg");
    }

    #[test]
    fn extension_con_caracteres_raros_cae_al_defecto() {
        assert_eq!(extension_de(Some("x.p/g")), "jpg");
        assert_eq!(extension_de(Some("x.p\\g")), "jpg");
        assert_eq!(extension_de(Some("x...")), "jpg");
        assert_eq!(extension_de(Some("x.pn-g")), "jpg");
    }
}
