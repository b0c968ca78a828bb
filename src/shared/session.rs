//! Session cookie handling.
//!
//! The session is a denormalized snapshot of the user row carried in a signed
//! `user_session` cookie. It must be re-issued whenever one of the projected
//! fields changes; `emitir` is the single issue point (login, profile update
//! and avatar upload all go through it).

use cookie::{time::Duration, Cookie, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::shared::errors::{AppError, ErrorType};
use crate::shared::workflow::Rol;

pub static COOKIE_SESION: &str = "user_session";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Sesion {
    pub id: Uuid,
    pub username: String,
    pub nombre_completo: Option<String>,
    pub rol: Rol,
    pub avatar_url: Option<String>,
    pub exp: usize,
}

impl Sesion {
    /// Display name used when denormalizing the author onto notes.
    pub fn nombre_visible(&self) -> String {
        self.nombre_completo
            .clone()
            .unwrap_or_else(|| self.username.clone())
    }
}

fn ahora_unix() -> Result<u64, AppError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|err| {
            AppError::new(
                &format!("Reloj del sistema inválido: {}", err),
                ErrorType::Internal,
            )
        })
}

/// Builds the signed `Set-Cookie` value for a fresh session.
pub fn emitir(
    id: Uuid,
    username: &str,
    nombre_completo: Option<String>,
    rol: Rol,
    avatar_url: Option<String>,
    secreto: &str,
    duracion_dias: i64,
    segura: bool,
) -> Result<(Sesion, String), AppError> {
    let exp = ahora_unix()? + (duracion_dias as u64) * 24 * 60 * 60;
    let sesion = Sesion {
        id,
        username: username.to_string(),
        nombre_completo,
        rol,
        avatar_url,
        exp: exp as usize,
    };

    let token = encode(
        &Header::default(),
        &sesion,
        &EncodingKey::from_secret(secreto.as_ref()),
    )
    .map_err(|err| {
        AppError::new(
            &format!("Error firmando la sesión: {}", err),
            ErrorType::Internal,
        )
    })?;

    let cookie = Cookie::build((COOKIE_SESION, token))
        .http_only(true)
        .secure(segura)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::days(duracion_dias))
        .build();

    Ok((sesion, cookie.to_string()))
}

/// Expired cookie used by logout.
pub fn cookie_de_cierre(segura: bool) -> String {
    Cookie::build((COOKIE_SESION, ""))
        .http_only(true)
        .secure(segura)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(0))
        .build()
        .to_string()
}

pub fn decodificar(token: &str, secreto: &str) -> Result<Sesion, AppError> {
    let decoding_key = DecodingKey::from_secret(secreto.as_ref());
    let decoded = decode::<Sesion>(token, &decoding_key, &Validation::default()).map_err(|_| {
        AppError::new(
            "Sesión inválida o expirada",
            ErrorType::Unauthorized,
        )
    })?;

    Ok(decoded.claims)
}

/// Finds the session token inside a raw `Cookie` request header.
pub fn token_de_cabecera(header_cookie: &str) -> Option<String> {
    for par in header_cookie.split("; ") {
        if let Ok(parsed) = Cookie::parse(par) {
            if parsed.name() == COOKIE_SESION {
                return Some(parsed.value().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitir_prueba() -> (Sesion, String) {
        emitir(
            Uuid::new_v4(),
            "ana",
            Some("Ana García".to_string()),
            Rol::Solicitante,
            None,
            "secreto-test",
            7,
            false,
        )
        .unwrap()
    }

    #[test]
    fn ida_y_vuelta_de_sesion() {
        let (sesion, cookie) = emitir_prueba();
        let token = token_de_cabecera(&cookie.split(';').next().unwrap().to_string()).unwrap();
        let decodificada = decodificar(&token, "secreto-test").unwrap();
        assert_eq!(decodificada.id, sesion.id);
        assert_eq!(decodificada.username, "ana");
        assert_eq!(decodificada.rol, Rol::Solicitante);
    }

    #[test]
    fn atributos_de_cookie() {
        let (_, cookie) = emitir_prueba();
        assert!(cookie.starts_with("user_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn cookie_segura_en_https() {
        let (_, cookie) = emitir(
            Uuid::new_v4(),
            "ana",
            None,
            Rol::Solicitante,
            None,
            "secreto-test",
            7,
            true,
        )
        .unwrap();
        assert!(cookie.contains("Secure"));
        assert!(cookie_de_cierre(true).contains("Secure"));
        assert!(!cookie_de_cierre(false).contains("Secure"));
    }

    #[test]
    fn token_adulterado_rechazado() {
        let (_, cookie) = emitir_prueba();
        let token = token_de_cabecera(cookie.split(';').next().unwrap()).unwrap();
        assert!(decodificar(&token, "otro-secreto").is_err());
        assert!(decodificar("basura", "secreto-test").is_err());
    }

    #[test]
    fn nombre_visible_cae_al_username() {
        let (mut sesion, _) = emitir_prueba();
        assert_eq!(sesion.nombre_visible(), "Ana García");
        sesion.nombre_completo = None;
        assert_eq!(sesion.nombre_visible(), "ana");
    }

    #[test]
    fn cabecera_con_varias_cookies() {
        assert_eq!(
            token_de_cabecera("otra=1; user_session=abc; mas=2"),
            Some("abc".to_string())
        );
        assert_eq!(token_de_cabecera("otra=1"), None);
    }
}
