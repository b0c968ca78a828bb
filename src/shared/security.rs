use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::shared::errors::{AppError, ErrorType};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| {
            AppError::new(
                &format!("Error generando hash de contraseña: {}", err),
                ErrorType::Internal,
            )
        })?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(stored_hash).map_err(|err| {
        AppError::new(
            &format!("Hash de contraseña corrupto: {}", err),
            ErrorType::Internal,
        )
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Password policy shared by user creation and both password-change paths:
/// at least 5 characters, no whitespace.
pub fn validar_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < 5 {
        return Err(AppError::new(
            "La contraseña debe tener más de 4 caracteres",
            ErrorType::BadRequest,
        ));
    }
    if password.contains(char::is_whitespace) {
        return Err(AppError::new(
            "La contraseña no puede contener espacios",
            ErrorType::BadRequest,
        ));
    }
    Ok(())
}

pub fn validar_username(username: &str) -> Result<(), AppError> {
    if username.trim().is_empty() {
        return Err(AppError::new(
            "El nombre de usuario es requerido",
            ErrorType::BadRequest,
        ));
    }
    if username.contains(char::is_whitespace) {
        return Err(AppError::new(
            "El nombre de usuario no puede contener espacios",
            ErrorType::BadRequest,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_y_verificacion() {
        let hash = hash_password("secreta1").unwrap();
        assert!(verify_password("secreta1", &hash).unwrap());
        assert!(!verify_password("otra", &hash).unwrap());
    }

    #[test]
    fn password_corta_rechazada() {
        assert!(validar_password("abcd").is_err());
        assert!(validar_password("abcde").is_ok());
    }

    #[test]
    fn password_con_espacio_rechazada() {
        assert!(validar_password("abc de").is_err());
    }

    #[test]
    fn username_con_espacio_rechazado() {
        assert!(validar_username("juan perez").is_err());
        assert!(validar_username("jperez").is_ok());
        assert!(validar_username("  ").is_err());
    }
}
