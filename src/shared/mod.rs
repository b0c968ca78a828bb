pub mod config;
pub mod db;
pub mod errors;
pub mod gate;
pub mod security;
pub mod session;
pub mod stats;
pub mod storage;
pub mod workflow;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::shared::errors::{AppError, ErrorType};

/// The organization operates on Argentina time (UTC-3); timestamps are
/// stored in UTC and converted at the edges.
pub const DESFASE_LOCAL_HORAS: i64 = -3;

pub fn a_hora_local(utc: NaiveDateTime) -> NaiveDateTime {
    utc + Duration::hours(DESFASE_LOCAL_HORAS)
}

fn local_a_utc(local: NaiveDateTime) -> NaiveDateTime {
    local - Duration::hours(DESFASE_LOCAL_HORAS)
}

/// Parses a `dd/mm/yyyy` filter bound and returns the UTC instant of the
/// local start of day (or end of day for the upper bound).
pub fn limite_de_fecha(texto: &str, fin_de_dia: bool) -> Result<NaiveDateTime, AppError> {
    let fecha = NaiveDate::parse_from_str(texto.trim(), "%d/%m/%Y").map_err(|_| {
        AppError::new(
            &format!("Fecha inválida (se espera dd/mm/yyyy): {}", texto),
            ErrorType::BadRequest,
        )
    })?;

    let local = if fin_de_dia {
        fecha.and_hms_opt(23, 59, 59)
    } else {
        fecha.and_hms_opt(0, 0, 0)
    };

    local
        .map(local_a_utc)
        .ok_or_else(|| AppError::new("Fecha inválida", ErrorType::Internal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limites_de_dia_en_utc() {
        let desde = limite_de_fecha("10/03/2025", false).unwrap();
        assert_eq!(desde.to_string(), "2025-03-10 03:00:00");

        let hasta = limite_de_fecha("10/03/2025", true).unwrap();
        assert_eq!(hasta.to_string(), "2025-03-11 02:59:59");
    }

    #[test]
    fn formato_invalido() {
        assert!(limite_de_fecha("2025-03-10", false).is_err());
        assert!(limite_de_fecha("32/01/2025", false).is_err());
    }

    #[test]
    fn ida_y_vuelta_local() {
        let utc = limite_de_fecha("01/06/2025", false).unwrap();
        assert_eq!(a_hora_local(utc).to_string(), "2025-06-01 00:00:00");
    }
}
