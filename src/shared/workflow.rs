//! Domain types and the ticket state machine.
//!
//! The workflow is linear and forward-only:
//! Pendiente -> Recibida -> Derivada -> En proceso -> Finalizada.
//! Each named transition has exactly one allowed prior state and a fixed set
//! of roles that may execute it; everything else goes through the
//! administrative override, which is not part of the state machine.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use std::fmt;
use std::str::FromStr;

use crate::shared::errors::{AppError, ErrorType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Admin,
    Supervisor,
    Tecnico,
    Solicitante,
}

impl Rol {
    pub const TODOS: [Rol; 4] = [Rol::Admin, Rol::Supervisor, Rol::Tecnico, Rol::Solicitante];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Admin => "admin",
            Rol::Supervisor => "supervisor",
            Rol::Tecnico => "tecnico",
            Rol::Solicitante => "solicitante",
        }
    }

    /// Admin or supervisor: the roles that triage tickets and manage catalogs.
    pub fn es_gestor(&self) -> bool {
        matches!(self, Rol::Admin | Rol::Supervisor)
    }
}

impl fmt::Display for Rol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rol {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Rol::Admin),
            "supervisor" => Ok(Rol::Supervisor),
            "tecnico" => Ok(Rol::Tecnico),
            "solicitante" => Ok(Rol::Solicitante),
            otro => Err(AppError::new(
                &format!("Rol inválido: {}", otro),
                ErrorType::BadRequest,
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Estado {
    Pendiente,
    Recibida,
    Derivada,
    #[serde(rename = "En proceso")]
    EnProceso,
    Finalizada,
}

impl Estado {
    pub const TODOS: [Estado; 5] = [
        Estado::Pendiente,
        Estado::Recibida,
        Estado::Derivada,
        Estado::EnProceso,
        Estado::Finalizada,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Estado::Pendiente => "Pendiente",
            Estado::Recibida => "Recibida",
            Estado::Derivada => "Derivada",
            Estado::EnProceso => "En proceso",
            Estado::Finalizada => "Finalizada",
        }
    }

    /// Position in the linear workflow, for forward-only comparisons.
    pub fn indice(&self) -> usize {
        match self {
            Estado::Pendiente => 0,
            Estado::Recibida => 1,
            Estado::Derivada => 2,
            Estado::EnProceso => 3,
            Estado::Finalizada => 4,
        }
    }
}

impl fmt::Display for Estado {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Estado {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pendiente" => Ok(Estado::Pendiente),
            "Recibida" => Ok(Estado::Recibida),
            "Derivada" => Ok(Estado::Derivada),
            "En proceso" => Ok(Estado::EnProceso),
            "Finalizada" => Ok(Estado::Finalizada),
            otro => Err(AppError::new(
                &format!("Estado inválido: {}", otro),
                ErrorType::BadRequest,
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Criticidad {
    Bajo,
    Medio,
    Alto,
    #[serde(rename = "Crítico")]
    Critico,
}

impl Criticidad {
    pub const TODAS: [Criticidad; 4] = [
        Criticidad::Bajo,
        Criticidad::Medio,
        Criticidad::Alto,
        Criticidad::Critico,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criticidad::Bajo => "Bajo",
            Criticidad::Medio => "Medio",
            Criticidad::Alto => "Alto",
            Criticidad::Critico => "Crítico",
        }
    }
}

impl fmt::Display for Criticidad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criticidad {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bajo" => Ok(Criticidad::Bajo),
            "Medio" => Ok(Criticidad::Medio),
            "Alto" => Ok(Criticidad::Alto),
            "Crítico" => Ok(Criticidad::Critico),
            otro => Err(AppError::new(
                &format!("Criticidad inválida: {}", otro),
                ErrorType::BadRequest,
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TipoSolicitud {
    #[serde(rename = "Reparación/Acondicionamiento")]
    Reparacion,
    #[serde(rename = "Oportunidad a Mejora")]
    Mejora,
    #[serde(rename = "Inversión")]
    Inversion,
}

impl TipoSolicitud {
    pub const TODOS: [TipoSolicitud; 3] = [
        TipoSolicitud::Reparacion,
        TipoSolicitud::Mejora,
        TipoSolicitud::Inversion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TipoSolicitud::Reparacion => "Reparación/Acondicionamiento",
            TipoSolicitud::Mejora => "Oportunidad a Mejora",
            TipoSolicitud::Inversion => "Inversión",
        }
    }
}

impl fmt::Display for TipoSolicitud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TipoSolicitud {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Reparación/Acondicionamiento" => Ok(TipoSolicitud::Reparacion),
            "Oportunidad a Mejora" => Ok(TipoSolicitud::Mejora),
            "Inversión" => Ok(TipoSolicitud::Inversion),
            otro => Err(AppError::new(
                &format!("Tipo de solicitud inválido: {}", otro),
                ErrorType::BadRequest,
            )),
        }
    }
}

/// The four named transitions of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transicion {
    Recepcionar,
    Derivar,
    IniciarTrabajo,
    Finalizar,
}

impl Transicion {
    pub const TODAS: [Transicion; 4] = [
        Transicion::Recepcionar,
        Transicion::Derivar,
        Transicion::IniciarTrabajo,
        Transicion::Finalizar,
    ];

    /// The only estado from which this transition may fire.
    pub fn estado_previo(&self) -> Estado {
        match self {
            Transicion::Recepcionar => Estado::Pendiente,
            Transicion::Derivar => Estado::Recibida,
            Transicion::IniciarTrabajo => Estado::Derivada,
            Transicion::Finalizar => Estado::EnProceso,
        }
    }

    pub fn estado_resultante(&self) -> Estado {
        match self {
            Transicion::Recepcionar => Estado::Recibida,
            Transicion::Derivar => Estado::Derivada,
            Transicion::IniciarTrabajo => Estado::EnProceso,
            Transicion::Finalizar => Estado::Finalizada,
        }
    }

    pub fn permitida_para(&self, rol: Rol) -> bool {
        match self {
            Transicion::Recepcionar | Transicion::Derivar => rol.es_gestor(),
            Transicion::IniciarTrabajo | Transicion::Finalizar => {
                rol.es_gestor() || rol == Rol::Tecnico
            }
        }
    }

    pub fn nombre(&self) -> &'static str {
        match self {
            Transicion::Recepcionar => "recepcionar",
            Transicion::Derivar => "derivar",
            Transicion::IniciarTrabajo => "iniciar trabajo",
            Transicion::Finalizar => "finalizar",
        }
    }
}

/// Role check shared by every transition handler.
pub fn autorizar_transicion(transicion: Transicion, rol: Rol) -> Result<(), AppError> {
    if transicion.permitida_para(rol) {
        Ok(())
    } else {
        Err(AppError::new(
            &format!("El rol {} no puede {}", rol, transicion.nombre()),
            ErrorType::Forbidden,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flujo_lineal_sin_saltos() {
        for t in Transicion::TODAS {
            assert_eq!(
                t.estado_previo().indice() + 1,
                t.estado_resultante().indice()
            );
        }
    }

    #[test]
    fn secuencia_completa() {
        // Pendiente -> Recibida -> Derivada -> En proceso -> Finalizada
        let mut estado = Estado::Pendiente;
        for t in Transicion::TODAS {
            assert_eq!(t.estado_previo(), estado);
            estado = t.estado_resultante();
        }
        assert_eq!(estado, Estado::Finalizada);
    }

    #[test]
    fn recepcionar_y_derivar_solo_gestores() {
        for t in [Transicion::Recepcionar, Transicion::Derivar] {
            assert!(t.permitida_para(Rol::Admin));
            assert!(t.permitida_para(Rol::Supervisor));
            assert!(!t.permitida_para(Rol::Tecnico));
            assert!(!t.permitida_para(Rol::Solicitante));
        }
    }

    #[test]
    fn iniciar_y_finalizar_incluyen_tecnico() {
        for t in [Transicion::IniciarTrabajo, Transicion::Finalizar] {
            assert!(t.permitida_para(Rol::Admin));
            assert!(t.permitida_para(Rol::Supervisor));
            assert!(t.permitida_para(Rol::Tecnico));
            assert!(!t.permitida_para(Rol::Solicitante));
        }
    }

    #[test]
    fn autorizar_rechaza_con_forbidden() {
        let err = autorizar_transicion(Transicion::Recepcionar, Rol::Tecnico).unwrap_err();
        assert_eq!(err.err_type, crate::shared::errors::ErrorType::Forbidden);
        assert!(autorizar_transicion(Transicion::Finalizar, Rol::Tecnico).is_ok());
    }

    #[test]
    fn estados_ida_y_vuelta_por_nombre() {
        for e in Estado::TODOS {
            assert_eq!(e.as_str().parse::<Estado>().unwrap(), e);
        }
        assert!("Cancelada".parse::<Estado>().is_err());
    }

    #[test]
    fn roles_ida_y_vuelta_por_nombre() {
        for r in Rol::TODOS {
            assert_eq!(r.as_str().parse::<Rol>().unwrap(), r);
        }
        assert!("gerente".parse::<Rol>().is_err());
    }

    #[test]
    fn nombres_exactos_del_dominio() {
        assert_eq!(Estado::EnProceso.as_str(), "En proceso");
        assert_eq!(Criticidad::Critico.as_str(), "Crítico");
        assert_eq!(
            TipoSolicitud::Reparacion.as_str(),
            "Reparación/Acondicionamiento"
        );
        assert_eq!(TipoSolicitud::Inversion.as_str(), "Inversión");
    }

    #[test]
    fn serde_usa_los_nombres_del_dominio() {
        let json = serde_json::to_string(&Estado::EnProceso).unwrap();
        assert_eq!(json, "\"En proceso\"");
        let rol: Rol = serde_json::from_str("\"solicitante\"").unwrap();
        assert_eq!(rol, Rol::Solicitante);
    }
}
