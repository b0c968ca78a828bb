use super::schema;
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::{AsChangeset, Insertable, Queryable};
use diesel::Selectable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::shared::errors::AppError;
use crate::shared::workflow::{Criticidad, Estado, Rol, TipoSolicitud};

// The password hash never leaves the data layer: Usuario is deliberately
// not Serialize; the API surface uses UsuarioPublico.
#[derive(Debug, Clone, Selectable, Queryable)]
#[diesel(table_name = schema::usuarios)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Usuario {
    pub id: Uuid,
    pub username: String,
    pub nombre_completo: Option<String>,
    pub rol: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub activo: bool,
    pub created_at: NaiveDateTime,
}

impl Usuario {
    pub fn rol(&self) -> Result<Rol, AppError> {
        self.rol.parse()
    }

    pub fn nombre_visible(&self) -> String {
        self.nombre_completo
            .clone()
            .unwrap_or_else(|| self.username.clone())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsuarioPublico {
    pub id: Uuid,
    pub username: String,
    pub nombre_completo: Option<String>,
    pub rol: String,
    pub avatar_url: Option<String>,
    pub activo: bool,
    pub created_at: NaiveDateTime,
}

impl From<Usuario> for UsuarioPublico {
    fn from(u: Usuario) -> UsuarioPublico {
        UsuarioPublico {
            id: u.id,
            username: u.username,
            nombre_completo: u.nombre_completo,
            rol: u.rol,
            avatar_url: u.avatar_url,
            activo: u.activo,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schema::usuarios)]
pub struct NuevoUsuario {
    pub username: String,
    pub nombre_completo: Option<String>,
    pub rol: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Selectable, Queryable, ToSchema)]
#[diesel(table_name = schema::sectores)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Sector {
    pub id: Uuid,
    pub nombre: String,
    pub activo: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schema::sectores)]
pub struct NuevoSector {
    pub nombre: String,
}

#[derive(Debug, Clone, Serialize, Selectable, Queryable, ToSchema)]
#[diesel(table_name = schema::equipos_maquinas)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Equipo {
    pub id: Uuid,
    pub nombre: String,
    pub sector_id: Option<Uuid>,
    pub activo: bool,
    pub created_at: NaiveDateTime,
}

/// Equipo with its sector's display name joined in for listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EquipoDetalle {
    #[serde(flatten)]
    pub equipo: Equipo,
    pub sector_nombre: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schema::equipos_maquinas)]
pub struct NuevoEquipo {
    pub nombre: String,
    pub sector_id: Option<Uuid>,
}

#[derive(Debug, Clone, Selectable, Queryable)]
#[diesel(table_name = schema::solicitudes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Solicitud {
    pub id: Uuid,
    pub usuario_id: Uuid,
    pub nombre_solicitante: String,
    pub tipo_solicitud: String,
    pub criticidad: String,
    pub descripcion: String,
    pub imagen_url: Option<String>,
    pub sector_id: Option<Uuid>,
    pub equipo_id: Option<Uuid>,
    pub estado: String,
    pub created_at: NaiveDateTime,
    pub fecha_recepcion_supervisor: Option<NaiveDateTime>,
    pub fecha_vista_supervisor: Option<NaiveDateTime>,
    pub fecha_derivacion_tecnico: Option<NaiveDateTime>,
    pub derivado_por_id: Option<Uuid>,
    pub tecnico_asignado_id: Option<Uuid>,
    pub fecha_vista_tecnico: Option<NaiveDateTime>,
    pub fecha_inicio_trabajo: Option<NaiveDateTime>,
    pub fecha_estimada: Option<NaiveDate>,
    pub fecha_finalizacion: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schema::solicitudes)]
pub struct NuevaSolicitud {
    pub usuario_id: Uuid,
    pub nombre_solicitante: String,
    pub tipo_solicitud: String,
    pub criticidad: String,
    pub descripcion: String,
    pub imagen_url: Option<String>,
    pub sector_id: Option<Uuid>,
    pub equipo_id: Option<Uuid>,
    pub estado: String,
}

/// Administrative override patch: whitelisted fields only, outside the
/// state machine. Absent fields are left untouched.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = schema::solicitudes)]
pub struct CambiosSolicitud {
    pub nombre_solicitante: Option<String>,
    pub tipo_solicitud: Option<String>,
    pub criticidad: Option<String>,
    pub descripcion: Option<String>,
    pub sector_id: Option<Uuid>,
    pub equipo_id: Option<Uuid>,
    pub tecnico_asignado_id: Option<Uuid>,
    pub fecha_estimada: Option<NaiveDate>,
    pub estado: Option<String>,
}

impl CambiosSolicitud {
    pub fn esta_vacio(&self) -> bool {
        self.nombre_solicitante.is_none()
            && self.tipo_solicitud.is_none()
            && self.criticidad.is_none()
            && self.descripcion.is_none()
            && self.sector_id.is_none()
            && self.equipo_id.is_none()
            && self.tecnico_asignado_id.is_none()
            && self.fecha_estimada.is_none()
            && self.estado.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Selectable, Queryable, ToSchema)]
#[diesel(table_name = schema::observaciones)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Observacion {
    pub id: Uuid,
    pub solicitud_id: Uuid,
    pub autor_id: Uuid,
    pub autor_nombre: String,
    pub autor_rol: String,
    pub texto: String,
    pub imagen_url: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schema::observaciones)]
pub struct NuevaObservacion {
    pub solicitud_id: Uuid,
    pub autor_id: Uuid,
    pub autor_nombre: String,
    pub autor_rol: String,
    pub texto: String,
    pub imagen_url: Option<String>,
}

/// Ticket as the API serves it: typed domain enums plus the joined display
/// names the listings and the CSV export need.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SolicitudDetalle {
    pub id: Uuid,
    pub usuario_id: Uuid,
    pub nombre_solicitante: String,
    pub tipo_solicitud: TipoSolicitud,
    pub criticidad: Criticidad,
    pub descripcion: String,
    pub imagen_url: Option<String>,
    pub sector_id: Option<Uuid>,
    pub equipo_id: Option<Uuid>,
    pub estado: Estado,
    pub created_at: NaiveDateTime,
    pub fecha_recepcion_supervisor: Option<NaiveDateTime>,
    pub fecha_vista_supervisor: Option<NaiveDateTime>,
    pub fecha_derivacion_tecnico: Option<NaiveDateTime>,
    pub derivado_por_id: Option<Uuid>,
    pub tecnico_asignado_id: Option<Uuid>,
    pub fecha_vista_tecnico: Option<NaiveDateTime>,
    pub fecha_inicio_trabajo: Option<NaiveDateTime>,
    pub fecha_estimada: Option<NaiveDate>,
    pub fecha_finalizacion: Option<NaiveDateTime>,
    pub usuario_nombre: Option<String>,
    pub tecnico_nombre: Option<String>,
    pub derivado_por_nombre: Option<String>,
    pub sector_nombre: Option<String>,
    pub equipo_nombre: Option<String>,
}

impl SolicitudDetalle {
    pub fn desde_fila(fila: Solicitud) -> Result<SolicitudDetalle, AppError> {
        Ok(SolicitudDetalle {
            tipo_solicitud: fila.tipo_solicitud.parse::<TipoSolicitud>()?,
            criticidad: fila.criticidad.parse::<Criticidad>()?,
            estado: fila.estado.parse::<Estado>()?,
            id: fila.id,
            usuario_id: fila.usuario_id,
            nombre_solicitante: fila.nombre_solicitante,
            descripcion: fila.descripcion,
            imagen_url: fila.imagen_url,
            sector_id: fila.sector_id,
            equipo_id: fila.equipo_id,
            created_at: fila.created_at,
            fecha_recepcion_supervisor: fila.fecha_recepcion_supervisor,
            fecha_vista_supervisor: fila.fecha_vista_supervisor,
            fecha_derivacion_tecnico: fila.fecha_derivacion_tecnico,
            derivado_por_id: fila.derivado_por_id,
            tecnico_asignado_id: fila.tecnico_asignado_id,
            fecha_vista_tecnico: fila.fecha_vista_tecnico,
            fecha_inicio_trabajo: fila.fecha_inicio_trabajo,
            fecha_estimada: fila.fecha_estimada,
            fecha_finalizacion: fila.fecha_finalizacion,
            usuario_nombre: None,
            tecnico_nombre: None,
            derivado_por_nombre: None,
            sector_nombre: None,
            equipo_nombre: None,
        })
    }
}
