pub mod models;
pub mod schema;

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use diesel::{
    pg::PgConnection,
    prelude::*,
    r2d2::{ConnectionManager, Pool, PooledConnection},
};
use uuid::Uuid;

use crate::shared::errors::{AppError, ErrorType};
use crate::shared::workflow::{Estado, Rol};
use models::{
    CambiosSolicitud, Equipo, EquipoDetalle, NuevaObservacion, NuevaSolicitud, NuevoEquipo,
    NuevoSector, NuevoUsuario, Observacion, Sector, Solicitud, SolicitudDetalle, Usuario,
};

type PooledPg = PooledConnection<ConnectionManager<PgConnection>>;

/// Already-parsed ticket listing filters; the query-string layer converts
/// raw strings into this before touching the database.
#[derive(Debug, Default, Clone)]
pub struct FiltroSolicitudes {
    pub estado: Option<Estado>,
    pub tipo_solicitud: Option<crate::shared::workflow::TipoSolicitud>,
    pub criticidad: Option<crate::shared::workflow::Criticidad>,
    pub sector_id: Option<Uuid>,
    pub equipo_id: Option<Uuid>,
    pub busqueda: Option<String>,
    pub desde: Option<NaiveDateTime>,
    pub hasta: Option<NaiveDateTime>,
    pub tecnico_id: Option<Uuid>,
}

pub struct DBAccessManager {
    connection: PooledPg,
}

impl DBAccessManager {
    pub fn new(connection: PooledPg) -> DBAccessManager {
        DBAccessManager { connection }
    }

    // --- usuarios ---

    pub fn buscar_usuario_por_username(&mut self, nombre: &str) -> Result<Option<Usuario>, AppError> {
        use schema::usuarios::dsl::*;

        usuarios
            .filter(username.eq(nombre))
            .filter(activo.eq(true))
            .select(Usuario::as_select())
            .first(&mut self.connection)
            .optional()
            .map_err(|err| AppError::from_diesel_err(err, "Usuario"))
    }

    pub fn buscar_usuario(&mut self, usuario_id: Uuid) -> Result<Option<Usuario>, AppError> {
        use schema::usuarios::dsl::*;

        usuarios
            .filter(id.eq(usuario_id))
            .select(Usuario::as_select())
            .first(&mut self.connection)
            .optional()
            .map_err(|err| AppError::from_diesel_err(err, "Usuario"))
    }

    pub fn crear_usuario(&mut self, nuevo: NuevoUsuario) -> Result<Usuario, AppError> {
        use schema::usuarios::dsl::*;

        diesel::insert_into(usuarios)
            .values(&nuevo)
            .returning(Usuario::as_select())
            .get_result(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "El nombre de usuario"))
    }

    pub fn eliminar_usuario(&mut self, usuario_id: Uuid) -> Result<usize, AppError> {
        use schema::usuarios::dsl::*;

        diesel::delete(usuarios.filter(id.eq(usuario_id)))
            .execute(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Usuario"))
    }

    pub fn listar_usuarios(&mut self) -> Result<Vec<Usuario>, AppError> {
        use schema::usuarios::dsl::*;

        usuarios
            .order(created_at.desc())
            .select(Usuario::as_select())
            .load(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Usuarios"))
    }

    pub fn listar_tecnicos_activos(&mut self) -> Result<Vec<Usuario>, AppError> {
        use schema::usuarios::dsl::*;

        usuarios
            .filter(rol.eq(Rol::Tecnico.as_str()))
            .filter(activo.eq(true))
            .order(username.asc())
            .select(Usuario::as_select())
            .load(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Técnicos"))
    }

    pub fn actualizar_password(&mut self, usuario_id: Uuid, nuevo_hash: &str) -> Result<usize, AppError> {
        use schema::usuarios::dsl::*;

        diesel::update(usuarios.filter(id.eq(usuario_id)))
            .set(password_hash.eq(nuevo_hash))
            .execute(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Usuario"))
    }

    pub fn actualizar_perfil(&mut self, usuario_id: Uuid, nombre: &str) -> Result<Usuario, AppError> {
        use schema::usuarios::dsl::*;

        diesel::update(usuarios.filter(id.eq(usuario_id)))
            .set(nombre_completo.eq(nombre))
            .returning(Usuario::as_select())
            .get_result(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Usuario"))
    }

    pub fn actualizar_avatar(&mut self, usuario_id: Uuid, url: &str) -> Result<Usuario, AppError> {
        use schema::usuarios::dsl::*;

        diesel::update(usuarios.filter(id.eq(usuario_id)))
            .set(avatar_url.eq(url))
            .returning(Usuario::as_select())
            .get_result(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Usuario"))
    }

    // --- sectores ---

    pub fn listar_sectores(&mut self) -> Result<Vec<Sector>, AppError> {
        use schema::sectores::dsl::*;

        sectores
            .order(nombre.asc())
            .select(Sector::as_select())
            .load(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Sectores"))
    }

    pub fn crear_sector(&mut self, nuevo: NuevoSector) -> Result<Sector, AppError> {
        use schema::sectores::dsl::*;

        diesel::insert_into(sectores)
            .values(&nuevo)
            .returning(Sector::as_select())
            .get_result(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "El sector"))
    }

    pub fn actualizar_sector(&mut self, sector_id: Uuid, nuevo_nombre: &str) -> Result<Sector, AppError> {
        use schema::sectores::dsl::*;

        diesel::update(sectores.filter(id.eq(sector_id)))
            .set(nombre.eq(nuevo_nombre))
            .returning(Sector::as_select())
            .get_result(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "El sector"))
    }

    /// Referential guard: a sector with active equipment cannot be removed;
    /// the error lists the equipment still pointing at it.
    pub fn desactivar_sector(&mut self, id_sector: Uuid) -> Result<(), AppError> {
        let equipos_activos: Vec<String> = schema::equipos_maquinas::table
            .filter(schema::equipos_maquinas::sector_id.eq(id_sector))
            .filter(schema::equipos_maquinas::activo.eq(true))
            .select(schema::equipos_maquinas::nombre)
            .load(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Equipos"))?;

        if !equipos_activos.is_empty() {
            return Err(AppError::new(
                &format!(
                    "No se puede eliminar el sector: tiene equipos activos ({})",
                    equipos_activos.join(", ")
                ),
                ErrorType::Conflict,
            ));
        }

        let filas = diesel::update(
            schema::sectores::table.filter(schema::sectores::id.eq(id_sector)),
        )
        .set(schema::sectores::activo.eq(false))
        .execute(&mut self.connection)
        .map_err(|err| AppError::from_diesel_err(err, "El sector"))?;

        if filas == 0 {
            return Err(AppError::new("Sector no encontrado", ErrorType::NotFound));
        }
        Ok(())
    }

    // --- equipos / máquinas ---

    pub fn listar_equipos(&mut self) -> Result<Vec<EquipoDetalle>, AppError> {
        let filas: Vec<(Equipo, Option<String>)> = schema::equipos_maquinas::table
            .left_join(schema::sectores::table)
            .order(schema::equipos_maquinas::nombre.asc())
            .select((Equipo::as_select(), schema::sectores::nombre.nullable()))
            .load(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Equipos"))?;

        Ok(filas
            .into_iter()
            .map(|(equipo, sector_nombre)| EquipoDetalle {
                equipo,
                sector_nombre,
            })
            .collect())
    }

    pub fn crear_equipo(&mut self, nuevo: NuevoEquipo) -> Result<Equipo, AppError> {
        use schema::equipos_maquinas::dsl::*;

        diesel::insert_into(equipos_maquinas)
            .values(&nuevo)
            .returning(Equipo::as_select())
            .get_result(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "El equipo"))
    }

    pub fn actualizar_equipo(
        &mut self,
        equipo_id: Uuid,
        nuevo_nombre: &str,
        nuevo_sector: Option<Uuid>,
    ) -> Result<Equipo, AppError> {
        use schema::equipos_maquinas::dsl::*;

        diesel::update(equipos_maquinas.filter(id.eq(equipo_id)))
            .set((nombre.eq(nuevo_nombre), sector_id.eq(nuevo_sector)))
            .returning(Equipo::as_select())
            .get_result(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "El equipo"))
    }

    pub fn desactivar_equipo(&mut self, equipo_id: Uuid) -> Result<usize, AppError> {
        use schema::equipos_maquinas::dsl::*;

        diesel::update(equipos_maquinas.filter(id.eq(equipo_id)))
            .set(activo.eq(false))
            .execute(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "El equipo"))
    }

    // --- solicitudes ---

    pub fn crear_solicitud(&mut self, nueva: NuevaSolicitud) -> Result<Solicitud, AppError> {
        use schema::solicitudes::dsl::*;

        diesel::insert_into(solicitudes)
            .values(&nueva)
            .returning(Solicitud::as_select())
            .get_result(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "La solicitud"))
    }

    pub fn buscar_solicitud(&mut self, solicitud_id: Uuid) -> Result<Option<Solicitud>, AppError> {
        use schema::solicitudes::dsl::*;

        solicitudes
            .filter(id.eq(solicitud_id))
            .select(Solicitud::as_select())
            .first(&mut self.connection)
            .optional()
            .map_err(|err| AppError::from_diesel_err(err, "Solicitud"))
    }

    pub fn estado_solicitud(&mut self, solicitud_id: Uuid) -> Result<Option<Estado>, AppError> {
        use schema::solicitudes::dsl::*;

        let fila: Option<String> = solicitudes
            .filter(id.eq(solicitud_id))
            .select(estado)
            .first(&mut self.connection)
            .optional()
            .map_err(|err| AppError::from_diesel_err(err, "Solicitud"))?;

        match fila {
            None => Ok(None),
            Some(valor) => Ok(Some(valor.parse()?)),
        }
    }

    pub fn listar_solicitudes(&mut self, filtro: &FiltroSolicitudes) -> Result<Vec<Solicitud>, AppError> {
        use schema::solicitudes::dsl::*;

        let mut consulta = solicitudes.into_boxed();

        if let Some(valor) = filtro.estado {
            consulta = consulta.filter(estado.eq(valor.as_str()));
        }
        if let Some(valor) = filtro.tipo_solicitud {
            consulta = consulta.filter(tipo_solicitud.eq(valor.as_str()));
        }
        if let Some(valor) = filtro.criticidad {
            consulta = consulta.filter(criticidad.eq(valor.as_str()));
        }
        if let Some(valor) = filtro.sector_id {
            consulta = consulta.filter(sector_id.eq(valor));
        }
        if let Some(valor) = filtro.equipo_id {
            consulta = consulta.filter(equipo_id.eq(valor));
        }
        if let Some(texto) = &filtro.busqueda {
            consulta = consulta.filter(nombre_solicitante.ilike(format!("%{}%", texto)));
        }
        if let Some(valor) = filtro.desde {
            consulta = consulta.filter(created_at.ge(valor));
        }
        if let Some(valor) = filtro.hasta {
            consulta = consulta.filter(created_at.le(valor));
        }
        if let Some(valor) = filtro.tecnico_id {
            consulta = consulta.filter(tecnico_asignado_id.eq(valor));
        }

        consulta
            .order(created_at.desc())
            .select(Solicitud::as_select())
            .load(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Solicitudes"))
    }

    pub fn solicitudes_de_usuario(&mut self, id_usuario: Uuid) -> Result<Vec<Solicitud>, AppError> {
        use schema::solicitudes::dsl::*;

        solicitudes
            .filter(usuario_id.eq(id_usuario))
            .order(created_at.desc())
            .select(Solicitud::as_select())
            .load(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Solicitudes"))
    }

    /// Attaches requester/technician/deriver/sector/equipo display names to
    /// raw rows with three batched lookups instead of a five-way join.
    pub fn detallar_solicitudes(
        &mut self,
        filas: Vec<Solicitud>,
    ) -> Result<Vec<SolicitudDetalle>, AppError> {
        let mut ids_usuarios: HashSet<Uuid> = HashSet::new();
        let mut ids_sectores: HashSet<Uuid> = HashSet::new();
        let mut ids_equipos: HashSet<Uuid> = HashSet::new();

        for fila in &filas {
            ids_usuarios.insert(fila.usuario_id);
            ids_usuarios.extend(fila.tecnico_asignado_id);
            ids_usuarios.extend(fila.derivado_por_id);
            ids_sectores.extend(fila.sector_id);
            ids_equipos.extend(fila.equipo_id);
        }

        let nombres_usuarios = self.nombres_de_usuarios(&ids_usuarios)?;
        let nombres_sectores = self.nombres_de_sectores(&ids_sectores)?;
        let nombres_equipos = self.nombres_de_equipos(&ids_equipos)?;

        let mut detalles = Vec::with_capacity(filas.len());
        for fila in filas {
            let mut detalle = SolicitudDetalle::desde_fila(fila)?;
            detalle.usuario_nombre = nombres_usuarios.get(&detalle.usuario_id).cloned();
            detalle.tecnico_nombre = detalle
                .tecnico_asignado_id
                .and_then(|tid| nombres_usuarios.get(&tid).cloned());
            detalle.derivado_por_nombre = detalle
                .derivado_por_id
                .and_then(|did| nombres_usuarios.get(&did).cloned());
            detalle.sector_nombre = detalle
                .sector_id
                .and_then(|sid| nombres_sectores.get(&sid).cloned());
            detalle.equipo_nombre = detalle
                .equipo_id
                .and_then(|eid| nombres_equipos.get(&eid).cloned());
            detalles.push(detalle);
        }

        Ok(detalles)
    }

    fn nombres_de_usuarios(
        &mut self,
        ids: &HashSet<Uuid>,
    ) -> Result<HashMap<Uuid, String>, AppError> {
        use schema::usuarios::dsl::*;

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let buscados: Vec<Uuid> = ids.iter().copied().collect();
        let filas: Vec<(Uuid, String, Option<String>)> = usuarios
            .filter(id.eq_any(buscados))
            .select((id, username, nombre_completo))
            .load(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Usuarios"))?;

        Ok(filas
            .into_iter()
            .map(|(uid, usuario, nombre)| (uid, nombre.unwrap_or(usuario)))
            .collect())
    }

    fn nombres_de_sectores(
        &mut self,
        ids: &HashSet<Uuid>,
    ) -> Result<HashMap<Uuid, String>, AppError> {
        use schema::sectores::dsl::*;

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let buscados: Vec<Uuid> = ids.iter().copied().collect();
        let filas: Vec<(Uuid, String)> = sectores
            .filter(id.eq_any(buscados))
            .select((id, nombre))
            .load(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Sectores"))?;

        Ok(filas.into_iter().collect())
    }

    fn nombres_de_equipos(
        &mut self,
        ids: &HashSet<Uuid>,
    ) -> Result<HashMap<Uuid, String>, AppError> {
        use schema::equipos_maquinas::dsl::*;

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let buscados: Vec<Uuid> = ids.iter().copied().collect();
        let filas: Vec<(Uuid, String)> = equipos_maquinas
            .filter(id.eq_any(buscados))
            .select((id, nombre))
            .load(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Equipos"))?;

        Ok(filas.into_iter().collect())
    }

    // --- transiciones del flujo ---
    //
    // Every transition UPDATE is guarded on the expected prior estado, so a
    // lost race can never regress timestamps; the caller inspects the row
    // count to distinguish "done", "already done" and "wrong state".

    pub fn recepcionar_solicitud(
        &mut self,
        solicitud_id: Uuid,
        ahora: NaiveDateTime,
    ) -> Result<usize, AppError> {
        use schema::solicitudes::dsl::*;

        diesel::update(
            solicitudes
                .filter(id.eq(solicitud_id))
                .filter(estado.eq(Estado::Pendiente.as_str())),
        )
        .set((
            estado.eq(Estado::Recibida.as_str()),
            fecha_recepcion_supervisor.eq(ahora),
            fecha_vista_supervisor.eq(ahora),
        ))
        .execute(&mut self.connection)
        .map_err(|err| AppError::from_diesel_err(err, "Solicitud"))
    }

    pub fn derivar_solicitud(
        &mut self,
        solicitud_id: Uuid,
        id_tecnico: Uuid,
        id_derivador: Uuid,
        estimada: Option<NaiveDate>,
        ahora: NaiveDateTime,
    ) -> Result<usize, AppError> {
        use schema::solicitudes::dsl::*;

        let objetivo = solicitudes
            .filter(id.eq(solicitud_id))
            .filter(estado.eq(Estado::Recibida.as_str()));

        let resultado = if let Some(fecha) = estimada {
            diesel::update(objetivo)
                .set((
                    estado.eq(Estado::Derivada.as_str()),
                    tecnico_asignado_id.eq(id_tecnico),
                    derivado_por_id.eq(id_derivador),
                    fecha_derivacion_tecnico.eq(ahora),
                    fecha_estimada.eq(fecha),
                ))
                .execute(&mut self.connection)
        } else {
            diesel::update(objetivo)
                .set((
                    estado.eq(Estado::Derivada.as_str()),
                    tecnico_asignado_id.eq(id_tecnico),
                    derivado_por_id.eq(id_derivador),
                    fecha_derivacion_tecnico.eq(ahora),
                ))
                .execute(&mut self.connection)
        };

        resultado.map_err(|err| AppError::from_diesel_err(err, "Solicitud"))
    }

    pub fn iniciar_trabajo(
        &mut self,
        solicitud_id: Uuid,
        estimada: Option<NaiveDate>,
        ahora: NaiveDateTime,
    ) -> Result<usize, AppError> {
        use schema::solicitudes::dsl::*;

        let objetivo = solicitudes
            .filter(id.eq(solicitud_id))
            .filter(estado.eq(Estado::Derivada.as_str()));

        let resultado = if let Some(fecha) = estimada {
            diesel::update(objetivo)
                .set((
                    estado.eq(Estado::EnProceso.as_str()),
                    fecha_inicio_trabajo.eq(ahora),
                    fecha_vista_tecnico.eq(ahora),
                    fecha_estimada.eq(fecha),
                ))
                .execute(&mut self.connection)
        } else {
            diesel::update(objetivo)
                .set((
                    estado.eq(Estado::EnProceso.as_str()),
                    fecha_inicio_trabajo.eq(ahora),
                    fecha_vista_tecnico.eq(ahora),
                ))
                .execute(&mut self.connection)
        };

        resultado.map_err(|err| AppError::from_diesel_err(err, "Solicitud"))
    }

    pub fn finalizar_solicitud(
        &mut self,
        solicitud_id: Uuid,
        ahora: NaiveDateTime,
    ) -> Result<usize, AppError> {
        use schema::solicitudes::dsl::*;

        diesel::update(
            solicitudes
                .filter(id.eq(solicitud_id))
                .filter(estado.eq(Estado::EnProceso.as_str())),
        )
        .set((
            estado.eq(Estado::Finalizada.as_str()),
            fecha_finalizacion.eq(ahora),
        ))
        .execute(&mut self.connection)
        .map_err(|err| AppError::from_diesel_err(err, "Solicitud"))
    }

    /// First-viewed timestamps are write-once: the guard on NULL makes the
    /// mark-seen command idempotent.
    pub fn marcar_vista_supervisor(
        &mut self,
        solicitud_id: Uuid,
        ahora: NaiveDateTime,
    ) -> Result<usize, AppError> {
        use schema::solicitudes::dsl::*;

        diesel::update(
            solicitudes
                .filter(id.eq(solicitud_id))
                .filter(fecha_vista_supervisor.is_null()),
        )
        .set(fecha_vista_supervisor.eq(ahora))
        .execute(&mut self.connection)
        .map_err(|err| AppError::from_diesel_err(err, "Solicitud"))
    }

    pub fn marcar_vista_tecnico(
        &mut self,
        solicitud_id: Uuid,
        ahora: NaiveDateTime,
    ) -> Result<usize, AppError> {
        use schema::solicitudes::dsl::*;

        diesel::update(
            solicitudes
                .filter(id.eq(solicitud_id))
                .filter(fecha_vista_tecnico.is_null()),
        )
        .set(fecha_vista_tecnico.eq(ahora))
        .execute(&mut self.connection)
        .map_err(|err| AppError::from_diesel_err(err, "Solicitud"))
    }

    pub fn actualizar_solicitud(
        &mut self,
        solicitud_id: Uuid,
        cambios: &CambiosSolicitud,
    ) -> Result<usize, AppError> {
        use schema::solicitudes::dsl::*;

        diesel::update(solicitudes.filter(id.eq(solicitud_id)))
            .set(cambios)
            .execute(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Solicitud"))
    }

    pub fn eliminar_solicitud(&mut self, id_solicitud: Uuid) -> Result<usize, AppError> {
        self.connection
            .transaction::<usize, diesel::result::Error, _>(|conn| {
                diesel::delete(
                    schema::observaciones::table
                        .filter(schema::observaciones::solicitud_id.eq(id_solicitud)),
                )
                .execute(conn)?;
                diesel::delete(
                    schema::solicitudes::table.filter(schema::solicitudes::id.eq(id_solicitud)),
                )
                .execute(conn)
            })
            .map_err(|err| AppError::from_diesel_err(err, "Solicitud"))
    }

    // --- observaciones ---

    pub fn listar_observaciones(
        &mut self,
        id_solicitud: Uuid,
    ) -> Result<Vec<Observacion>, AppError> {
        use schema::observaciones::dsl::*;

        observaciones
            .filter(solicitud_id.eq(id_solicitud))
            .order(created_at.asc())
            .select(Observacion::as_select())
            .load(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Observaciones"))
    }

    pub fn crear_observacion(&mut self, nueva: NuevaObservacion) -> Result<Observacion, AppError> {
        use schema::observaciones::dsl::*;

        diesel::insert_into(observaciones)
            .values(&nueva)
            .returning(Observacion::as_select())
            .get_result(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "La observación"))
    }

    pub fn buscar_observacion(
        &mut self,
        observacion_id: Uuid,
    ) -> Result<Option<Observacion>, AppError> {
        use schema::observaciones::dsl::*;

        observaciones
            .filter(id.eq(observacion_id))
            .select(Observacion::as_select())
            .first(&mut self.connection)
            .optional()
            .map_err(|err| AppError::from_diesel_err(err, "Observación"))
    }

    pub fn eliminar_observacion(&mut self, observacion_id: Uuid) -> Result<usize, AppError> {
        use schema::observaciones::dsl::*;

        diesel::delete(observaciones.filter(id.eq(observacion_id)))
            .execute(&mut self.connection)
            .map_err(|err| AppError::from_diesel_err(err, "Observación"))
    }
}

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub fn pg_pool() -> Result<PgPool, AppError> {
    let db_url = std::env::var("DATABASE_URL").map_err(|_| {
        AppError::new(
            "La variable de entorno DATABASE_URL es requerida",
            ErrorType::Internal,
        )
    })?;

    let manager = ConnectionManager::<PgConnection>::new(&db_url);
    Pool::new(manager).map_err(|err| {
        AppError::new(
            &format!("No se pudo crear el pool de Postgres: {}", err),
            ErrorType::Internal,
        )
    })
}
