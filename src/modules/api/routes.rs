use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use warp::Filter;
use warp_rate_limit::{with_rate_limit, RateLimitConfig};

use super::filters::{
    self, with_almacen, with_db_access_manager, with_json_body, with_sesion, with_sesion_config,
};
use super::handlers;
use super::ws::{self, Suscriptores};
use crate::shared::config::Configs;
use crate::shared::db::PgPool;
use crate::shared::storage::Almacen;

/// Una foto de celular sin recomprimir entra en 10 MB.
const MAX_SUBIDA_BYTES: u64 = 10 * 1024 * 1024;

/// Query string del listado, las estadísticas y la exportación. Todo llega
/// como texto y se valida en el handler.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ConsultaSolicitudes {
    pub estado: Option<String>,
    pub tipo_solicitud: Option<String>,
    pub criticidad: Option<String>,
    pub sector_id: Option<Uuid>,
    pub equipo_id: Option<Uuid>,
    pub busqueda: Option<String>,
    /// dd/mm/yyyy
    pub fecha_desde: Option<String>,
    /// dd/mm/yyyy
    pub fecha_hasta: Option<String>,
    pub tecnico_id: Option<Uuid>,
}

pub fn rutas_auth(
    pool: PgPool,
    almacen: Almacen,
    configs: &Configs,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let cfg = configs.sesion.clone();
    let limite_login = RateLimitConfig::max_per_window(5, 5 * 60);

    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(with_rate_limit(limite_login))
        .and(with_json_body::<handlers::auth::LoginBody>())
        .and(with_db_access_manager(pool.clone()))
        .and(with_sesion_config(cfg.clone()))
        .and_then(handlers::auth::login_handler);

    let logout = warp::path!("auth" / "logout")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(with_sesion_config(cfg.clone()))
        .and_then(handlers::auth::logout_handler);

    let destino = warp::path!("auth" / "destino")
        .and(warp::get())
        .and(warp::query::<handlers::auth::DestinoQuery>())
        .and(filters::with_sesion_opcional(cfg.clone()))
        .and_then(handlers::auth::destino_handler);

    let sesion = warp::path!("auth" / "sesion")
        .and(warp::get())
        .and(with_sesion(cfg.clone()))
        .and_then(handlers::auth::sesion_handler);

    let password = warp::path!("auth" / "password")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(with_json_body::<handlers::auth::CambiarPasswordBody>())
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::auth::cambiar_password_handler);

    let perfil = warp::path!("perfil")
        .and(warp::put())
        .and(with_sesion(cfg.clone()))
        .and(with_json_body::<handlers::auth::PerfilBody>())
        .and(with_db_access_manager(pool.clone()))
        .and(with_sesion_config(cfg.clone()))
        .and_then(handlers::auth::actualizar_perfil_handler);

    let avatar = warp::path!("perfil" / "avatar")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(warp::multipart::form().max_length(MAX_SUBIDA_BYTES))
        .and(with_db_access_manager(pool))
        .and(with_almacen(almacen))
        .and(with_sesion_config(cfg))
        .and_then(handlers::auth::subir_avatar_handler);

    login
        .or(logout)
        .or(destino)
        .or(sesion)
        .or(password)
        .or(perfil)
        .or(avatar)
}

pub fn rutas_usuarios(
    pool: PgPool,
    configs: &Configs,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let cfg = configs.sesion.clone();

    let listar = warp::path!("usuarios")
        .and(warp::get())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::usuarios::listar_usuarios_handler);

    let tecnicos = warp::path!("usuarios" / "tecnicos")
        .and(warp::get())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::usuarios::listar_tecnicos_handler);

    let crear = warp::path!("usuarios")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(with_json_body::<handlers::usuarios::CrearUsuarioBody>())
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::usuarios::crear_usuario_handler);

    let eliminar = warp::path!("usuarios" / Uuid)
        .and(warp::delete())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::usuarios::eliminar_usuario_handler);

    let reset_password = warp::path!("usuarios" / Uuid / "password")
        .and(warp::put())
        .and(with_sesion(cfg))
        .and(with_json_body::<handlers::usuarios::ResetPasswordBody>())
        .and(with_db_access_manager(pool))
        .and_then(handlers::usuarios::reset_password_handler);

    tecnicos.or(listar).or(crear).or(eliminar).or(reset_password)
}

pub fn rutas_configuracion(
    pool: PgPool,
    configs: &Configs,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let cfg = configs.sesion.clone();

    let listar_sectores = warp::path!("sectores")
        .and(warp::get())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::configuracion::listar_sectores_handler);

    let crear_sector = warp::path!("sectores")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(with_json_body::<handlers::configuracion::SectorBody>())
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::configuracion::crear_sector_handler);

    let actualizar_sector = warp::path!("sectores" / Uuid)
        .and(warp::put())
        .and(with_sesion(cfg.clone()))
        .and(with_json_body::<handlers::configuracion::SectorBody>())
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::configuracion::actualizar_sector_handler);

    let eliminar_sector = warp::path!("sectores" / Uuid)
        .and(warp::delete())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::configuracion::eliminar_sector_handler);

    let listar_equipos = warp::path!("equipos")
        .and(warp::get())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::configuracion::listar_equipos_handler);

    let crear_equipo = warp::path!("equipos")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(with_json_body::<handlers::configuracion::EquipoBody>())
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::configuracion::crear_equipo_handler);

    let actualizar_equipo = warp::path!("equipos" / Uuid)
        .and(warp::put())
        .and(with_sesion(cfg.clone()))
        .and(with_json_body::<handlers::configuracion::EquipoBody>())
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::configuracion::actualizar_equipo_handler);

    let eliminar_equipo = warp::path!("equipos" / Uuid)
        .and(warp::delete())
        .and(with_sesion(cfg))
        .and(with_db_access_manager(pool))
        .and_then(handlers::configuracion::eliminar_equipo_handler);

    listar_sectores
        .or(crear_sector)
        .or(actualizar_sector)
        .or(eliminar_sector)
        .or(listar_equipos)
        .or(crear_equipo)
        .or(actualizar_equipo)
        .or(eliminar_equipo)
}

pub fn rutas_solicitudes(
    pool: PgPool,
    almacen: Almacen,
    configs: &Configs,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let cfg = configs.sesion.clone();

    let crear = warp::path!("solicitudes")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(warp::multipart::form().max_length(MAX_SUBIDA_BYTES))
        .and(with_db_access_manager(pool.clone()))
        .and(with_almacen(almacen))
        .and_then(handlers::solicitudes::crear_solicitud_handler);

    let listar = warp::path!("solicitudes")
        .and(warp::get())
        .and(warp::query::<ConsultaSolicitudes>())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::solicitudes::listar_solicitudes_handler);

    let exportar = warp::path!("solicitudes" / "exportar")
        .and(warp::get())
        .and(warp::query::<ConsultaSolicitudes>())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::exportar::exportar_csv_handler);

    let propias = warp::path!("solicitudes" / "propias")
        .and(warp::get())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::solicitudes::mis_solicitudes_handler);

    let obtener = warp::path!("solicitudes" / Uuid)
        .and(warp::get())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::solicitudes::obtener_solicitud_handler);

    let recepcionar = warp::path!("solicitudes" / Uuid / "recepcionar")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::solicitudes::recepcionar_handler);

    let derivar = warp::path!("solicitudes" / Uuid / "derivar")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(with_json_body::<handlers::solicitudes::DerivarBody>())
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::solicitudes::derivar_handler);

    let iniciar = warp::path!("solicitudes" / Uuid / "iniciar")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(with_json_body::<handlers::solicitudes::IniciarBody>())
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::solicitudes::iniciar_trabajo_handler);

    let finalizar = warp::path!("solicitudes" / Uuid / "finalizar")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::solicitudes::finalizar_handler);

    let vista_supervisor = warp::path!("solicitudes" / Uuid / "vista-supervisor")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::solicitudes::vista_supervisor_handler);

    let vista_tecnico = warp::path!("solicitudes" / Uuid / "vista-tecnico")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::solicitudes::vista_tecnico_handler);

    let actualizar = warp::path!("solicitudes" / Uuid)
        .and(warp::patch())
        .and(with_sesion(cfg.clone()))
        .and(with_json_body::<handlers::solicitudes::ActualizarSolicitudBody>())
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::solicitudes::actualizar_solicitud_handler);

    let eliminar = warp::path!("solicitudes" / Uuid)
        .and(warp::delete())
        .and(with_sesion(cfg))
        .and(with_db_access_manager(pool))
        .and_then(handlers::solicitudes::eliminar_solicitud_handler);

    crear
        .or(exportar)
        .or(propias)
        .or(listar)
        .or(obtener)
        .or(recepcionar)
        .or(derivar)
        .or(iniciar)
        .or(finalizar)
        .or(vista_supervisor)
        .or(vista_tecnico)
        .or(actualizar)
        .or(eliminar)
}

pub fn rutas_observaciones(
    pool: PgPool,
    almacen: Almacen,
    suscriptores: Suscriptores,
    configs: &Configs,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let cfg = configs.sesion.clone();

    let listar = warp::path!("solicitudes" / Uuid / "observaciones")
        .and(warp::get())
        .and(with_sesion(cfg.clone()))
        .and(with_db_access_manager(pool.clone()))
        .and_then(handlers::observaciones::listar_observaciones_handler);

    let crear = warp::path!("solicitudes" / Uuid / "observaciones")
        .and(warp::post())
        .and(with_sesion(cfg.clone()))
        .and(warp::multipart::form().max_length(MAX_SUBIDA_BYTES))
        .and(with_db_access_manager(pool.clone()))
        .and(with_almacen(almacen))
        .and(ws::with_suscriptores(suscriptores.clone()))
        .and_then(handlers::observaciones::crear_observacion_handler);

    let eliminar = warp::path!("observaciones" / Uuid)
        .and(warp::delete())
        .and(with_sesion(cfg))
        .and(with_db_access_manager(pool))
        .and(ws::with_suscriptores(suscriptores))
        .and_then(handlers::observaciones::eliminar_observacion_handler);

    listar.or(crear).or(eliminar)
}

pub fn ruta_estadisticas(
    pool: PgPool,
    configs: &Configs,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("estadisticas")
        .and(warp::get())
        .and(warp::query::<ConsultaSolicitudes>())
        .and(with_sesion(configs.sesion.clone()))
        .and(with_db_access_manager(pool))
        .and_then(handlers::estadisticas::estadisticas_handler)
}

#[derive(Debug, Deserialize)]
pub struct ConsultaWs {
    pub solicitud_id: Uuid,
}

/// Handshake del feed de notas. La cookie de sesión viaja igual que en el
/// resto de la API.
pub fn ruta_ws(
    suscriptores: Suscriptores,
    configs: &Configs,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("ws" / "observaciones")
        .and(warp::query::<ConsultaWs>())
        .and(warp::ws())
        .and(with_sesion(configs.sesion.clone()))
        .and(ws::with_suscriptores(suscriptores))
        .map(
            |consulta: ConsultaWs,
             peticion: warp::ws::Ws,
             _sesion: crate::shared::session::Sesion,
             suscriptores: Suscriptores| {
                peticion.on_upgrade(move |socket| {
                    ws::conectar(socket, consulta.solicitud_id, suscriptores)
                })
            },
        )
}
