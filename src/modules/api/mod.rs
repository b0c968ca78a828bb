pub mod filters;
pub mod handlers;
pub mod responder;
pub mod routes;
pub mod ws;

use std::net::{IpAddr, Ipv4Addr};

use tokio::task::JoinHandle;
use utoipa::OpenApi;
use warp::Filter;

use crate::shared::config::Configs;
use crate::shared::db::PgPool;
use crate::shared::errors::handle_rejection;
use crate::shared::storage::Almacen;

pub async fn start_api(pool: PgPool, configs: Configs) -> JoinHandle<()> {
    let task = tokio::spawn(async move {
        let almacen = Almacen::new(&configs.almacenamiento);
        let suscriptores = ws::nuevo_registro();

        let api_doc = warp::path("api-doc.json")
            .and(warp::get())
            .map(|| warp::reply::json(&handlers::ApiDoc::openapi()));

        let api = warp::path!("api" / ..).and(
            api_doc
                .or(routes::rutas_auth(
                    pool.clone(),
                    almacen.clone(),
                    &configs,
                ))
                .or(routes::rutas_usuarios(pool.clone(), &configs))
                .or(routes::rutas_configuracion(pool.clone(), &configs))
                .or(routes::rutas_observaciones(
                    pool.clone(),
                    almacen.clone(),
                    suscriptores.clone(),
                    &configs,
                ))
                .or(routes::rutas_solicitudes(
                    pool.clone(),
                    almacen.clone(),
                    &configs,
                ))
                .or(routes::ruta_estadisticas(pool, &configs))
                .or(routes::ruta_ws(suscriptores, &configs)),
        );

        // Imágenes subidas, servidas tal cual desde disco.
        let uploads = warp::path("uploads").and(warp::fs::dir(almacen.directorio().clone()));

        let rutas = api
            .or(uploads)
            .recover(handle_rejection)
            .with(filters::with_cors(&configs.servidor.origen_frontend));

        let host: IpAddr = configs.servidor.host.parse().unwrap_or_else(|_| {
            log::warn!(
                "Host {} inválido, escuchando en 0.0.0.0",
                configs.servidor.host
            );
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        });

        log::info!("Iniciando API en {}:{}...", host, configs.servidor.puerto);
        warp::serve(rutas).run((host, configs.servidor.puerto)).await;
    });

    task
}
