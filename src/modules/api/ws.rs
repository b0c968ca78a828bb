//! Live feed for the notes panel: browsers watching a ticket open a socket
//! and get poked whenever a note is added or removed, so they refetch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;
use warp::filters::ws::{Message, WebSocket};
use warp::Filter;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccionNota {
    Alta,
    Baja,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventoNotas {
    pub solicitud_id: Uuid,
    pub accion: AccionNota,
}

type Emisor = Arc<mpsc::UnboundedSender<Message>>;

/// Open sockets keyed by the ticket they watch.
pub type Suscriptores = Arc<Mutex<HashMap<Uuid, Vec<Emisor>>>>;

pub fn nuevo_registro() -> Suscriptores {
    Arc::new(Mutex::new(HashMap::new()))
}

/// Fan an event out to every socket watching the ticket. Senders whose
/// receiving task already hung up are dropped from the registry.
pub fn publicar(suscriptores: &Suscriptores, evento: EventoNotas) {
    let carga = match serde_json::to_string(&evento) {
        Ok(texto) => texto,
        Err(err) => {
            log::error!("No se pudo serializar el evento de notas: {}", err);
            return;
        }
    };

    let mut mapa = match suscriptores.lock() {
        Ok(guardia) => guardia,
        Err(envenenado) => envenenado.into_inner(),
    };

    if let Some(emisores) = mapa.get_mut(&evento.solicitud_id) {
        emisores.retain(|tx| tx.send(Message::text(carga.clone())).is_ok());
        if emisores.is_empty() {
            mapa.remove(&evento.solicitud_id);
        }
    }
}

pub async fn conectar(websocket: WebSocket, solicitud_id: Uuid, suscriptores: Suscriptores) {
    let (mut salida_ws, mut entrada_ws) = websocket.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let tx = Arc::new(tx);

    registrar(&suscriptores, solicitud_id, tx.clone());
    log::debug!("Socket de notas abierto para la solicitud {}", solicitud_id);

    let reenvio = tokio::spawn(async move {
        let mut eventos = UnboundedReceiverStream::new(rx);
        while let Some(mensaje) = eventos.next().await {
            if salida_ws.send(mensaje).await.is_err() {
                break;
            }
        }
    });

    // Inbound traffic is ignored; the loop only detects the close.
    while let Some(resultado) = entrada_ws.next().await {
        if resultado.is_err() {
            break;
        }
    }

    desregistrar(&suscriptores, solicitud_id, &tx);
    reenvio.abort();
    log::debug!("Socket de notas cerrado para la solicitud {}", solicitud_id);
}

fn registrar(suscriptores: &Suscriptores, solicitud_id: Uuid, tx: Emisor) {
    let mut mapa = match suscriptores.lock() {
        Ok(guardia) => guardia,
        Err(envenenado) => envenenado.into_inner(),
    };
    mapa.entry(solicitud_id).or_default().push(tx);
}

fn desregistrar(suscriptores: &Suscriptores, solicitud_id: Uuid, tx: &Emisor) {
    let mut mapa = match suscriptores.lock() {
        Ok(guardia) => guardia,
        Err(envenenado) => envenenado.into_inner(),
    };
    if let Some(emisores) = mapa.get_mut(&solicitud_id) {
        emisores.retain(|otro| !Arc::ptr_eq(otro, tx));
        if emisores.is_empty() {
            mapa.remove(&solicitud_id);
        }
    }
}

pub fn with_suscriptores(
    suscriptores: Suscriptores,
) -> impl Filter<Extract = (Suscriptores,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || suscriptores.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publicar_limpia_emisores_caidos() {
        let registro = nuevo_registro();
        let id = Uuid::new_v4();

        let (tx_vivo, mut rx_vivo) = mpsc::unbounded_channel();
        let (tx_muerto, rx_muerto) = mpsc::unbounded_channel();
        drop(rx_muerto);

        registrar(&registro, id, Arc::new(tx_vivo));
        registrar(&registro, id, Arc::new(tx_muerto));

        publicar(
            &registro,
            EventoNotas {
                solicitud_id: id,
                accion: AccionNota::Alta,
            },
        );

        let mensaje = rx_vivo.try_recv().unwrap();
        assert!(mensaje.to_str().unwrap().contains("\"accion\":\"alta\""));
        assert_eq!(registro.lock().unwrap().get(&id).unwrap().len(), 1);
    }

    #[test]
    fn desregistrar_borra_la_entrada_vacia() {
        let registro = nuevo_registro();
        let id = Uuid::new_v4();
        let (tx, _rx) = mpsc::unbounded_channel();
        let tx = Arc::new(tx);

        registrar(&registro, id, tx.clone());
        desregistrar(&registro, id, &tx);
        assert!(registro.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn el_filtro_comparte_el_registro() {
        let registro = nuevo_registro();
        let extraido = warp::test::request()
            .filter(&with_suscriptores(registro.clone()))
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&registro, &extraido));
    }

    #[test]
    fn publicar_sin_suscriptores_no_falla() {
        let registro = nuevo_registro();
        publicar(
            &registro,
            EventoNotas {
                solicitud_id: Uuid::new_v4(),
                accion: AccionNota::Baja,
            },
        );
    }
}
