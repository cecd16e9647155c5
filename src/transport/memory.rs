use super::{ClientStream, ServerStream};
use crate::cl::messages::{Request, Response};
use crate::errors::prelude::*;

use serde::de::DeserializeOwned;
use serde::Serialize;

use std::sync::mpsc::{channel, Receiver, Sender};

/// In-process connection. Messages travel as JSON text so that both ends
/// only share what would cross a real wire.
pub fn duplex() -> (MemoryClientStream, MemoryServerStream) {
    let (to_server, from_client) = channel();
    let (to_client, from_server) = channel();
    (
        MemoryClientStream {
            tx: to_server,
            rx: from_server,
        },
        MemoryServerStream {
            tx: to_client,
            rx: from_client,
        },
    )
}

pub struct MemoryClientStream {
    tx: Sender<String>,
    rx: Receiver<String>,
}

pub struct MemoryServerStream {
    tx: Sender<String>,
    rx: Receiver<String>,
}

fn send<T: Serialize>(tx: &Sender<String>, msg: &T) -> AnonCredsResult<()> {
    let data = serde_json::to_string(msg)?;
    tx.send(data)
        .map_err(|_| err_msg(AnonCredsErrorKind::Protocol, "Peer closed the connection"))
}

fn recv<T: DeserializeOwned>(rx: &Receiver<String>) -> AnonCredsResult<T> {
    let data = rx
        .recv()
        .map_err(|_| err_msg(AnonCredsErrorKind::Protocol, "Connection closed before message"))?;
    serde_json::from_str(&data).map_err(|err| {
        err_msg(
            AnonCredsErrorKind::Protocol,
            format!("Malformed message: {}", err),
        )
    })
}

impl ClientStream for MemoryClientStream {
    fn send(&mut self, msg: Request) -> AnonCredsResult<()> {
        trace!("MemoryClientStream::send: >>> {}", msg.name());
        send(&self.tx, &msg)
    }

    fn recv(&mut self) -> AnonCredsResult<Response> {
        recv(&self.rx)
    }
}

impl ServerStream for MemoryServerStream {
    fn send(&mut self, msg: Response) -> AnonCredsResult<()> {
        trace!("MemoryServerStream::send: >>> {}", msg.name());
        send(&self.tx, &msg)
    }

    fn recv(&mut self) -> AnonCredsResult<Request> {
        recv(&self.rx)
    }
}
