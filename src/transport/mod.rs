//! Message streams the protocol drivers run over.
//!
//! A stream carries one session. Any failure to send or receive aborts the
//! session with a `Protocol` error.

pub mod memory;

use crate::cl::messages::{Request, Response};
use crate::errors::prelude::*;

/// Holder end of a session.
pub trait ClientStream {
    fn send(&mut self, msg: Request) -> AnonCredsResult<()>;
    fn recv(&mut self) -> AnonCredsResult<Response>;
}

/// Issuer end of a session.
pub trait ServerStream {
    fn send(&mut self, msg: Response) -> AnonCredsResult<()>;
    fn recv(&mut self) -> AnonCredsResult<Request>;
}
