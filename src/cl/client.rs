use super::messages::{ProveRequest, Request, Response, UpdateRequest};
use super::prover::CredManager;
use super::raw_cred::RawCred;
use super::{Cred, IssuedCred};
use crate::bn::BigNumber;
use crate::errors::prelude::*;
use crate::transport::ClientStream;

/// Holder side drivers of the issue, update and prove sessions.
pub struct Client {}

impl Client {
    /// Obtains a credential for the values held by `cred_manager`, using a
    /// one-time registration key.
    pub fn issue_credential(
        stream: &mut dyn ClientStream,
        cred_manager: &mut CredManager,
        reg_key: &str,
    ) -> AnonCredsResult<Cred> {
        trace!("Client::issue_credential: >>> nym: {:?}", cred_manager.nym());

        stream.send(Request::RegKey(reg_key.to_string()))?;
        let nonce = Client::recv_nonce(stream)?;

        let request = cred_manager.cred_request(&nonce)?;
        stream.send(Request::CredIssue(request))?;

        let IssuedCred { cred, a_proof } = Client::recv_issued(stream)?;
        if !cred_manager.verify(&cred, &a_proof)? {
            return Err(Client::invalid_cred());
        }

        trace!("Client::issue_credential: <<< cred: {:?}", cred);

        Ok(cred)
    }

    /// Asks for a credential over the new known values in `raw_cred`. The
    /// manager keeps its current values unless the new credential verifies.
    pub fn update_credential(
        stream: &mut dyn ClientStream,
        cred_manager: &mut CredManager,
        raw_cred: RawCred,
    ) -> AnonCredsResult<Cred> {
        trace!("Client::update_credential: >>> raw_cred: {}", raw_cred);

        let nonce = cred_manager.cred_req_nonce().cloned().ok_or_else(|| {
            err_msg(
                AnonCredsErrorKind::InvalidState,
                "Only an issued credential can be updated",
            )
        })?;
        cred_manager.check_update(&raw_cred)?;

        stream.send(Request::CredUpdate(UpdateRequest {
            nym: cred_manager.nym().clone(),
            nonce,
            new_known_attrs: raw_cred.known_values()?,
        }))?;

        let IssuedCred { cred, a_proof } = Client::recv_issued(stream)?;
        if !cred_manager.verify_update(&raw_cred, &cred, &a_proof)? {
            return Err(Client::invalid_cred());
        }
        cred_manager.update(raw_cred)?;

        trace!("Client::update_credential: <<< cred: {:?}", cred);

        Ok(cred)
    }

    /// Proves possession of `cred`, revealing the named attributes, and
    /// returns the session key handed out by the issuer.
    pub fn prove_credential(
        stream: &mut dyn ClientStream,
        cred_manager: &CredManager,
        cred: &Cred,
        revealed_attrs: &[&str],
    ) -> AnonCredsResult<String> {
        trace!(
            "Client::prove_credential: >>> revealed_attrs: {:?}",
            revealed_attrs
        );

        let mut known_indices = Vec::new();
        let mut committed_indices = Vec::new();
        for name in revealed_attrs {
            match cred_manager.raw_cred().partition_position(name)? {
                (true, position) => known_indices.push(position),
                (false, position) => committed_indices.push(position),
            }
        }
        known_indices.sort_unstable();
        known_indices.dedup();
        committed_indices.sort_unstable();
        committed_indices.dedup();

        stream.send(Request::Empty)?;
        let nonce = Client::recv_nonce(stream)?;

        let (rcred, proof) =
            cred_manager.build_proof(cred, &known_indices, &committed_indices, &nonce)?;
        let (known_attrs, commitments_of_attrs) =
            cred_manager.filter_attributes(&known_indices, &committed_indices)?;

        stream.send(Request::CredProve(ProveRequest {
            a: rcred.a,
            proof,
            known_attrs,
            commitments_of_attrs,
            revealed_known_indices: known_indices,
            revealed_committed_indices: committed_indices,
        }))?;

        let session_key = match stream.recv()? {
            Response::SessionKey(key) => key,
            other => return Err(Client::unexpected("session_key", other)),
        };

        trace!("Client::prove_credential: <<< session key received");

        Ok(session_key)
    }

    fn recv_nonce(stream: &mut dyn ClientStream) -> AnonCredsResult<BigNumber> {
        match stream.recv()? {
            Response::Nonce(nonce) => Ok(nonce),
            other => Err(Client::unexpected("nonce", other)),
        }
    }

    fn recv_issued(stream: &mut dyn ClientStream) -> AnonCredsResult<IssuedCred> {
        match stream.recv()? {
            Response::IssuedCred(issued) => Ok(issued),
            other => Err(Client::unexpected("issued_cred", other)),
        }
    }

    fn invalid_cred() -> AnonCredsError {
        err_msg(
            AnonCredsErrorKind::ProofRejected,
            "Issued credential is not valid",
        )
    }

    // An error reported by the issuer keeps its kind.
    fn unexpected(expected: &str, got: Response) -> AnonCredsError {
        match got {
            Response::Error { kind, message } => err_msg(kind, message),
            other => err_msg(
                AnonCredsErrorKind::Protocol,
                format!("Expected '{}' message, got '{}'", expected, other.name()),
            ),
        }
    }
}
