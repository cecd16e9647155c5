use super::attribute::{parse_attrs, AttrCount, AttrSpec, Attribute};
use super::issuer::Issuer;
use super::messages::{ProveRequest, PublicParams, Request, Response, SchemaDescriptor};
use super::storage::{AttrDataFetcher, ReceiverRecordStore, RegistrationStore, SessionKeyStore};
use super::verifier::{check_conditions, verify_possession, Disclosure};
use super::{KeyPair, Params};
use crate::bn::BigNumber;
use crate::errors::prelude::*;
use crate::session::RandSessionKeyGen;
use crate::transport::ServerStream;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Message reported to a holder whose proof was not accepted, whatever the
/// reason.
pub const AUTH_FAILED: &str = "user authentication failed";

/// Issuer configuration: the attribute schema and, per organization, the
/// attributes a holder is expected to reveal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub attributes: BTreeMap<String, AttrSpec>,
    #[serde(default)]
    pub acceptable_creds: BTreeMap<String, Vec<String>>,
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> AnonCredsResult<ServerConfig> {
        trace!("ServerConfig::from_file: >>> path: {:?}", path.as_ref());
        fs::read_to_string(path)?.parse()
    }
}

impl FromStr for ServerConfig {
    type Err = AnonCredsError;

    fn from_str(s: &str) -> AnonCredsResult<ServerConfig> {
        serde_json::from_str(s).map_err(|err| {
            err_msg(
                AnonCredsErrorKind::Config,
                format!("Invalid server configuration: {}", err),
            )
        })
    }
}

/// Stores and services the server shares between sessions.
pub struct ServerCollaborators {
    pub registrations: Arc<dyn RegistrationStore + Send + Sync>,
    pub records: Arc<dyn ReceiverRecordStore + Send + Sync>,
    pub session_keys: Arc<dyn SessionKeyStore + Send + Sync>,
    pub data_fetcher: Arc<dyn AttrDataFetcher + Send + Sync>,
    pub session_key_gen: RandSessionKeyGen,
}

/// Issuer and verifier of one credential schema. Every protocol method
/// runs a single session over the given stream.
pub struct Server {
    issuer: Issuer,
    attrs: Vec<Attribute>,
    attr_count: AttrCount,
    acceptable_creds: BTreeMap<String, Vec<String>>,
    collaborators: ServerCollaborators,
}

impl Server {
    pub fn new(
        params: Params,
        key_pair: KeyPair,
        config: &ServerConfig,
        collaborators: ServerCollaborators,
    ) -> AnonCredsResult<Server> {
        params.validate()?;
        let (attrs, attr_count) = parse_attrs(&config.attributes)?;
        key_pair.pub_key.check_attr_count(&attr_count)?;

        info!("Credential schema set up with {}", attr_count);
        for attr in &attrs {
            info!("{}", attr);
        }

        Ok(Server {
            issuer: Issuer::new(params, key_pair),
            attrs,
            attr_count,
            acceptable_creds: config.acceptable_creds.clone(),
            collaborators,
        })
    }

    pub fn public_params(&self) -> PublicParams {
        PublicParams {
            pub_key: self.issuer.pub_key().clone(),
            params: self.issuer.params().clone(),
            schema: SchemaDescriptor::new(&self.attrs, self.attr_count),
        }
    }

    pub fn acceptable_creds(&self) -> &BTreeMap<String, Vec<String>> {
        &self.acceptable_creds
    }

    /// Registration key, nonce, credential request, signed credential.
    pub fn issue(&self, stream: &mut dyn ServerStream) -> AnonCredsResult<()> {
        trace!("Server::issue: >>>");

        let res = self.issue_session(stream);
        if let Err(ref err) = res {
            debug!("Issue session aborted: {}", err);
            let message = match err.kind() {
                AnonCredsErrorKind::ProofRejected => "credential request rejected",
                _ => err.message(),
            };
            report(stream, err.kind(), message);
        }

        trace!("Server::issue: <<< ok: {}", res.is_ok());

        res
    }

    fn issue_session(&self, stream: &mut dyn ServerStream) -> AnonCredsResult<()> {
        let reg_key = match stream.recv()? {
            Request::RegKey(key) => key,
            other => return Err(unexpected("reg_key", &other)),
        };
        if !self.collaborators.registrations.check_and_consume(&reg_key)? {
            return Err(err_msg(
                AnonCredsErrorKind::Registration,
                "Registration key is unknown or already used",
            ));
        }

        let nonce = self.issuer.new_nonce()?;
        stream.send(Response::Nonce(nonce.clone()))?;

        let request = match stream.recv()? {
            Request::CredIssue(request) => request,
            other => return Err(unexpected("cred_issue", &other)),
        };
        let (issued, record) = self.issuer.issue(&request, &nonce)?;
        self.collaborators.records.store(&request.nym, record)?;

        stream.send(Response::IssuedCred(issued))
    }

    /// Signs new known values for a pseudonym that already holds a
    /// credential.
    pub fn update(&self, stream: &mut dyn ServerStream) -> AnonCredsResult<()> {
        trace!("Server::update: >>>");

        let res = self.update_session(stream);
        if let Err(ref err) = res {
            debug!("Update session aborted: {}", err);
            report(stream, err.kind(), err.message());
        }

        trace!("Server::update: <<< ok: {}", res.is_ok());

        res
    }

    fn update_session(&self, stream: &mut dyn ServerStream) -> AnonCredsResult<()> {
        let request = match stream.recv()? {
            Request::CredUpdate(request) => request,
            other => return Err(unexpected("cred_update", &other)),
        };

        let records = &self.collaborators.records;
        let record = records.load(&request.nym)?;
        let (issued, record) =
            self.issuer
                .update(&record, &request.nonce, &request.new_known_attrs)?;
        records.store(&request.nym, record)?;

        stream.send(Response::IssuedCred(issued))
    }

    /// Nonce, proof of possession, session key. Any rejection reaches the
    /// holder as the same `ProofRejected` error.
    pub fn prove(&self, stream: &mut dyn ServerStream) -> AnonCredsResult<String> {
        trace!("Server::prove: >>>");

        let res = self.prove_session(stream);
        if let Err(ref err) = res {
            debug!("Prove session aborted: {}", err);
            report(stream, AnonCredsErrorKind::ProofRejected, AUTH_FAILED);
        }

        trace!("Server::prove: <<< ok: {}", res.is_ok());

        res
    }

    fn prove_session(&self, stream: &mut dyn ServerStream) -> AnonCredsResult<String> {
        match stream.recv()? {
            Request::Empty => {}
            other => return Err(unexpected("empty", &other)),
        }

        let nonce = self.issuer.new_nonce()?;
        stream.send(Response::Nonce(nonce.clone()))?;

        let request = match stream.recv()? {
            Request::CredProve(request) => request,
            other => return Err(unexpected("cred_prove", &other)),
        };
        self.verify_proof(&request, &nonce)?;

        let session_key = self.collaborators.session_key_gen.generate()?;
        self.collaborators.session_keys.store(&session_key)?;
        stream.send(Response::SessionKey(session_key.clone()))?;

        Ok(session_key)
    }

    fn verify_proof(&self, request: &ProveRequest, nonce: &BigNumber) -> AnonCredsResult<()> {
        let disclosure = Disclosure {
            revealed_known_indices: request.revealed_known_indices.clone(),
            revealed_committed_indices: request.revealed_committed_indices.clone(),
            revealed_known: request.known_attrs.clone(),
            revealed_commitments: request.commitments_of_attrs.clone(),
        };

        if !verify_possession(
            self.issuer.params(),
            self.issuer.pub_key(),
            &request.a,
            &request.proof,
            &disclosure,
            nonce,
        )? {
            return Err(err_msg(
                AnonCredsErrorKind::ProofRejected,
                "Proof of possession does not verify",
            ));
        }

        let reference = self.collaborators.data_fetcher.fetch()?;
        let known_attrs: Vec<&Attribute> = self.attrs.iter().filter(|a| a.is_known()).collect();
        check_conditions(
            &known_attrs,
            &request.revealed_known_indices,
            &request.known_attrs,
            &reference,
        )
    }
}

fn unexpected(expected: &str, got: &Request) -> AnonCredsError {
    err_msg(
        AnonCredsErrorKind::Protocol,
        format!("Expected '{}' message, got '{}'", expected, got.name()),
    )
}

// The peer may be gone already, the session error is what the caller sees.
fn report(stream: &mut dyn ServerStream, kind: AnonCredsErrorKind, message: &str) {
    if let Err(err) = stream.send(Response::error(kind, message)) {
        debug!("Could not report error to peer: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl::issuer;
    use crate::cl::storage::*;

    pub const CONFIG: &str = r#"{
        "attributes": {
            "date_from": {"index": 0, "type": "int64", "known": true, "cond": "gte"},
            "date_to": {"index": 1, "type": "int64", "known": true, "cond": "lte"},
            "name": {"index": 2, "type": "string", "known": true},
            "gender": {"index": 3, "type": "string", "known": false}
        },
        "acceptable_creds": {
            "org1": ["name", "gender"]
        }
    }"#;

    fn collaborators() -> ServerCollaborators {
        ServerCollaborators {
            registrations: Arc::new(MemoryRegistrationStore::new()),
            records: Arc::new(MemoryReceiverRecordStore::new()),
            session_keys: Arc::new(MemorySessionKeyStore::new()),
            data_fetcher: Arc::new(MemoryDataFetcher::new()),
            session_key_gen: RandSessionKeyGen::default(),
        }
    }

    #[test]
    fn config_parses() {
        let config: ServerConfig = CONFIG.parse().unwrap();
        assert_eq!(4, config.attributes.len());
        assert_eq!(
            vec!["name".to_string(), "gender".to_string()],
            config.acceptable_creds["org1"]
        );
    }

    #[test]
    fn malformed_config_is_a_config_error() {
        let err = "{\"attributes\": 5}".parse::<ServerConfig>().unwrap_err();
        assert_eq!(AnonCredsErrorKind::Config, err.kind());
    }

    #[test]
    fn public_params_describe_schema() {
        let config: ServerConfig = CONFIG.parse().unwrap();
        let server = Server::new(
            Params::default(),
            issuer::mocks::key_pair(),
            &config,
            collaborators(),
        )
        .unwrap();

        let public_params = server.public_params();
        assert_eq!(AttrCount::new(3, 1, 0), public_params.schema.attr_count);

        let raw_cred = public_params.raw_cred().unwrap();
        assert_eq!((true, 2), raw_cred.partition_position("name").unwrap());
        assert_eq!((false, 0), raw_cred.partition_position("gender").unwrap());
        assert!(server.acceptable_creds().contains_key("org1"));
    }

    #[test]
    fn key_not_matching_schema_is_rejected() {
        let config: ServerConfig = r#"{
            "attributes": {
                "name": {"index": 0, "type": "string"}
            }
        }"#
        .parse()
        .unwrap();
        let err = Server::new(
            Params::default(),
            issuer::mocks::key_pair(),
            &config,
            collaborators(),
        )
        .err()
        .unwrap();
        assert_eq!(AnonCredsErrorKind::Config, err.kind());
    }
}
