use super::attribute::{AttrCount, AttrType, Attribute};
use super::raw_cred::RawCred;
use super::{CredRequest, IssuedCred, Params, PubKey};
use crate::bn::BigNumber;
use crate::errors::prelude::*;
use crate::zkp::representation::RepresentationProof;

/// Messages sent by the holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum Request {
    RegKey(String),
    Empty,
    CredIssue(CredRequest),
    CredUpdate(UpdateRequest),
    CredProve(ProveRequest),
}

/// Messages sent by the issuer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum Response {
    Nonce(BigNumber),
    IssuedCred(IssuedCred),
    SessionKey(String),
    Error {
        kind: AnonCredsErrorKind,
        message: String,
    },
}

impl Response {
    pub fn error(kind: AnonCredsErrorKind, message: &str) -> Response {
        Response::Error {
            kind,
            message: message.to_string(),
        }
    }

    /// Name of the variant, for protocol error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Response::Nonce(_) => "nonce",
            Response::IssuedCred(_) => "issued_cred",
            Response::SessionKey(_) => "session_key",
            Response::Error { .. } => "error",
        }
    }
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::RegKey(_) => "reg_key",
            Request::Empty => "empty",
            Request::CredIssue(_) => "cred_issue",
            Request::CredUpdate(_) => "cred_update",
            Request::CredProve(_) => "cred_prove",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub nym: BigNumber,
    pub nonce: BigNumber,
    pub new_known_attrs: Vec<BigNumber>,
}

/// A proof of possession with the disclosed part of the credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProveRequest {
    pub a: BigNumber,
    pub proof: RepresentationProof,
    pub known_attrs: Vec<BigNumber>,
    pub commitments_of_attrs: Vec<BigNumber>,
    pub revealed_known_indices: Vec<usize>,
    pub revealed_committed_indices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrDescriptor {
    pub index: usize,
    pub name: String,
    pub known: bool,
    #[serde(rename = "type")]
    pub attr_type: AttrType,
}

/// Published shape of the credential schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub attrs: Vec<AttrDescriptor>,
    pub attr_count: AttrCount,
}

impl SchemaDescriptor {
    pub fn new(attrs: &[Attribute], attr_count: AttrCount) -> SchemaDescriptor {
        SchemaDescriptor {
            attrs: attrs
                .iter()
                .map(|a| AttrDescriptor {
                    index: a.index(),
                    name: a.name().to_string(),
                    known: a.is_known(),
                    attr_type: a.attr_type(),
                })
                .collect(),
            attr_count,
        }
    }
}

/// Everything a holder needs before requesting a credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicParams {
    pub pub_key: PubKey,
    pub params: Params,
    pub schema: SchemaDescriptor,
}

impl PublicParams {
    /// Empty credential shaped after the published schema.
    pub fn raw_cred(&self) -> AnonCredsResult<RawCred> {
        let mut raw_cred = RawCred::new(self.schema.attr_count);
        for attr in &self.schema.attrs {
            raw_cred.add_empty_attr(&attr.name, attr.index, attr.known, attr.attr_type)?;
        }
        Ok(raw_cred)
    }
}
