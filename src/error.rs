use std::io;
use std::net::Ipv4Addr;

/// Failures of the wire codec and the transport underneath the resolver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid hostname")]
    InvalidHostname,
    #[error("network error: {0}")]
    NetworkError(#[from] io::Error),
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    #[error("response does not match the query")]
    MismatchedResponse,
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedMessage(reason.into())
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::InvalidHostname, Error::InvalidHostname) => true,
            (Error::MismatchedResponse, Error::MismatchedResponse) => true,
            (Error::MalformedMessage(a), Error::MalformedMessage(b)) => a == b,
            (Error::NetworkError(a), Error::NetworkError(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}

/// Why a name could not be resolved.
///
/// Only [`Unresolvable::TransportFailure`] is fatal for a whole request. Every
/// other variant is local to the branch that produced it, so an ancestor frame
/// may still fall back to records it already holds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Unresolvable {
    #[error("invalid domain name: {0}")]
    InvalidDomain(String),
    #[error("no usable response from {server}: {reason}")]
    TransportFailure { server: Ipv4Addr, reason: String },
    #[error("{server} gave no answer, glue or delegation for {name}")]
    EmptyReferral { name: String, server: Ipv4Addr },
    #[error("could not resolve {name}")]
    SubResolutionFailure { name: String },
    #[error("no root server yielded a next-hop address for {domain}")]
    BootstrapExhaustion { domain: String },
    #[error("gave up on {name} after {limit} nested lookups")]
    DepthExceeded { name: String, limit: usize },
    #[error("referral loop: {name} was already being asked of {server}")]
    LoopDetected { name: String, server: Ipv4Addr },
}

impl Unresolvable {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Unresolvable::TransportFailure { .. })
    }

    pub(crate) fn transport(server: Ipv4Addr, err: &Error) -> Self {
        Unresolvable::TransportFailure {
            server,
            reason: err.to_string(),
        }
    }
}
