use dns_resolver::DnsError;
use thiserror::Error;

pub use dns_resolver::Status;

#[derive(Debug, PartialEq, Eq, Clone, Error)]
/// DKIM errors
pub enum DkimError {
    #[error("tag {tag}= has a non-integer value {value:?}")]
    InvalidInteger { tag: &'static str, value: String },
    #[error("failed to decode public key: {0}")]
    Decode(String),
    #[error("no DKIM key record at {0}")]
    NoKeyRecord(String),
    #[error(transparent)]
    Dns(#[from] DnsError),
}

impl DkimError {
    pub fn status(&self) -> Status {
        use DkimError::*;
        match self {
            InvalidInteger { .. } | Decode(_) | NoKeyRecord(_) => Status::Permfail,
            Dns(dns) => dns.status(),
        }
    }
}

pub(crate) fn parse_integer(tag: &'static str, value: &str) -> Result<i64, DkimError> {
    value.parse().map_err(|_| DkimError::InvalidInteger {
        tag,
        value: value.to_string(),
    })
}
