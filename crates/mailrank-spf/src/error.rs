use dns_resolver::DnsError;
use thiserror::Error;

pub use dns_resolver::Status;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpfError {
    #[error("invalid SPF version in {0:?}")]
    InvalidVersion(String),
    #[error("invalid network range {expr:?}: {reason}")]
    InvalidCidr { expr: String, reason: String },
    #[error("'{0}' mechanism requires an argument")]
    MissingArgument(String),
    #[error("'{0}' mechanism needs the IP address under evaluation, but none was given")]
    MissingIp(String),
    #[error("no SPF record found for {0}")]
    NoRecord(String),
    #[error(transparent)]
    Dns(#[from] DnsError),
}

impl SpfError {
    pub fn status(&self) -> Status {
        match self {
            Self::InvalidVersion(_)
            | Self::InvalidCidr { .. }
            | Self::MissingArgument(_)
            | Self::MissingIp(_)
            | Self::NoRecord(_) => Status::Permfail,
            Self::Dns(dns) => dns.status(),
        }
    }
}
