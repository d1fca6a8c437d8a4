use dns_resolver::DnsError;
use thiserror::Error;

pub use dns_resolver::Status;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DmarcError {
    #[error("invalid value {value:?} for {tag}")]
    InvalidInteger { tag: &'static str, value: String },
    #[error("invalid feedback address: {0}")]
    InvalidFeedbackAddress(String),
    #[error("no DMARC record found for {0}")]
    NoRecord(String),
    #[error(transparent)]
    Dns(#[from] DnsError),
}

impl DmarcError {
    pub fn status(&self) -> Status {
        match self {
            Self::InvalidInteger { .. } | Self::InvalidFeedbackAddress(_) | Self::NoRecord(_) => {
                Status::Permfail
            }
            Self::Dns(dns) => dns.status(),
        }
    }
}
