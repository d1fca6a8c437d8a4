use async_trait::async_trait;
use std::net::IpAddr;
use thiserror::Error;

mod hickory;
mod test_resolver;

pub use hickory::HickoryResolver;
pub use test_resolver::TestResolver;

/// Whether retrying the same evaluation later could change the outcome
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Status {
    Permfail,
    Tempfail,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    #[error("DNS record {0} not found")]
    NotFound(String),
    #[error("{0} is not a valid IP address")]
    InvalidAddress(String),
    #[error("{0}")]
    ResolveFailed(String),
}

impl DnsError {
    /// Returns true when a later retry of the same query may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ResolveFailed(_))
    }

    pub fn status(&self) -> Status {
        if self.is_transient() {
            Status::Tempfail
        } else {
            Status::Permfail
        }
    }
}

/// The DNS operations needed to evaluate authentication records.
///
/// Each call is a point-in-time query; implementations are not expected
/// to cache or retry.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Returns the text of each TXT record published at `name`.
    /// The character-strings of a single record are concatenated.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError>;

    /// Returns the A and AAAA addresses of `name`.
    async fn lookup_host(&self, name: &str) -> Result<Vec<IpAddr>, DnsError>;

    /// Returns the PTR hostnames of `addr`, without the trailing dot.
    async fn lookup_addr(&self, addr: &str) -> Result<Vec<String>, DnsError>;
}

/// Lowercases a name and removes any trailing dot so that
/// names can be compared as plain strings.
pub fn normalize_name(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn name_normalization() {
        k9::assert_equal!(normalize_name("Mail.Example.COM."), "mail.example.com");
        k9::assert_equal!(normalize_name("example.com"), "example.com");
    }

    #[test]
    fn transient_errors() {
        assert!(DnsError::ResolveFailed("timed out".to_string()).is_transient());
        assert!(!DnsError::NotFound("example.com".to_string()).is_transient());
        assert!(!DnsError::InvalidAddress("example.com".to_string()).is_transient());
        k9::assert_equal!(
            DnsError::ResolveFailed("timed out".to_string()).status(),
            Status::Tempfail
        );
        k9::assert_equal!(
            DnsError::NotFound("example.com".to_string()).status(),
            Status::Permfail
        );
    }
}
