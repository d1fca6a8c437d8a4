use crate::{normalize_name, DnsError, Resolver};
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{ResolveError, TokioResolver};
use std::net::IpAddr;

/// A [Resolver] that performs live queries through hickory.
pub struct HickoryResolver {
    inner: TokioResolver,
}

impl HickoryResolver {
    /// Build a resolver from the system configuration
    /// (`/etc/resolv.conf` on unix systems).
    pub fn from_system_conf() -> Result<Self, DnsError> {
        let inner = TokioResolver::builder_tokio()
            .map_err(|err| {
                DnsError::ResolveFailed(format!("failed to load system resolver config: {err}"))
            })?
            .build();
        Ok(Self { inner })
    }

    /// Build a resolver that sends its queries to the given
    /// nameservers on port 53.
    pub fn with_nameservers(nameservers: &[IpAddr]) -> Self {
        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(nameservers, 53, true),
        );
        let inner =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default()).build();
        Self { inner }
    }
}

fn to_dns_error(name: &str, err: ResolveError) -> DnsError {
    if err.is_no_records_found() {
        tracing::trace!("{name}: no records");
        DnsError::NotFound(name.to_string())
    } else {
        tracing::debug!("{name}: {err:#}");
        DnsError::ResolveFailed(format!("failed to query DNS for {name}: {err}"))
    }
}

#[async_trait]
impl Resolver for HickoryResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        let answer = self
            .inner
            .txt_lookup(name)
            .await
            .map_err(|err| to_dns_error(name, err))?;
        Ok(answer
            .iter()
            .map(|txt| {
                txt.iter()
                    .map(|data| String::from_utf8_lossy(data))
                    .collect()
            })
            .collect())
    }

    async fn lookup_host(&self, name: &str) -> Result<Vec<IpAddr>, DnsError> {
        let answer = self
            .inner
            .lookup_ip(name)
            .await
            .map_err(|err| to_dns_error(name, err))?;
        Ok(answer.iter().collect())
    }

    async fn lookup_addr(&self, addr: &str) -> Result<Vec<String>, DnsError> {
        let ip: IpAddr = addr
            .parse()
            .map_err(|_| DnsError::InvalidAddress(addr.to_string()))?;
        let answer = self
            .inner
            .reverse_lookup(ip)
            .await
            .map_err(|err| to_dns_error(addr, err))?;
        Ok(answer
            .iter()
            .map(|name| normalize_name(&name.to_utf8()))
            .collect())
    }
}

#[cfg(all(test, feature = "live-dns-tests"))]
mod test {
    use super::*;

    #[tokio::test]
    async fn live_txt() {
        let resolver = HickoryResolver::from_system_conf().unwrap();
        let records = resolver.lookup_txt("_dmarc.gmail.com").await.unwrap();
        assert!(records.iter().any(|r| r.starts_with("v=DMARC1")));
    }

    #[tokio::test]
    async fn live_invalid_reverse() {
        let resolver = HickoryResolver::from_system_conf().unwrap();
        k9::assert_equal!(
            resolver.lookup_addr("gmail.com").await.unwrap_err(),
            DnsError::InvalidAddress("gmail.com".to_string())
        );
    }
}
