use dns_resolver::{DnsError, Resolver};
use serde::Serialize;

pub mod error;
pub mod range;
pub mod record;
pub mod score;

pub use error::{SpfError, Status};
pub use range::{network_size, parse_ip_range, score_ip_nets, RangeSet};
pub use record::{Qualifier, SpfProfile};
pub use score::score_spf;

/// The parsed SPF policy of a domain along with its score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpfEvaluation {
    pub profile: SpfProfile,
    pub score: f64,
}

/// Returns the first TXT record published at `domain` that
/// looks like an SPF policy.
pub async fn fetch_spf_record(resolver: &dyn Resolver, domain: &str) -> Result<String, SpfError> {
    let records = match resolver.lookup_txt(domain).await {
        Ok(records) => records,
        Err(DnsError::NotFound(_)) => return Err(SpfError::NoRecord(domain.to_string())),
        Err(err) => return Err(err.into()),
    };

    records
        .into_iter()
        .find(|txt| txt.starts_with("v=spf"))
        .ok_or_else(|| SpfError::NoRecord(domain.to_string()))
}

/// Fetches, parses and scores the SPF policy of `domain` as it
/// applies to mail sent from `ip`.
pub async fn evaluate(
    resolver: &dyn Resolver,
    domain: &str,
    ip: &str,
) -> Result<SpfEvaluation, SpfError> {
    let record = fetch_spf_record(resolver, domain).await?;
    tracing::debug!("{domain}: evaluating {record:?} for {ip}");
    let profile = SpfProfile::parse(&record, domain, ip, resolver).await?;
    let score = score_spf(&profile);
    Ok(SpfEvaluation { profile, score })
}
