use dns_resolver::{DnsError, Resolver};
use serde::Serialize;

pub use crate::error::{DmarcError, Status};
pub use crate::types::feedback_address::FeedbackAddress;
pub use crate::types::record::DmarcProfile;

mod error;
mod types;

#[cfg(test)]
mod tests;

/// The parsed DMARC policy of a domain along with its score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DmarcEvaluation {
    pub profile: DmarcProfile,
    pub score: i64,
}

/// Returns the DMARC record published at `_dmarc.<domain>`
pub async fn fetch_dmarc_record(
    resolver: &dyn Resolver,
    domain: &str,
) -> Result<String, DmarcError> {
    let name = format!("_dmarc.{domain}");
    let records = match resolver.lookup_txt(&name).await {
        Ok(records) => records,
        Err(DnsError::NotFound(_)) => return Err(DmarcError::NoRecord(domain.to_string())),
        Err(err) => return Err(err.into()),
    };

    records
        .into_iter()
        .find(|txt| txt.starts_with("v=DMARC"))
        .ok_or_else(|| DmarcError::NoRecord(domain.to_string()))
}

/// Fetches, parses and scores the DMARC policy of `domain`
pub async fn evaluate(resolver: &dyn Resolver, domain: &str) -> Result<DmarcEvaluation, DmarcError> {
    let record = fetch_dmarc_record(resolver, domain).await?;
    tracing::debug!("{domain}: evaluating {record:?}");
    let profile = DmarcProfile::parse(&record, domain)?;
    let score = profile.score();
    Ok(DmarcEvaluation { profile, score })
}
