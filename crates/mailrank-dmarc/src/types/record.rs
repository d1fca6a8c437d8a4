use crate::types::feedback_address::FeedbackAddress;
use crate::types::mode::Mode;
use crate::types::policy::Policy;
use crate::types::report_failure::ReportFailure;
use crate::DmarcError;
use serde::Serialize;
use std::str::FromStr;

/// The tags of a `_dmarc` TXT record, as published.
///
/// Values are kept verbatim; they are only interpreted when
/// the profile is scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DmarcProfile {
    /// `v=`, with the leading `DMARC` removed
    pub version: i64,
    /// `pct=`
    pub rate: i64,
    /// `ruf=`
    pub forensic_uri: String,
    /// `rua=`
    pub aggregate_uri: String,
    /// `p=`
    pub policy: String,
    /// `sp=`
    pub subdomain_policy: String,
    /// `adkim=`
    pub align_dkim: String,
    /// `aspf=`
    pub align_spf: String,
    /// `rf=`
    pub format: String,
    /// `ri=`, in seconds
    pub interval: i64,
    /// `fo=`
    pub report_failure: String,
    /// The domain that published the record
    pub domain: String,
}

impl DmarcProfile {
    pub fn new(domain: &str) -> Self {
        Self {
            version: 0,
            rate: 100,
            forensic_uri: String::new(),
            aggregate_uri: String::new(),
            policy: String::new(),
            subdomain_policy: String::new(),
            align_dkim: String::new(),
            align_spf: String::new(),
            format: "AFRF".to_string(),
            interval: 86400,
            report_failure: "0".to_string(),
            domain: domain.to_string(),
        }
    }

    /// Parses `record`, published by `domain`
    pub fn parse(record: &str, domain: &str) -> Result<Self, DmarcError> {
        let mut new = Self::new(domain);

        for (key, value) in tag_list::parse_params(record) {
            match key.as_str() {
                "v" => {
                    let version = value.strip_prefix("DMARC").unwrap_or(&value);
                    new.version = parse_integer("v", version)?;
                }
                "pct" => new.rate = parse_integer("pct", &value)?,
                "ri" => new.interval = parse_integer("ri", &value)?,
                "ruf" => new.forensic_uri = value,
                "rua" => new.aggregate_uri = value,
                "p" => new.policy = value,
                "sp" => new.subdomain_policy = value,
                "adkim" => new.align_dkim = value,
                "aspf" => new.align_spf = value,
                "rf" => new.format = value,
                "fo" => new.report_failure = value,
                _ => {
                    tracing::trace!("{domain}: ignoring DMARC tag {key}={value}");
                }
            }
        }

        Ok(new)
    }

    /// Scores how strictly the record is enforced.
    ///
    /// A record whose reports are sent outside of its own domain
    /// scores `0`. The sum of the policy, alignment and reporting
    /// weights is scaled by the whole number of times that `pct`
    /// covers 100%, so any partial rollout also scores `0`.
    pub fn score(&self) -> i64 {
        if self.version != 1 {
            return 0;
        }

        for uri in [&self.forensic_uri, &self.aggregate_uri] {
            if !uri.is_empty() && !uri.ends_with(&self.domain) {
                tracing::debug!("{}: reports are sent off-domain to {uri}", self.domain);
                return 0;
            }
        }

        let weights = weight::<Policy>(&self.policy, Policy::weight)
            + weight::<Policy>(&self.subdomain_policy, Policy::weight)
            + weight::<Mode>(&self.align_dkim, Mode::weight)
            + weight::<Mode>(&self.align_spf, Mode::weight)
            + weight::<ReportFailure>(&self.report_failure, ReportFailure::weight);

        (self.rate / 100) * weights
    }

    /// Decodes the `rua=` reporting addresses
    pub fn aggregate_feedback(&self) -> Result<Vec<FeedbackAddress>, DmarcError> {
        feedback_addresses(&self.aggregate_uri)
    }

    /// Decodes the `ruf=` reporting addresses
    pub fn forensic_feedback(&self) -> Result<Vec<FeedbackAddress>, DmarcError> {
        feedback_addresses(&self.forensic_uri)
    }
}

/// Weighs a tag value; values that are absent or not understood weigh nothing
fn weight<T: FromStr>(value: &str, weigh: fn(T) -> i64) -> i64 {
    T::from_str(value).map(weigh).unwrap_or(0)
}

fn parse_integer(tag: &'static str, value: &str) -> Result<i64, DmarcError> {
    value.parse().map_err(|_| DmarcError::InvalidInteger {
        tag,
        value: value.to_string(),
    })
}

fn feedback_addresses(value: &str) -> Result<Vec<FeedbackAddress>, DmarcError> {
    value
        .split(',')
        .filter(|addr| !addr.trim().is_empty())
        .map(|addr| FeedbackAddress::from_str(addr).map_err(DmarcError::InvalidFeedbackAddress))
        .collect()
}
