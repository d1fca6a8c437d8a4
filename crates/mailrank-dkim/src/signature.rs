use crate::errors::{parse_integer, DkimError};
use serde::Serialize;
use std::collections::BTreeMap;

const PREFERRED_ALGORITHM: &str = "rsa-sha256";
const SIGNATURE_HEADER: &str = "DKIM-Signature";

/// The tags of a `DKIM-Signature` header.
///
/// <https://datatracker.ietf.org/doc/html/rfc6376#section-3.5>
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DkimSignatureProfile {
    // Required
    pub version: i64,
    pub algorithm: String,
    pub signature: String,
    pub body_hash: String,
    pub domain: String,
    pub signed_headers: Vec<String>,
    pub selector: String,

    // Recommended
    pub timestamp: Option<i64>,
    pub expiration: Option<i64>,

    // Optional
    pub canonicalization: String,
    pub identity: String,
    pub body_length: Option<i64>,
    pub query_method: String,
    pub copied_headers: BTreeMap<String, String>,
}

impl DkimSignatureProfile {
    /// Parses the value of a DKIM-Signature header. The header may
    /// still be folded; all whitespace is removed before the tags
    /// are decoded.
    pub fn parse(header_value: &str) -> Result<Self, DkimError> {
        let unfolded: String = header_value
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let mut profile = Self::default();
        for (tag, value) in tag_list::parse_params(&unfolded) {
            match tag.as_str() {
                "v" => profile.version = parse_integer("v", &value)?,
                "t" => profile.timestamp = Some(parse_integer("t", &value)?),
                "x" => profile.expiration = Some(parse_integer("x", &value)?),
                "l" => profile.body_length = Some(parse_integer("l", &value)?),
                "h" => {
                    profile.signed_headers = value.split(':').map(str::to_string).collect();
                }
                "z" => {
                    profile.copied_headers = value
                        .split('|')
                        .map(|entry| match entry.split_once(':') {
                            Some((name, value)) => (name.to_string(), value.to_string()),
                            None => (entry.to_string(), String::new()),
                        })
                        .collect();
                }
                "a" => profile.algorithm = value,
                "b" => profile.signature = value,
                "bh" => profile.body_hash = value,
                "d" => profile.domain = value,
                "s" => profile.selector = value,
                "c" => profile.canonicalization = value,
                "i" => profile.identity = value,
                "q" => profile.query_method = value,
                _ => {
                    tracing::trace!("ignoring signature tag {tag}={value}");
                }
            }
        }

        Ok(profile)
    }

    /// Scores the signature as of the current time
    pub fn score(&self) -> i64 {
        self.score_at(chrono::Utc::now().timestamp())
    }

    /// Scores the signature as of `now`, in seconds since the unix epoch.
    ///
    /// Signatures that are malformed, that sign themselves, that are
    /// dated in the future or that expire before they were made score
    /// `0`. A signature with `t=` but no `x=` falls into the last group. Otherwise the score rewards
    /// `rsa-sha256` over other algorithms, and adds one for every
    /// signed header.
    pub fn score_at(&self, now: i64) -> i64 {
        if self.version != 1
            || self
                .signed_headers
                .iter()
                .any(|name| name == SIGNATURE_HEADER)
        {
            return 0;
        }

        // absent timestamps count as the epoch
        let timestamp = self.timestamp.unwrap_or(0);
        if timestamp > now || self.expiration.unwrap_or(0) < timestamp {
            return 0;
        }

        let algorithm = if self.algorithm == PREFERRED_ALGORITHM {
            2
        } else {
            1
        };

        algorithm + self.signed_headers.len() as i64
    }
}
