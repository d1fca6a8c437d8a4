use crate::errors::{parse_integer, DkimError};
use serde::Serialize;
use std::collections::BTreeSet;

/// Flag published in `t=` while a domain is testing DKIM
const TESTING_FLAG: &str = "y";

/// The contents of a `<selector>._domainkey.<domain>` TXT record.
///
/// <https://datatracker.ietf.org/doc/html/rfc6376#section-3.6.1>
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DkimKeyProfile {
    /// `v=`, with the leading `DKIM` removed
    pub version: i64,
    /// `g=`
    pub granularity: String,
    /// `h=`
    pub hash_algorithms: String,
    /// `k=`
    pub key_type: String,
    /// `n=`
    pub notes: String,
    /// `p=`, base64 encoded
    pub public_key: String,
    /// `s=`
    pub service_type: String,
    /// `t=`
    pub flags: BTreeSet<String>,
    /// The selector that the record was published under, when it
    /// was obtained from DNS
    pub selector: String,
}

impl DkimKeyProfile {
    pub fn parse(record: &str) -> Result<Self, DkimError> {
        let mut profile = Self::default();

        for (tag, value) in tag_list::parse_params(record) {
            match tag.as_str() {
                "v" => {
                    let version = value.strip_prefix("DKIM").unwrap_or(&value);
                    profile.version = parse_integer("v", version)?;
                }
                "t" => {
                    profile.flags = value.split(',').map(str::to_string).collect();
                }
                "g" => profile.granularity = value,
                "h" => profile.hash_algorithms = value,
                "k" => profile.key_type = value,
                "n" => profile.notes = value,
                "p" => profile.public_key = value,
                "s" => profile.service_type = value,
                _ => {
                    tracing::trace!("ignoring key record tag {tag}={value}");
                }
            }
        }

        Ok(profile)
    }

    pub fn is_testing(&self) -> bool {
        self.flags.contains(TESTING_FLAG)
    }

    /// Scores the key by the decoded length of its public key material,
    /// or `0` while the domain is in testing mode.
    pub fn score(&self) -> Result<i64, DkimError> {
        if self.is_testing() {
            return Ok(0);
        }

        let bytes = data_encoding::BASE64
            .decode(self.public_key.as_bytes())
            .map_err(|err| DkimError::Decode(format!("{err}")))?;
        Ok(bytes.len() as i64)
    }
}
