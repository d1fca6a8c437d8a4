use crate::{DkimError, DkimKeyProfile, DkimSignatureProfile, DNS_NAMESPACE};
use dns_resolver::{DnsError, Resolver};

/// Fetches and parses the key record that `domain` publishes
/// for `selector`.
///
/// <https://datatracker.ietf.org/doc/html/rfc6376#section-6.1.2>
pub async fn retrieve_key_profile(
    resolver: &dyn Resolver,
    domain: &str,
    selector: &str,
) -> Result<DkimKeyProfile, DkimError> {
    let dns_name = format!("{selector}.{DNS_NAMESPACE}.{domain}");
    let answer = match resolver.lookup_txt(&dns_name).await {
        Ok(answer) => answer,
        Err(DnsError::NotFound(_)) => return Err(DkimError::NoKeyRecord(dns_name)),
        Err(err) => return Err(err.into()),
    };

    // TODO: consider every published record; during key rotation
    // there may be more than one.
    let first = answer
        .first()
        .ok_or_else(|| DkimError::NoKeyRecord(dns_name.clone()))?;
    tracing::debug!("DKIM TXT: {first:?}");

    let mut profile = DkimKeyProfile::parse(first)?;
    profile.selector = selector.to_string();
    Ok(profile)
}

/// Scores the key that `signature` refers to through its `d=` and `s=`
/// tags. A signature that lacks either tag cannot be traced back to a
/// key and scores `0`.
pub async fn score_dkim(
    resolver: &dyn Resolver,
    signature: &DkimSignatureProfile,
) -> Result<i64, DkimError> {
    if signature.selector.is_empty() || signature.domain.is_empty() {
        return Ok(0);
    }

    retrieve_key_profile(resolver, &signature.domain, &signature.selector)
        .await?
        .score()
}
