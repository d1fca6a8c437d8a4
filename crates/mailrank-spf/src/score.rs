use crate::range::score_ip_nets;
use crate::record::{Qualifier, SpfProfile};
use std::collections::BTreeMap;

const ALIGNED_DOMAIN: f64 = 10.0;

/// Scores how tightly `profile` restricts the set of authorized senders.
///
/// A record ending in `+all` authorizes everyone and scores `0`.
/// Otherwise the passing `ip4`, `a` and `mx` ranges contribute according
/// to their size, and each `ptr`, `exists` and `include` domain adds or
/// subtracts a fixed amount depending on whether it falls within the
/// domain being evaluated.
pub fn score_spf(profile: &SpfProfile) -> f64 {
    if profile.all == Some(Qualifier::Pass) {
        return 0.0;
    }

    let mut score = score_ip_nets(&profile.ip4.pass)
        + score_ip_nets(&profile.a.pass)
        + score_ip_nets(&profile.mx.pass);

    for domains in [&profile.ptr, &profile.exists, &profile.include] {
        score += score_domains(domains, &profile.domain);
    }

    score
}

fn score_domains(domains: &BTreeMap<String, Qualifier>, own_domain: &str) -> f64 {
    domains
        .keys()
        .map(|name| {
            if name.is_empty() {
                0.0
            } else if name.ends_with(own_domain) {
                ALIGNED_DOMAIN
            } else {
                -ALIGNED_DOMAIN
            }
        })
        .sum()
}
