use crate::error::SpfError;
use crate::range::{parse_ip_range, RangeSet};
use dns_resolver::Resolver;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    /// `+`
    #[default]
    Pass,
    /// `-`
    Fail,
    /// `~`
    SoftFail,
    /// `?`
    Neutral,
}

impl Qualifier {
    fn parse(c: char) -> Option<Self> {
        Some(match c {
            '+' => Self::Pass,
            '-' => Self::Fail,
            '~' => Self::SoftFail,
            '?' => Self::Neutral,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Qualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let label = match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::SoftFail => "softfail",
            Self::Neutral => "neutral",
        };
        f.write_str(label)
    }
}

/// Everything that an SPF record authorizes, accumulated
/// mechanism by mechanism.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpfProfile {
    pub ip4: RangeSet,
    pub ip6: RangeSet,
    pub a: RangeSet,
    pub mx: RangeSet,
    /// hostnames produced by `ptr` lookups
    pub ptr: BTreeMap<String, Qualifier>,
    /// `exists` domains, unexpanded
    pub exists: BTreeMap<String, Qualifier>,
    /// `include` domains; these are not followed
    pub include: BTreeMap<String, Qualifier>,

    /// The `all` mechanism, if the record has one
    pub all: Option<Qualifier>,
    pub version: i64,

    /// The IP address under evaluation
    pub ip: String,
    pub domain: String,
    pub record: String,
}

impl SpfProfile {
    /// Creates an empty profile for `record`, reading only
    /// the leading `v=spfN` version term.
    pub fn new(record: &str, domain: &str, ip: &str) -> Result<Self, SpfError> {
        let version_term = record.split_ascii_whitespace().next().unwrap_or("");
        let version = version_term
            .strip_prefix("v=spf")
            .unwrap_or(version_term)
            .parse()
            .map_err(|_| SpfError::InvalidVersion(record.to_string()))?;

        Ok(Self {
            version,
            ip: ip.to_string(),
            domain: domain.to_string(),
            record: record.to_string(),
            ..Self::default()
        })
    }

    /// Parses `record`, the SPF policy published by `domain`, while
    /// evaluating `ip`.
    ///
    /// `a`, `mx` and `ptr` mechanisms are resolved as they are
    /// encountered; any resolution failure aborts the parse.
    pub async fn parse(
        record: &str,
        domain: &str,
        ip: &str,
        resolver: &dyn Resolver,
    ) -> Result<Self, SpfError> {
        let mut profile = Self::new(record, domain, ip)?;
        for term in record.split_ascii_whitespace().skip(1) {
            profile.parse_mechanism(term, resolver).await?;
        }
        Ok(profile)
    }

    /// Applies a single mechanism term, such as `-ip4:192.0.2.0/24`,
    /// to the profile.
    pub async fn parse_mechanism(
        &mut self,
        term: &str,
        resolver: &dyn Resolver,
    ) -> Result<(), SpfError> {
        let (qualifier, mechanism) = match term.chars().next().and_then(Qualifier::parse) {
            Some(q) => (q, &term[1..]),
            None => (Qualifier::default(), term),
        };

        if mechanism == "all" {
            self.all = Some(qualifier);
            return Ok(());
        }

        let (name, arg) = match mechanism.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (mechanism, None),
        };
        tracing::debug!("{}: {qualifier:?} {name} {arg:?}", self.domain);

        if name.starts_with("ip4") {
            let range = parse_ip_range(require_arg(name, arg)?)?;
            self.ip4.push(qualifier, range);
        } else if name.starts_with("ip6") {
            let range = parse_ip_range(require_arg(name, arg)?)?;
            self.ip6.push(qualifier, range);
        } else if name.starts_with("a") {
            let range = match arg {
                Some(domain) => Target::Domain(domain),
                None => Target::Own(self.own_address(name, "a")?),
            };
            range.resolve_into(qualifier, &mut self.a, resolver).await?;
        } else if name.starts_with("mx") {
            let range = match arg {
                Some(domain) => Target::Domain(domain),
                None => Target::Own(self.own_address(name, "mx")?),
            };
            range.resolve_into(qualifier, &mut self.mx, resolver).await?;
        } else if name.starts_with("ptr") {
            let target = arg.unwrap_or(&self.domain);
            for host in resolver.lookup_addr(target).await? {
                self.ptr.insert(host, qualifier);
            }
        } else if name.starts_with("exists") {
            self.exists
                .insert(require_arg(name, arg)?.to_string(), qualifier);
        } else if name.starts_with("include") {
            self.include
                .insert(require_arg(name, arg)?.to_string(), qualifier);
        } else {
            tracing::debug!("{}: ignoring term {term}", self.domain);
        }

        Ok(())
    }

    /// Substitutes the evaluated IP for the mechanism name, keeping
    /// any cidr length suffix: `a/24` becomes `192.0.2.1/24`.
    fn own_address(&self, name: &str, mechanism: &str) -> Result<String, SpfError> {
        if self.ip.is_empty() {
            return Err(SpfError::MissingIp(mechanism.to_string()));
        }
        Ok(name.replacen(mechanism, &self.ip, 1))
    }
}

fn require_arg<'a>(name: &str, arg: Option<&'a str>) -> Result<&'a str, SpfError> {
    match arg {
        Some(arg) if !arg.is_empty() => Ok(arg),
        _ => Err(SpfError::MissingArgument(name.to_string())),
    }
}

/// What an `a` or `mx` mechanism points at
enum Target<'a> {
    /// An address expression derived from the evaluated IP
    Own(String),
    /// `domain[/len]`, to be resolved to its host addresses
    Domain(&'a str),
}

impl Target<'_> {
    async fn resolve_into(
        self,
        qualifier: Qualifier,
        ranges: &mut RangeSet,
        resolver: &dyn Resolver,
    ) -> Result<(), SpfError> {
        match self {
            Self::Own(expr) => {
                ranges.push(qualifier, parse_ip_range(&expr)?);
            }
            Self::Domain(target) => {
                let (domain, cidr_len) = match target.split_once('/') {
                    Some((domain, len)) => (domain, Some(len)),
                    None => (target, None),
                };
                for host in resolver.lookup_host(domain).await? {
                    let range = match cidr_len {
                        Some(len) => parse_ip_range(&format!("{host}/{len}"))?,
                        None => parse_ip_range(&host.to_string())?,
                    };
                    ranges.push(qualifier, range);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cidr::IpCidr;
    use dns_resolver::TestResolver;
    use std::str::FromStr;

    fn cidr(s: &str) -> IpCidr {
        IpCidr::from_str(s).unwrap()
    }

    async fn apply(term: &str, ip: &str) -> SpfProfile {
        let resolver = TestResolver::default();
        let mut profile = SpfProfile {
            ip: ip.to_string(),
            ..SpfProfile::default()
        };
        profile.parse_mechanism(term, &resolver).await.unwrap();
        profile
    }

    #[tokio::test]
    async fn ip4_qualifiers() {
        let single = vec![cidr("192.168.0.1/32")];

        let profile = apply("+ip4:192.168.0.1", "").await;
        k9::assert_equal!(profile.ip4.pass, single);

        let profile = apply("ip4:192.168.0.1", "").await;
        k9::assert_equal!(profile.ip4.pass, single);

        let profile = apply("-ip4:192.168.0.1", "").await;
        k9::assert_equal!(profile.ip4.fail, single);
        assert!(profile.ip4.pass.is_empty());

        let profile = apply("?ip4:192.168.0.1", "").await;
        k9::assert_equal!(profile.ip4.neutral, single);

        let profile = apply("~ip4:192.168.0.1", "").await;
        k9::assert_equal!(profile.ip4.soft_fail, single);

        let profile = apply("+ip4:192.168.0.1/31", "").await;
        k9::assert_equal!(profile.ip4.pass, vec![cidr("192.168.0.0/31")]);
    }

    #[tokio::test]
    async fn ip6() {
        let profile = apply("+ip6:1080::8:800:200C:417A", "").await;
        k9::assert_equal!(
            profile.ip6.pass,
            vec![cidr("1080::8:800:200c:417a/128")]
        );
        assert!(profile.ip4.is_empty());

        let profile = apply("+ip6:1080::8:800:200C:417A/127", "").await;
        k9::assert_equal!(
            profile.ip6.pass,
            vec![cidr("1080::8:800:200c:417a/127")]
        );
    }

    #[tokio::test]
    async fn bare_a_uses_evaluated_ip() {
        let profile = apply("a", "127.0.0.1").await;
        k9::assert_equal!(profile.a.pass, vec![cidr("127.0.0.1/32")]);

        let profile = apply("a/31", "127.0.0.1").await;
        k9::assert_equal!(profile.a.pass, vec![cidr("127.0.0.0/31")]);

        let profile = apply("-a/31", "127.0.0.1").await;
        k9::assert_equal!(profile.a.fail, vec![cidr("127.0.0.0/31")]);

        let profile = apply("mx", "2001:db8::1").await;
        k9::assert_equal!(profile.mx.pass, vec![cidr("2001:db8::1/128")]);
        assert!(profile.a.is_empty());
    }

    #[tokio::test]
    async fn bare_a_without_ip() {
        let resolver = TestResolver::default();
        let mut profile = SpfProfile::default();
        k9::assert_equal!(
            profile.parse_mechanism("a", &resolver).await.unwrap_err(),
            SpfError::MissingIp("a".to_string())
        );
    }

    #[tokio::test]
    async fn all_is_recorded_without_ranges() {
        let profile = apply("-all", "127.0.0.1").await;
        k9::assert_equal!(profile.all, Some(Qualifier::Fail));
        assert!(profile.a.is_empty());

        let profile = apply("all", "127.0.0.1").await;
        k9::assert_equal!(profile.all, Some(Qualifier::Pass));
    }

    #[tokio::test]
    async fn literal_domains() {
        let resolver = TestResolver::default();
        let mut profile = SpfProfile::default();
        for term in [
            "include:_spf.google.com",
            "~exists:%{i}.spf.example.com",
            "-include:_spf.google.com",
        ] {
            profile.parse_mechanism(term, &resolver).await.unwrap();
        }
        k9::assert_equal!(
            profile.include,
            BTreeMap::from([("_spf.google.com".to_string(), Qualifier::Fail)])
        );
        k9::assert_equal!(
            profile.exists,
            BTreeMap::from([("%{i}.spf.example.com".to_string(), Qualifier::SoftFail)])
        );
    }

    #[tokio::test]
    async fn modifiers_are_ignored() {
        let profile = apply("redirect=_spf.example.com", "").await;
        k9::assert_equal!(profile, SpfProfile::default());
    }

    #[tokio::test]
    async fn missing_arguments() {
        let resolver = TestResolver::default();
        let mut profile = SpfProfile::default();
        k9::assert_equal!(
            profile.parse_mechanism("ip4", &resolver).await.unwrap_err(),
            SpfError::MissingArgument("ip4".to_string())
        );
        k9::assert_equal!(
            profile.parse_mechanism("include:", &resolver).await.unwrap_err(),
            SpfError::MissingArgument("include".to_string())
        );
    }

    #[tokio::test]
    async fn malformed_range() {
        let resolver = TestResolver::default();
        let mut profile = SpfProfile::default();
        let err = profile
            .parse_mechanism("ip4:192.168.0.256", &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, SpfError::InvalidCidr { .. }), "{err:?}");
    }

    #[test]
    fn version() {
        k9::assert_equal!(SpfProfile::new("v=spf1 -all", "", "").unwrap().version, 1);
        k9::assert_equal!(
            SpfProfile::new("v=spfX -all", "", "").unwrap_err(),
            SpfError::InvalidVersion("v=spfX -all".to_string())
        );
        assert!(SpfProfile::new("", "", "").is_err());
    }
}
