use crate::error::SpfError;
use crate::record::Qualifier;
use cidr::{IpCidr, IpInet};
use serde::Serialize;
use std::str::FromStr;

/// Best possible score for a set of ranges: a single host.
const SCORE_CEILING: f64 = 10.450842;
/// How quickly the score falls away as the number of authorized
/// addresses grows.
const SCORE_SLOPE: f64 = 0.450842;

/// The network ranges authorized by a mechanism type,
/// bucketed by the qualifier that was applied to them.
///
/// Ranges are only ever appended; overlapping and duplicate
/// ranges are kept and each contributes to [score_ip_nets].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RangeSet {
    pub pass: Vec<IpCidr>,
    pub fail: Vec<IpCidr>,
    pub soft_fail: Vec<IpCidr>,
    pub neutral: Vec<IpCidr>,
}

impl RangeSet {
    pub fn get(&self, qualifier: Qualifier) -> &[IpCidr] {
        match qualifier {
            Qualifier::Pass => &self.pass,
            Qualifier::Fail => &self.fail,
            Qualifier::SoftFail => &self.soft_fail,
            Qualifier::Neutral => &self.neutral,
        }
    }

    pub fn push(&mut self, qualifier: Qualifier, range: IpCidr) {
        match qualifier {
            Qualifier::Pass => self.pass.push(range),
            Qualifier::Fail => self.fail.push(range),
            Qualifier::SoftFail => self.soft_fail.push(range),
            Qualifier::Neutral => self.neutral.push(range),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pass.is_empty()
            && self.fail.is_empty()
            && self.soft_fail.is_empty()
            && self.neutral.is_empty()
    }
}

/// Parses an address with an optional `/len` suffix into the network
/// that contains it. When the length is omitted the range covers a
/// single host: `/128` for IPv6 addresses, `/32` otherwise.
pub fn parse_ip_range(expr: &str) -> Result<IpCidr, SpfError> {
    let with_len;
    let expr_with_len = if expr.contains('/') {
        expr
    } else if expr.contains(':') {
        with_len = format!("{expr}/128");
        &with_len
    } else {
        with_len = format!("{expr}/32");
        &with_len
    };

    IpInet::from_str(expr_with_len)
        .map(|inet| inet.network())
        .map_err(|err| SpfError::InvalidCidr {
            expr: expr.to_string(),
            reason: err.to_string(),
        })
}

/// Returns the number of addresses in a network with the given prefix
/// length, saturating at `i32::MAX`.
pub fn network_size(prefix_len: u8, is_ipv6: bool) -> i32 {
    let host_mask: u128 = if is_ipv6 {
        let shift = 128 - u32::from(prefix_len.min(128));
        !u128::MAX.checked_shl(shift).unwrap_or(0)
    } else {
        let shift = 32 - u32::from(prefix_len.min(32));
        u128::from(!u32::MAX.checked_shl(shift).unwrap_or(0))
    };

    host_mask
        .checked_add(1)
        .and_then(|size| i32::try_from(size).ok())
        .unwrap_or(i32::MAX)
}

/// Scores a list of authorized ranges: `0` when there are none,
/// otherwise close to `10` for a single host, falling
/// logarithmically as the number of covered addresses grows.
pub fn score_ip_nets(nets: &[IpCidr]) -> f64 {
    if nets.is_empty() {
        return 0.0;
    }

    let mut count = 1.0_f64;
    for net in nets {
        count += f64::from(network_size(net.network_length(), net.is_ipv6()));
    }
    if !count.is_finite() {
        count = f64::from(i32::MAX);
    }

    SCORE_CEILING - SCORE_SLOPE * count.ln()
}

#[cfg(test)]
mod test {
    use super::*;

    fn cidr(s: &str) -> IpCidr {
        parse_ip_range(s).unwrap()
    }

    #[test]
    fn ipv4_network_sizes() {
        k9::assert_equal!(network_size(32, false), 1);
        k9::assert_equal!(network_size(31, false), 2);
        k9::assert_equal!(network_size(24, false), 256);
        k9::assert_equal!(network_size(12, false), 1_048_576);
        k9::assert_equal!(network_size(4, false), 268_435_456);
        k9::assert_equal!(network_size(2, false), 1_073_741_824);
        // 2^31 and 2^32 do not fit
        k9::assert_equal!(network_size(1, false), i32::MAX);
        k9::assert_equal!(network_size(0, false), i32::MAX);
    }

    #[test]
    fn ipv6_network_sizes() {
        k9::assert_equal!(network_size(128, true), 1);
        k9::assert_equal!(network_size(127, true), 2);
        k9::assert_equal!(network_size(120, true), 256);
        k9::assert_equal!(network_size(64, true), i32::MAX);
        k9::assert_equal!(network_size(0, true), i32::MAX);
    }

    #[test]
    fn sizes_shrink_with_longer_prefixes() {
        for len in 2..32u8 {
            k9::assert_equal!(
                network_size(len, false),
                2 * network_size(len + 1, false),
                "/{len}"
            );
        }
        k9::assert_equal!(network_size(24, false), 256 * network_size(32, false));
    }

    #[test]
    fn parse_ranges() {
        k9::assert_equal!(
            cidr("192.168.0.1/32"),
            IpCidr::from_str("192.168.0.1/32").unwrap()
        );
        k9::assert_equal!(
            cidr("192.168.0.1"),
            IpCidr::from_str("192.168.0.1/32").unwrap()
        );
        k9::assert_equal!(
            cidr("192.168.0.1/31"),
            IpCidr::from_str("192.168.0.0/31").unwrap()
        );
        k9::assert_equal!(cidr("192.168.0.1/31").network_length(), 31);
        k9::assert_equal!(
            cidr("1080::8:800:200C:417A"),
            IpCidr::from_str("1080::8:800:200c:417a/128").unwrap()
        );
        k9::assert_equal!(
            cidr("1080::8:800:200C:417A/127"),
            IpCidr::from_str("1080::8:800:200c:417a/127").unwrap()
        );
        k9::assert_equal!(
            cidr("1080::8:800:200C:417B/127"),
            IpCidr::from_str("1080::8:800:200c:417a/127").unwrap()
        );
    }

    #[test]
    fn parse_range_errors() {
        assert!(matches!(
            parse_ip_range("192.168.0.300"),
            Err(SpfError::InvalidCidr { .. })
        ));
        assert!(matches!(
            parse_ip_range("192.168.0.1/33"),
            Err(SpfError::InvalidCidr { .. })
        ));
        assert!(matches!(
            parse_ip_range("mail.example.com"),
            Err(SpfError::InvalidCidr { .. })
        ));
    }

    #[test]
    fn empty_scores_zero() {
        k9::assert_equal!(score_ip_nets(&[]), 0.0);
    }

    #[test]
    fn scores() {
        let close = |nets: &[IpCidr], expect: f64| {
            let score = score_ip_nets(nets);
            assert!((score - expect).abs() < 1.0, "{nets:?} scored {score}");
        };
        close(&[cidr("192.168.0.1/32")], 10.0);
        close(&[cidr("192.168.0.1/16")], 6.0);
        close(&[cidr("192.168.0.1/12")], 5.0);
        close(&[cidr("192.168.0.1/8")], 3.0);
    }

    #[test]
    fn wider_ranges_score_lower() {
        let mut nets = vec![];
        let mut previous = f64::MAX;
        for expr in ["10.0.0.1/32", "10.0.1.0/24", "10.1.0.0/16", "11.0.0.0/8"] {
            nets.push(cidr(expr));
            let score = score_ip_nets(&nets);
            assert!(score < previous, "{expr}: {score} >= {previous}");
            previous = score;
        }
    }

    #[test]
    fn duplicates_are_counted() {
        let single = score_ip_nets(&[cidr("10.0.0.0/24")]);
        let double = score_ip_nets(&[cidr("10.0.0.0/24"), cidr("10.0.0.0/24")]);
        assert!(double < single);
    }

    #[test]
    fn range_set_buckets() {
        let mut set = RangeSet::default();
        assert!(set.is_empty());
        set.push(Qualifier::SoftFail, cidr("10.0.0.1"));
        set.push(Qualifier::SoftFail, cidr("10.0.0.1"));
        k9::assert_equal!(set.get(Qualifier::SoftFail).len(), 2);
        assert!(set.get(Qualifier::Pass).is_empty());
        assert!(!set.is_empty());
    }
}
