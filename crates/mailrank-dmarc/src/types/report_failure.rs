use std::str::FromStr;

/// The `fo=` failure reporting option
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ReportFailure {
    /// `0`: report when every mechanism failed to align
    AllFail,
    /// `1`: report when any mechanism failed to align
    AnyFail,
    /// `d`: report any DKIM failure
    Dkim,
    /// `s`: report any SPF failure
    Spf,
}

impl ReportFailure {
    pub fn weight(self) -> i64 {
        match self {
            Self::AllFail => 0,
            Self::Dkim | Self::Spf => 1,
            Self::AnyFail => 2,
        }
    }
}

impl FromStr for ReportFailure {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "0" => Self::AllFail,
            "1" => Self::AnyFail,
            "d" => Self::Dkim,
            "s" => Self::Spf,
            _ => return Err(format!("invalid report failure {value:?}")),
        })
    }
}
