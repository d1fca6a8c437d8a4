use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Policy {
    None,
    Quarantine,
    Reject,
}

impl Policy {
    /// How strongly the policy is enforced
    pub fn weight(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Quarantine => 1,
            Self::Reject => 2,
        }
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "none" => Self::None,
            "quarantine" => Self::Quarantine,
            "reject" => Self::Reject,
            _ => return Err(format!("invalid policy {value:?}")),
        })
    }
}
