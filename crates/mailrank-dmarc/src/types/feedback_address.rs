use serde::Serialize;
use std::str::FromStr;

/// A reporting URI from `rua=` or `ruf=`, with its optional
/// `!size` limit converted to bytes.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct FeedbackAddress {
    pub uri: String,
    pub size: Option<u64>,
}

impl FromStr for FeedbackAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty feedback address".to_owned());
        }

        let Some((uri, size)) = s.rsplit_once('!') else {
            return Ok(Self {
                uri: s.to_owned(),
                size: None,
            });
        };

        let size = size.trim();
        let (digits, power) = match size.chars().next_back() {
            Some('k') => (&size[..size.len() - 1], 10),
            Some('m') => (&size[..size.len() - 1], 20),
            Some('g') => (&size[..size.len() - 1], 30),
            Some('t') => (&size[..size.len() - 1], 40),
            Some(_) => (size, 0),
            None => return Err(format!("empty size in {s:?}")),
        };

        let size = u64::from_str(digits)
            .ok()
            .and_then(|size| size.checked_mul(1 << power))
            .ok_or_else(|| format!("invalid size in {s:?}"))?;
        Ok(Self {
            uri: uri.to_owned(),
            size: Some(size),
        })
    }
}
