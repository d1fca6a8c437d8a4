//! Decoder for the `tag=value; tag=value` parameter lists used by
//! DKIM key records, DKIM-Signature headers and DMARC records.
use nom::bytes::complete::{is_not, take_while, take_while1};
use nom::combinator::opt;
use nom::{IResult, Parser};
use std::collections::BTreeMap;

/// Parses a `;` delimited list of `key[=value]` segments into a map
/// from the lower-cased key to its value.
///
/// Each segment is trimmed before it is examined. A key without an
/// `=` maps to the empty string, which is how boolean style flags are
/// represented. When a key is repeated, the later values are appended
/// to the earlier one, separated by a comma.
///
/// Segments that don't start with a key are skipped; this function
/// never fails.
pub fn parse_params(input: &str) -> BTreeMap<String, String> {
    let mut params: BTreeMap<String, String> = BTreeMap::new();

    for segment in input.split(';') {
        let segment = segment.trim();
        let Ok((_, (key, value))) = key_value(segment) else {
            if !segment.is_empty() {
                tracing::trace!("skipping malformed tag segment {segment:?}");
            }
            continue;
        };

        let key = key.to_ascii_lowercase();
        match params.get_mut(&key) {
            Some(existing) if !existing.is_empty() => {
                existing.push(',');
                existing.push_str(value);
            }
            Some(existing) => {
                *existing = value.to_string();
            }
            None => {
                params.insert(key, value.to_string());
            }
        }
    }

    params
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// segment = key *( "=" / DQUOTE ) [ value ]
/// value   = 1*( any char except DQUOTE )
fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, key) = take_while1(is_key_char).parse(input)?;
    let (input, _) = take_while(|c: char| c == '=' || c == '"').parse(input)?;
    let (input, value) = opt(is_not("\"")).parse(input)?;
    Ok((input, (key, value.unwrap_or(""))))
}
