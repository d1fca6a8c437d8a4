use crate::print_fields;
use clap::Parser;
use dns_resolver::Resolver;
use mailrank_dkim::DkimSignatureProfile;
use serde::Serialize;
use std::io::Read;

#[derive(Debug, Parser)]
/// Scores a DKIM-Signature header.
///
/// Pass the header value as an argument, or `-` to read it from stdin.
/// Folded headers are accepted as-is.
pub struct DkimSignatureCommand {
    /// The value of the DKIM-Signature header
    signature: String,

    /// Score the signature as of this time, in seconds since
    /// the unix epoch, rather than the current time
    #[arg(long)]
    now: Option<i64>,

    /// Also fetch and score the public key that the
    /// signature refers to
    #[arg(long)]
    key: bool,

    /// Instead of showing the human readable tabulated output,
    /// return the underlying json data.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SignatureEvaluation {
    profile: DkimSignatureProfile,
    score: i64,
    key_score: Option<i64>,
}

impl DkimSignatureCommand {
    pub async fn run(&self, resolver: &dyn Resolver) -> anyhow::Result<()> {
        let header = if self.signature == "-" {
            let mut header = String::new();
            std::io::stdin().read_to_string(&mut header)?;
            header
        } else {
            self.signature.clone()
        };

        let profile = DkimSignatureProfile::parse(&header)?;
        let score = match self.now {
            Some(now) => profile.score_at(now),
            None => profile.score(),
        };
        let key_score = if self.key {
            Some(mailrank_dkim::score_dkim(resolver, &profile).await?)
        } else {
            None
        };

        if self.json {
            let evaluation = SignatureEvaluation {
                profile,
                score,
                key_score,
            };
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
            return Ok(());
        }

        let optional = |value: Option<i64>| value.map(|v| v.to_string()).unwrap_or_default();
        print_fields(vec![
            ("v", profile.version.to_string()),
            ("a", profile.algorithm.clone()),
            ("d", profile.domain.clone()),
            ("s", profile.selector.clone()),
            ("c", profile.canonicalization.clone()),
            ("i", profile.identity.clone()),
            ("q", profile.query_method.clone()),
            ("t", optional(profile.timestamp)),
            ("x", optional(profile.expiration)),
            ("l", optional(profile.body_length)),
            ("h", profile.signed_headers.join(":")),
        ])?;
        println!();
        println!("score: {score}");
        if let Some(key_score) = key_score {
            println!("key score: {key_score}");
        }

        Ok(())
    }
}
