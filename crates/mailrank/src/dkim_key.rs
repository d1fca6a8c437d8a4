use crate::print_fields;
use clap::Parser;
use dns_resolver::Resolver;
use mailrank_dkim::DkimKeyProfile;
use serde::Serialize;

#[derive(Debug, Parser)]
/// Scores a DKIM public key record.
///
/// The record is fetched from `<selector>._domainkey.<domain>`,
/// unless it is supplied through --record.
pub struct DkimKeyCommand {
    /// The signing domain
    domain: String,

    /// The selector that the key is published under
    selector: String,

    /// Score this record text instead of the published record
    #[arg(long)]
    record: Option<String>,

    /// Instead of showing the human readable tabulated output,
    /// return the underlying json data.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct KeyEvaluation {
    profile: DkimKeyProfile,
    score: i64,
}

impl DkimKeyCommand {
    pub async fn run(&self, resolver: &dyn Resolver) -> anyhow::Result<()> {
        let profile = match &self.record {
            Some(record) => {
                let mut profile = DkimKeyProfile::parse(record)?;
                profile.selector = self.selector.clone();
                profile
            }
            None => mailrank_dkim::retrieve_key_profile(resolver, &self.domain, &self.selector)
                .await?,
        };
        let score = profile.score()?;

        if self.json {
            let evaluation = KeyEvaluation { profile, score };
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
            return Ok(());
        }

        print_fields(vec![
            ("selector", profile.selector.clone()),
            ("v", profile.version.to_string()),
            ("k", profile.key_type.clone()),
            ("h", profile.hash_algorithms.clone()),
            ("g", profile.granularity.clone()),
            ("s", profile.service_type.clone()),
            ("n", profile.notes.clone()),
            (
                "t",
                profile.flags.iter().cloned().collect::<Vec<_>>().join(","),
            ),
        ])?;
        println!();
        println!("score: {score}");

        Ok(())
    }
}
