use crate::print_fields;
use clap::Parser;
use dns_resolver::Resolver;
use mailrank_dmarc::{DmarcEvaluation, DmarcProfile, FeedbackAddress};

#[derive(Debug, Parser)]
/// Scores the DMARC policy of a domain.
///
/// The policy is fetched from the TXT records of `_dmarc.<domain>`,
/// unless it is supplied through --record.
pub struct DmarcCommand {
    /// The domain whose policy should be scored
    domain: String,

    /// Score this record text instead of the published record
    #[arg(long)]
    record: Option<String>,

    /// Instead of showing the human readable tabulated output,
    /// return the underlying json data.
    #[arg(long)]
    json: bool,
}

impl DmarcCommand {
    pub async fn run(&self, resolver: &dyn Resolver) -> anyhow::Result<()> {
        let evaluation = match &self.record {
            Some(record) => {
                let profile = DmarcProfile::parse(record, &self.domain)?;
                let score = profile.score();
                DmarcEvaluation { profile, score }
            }
            None => mailrank_dmarc::evaluate(resolver, &self.domain).await?,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
            return Ok(());
        }

        let p = &evaluation.profile;
        print_fields(vec![
            ("v", p.version.to_string()),
            ("p", p.policy.clone()),
            ("sp", p.subdomain_policy.clone()),
            ("adkim", p.align_dkim.clone()),
            ("aspf", p.align_spf.clone()),
            ("pct", p.rate.to_string()),
            ("fo", p.report_failure.clone()),
            ("rf", p.format.clone()),
            ("ri", p.interval.to_string()),
            ("rua", describe_feedback(p.aggregate_feedback())),
            ("ruf", describe_feedback(p.forensic_feedback())),
        ])?;
        println!();
        println!("score: {}", evaluation.score);

        Ok(())
    }
}

fn describe_feedback(addresses: Result<Vec<FeedbackAddress>, mailrank_dmarc::DmarcError>) -> String {
    match addresses {
        Ok(addresses) => addresses
            .iter()
            .map(|addr| match addr.size {
                Some(size) => format!("{} (max {size} bytes)", addr.uri),
                None => addr.uri.clone(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Err(err) => format!("{err:#}"),
    }
}
