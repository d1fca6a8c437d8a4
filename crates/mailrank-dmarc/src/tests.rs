use crate::{evaluate, fetch_dmarc_record, DmarcError, Status};
use dns_resolver::{DnsError, TestResolver};

#[tokio::test]
async fn discovery_skips_other_records() {
    let resolver = TestResolver::default()
        .with_txt("_dmarc.example.com", "v=spf1 -all")
        .with_txt(
            "_dmarc.example.com",
            "v=DMARC1; p=reject; rua=mailto:dmarc-feedback@example.com",
        )
        .with_txt("_dmarc.example.org", "google-site-verification=abcdef");

    k9::assert_equal!(
        fetch_dmarc_record(&resolver, "example.com").await.unwrap(),
        "v=DMARC1; p=reject; rua=mailto:dmarc-feedback@example.com"
    );
    k9::assert_equal!(
        fetch_dmarc_record(&resolver, "example.org").await.unwrap_err(),
        DmarcError::NoRecord("example.org".to_string())
    );
    k9::assert_equal!(
        fetch_dmarc_record(&resolver, "example.net").await.unwrap_err(),
        DmarcError::NoRecord("example.net".to_string())
    );
}

#[tokio::test]
async fn evaluate_domain() {
    let resolver = TestResolver::default().with_txt(
        "_dmarc.dmarcdomain.com",
        "v=DMARC1;p=reject;pct=100;rua=mailto:postmaster@dmarcdomain.com",
    );

    let evaluation = evaluate(&resolver, "dmarcdomain.com").await.unwrap();
    k9::assert_equal!(evaluation.score, 2);
    k9::assert_equal!(evaluation.profile.policy, "reject");
    k9::assert_equal!(evaluation.profile.domain, "dmarcdomain.com");
}

#[tokio::test]
async fn evaluate_partial_rollout() {
    let resolver = TestResolver::default().with_txt(
        "_dmarc.example.com",
        "v=DMARC1; p=quarantine; sp=reject; adkim=s; pct=50",
    );

    let evaluation = evaluate(&resolver, "example.com").await.unwrap();
    k9::assert_equal!(evaluation.profile.rate, 50);
    k9::assert_equal!(evaluation.score, 0);
}

#[tokio::test]
async fn evaluate_failures() {
    let resolver = TestResolver::default()
        .with_failure("_dmarc.broken.example.com")
        .with_txt("_dmarc.example.com", "v=DMARC1; p=reject; ri=daily");

    let err = evaluate(&resolver, "broken.example.com").await.unwrap_err();
    assert!(matches!(err, DmarcError::Dns(DnsError::ResolveFailed(_))), "{err:?}");
    k9::assert_equal!(err.status(), Status::Tempfail);

    let err = evaluate(&resolver, "example.com").await.unwrap_err();
    k9::assert_equal!(
        err,
        DmarcError::InvalidInteger {
            tag: "ri",
            value: "daily".to_string()
        }
    );
    k9::assert_equal!(err.status(), Status::Permfail);
}
