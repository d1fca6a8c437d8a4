//! Scoring of DKIM key records and DKIM-Signature headers:
//! <https://datatracker.ietf.org/doc/html/rfc6376>

mod errors;
mod key;
mod public_key;
mod signature;

pub use errors::{DkimError, Status};
pub use key::DkimKeyProfile;
pub use public_key::{retrieve_key_profile, score_dkim};
pub use signature::DkimSignatureProfile;

pub const DNS_NAMESPACE: &str = "_domainkey";
