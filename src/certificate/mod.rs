/*!
 * Certificate & identity model
 *
 * Immutable certificates binding a distinguished name to a public key, with a
 * validity window, usage flags and a binary signed encoding. Chains are
 * ordered leaf to root and terminate in a self-signed certificate.
 */

mod bundle;
mod cert;
mod chain;
mod identity;
mod request;
mod usage;

pub use bundle::{decode_certificates, encode_certificates};
pub use cert::{Certificate, CertificateBuilder, TbsCertificate};
pub use chain::{verify_chain, verify_chain_now};
pub use identity::DistinguishedName;
pub use request::CertificateRequest;
pub use usage::{KeyUsage, KeyUsageSet};

#[cfg(test)]
mod tests;
