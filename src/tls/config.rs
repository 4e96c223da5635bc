use std::path::PathBuf;

/// TLS settings shared by the dial and listen sides.
///
/// Dialing verifies the server certificate against `ca_file` when one
/// is given and against the platform trust store otherwise, unless
/// `insecure_skip_verify` turns verification off. A client presents
/// `cert_file` and `key_file` if both are set. Listening requires
/// both.
#[derive(Clone, Debug, Default)]
pub struct TlsConfig {
    pub cert_file:            Option<PathBuf>,
    pub key_file:             Option<PathBuf>,
    pub ca_file:              Option<PathBuf>,
    pub insecure_skip_verify: bool,
}
