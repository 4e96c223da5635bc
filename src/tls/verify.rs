use std::time::SystemTime;
use rustls::{Certificate, Error, ServerName};
use rustls::client::{ServerCertVerified, ServerCertVerifier};

/// Accepts any server certificate without inspection. Installed only
/// when `insecure_skip_verify` is set.
pub struct InsecureVerifier;

impl ServerCertVerifier for InsecureVerifier {
    fn verify_server_cert(
        &self,
        _end_entity:    &Certificate,
        _intermediates: &[Certificate],
        _server_name:   &ServerName,
        _scts:          &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now:           SystemTime,
    ) -> Result<ServerCertVerified, Error> {
        Ok(ServerCertVerified::assertion())
    }
}
