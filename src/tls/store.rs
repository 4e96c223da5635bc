use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use rustls::{Certificate, OwnedTrustAnchor, PrivateKey, RootCertStore};
use rustls_native_certs::load_native_certs;
use rustls_pemfile::Item;
use tracing::debug;
use webpki::TrustAnchor;
use webpki_roots::TLS_SERVER_ROOTS;
use crate::error::{Error, ErrorKind, Result};
use super::TlsConfig;

/// Root certificates for checking the server. The configured CA file
/// wins when set, then the platform trust store, then the bundled
/// roots when the platform store cannot be read.
pub fn roots(config: &TlsConfig) -> Result<RootCertStore> {
    let mut store = RootCertStore::empty();

    if let Some(path) = &config.ca_file {
        for cert in certs(path)? {
            store.add(&cert).map_err(|e| {
                let msg = format!("invalid certificate in {}", path.display());
                Error::with_cause(ErrorKind::Tls, msg, e)
            })?;
        }
        return Ok(store);
    }

    match native() {
        Ok(anchors) => store.add_server_trust_anchors(anchors.into_iter()),
        Err(e)      => {
            debug!("platform trust store unavailable: {}", e);
            store.add_server_trust_anchors(bundled());
        }
    }

    Ok(store)
}

/// Certificates from a PEM file, in file order.
pub fn certs(path: &Path) -> Result<Vec<Certificate>> {
    let mut file = reader(path)?;

    let certs = rustls_pemfile::certs(&mut file).map_err(|e| read_error(path, e))?;
    if certs.is_empty() {
        let msg = format!("no certificates in {}", path.display());
        return Err(Error::new(ErrorKind::Tls, msg));
    }

    Ok(certs.into_iter().map(Certificate).collect())
}

/// First private key in a PEM file, whether PKCS#8, RSA, or EC.
pub fn key(path: &Path) -> Result<PrivateKey> {
    let mut file = reader(path)?;

    loop {
        match rustls_pemfile::read_one(&mut file).map_err(|e| read_error(path, e))? {
            Some(Item::PKCS8Key(key)) => return Ok(PrivateKey(key)),
            Some(Item::RSAKey(key))   => return Ok(PrivateKey(key)),
            Some(Item::ECKey(key))    => return Ok(PrivateKey(key)),
            Some(_)                   => continue,
            None                      => break,
        }
    }

    let msg = format!("no private key in {}", path.display());
    Err(Error::new(ErrorKind::Tls, msg))
}

fn native() -> Result<Vec<OwnedTrustAnchor>> {
    let certs = load_native_certs().map_err(|e| {
        Error::with_cause(ErrorKind::Tls, "cannot load platform trust store", e)
    })?;

    certs.iter().map(|cert| {
        let anchor = TrustAnchor::try_from_cert_der(&cert.0).map_err(|e| {
            Error::with_cause(ErrorKind::Tls, "invalid platform trust anchor", e)
        })?;
        Ok(owned(&anchor))
    }).collect()
}

fn bundled() -> impl Iterator<Item = OwnedTrustAnchor> {
    TLS_SERVER_ROOTS.0.iter().map(owned)
}

fn owned(anchor: &TrustAnchor<'_>) -> OwnedTrustAnchor {
    OwnedTrustAnchor::from_subject_spki_name_constraints(
        anchor.subject,
        anchor.spki,
        anchor.name_constraints,
    )
}

fn reader(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        Error::with_cause(ErrorKind::Tls, format!("cannot open {}", path.display()), e)
    })?;
    Ok(BufReader::new(file))
}

fn read_error(path: &Path, cause: io::Error) -> Error {
    Error::with_cause(ErrorKind::Tls, format!("cannot read {}", path.display()), cause)
}
