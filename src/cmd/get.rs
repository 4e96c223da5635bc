use anyhow::Result;
use clap::{value_t, ArgMatches};
use crate::http::Client;
use crate::tls::TlsConfig;

/// Fetches a URL and prints the status line, headers, and body.
pub async fn get(args: &ArgMatches<'_>) -> Result<()> {
    let url      = value_t!(args, "url", String)?;
    let insecure = args.is_present("insecure");
    let ca       = args.value_of("ca");

    let client = Client::with_tls(TlsConfig {
        ca_file:              ca.map(Into::into),
        insecure_skip_verify: insecure,
        ..TlsConfig::default()
    });

    let response = client.get(&url).await?;

    println!("{} {} {}", response.proto, response.status_code, response.status);
    for (name, value) in response.headers.iter() {
        println!("{}: {}", name, value);
    }
    println!();
    print!("{}", response.text());

    Ok(())
}
