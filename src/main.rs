use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use certify::request::IssuanceRequest;
use certify::{CertifyOptions, DEFAULT_MIN_RSA_BITS, certify_with};

#[derive(Parser)]
#[command(name = "certify")]
#[command(about = "Issue one X.509 certificate from a JSON request")]
#[command(long_about = "
Issue one X.509 certificate from a JSON request.

The request carries the subject, the subject key (PEM) or a signed public
key proof (SPKAC), an optional signing key and signing certificate, a
hexadecimal serial number, the validity window and a list of extensions.
The result is printed as JSON on stdout.

Set RUST_LOG=debug to trace the issuance stages on stderr.")]
#[command(version)]
struct Cli {
    /// The JSON request
    #[arg(value_name = "REQUEST", conflicts_with = "file")]
    request: Option<String>,

    /// Read the JSON request from a file ("-" for stdin)
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,

    /// Smallest RSA signing key accepted, in bits
    #[arg(long, value_name = "BITS", default_value_t = DEFAULT_MIN_RSA_BITS)]
    min_rsa_bits: usize,
}

fn read_request(cli: &Cli) -> Result<String> {
    match (&cli.request, &cli.file) {
        (Some(request), _) => Ok(request.clone()),
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read request from stdin")?;
            Ok(input)
        }
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request from {}", path.display())),
        (None, None) => bail!("No request given; pass it as an argument or with --file"),
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries the result
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let request = IssuanceRequest::from_json(&read_request(&cli)?)?;
    let options = CertifyOptions::builder()
        .min_rsa_bits(cli.min_rsa_bits)
        .build();

    let result = certify_with(&request, &options)?;
    let output = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");
    Ok(())
}
