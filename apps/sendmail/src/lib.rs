//! sendmail
//!
//! Sends a single transactional email through whichever provider has
//! credentials in the environment (or in a `.env` file).
//!
//! ```text
//! $ echo "Your order shipped." | sendmail --to ann@example.com --subject "Shipping update"
//! ```
//!
//! Without `--body` the body is read from stdin until a line containing a
//! single `.` or end of input.

use clap::Parser;
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::Environment;
use courier::{CourierError, CredentialResolver, Envelope, Mailer, Platform, ProviderTable};
use eyre::{Result, WrapErr};
use std::io::BufRead;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Longest body accepted from stdin, in lines.
pub const MAX_BODY_LINES: usize = 500;

#[derive(Debug, Parser)]
#[command(name = "sendmail")]
#[command(about = "Send one transactional email via SendGrid, SendinBlue or Mailgun")]
pub struct Cli {
    /// Dotenv file to load before resolving credentials
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Recipient address
    #[arg(long)]
    pub to: String,

    /// Recipient display name
    #[arg(long, default_value = "")]
    pub to_name: String,

    /// Sender address (defaults to the provider's configured sender)
    #[arg(long)]
    pub from: Option<String>,

    /// Sender display name
    #[arg(long, default_value = "")]
    pub from_name: String,

    /// Reply-to address
    #[arg(long, default_value = "")]
    pub reply_to: String,

    /// Reply-to display name
    #[arg(long, default_value = "")]
    pub reply_to_name: String,

    #[arg(short, long)]
    pub subject: String,

    /// Plain text body; read from stdin when omitted
    #[arg(short, long)]
    pub body: Option<String>,

    /// HTML body (sanitized before sending)
    #[arg(long, default_value = "")]
    pub html: String,

    /// Only consider this provider (sendgrid, sendinblue, mailgun)
    #[arg(short, long, value_parser = parse_platform)]
    pub platform: Option<Platform>,
}

fn parse_platform(name: &str) -> Result<Platform, CourierError> {
    Platform::from_str(name).map_err(|_| CourierError::UnresolvedPlatform(name.to_string()))
}

/// A body read from standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub text: String,
    /// Input continued past the line limit and was dropped.
    pub truncated: bool,
}

/// Read a message body: stops at a line holding only `.`, at end of input,
/// or after `max_lines` lines.
pub fn read_body<R: BufRead>(reader: R, max_lines: usize) -> std::io::Result<Body> {
    let mut lines = reader.lines();
    let mut text = Vec::new();

    for line in lines.by_ref().take(max_lines) {
        let line = line?;
        if line == "." {
            return Ok(Body {
                text: text.join("\n"),
                truncated: false,
            });
        }
        text.push(line);
    }

    let truncated = match lines.next() {
        Some(line) => line? != ".",
        None => false,
    };

    Ok(Body {
        text: text.join("\n"),
        truncated,
    })
}

/// Build the envelope described by the command line.
pub fn build_envelope(
    cli: &Cli,
    resolver: &CredentialResolver,
    body: String,
) -> Result<Envelope> {
    let mut envelope = Envelope::new_transactional_with(resolver)
        .wrap_err("No provider credentials found in the environment")?
        .to(&cli.to_name, &cli.to)
        .reply_to(&cli.reply_to_name, &cli.reply_to)
        .with_subject(&cli.subject)
        .with_text(body)
        .with_html(&cli.html);

    envelope.from_name = cli.from_name.clone();
    if let Some(from) = &cli.from {
        envelope.from_addr = from.clone();
    }

    Ok(envelope)
}

/// Run the command.
pub async fn run(cli: Cli) -> Result<()> {
    // Load first so APP_ENV and RUST_LOG from the file apply to tracing
    let env_file = core_config::env_file::load_env_file(&cli.env_file);

    install_color_eyre();
    let environment = Environment::from_env();
    init_tracing(&environment);

    match &env_file {
        Ok(path) => info!(path = %path.display(), "Loaded environment file"),
        Err(e) => warn!(error = %e, "Continuing without environment file"),
    }

    let table = match cli.platform {
        Some(platform) => ProviderTable::standard().restricted_to(platform),
        None => ProviderTable::standard(),
    };
    let resolver = CredentialResolver::new(table);

    let body = match &cli.body {
        Some(body) => body.clone(),
        None => {
            let body = read_body(std::io::stdin().lock(), MAX_BODY_LINES)
                .wrap_err("Failed to read body from stdin")?;
            if body.truncated {
                warn!(
                    max_lines = MAX_BODY_LINES,
                    "Body exceeds the line limit; remaining input ignored"
                );
            }
            body.text
        }
    };

    let envelope = build_envelope(&cli, &resolver, body)?;
    let mailer = Mailer::from_env().wrap_err("Invalid mailer configuration")?;

    let sent = mailer
        .send(&envelope)
        .await
        .wrap_err_with(|| format!("Failed to send email to {}", envelope.to_addr))?;

    println!(
        "Sent via {} (status {}, message id {})",
        envelope.platform().map(|p| p.to_string()).unwrap_or_default(),
        sent.status,
        sent.message_id.as_deref().unwrap_or("-"),
    );

    Ok(())
}
