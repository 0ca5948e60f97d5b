//! `icf` CLI: inspect, verify and produce ICF badge capsules.
//!
//! Usage:
//!   icf inspect <in.icf|-> [--json]
//!   icf verify  <in.icf|-> [--keyring <file>] [--permissive]
//!   icf hash    <in|->
//!   icf seal    <manifest.json|-> --secret-key <file> --authority <hex16> -o <out.icf|->
//!   icf keygen

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use icf_capsule::{Keyring, ParseOpts};
use icf_core::{AuthorityId, BadgeType, Capsule, CapsuleWriter, Tag};
use serde::Deserialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "icf", version, about = "ICF badge capsule CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a capsule (hash checked when present) and print it
    Inspect {
        /// Input capsule file (or - for stdin)
        input: String,
        /// Print a JSON summary instead of text
        #[arg(long)]
        json: bool,
    },
    /// Verify hash, signature and authority of a capsule
    Verify {
        /// Input capsule file (or - for stdin)
        input: String,
        /// JSON file mapping authority id (16 hex) -> Ed25519 public key (64 hex)
        #[arg(long, env = "ICF_KEYRING")]
        keyring: Option<PathBuf>,
        /// Only check framing, field sizes and the hash
        #[arg(long)]
        permissive: bool,
    },
    /// SHA-256 of raw bytes
    Hash {
        /// Input file (or - for stdin)
        input: String,
    },
    /// Build a capsule from a JSON manifest and seal it
    Seal {
        /// Manifest JSON file (or - for stdin)
        manifest: String,
        /// Ed25519 secret key file (32 bytes hex)
        #[arg(long)]
        secret_key: PathBuf,
        /// Authority id, 16 hex digits
        #[arg(long)]
        authority: AuthorityId,
        /// Output capsule file (or - for stdout)
        #[arg(short, long, default_value = "-")]
        output: String,
    },
    /// Generate an Ed25519 keypair, printed as JSON hex
    Keygen,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "icf=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect { input, json } => cmd_inspect(&input, json),
        Commands::Verify {
            input,
            keyring,
            permissive,
        } => cmd_verify(&input, keyring.as_deref(), permissive),
        Commands::Hash { input } => cmd_hash(&input),
        Commands::Seal {
            manifest,
            secret_key,
            authority,
            output,
        } => cmd_seal(&manifest, &secret_key, authority, &output),
        Commands::Keygen => cmd_keygen(),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_inspect(input: &str, json: bool) -> Result<()> {
    let bytes = read_input_bytes(input)?;
    let capsule = icf_capsule::parse_permissive(&bytes).map_err(icf_error)?;
    if json {
        let s = serde_json::to_string_pretty(&capsule_to_json(&capsule))?;
        println!("{s}");
    } else {
        print!("{capsule}");
    }
    Ok(())
}

fn cmd_verify(input: &str, keyring: Option<&Path>, permissive: bool) -> Result<()> {
    let bytes = read_input_bytes(input)?;
    let capsule = if permissive {
        icf_capsule::parse_permissive(&bytes).map_err(icf_error)?
    } else {
        let path = keyring
            .ok_or_else(|| anyhow!("Err.Args.MissingKeyring: --keyring or ICF_KEYRING required"))?;
        let ring = Keyring::load(path)
            .with_context(|| format!("loading keyring {}", path.display()))?;
        tracing::debug!(keys = ring.len(), path = %path.display(), "keyring loaded");
        icf_capsule::parse(&bytes, &ParseOpts::strict(&ring)).map_err(icf_error)?
    };
    match capsule.authority {
        Some(id) if !permissive => println!("OK authority={id}"),
        _ => println!("OK"),
    }
    Ok(())
}

fn cmd_hash(input: &str) -> Result<()> {
    let bytes = read_input_bytes(input)?;
    println!("{}", hex::encode(icf_core::hash_bytes(&bytes)));
    Ok(())
}

fn cmd_seal(manifest: &str, sk_path: &Path, authority: AuthorityId, output: &str) -> Result<()> {
    let json_str = read_input(manifest)?;
    let m: Manifest = serde_json::from_str(&json_str).context("Err.Parse.InvalidManifestJSON")?;
    let writer = m.to_writer()?;
    let sk = load_signing_key(sk_path)?;
    let bytes = icf_capsule::sign(writer, &sk, authority);
    tracing::debug!(len = bytes.len(), %authority, output, "capsule sealed");
    write_output(output, &bytes)
}

fn cmd_keygen() -> Result<()> {
    let sk = ed25519_dalek::SigningKey::generate(&mut rand_core::OsRng);
    let out = serde_json::json!({
        "secret_key": hex::encode(sk.to_bytes()),
        "public_key": hex::encode(sk.verifying_key().to_bytes()),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    badge: Option<String>,
    url: Option<String>,
    language: Option<String>,
    title: Option<String>,
    tag: Option<ManifestTag>,
    retention: Option<u8>,
    expires: Option<u32>,
    /// Stored as compact JSON.
    payload: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestTag {
    cycle: u8,
    subject: u8,
    #[serde(default)]
    sub: u8,
}

impl Manifest {
    fn to_writer(&self) -> Result<CapsuleWriter> {
        let mut w = CapsuleWriter::new();
        if let Some(badge) = &self.badge {
            w.badge_type(parse_badge(badge)?).map_err(icf_error)?;
        }
        if let Some(url) = &self.url {
            w.url(url).map_err(icf_error)?;
        }
        if let Some(lang) = &self.language {
            w.language(lang).map_err(icf_error)?;
        }
        if let Some(title) = &self.title {
            w.title(title).map_err(icf_error)?;
        }
        if let Some(t) = &self.tag {
            w.tag(Tag::from_bytes([t.cycle, t.subject, t.sub]))
                .map_err(icf_error)?;
        }
        if let Some(r) = self.retention {
            w.retention(r).map_err(icf_error)?;
        }
        if let Some(e) = self.expires {
            w.expires(e).map_err(icf_error)?;
        }
        if let Some(p) = &self.payload {
            w.payload(&serde_json::to_vec(p)?).map_err(icf_error)?;
        }
        Ok(w)
    }
}

fn parse_badge(s: &str) -> Result<BadgeType> {
    match s {
        "resource" => Ok(BadgeType::Resource),
        "configuration" => Ok(BadgeType::Configuration),
        "admin" => Ok(BadgeType::Admin),
        other => Err(anyhow!(
            "Err.Manifest.BadgeType: {other:?} (expected resource, configuration or admin)"
        )),
    }
}

fn capsule_to_json(c: &Capsule) -> serde_json::Value {
    let payload = c.payload.as_ref().map(|p| match p.to_json() {
        Some(v) => v,
        None => serde_json::json!({ "$bytes": hex::encode(p.as_bytes()) }),
    });
    serde_json::json!({
        "badge_type": c.badge_type.as_str(),
        "url": c.url.to_string(),
        "language": c.language_code(),
        "title": c.title.to_string(),
        "tag": {
            "cycle": c.tag.cycle.as_str(),
            "subject": c.tag.subject.as_str(),
            "sub": c.tag.sub,
        },
        "retention": c.retention,
        "expires": c.expires,
        "payload": payload,
        "hash": c.hash.as_deref().map(hex::encode),
        "signed": c.has_signature(),
        "authority": c.authority.map(|a| a.to_string()),
    })
}

fn icf_error(e: icf_core::Error) -> anyhow::Error {
    anyhow!("{}: {e}", e.code())
}

// ---------------------------------------------------------------------------
// I/O helpers
// ---------------------------------------------------------------------------

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {path}"))
    }
}

fn read_input_bytes(path: &str) -> Result<Vec<u8>> {
    if path == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(path).with_context(|| format!("reading {path}"))
    }
}

fn write_output(path: &str, data: &[u8]) -> Result<()> {
    if path == "-" {
        std::io::stdout().write_all(data)?;
        std::io::stdout().flush()?;
    } else {
        std::fs::write(path, data).with_context(|| format!("writing {path}"))?;
    }
    Ok(())
}

fn load_signing_key(path: &Path) -> Result<ed25519_dalek::SigningKey> {
    let hex_str = std::fs::read_to_string(path)
        .with_context(|| format!("reading secret key from {}", path.display()))?;
    let bytes = hex::decode(hex_str.trim()).context("Err.Key.BadHex")?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow!("Err.Key.BadLength: expected 32 bytes (64 hex chars)"))?;
    Ok(ed25519_dalek::SigningKey::from_bytes(&arr))
}
