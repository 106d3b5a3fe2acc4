//! `errwire decode` — rebuild one payload against a catalogue and print it.

use std::fmt::Write as _;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use errwire_core::schema::load_catalogue_file;
use errwire_core::{Cause, DefaultResolver, StrictResolver, UnmarshaledError, REDACTED};
use errwire_unmarshal::{JsonEncoder, UnmarshalOptions, Unmarshaler, UnmarshalerBuilder};
use tracing::info;

pub struct DecodeArgs {
    pub input: Option<PathBuf>,
    pub schemas: PathBuf,
    pub fallback_kind: Option<String>,
    pub strict_kinds: bool,
    pub strict_fields: bool,
    pub standard_sentinels: bool,
    pub json: bool,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

pub fn run(args: DecodeArgs) -> Result<()> {
    let unmarshaler = build_unmarshaler(&args)?;
    let payload = read_input(args.input.as_deref())?;

    let err = unmarshaler
        .unmarshal(&payload)
        .context("payload could not be rebuilt")?;

    if args.json {
        let out = JsonEncoder::new()
            .pretty()
            .encode(&err)
            .context("re-encoding failed")?;
        println!("{}", String::from_utf8_lossy(&out));
    } else {
        let mut out = String::new();
        render_error(&mut out, &err, 0)?;
        print!("{out}");
    }
    Ok(())
}

fn build_unmarshaler(args: &DecodeArgs) -> Result<Unmarshaler> {
    let definitions = load_catalogue_file(&args.schemas)
        .with_context(|| format!("loading catalogue {}", args.schemas.display()))?;
    info!(kinds = definitions.len(), "catalogue loaded");

    let strict = StrictResolver::with_definitions(definitions);
    let builder = match &args.fallback_kind {
        None => UnmarshalerBuilder::new(strict),
        Some(kind) => {
            let fallback = strict
                .definitions()
                .iter()
                .find(|d| d.kind() == kind.as_str())
                .cloned()
                .ok_or_else(|| anyhow!("fallback kind '{kind}' is not in the catalogue"))?;
            UnmarshalerBuilder::new(DefaultResolver::new(strict, fallback))
        }
    };

    let builder = builder.options(UnmarshalOptions {
        strict_kinds: args.strict_kinds,
        strict_fields: args.strict_fields,
    });
    let builder = if args.standard_sentinels {
        builder.standard_sentinel_errors()
    } else {
        builder
    };
    Ok(builder.build()?)
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(p) if p != Path::new("-") => {
            std::fs::read(p).with_context(|| format!("reading {}", p.display()))
        }
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

// ─── Tree rendering ──────────────────────────────────────────────────────────

fn render_error(out: &mut String, err: &UnmarshaledError, depth: usize) -> Result<()> {
    let pad = "  ".repeat(depth);
    writeln!(out, "{pad}{}: {}", err.kind(), err.message())?;
    if let Some(wire) = err.unresolved_kind() {
        writeln!(out, "{pad}  (received kind '{wire}')")?;
    }

    let mut typed = err.fields().peekable();
    if typed.peek().is_some() {
        writeln!(out, "{pad}  fields:")?;
        for (key, value) in typed {
            let shown = if key.is_sensitive() {
                REDACTED.to_string()
            } else {
                value.to_raw()?.to_string()
            };
            writeln!(out, "{pad}    {} = {shown}", key.name())?;
        }
    }

    let mut unknown = err.unknown_fields().peekable();
    if unknown.peek().is_some() {
        writeln!(out, "{pad}  unknown fields:")?;
        for (name, raw) in unknown {
            writeln!(out, "{pad}    {name} = {raw}")?;
        }
    }

    if !err.stack().is_empty() {
        writeln!(out, "{pad}  stack:")?;
        for line in err.render_stack().lines() {
            writeln!(out, "{pad}    {line}")?;
        }
    }

    render_causes(out, err.causes(), depth)
}

fn render_causes(out: &mut String, causes: &[Cause], depth: usize) -> Result<()> {
    if causes.is_empty() {
        return Ok(());
    }
    let pad = "  ".repeat(depth);
    writeln!(out, "{pad}  caused by:")?;
    for cause in causes {
        match cause {
            Cause::Error(err) => render_error(out, err, depth + 2)?,
            Cause::Sentinel(s) => {
                writeln!(out, "{pad}    [{}] {}", s.type_name(), s.message())?;
            }
            Cause::Unknown(u) => {
                let origin = u.kind.as_deref().unwrap_or(&u.type_name);
                writeln!(out, "{pad}    [unresolved {origin}] {}", u.message)?;
                for (name, raw) in &u.fields {
                    writeln!(out, "{pad}      {name} = {raw}")?;
                }
                render_causes(out, &u.causes, depth + 2)?;
            }
        }
    }
    Ok(())
}
