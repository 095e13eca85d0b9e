//! kubeedit - format-preserving edits to Kubernetes YAML streams.
//!
//! Reads a manifest stream on stdin, applies exactly one edit to the
//! first matching resource, and writes the whole stream back to stdout.
//! On failure nothing is written to stdout; the reason goes to stderr
//! and the process exits with code 2.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use kubeedit::edit::{AnnotationEdit, Edit, ImageEdit, PathEdit};
use kubeedit::manifest::Target;
use kubeedit::stream;

/// Edit Kubernetes YAML manifests without disturbing their formatting.
#[derive(Parser)]
#[command(name = "kubeedit", version, about = "Format-preserving edits to Kubernetes YAML streams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Update one container's image in a workload resource
    Image {
        #[command(flatten)]
        target: TargetArgs,

        /// Container whose image to rewrite
        #[arg(long)]
        container: String,

        /// New image reference
        #[arg(long)]
        image: String,
    },

    /// Add, update, or remove annotations (an empty value removes the key)
    Annotate {
        #[command(flatten)]
        target: TargetArgs,

        /// Annotations to apply
        #[arg(value_name = "KEY=VALUE", required = true, value_parser = parse_pair)]
        notes: Vec<(String, String)>,
    },

    /// Rewrite scalar fields addressed by dotted paths
    Set {
        #[command(flatten)]
        target: TargetArgs,

        /// Fields to rewrite
        #[arg(value_name = "PATH=VALUE", required = true, value_parser = parse_pair)]
        paths: Vec<(String, String)>,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Resource kind, matched case-insensitively
    #[arg(long)]
    kind: String,

    /// Resource namespace
    #[arg(long, default_value = "default")]
    namespace: String,

    /// Resource name
    #[arg(long)]
    name: String,
}

impl TargetArgs {
    fn into_target(self) -> Target {
        Target::new(self.kind, self.namespace, self.name)
    }
}

impl Command {
    fn into_edit(self) -> Edit {
        match self {
            Command::Image {
                target,
                container,
                image,
            } => Edit::Image(ImageEdit {
                target: target.into_target(),
                container,
                image,
            }),
            Command::Annotate { target, notes } => Edit::Annotate(AnnotationEdit {
                target: target.into_target(),
                notes,
            }),
            Command::Set { target, paths } => Edit::SetPath(PathEdit {
                target: target.into_target(),
                paths,
            }),
        }
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {:?}", raw)),
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let edit = cli.command.into_edit();

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| format!("reading stdin: {}", e))?;

    let output = stream::run(&edit, &input).map_err(|e| e.to_string())?;

    io::stdout()
        .write_all(output.as_bytes())
        .map_err(|e| format!("writing stdout: {}", e))?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        return ExitCode::from(2);
    }
    ExitCode::SUCCESS
}
