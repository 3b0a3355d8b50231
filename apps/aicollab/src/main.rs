//! aicollab CLI binary entry point.
//! Builds one aggregation context per invocation and delegates to the library.

use aicollab::cli::{parse_fresh, Cli, CommonArgs, Commands};
use aicollab::config::{self, Effective};
use aicollab::context::{AggregationContext, RunCache};
use aicollab::error::{NormalizeError, StorageError};
use aicollab::models::ToolIdentity;
use aicollab::normalize::normalize;
use aicollab::render::{write_reports, ReportKind};
use aicollab::resolver::{resolve_detailed, resolve_metrics};
use aicollab::storage::{read_json, store_result, StorageLayout};
use aicollab::synthesize::synthesize;
use aicollab::{output, utils};
use anyhow::{anyhow, Context};
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{} {:#}", utils::error_prefix(), err);
        std::process::exit(exit_code(&err));
    }
}

/// 1 for a normalizer contract breach, 2 for everything else.
fn exit_code(err: &anyhow::Error) -> i32 {
    let breach = err.chain().any(|e| {
        e.downcast_ref::<NormalizeError>().is_some()
            || matches!(e.downcast_ref::<StorageError>(), Some(StorageError::Normalize(_)))
    });
    if breach {
        1
    } else {
        2
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Metrics { common } => {
            let (eff, ctx) = prepare(&common, None)?;
            output::print_metrics(&resolve_detailed(&ctx), &eff.output);
        }
        Commands::Priorities {
            common,
            write,
            out_dir,
        } => {
            let (eff, ctx) = prepare(&common, out_dir.as_deref())?;
            let synthesis = synthesize(&ctx, &resolve_metrics(&ctx));
            output::print_priorities(&synthesis, &eff.output);
            if write {
                let written = write_reports(&ctx, &eff.out_dir, &[ReportKind::Priorities])?;
                if eff.output != "json" {
                    output::print_written(&written, &eff.project_root, &eff.output);
                }
            }
        }
        Commands::Status { common, out_dir } => {
            report(&common, out_dir.as_deref(), &[ReportKind::Status])?;
        }
        Commands::Consolidated { common, out_dir } => {
            report(&common, out_dir.as_deref(), &[ReportKind::Consolidated])?;
        }
        Commands::Report { common, out_dir } => {
            report(&common, out_dir.as_deref(), &ReportKind::ALL)?;
        }
        Commands::Ingest {
            project_root,
            tool,
            domain,
            generated_by,
            file,
        } => {
            let eff = config::resolve_effective(project_root.as_deref(), None, None, None);
            let path = PathBuf::from(&file);
            let raw = read_json(&path)?;
            let record = normalize(&tool, &raw)?;
            let id = ToolIdentity::resolve(&tool, domain.as_deref());
            let layout = StorageLayout::new(&eff.project_root, &eff.settings.storage);
            let source = utils::rel_to(&eff.project_root, &path);
            let latest = store_result(
                &layout,
                &id,
                &record,
                generated_by.as_deref().unwrap_or(&tool),
                Some(source.as_str()),
                Utc::now(),
            )?;
            output::print_written(&[latest], &eff.project_root, &eff.output);
        }
    }
    Ok(())
}

fn report(common: &CommonArgs, out_dir: Option<&str>, kinds: &[ReportKind]) -> anyhow::Result<()> {
    let (eff, ctx) = prepare(common, out_dir)?;
    let written = write_reports(&ctx, &eff.out_dir, kinds)?;
    output::print_written(&written, &eff.project_root, &eff.output);
    Ok(())
}

/// Resolve effective settings and build the context, seeding `--fresh` results.
fn prepare(
    common: &CommonArgs,
    out_dir: Option<&str>,
) -> anyhow::Result<(Effective, AggregationContext)> {
    let eff = config::resolve_effective(
        common.project_root.as_deref(),
        common.output.as_deref(),
        common.audit_tier.as_deref(),
        out_dir,
    );
    if eff.output != "json" && config::load_config(&eff.project_root).is_none() {
        eprintln!(
            "{} No aicollab.toml found; using defaults.",
            utils::note_prefix()
        );
    }
    let cache = seed_run_cache(&common.fresh, &eff.project_root)?;
    let ctx = AggregationContext::from_effective(&eff).with_run_cache(cache);
    Ok((eff, ctx))
}

fn seed_run_cache(fresh: &[String], root: &Path) -> anyhow::Result<RunCache> {
    let mut cache = RunCache::new();
    for arg in fresh {
        let (tool, file) =
            parse_fresh(arg).ok_or_else(|| anyhow!("invalid --fresh value `{}` (expected TOOL=PATH)", arg))?;
        let path = if Path::new(file).is_absolute() {
            PathBuf::from(file)
        } else {
            root.join(file)
        };
        let raw = read_json(&path)?;
        cache
            .record(tool, &raw)
            .with_context(|| format!("fresh result for `{}`", tool))?;
        tracing::debug!(tool, path = %path.display(), "seeded run cache");
    }
    Ok(cache)
}
