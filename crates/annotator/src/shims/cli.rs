// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::export::{write_csv_file, CsvMode};
use crate::history::{HistoryStore, InMemoryHistoryStore, SqliteHistoryStore, PRESETS};
use crate::pipeline::{AnnotationRun, AnnotationSession, NativeClients, Submission};
use crate::shims::types::{Command, HistoryArgs, HistoryStoreArgs, Opts, OutputFormat, PredictArgs};
use shared_types::{info_with_timestamp, State3, State8};

pub async fn run(opts: Opts) -> anyhow::Result<()> {
    let store = open_store(&opts.history).await?;
    match opts.command {
        Command::Predict(args) => predict(args, &opts.services.to_config(), store).await,
        Command::History(args) => history(args, store.as_ref()).await,
    }
}

async fn open_store(args: &HistoryStoreArgs) -> anyhow::Result<Arc<dyn HistoryStore>> {
    if args.no_history {
        return Ok(Arc::new(InMemoryHistoryStore::default()));
    }
    let store = SqliteHistoryStore::open(&args.history_db)
        .await
        .with_context(|| format!("opening history db {:?}", args.history_db))?;
    Ok(Arc::new(store))
}

async fn predict(
    args: PredictArgs,
    config: &crate::config::ServiceConfig,
    store: Arc<dyn HistoryStore>,
) -> anyhow::Result<()> {
    let submission = build_submission(&args)?;

    let session = AnnotationSession::open(config.clone(), NativeClients, store)
        .await
        .context("invalid service configuration")?
        .with_backend(args.backend.into());
    let mut session = match args.seed {
        Some(seed) => session.with_rng(StdRng::seed_from_u64(seed)),
        None => session,
    };

    info_with_timestamp!("submitting to {:?} backend", session.backend());
    let run = session.submit(submission.clone()).await?;
    info_with_timestamp!("{}: annotated {} residues", run.request_id, run.annotations.len());

    match args.format {
        OutputFormat::Text => print!("{}", render_text(&run)?),
        OutputFormat::Json => println!("{}", render_json(&run)?),
    }

    if let Some(dir) = &args.csv_dir {
        let identifier = crate::normalize::normalize_identifier(&submission.identifier);
        let identifier = (!identifier.is_empty()).then_some(identifier.as_str());
        for mode in CsvMode::ALL {
            let path = write_csv_file(dir, identifier, &run.annotations, mode)?;
            info_with_timestamp!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn build_submission(args: &PredictArgs) -> anyhow::Result<Submission> {
    let mut submission = Submission::default();

    if let Some(name) = &args.sample {
        let preset = PRESETS
            .iter()
            .find(|p| {
                p.display_name.eq_ignore_ascii_case(name)
                    || (!p.identifier.is_empty() && p.identifier.eq_ignore_ascii_case(name))
            })
            .with_context(|| format!("no built-in sample named {name:?}"))?;
        submission.sequence = preset.sequence.to_owned();
        submission.identifier = preset.identifier.to_owned();
    }

    match (&args.sequence, &args.sequence_file) {
        (Some(_), Some(_)) => bail!("give --sequence or --sequence-file, not both"),
        (Some(sequence), None) => submission.sequence.clone_from(sequence),
        (None, Some(path)) => submission.sequence = read_sequence_file(path)?,
        (None, None) => {}
    }
    if let Some(pdb_id) = &args.pdb_id {
        submission.identifier.clone_from(pdb_id);
    }
    Ok(submission)
}

fn read_sequence_file(path: &Path) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading sequence from {}", path.display()))?;
    Ok(strip_fasta_headers(&text))
}

/// Drop `>` header and `;` comment lines, keeping the residue lines.
fn strip_fasta_headers(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let line = line.trim_start();
            !line.starts_with('>') && !line.starts_with(';')
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn history(args: HistoryArgs, store: &dyn HistoryStore) -> anyhow::Result<()> {
    if args.presets {
        for preset in PRESETS {
            let what = if preset.identifier.is_empty() {
                preset.sequence
            } else {
                preset.identifier
            };
            println!("{:<20} {what}", preset.display_name);
        }
        return Ok(());
    }

    if args.clear {
        store.save(&[]).await.context("clearing history")?;
        info_with_timestamp!("history cleared");
        return Ok(());
    }

    let records = store.load().await.context("loading history")?;
    if records.is_empty() {
        println!("(no submissions yet)");
    }
    for (i, record) in records.iter().enumerate() {
        let kind = if record.identifier.is_empty() {
            "sequence"
        } else {
            "pdb id"
        };
        println!("{}. {} ({kind})", i + 1, record.display_name);
    }
    Ok(())
}

fn render_text(run: &AnnotationRun) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "Entry summary: {} residues across {} chain(s)",
        run.summary.residue_count, run.summary.chain_count
    )?;
    if let Some(id) = &run.display_identifier {
        writeln!(out, "Entry: {id}")?;
    }
    writeln!(out, "Sequence: {}", run.display_sequence)?;
    let track8: String = run.annotations.iter().map(|a| a.state8.symbol()).collect();
    let track3: String = run.annotations.iter().map(|a| a.state3().symbol()).collect();
    writeln!(out, "8-state:  {track8}")?;
    writeln!(out, "3-state:  {track3}")?;

    let stats = &run.statistics;
    writeln!(out, "\nComposition (8-state):")?;
    for state in State8::ALL {
        writeln!(
            out,
            "  {} {:<12} {:>5} {:>6.1}%",
            state.symbol(),
            state.name(),
            stats.count8(state),
            stats.fraction8(state) * 100.0
        )?;
    }
    writeln!(out, "Composition (3-state):")?;
    for state in State3::ALL {
        writeln!(
            out,
            "  {} {:<12} {:>5} {:>6.1}%",
            state.symbol(),
            state.name(),
            stats.count3(state),
            stats.fraction3(state) * 100.0
        )?;
    }
    writeln!(
        out,
        "Mean confidence: {:.3} (8-state), {:.3} (3-state)",
        stats.mean_confidence8, stats.mean_confidence3
    )?;
    Ok(out)
}

fn render_json(run: &AnnotationRun) -> anyhow::Result<String> {
    serde_json::to_string_pretty(run).context("serializing result")
}
