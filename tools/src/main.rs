use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use libformosa::maybe_absolute_order_key;
use libformosa_core::LexEntry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "libformosa-tools", about = "libformosa data tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a plain-text dictionary into lexicon.fst + lexicon.bin
    BuildLexicon {
        /// Input file: `key value score value score …` per line
        input: PathBuf,
        /// Output directory for the artifacts
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
        /// Re-key entries with the absolute-order encoding
        #[arg(long)]
        absolute_order: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::BuildLexicon {
            input,
            out_dir,
            absolute_order,
        } => build_lexicon(&input, &out_dir, absolute_order),
    }
}

fn build_lexicon(input: &PathBuf, out_dir: &PathBuf, absolute_order: bool) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("read {}", input.display()))?;

    // BTreeMap keeps keys sorted, which the FST builder requires.
    let mut entries: BTreeMap<String, Vec<LexEntry>> = BTreeMap::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let Some(key) = parts.next() else { continue };
        let key = if absolute_order {
            maybe_absolute_order_key(key)
        } else {
            key.to_string()
        };
        let rest: Vec<&str> = parts.collect();
        if rest.is_empty() || rest.len() % 2 != 0 {
            bail!("{}:{}: expected value/score pairs", input.display(), lineno + 1);
        }
        for pair in rest.chunks(2) {
            let score: f64 = pair[1]
                .parse()
                .with_context(|| format!("{}:{}: bad score {:?}", input.display(), lineno + 1, pair[1]))?;
            entries.entry(key.clone()).or_default().push(LexEntry {
                value: pair[0].to_string(),
                score,
            });
        }
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create {}", out_dir.display()))?;
    let fst_path = out_dir.join("lexicon.fst");
    let bin_path = out_dir.join("lexicon.bin");

    let writer = BufWriter::new(File::create(&fst_path)?);
    let mut builder = fst::MapBuilder::new(writer)?;
    let mut payloads: Vec<Vec<LexEntry>> = Vec::with_capacity(entries.len());
    for (index, (key, mut list)) in entries.into_iter().enumerate() {
        list.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        builder.insert(key.as_bytes(), index as u64)?;
        payloads.push(list);
    }
    builder.finish()?;

    std::fs::write(&bin_path, bincode::serialize(&payloads)?)?;
    println!(
        "wrote {} keys to {} and {}",
        payloads.len(),
        fst_path.display(),
        bin_path.display()
    );
    Ok(())
}
