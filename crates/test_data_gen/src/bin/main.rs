//! CLI for generating REURB fixtures.
//!
//! Usage:
//!   gen-fixtures --scale small --seed 42 --dump reurb_properties_rows.sql --seed-out seed.sql
//!   gen-fixtures --scale medium --orphan property-quadra --dump rows.sql

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use test_data_gen::{ArrayQuoting, DumpOptions, Generator, OrphanEdge, Scale};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrphanArg {
    QuadraProject,
    PropertyQuadra,
    SurveyProperty,
}

impl From<OrphanArg> for OrphanEdge {
    fn from(arg: OrphanArg) -> Self {
        match arg {
            OrphanArg::QuadraProject => OrphanEdge::QuadraProject,
            OrphanArg::PropertyQuadra => OrphanEdge::PropertyQuadra,
            OrphanArg::SurveyProperty => OrphanEdge::SurveyProperty,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "gen-fixtures")]
#[command(about = "Generate REURB dump and seed fixtures for reurb-seed", long_about = None)]
struct Args {
    /// Scale preset: small, medium, large
    #[arg(short, long, default_value = "small")]
    scale: String,

    /// Random seed for reproducibility
    #[arg(long, default_value = "12345")]
    seed: u64,

    /// Output path for the reurb_properties dump (default: stdout)
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Output path for projects/quadras/surveys seed SQL
    #[arg(long)]
    seed_out: Option<PathBuf>,

    /// Quote array items with double quotes, as some exporters do
    #[arg(long)]
    double_quoted_arrays: bool,

    /// One tuple per line
    #[arg(long)]
    row_per_line: bool,

    /// Descriptions containing parentheses, separators and apostrophes
    #[arg(long)]
    tricky_text: bool,

    /// Inject one orphan at the given edge (repeatable)
    #[arg(long, value_enum)]
    orphan: Vec<OrphanArg>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let scale: Scale = args.scale.parse().map_err(anyhow::Error::msg)?;
    let mut gen = Generator::new(args.seed, scale).with_tricky_text(args.tricky_text);
    let mut data = gen.generate();
    for edge in &args.orphan {
        gen.inject_orphan(&mut data, (*edge).into());
    }

    let options = DumpOptions {
        arrays: if args.double_quoted_arrays {
            ArrayQuoting::Double
        } else {
            ArrayQuoting::Single
        },
        row_per_line: args.row_per_line,
        tricky_text: args.tricky_text,
    };
    let dump = data.render_dump(&options);

    match &args.dump {
        Some(path) => {
            fs::write(path, dump).with_context(|| format!("writing {}", path.display()))?
        }
        None => print!("{}", dump),
    }

    if let Some(path) = &args.seed_out {
        fs::write(path, data.render_seed())
            .with_context(|| format!("writing {}", path.display()))?;
    }

    eprintln!(
        "Generated {} projects, {} quadras, {} properties, {} surveys",
        data.projects.len(),
        data.quadras.len(),
        data.properties.len(),
        data.surveys.len()
    );

    Ok(())
}
