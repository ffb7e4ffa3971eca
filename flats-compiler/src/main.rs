use std::{
    fs,
    io::{self, Read, Write},
    path::PathBuf,
};

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use flats_compiler::{compile, compile_split, Action};

#[derive(Parser, Debug)]
#[command(version, about = "Flats schema compiler", long_about = None)]
struct Cli {
    /// What to emit.
    #[arg(value_enum)]
    action: CliAction,

    /// Schema file; stdin when omitted.
    input: Option<PathBuf>,

    /// Output file; stdout when omitted.
    output: Option<PathBuf>,

    /// Output directory: one file per generated type.
    out_dir: Option<PathBuf>,

    /// Emit per-field initialization tracking into direct accessors.
    #[arg(long)]
    init_check: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliAction {
    /// Schema text and object maps.
    Debug,
    /// Layout structs, direct accessors and message envelopes.
    Direct,
    /// Like direct, without alignment padding.
    Packed,
    /// View accessors over an offset table.
    View,
    #[value(name = "packed_view")]
    PackedView,
}

impl From<CliAction> for Action {
    fn from(a: CliAction) -> Self {
        match a {
            CliAction::Debug => Action::Debug,
            CliAction::Direct => Action::Direct,
            CliAction::Packed => Action::Packed,
            CliAction::View => Action::View,
            CliAction::PackedView => Action::PackedView,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    if let Some(dir) = &cli.out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        for (name, text) in compile_split(&source, cli.action.into(), cli.init_check)? {
            let path = dir.join(format!("{name}.rs"));
            fs::write(&path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        if cli.output.is_none() {
            return Ok(());
        }
    }

    let text = compile(&source, cli.action.into(), cli.init_check)?;

    match &cli.output {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
