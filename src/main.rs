use clap::Parser;
use jigsaw_slicer::{init_logger, run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    run(cli)
}
