use clap::Parser;
use orbplay::cli::Args;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let report = orbplay::app::run(&args)?;
    let failed = report.failures().count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} views failed", report.outcomes.len());
    }
    Ok(())
}
