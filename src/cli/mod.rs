use structopt::StructOpt;

use crate::Result;

mod content;
mod moderation;

#[derive(StructOpt)]
struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Inspect and administer content items
    #[structopt(name = "content")]
    Content(content::Opts),
    /// Moderate submitted content
    #[structopt(name = "moderation")]
    Moderation(moderation::Opts),
}

pub fn main() -> Result<()> {
    let opts = Opts::from_args();
    let config = crate::config::load()?;

    setup_logging(&config.logging)?;

    config.validate()?;

    match opts.command {
        Command::Content(opts) => content::main(&config, opts),
        Command::Moderation(opts) => moderation::main(&config, opts),
    }
}

fn setup_logging(config: &crate::config::Logging) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(config.level);

    for (module, level) in &config.filters {
        builder.filter_module(&module, *level);
    }

    builder.try_init()?;
    Ok(())
}
