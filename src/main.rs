use anyhow::Result;
use clap::Parser;
use phpcloak::cli::{AppContext, Cli, Commands};
use phpcloak::cli_ext::{patterns_cmd, run_cmd};

fn main() -> Result<()> {
    let cli = Cli::parse();
    phpcloak::init_tracing(cli.verbose);

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Run(args) => run_cmd::run(args, &ctx),
        Commands::Patterns(args) => patterns_cmd::run(args, &ctx),
        Commands::Init(args) => phpcloak::infra::config::init(args, &ctx),
        Commands::Completions(args) => phpcloak::completion::run(args, &ctx),
    }
}
