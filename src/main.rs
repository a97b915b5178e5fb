use clap::Parser;
use colored::Colorize;
use kuberef::cli::Cli;
use kuberef::{lint, report};
use std::process;

fn main() {
    let cli = Cli::parse();
    cli.init_logging();

    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            process::exit(2);
        }
    }
}

fn run(cli: &Cli) -> kuberef::Result<i32> {
    let config = cli.lint_config()?;

    let result = match &cli.path {
        Some(path) => lint::lint_path(path, &config)?,
        None => {
            let content = std::io::read_to_string(std::io::stdin())?;
            lint::lint_content(&content, &config)?
        }
    };

    print!("{}", report::render(&result, cli.format));

    Ok(if result.should_fail(&config) { 1 } else { 0 })
}
