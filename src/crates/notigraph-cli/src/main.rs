//! # notigraph-cli
//!
//! Replay, check and visualize notification graph scenarios.

mod scenario;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use notigraph_core::{visualize, VisualizationOptions};
use scenario::Scenario;

#[derive(Parser)]
#[command(name = "notigraph")]
#[command(about = "Replay and inspect notification graph scenarios", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario and print the resulting attribute state
    Run {
        /// Path to a YAML scenario file
        file: PathBuf,
    },

    /// Replay a scenario and verify its `expect` block
    Check {
        /// Path to a YAML scenario file
        file: PathBuf,
    },

    /// Replay a scenario and emit a diagram of the final state
    Viz {
        /// Path to a YAML scenario file
        file: PathBuf,

        /// Diagram format
        #[arg(short, long, value_enum, default_value_t = DiagramFormat::Mermaid)]
        format: DiagramFormat,

        /// Include attribute state in node labels
        #[arg(long)]
        attributes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DiagramFormat {
    Mermaid,
    Dot,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file } => {
            let scenario = load(&file)?;
            let run = scenario.run()?;
            if let Some(title) = &scenario.title {
                println!("# {title}");
            }
            for (item, identifier, attribute, value) in run.state_table()? {
                println!("{item}  {identifier}.{attribute} = {value}");
            }
        }
        Commands::Check { file } => {
            let scenario = load(&file)?;
            let run = scenario.run()?;
            run.check(&scenario.expect)?;
            println!(
                "ok: {} expectation(s) hold in {}",
                scenario.expect.len(),
                file.display()
            );
        }
        Commands::Viz {
            file,
            format,
            attributes,
        } => {
            let scenario = load(&file)?;
            let run = scenario.run()?;
            let mut options = match format {
                DiagramFormat::Mermaid => VisualizationOptions::mermaid(),
                DiagramFormat::Dot => VisualizationOptions::dot(),
            };
            if let Some(title) = &scenario.title {
                options = options.with_title(title.clone());
            }
            if attributes {
                options = options.with_attributes();
            }
            print!("{}", visualize(&run.net, &options));
        }
    }

    Ok(())
}

fn load(file: &PathBuf) -> Result<Scenario, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(file)?;
    Ok(Scenario::from_yaml(&source)?)
}
