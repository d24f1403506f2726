// SPDX-License-Identifier: MIT

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use taco_rs::taco::conditions::{json_schema_for, ConditionType, ROOT_PATH};
use taco_rs::taco::context::{resolve_condition, ConditionContext};
use taco_rs::taco::{ConditionFactory, ConditionLoader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a condition document and print its canonical form
    Validate {
        /// Path to a JSON or YAML condition document
        #[arg(short, long)]
        file: String,
    },
    /// List the context parameters a condition requires
    Params {
        /// Path to a JSON or YAML condition document
        #[arg(short, long)]
        file: String,
    },
    /// Substitute context values into a condition
    Resolve {
        /// Path to a JSON or YAML condition document
        #[arg(short, long)]
        file: String,

        /// JSON object of context bindings, e.g. '{":userAddress": "0x..."}'
        #[arg(short, long)]
        context: String,
    },
    /// Print the JSON Schema of a condition kind
    Schema {
        /// Condition type tag, e.g. "contract" or "if-then-else"
        #[arg(short, long)]
        kind: String,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let loader = ConditionLoader::new(ConditionFactory::from_env());

    match args.command {
        Commands::Validate { file } => {
            let expr = loader
                .load(&file)
                .with_context(|| format!("invalid condition document {}", file))?;
            log::info!(
                "Validated {} condition from {}",
                expr.condition().condition_type(),
                file
            );
            println!("{}", serde_json::to_string_pretty(&expr.to_json()?)?);
        }
        Commands::Params { file } => {
            let expr = loader.load(&file)?;
            for param in expr.requested_parameters() {
                println!("{}", param);
            }
        }
        Commands::Resolve { file, context } => {
            let expr = loader.load(&file)?;
            let bindings: serde_json::Value =
                serde_json::from_str(&context).context("context must be a JSON object")?;
            let context = ConditionContext::from_bindings(&bindings)?;

            let scope = context.scope();
            let resolved = resolve_condition(expr.condition(), &scope, ROOT_PATH)?;
            log::info!("Resolved condition from {}", file);
            println!("{}", serde_json::to_string_pretty(&resolved.to_wire()?)?);
        }
        Commands::Schema { kind } => {
            let kind = ConditionType::from_tag(&kind)
                .ok_or_else(|| anyhow!("unknown condition type '{}'", kind))?;
            println!("{}", serde_json::to_string_pretty(&json_schema_for(kind))?);
        }
    }

    Ok(())
}
