mod commands;
mod config;
mod main_lib;

use commands::{run, Command, USAGE};
use config::Config;
use main_lib::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::from_env()?;
    let output = run(command, &config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
