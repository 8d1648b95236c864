use anyhow::Context;
use cep_weather_core::{
    Config, GetTemperatureByPostalCode, PostalCode, RequestContext, gateways_from_config,
    transport::endpoint::Endpoint,
};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode, Text};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cep-weather", version, about = "Current temperature for a Brazilian zip code")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Port to listen on; overrides the configured one.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the current temperature for a zip code as JSON.
    Lookup {
        /// Zip code, e.g. "01001000" or "01001-000".
        zip_code: String,
    },

    /// Interactively configure the upstream APIs and the server port.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { port } => {
                let config = Config::load()?;
                let port = port.unwrap_or(config.server.port);
                server::serve(port, build_usecase(&config)?).await
            }
            Command::Lookup { zip_code } => {
                let config = Config::load()?;
                lookup(&config, &zip_code).await
            }
            Command::Configure => configure(),
        }
    }
}

fn build_usecase(config: &Config) -> anyhow::Result<GetTemperatureByPostalCode> {
    if !config.has_weather_api_key() {
        tracing::warn!("no weather API key configured; run `cep-weather configure` or set WEATHER_API_KEY");
    }

    let gateways = gateways_from_config(config).context("Failed to build HTTP client")?;
    Ok(GetTemperatureByPostalCode::from_gateways(gateways))
}

async fn lookup(config: &Config, zip_code: &str) -> anyhow::Result<()> {
    let outcome = match PostalCode::parse(zip_code) {
        Ok(postal_code) => {
            build_usecase(config)?.execute(&RequestContext::new(), &postal_code).await
        }
        Err(err) => Err(err),
    };

    match outcome {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&err)?);
            anyhow::bail!("lookup failed with status {}", err.status_code)
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load_file()?;

    let api_key = Password::new("WeatherAPI key (leave empty to keep the current one):")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.weather_api.api_key = api_key.trim().to_string();
    }

    let weather_base_url = Text::new("Weather API base URL:")
        .with_default(&config.weather_api.base_url)
        .prompt()?;
    Endpoint::new(&weather_base_url)?;
    config.weather_api.base_url = weather_base_url;

    let address_base_url = Text::new("Address API base URL:")
        .with_default(&config.address_api.base_url)
        .prompt()?;
    Endpoint::new(&address_base_url)?;
    config.address_api.base_url = address_base_url;

    config.server.port = CustomType::<u16>::new("Server port:")
        .with_default(config.server.port)
        .with_error_message("Please enter a port between 0 and 65535")
        .prompt()?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
