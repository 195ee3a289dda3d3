mod api;
mod app_state;
mod http;
mod init_telemetry;
mod settings;

use clap::Parser;

#[derive(Parser)]
#[command(name = "wardgate")]
#[command(about = "Authentication-aware rate-limiting gateway for the user-management API")]
#[clap(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser)]
enum Commands {
    /// Show current configuration and exit
    Config,
    /// Start the gateway (default)
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::Config => {
            let settings = settings::config::Settings::new()?;
            println!("{:#?}", &settings);
            return Ok(());
        }
        Commands::Run => {
            // Continue with the normal server startup
        }
    }

    let app_state = app_state::AppState::new()?;
    init_telemetry::init_telemetry_and_tracing(app_state.settings.debug)?;

    let handle =
        http::setup_http_server(app_state.clone(), &app_state.settings.api.bind_address).await?;
    handle.await??;

    Ok(())
}
