use clap::{Parser, Subcommand};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "tunnel-ctl")]
#[command(about = "Management CLI for the tunnel supervisor", long_about = None)]
struct Cli {
    /// Base URL of the status endpoint.
    #[arg(short, long, default_value = "http://127.0.0.1:6060")]
    url: String,

    /// Accept self-signed certificates on an HTTPS status endpoint.
    #[arg(long)]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show listening/reloading/stopping status
    Status,
    /// Ask a running supervisor to reload its certificates (SIGUSR1)
    Reload {
        #[arg(long)]
        pid: i32,
    },
    /// Ask a running supervisor to shut down gracefully (SIGTERM)
    Stop {
        #[arg(long)]
        pid: i32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => {
            let client = reqwest::Client::builder()
                .danger_accept_invalid_certs(cli.insecure)
                .build()?;
            let res = client
                .get(format!("{}/_status", cli.url.trim_end_matches('/')))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Reload { pid } => send_signal(pid, Signal::SIGUSR1)?,
        Commands::Stop { pid } => send_signal(pid, Signal::SIGTERM)?,
    }

    Ok(())
}

fn send_signal(pid: i32, signal: Signal) -> Result<(), Box<dyn std::error::Error>> {
    kill(Pid::from_raw(pid), signal)?;
    println!("Sent {} to {}", signal, pid);
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    // 503 still carries a status body while the supervisor is stopping.
    if !status.is_success() && status != reqwest::StatusCode::SERVICE_UNAVAILABLE {
        eprintln!("Error: status endpoint returned {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
