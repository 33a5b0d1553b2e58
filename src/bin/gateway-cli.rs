use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the API gateway", long_about = None)]
struct Cli {
    /// Gateway base URL, including the path base if one is configured
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Admin API key
    #[arg(short, long, env = "GATEWAY_ADMIN_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// List routes and their primary/backup backends
    Routes,
    /// List circuit breaker states
    Circuits,
    /// Force a circuit closed
    Reset {
        /// Circuit key, e.g. `reports@10.0.0.1:8080`
        key: String,
    },
    /// Exchange client credentials for an access token
    Token {
        #[arg(long)]
        client_id: String,
        #[arg(long)]
        client_secret: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = match cli.command {
        Commands::Status => {
            client.get(format!("{}/admin/status", base))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Routes => {
            client.get(format!("{}/admin/routes", base))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Circuits => {
            client.get(format!("{}/admin/circuits", base))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Reset { key } => {
            client.post(format!("{}/admin/circuits/{}/reset", base, key))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Token { client_id, client_secret } => {
            client.post(format!("{}/auth/token", base))
                .query(&[("clientId", client_id), ("clientSecret", client_secret)])
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
