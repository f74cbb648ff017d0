use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use donation_gateway::blockchain::{Address, AlgodClient, Ledger, MicroAlgos, Wallet};
use donation_gateway::config::LedgerConfig;

#[derive(Parser)]
#[command(name = "donation-cli")]
#[command(about = "Command-line client for the donation gateway", long_about = None)]
struct Cli {
    /// Base URL of a running gateway.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Optional bearer token forwarded to the gateway.
    #[arg(short, long, env = "GATEWAY_TOKEN")]
    key: Option<String>,

    /// algod endpoint used by `account`.
    #[arg(long, env = "ALGOD_API", default_value = "https://testnet-api.algonode.cloud")]
    algod_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a donation through the gateway
    Donate {
        #[arg(long)]
        user: String,
        /// Amount in ALGO
        #[arg(long)]
        amount: f64,
    },
    /// Mint a donation certificate through the gateway
    Mint {
        #[arg(long)]
        user: String,
        /// Donated amount in ALGO
        #[arg(long)]
        amount: f64,
    },
    /// Generate a fresh account and print its mnemonic
    NewAccount,
    /// Show the balance of an account
    Account { address: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Donate { ref user, amount } => {
            let body = json!({ "userId": user, "amount": amount });
            call(&cli, "sendDonation", body).await?;
        }
        Commands::Mint { ref user, amount } => {
            let body = json!({ "userId": user, "donationAmount": amount });
            call(&cli, "mintCertificate", body).await?;
        }
        Commands::NewAccount => {
            let wallet = Wallet::generate();
            println!("Address:  {}", wallet.address());
            println!("Mnemonic: {}", wallet.to_mnemonic());
        }
        Commands::Account { ref address } => {
            let address: Address = address.parse()?;
            let client = AlgodClient::new(LedgerConfig {
                algod_url: cli.algod_url.clone(),
                ..LedgerConfig::default()
            })?;
            let info = client.account_info(&address).await?;
            println!("Address:     {}", address);
            println!("Balance:     {} ALGO", MicroAlgos(info.amount).format_algos());
            println!("Min balance: {} ALGO", MicroAlgos(info.min_balance).format_algos());
            if !info.status.is_empty() {
                println!("Status:      {}", info.status);
            }
        }
    }

    Ok(())
}

async fn call(cli: &Cli, function: &str, body: Value) -> Result<(), Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key))?,
        );
    }

    let res = reqwest::Client::new()
        .post(format!("{}/{}", cli.url.trim_end_matches('/'), function))
        .headers(headers)
        .json(&body)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("{}", rendered);
    }
    Ok(())
}
