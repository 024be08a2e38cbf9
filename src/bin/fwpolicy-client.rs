//! fwpolicy-client: send one command to a running fwpolicyd.

use clap::Parser;
use fwpolicy::client::{join_command, send_command};

#[derive(Parser)]
#[command(name = "fwpolicy-client")]
#[command(version)]
#[command(about = "Send a single command to a firewall policy server", long_about = None)]
struct Cli {
    /// Server host name or address
    host: String,

    /// Server port
    port: u16,

    /// Command words, joined with single spaces (e.g. `A 10.0.0.1 80`)
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let command = join_command(&cli.command);

    match send_command(&cli.host, cli.port, &command).await {
        Ok(response) => println!("{}", response),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
