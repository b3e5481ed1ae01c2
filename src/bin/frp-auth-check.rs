use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use frp_auth_plugin::config::{load_config, FileSource};
use frp_auth_plugin::decision::{decide_login, decide_new_proxy, LoginContent, NewProxyContent};
use frp_auth_plugin::http::PluginResponse;

#[derive(Parser)]
#[command(name = "frp-auth-check")]
#[command(about = "Validate a policy file and dry-run plugin decisions against it", long_about = None)]
struct Cli {
    /// Policy file to load
    #[arg(short, long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide a Login call
    Login {
        user: String,
        token: String,
    },
    /// Decide a NewProxy call
    NewProxy {
        user: String,
        proxy_name: String,
        #[arg(short = 't', long, default_value = "http")]
        proxy_type: String,
        /// Domain claimed by the client (repeatable)
        #[arg(short, long = "domain")]
        domains: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match load_config(&FileSource::new(&cli.config)) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let snapshot = loaded.snapshot;

    let decision = match cli.command {
        None => {
            println!(
                "{}: ok ({} users, {} proxies)",
                cli.config.display(),
                snapshot.users.len(),
                snapshot.route_count()
            );
            return ExitCode::SUCCESS;
        }
        Some(Commands::Login { user, token }) => {
            let content = LoginContent {
                user,
                metas: [("token".to_string(), token)].into_iter().collect(),
                ..Default::default()
            };
            decide_login(&content, &snapshot)
        }
        Some(Commands::NewProxy { user, proxy_name, proxy_type, domains }) => {
            let content = NewProxyContent {
                user,
                proxy_name,
                proxy_type,
                custom_domains: domains,
                ..Default::default()
            };
            decide_new_proxy(content, &snapshot)
        }
    };

    match serde_json::to_string_pretty(&PluginResponse::from(decision)) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
