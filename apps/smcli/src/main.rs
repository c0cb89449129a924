// apps/smcli/src/main.rs

use clap::{Arg, ArgMatches, Command};
use secrecy::ExposeSecret;
use secret_manager::{SecretsClient, SecretsConfig, SecretsError};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();

    if let Err(e) = run(&matches).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn build_cli() -> Command {
    let id = || Arg::new("id").required(true).help("Secret id");

    Command::new("smcli")
        .about("Secret manager CLI utility")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("backend")
                .long("backend")
                .global(true)
                .value_parser(["aws", "file", "mock"])
                .help("Secrets backend (overrides SECRETS_BACKEND)"),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .global(true)
                .help("Root directory of the file backend (overrides SECRETS_FILE_ROOT)"),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .global(true)
                .help("Secrets Manager endpoint (overrides AWS_SM_ENDPOINT)"),
        )
        .arg(
            Arg::new("region")
                .long("region")
                .global(true)
                .help("AWS region (overrides AWS_SM_REGION)"),
        )
        .subcommand(
            Command::new("create")
                .about("Create a new secret")
                .arg(id())
                .arg(Arg::new("content").required(true).help("Secret value")),
        )
        .subcommand(
            Command::new("get")
                .about("Print the value of a secret")
                .arg(id()),
        )
        .subcommand(
            Command::new("update")
                .about("Replace the value of a secret")
                .arg(id())
                .arg(Arg::new("content").required(true).help("New secret value")),
        )
        .subcommand(
            Command::new("describe")
                .about("Set the description of a secret")
                .arg(id())
                .arg(Arg::new("description").required(true).help("New description")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a secret, succeeding if it does not exist")
                .arg(id()),
        )
        .subcommand(Command::new("health").about("Check that the backend is reachable"))
}

/// Environment configuration with command line overrides applied
fn load_config(matches: &ArgMatches) -> Result<SecretsConfig, SecretsError> {
    let mut config = SecretsConfig::from_env()?;
    apply_overrides(&mut config, matches)?;
    Ok(config)
}

fn apply_overrides(config: &mut SecretsConfig, matches: &ArgMatches) -> Result<(), SecretsError> {
    if let Some(backend) = matches.get_one::<String>("backend") {
        config.backend = backend.parse()?;
    }
    if let Some(root) = matches.get_one::<String>("root") {
        config.file.root_dir = Some(root.clone());
    }
    if let Some(endpoint) = matches.get_one::<String>("endpoint") {
        config.aws.endpoint = Some(endpoint.clone());
    }
    if let Some(region) = matches.get_one::<String>("region") {
        config.aws.region = Some(region.clone());
    }
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, SecretsError> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| SecretsError::invalid_argument(format!("Missing argument <{name}>")))
}

async fn run(matches: &ArgMatches) -> Result<(), SecretsError> {
    let config = load_config(matches)?;
    let client = SecretsClient::new(config)?;

    match matches.subcommand() {
        Some(("create", sub)) => {
            let id = required(sub, "id")?;
            client.create_secret(id, required(sub, "content")?).await?;
            println!("Created secret {id}");
        }
        Some(("get", sub)) => {
            let secret = client.get_secret(required(sub, "id")?).await?;
            println!("{}", secret.expose_secret());
        }
        Some(("update", sub)) => {
            let id = required(sub, "id")?;
            client.update_secret_value(id, required(sub, "content")?).await?;
            println!("Updated secret {id}");
        }
        Some(("describe", sub)) => {
            let id = required(sub, "id")?;
            client
                .update_secret_description(id, required(sub, "description")?)
                .await?;
            println!("Updated description of secret {id}");
        }
        Some(("delete", sub)) => {
            let id = required(sub, "id")?;
            client.delete_secret(id).await?;
            println!("Deleted secret {id}");
        }
        Some(("health", _)) => {
            client.health_check().await?;
            println!("{} backend is healthy", client.backend_name());
        }
        Some((other, _)) => {
            return Err(SecretsError::invalid_argument(format!(
                "Unknown command '{other}'"
            )));
        }
        None => return Err(SecretsError::invalid_argument("No command given")),
    }

    Ok(())
}
