use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use time::Duration;

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve {
        addr: SocketAddr,
        config: subshop::config::AppConfig,
    },
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::SessionKey) = cli.command {
        return RunOutcome::Exit(run_session_key());
    }

    let token_ttl = match cli.session_ttl.as_deref() {
        Some(raw) => match parse_session_ttl(raw) {
            Ok(ttl) => ttl,
            Err(err) => {
                eprintln!("error: {err}");
                return RunOutcome::Exit(2);
            }
        },
        None => default_session_ttl(),
    };

    let key = match cli.session_key {
        Some(key) if !key.trim().is_empty() => key,
        _ => match subshop::session::generate_session_key() {
            Ok(key) => {
                eprintln!(
                    "no session key configured; using an ephemeral key, sessions will not survive a restart"
                );
                key
            }
            Err(err) => {
                eprintln!("failed to generate session key: {err}");
                return RunOutcome::Exit(1);
            }
        },
    };

    RunOutcome::Serve {
        addr: cli.listen,
        config: subshop::config::AppConfig {
            data_path: cli.data,
            app_name: cli.app_name,
            session: subshop::config::SessionConfig {
                key,
                token_ttl,
                cookie_secure: cli.session_cookie_secure,
            },
            bot_reply_delay: std::time::Duration::from_millis(cli.bot_delay_ms),
        },
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "subshop",
    version,
    about = "Digital subscription storefront with a manual-payment admin panel"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    /// Path of the shared document JSON file; created and seeded when missing.
    #[arg(long, default_value = "subshop-data.json")]
    data: PathBuf,
    #[arg(long, default_value = "SubShop")]
    app_name: String,
    #[arg(long, default_value = "127.0.0.1:3000")]
    listen: SocketAddr,
    #[arg(long, env = "SUBSHOP_SESSION_KEY")]
    session_key: Option<String>,
    #[arg(long, env = "SUBSHOP_SESSION_TTL")]
    session_ttl: Option<String>,
    #[arg(long, env = "SUBSHOP_SESSION_COOKIE_SECURE")]
    session_cookie_secure: bool,
    #[arg(long, default_value_t = 1500)]
    bot_delay_ms: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a fresh base64 session key and exit.
    SessionKey,
}

fn run_session_key() -> i32 {
    match subshop::session::generate_session_key() {
        Ok(key) => {
            println!("{key}");
            0
        }
        Err(err) => {
            eprintln!("failed to generate session key: {err}");
            1
        }
    }
}

fn default_session_ttl() -> Duration {
    Duration::days(7)
}

fn parse_session_ttl(raw: &str) -> Result<Duration, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("session ttl cannot be empty".to_string());
    }

    let (amount, unit) = match value.chars().last() {
        Some(ch) if ch.is_ascii_alphabetic() => {
            (&value[..value.len() - 1], ch.to_ascii_lowercase())
        }
        _ => (value, 's'),
    };

    let amount: i64 = amount
        .parse()
        .map_err(|_| format!("invalid session ttl '{value}'; expected <number>[s|m|h|d]"))?;

    if amount <= 0 {
        return Err("session ttl must be greater than 0".to_string());
    }

    match unit {
        's' => Ok(Duration::seconds(amount)),
        'm' => Ok(Duration::minutes(amount)),
        'h' => Ok(Duration::hours(amount)),
        'd' => Ok(Duration::days(amount)),
        _ => Err(format!(
            "invalid session ttl '{value}'; expected <number>[s|m|h|d]"
        )),
    }
}
