mod helper;
mod render;
mod shell;

use bitsql::{ConfigError, DEFAULT_HOST, URL_SCHEME};
use clap::Parser;
use std::{io::IsTerminal, process::ExitCode};
use url::Url;

///
/// Args
///

#[derive(Debug, Parser)]
#[command(name = "bitsql", version, about = "Interactive SQL console for Lark/Feishu Base")]
struct Args {
    /// Open-API host, used when TARGET is a bare app token.
    #[arg(long, env = "BITSQL_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// App id, or a personal base token.
    #[arg(short = 'u', long, env = "BITSQL_USERNAME")]
    username: Option<String>,

    /// App secret, or a personal base token.
    #[arg(short = 'p', long, env = "BITSQL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// App token, or a full `bitable://` connection URL.
    #[arg(env = "BITSQL_URL")]
    target: String,
}

impl Args {
    /// Connection URL for the target. A full URL is used verbatim.
    fn connection_url(&self) -> Result<String, ConfigError> {
        if is_connection_url(&self.target) {
            return Ok(self.target.clone());
        }

        let mut url = Url::parse(&format!("{URL_SCHEME}://{}/{}", self.host, self.target))?;
        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|()| ConfigError::MissingHost)?;
        }
        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|()| ConfigError::MissingHost)?;
        }

        Ok(url.into())
    }
}

fn is_connection_url(target: &str) -> bool {
    target
        .split_once("://")
        .is_some_and(|(scheme, _)| scheme == URL_SCHEME || scheme.starts_with("bitable+"))
}

fn init_tracing() {
    let ansi = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    tracing_subscriber::fmt()
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bitsql=warn,bitsql_core=warn".into()),
        )
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let conn = match args
        .connection_url()
        .map_err(bitsql::Error::from)
        .and_then(|url| bitsql::connect(&url))
    {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("bitsql: {err}");
            return ExitCode::FAILURE;
        }
    };

    match shell::run(&conn) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("bitsql: {err}");
            ExitCode::FAILURE
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn args(target: &str, username: Option<&str>, password: Option<&str>) -> Args {
        Args {
            host: DEFAULT_HOST.to_string(),
            username: username.map(str::to_string),
            password: password.map(str::to_string),
            target: target.to_string(),
        }
    }

    #[test]
    fn full_urls_are_used_verbatim() {
        let url = "bitable+pybitable://pt-1@open.larksuite.com/app1?filter=structured";

        let built = args(url, Some("ignored"), None)
            .connection_url()
            .expect("url should pass through");

        assert_eq!(built, url);
    }

    #[test]
    fn bare_app_tokens_are_assembled_with_escaped_credentials() {
        let built = args("bascnAbC", Some("cli_a1"), Some("s/cr@t"))
            .connection_url()
            .expect("url should assemble");

        let config = bitsql::ConnectionConfig::parse(&built).expect("assembled url should parse");
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.app_token, "bascnAbC");
        assert_eq!(
            config.auth,
            bitsql::Auth::AppCredentials {
                app_id: "cli_a1".to_string(),
                app_secret: "s/cr@t".to_string(),
            }
        );
    }

    #[test]
    fn personal_token_may_come_from_the_password_flag() {
        let built = args("app1", None, Some("pt-9"))
            .connection_url()
            .expect("url should assemble");

        let config = bitsql::ConnectionConfig::parse(&built).expect("assembled url should parse");
        assert_eq!(config.auth, bitsql::Auth::PersonalToken("pt-9".to_string()));
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;

        Args::command().debug_assert();
    }
}
