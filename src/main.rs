use shareticon::{
    ApiClient, AuthFailurePolicy, ClientConfig, GuardOutcome, RouteGuard, SessionClient,
};
use std::process::ExitCode;

const USAGE: &str = "usage: shareticon <login TOKEN | status | profile | groups | requests | logout>";

async fn run(command: &str, arg: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    log::debug!("using API base {}", config.base_url);
    let session = SessionClient::from_config(config)?;

    match command {
        "login" => {
            let token = arg.ok_or(USAGE)?;
            session.login(token).await?;
            println!("logged in");
        }
        "logout" => {
            session.logout().await?;
            println!("logged out");
        }
        "status" => {
            match RouteGuard::new(AuthFailurePolicy::Interstitial)
                .check(&session)
                .await
            {
                GuardOutcome::Authenticated(_) => println!("authenticated"),
                GuardOutcome::AuthRequired | GuardOutcome::Redirect { .. } => {
                    println!("login required")
                }
                GuardOutcome::ServerUnreachable => println!("server unreachable, try again"),
            }
        }
        "profile" | "groups" | "requests" => {
            let outcome = RouteGuard::new(AuthFailurePolicy::Redirect)
                .check(&session)
                .await;
            match outcome {
                GuardOutcome::Authenticated(_) => {}
                GuardOutcome::ServerUnreachable => return Err("server unreachable".into()),
                GuardOutcome::Redirect { to } => return Err(format!("login required ({to})").into()),
                GuardOutcome::AuthRequired => return Err("login required".into()),
            }

            let api = ApiClient::new(session);
            let output = match command {
                "profile" => serde_json::to_string_pretty(&api.profile().await?)?,
                "groups" => serde_json::to_string_pretty(&api.groups().await?)?,
                _ => serde_json::to_string_pretty(&api.join_requests().await?)?,
            };
            println!("{output}");
        }
        _ => return Err(USAGE.into()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    match run(command, args.get(1).map(String::as_str)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{command} failed: {e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
