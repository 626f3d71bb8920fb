use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use journey_session::{
    AuthState, BootstrapOutcome, CachedSession, ClientError, Config, SessionReconciler,
    models::SignupForm,
    session::{Visibility, open_store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "journey", about = "Travel planner session client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 只读取本地缓存
    Status,
    /// 向后端确认会话并刷新缓存
    Whoami,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "JOURNEY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "JOURNEY_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    Logout,
    Balance,
    Buy {
        amount: i64,
    },
    Redeem {
        code: String,
    },
    /// 识别图片中的地标
    Landmark {
        image: PathBuf,
    },
    /// 持续监听认证事件，直到 Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // 加载配置
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.inline_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<(), ClientError> {
    let origin = Uuid::new_v4();
    let opened = open_store(config, origin)?;
    let reconciler = Arc::new(SessionReconciler::with_origin(
        config,
        opened.store,
        origin,
    )?);
    tracing::debug!("Using API base {}", reconciler.api().base_url());

    match command {
        Command::Status => {
            reconciler.sync();
            print_session(reconciler.state(), reconciler.current_user().as_ref());
        }
        Command::Whoami => {
            let outcome = reconciler.bootstrap().await;
            if outcome == BootstrapOutcome::Unavailable {
                println!("backend unreachable, showing cached session");
            }
            print_session(reconciler.state(), reconciler.current_user().as_ref());
        }
        Command::Login { email, password } => {
            let session = reconciler.login(&email, &password).await?;
            println!("Welcome, {}", session.display_name());
        }
        Command::Signup {
            name,
            email,
            password,
            confirm_password,
        } => {
            let form = SignupForm {
                name,
                email,
                password,
                confirm_password,
            };
            let user = reconciler.signup(&form).await?;
            println!("Account created for {}. Please log in.", user.display_name());
        }
        Command::Logout => {
            let route = reconciler.logout().await;
            println!("Logged out, go to {}", route.path());
        }
        Command::Balance => {
            let tokens = reconciler.refresh_balance().await?;
            println!("{} tokens", tokens);
        }
        Command::Buy { amount } => {
            let receipt = reconciler.buy_tokens(amount).await?;
            println!(
                "{} (balance: {})",
                receipt.message.as_deref().unwrap_or("Tokens added"),
                receipt.tokens
            );
        }
        Command::Redeem { code } => {
            let receipt = reconciler.redeem_coupon(&code).await?;
            println!("Coupon applied! Now you have total {} tokens.", receipt.tokens);
        }
        Command::Landmark { image } => {
            let bytes = tokio::fs::read(&image).await?;
            let file_name = image
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let prediction = reconciler.predict_landmark(&file_name, bytes).await?;
            println!("Location: {}", prediction.location);
            if let Some(link) = prediction.link {
                println!("Link: {}", link);
            }
        }
        Command::Watch => watch(reconciler, opened.redis).await,
    }

    Ok(())
}

async fn watch(reconciler: Arc<SessionReconciler>, redis: Option<redis::Client>) {
    let mut events = reconciler.subscribe();
    let listener = reconciler.spawn_listener();
    let watcher = redis.map(|client| reconciler.spawn_storage_watcher(client));

    let outcome = reconciler.bootstrap().await;
    tracing::info!("Bootstrap finished: {:?}", outcome);
    reconciler.on_visibility_change(Visibility::Visible);
    print_session(reconciler.state(), reconciler.current_user().as_ref());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, stopping");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => println!(
                    "{} {:?} from {} -> {:?}",
                    event.at.to_rfc3339(),
                    event.reason,
                    event.origin,
                    reconciler.state()
                ),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Missed {} auth events", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    listener.abort();
    if let Some(watcher) = watcher {
        watcher.abort();
    }
}

fn print_session(state: AuthState, user: Option<&CachedSession>) {
    match (state, user) {
        (AuthState::Authenticated, Some(user)) => {
            println!("logged in as {}", user.display_name());
            if let Some(email) = &user.email {
                println!("  email:  {}", email);
            }
            if let Some(tokens) = user.token {
                println!("  tokens: {}", tokens);
            }
            println!("  tours:  {}", user.tour_count());
        }
        (AuthState::Authenticated, None) => println!("logged in"),
        _ => println!("not logged in"),
    }
}
