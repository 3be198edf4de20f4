use clap::{Parser, Subcommand};
use doctorbot::{db, services::reset_service::POLL_INTERVAL, ChatCore};
use doctorbot::services::credential_service::RegisterRequest;
use std::env;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "doctorbot")]
#[command(about = "Account and conversation core for the DoctorBot chat service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema
    Init,

    /// Register a new account
    Register {
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,

        #[arg(long)]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        /// Birth date, yyyy-mm-dd
        #[arg(long, default_value = "")]
        birthdate: String,
    },

    /// Authenticate and print the account summary
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: Option<String>,
    },

    /// Consume an emailed verification token
    Verify {
        token: String,
    },

    /// Re-send the activation link for an unverified account
    ResendActivation {
        #[arg(short, long)]
        email: String,
    },

    /// Interactive chat session
    Chat {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: Option<String>,
    },

    /// Print the conversation transcript
    History {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: Option<String>,
    },

    /// Request a password reset and poll until it resolves
    RequestReset {
        #[arg(short, long)]
        email: String,

        /// Give up polling after this many seconds
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },

    /// Approve a pending reset (external approver)
    ApproveReset {
        #[arg(short, long)]
        email: String,
    },

    /// Reject a pending reset
    RejectReset {
        #[arg(short, long)]
        email: String,
    },

    /// Store a new password for an approved reset
    FinalizeReset {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: Option<String>,
    },

    /// Run the storage-hygiene sweep
    Maintenance,
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    print!("{}: ", prompt);
    io::stdout().flush()?;
    Ok(rpassword::read_password()?)
}

fn password_or_prompt(password: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match password {
        Some(pw) => Ok(pw),
        None => get_password(prompt),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doctorbot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url =
        env::var("BRAIN_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());

    let pool = db::create_pool().await?;
    db::init_schema(&pool).await?;

    let core = ChatCore::new(pool, &base_url);

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            println!("✅ Database schema initialized");
        }

        Commands::Register {
            email,
            password,
            first_name,
            last_name,
            birthdate,
        } => {
            let password = password_or_prompt(password, "Password")?;
            match core
                .register(RegisterRequest {
                    email,
                    password,
                    first_name,
                    last_name,
                    birthdate,
                })
                .await
            {
                Ok(account) => {
                    println!("✅ Registration successful! Check your email for the activation link.");
                    println!("  UUID: {}", account.user_uuid);
                    println!("  Email: {}", account.email);
                }
                Err(err) => {
                    eprintln!("❌ Registration failed: {}", err);
                    std::process::exit(1);
                }
            }
        }

        Commands::Login { email, password } => {
            let password = password_or_prompt(password, "Password")?;
            match core.authenticate(&email, &password).await {
                Ok(summary) => {
                    println!("✅ Welcome back, {}!", summary.first_name);
                    println!("  UUID: {}", summary.user_uuid);
                }
                Err(err) => {
                    eprintln!("❌ Login failed: {}", err);
                    std::process::exit(1);
                }
            }
        }

        Commands::Verify { token } => match core.verify_email(&token).await {
            Ok(user_uuid) => {
                println!("✅ Account verified! You may now login.");
                println!("  UUID: {}", user_uuid);
            }
            Err(err) => {
                eprintln!("❌ Verification failed: {}", err);
                std::process::exit(1);
            }
        },

        Commands::ResendActivation { email } => match core.resend_activation(&email).await {
            Ok(()) => {
                println!("✅ A fresh activation link has been sent!");
            }
            Err(err) => {
                eprintln!("❌ Failed to resend activation: {}", err);
                std::process::exit(1);
            }
        },

        Commands::Chat { email, password } => {
            let password = password_or_prompt(password, "Password")?;
            let summary = match core.authenticate(&email, &password).await {
                Ok(summary) => summary,
                Err(err) => {
                    eprintln!("❌ Login failed: {}", err);
                    std::process::exit(1);
                }
            };

            println!("Connected as {}. Type a message, or 'exit' to quit.", summary.first_name);
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let line = line?;
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                if text == "exit" {
                    break;
                }
                match core.ask(&summary.user_uuid, &summary.first_name, text).await {
                    Ok(reply) => println!("assistant: {}\n", reply),
                    Err(err) => eprintln!("❌ {}", err),
                }
            }
        }

        Commands::History { email, password } => {
            let password = password_or_prompt(password, "Password")?;
            match core.authenticate(&email, &password).await {
                Ok(summary) => {
                    let transcript = core.transcript(&summary.user_uuid).await?;
                    if transcript.is_empty() {
                        println!("No conversation history.");
                    } else {
                        print!("{}", transcript);
                    }
                }
                Err(err) => {
                    eprintln!("❌ Login failed: {}", err);
                    std::process::exit(1);
                }
            }
        }

        Commands::RequestReset { email, timeout } => {
            match core.request_reset(&email).await {
                Ok(_) => {
                    println!("✅ Reset requested. Waiting for approval...");
                }
                Err(err) => {
                    eprintln!("❌ Reset request failed: {}", err);
                    std::process::exit(1);
                }
            }

            let status = core
                .poll_reset_status(&email, POLL_INTERVAL, Duration::from_secs(timeout))
                .await?;
            println!("Reset request status: {}", status);
        }

        Commands::ApproveReset { email } => match core.approve_reset(&email).await {
            Ok(()) => println!("✅ Reset approved for '{}'", email),
            Err(err) => {
                eprintln!("❌ Failed to approve reset: {}", err);
                std::process::exit(1);
            }
        },

        Commands::RejectReset { email } => match core.reject_reset(&email).await {
            Ok(()) => println!("✅ Reset rejected for '{}'", email),
            Err(err) => {
                eprintln!("❌ Failed to reject reset: {}", err);
                std::process::exit(1);
            }
        },

        Commands::FinalizeReset { email, password } => {
            let password = match password {
                Some(pw) => pw,
                None => {
                    let pw = get_password("New password")?;
                    let confirm = get_password("Confirm password")?;
                    if pw != confirm {
                        eprintln!("❌ Passwords do not match");
                        std::process::exit(1);
                    }
                    pw
                }
            };

            match core.finalize_reset(&email, &password).await {
                Ok(()) => println!("✅ Your password has been updated!"),
                Err(err) => {
                    eprintln!("❌ Failed to update password: {}", err);
                    std::process::exit(1);
                }
            }
        }

        Commands::Maintenance => match core.run_maintenance().await {
            Ok(()) => println!("✅ Maintenance sweep complete"),
            Err(err) => {
                eprintln!("❌ Maintenance failed: {}", err);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
