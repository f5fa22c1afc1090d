//! Attendance CLI - Command-line access to the attendance backend
//!
//! Signs professors and students in, persists the resulting session and
//! reports on it.

use attendance_client::{ApiClientConfig, AttendanceApiClient, AuthFlow};
use attendance_core::{
    init_logging, log_operation_start, log_operation_success, AttendanceError, AttendanceResult,
    ClientConfig, ErrorContext, LoggingConfig,
};
use attendance_session::{FileSessionBackend, Session, SessionStore};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "attendance")]
#[command(about = "Sign in to the biometric attendance backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Session(SessionCommand),

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

/// Commands that talk to the backend or the stored session
#[derive(Subcommand)]
enum SessionCommand {
    /// Check that the backend is reachable
    Health,

    /// Professor login with EUID and password
    Login {
        /// EUID, e.g. abc1234
        euid: String,

        /// Password
        #[arg(short, long, env = "ATTENDANCE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Enroll a student in a class with a join code and reference photo
    Enroll {
        /// Student EUID
        euid: String,

        /// Class code, e.g. csce_4900_500
        #[arg(long)]
        code: String,

        /// Join code handed out by the professor
        #[arg(long)]
        join_code: String,

        /// Photo file (JPEG or PNG)
        #[arg(long)]
        photo: PathBuf,
    },

    /// Student login by face
    FaceLogin {
        /// Student EUID
        euid: String,

        /// Photo file (JPEG or PNG)
        #[arg(long)]
        photo: PathBuf,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored session
    Whoami,
}

#[tokio::main]
async fn main() -> AttendanceResult<()> {
    let cli = Cli::parse();

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };

    init_logging(&logging_config).map_err(|e| AttendanceError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check the RUST_LOG environment variable"),
    })?;

    info!("Starting attendance CLI v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(cli.config.as_deref())?;
    config.apply_env_overrides();

    let result = match cli.command {
        Commands::Config {
            show,
            init,
            validate,
        } => handle_config(show, init, validate, &config).await,
        Commands::Session(command) => run(command, &config).await,
    };

    if let Err(e) = result {
        e.log();
        eprintln!("Error: {}", e);
        if let Some(context) = e.context() {
            for suggestion in &context.recovery_suggestions {
                eprintln!("  hint: {}", suggestion);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(config_path: Option<&Path>) -> AttendanceResult<ClientConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return ClientConfig::from_file(path);
    }

    for path in default_config_paths().into_iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return ClientConfig::from_file(&path);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(ClientConfig::default())
}

fn default_config_paths() -> [Option<PathBuf>; 3] {
    [
        dirs::config_dir().map(|d| d.join("attendance").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".attendance").join("config.toml")),
        Some(PathBuf::from("attendance.toml")),
    ]
}

/// Where `config --init` writes
fn config_init_path() -> AttendanceResult<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|d| d.join("attendance").join("config.toml"))
        .ok_or_else(|| AttendanceError::Config {
            message: "Could not determine a configuration directory".to_string(),
            source: None,
            context: ErrorContext::new("cli")
                .with_operation("config_init")
                .with_suggestion("Pass --config with an explicit path"),
        })
}

async fn build_flow(config: &ClientConfig) -> AttendanceResult<AuthFlow> {
    let session_dir = config.storage.resolved_session_dir();
    debug!("Using session directory {:?}", session_dir);

    let backend = FileSessionBackend::new(&session_dir, &config.storage.namespace);
    let sessions = Arc::new(SessionStore::open(Arc::new(backend)).await);

    let client = AttendanceApiClient::new(ApiClientConfig::from(&config.api), sessions.clone())?;
    Ok(AuthFlow::new(Arc::new(client), sessions))
}

async fn run(command: SessionCommand, config: &ClientConfig) -> AttendanceResult<()> {
    config.validate()?;
    let flow = build_flow(config).await?;

    match command {
        SessionCommand::Health => {
            let health = flow.health().await?;
            match &health.request_id {
                Some(id) => println!("Backend status: {} (request {})", health.status, id),
                None => println!("Backend status: {}", health.status),
            }
        }
        SessionCommand::Login { euid, password } => {
            let session = flow.login_professor(&euid, &password).await?;
            println!("Signed in as professor {}", session.user_id().unwrap_or(&euid));
        }
        SessionCommand::Enroll {
            euid,
            code,
            join_code,
            photo,
        } => {
            let photo = read_photo(&photo).await?;
            let session = flow.enroll_student(&euid, &code, &join_code, &photo).await?;
            println!(
                "Enrolled in {} and signed in as student {}",
                code.trim(),
                session.user_id().unwrap_or(&euid)
            );
        }
        SessionCommand::FaceLogin { euid, photo } => {
            let photo = read_photo(&photo).await?;
            let session = flow.face_login_student(&euid, &photo).await?;
            println!("Signed in as student {}", session.user_id().unwrap_or(&euid));
        }
        SessionCommand::Logout => {
            flow.logout().await?;
            println!("Signed out");
        }
        SessionCommand::Whoami => {
            let session = flow.sessions().load().await;
            print!("{}", describe_session(&session));
        }
    }

    Ok(())
}

/// Read a photo file and base64-encode it for upload
async fn read_photo(path: &Path) -> AttendanceResult<String> {
    log_operation_start!("read_photo", path = ?path);

    let bytes = tokio::fs::read(path).await.map_err(|e| AttendanceError::Validation {
        message: format!("Cannot read photo {:?}: {}", path, e),
        field: Some("photo".to_string()),
        context: ErrorContext::new("cli")
            .with_operation("read_photo")
            .with_suggestion("Check the photo path"),
    })?;

    log_operation_success!("read_photo", bytes = bytes.len());
    Ok(BASE64.encode(bytes))
}

fn describe_session(session: &Session) -> String {
    if session.is_empty() {
        return "Not signed in\n".to_string();
    }

    let field = |value: &Option<String>| value.as_deref().unwrap_or("-").to_string();
    let token = |value: &Option<String>| {
        value
            .as_deref()
            .map(mask_token)
            .unwrap_or_else(|| "-".to_string())
    };

    format!(
        "euid:          {}\nrole:          {}\naccess token:  {}\nrefresh token: {}\nsigned in:     {}\n",
        field(&session.euid),
        field(&session.role),
        token(&session.access_token),
        token(&session.refresh_token),
        if session.is_logged_in() { "yes" } else { "no" },
    )
}

/// Keep the first and last four characters of long tokens
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

async fn handle_config(
    show: bool,
    init: bool,
    validate: bool,
    config: &ClientConfig,
) -> AttendanceResult<()> {
    if init {
        let config_path = config_init_path()?;
        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        ClientConfig::default().save_to_file(&config_path)?;
        println!("Configuration initialized at: {:?}", config_path);
    }

    if show {
        let rendered = toml::to_string_pretty(config).map_err(|e| AttendanceError::Config {
            message: format!("Failed to render configuration: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("cli").with_operation("config_show"),
        })?;
        println!("{}", rendered);
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("Configuration is valid"),
            Err(e) => {
                println!("Configuration validation failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}
