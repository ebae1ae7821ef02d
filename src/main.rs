use std::path::PathBuf;

use clap::{Parser, Subcommand};
use faceauth::config::{ClientConfig, ConfigError};
use faceauth::net::HttpAuthApi;
use faceauth::net::types::ApiError;
use faceauth::pages::{self, PageOutcome, confirm_signup, face_registration, profile, signin, signup};
use faceauth::router::{Navigation, Resolution, Route};
use faceauth::state::capture::CaptureError;
use faceauth::state::{CaptureFlow, FileFrameSource, SessionState};
use faceauth::store::{COOKIES_KEY, FileStore, KeyValueStore, StoreError};
use tracing_subscriber::EnvFilter;

type Session = SessionState<HttpAuthApi, FileStore>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Parser, Debug)]
#[command(name = "faceauth", about = "FaceAuth account and face sign-in client")]
struct Cli {
    #[arg(long, env = "FACEAUTH_BACKEND_URL")]
    backend_url: Option<String>,

    #[arg(long, env = "FACEAUTH_STATE_FILE")]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account; a confirmation code is emailed.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "FACEAUTH_PASSWORD")]
        password: String,
    },
    /// Confirm an account with the emailed code.
    Confirm {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    /// Sign in with a password, or with a face image via `--face`.
    Signin {
        #[arg(long, required_unless_present = "face")]
        email: Option<String>,
        #[arg(long, env = "FACEAUTH_PASSWORD", required_unless_present = "face")]
        password: Option<String>,
        /// Image file (raw JPEG/PNG/WebP or a base64 data URL).
        #[arg(long)]
        face: Option<PathBuf>,
    },
    /// Register a face image for the signed-in account.
    RegisterFace { image: PathBuf },
    /// Show the signed-in profile.
    Me,
    /// Ask whether face sign-in is available on this machine.
    CheckFace,
    Logout,
    /// Show which page a path lands on for the current session.
    Open { path: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.backend_url.as_deref() {
        config = config.with_backend_url(url);
    }
    if let Some(path) = cli.state_file {
        config = config.with_state_file(path);
    }

    let store = FileStore::open(config.state_file.clone())?;
    let api = HttpAuthApi::new(&config)?;
    if let Some(saved) = store.get(COOKIES_KEY) {
        api.seed_cookies(&saved);
    }
    tracing::debug!(backend = %api.base_url(), state = %store.path().display(), "client ready");

    let session = SessionState::new(api, store);
    let result = run(&session, cli.command).await;
    save_cookies(&session);
    result
}

async fn run(session: &Session, command: Command) -> Result<(), CliError> {
    match command {
        Command::Signup { email, username, password } => {
            let form = signup::SignupForm { email, username, confirm_password: password.clone(), password };
            report(signup::submit(session.api(), &form).await)
        }
        Command::Confirm { email, code } => {
            let form = confirm_signup::ConfirmSignupForm { email, code };
            report(confirm_signup::submit(session.api(), &form).await)
        }
        Command::Signin { face: Some(image), .. } => {
            let mut flow = CaptureFlow::new();
            flow.capture(&mut FileFrameSource::new(image))?;
            report(signin::submit_face(session, &mut flow).await)
        }
        Command::Signin { email, password, face: None } => {
            let email = email.unwrap_or_default();
            let password = password.unwrap_or_default();
            report(signin::submit_password(session, &email, &password).await)
        }
        Command::RegisterFace { image } => {
            session.restore().await;
            let mut flow = CaptureFlow::new();
            flow.capture(&mut FileFrameSource::new(image))?;
            report(face_registration::submit(session, &mut flow).await)
        }
        Command::Me => {
            session.restore().await;
            match profile::load(session).await {
                Ok(view) => {
                    for line in view.lines() {
                        println!("{line}");
                    }
                    if let Some(label) = view.face_action_label() {
                        println!("[{label}]");
                    }
                    Ok(())
                }
                Err(redirect) => report(PageOutcome::navigate(redirect).with_info("Not signed in.")),
            }
        }
        Command::CheckFace => {
            let page = signin::load(session, None).await;
            if page.offers_face_signin() {
                println!("face sign-in available for {}", page.email);
            } else {
                println!("face sign-in not available");
            }
            Ok(())
        }
        Command::Logout => report(profile::logout(session).await),
        Command::Open { path } => match pages::visit(session, &path).await {
            Some(Resolution::Render(route)) => {
                println!("{}", route.path());
                Ok(())
            }
            Some(resolution) => report(PageOutcome::navigate(Navigation::to(resolution.route()))),
            None => Err(CliError::Rejected(format!("no page at {path}"))),
        },
    }
}

/// Print a page outcome. Error messages become the process error.
fn report(outcome: PageOutcome) -> Result<(), CliError> {
    if let Some(navigation) = &outcome.navigate {
        tracing::debug!(route = %navigation.route, "navigate");
        if navigation.route == Route::Home {
            println!("{}\n{}", pages::HOME_TITLE, pages::HOME_TAGLINE);
        } else {
            println!("next: {}", navigation.route.path());
        }
    }
    match outcome.message {
        Some(message) if message.is_error => Err(CliError::Rejected(message.text)),
        Some(message) => {
            println!("{message}");
            Ok(())
        }
        None => Ok(()),
    }
}

fn save_cookies(session: &Session) {
    let Some(header) = session.api().cookie_header() else {
        return;
    };
    if let Err(e) = session.store().set(COOKIES_KEY, &header) {
        tracing::warn!(error = %e, "failed to save cookies");
    }
}
