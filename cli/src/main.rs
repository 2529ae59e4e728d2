use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use medcare::forms::{DoctorProfileForm, FormError, GoogleProfileForm, LoginForm, PatientProfileForm, RegistrationForm};
use medcare::guard::{self, GuardDecision};
use medcare::net::types::{ApiError, ProfileUpdate, Role};
use medcare::services::profile::{self, ProfileError};
use medcare::services::verification::{self, VerificationOutcome};
use medcare::state::store::StoreOptions;
use medcare::{AuthError, ClientConfig, FileStore, HttpApi, Session, SessionStore};
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Form(#[from] FormError),
    #[error("{0}")]
    Profile(#[from] ProfileError),
    #[error("{0}")]
    Verification(String),
    #[error("no doctor profile for user {0}")]
    DoctorNotFound(i64),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "medcare", about = "MedCare client: sign in, manage your profile, check route access")]
struct Cli {
    #[arg(long, env = "MEDCARE_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "MEDCARE_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Restore the stored session, confirm it with the backend, and print it.
    Status,
    Login {
        email: String,
        #[arg(long, env = "MEDCARE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register(RegisterArgs),
    Logout,
    Google(GoogleCommand),
    /// Pick a role and fill in the minimum profile after a first Google sign-in.
    CompleteProfile(CompleteProfileArgs),
    VerifyEmail {
        token: String,
    },
    Profile(ProfileCommand),
    /// Show a doctor's public profile.
    Doctor {
        user_id: i64,
    },
    /// Print what the route guard decides for a path.
    Route {
        path: String,
    },
}

#[derive(Args, Debug)]
struct RegisterArgs {
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
    #[arg(long, default_value = "patient")]
    role: Role,
    #[arg(long, default_value = "")]
    full_name: String,
    #[arg(long, default_value = "")]
    phone: String,
}

#[derive(Args, Debug)]
struct GoogleCommand {
    #[command(subcommand)]
    command: GoogleSubcommand,
}

#[derive(Subcommand, Debug)]
enum GoogleSubcommand {
    /// Print the Google authorization URL.
    Url,
    /// Finish sign-in with the `code` from the callback URL.
    Callback { code: String },
}

#[derive(Args, Debug)]
struct CompleteProfileArgs {
    #[arg(long, default_value = "patient")]
    role: Role,
    #[arg(long)]
    full_name: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    district: String,
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    SavePatient {
        #[arg(long, default_value = "")]
        full_name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
    },
    SaveDoctor {
        #[arg(long, default_value = "")]
        full_name: String,
        #[arg(long)]
        specialization: String,
        #[arg(long)]
        cost: String,
        #[arg(long, default_value = "")]
        experience: String,
        #[arg(long, default_value = "")]
        education: String,
        #[arg(long, default_value = "")]
        practice_areas: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url;
    }
    if let Some(session_file) = cli.session_file {
        config.session_file = session_file;
    }

    let api = Arc::new(HttpApi::from_config(&config)?);
    let storage = Arc::new(FileStore::new(&config.session_file));
    let store = SessionStore::new(api, storage, StoreOptions::from_config(&config));

    match cli.command {
        Command::Status => {
            store.initialize_auth().await?;
            print_json(&session_json(&store.session()))
        }
        Command::Login { email, password } => {
            let form = LoginForm { email, password };
            let (email, password) = form.validate()?;
            let user = store.login(email, password).await?;
            print_json(&json!(user))
        }
        Command::Register(args) => run_register(&store, args).await,
        Command::Logout => {
            store.logout()?;
            println!("logged out");
            Ok(())
        }
        Command::Google(google) => run_google(&store, google).await,
        Command::CompleteProfile(args) => run_complete_profile(&store, args).await,
        Command::VerifyEmail { token } => {
            let outcome = verification::verify_email(&store, &token).await;
            match outcome {
                VerificationOutcome::Verified(message) => {
                    println!("{message}");
                    Ok(())
                }
                other => Err(CliError::Verification(other.message().to_owned())),
            }
        }
        Command::Profile(command) => run_profile(&store, command).await,
        Command::Doctor { user_id } => match profile::fetch_doctor_profile(&store, user_id).await? {
            Some(doctor) => print_json(&json!(doctor)),
            None => Err(CliError::DoctorNotFound(user_id)),
        },
        Command::Route { path } => {
            store.initialize_auth().await?;
            let (route, decision) = guard::resolve_path(&store.session(), &path);
            match decision {
                GuardDecision::Loading => println!("loading"),
                GuardDecision::Redirect(redirect) => println!("redirect {} -> {}", route.to_path(), redirect.to),
                GuardDecision::Forbidden(denial) => println!("{}", denial.message()),
                GuardDecision::Granted => println!("granted {}", route.to_path()),
            }
            Ok(())
        }
    }
}

async fn run_register(store: &SessionStore, args: RegisterArgs) -> Result<(), CliError> {
    let form = RegistrationForm {
        email: args.email,
        password: args.password,
        confirm_password: args.confirm_password,
        role: args.role,
        full_name: args.full_name,
        contact_phone: args.phone,
    };
    let request = form.validate()?;
    let user = store.register_user(&request).await?;
    eprintln!("account created; check {} for a verification link", user.email);
    print_json(&json!(user))
}

async fn run_google(store: &SessionStore, google: GoogleCommand) -> Result<(), CliError> {
    match google.command {
        GoogleSubcommand::Url => {
            println!("{}", store.login_with_google()?);
            Ok(())
        }
        GoogleSubcommand::Callback { code } => match store.process_google_auth(&code).await? {
            Some(user) => {
                if store.session().needs_profile_update() {
                    eprintln!("profile incomplete; run `medcare complete-profile`");
                }
                print_json(&json!(user))
            }
            None => {
                eprintln!("another sign-in is in progress");
                Ok(())
            }
        },
    }
}

async fn run_complete_profile(store: &SessionStore, args: CompleteProfileArgs) -> Result<(), CliError> {
    let form = GoogleProfileForm {
        role: args.role,
        full_name: args.full_name,
        contact_phone: args.phone,
        contact_address: args.address,
        district: args.district,
    };
    let request = form.validate()?;
    store.initialize_auth().await?;
    let user = store.complete_google_profile(&request).await?;
    print_json(&json!(user))
}

async fn run_profile(store: &SessionStore, command: ProfileCommand) -> Result<(), CliError> {
    let update = match command.command {
        ProfileSubcommand::Show => {
            store.initialize_auth().await?;
            return match profile::fetch_my_profile(store).await? {
                Some(found) => print_json(&json!(found)),
                None => {
                    println!("profile not created yet");
                    Ok(())
                }
            };
        }
        ProfileSubcommand::SavePatient { full_name, phone, address } => {
            let form = PatientProfileForm { full_name, contact_phone: phone, contact_address: address };
            ProfileUpdate::Patient(form.validate()?)
        }
        ProfileSubcommand::SaveDoctor { full_name, specialization, cost, experience, education, practice_areas } => {
            let form = DoctorProfileForm {
                full_name,
                specialization,
                experience,
                education,
                cost_per_consultation: cost,
                practice_areas,
            };
            ProfileUpdate::Doctor(form.validate()?)
        }
    };

    store.initialize_auth().await?;
    let saved = profile::save_my_profile(store, &update).await?;
    print_json(&json!(saved))
}

fn session_json(session: &Session) -> Value {
    json!({
        "authenticated": session.is_authenticated(),
        "verified": session.is_verified(),
        "needs_profile_update": session.needs_profile_update(),
        "role": session.role(),
        "user": session.user(),
        "error": session.error(),
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
