use std::{error::Error, sync::Arc};

use clap::{Parser, Subcommand};
use medassist::{
    auth::{AuthCoordinator, AuthState, GoogleAccount, Principal, SignInOutcome},
    db::get_db_pool,
    fixtures,
    identity::HttpIdentityProvider,
    notifications::{LogSink, NotificationReceiver, PushMessage},
    seeder,
    store::{DocumentStore, MemoryDocumentStore, PgDocumentStore},
    views::{self, BookingForm, Loaded, Settings, Source},
    Config, Gateway, PreferenceStore,
};

extern crate pretty_env_logger;
#[macro_use] extern crate log;

type AppResult = Result<(), Box<dyn Error + Send + Sync>>;

/// MedAssist health articles and appointment booking
#[derive(Parser)]
#[command(name = "medassist", version, about)]
struct Cli {
    /// Act as if the document store were unreachable
    #[arg(long, global = true)]
    offline: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert the sample articles and doctors (duplicates on every run)
    Seed,
    /// List health articles, newest first
    Articles,
    /// Show one article
    Article { id: String },
    /// List doctors by rating, or search them
    Doctors {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Book an appointment with a doctor
    Book {
        #[arg(long)]
        doctor: String,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// YYYY-MM-DD, defaults to tomorrow
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
    },
    /// List your bookings
    Bookings,
    /// Sign in with an identity token from the sign-in sheet, or as a guest
    Login {
        #[arg(long, conflicts_with_all = ["id_token", "cancelled", "status_code"])]
        guest: bool,
        #[arg(long)]
        id_token: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        /// The sign-in sheet was dismissed
        #[arg(long)]
        cancelled: bool,
        /// The sign-in sheet failed with this status code
        #[arg(long)]
        status_code: Option<i32>,
    },
    Logout,
    Whoami,
    /// Show or change display settings
    Settings {
        #[arg(long)]
        dark_theme: Option<bool>,
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long)]
        language: Option<String>,
    },
    /// Handle a push message given as JSON
    Push { payload: String },
    /// Record a rotated push token
    Token { token: String },
}

struct App {
    store: Arc<dyn DocumentStore>,
    gateway: Arc<Gateway>,
    prefs: Arc<PreferenceStore>,
}

async fn build_app(config: &Config, offline: bool) -> Result<App, Box<dyn Error + Send + Sync>> {
    let store: Arc<dyn DocumentStore> = if offline {
        Arc::new(MemoryDocumentStore::offline())
    } else if let Some(url) = &config.database_url {
        Arc::new(PgDocumentStore::new(get_db_pool(url).await?))
    } else {
        warn!("DATABASE_URL not set, using an in-memory store");
        Arc::new(MemoryDocumentStore::new())
    };
    let identity = Arc::new(HttpIdentityProvider::new(
        config.identity_base_url.clone(),
        config.identity_api_key.clone(),
    ));
    let gateway = Gateway::new(store.clone(), identity).with_booking_fallback(config.booking_fallback);
    let prefs = PreferenceStore::open(&config.prefs_dir)?;
    Ok(App { store, gateway: Arc::new(gateway), prefs: Arc::new(prefs) })
}

fn print_notice<T>(loaded: &Loaded<T>) {
    if let Some(notice) = &loaded.notice {
        println!("! {}", notice);
    }
    if loaded.source == Source::Fallback {
        println!("(showing sample data)");
    }
}

async fn run(cli: Cli) -> AppResult {
    let config = Config::from_env()?;
    let app = build_app(&config, cli.offline).await?;

    match cli.command {
        Commands::Seed => {
            let report = seeder::seed_all(app.store.as_ref()).await;
            println!("articles: {:?}, doctors: {:?}", report.articles, report.doctors);
        }
        Commands::Articles => {
            let loaded = views::load_articles(&app.gateway).await;
            print_notice(&loaded);
            for article in &loaded.items {
                println!("[{}] {} - {} ({})", article.id, article.title, article.author, article.date);
                println!("    {}", article.summary);
            }
        }
        Commands::Article { id } => {
            let article = app.gateway.get_article_by_id(&id).await?;
            println!("{}\nby {} on {}\n\n{}", article.title, article.author, article.date, article.content);
        }
        Commands::Doctors { search } => {
            let loaded = match search {
                Some(term) => views::search_doctors(&app.gateway, &term).await?,
                None => views::load_doctors(&app.gateway).await,
            };
            print_notice(&loaded);
            for d in &loaded.items {
                println!(
                    "[{}] {} - {} | {} | {} | {} | {}",
                    d.id, d.name, d.specialty, d.rating, d.distance, d.price, d.availability
                );
            }
        }
        Commands::Book { doctor, reason, name, email, phone, date, time } => {
            let doctor = views::find_doctor(&app.gateway, &doctor)
                .await
                .ok_or_else(|| format!("unknown doctor {doctor}"))?;
            let mut form = BookingForm::prefilled(&app.prefs, &doctor);
            form.reason = reason;
            if let Some(name) = name {
                form.patient_name = name;
            }
            if let Some(email) = email {
                form.patient_email = email;
            }
            if let Some(phone) = phone {
                form.phone = phone;
            }
            form.appointment_date = date.unwrap_or_default();
            form.appointment_time = time.unwrap_or_default();

            let user_id = views::current_user_id(&app.gateway, &app.prefs);
            let confirmation = form.submit(&app.gateway, &user_id).await?;
            println!("{} (booking {})", confirmation.message, confirmation.booking_id);
            println!(
                "{} with {} on {} at {}",
                confirmation.patient_name, confirmation.doctor_name, confirmation.appointment_date, confirmation.appointment_time
            );
            if !confirmation.persisted {
                println!("! this booking was not saved to the server");
            }
        }
        Commands::Bookings => {
            let user_id = views::current_user_id(&app.gateway, &app.prefs);
            let loaded = views::load_bookings(&app.gateway, &user_id).await;
            print_notice(&loaded);
            for b in &loaded.items {
                let doctor = fixtures::sample_doctor_name(&b.doctor_id).unwrap_or(b.doctor_id.as_str());
                println!("[{}] {} on {} at {} - {}", b.id, doctor, b.appointment_date, b.appointment_time, b.status);
            }
        }
        Commands::Login { guest, id_token, email, name, cancelled, status_code } => {
            let mut auth = AuthCoordinator::restore(app.gateway.clone(), app.prefs.clone());
            let session = if guest {
                auth.sign_in_as_guest()?
            } else {
                let outcome = if cancelled {
                    SignInOutcome::Cancelled
                } else if let Some(status_code) = status_code {
                    SignInOutcome::Failed { status_code, message: format!("status {status_code}") }
                } else {
                    SignInOutcome::Account(GoogleAccount { id_token, email, display_name: name })
                };
                auth.begin_sign_in()?;
                auth.complete_sign_in(outcome).await?
            };
            println!("Welcome, {}!", session.user_name);
        }
        Commands::Logout => {
            let mut auth = AuthCoordinator::restore(app.gateway.clone(), app.prefs.clone());
            auth.sign_out()?;
            println!("Signed out");
        }
        Commands::Whoami => {
            let auth = AuthCoordinator::restore(app.gateway.clone(), app.prefs.clone());
            match auth.state() {
                AuthState::SignedIn(Principal::Guest) => println!("guest"),
                AuthState::SignedIn(_) => {
                    let session = auth.session();
                    println!("{} <{}>", session.user_name, session.user_email);
                }
                _ => println!("not signed in"),
            }
        }
        Commands::Settings { dark_theme, notifications, language } => {
            let settings = Settings::new(&app.prefs);
            if let Some(enabled) = dark_theme {
                settings.set_dark_theme(enabled)?;
            }
            if let Some(enabled) = notifications {
                settings.set_notifications(enabled)?;
            }
            if let Some(language) = language {
                settings.select_language(&language)?;
            }
            println!("dark theme: {}", settings.dark_theme());
            println!("notifications: {}", settings.notifications());
            println!("language: {}", settings.language_label());
        }
        Commands::Push { payload } => {
            let message: PushMessage = serde_json::from_str(&payload)?;
            let receiver = NotificationReceiver::new(app.prefs.clone(), Box::new(LogSink));
            let shown = receiver.deliver(&message);
            println!("{} notification(s) shown", shown);
        }
        Commands::Token { token } => {
            let receiver = NotificationReceiver::new(app.prefs.clone(), Box::new(LogSink));
            receiver.on_new_token(&token)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
