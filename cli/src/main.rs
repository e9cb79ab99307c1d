use std::path::PathBuf;
use std::sync::Arc;

use carpool::config::{ClientConfig, DEFAULT_API_URL, DEFAULT_SESSION_FILE};
use carpool::net::api::{ApiClient, CarpoolApi, DEFAULT_RECENT_RATINGS, Navigator};
use carpool::net::error::ApiError;
use carpool::net::session::{FileSessionStore, SessionError, SessionStore};
use carpool::net::types::{
    LoginRequest, ProfileUpdate, RatingRequest, RegisterRequest, Ride, RideFilter, RideOffer, RideSearch, RideStatus,
    RideUpdate,
};
use carpool::state::StateError;
use carpool::state::actions::{Role, booking_actions, ride_actions};
use carpool::state::auth::{AuthState, Registration};
use carpool::state::dashboard::DashboardState;
use carpool::state::stats::DashboardStats;
use carpool::util::contact::{ContactKind, default_message, display_phone, whatsapp_link};
use carpool::util::validation::{validate_rating, validate_ride_search};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{Value, json};
use time::{OffsetDateTime, PrimitiveDateTime};


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not signed in; run `carpool-cli auth login` first")]
    NotSignedIn,
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    State(#[from] StateError),
    #[error("session storage failed: {0}")]
    Session(#[from] SessionError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "carpool-cli", about = "Carpool ride-sharing API CLI")]
struct Cli {
    #[arg(long, env = "CARPOOL_API_URL", default_value = DEFAULT_API_URL)]
    base_url: String,

    #[arg(long, env = "CARPOOL_SESSION_FILE", default_value = DEFAULT_SESSION_FILE)]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Auth(AuthCommand),
    Rides(RidesCommand),
    Bookings(BookingsCommand),
    /// Load the dashboard with the actions each card offers.
    Dashboard,
    Profile(ProfileCommand),
    Ratings(RatingsCommand),
    /// Print a WhatsApp link for a phone number.
    Contact(ContactArgs),
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Args, Debug)]
struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
enum AuthSubcommand {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CARPOOL_PASSWORD")]
        password: String,
    },
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long, env = "CARPOOL_PASSWORD")]
        password: String,
    },
    Logout,
    Refresh,
    Whoami,
    VerifyEmail {
        token: String,
    },
    ForgotPassword {
        email: String,
    },
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long)]
        new_password: String,
    },
}

// =============================================================================
// RIDES
// =============================================================================

#[derive(Args, Debug)]
struct RidesCommand {
    #[command(subcommand)]
    command: RidesSubcommand,
}

#[derive(Args, Debug)]
struct RideFields {
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    #[arg(long)]
    date: String,
    #[arg(long)]
    time: String,
    #[arg(long)]
    seats: u32,
    #[arg(long)]
    price: f64,
    #[arg(long)]
    car_model: String,
    #[arg(long)]
    car_number: String,
    #[arg(long)]
    info: Option<String>,
    #[arg(long, default_value_t = false)]
    instant: bool,
}

#[derive(Subcommand, Debug)]
enum RidesSubcommand {
    Offer(RideFields),
    Search {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        date: String,
        #[arg(long, default_value_t = 1)]
        passengers: u32,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        max_price: Option<f64>,
    },
    Filter {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long)]
        min_seats: Option<u32>,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    Mine,
    Show {
        ride_id: i64,
    },
    Update {
        ride_id: i64,
        #[command(flatten)]
        fields: RideFields,
    },
    Delete {
        ride_id: i64,
    },
    Cancel {
        ride_id: i64,
    },
    Status {
        ride_id: i64,
        status: RideStatus,
    },
    Locations {
        #[arg(value_enum)]
        side: LocationSide,
    },
    Book {
        ride_id: i64,
        #[arg(long, default_value_t = 1)]
        seats: u32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LocationSide {
    From,
    To,
}

// =============================================================================
// BOOKINGS / PROFILE / RATINGS / CONTACT
// =============================================================================

#[derive(Args, Debug)]
struct BookingsCommand {
    #[command(subcommand)]
    command: BookingsSubcommand,
}

#[derive(Subcommand, Debug)]
enum BookingsSubcommand {
    /// Bookings you made as a passenger.
    Mine,
    /// Bookings other users made on your rides.
    Received,
    Confirm {
        booking_id: i64,
    },
    Reject {
        booking_id: i64,
    },
    Cancel {
        booking_id: i64,
    },
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
}

#[derive(Args, Debug)]
struct RatingsCommand {
    #[command(subcommand)]
    command: RatingsSubcommand,
}

#[derive(Subcommand, Debug)]
enum RatingsSubcommand {
    Create {
        #[arg(long)]
        ride_id: i64,
        #[arg(long)]
        ratee_id: i64,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: Option<String>,
    },
    List {
        user_id: i64,
    },
    Recent {
        user_id: i64,
        #[arg(long, default_value_t = DEFAULT_RECENT_RATINGS)]
        limit: u32,
    },
    UpdateStats {
        user_id: i64,
    },
}

#[derive(Args, Debug)]
struct ContactArgs {
    phone: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long, value_enum, default_value_t = ContactArg::User)]
    kind: ContactArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ContactArg {
    Driver,
    Passenger,
    User,
}

impl From<ContactArg> for ContactKind {
    fn from(arg: ContactArg) -> Self {
        match arg {
            ContactArg::Driver => Self::Driver,
            ContactArg::Passenger => Self::Passenger,
            ContactArg::User => Self::User,
        }
    }
}

// =============================================================================
// RUNTIME
// =============================================================================

struct CliContext {
    api: ApiClient,
    store: Arc<dyn SessionStore>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?.with_api_url(&cli.base_url)?;
    config.session_file = cli.session_file;

    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(config.session_file.clone()));
    let navigator: Arc<dyn Navigator> =
        Arc::new(|path: &str| eprintln!("session expired; sign in again (redirect to {path})"));
    let api = ApiClient::new(&config, store.clone())?.with_navigator(navigator);
    let ctx = CliContext { api, store };

    match cli.command {
        Command::Auth(auth) => run_auth(&ctx, auth.command).await,
        Command::Rides(rides) => run_rides(&ctx, rides.command).await,
        Command::Bookings(bookings) => run_bookings(&ctx, bookings.command).await,
        Command::Dashboard => run_dashboard(&ctx).await,
        Command::Profile(profile) => run_profile(&ctx, profile.command).await,
        Command::Ratings(ratings) => run_ratings(&ctx, ratings.command).await,
        Command::Contact(args) => run_contact(&args),
    }
}

async fn run_auth(ctx: &CliContext, command: AuthSubcommand) -> Result<(), CliError> {
    let mut auth = AuthState::restore(ctx.store.as_ref());
    let store = ctx.store.as_ref();
    match command {
        AuthSubcommand::Login { email, password } => {
            let user = auth.login(&ctx.api, store, &LoginRequest { email, password }).await?;
            print_json(&user)
        }
        AuthSubcommand::Register { first_name, last_name, email, phone, password } => {
            let request = RegisterRequest { first_name, last_name, email, phone, password };
            match auth.register(&ctx.api, store, &request).await? {
                Registration::SignedIn(user) => print_json(&json!({ "signedIn": true, "user": user })),
                Registration::Created(user) => print_json(&json!({ "signedIn": false, "user": user })),
            }
        }
        AuthSubcommand::Logout => {
            auth.logout(&ctx.api, store).await?;
            print_message("Signed out")
        }
        AuthSubcommand::Refresh => {
            auth.refresh_token(&ctx.api, store).await?;
            print_message("Token refreshed")
        }
        AuthSubcommand::Whoami => print_json(&auth.user().ok_or(CliError::NotSignedIn)?),
        AuthSubcommand::VerifyEmail { token } => print_message(&auth.verify_email(&ctx.api, store, &token).await?),
        AuthSubcommand::ForgotPassword { email } => print_message(&auth.forgot_password(&ctx.api, &email).await?),
        AuthSubcommand::ResetPassword { token, new_password } => {
            print_message(&auth.reset_password(&ctx.api, &token, &new_password).await?)
        }
    }
}

async fn run_rides(ctx: &CliContext, command: RidesSubcommand) -> Result<(), CliError> {
    let api = &ctx.api;
    match command {
        RidesSubcommand::Offer(fields) => {
            require_session(ctx)?;
            let mut dashboard = DashboardState::default();
            let ride = dashboard.offer_ride(api, &ride_offer(fields)).await?;
            print_json(&ride)
        }
        RidesSubcommand::Search { from, to, date, passengers, time, max_price } => {
            let search = RideSearch { from, to, date, passengers, time, max_price };
            validate_ride_search(&search).map_err(StateError::from)?;
            print_json(&api.search_rides(&search).await.into_result_or_default()?)
        }
        RidesSubcommand::Filter { from, to, start_date, end_date, min_price, max_price, min_seats, page, size } => {
            let filter = RideFilter { from, to, start_date, end_date, min_price, max_price, min_seats, page, size };
            print_json(&api.filter_rides(&filter).await.into_result_or_default()?)
        }
        RidesSubcommand::Mine => print_json(&api.my_rides().await.into_result_or_default()?),
        RidesSubcommand::Show { ride_id } => print_json(&api.ride_details(ride_id).await.into_result()?),
        RidesSubcommand::Update { ride_id, fields } => {
            let mut dashboard = load_dashboard(ctx).await?;
            dashboard.update_ride(api, ride_id, &ride_update(fields)).await?;
            print_json(&dashboard.ride(ride_id))
        }
        RidesSubcommand::Delete { ride_id } => {
            let mut dashboard = load_dashboard(ctx).await?;
            dashboard.delete_ride(api, ride_id).await?;
            print_message("Ride deleted")
        }
        RidesSubcommand::Cancel { ride_id } => {
            let mut dashboard = load_dashboard(ctx).await?;
            dashboard.cancel_ride(api, ride_id).await?;
            print_json(&dashboard.ride(ride_id))
        }
        RidesSubcommand::Status { ride_id, status } => {
            let mut dashboard = load_dashboard(ctx).await?;
            dashboard.change_ride_status(api, ride_id, status, now()).await?;
            print_json(&dashboard.ride(ride_id))
        }
        RidesSubcommand::Locations { side } => {
            let locations = match side {
                LocationSide::From => api.from_locations().await,
                LocationSide::To => api.to_locations().await,
            };
            print_json(&locations.into_result_or_default()?)
        }
        RidesSubcommand::Book { ride_id, seats } => {
            require_session(ctx)?;
            let ride: Ride = api.ride_details(ride_id).await.into_result()?;
            let mut dashboard = DashboardState::default();
            let booking = dashboard.book_ride(api, &ride, seats).await?;
            print_json(&booking)
        }
    }
}

async fn run_bookings(ctx: &CliContext, command: BookingsSubcommand) -> Result<(), CliError> {
    let api = &ctx.api;
    match command {
        BookingsSubcommand::Mine => print_json(&api.my_bookings().await.into_result_or_default()?),
        BookingsSubcommand::Received => print_json(&api.my_ride_bookings().await.into_result_or_default()?),
        BookingsSubcommand::Confirm { booking_id } => {
            let mut dashboard = load_dashboard(ctx).await?;
            dashboard.confirm_booking(api, booking_id).await?;
            print_message("Booking confirmed")
        }
        BookingsSubcommand::Reject { booking_id } => {
            let mut dashboard = load_dashboard(ctx).await?;
            dashboard.reject_booking(api, booking_id).await?;
            print_message("Booking rejected")
        }
        BookingsSubcommand::Cancel { booking_id } => {
            let mut dashboard = load_dashboard(ctx).await?;
            dashboard.cancel_booking(api, booking_id).await?;
            print_message("Booking cancelled")
        }
    }
}

async fn run_dashboard(ctx: &CliContext) -> Result<(), CliError> {
    let auth = AuthState::restore(ctx.store.as_ref());
    let dashboard = load_dashboard(ctx).await?;
    let stats = DashboardStats::compute(auth.user(), &dashboard);
    let now = now();

    let rides: Vec<Value> = dashboard
        .rides
        .iter()
        .map(|ride| json!({ "ride": ride, "actions": ride_actions(ride, now) }))
        .collect();
    let bookings: Vec<Value> = dashboard
        .bookings
        .iter()
        .map(|b| json!({ "booking": b, "actions": booking_actions(b, Role::Passenger) }))
        .collect();
    let received: Vec<Value> = dashboard
        .received
        .iter()
        .map(|b| json!({ "booking": b, "actions": booking_actions(b, Role::Driver) }))
        .collect();

    print_json(&json!({
        "stats": stats,
        "error": dashboard.error,
        "rides": rides,
        "bookings": bookings,
        "received": received,
    }))
}

async fn run_profile(ctx: &CliContext, command: ProfileSubcommand) -> Result<(), CliError> {
    match command {
        ProfileSubcommand::Show => print_json(&ctx.api.user_profile().await.into_result()?),
        ProfileSubcommand::Update { first_name, last_name, phone, location, bio } => {
            let mut auth = AuthState::restore(ctx.store.as_ref());
            let update = ProfileUpdate { first_name, last_name, phone, location, bio };
            let user = auth.save_profile(&ctx.api, ctx.store.as_ref(), &update).await?;
            print_json(&user)
        }
    }
}

async fn run_ratings(ctx: &CliContext, command: RatingsSubcommand) -> Result<(), CliError> {
    let api = &ctx.api;
    match command {
        RatingsSubcommand::Create { ride_id, ratee_id, rating, comment } => {
            let request = RatingRequest { rating, comment, ride_id, ratee_id };
            validate_rating(&request).map_err(StateError::from)?;
            print_json(&api.create_rating(&request).await.into_result()?)
        }
        RatingsSubcommand::List { user_id } => print_json(&api.user_ratings(user_id).await.into_result_or_default()?),
        RatingsSubcommand::Recent { user_id, limit } => {
            print_json(&api.recent_user_ratings(user_id, limit).await.into_result_or_default()?)
        }
        RatingsSubcommand::UpdateStats { user_id } => {
            print_message(&api.update_user_stats(user_id).await.into_ack()?)
        }
    }
}

fn run_contact(args: &ContactArgs) -> Result<(), CliError> {
    let message = default_message(args.kind.into(), args.name.as_deref());
    print_json(&json!({
        "phone": display_phone(&args.phone),
        "link": whatsapp_link(&args.phone, &message),
    }))
}

// =============================================================================
// HELPERS
// =============================================================================

fn require_session(ctx: &CliContext) -> Result<(), CliError> {
    if AuthState::restore(ctx.store.as_ref()).is_authenticated() { Ok(()) } else { Err(CliError::NotSignedIn) }
}

async fn load_dashboard(ctx: &CliContext) -> Result<DashboardState, CliError> {
    require_session(ctx)?;
    let mut dashboard = DashboardState::default();
    dashboard.load(&ctx.api).await;
    if let Some(error) = &dashboard.error {
        tracing::warn!(%error, "dashboard partially loaded");
    }
    Ok(dashboard)
}

fn ride_offer(fields: RideFields) -> RideOffer {
    RideOffer {
        from: fields.from,
        to: fields.to,
        departure_date: fields.date,
        departure_time: fields.time,
        passengers: fields.seats,
        price_per_seat: fields.price,
        car_model: fields.car_model,
        car_number: fields.car_number,
        additional_info: fields.info,
        instant_booking: fields.instant,
    }
}

fn ride_update(fields: RideFields) -> RideUpdate {
    RideUpdate {
        from: fields.from,
        to: fields.to,
        departure_date: fields.date,
        departure_time: fields.time,
        car_model: fields.car_model,
        car_number: fields.car_number,
        total_seats: fields.seats,
        price_per_seat: fields.price,
        additional_info: fields.info,
        instant_booking: fields.instant,
    }
}

/// Local wall-clock time, the zone departures are entered in. Falls back to
/// UTC when the local offset cannot be determined.
fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_local().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "local offset unavailable; comparing departures in UTC");
        OffsetDateTime::now_utc()
    });
    wall_clock(now)
}

/// Drop the offset, keeping the wall-clock reading in that offset.
fn wall_clock(at: OffsetDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(at.date(), at.time())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn print_message(message: &str) -> Result<(), CliError> {
    print_json(&json!({ "message": message }))
}
