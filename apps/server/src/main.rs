use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use sqlx::Row;
use tokio::net::TcpListener;
use tracing::info;

use dewana_auth::{AuthError, Identity};
use dewana_config::load as load_config;
use dewana_events::{
    EventCategory, EventDraft, PublicationState, RsvpForm, RsvpSession, RsvpStatus,
    SubEventDraft,
};
use dewana_gateway::{build_router, GatewayState};
use dewana_runtime::{telemetry, BackendServices};

const DEMO_HOST_EMAIL: &str = "host@dewana.local";
const DEMO_HOST_PASSWORD: &str = "dewana-demo";

#[derive(Parser)]
#[command(name = "dewana-backend")]
#[command(about = "Dewana event invitation backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Print events and responses stored in the database
    DumpData,
    /// Delete all events, responses, views and notifications
    ClearData,
    /// Create a demo host with a published event and a few responses
    SeedData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing().context("failed to initialise tracing")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::DumpData => dump_data().await,
        Commands::ClearData => clear_data().await,
        Commands::SeedData => seed_data().await,
    }
}

async fn initialise() -> anyhow::Result<(dewana_config::AppConfig, BackendServices)> {
    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;
    Ok((config, services))
}

async fn run_server() -> anyhow::Result<()> {
    info!("starting Dewana backend");
    let (config, services) = initialise().await?;

    let state = GatewayState::new(services.authenticator.clone(), services.events.clone())
        .with_cover_mount(
            config.storage.cover_dir.clone(),
            config.storage.cover_url_prefix.clone(),
        );
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(dewana_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn dump_data() -> anyhow::Result<()> {
    let (_, services) = initialise().await?;

    let events = sqlx::query(
        r#"
        SELECT id, public_id, slug, event_name, status, rsvp_enabled, start_date, view_count
        FROM events
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch events")?;

    println!("=== EVENTS ===");
    if events.is_empty() {
        println!("No events found in database");
    } else {
        println!("Found {} events:", events.len());
        println!(
            "{:<5} {:<26} {:<32} {:<30} {:<10} {:<5} {:<25} {:<6}",
            "ID", "Public ID", "Slug", "Name", "Status", "RSVP", "Starts", "Views"
        );
        println!("{}", "-".repeat(150));

        for event in events {
            let id: i64 = event.get("id");
            let public_id: String = event.get("public_id");
            let slug: String = event.get("slug");
            let name: String = event.get("event_name");
            let status: String = event.get("status");
            let rsvp_enabled: bool = event.get("rsvp_enabled");
            let start_date: String = event.get("start_date");
            let view_count: i64 = event.get("view_count");

            println!(
                "{:<5} {:<26} {:<32} {:<30} {:<10} {:<5} {:<25} {:<6}",
                id, public_id, slug, name, status, rsvp_enabled, start_date, view_count
            );
        }
    }

    println!("\n=== RSVPS ===");
    let rsvps = sqlx::query(
        r#"
        SELECT event_id, guest_name, guest_email, rsvp_status, guest_count, submitted_at
        FROM rsvps
        ORDER BY event_id ASC, submitted_at ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch rsvps")?;

    if rsvps.is_empty() {
        println!("No responses found in database");
    } else {
        println!("Found {} responses:", rsvps.len());
        println!(
            "{:<8} {:<24} {:<32} {:<7} {:<7} {:<25}",
            "Event", "Guest", "Email", "Status", "Guests", "Submitted At"
        );
        println!("{}", "-".repeat(110));

        for rsvp in rsvps {
            let event_id: i64 = rsvp.get("event_id");
            let guest_name: String = rsvp.get("guest_name");
            let guest_email: String = rsvp.get("guest_email");
            let status: String = rsvp.get("rsvp_status");
            let guest_count: Option<i64> = rsvp.get("guest_count");
            let submitted_at: String = rsvp.get("submitted_at");

            println!(
                "{:<8} {:<24} {:<32} {:<7} {:<7} {:<25}",
                event_id,
                guest_name,
                guest_email,
                status,
                guest_count
                    .map(|count| count.to_string())
                    .unwrap_or("-".to_string()),
                submitted_at
            );
        }
    }

    Ok(())
}

async fn clear_data() -> anyhow::Result<()> {
    let (_, services) = initialise().await?;
    let mut tx = services.db_pool.begin().await?;

    let notifications_deleted = sqlx::query("DELETE FROM notifications")
        .execute(&mut *tx)
        .await
        .context("failed to delete notifications")?;
    let views_deleted = sqlx::query("DELETE FROM event_views")
        .execute(&mut *tx)
        .await
        .context("failed to delete event views")?;
    let rsvps_deleted = sqlx::query("DELETE FROM rsvps")
        .execute(&mut *tx)
        .await
        .context("failed to delete rsvps")?;
    sqlx::query("DELETE FROM sub_events")
        .execute(&mut *tx)
        .await
        .context("failed to delete sub-events")?;
    let events_deleted = sqlx::query("DELETE FROM events")
        .execute(&mut *tx)
        .await
        .context("failed to delete events")?;

    tx.commit().await?;

    println!("Database cleared:");
    println!("- {} events deleted", events_deleted.rows_affected());
    println!("- {} responses deleted", rsvps_deleted.rows_affected());
    println!("- {} views deleted", views_deleted.rows_affected());
    println!("- {} notifications deleted", notifications_deleted.rows_affected());

    Ok(())
}

async fn seed_data() -> anyhow::Result<()> {
    let (_, services) = initialise().await?;
    let host = demo_host(&services).await?;

    let start = Utc::now() + Duration::days(30);
    let date = start.format("%Y-%m-%d").to_string();
    let next_day = (start + Duration::days(1)).format("%Y-%m-%d").to_string();
    let draft = EventDraft {
        event_name: "Asha & Ravi's Wedding".to_string(),
        event_type: EventCategory::Wedding,
        host_names: Some("Asha & Ravi".to_string()),
        description: Some("Join us for three days of celebration.".to_string()),
        start_date: date.clone(),
        start_time: Some("17:00".to_string()),
        venue_name: Some("Lotus Hall".to_string()),
        venue_address: Some("12 Lake Road, Udaipur".to_string()),
        dress_code: Some("Festive".to_string()),
        status: PublicationState::Published,
        sub_events: vec![
            SubEventDraft {
                name: "Sangeet".to_string(),
                date: date.clone(),
                time: Some("19:30".to_string()),
                location_name: Some("Garden Lawn".to_string()),
                ..SubEventDraft::default()
            },
            SubEventDraft {
                name: "Ceremony".to_string(),
                date: next_day,
                time: Some("10:00".to_string()),
                ..SubEventDraft::default()
            },
        ],
        ..EventDraft::default()
    };

    let details = services.events.events.create_event(&host, &draft).await?;
    let event = details.event;

    let guests = [
        ("Meera", "meera@example.com", RsvpStatus::Yes, Some(2)),
        ("Kiran", "kiran@example.com", RsvpStatus::Maybe, None),
        ("Dev", "dev@example.com", RsvpStatus::No, None),
    ];
    for (name, email, status, guest_count) in guests {
        let mut session = RsvpSession::new(RsvpForm {
            guest_name: name.to_string(),
            guest_email: email.to_string(),
            status,
            guest_count,
            ..RsvpForm::default()
        });
        services
            .events
            .rsvps
            .submit(&mut session, &event, None)
            .await
            .with_context(|| format!("failed to seed response for {email}"))?;
    }

    println!("Database seeded with demo data:");
    println!("- host {DEMO_HOST_EMAIL} / {DEMO_HOST_PASSWORD}");
    println!("- event \"{}\" at /api/e/{}", event.event_name, event.slug);
    println!("- {} responses", guests.len());
    println!("Run 'dump-data' to see the inserted data");

    Ok(())
}

async fn demo_host(services: &BackendServices) -> anyhow::Result<Identity> {
    let authenticator = &services.authenticator;
    match authenticator
        .register_with_password(DEMO_HOST_EMAIL, DEMO_HOST_PASSWORD, Some("Demo Host"))
        .await
    {
        Ok(identity) => Ok(identity),
        Err(AuthError::UserExists) => {
            let session = authenticator
                .login_with_password(DEMO_HOST_EMAIL, DEMO_HOST_PASSWORD)
                .await
                .context("demo host exists with a different password")?;
            Ok(authenticator.identity(session.user_id).await?)
        }
        Err(error) => Err(error.into()),
    }
}
