//! Flight records API example
//!
//! Serves aircraft, assessments, flights and users of one demo account from
//! in-memory stores:
//! - Filtered, sorted and paginated lists
//! - Lookups by id or by tag (`/aircraft/tag.designation:N123AB`)
//! - Single and batch deletes, soft deletes for assessments
//!
//! Set `LISTQ_CONFIG` to a YAML file (see `engine.yaml` next to this file) to
//! override pagination bounds, the query timeout and the assessment, flight
//! and user registries.

use anyhow::Result;
use chrono::{Duration, Utc};
use listq::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,listq=debug")),
        )
        .init();

    let config = match std::env::var("LISTQ_CONFIG") {
        Ok(path) => EngineConfig::from_yaml_file(path)?,
        Err(_) => EngineConfig::default_config(),
    };
    let settings = config.settings();

    let tenant_id = TenantId::new(Uuid::new_v4());
    let (aircraft, flights, users) = seed(tenant_id)?;
    let assessments = InMemoryStore::with_records([
        Assessment::named(tenant_id, "Standard VFR").as_default(),
        Assessment::named(tenant_id, "Night Operations"),
        Assessment::named(tenant_id, "Mountain Flying"),
    ]);

    let aircraft = Repository::new(Arc::new(aircraft), Arc::new(aircraft_filters()?))
        .with_settings(settings);
    let flights = Repository::new(Arc::new(flights), Arc::new(registry(&config, "flight")?))
        .with_settings(settings);
    let users = Repository::new(Arc::new(users), Arc::new(registry(&config, "user")?))
        .with_settings(settings);
    let assessments =
        Repository::new(Arc::new(assessments), Arc::new(registry(&config, "assessment")?))
            .with_settings(settings);

    // Stand-in for the authentication layer: every request acts for the demo account
    let auth = AuthContext::User {
        user_id: Uuid::new_v4(),
        tenant_id,
        roles: vec!["safety_officer".to_string()],
    };

    let app = ServerBuilder::new()
        .with_repository(aircraft)
        .with_repository(flights)
        .with_repository(users)
        .with_assessments(assessments)
        .build()
        .layer(Extension(auth));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;

    println!("\n🌐 Server running on http://127.0.0.1:3000 (account {})", tenant_id);
    println!("\n  Try:");
    println!("    GET    /aircraft?type=C172&sort=designation");
    println!("    GET    /aircraft/tag.designation:n123ab");
    println!("    GET    /flights?departure=KBOS&departure=KJFK&pageSize=2");
    println!("    GET    /flights?scoreMin=70&sort=-flight_date");
    println!("    GET    /flights/tag.customId:TRIP_002");
    println!("    GET    /users?role=pilot");
    println!("    GET    /assessments?isDefault=true");
    println!("    DELETE /assessments/{{id}}         (retires, moves the default)");
    println!("    DELETE /flights/{{id}}");
    println!("    POST   /flights/batch-delete   {{\"ids\": [\"...\"]}}");
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}

/// The registry declared in the config file, or the built-in one
fn registry(config: &EngineConfig, entity: &str) -> Result<FilterRegistry> {
    if config.entities.iter().any(|e| e.entity == entity) {
        return Ok(config.registry_for(entity)?);
    }
    Ok(match entity {
        "flight" => flight_filters()?,
        "assessment" => assessment_filters()?,
        _ => user_filters()?,
    })
}

fn seed(
    tenant_id: TenantId,
) -> Result<(InMemoryStore<Aircraft>, InMemoryStore<Flight>, InMemoryStore<User>)> {
    let aircraft = InMemoryStore::new();
    let flights = InMemoryStore::new();
    let users = InMemoryStore::new();

    let pilot = User::new(
        tenant_id,
        "amelia@example.com".to_string(),
        "Amelia".to_string(),
        "Earhart".to_string(),
        "pilot".to_string(),
        true,
        Some("E-100".to_string()),
    );
    let officer = User::new(
        tenant_id,
        "chuck@example.com".to_string(),
        "Chuck".to_string(),
        "Yeager".to_string(),
        "safety_officer".to_string(),
        true,
        None,
    );

    let skyhawk = Aircraft::register(tenant_id, "n123ab", Some("C172"));
    let warrior = Aircraft::register(tenant_id, "N456CD", Some("PA28"));
    let unknown = Aircraft::register(tenant_id, "N789EF", None);

    let airports = [("KBOS", "KJFK"), ("KJFK", "KBOS"), ("KBOS", "KPVD"), ("KPVD", "KBOS")];
    for (i, (departure, arrival)) in airports.iter().enumerate() {
        let plane = if i % 2 == 0 { &skyhawk } else { &warrior };
        let flight = Flight::new(
            tenant_id,
            plane.id,
            Utc::now() - Duration::days(10 - i as i64),
            Some(departure.to_string()),
            Some(arrival.to_string()),
            pilot.id,
            None,
            pilot.id,
            None,
            None,
            Some(60.0 + 10.0 * i as f64),
            Default::default(),
        )
        .with_tag("customId", format!("TRIP_{:03}", i + 1));
        flights.insert(flight)?;
    }

    for record in [skyhawk, warrior, unknown] {
        aircraft.insert(record)?;
    }
    users.insert(pilot)?;
    users.insert(officer)?;

    Ok((aircraft, flights, users))
}
