// Festival Companion - command-line driver over the reconciliation model

use std::env;

use festival_companion::{
    app_state::AppState, config::Config, telemetry, FestivalCalendar, HydrateOptions,
    ScreenLifetime,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config = Config::from_env()?;
    let limit = config.festival.friends_favorites_limit;
    let app_state = AppState::new(config).await?;

    if let (Ok(email), Ok(password)) = (env::var("COMPANION_EMAIL"), env::var("COMPANION_PASSWORD")) {
        let session = app_state.auth.sign_in(&email, &password).await?;
        println!("Signed in as {}", session.email);
    }

    let lifetime = ScreenLifetime::new();
    let _dismiss = lifetime.guard();

    let model = app_state.favorites_model(lifetime.clone());
    let include_friends = app_state.session.is_signed_in().await;
    match model
        .hydrate(HydrateOptions { include_friends })
        .await
    {
        Ok(report) => {
            for (source, error) in &report.failures {
                println!("! {:?} unavailable: {}", source, error.user_message());
            }
        }
        Err(e) => println!("! {}", e.user_message()),
    }

    println!("Films:");
    for card in model.film_cards() {
        let marker = if card.is_favorite { "*" } else { " " };
        println!(" {} {:>4}  {}", marker, card.film.id.value(), card.film.title);
        if let Some(info) = card.film.info_line() {
            println!("         {}", info);
        }
    }

    if include_friends {
        println!("My favorites:");
        for entry in model.own_favorite_entries() {
            println!("   {:>4}  {}", entry.id.value(), entry.label);
        }
        println!("Friends' favorites:");
        for film in model.derived_friends_favorites(limit) {
            println!("   {:>4}  {}", film.id.value(), film.title);
        }
    }

    let browser = app_state.schedule_browser(lifetime.clone());
    let view = browser.load().await;
    let (weekday, date) = FestivalCalendar::day_heading(view.date);
    println!("{} {}", weekday, date);
    if let Some(error) = view.error {
        println!("! {}", error);
    }
    for block in view.blocks {
        println!(" {}", block.time);
        for event in block.events {
            println!("   {}  ({})", event.title, event.cinema);
        }
    }

    Ok(())
}
