use serde_json::json;
use teawindow_core::{Settings, Store};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load_or_default();
    let store = Store::open()?;
    let day = teawindow_core::storage::today_key();
    let progress = store.load_progress(&day)?;

    let status = json!({
        "day": day,
        "progress": progress,
        "settings": settings,
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
