use chrono::{Local, NaiveDate};
use clap::Args;
use serde_json::json;
use teawindow_core::{ephemeris, geo, Coordinates, IpLocationProvider, LocationProvider, Settings};

#[derive(Args)]
pub struct SunArgs {
    /// Observer latitude (requires --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,
    /// Observer longitude (requires --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
    /// Date to compute for, YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Skip any lookup and print the fixed 06:00/20:00 schedule
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    fixed: bool,
}

pub fn run(args: SunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let now = Local::now().naive_local();
    let date = args.date.unwrap_or_else(|| now.date());

    let times = if args.fixed {
        ephemeris::fixed(date)
    } else if let (Some(latitude), Some(longitude)) = (args.lat, args.lon) {
        ephemeris::compute_local(
            date,
            Some(Coordinates {
                latitude,
                longitude,
            }),
        )
    } else {
        // No explicit coordinates: settings first, then the IP lookup.
        let settings = Settings::load_or_default();
        let provider = IpLocationProvider::new();
        geo::resolve_sun_times(date, &settings, Some(&provider as &dyn LocationProvider))
    };

    let report = json!({
        "date": date,
        "times": times,
        "daytime_now": ephemeris::is_daytime(now, &times),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
