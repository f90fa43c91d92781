//! Sunrise/sunset approximation.
//!
//! Closed-form solar position math (the classic almanac method) at the
//! civil zenith of 90.833 degrees, good to a few minutes of the observed
//! times. Results are local wall-clock `NaiveDateTime`s for a given date,
//! coordinates and UTC offset.
//!
//! Every failure path degrades to the fixed 06:00/20:00 schedule: missing
//! coordinates, and dates where the sun never crosses the zenith (polar
//! day or night). The adjacent-day instants exist so a night animation can
//! interpolate across midnight: tonight runs sunset to next sunrise, the
//! small hours run previous sunset to today's sunrise.
//!
//! The same UTC offset is applied to all three days. Around a DST change
//! the adjacent-day instants can be off by the shift; accepted, the
//! consumer only interpolates a sky position with them.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Civil-twilight zenith, degrees.
const ZENITH_DEG: f64 = 90.833;
/// Fallback schedule when no real solution exists.
const FIXED_SUNRISE_HOUR: i64 = 6;
const FIXED_SUNSET_HOUR: i64 = 20;

/// Observer position, decimal degrees. North and east positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Sun events bracketing one local day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunTimes {
    pub sunrise: NaiveDateTime,
    pub sunset: NaiveDateTime,
    /// Sunset of the previous calendar day.
    pub previous_sunset: NaiveDateTime,
    /// Sunrise of the next calendar day.
    pub next_sunrise: NaiveDateTime,
}

#[derive(Clone, Copy)]
enum SolarEvent {
    Sunrise,
    Sunset,
}

/// Sun times for `date` at `coords`, or the fixed schedule when `coords`
/// is `None` or the day has no sunrise/sunset. Adjacent days that fail
/// individually fall back to their own fixed instant.
pub fn compute(
    date: NaiveDate,
    coords: Option<Coordinates>,
    utc_offset_hours: f64,
) -> SunTimes {
    let Some(coords) = coords else {
        return fixed(date);
    };
    let (Some(sunrise), Some(sunset)) = (
        solar_instant(date, coords, utc_offset_hours, SolarEvent::Sunrise),
        solar_instant(date, coords, utc_offset_hours, SolarEvent::Sunset),
    ) else {
        return fixed(date);
    };

    let tomorrow = date.succ_opt().unwrap_or(date);
    let yesterday = date.pred_opt().unwrap_or(date);
    let next_sunrise = solar_instant(tomorrow, coords, utc_offset_hours, SolarEvent::Sunrise)
        .unwrap_or_else(|| fixed_instant(tomorrow, FIXED_SUNRISE_HOUR));
    let previous_sunset = solar_instant(yesterday, coords, utc_offset_hours, SolarEvent::Sunset)
        .unwrap_or_else(|| fixed_instant(yesterday, FIXED_SUNSET_HOUR));

    SunTimes {
        sunrise,
        sunset,
        previous_sunset,
        next_sunrise,
    }
}

/// [`compute`] with the system timezone's current UTC offset.
pub fn compute_local(date: NaiveDate, coords: Option<Coordinates>) -> SunTimes {
    let offset_hours = Local::now().offset().local_minus_utc() as f64 / 3600.0;
    compute(date, coords, offset_hours)
}

/// The deterministic 06:00/20:00 schedule around `date`.
pub fn fixed(date: NaiveDate) -> SunTimes {
    let tomorrow = date.succ_opt().unwrap_or(date);
    let yesterday = date.pred_opt().unwrap_or(date);
    SunTimes {
        sunrise: fixed_instant(date, FIXED_SUNRISE_HOUR),
        sunset: fixed_instant(date, FIXED_SUNSET_HOUR),
        previous_sunset: fixed_instant(yesterday, FIXED_SUNSET_HOUR),
        next_sunrise: fixed_instant(tomorrow, FIXED_SUNRISE_HOUR),
    }
}

/// Sunrise inclusive, sunset exclusive.
pub fn is_daytime(now: NaiveDateTime, times: &SunTimes) -> bool {
    times.sunrise <= now && now < times.sunset
}

fn fixed_instant(date: NaiveDate, hour: i64) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::hours(hour)
}

/// One solar event for one day. `None` when the sun never reaches the
/// zenith (polar day/night).
fn solar_instant(
    date: NaiveDate,
    coords: Coordinates,
    utc_offset_hours: f64,
    event: SolarEvent,
) -> Option<NaiveDateTime> {
    let n = date.ordinal() as f64;
    let lng_hour = coords.longitude / 15.0;

    // Approximate event time feeds the anomaly below.
    let approx_hour = match event {
        SolarEvent::Sunrise => 6.0,
        SolarEvent::Sunset => 18.0,
    };
    let t = n + (approx_hour - lng_hour) / 24.0;

    // Sun's mean anomaly, then true longitude.
    let m = 0.9856 * t - 3.289;
    let l = (m + 1.916 * m.to_radians().sin() + 0.020 * (2.0 * m).to_radians().sin() + 282.634)
        .rem_euclid(360.0);

    // Right ascension, pushed into the same quadrant as L, in hours.
    let mut ra = (0.91764 * l.to_radians().tan())
        .atan()
        .to_degrees()
        .rem_euclid(360.0);
    let l_quadrant = (l / 90.0).floor() * 90.0;
    let ra_quadrant = (ra / 90.0).floor() * 90.0;
    ra = (ra + (l_quadrant - ra_quadrant)) / 15.0;

    // Declination.
    let sin_dec = 0.39782 * l.to_radians().sin();
    let cos_dec = sin_dec.asin().cos();

    // Local hour angle at the zenith.
    let cos_h = (ZENITH_DEG.to_radians().cos() - sin_dec * coords.latitude.to_radians().sin())
        / (cos_dec * coords.latitude.to_radians().cos());
    if !(-1.0..=1.0).contains(&cos_h) {
        return None;
    }
    let h = match event {
        SolarEvent::Sunrise => 360.0 - cos_h.acos().to_degrees(),
        SolarEvent::Sunset => cos_h.acos().to_degrees(),
    } / 15.0;

    // Local mean time of the event, then UT, then local wall clock.
    let mean_time = h + ra - 0.06571 * t - 6.622;
    let ut = (mean_time - lng_hour).rem_euclid(24.0);
    let local = ut + utc_offset_hours;

    // Truncate to whole seconds. Hours outside 0..24 roll into the
    // neighboring day.
    let hours = local.floor();
    let minutes = ((local - hours) * 60.0).floor();
    let seconds = (((local - hours) * 60.0 - minutes) * 60.0).floor();
    let total_seconds = hours as i64 * 3600 + minutes as i64 * 60 + seconds as i64;
    Some(date.and_time(NaiveTime::MIN) + Duration::seconds(total_seconds))
}
