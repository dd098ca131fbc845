//! Detail-view data: hourly outlook strip and same-day temperature series.
//!
//! Every operation here is fetched per visit and takes a cancellation
//! token, so a detail view that is torn down can abort its in-flight
//! requests instead of letting a late result land after disposal.

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use crate::provider::WeatherClient;
use crate::types::{
    CityDetail, CitySnapshot, Coordinate, DayAdvice, ForecastReport, HourlySlot, TempPoint,
    TodayOutlook, WeatherError,
};

/// Forecast slots shown after the current reading in the hourly strip.
const HOURLY_SLOTS: usize = 7;

/// The current reading followed by the next [`HOURLY_SLOTS`] three-hourly
/// forecast slots.
pub async fn hourly_outlook(
    client: &WeatherClient,
    coord: Coordinate,
    cancel: &CancellationToken,
) -> Result<Vec<HourlySlot>, WeatherError> {
    let (snapshot, forecast) = tokio::select! {
        _ = cancel.cancelled() => return Err(WeatherError::Cancelled),
        res = fetch_pair(client, coord) => res?,
    };

    let mut slots = Vec::with_capacity(HOURLY_SLOTS + 1);
    slots.push(HourlySlot {
        at: snapshot.observed_at,
        temperature: snapshot.current.temperature,
        icon: snapshot.current.icon,
        description: snapshot.current.description,
    });

    for slot in forecast.list.into_iter().take(HOURLY_SLOTS) {
        let at = slot.at();
        let condition = slot.weather.into_iter().next().unwrap_or_default();
        slots.push(HourlySlot {
            at,
            temperature: slot.main.temp,
            icon: condition.icon,
            description: condition.description,
        });
    }

    Ok(slots)
}

async fn fetch_pair(
    client: &WeatherClient,
    coord: Coordinate,
) -> Result<(CitySnapshot, ForecastReport), WeatherError> {
    let snapshot = client.conditions_at(coord).await?;
    let forecast = client.forecast_at(coord).await?;
    Ok((snapshot, forecast))
}

/// Temperature series for `today`, with the day's average and the advice
/// bucket derived from it.
pub async fn today_outlook(
    client: &WeatherClient,
    coord: Coordinate,
    today: NaiveDate,
    cancel: &CancellationToken,
) -> Result<TodayOutlook, WeatherError> {
    let forecast = tokio::select! {
        _ = cancel.cancelled() => return Err(WeatherError::Cancelled),
        res = client.forecast_at(coord) => res?,
    };

    Ok(build_today(forecast, today))
}

fn build_today(forecast: ForecastReport, today: NaiveDate) -> TodayOutlook {
    let points: Vec<TempPoint> = forecast
        .list
        .iter()
        .filter(|slot| slot.date() == Some(today))
        .map(|slot| TempPoint {
            at: slot.at(),
            temperature: slot.main.temp,
        })
        .collect();

    let average = if points.is_empty() {
        None
    } else {
        Some(points.iter().map(|p| p.temperature).sum::<f64>() / points.len() as f64)
    };

    TodayOutlook {
        points,
        average,
        advice: average.map(DayAdvice::from_average),
    }
}

/// Assemble everything the detail view needs for one city.
pub async fn detail(
    client: &WeatherClient,
    snapshot: CitySnapshot,
    today: NaiveDate,
    cancel: &CancellationToken,
) -> Result<CityDetail, WeatherError> {
    let hourly = hourly_outlook(client, snapshot.coord, cancel).await?;
    let today = today_outlook(client, snapshot.coord, today, cancel).await?;

    Ok(CityDetail {
        snapshot,
        hourly,
        today,
    })
}
