//! Weather handler integration tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use voice_router::config::WeatherConfig;
use voice_router::handlers::weather::{CONNECTION_PROBLEM, UNEXPECTED};
use voice_router::providers::{CurrentConditions, ForecastDay, WeatherProvider};
use voice_router::router::{Intent, IntentClassifier};
use voice_router::{DomainHandler, Error, Result, WeatherQueryHandler};

mod common;

use common::RecordingSpeaker;

#[derive(Clone, Copy)]
enum Mode {
    Ok,
    Unreachable,
    Broken,
}

struct FakeWeather {
    mode: Mode,
    current: CurrentConditions,
    days: Vec<ForecastDay>,
    requests: Mutex<Vec<String>>,
}

impl FakeWeather {
    fn new(mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            current: CurrentConditions {
                condition: "Partly cloudy".to_string(),
                temp_c: 14.5,
                wind_kph: 12.0,
                precip_mm: 0.4,
            },
            days: (16..=20)
                .map(|d| ForecastDay {
                    date: date(2026, 10, d),
                    condition: "Sunny".to_string(),
                    avg_temp_c: 11.0,
                    max_temp_c: 15.5,
                    min_temp_c: 6.0,
                    chance_of_rain: 10.0,
                    max_wind_kph: 20.0,
                })
                .collect(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock").clone()
    }

    fn check(&self) -> Result<()> {
        match self.mode {
            Mode::Ok => Ok(()),
            Mode::Unreachable => Err(Error::Config("WEATHERAPI_KEY is not set".to_string())),
            Mode::Broken => Err(Error::Provider("malformed response".to_string())),
        }
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn current(&self, city: &str) -> Result<CurrentConditions> {
        self.requests.lock().expect("lock").push(format!("current:{city}"));
        self.check()?;
        Ok(self.current.clone())
    }

    async fn forecast(&self, city: &str, days: u8) -> Result<Vec<ForecastDay>> {
        self.requests
            .lock()
            .expect("lock")
            .push(format!("forecast:{city}:{days}"));
        self.check()?;
        Ok(self.days.clone())
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn handler(mode: Mode) -> (WeatherQueryHandler, Arc<FakeWeather>, Arc<RecordingSpeaker>) {
    let provider = FakeWeather::new(mode);
    let speaker = Arc::new(RecordingSpeaker::default());
    let handler = WeatherQueryHandler::new(
        provider.clone(),
        speaker.clone(),
        common::test_clock(),
        &WeatherConfig::default(),
    );
    (handler, provider, speaker)
}

#[test]
fn test_friday_resolves_to_today_on_a_friday() {
    let classifier = IntentClassifier::default();
    let friday = date(2026, 10, 16);

    let Intent::Weather { city, when, .. } = classifier.parse("weather on friday in toronto", friday) else {
        panic!("expected a weather intent");
    };
    assert_eq!(city.as_deref(), Some("toronto"));
    assert_eq!(when, Some(friday));

    let Intent::Weather { when, .. } = classifier.parse("weather on friday", date(2026, 10, 17)) else {
        panic!("expected a weather intent");
    };
    assert_eq!(when, Some(date(2026, 10, 23)));
}

#[test]
fn test_day_after_tomorrow() {
    let classifier = IntentClassifier::default();
    let Intent::Weather { when, .. } =
        classifier.parse("forecast for seoul the day after tomorrow", date(2026, 10, 16))
    else {
        panic!("expected a weather intent");
    };
    assert_eq!(when, Some(date(2026, 10, 18)));
}

#[tokio::test]
async fn test_current_weather() {
    let (h, provider, speaker) = handler(Mode::Ok);

    h.handle("weather in tokyo").await.unwrap();

    assert_eq!(provider.requests(), vec!["current:Tokyo"]);
    assert_eq!(
        speaker.last().as_deref(),
        Some(
            "The weather in Tokyo right now is Partly cloudy, with a temperature of 14.5 degrees Celsius \
             and winds at 12 kilometers per hour."
        )
    );
}

#[tokio::test]
async fn test_topics_shape_current_reply() {
    let (h, _, _) = handler(Mode::Ok);

    assert_eq!(
        h.answer("temperature in seoul").await,
        "The current temperature in Seoul is 14.5 degrees Celsius."
    );
    assert_eq!(
        h.answer("weather is it raining in miyazaki").await,
        "It is currently Partly cloudy in Miyazaki, with 0.4 millimeters of precipitation."
    );
    assert_eq!(
        h.answer("weather wind in new york").await,
        "The wind speed in New York is 12 kilometers per hour, and the weather is Partly cloudy."
    );
}

#[tokio::test]
async fn test_forecast_for_tomorrow() {
    let (h, provider, _) = handler(Mode::Ok);

    let reply = h.answer("weather in busan tomorrow").await;

    assert_eq!(provider.requests(), vec!["forecast:Busan:5"]);
    assert_eq!(
        reply,
        "The weather in Busan on tomorrow will be Sunny, with an average temperature of 11 degrees Celsius, \
         a high of 15.5, a low of 6, 10 percent chance of rain, and winds up to 20 kilometers per hour."
    );
}

#[tokio::test]
async fn test_forecast_outside_range() {
    let (h, _, _) = handler(Mode::Ok);

    // Thursday is six days out, past the five-day forecast
    assert_eq!(
        h.answer("weather on thursday in seoul").await,
        "I could not find the forecast for Seoul on thursday."
    );
}

#[tokio::test]
async fn test_unknown_city_is_title_cased() {
    let (h, provider, _) = handler(Mode::Ok);

    h.answer("weather in san francisco").await;
    assert_eq!(provider.requests(), vec!["current:San Francisco"]);
}

#[tokio::test]
async fn test_default_city() {
    let (h, provider, _) = handler(Mode::Ok);

    h.answer("weather").await;
    assert_eq!(provider.requests(), vec!["current:Toronto"]);
}

#[tokio::test]
async fn test_provider_failures_are_spoken() {
    let (h, _, speaker) = handler(Mode::Unreachable);
    h.handle("weather in seoul").await.unwrap();
    assert_eq!(speaker.spoken(), vec![CONNECTION_PROBLEM]);

    let (h, _, speaker) = handler(Mode::Broken);
    h.handle("weather in seoul").await.unwrap();
    assert_eq!(speaker.spoken(), vec![UNEXPECTED]);
}
