//! JSON schema of the device's status endpoint.
//!
//! Example payload:
//! {"raw_value": 50400, "weight": 100.0, "battery": 3.91,
//!  "rom_phy_get_vdd33": 3301, "current_scale": 420.0, "current_offset": 8400}
//!
//! Unknown fields are ignored. Some firmware builds send numbers as strings,
//! so numeric fields accept either form.
use crate::error::{DeviceError, Result};
use scalemon_traits::Telemetry;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct StatusPayload {
    #[serde(deserialize_with = "de_number")]
    pub raw_value: f64,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub battery: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub rom_phy_get_vdd33: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub current_scale: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub current_offset: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberJson {
    Number(f64),
    Text(String),
}

fn number_from<E: serde::de::Error>(n: NumberJson) -> std::result::Result<f64, E> {
    let v = match n {
        NumberJson::Number(v) => v,
        NumberJson::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| E::custom(format!("expected a number, got {s:?}")))?,
    };
    if v.is_finite() {
        Ok(v)
    } else {
        Err(E::custom("number must be finite"))
    }
}

fn de_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    number_from(NumberJson::deserialize(deserializer)?)
}

fn de_opt_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberJson>::deserialize(deserializer)?
        .map(number_from)
        .transpose()
}

impl From<StatusPayload> for Telemetry {
    fn from(p: StatusPayload) -> Self {
        Self {
            raw_value: p.raw_value,
            weight: p.weight,
            battery: p.battery,
            vdd33: p.rom_phy_get_vdd33,
            current_scale: p.current_scale,
            current_offset: p.current_offset,
        }
    }
}

impl From<&Telemetry> for StatusPayload {
    fn from(t: &Telemetry) -> Self {
        Self {
            raw_value: t.raw_value,
            weight: t.weight,
            battery: t.battery,
            rom_phy_get_vdd33: t.vdd33,
            current_scale: t.current_scale,
            current_offset: t.current_offset,
        }
    }
}

/// Parse one status response body.
pub fn parse_status(body: &str) -> Result<Telemetry> {
    serde_json::from_str::<StatusPayload>(body)
        .map(Telemetry::from)
        .map_err(|e| DeviceError::Parse(e.to_string()))
}
