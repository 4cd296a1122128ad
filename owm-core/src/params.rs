use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use crate::error::Error;

/// Query keys understood by the OpenWeatherMap 2.5 API.
pub mod keys {
    pub const APP_ID: &str = "APPID";
    pub const UNITS: &str = "units";
    pub const LANG: &str = "lang";
    pub const CITY: &str = "q";
    pub const LAT: &str = "lat";
    pub const LON: &str = "lon";
    pub const START: &str = "start";
    pub const END: &str = "end";
    pub const TYPE: &str = "type";
}

/// A single query value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Integer(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

/// Key/value query parameters of one request.
///
/// Writing an existing key replaces its value. Entries iterate in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    entries: BTreeMap<String, ParamValue>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// New set holding `self` overlaid with `overrides`; overrides win on shared keys.
    pub fn merged(&self, overrides: &ParamSet) -> ParamSet {
        let mut out = self.clone();
        for (k, v) in overrides.iter() {
            out.insert(k, v.clone());
        }
        out
    }

    /// Flat `(key, value)` pairs, one per entry.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for ParamSet
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParamSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Units the service reports temperatures in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureFormat {
    Celsius,
    Fahrenheit,
    /// Service default; no `units` parameter is sent.
    #[default]
    Kelvin,
}

impl TemperatureFormat {
    /// Wire value of the `units` parameter. Empty for Kelvin.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureFormat::Celsius => "metric",
            TemperatureFormat::Fahrenheit => "imperial",
            TemperatureFormat::Kelvin => "",
        }
    }

    /// The `units` value to send, if any.
    pub fn units_param(&self) -> Option<&'static str> {
        match self {
            TemperatureFormat::Kelvin => None,
            other => Some(other.as_str()),
        }
    }

    /// Symbol for human-readable output.
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureFormat::Celsius => "°C",
            TemperatureFormat::Fahrenheit => "°F",
            TemperatureFormat::Kelvin => "K",
        }
    }

    pub const fn all() -> &'static [TemperatureFormat] {
        &[
            TemperatureFormat::Celsius,
            TemperatureFormat::Fahrenheit,
            TemperatureFormat::Kelvin,
        ]
    }
}

impl fmt::Display for TemperatureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemperatureFormat::Celsius => "celsius",
            TemperatureFormat::Fahrenheit => "fahrenheit",
            TemperatureFormat::Kelvin => "kelvin",
        };
        f.write_str(name)
    }
}

impl TryFrom<&str> for TemperatureFormat {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "celsius" | "metric" | "c" => Ok(TemperatureFormat::Celsius),
            "fahrenheit" | "imperial" | "f" => Ok(TemperatureFormat::Fahrenheit),
            "kelvin" | "standard" | "k" => Ok(TemperatureFormat::Kelvin),
            _ => Err(Error::UnknownTemperatureFormat(value.to_string())),
        }
    }
}

/// Languages the service can localize descriptions into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ru")]
    Russian,
    #[serde(rename = "it")]
    Italian,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "uk")]
    Ukrainian,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "pt")]
    Portuguese,
    #[serde(rename = "ro")]
    Romanian,
    #[serde(rename = "pl")]
    Polish,
    #[serde(rename = "fi")]
    Finnish,
    #[serde(rename = "nl")]
    Dutch,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "bg")]
    Bulgarian,
    #[serde(rename = "sv")]
    Swedish,
    #[serde(rename = "zh_tw")]
    ChineseTraditional,
    #[serde(rename = "zh_cn")]
    ChineseSimplified,
    #[serde(rename = "tr")]
    Turkish,
    #[serde(rename = "hr")]
    Croatian,
    #[serde(rename = "ca")]
    Catalan,
}

impl Language {
    /// Wire code of the `lang` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Russian => "ru",
            Language::Italian => "it",
            Language::Spanish => "es",
            Language::Ukrainian => "uk",
            Language::German => "de",
            Language::Portuguese => "pt",
            Language::Romanian => "ro",
            Language::Polish => "pl",
            Language::Finnish => "fi",
            Language::Dutch => "nl",
            Language::French => "fr",
            Language::Bulgarian => "bg",
            Language::Swedish => "sv",
            Language::ChineseTraditional => "zh_tw",
            Language::ChineseSimplified => "zh_cn",
            Language::Turkish => "tr",
            Language::Croatian => "hr",
            Language::Catalan => "ca",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Russian => "Russian",
            Language::Italian => "Italian",
            Language::Spanish => "Spanish",
            Language::Ukrainian => "Ukrainian",
            Language::German => "German",
            Language::Portuguese => "Portuguese",
            Language::Romanian => "Romanian",
            Language::Polish => "Polish",
            Language::Finnish => "Finnish",
            Language::Dutch => "Dutch",
            Language::French => "French",
            Language::Bulgarian => "Bulgarian",
            Language::Swedish => "Swedish",
            Language::ChineseTraditional => "Chinese (Traditional)",
            Language::ChineseSimplified => "Chinese (Simplified)",
            Language::Turkish => "Turkish",
            Language::Croatian => "Croatian",
            Language::Catalan => "Catalan",
        }
    }

    pub const fn all() -> &'static [Language] {
        &[
            Language::English,
            Language::Russian,
            Language::Italian,
            Language::Spanish,
            Language::Ukrainian,
            Language::German,
            Language::Portuguese,
            Language::Romanian,
            Language::Polish,
            Language::Finnish,
            Language::Dutch,
            Language::French,
            Language::Bulgarian,
            Language::Swedish,
            Language::ChineseTraditional,
            Language::ChineseSimplified,
            Language::Turkish,
            Language::Croatian,
            Language::Catalan,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Language {
    type Error = Error;

    /// Accepts the wire code (`zh-tw` is normalized to `zh_tw`) or the English name.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase().replace('-', "_");

        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.as_str() == lower || lang.name().to_lowercase() == lower)
            .ok_or_else(|| {
                let codes: Vec<&str> = Language::all().iter().map(Language::as_str).collect();
                Error::UnknownLanguage(value.to_string(), codes.join(", "))
            })
    }
}
