//! Declarative handler configuration and the sink-set builder.
//!
//! A handler configuration maps symbolic sink names to parameter sets.
//! Besides the typed API, configurations can be ingested from
//! `serde_json::Value` so callers can keep them in config files.

use serde_json::Value;

use crate::error::ConfigError;
use crate::formatter::default_formatter;
use crate::level::{Level, LevelSpec};
use crate::sinks::{SinkHandle, SinkKind, StreamSink, build_sink};

/// Default sink threshold applied when a parameter set has no `log_level`.
const DEFAULT_SINK_LEVEL: Level = Level::Warning;

/// A single configuration parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Str(_) => "string",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Bool(_) => "boolean",
        }
    }

    fn from_json(key: &str, value: &Value) -> Result<Self, ConfigError> {
        match value {
            Value::String(s) => Ok(Self::Str(s.clone())),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .ok_or_else(|| {
                    ConfigError::InvalidConfiguration(format!(
                        "parameter {key} has an unrepresentable number"
                    ))
                }),
            _ => Err(ConfigError::InvalidConfiguration(format!(
                "parameter {key} must be a string, number or boolean"
            ))),
        }
    }

    /// Interpret the value as a severity specification.
    fn as_level_spec(&self) -> Result<LevelSpec, ConfigError> {
        match self {
            ParamValue::Str(s) => Ok(LevelSpec::Name(s.clone())),
            ParamValue::Bool(b) => Ok(LevelSpec::Verbose(*b)),
            ParamValue::Int(n) => Ok(LevelSpec::Numeric(*n)),
            ParamValue::Float(f) => Err(ConfigError::InvalidLevel(f.to_string())),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Ordered parameter set forwarded to a sink constructor.
///
/// The `log_level` key is consumed by [`build_sinks`] before the remaining
/// keys reach the factory; keys a sink does not know are ignored there.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SinkParams {
    entries: Vec<(String, ParamValue)>,
}

impl SinkParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, replacing an existing value for the key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Remove and return a value, used to consume `log_level`.
    pub fn take(&mut self, key: &str) -> Option<ParamValue> {
        self.entries
            .iter()
            .position(|(k, _)| k == key)
            .map(|pos| self.entries.remove(pos).1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn type_error(&self, key: &str, expected: &str, value: &ParamValue) -> ConfigError {
        ConfigError::InvalidConfiguration(format!(
            "parameter {key} must be a {expected}, got {}",
            value.type_name()
        ))
    }

    pub(crate) fn str_opt(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Str(s)) => Ok(Some(s)),
            Some(other) => Err(self.type_error(key, "string", other)),
        }
    }

    pub(crate) fn require_str(&self, key: &str) -> Result<&str, ConfigError> {
        self.str_opt(key)?.ok_or_else(|| {
            ConfigError::InvalidConfiguration(format!("missing mandatory parameter: {key}"))
        })
    }

    pub(crate) fn u64_opt(&self, key: &str) -> Result<Option<u64>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Int(n)) if *n >= 0 => Ok(Some(*n as u64)),
            Some(other) => Err(self.type_error(key, "non-negative integer", other)),
        }
    }

    pub(crate) fn u16_opt(&self, key: &str) -> Result<Option<u16>, ConfigError> {
        match self.u64_opt(key)? {
            None => Ok(None),
            Some(n) => u16::try_from(n).map(Some).map_err(|_| {
                ConfigError::InvalidConfiguration(format!("parameter {key} is out of range: {n}"))
            }),
        }
    }

    pub(crate) fn require_u16(&self, key: &str) -> Result<u16, ConfigError> {
        self.u16_opt(key)?.ok_or_else(|| {
            ConfigError::InvalidConfiguration(format!("missing mandatory parameter: {key}"))
        })
    }

    pub(crate) fn usize_opt(&self, key: &str) -> Result<Option<usize>, ConfigError> {
        Ok(self.u64_opt(key)?.map(|n| n as usize))
    }

    pub(crate) fn bool_opt(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(ParamValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.type_error(key, "boolean", other)),
        }
    }

    fn from_json(value: &Value) -> Result<Self, ConfigError> {
        let Value::Object(map) = value else {
            return Err(ConfigError::InvalidConfiguration(
                "handler parameters must be an object".to_string(),
            ));
        };
        let mut params = Self::new();
        for (key, value) in map {
            params.insert(key.clone(), ParamValue::from_json(key, value)?);
        }
        Ok(params)
    }
}

/// Declarative description of the sinks to build for a logger.
#[derive(Clone, Debug, Default)]
pub enum HandlerSpec {
    /// No destinations configured: one discard sink, records vanish quietly.
    #[default]
    Discard,
    /// Console shorthand: a stderr sink at DEBUG (`true`) or WARNING
    /// (`false`).
    Verbose(bool),
    /// Symbolic sink name → parameter sets, in configuration order. An
    /// empty parameter-set list builds one sink with default parameters.
    Map(Vec<(String, Vec<SinkParams>)>),
}

impl HandlerSpec {
    /// Start an empty mapping-shaped spec.
    pub fn map() -> Self {
        Self::Map(Vec::new())
    }

    /// Append a parameter set for a symbolic sink name.
    ///
    /// Repeating a name attaches several sinks of the same kind.
    pub fn with(self, kind: impl Into<String>, params: SinkParams) -> Self {
        let mut entries = match self {
            Self::Map(entries) => entries,
            // the shorthand shapes carry no entries to preserve
            _ => Vec::new(),
        };
        let kind = kind.into();
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == kind) {
            slot.1.push(params);
        } else {
            entries.push((kind, vec![params]));
        }
        Self::Map(entries)
    }

    /// Ingest a configuration from JSON.
    ///
    /// `null` → [`HandlerSpec::Discard`], booleans → the console shorthand,
    /// objects → the mapping shape (values may be `null`, an object, or an
    /// array of objects). Anything else is a malformed configuration.
    pub fn from_json(value: &Value) -> Result<Self, ConfigError> {
        match value {
            Value::Null => Ok(Self::Discard),
            Value::Bool(b) => Ok(Self::Verbose(*b)),
            Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (name, value) in map {
                    let sets = match value {
                        Value::Null => vec![SinkParams::new()],
                        Value::Object(_) => vec![SinkParams::from_json(value)?],
                        Value::Array(items) if items.is_empty() => vec![SinkParams::new()],
                        Value::Array(items) => items
                            .iter()
                            .map(SinkParams::from_json)
                            .collect::<Result<_, _>>()?,
                        _ => {
                            return Err(ConfigError::InvalidConfiguration(format!(
                                "handler {name} must map to an object or an array of objects"
                            )));
                        }
                    };
                    entries.push((name.clone(), sets));
                }
                Ok(Self::Map(entries))
            }
            _ => Err(ConfigError::InvalidConfiguration(
                "handler configuration must be null, a boolean or an object".to_string(),
            )),
        }
    }
}

/// Build the list of ready-to-attach sinks described by `spec`.
///
/// Sinks come back in configuration order with their thresholds resolved
/// (default WARNING) and the shared formatter applied. Construction is
/// atomic: if any entry fails, sinks already built in this call are closed
/// and the error is returned without touching any logger.
pub fn build_sinks(spec: &HandlerSpec) -> Result<Vec<SinkHandle>, ConfigError> {
    let formatter = default_formatter();
    match spec {
        HandlerSpec::Discard => Ok(vec![build_sink(SinkKind::Null, &SinkParams::new())?]),
        HandlerSpec::Verbose(verbose) => {
            let handle = SinkHandle::new(StreamSink::stderr());
            handle.set_level(if *verbose {
                Level::Debug
            } else {
                Level::Warning
            });
            handle.set_formatter(formatter);
            Ok(vec![handle])
        }
        HandlerSpec::Map(entries) => {
            let mut sinks = Vec::new();
            for (name, param_sets) in entries {
                let kind: SinkKind = match name.parse() {
                    Ok(kind) => kind,
                    Err(err) => {
                        close_all(&sinks);
                        return Err(err);
                    }
                };
                let default_set = [SinkParams::new()];
                let sets: &[SinkParams] = if param_sets.is_empty() {
                    &default_set
                } else {
                    param_sets
                };
                for params in sets {
                    match build_one(kind, params, &formatter) {
                        Ok(handle) => sinks.push(handle),
                        Err(err) => {
                            close_all(&sinks);
                            return Err(err);
                        }
                    }
                }
            }
            Ok(sinks)
        }
    }
}

fn build_one(
    kind: SinkKind,
    params: &SinkParams,
    formatter: &std::sync::Arc<dyn crate::formatter::Formatter>,
) -> Result<SinkHandle, ConfigError> {
    let mut params = params.clone();
    let level = match params.take("log_level") {
        Some(value) => value.as_level_spec()?.resolve()?,
        None => DEFAULT_SINK_LEVEL,
    };
    let handle = build_sink(kind, &params)?;
    handle.set_level(level);
    handle.set_formatter(formatter.clone());
    Ok(handle)
}

fn close_all(sinks: &[SinkHandle]) {
    for sink in sinks {
        if let Err(err) = sink.close() {
            log::warn!("lognata: failed to close sink during rollback: {err}");
        }
    }
}
