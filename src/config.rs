use std::path::PathBuf;
use std::time::Duration;

use config_file::FromConfigFile;
use serde::Deserialize;

use crate::args::Globals;
use crate::prelude::*;
use crate::request::Parameters;

#[derive(Debug, Default, Deserialize)]
pub struct Preset {
    pub name: String,

    // Endpoint
    pub url: Option<String>,
    pub style: Option<Style>,
    pub env: Option<String>,
    pub key: Option<String>,
    pub timeout: Option<u64>,

    // Output
    pub quiet: Option<bool>,
    pub pretty: Option<bool>,

    // Model Configuration
    pub system: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    // Endpoint
    pub url: Option<String>,
    pub style: Option<Style>,
    pub env: Option<String>,
    pub key: Option<String>,
    pub timeout: Option<u64>,

    // Presets
    pub presets: Option<Vec<Preset>>,

    // Global
    pub quiet: Option<bool>,
    pub pretty: Option<bool>,

    // Model Configuration
    pub system: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

impl Config {
    /// Loads the config file. A missing file yields the default config.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file exists but can't be read or parsed.
    pub fn load(path: &str) -> Result<Self> {
        let path = expand_home(path);

        if !path.is_file() {
            log::debug!("config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        log::info!("loading config file {:?}", path);
        Ok(Self::from_config_file(&path)?)
    }

    /// Finds a preset by name.
    ///
    /// # Errors
    ///
    /// Will return `Err` if there is no preset with that name.
    pub fn preset(&self, name: &str) -> Result<&Preset> {
        self.presets
            .iter()
            .flatten()
            .find(|preset| preset.name == name)
            .ok_or_else(|| Error::PresetNotFound(name.to_string()))
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

/// Effective settings once flags, preset, config file and defaults are merged, in that order
/// of precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub url: String,
    pub style: Style,
    pub api_key: Option<String>,
    pub system: Option<String>,
    pub parameters: Parameters,
    pub timeout: Option<Duration>,
    pub quiet: bool,
    pub pretty: bool,
}

impl Settings {
    /// # Errors
    ///
    /// Will return `Err` if:
    ///
    /// - The selected preset doesn't exist.
    /// - No endpoint url is configured.
    /// - The api key environment variable is configured but not set.
    pub fn resolve(globals: &Globals, config: &Config) -> Result<Self> {
        let empty = Preset::default();
        let preset = match &globals.preset {
            Some(name) => config.preset(name)?,
            None => &empty,
        };

        let url = globals
            .url
            .clone()
            .or_else(|| preset.url.clone())
            .or_else(|| config.url.clone())
            .ok_or(Error::UrlNotSpecified)?;

        let style = globals
            .style
            .or(preset.style)
            .or(config.style)
            .unwrap_or_default();

        let api_key = match globals
            .api_key
            .clone()
            .or_else(|| preset.key.clone())
            .or_else(|| config.key.clone())
        {
            Some(key) => Some(key),
            None => match globals
                .api_env
                .as_ref()
                .or(preset.env.as_ref())
                .or(config.env.as_ref())
            {
                Some(env) => Some(std::env::var(env).map_err(|e| Error::EnvVar(env.clone(), e))?),
                None => None,
            },
        };

        let defaults = Parameters::for_style(style);
        let parameters = Parameters {
            max_tokens: globals
                .max_tokens
                .or(preset.max_tokens)
                .or(config.max_tokens)
                .unwrap_or(defaults.max_tokens),
            temperature: globals
                .temperature
                .or(preset.temperature)
                .or(config.temperature)
                .unwrap_or(defaults.temperature),
            top_p: globals
                .top_p
                .or(preset.top_p)
                .or(config.top_p)
                .unwrap_or(defaults.top_p),
            stop: globals
                .stop
                .clone()
                .or_else(|| preset.stop.clone())
                .or_else(|| config.stop.clone())
                .unwrap_or(defaults.stop),
        };

        Ok(Self {
            url,
            style,
            api_key,
            system: globals
                .system
                .clone()
                .or_else(|| preset.system.clone())
                .or_else(|| config.system.clone()),
            parameters,
            timeout: globals
                .timeout
                .or(preset.timeout)
                .or(config.timeout)
                .map(Duration::from_secs),
            quiet: globals
                .quiet
                .or(preset.quiet)
                .or(config.quiet)
                .unwrap_or(false),
            pretty: globals
                .pretty
                .or(preset.pretty)
                .or(config.pretty)
                .unwrap_or(false),
        })
    }
}
