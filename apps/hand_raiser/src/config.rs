use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::{bail, Context};
use audience::{DriveSettings, SessionConfig, WiggleSettings};
use robot::ServoGeometry;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "hand_raiser.toml";
const ENV_PREFIX: &str = "HAND_RAISER__";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub poll_interval_ms: u64,
    pub initial_wiggle_delay_seconds: u64,
    pub wiggle_repeat_interval_seconds: u64,
    pub max_consecutive_source_failures: u32,
    pub max_consecutive_actuator_failures: u32,
    pub shutdown_lower_attempts: u32,
    pub bridge_url: String,
    pub bot_name: String,
    /// Robot control endpoint. Unset means a simulated servo.
    pub robot_url: Option<String>,
    pub robot_secret: Option<String>,
    pub servo_upper_angle: u32,
    pub servo_lower_angle: u32,
    pub wiggle_amount: u32,
    pub wiggle_cycles: u32,
    pub wiggle_step_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            initial_wiggle_delay_seconds: 30,
            wiggle_repeat_interval_seconds: 20,
            max_consecutive_source_failures: 5,
            max_consecutive_actuator_failures: 3,
            shutdown_lower_attempts: 3,
            bridge_url: "http://127.0.0.1:9400".into(),
            bot_name: "Hand Raiser Bot".into(),
            robot_url: None,
            robot_secret: None,
            servo_upper_angle: 30,
            servo_lower_angle: 0,
            wiggle_amount: 5,
            wiggle_cycles: 3,
            wiggle_step_ms: 300,
        }
    }
}

impl Settings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            wiggle: WiggleSettings {
                initial_delay: Duration::from_secs(self.initial_wiggle_delay_seconds),
                repeat_interval: Duration::from_secs(self.wiggle_repeat_interval_seconds),
            },
            drive: DriveSettings {
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                max_consecutive_source_failures: self.max_consecutive_source_failures,
                max_consecutive_actuator_failures: self.max_consecutive_actuator_failures,
                shutdown_lower_attempts: self.shutdown_lower_attempts,
            },
        }
    }

    pub fn servo_geometry(&self) -> ServoGeometry {
        ServoGeometry {
            upper_angle: self.servo_upper_angle,
            lower_angle: self.servo_lower_angle,
            wiggle_amount: self.wiggle_amount,
            wiggle_cycles: self.wiggle_cycles,
            wiggle_step: Duration::from_millis(self.wiggle_step_ms),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        if self.max_consecutive_source_failures == 0
            || self.max_consecutive_actuator_failures == 0
        {
            bail!("failure limits must be at least 1");
        }
        if self.servo_upper_angle == self.servo_lower_angle {
            bail!(
                "servo_upper_angle and servo_lower_angle are both {}",
                self.servo_upper_angle
            );
        }
        Ok(())
    }
}

/// Defaults, then the TOML file, then `HAND_RAISER__*` environment overrides.
///
/// A missing file is only an error when its path was given explicitly.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };

    let mut settings = match fs::read_to_string(&path) {
        Ok(raw) => parse_settings(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if !explicit && err.kind() == std::io::ErrorKind::NotFound => Settings::default(),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.validate()?;
    Ok(settings)
}

fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str(raw)?)
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |field: &str| lookup(&format!("{ENV_PREFIX}{}", field.to_ascii_uppercase()));

    override_parsed(&mut settings.poll_interval_ms, "poll_interval_ms", &var);
    override_parsed(
        &mut settings.initial_wiggle_delay_seconds,
        "initial_wiggle_delay_seconds",
        &var,
    );
    override_parsed(
        &mut settings.wiggle_repeat_interval_seconds,
        "wiggle_repeat_interval_seconds",
        &var,
    );
    override_parsed(
        &mut settings.max_consecutive_source_failures,
        "max_consecutive_source_failures",
        &var,
    );
    override_parsed(
        &mut settings.max_consecutive_actuator_failures,
        "max_consecutive_actuator_failures",
        &var,
    );
    override_parsed(
        &mut settings.shutdown_lower_attempts,
        "shutdown_lower_attempts",
        &var,
    );
    override_parsed(&mut settings.servo_upper_angle, "servo_upper_angle", &var);
    override_parsed(&mut settings.servo_lower_angle, "servo_lower_angle", &var);
    override_parsed(&mut settings.wiggle_amount, "wiggle_amount", &var);
    override_parsed(&mut settings.wiggle_cycles, "wiggle_cycles", &var);
    override_parsed(&mut settings.wiggle_step_ms, "wiggle_step_ms", &var);

    if let Some(v) = var("bridge_url") {
        settings.bridge_url = v;
    }
    if let Some(v) = var("bot_name") {
        settings.bot_name = v;
    }
    if let Some(v) = var("robot_url") {
        settings.robot_url = Some(v);
    }
    if let Some(v) = var("robot_secret") {
        settings.robot_secret = Some(v);
    }
}

fn override_parsed<T: FromStr>(
    target: &mut T,
    field: &str,
    var: &impl Fn(&str) -> Option<String>,
) {
    let Some(raw) = var(field) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!(field, value = %raw, "config: ignoring unparsable override"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
