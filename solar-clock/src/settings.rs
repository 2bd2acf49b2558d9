// Copyright (c) 2025 Qorix GmbH
//
// This program and the accompanying materials are made available under the
// terms of the Apache License, Version 2.0 which is available at
// https://www.apache.org/licenses/LICENSE-2.0.
//
// SPDX-License-Identifier: Apache-2.0
use solar_core::core_errors;
use solar_core::json::{self, JsonValue};
use solar_core::prelude::*;
use solar_os::process::CommandJob;
use solar_rto::prelude::*;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_INPUT_DEVICE: &str = "/dev/input/event0";
pub const DEFAULT_FRAMEBUFFER: &str = "/dev/fb0";
pub const DEFAULT_ROTATION_SECS: f64 = 30.0;
pub const DEFAULT_TICK_SECS: f64 = 0.1;
pub const DEFAULT_RATE_LIMIT_SECS: f64 = 0.2;
pub const DEFAULT_REFRESH_SECS: f64 = 60.0;
pub const DEFAULT_FEED_URL: &str = "http://api.open-notify.org/iss-now.json";
pub const DEFAULT_MARKER_FILE: &str = "/usr/share/xplanet/markers/iss";
pub const DEFAULT_MARKER_ICON: &str = "iss.png";

/// Directory of the default image slots
pub const DEFAULT_IMAGES: &str = "/home/pi/solarclock_images";

/// The default rotation: name, file and renderer command line
const DEFAULT_SLOTS: [(&str, &str, &str); 3] = [
    (
        "earth",
        "earth.png",
        "xplanet -projection rectangular -geometry 800x480 -config overlay_clouds -output {output} -verbosity 10 -num_times 1",
    ),
    (
        "moon",
        "moon.png",
        "xplanet -config moon_orbit -geometry 800x480 -radius 35 -num_times 1 -output {output}",
    ),
    (
        "mars",
        "mars.png",
        "xplanet -body mars -geometry 800x480 -projection rectangular -num_times 1 -marker_file mars -longitude 20 -output {output}",
    ),
];

/// A slot of the rotation with its optional renderer
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSettings {
    pub slot: ImageSlot,

    /// `None` for slots whose file is maintained elsewhere
    pub command: Option<CommandJob>,
}

/// Everything the clock needs to start, resolved from the configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub input_device: PathBuf,
    pub input_filter: EventFilter,
    pub input_enabled: bool,

    pub framebuffer: PathBuf,
    pub display: DisplaySettings,

    pub refresh_period: Duration,

    /// `None` when the feed is switched off with an empty URL
    pub feed_url: Option<String>,
    pub marker: MarkerFile,

    pub slots: Vec<SlotSettings>,
}

impl Settings {
    /// Resolve the settings, using the defaults for every absent key
    pub fn from_config(config: &Config) -> CoreResult<Settings> {
        let display = DisplaySettings {
            rotation: config.seconds_or("display.rotation_secs", DEFAULT_ROTATION_SECS)?,
            tick: config.seconds_or("display.tick_secs", DEFAULT_TICK_SECS)?,
            rate_limit: config.seconds_or("display.rate_limit_secs", DEFAULT_RATE_LIMIT_SECS)?,
        };
        display
            .validate()
            .map_err(|e| Error::new(core_errors::INVALID_CONFIG, e.text().to_string()))?;

        let feed_url = config.str_or("refresh.feed_url", DEFAULT_FEED_URL)?;

        Ok(Settings {
            input_device: config.str_or("input.device", DEFAULT_INPUT_DEVICE)?.into(),
            input_filter: config.str_or("input.filter", "any")?.parse()?,
            input_enabled: config.bool_or("input.enabled", true)?,
            framebuffer: config.str_or("display.framebuffer", DEFAULT_FRAMEBUFFER)?.into(),
            display,
            refresh_period: config.seconds_or("refresh.period_secs", DEFAULT_REFRESH_SECS)?,
            feed_url: (!feed_url.is_empty()).then_some(feed_url),
            marker: MarkerFile::new(
                config.str_or("refresh.marker_file", DEFAULT_MARKER_FILE)?,
                config.str_or("refresh.marker_icon", DEFAULT_MARKER_ICON)?,
            ),
            slots: Self::slots(config)?,
        })
    }

    fn slots(config: &Config) -> CoreResult<Vec<SlotSettings>> {
        let items = match config.array("slots")? {
            Some(items) => items,
            None => return Self::default_slots(),
        };

        if items.is_empty() {
            return Err(Error::const_new(
                core_errors::INVALID_CONFIG,
                "`slots` must not be empty",
            ));
        }

        items
            .iter()
            .enumerate()
            .map(|(i, item)| Self::slot(i, item))
            .collect()
    }

    fn slot(index: usize, item: &JsonValue) -> CoreResult<SlotSettings> {
        let invalid = |what: &str| {
            Error::new(
                core_errors::INVALID_CONFIG,
                format!("`slots[{index}]` {what}"),
            )
        };

        let text = |key: &str| {
            json::member(item, key)
                .and_then(|value| value.get::<String>())
                .cloned()
                .ok_or_else(|| invalid(&format!("needs a string `{key}`")))
        };

        let name = text("name")?;
        let path = text("path")?;

        let command = match json::member(item, "command") {
            None => None,
            Some(JsonValue::Array(argv)) => {
                let argv = argv
                    .iter()
                    .map(|arg| arg.get::<String>().cloned())
                    .collect::<Option<Vec<String>>>()
                    .ok_or_else(|| invalid("`command` must hold strings only"))?;
                Some(CommandJob::new(argv).map_err(|e| invalid(e.text()))?)
            }
            Some(_) => return Err(invalid("`command` must be an array")),
        };

        Ok(SlotSettings {
            slot: ImageSlot::new(name, path),
            command,
        })
    }

    fn default_slots() -> CoreResult<Vec<SlotSettings>> {
        DEFAULT_SLOTS
            .iter()
            .map(|(name, file, command)| -> CoreResult<SlotSettings> {
                Ok(SlotSettings {
                    slot: ImageSlot::new(*name, PathBuf::from(DEFAULT_IMAGES).join(file)),
                    command: Some(CommandJob::new(command.split_whitespace())?),
                })
            })
            .collect()
    }

    /// The slots in display order
    pub fn image_slots(&self) -> Vec<ImageSlot> {
        self.slots.iter().map(|s| s.slot.clone()).collect()
    }

    /// Build the refresher for all slots that have a renderer
    pub fn refresher(&self) -> Refresher {
        let jobs = self
            .slots
            .iter()
            .filter_map(|s| {
                s.command.as_ref().map(|command| {
                    SlotJob::new(
                        s.slot.clone(),
                        Box::new(StagedCommand::new(command.clone())) as Box<dyn Regenerate>,
                    )
                })
            })
            .collect();

        let refresher = Refresher::new(jobs).with_period(self.refresh_period);
        match &self.feed_url {
            Some(url) => refresher.with_feed(Box::new(HttpPositionFeed::new(url.clone())), self.marker.clone()),
            None => refresher,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    fn parse(text: &str) -> CoreResult<Settings> {
        Settings::from_config(&text.parse::<Config>().unwrap())
    }

    #[test]
    fn defaults() {
        let settings = Settings::from_config(&Config::new()).unwrap();

        assert_eq!(settings.input_device, PathBuf::from("/dev/input/event0"));
        assert_eq!(settings.input_filter, EventFilter::Any);
        assert!(settings.input_enabled);
        assert_eq!(settings.framebuffer, PathBuf::from("/dev/fb0"));
        assert_eq!(settings.display, DisplaySettings::default());
        assert_eq!(settings.refresh_period, Duration::from_secs(60));
        assert_eq!(settings.feed_url.as_deref(), Some(DEFAULT_FEED_URL));
        assert_eq!(settings.marker.path(), Path::new("/usr/share/xplanet/markers/iss"));

        let names: Vec<&str> = settings.slots.iter().map(|s| s.slot.name()).collect();
        assert_eq!(names, vec!["earth", "moon", "mars"]);
        assert_eq!(
            settings.slots[1].slot.path(),
            Path::new("/home/pi/solarclock_images/moon.png")
        );
        assert_eq!(
            settings.slots[0].command.as_ref().unwrap().program(),
            "xplanet"
        );
        assert_eq!(
            settings.slots[2]
                .command
                .as_ref()
                .unwrap()
                .arguments(Path::new("/tmp/mars.staging.png"))
                .last()
                .unwrap(),
            "/tmp/mars.staging.png"
        );
    }

    #[test]
    fn overrides() {
        let settings = parse(
            r#"{
                "input": { "device": "/dev/input/event3", "filter": "press", "enabled": false },
                "display": { "rotation_secs": 10, "tick_secs": 0.05, "rate_limit_secs": 0.5 },
                "refresh": { "period_secs": 300, "feed_url": "" },
                "slots": [
                    { "name": "photo", "path": "/srv/photo.jpg" },
                    { "name": "sun", "path": "/srv/sun.png", "command": ["render-sun", "--out", "{output}"] }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(settings.input_device, PathBuf::from("/dev/input/event3"));
        assert_eq!(settings.input_filter, EventFilter::Press);
        assert!(!settings.input_enabled);
        assert_eq!(settings.display.rotation, Duration::from_secs(10));
        assert_eq!(settings.display.tick, Duration::from_millis(50));
        assert_eq!(settings.display.rate_limit, Duration::from_millis(500));
        assert_eq!(settings.refresh_period, Duration::from_secs(300));
        assert_eq!(settings.feed_url, None);

        assert_eq!(settings.slots.len(), 2);
        assert_eq!(settings.slots[0].command, None);
        assert_eq!(settings.slots[1].command.as_ref().unwrap().program(), "render-sun");
        assert_eq!(
            settings.image_slots(),
            vec![
                ImageSlot::new("photo", "/srv/photo.jpg"),
                ImageSlot::new("sun", "/srv/sun.png")
            ]
        );
        assert_eq!(settings.refresher().period(), Duration::from_secs(300));
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "display": {{ "framebuffer": "/dev/fb1" }}, "refresh": {{ "period_secs": 120 }} }}"#
        )
        .unwrap();

        let settings = Settings::from_config(&Config::from_file(file.path()).unwrap()).unwrap();
        assert_eq!(settings.framebuffer, PathBuf::from("/dev/fb1"));
        assert_eq!(settings.refresh_period, Duration::from_secs(120));
        assert_eq!(settings.slots.len(), 3);
    }

    #[test]
    fn invalid_values() {
        for text in [
            r#"{"display": {"rotation_secs": 0}}"#,
            r#"{"display": {"tick_secs": -1}}"#,
            r#"{"display": {"rotation_secs": 1, "tick_secs": 2}}"#,
            r#"{"display": {"rotation_secs": "30"}}"#,
            r#"{"display": {"rotation_secs": 1e30}}"#,
            r#"{"display": {"rotation_secs": 1e9}}"#,
            r#"{"display": {"rate_limit_secs": 1e9}}"#,
            r#"{"refresh": {"period_secs": 1e30}}"#,
            r#"{"input": {"filter": "swipe"}}"#,
            r#"{"input": {"enabled": "yes"}}"#,
            r#"{"slots": []}"#,
            r#"{"slots": {}}"#,
            r#"{"slots": [{"name": "a"}]}"#,
            r#"{"slots": [{"name": "a", "path": "/a.png", "command": []}]}"#,
            r#"{"slots": [{"name": "a", "path": "/a.png", "command": ["x", 1]}]}"#,
            r#"{"slots": [{"name": "a", "path": "/a.png", "command": "x"}]}"#,
        ] {
            assert_eq!(
                parse(text).unwrap_err().code(),
                core_errors::INVALID_CONFIG,
                "{text}"
            );
        }
    }
}
