use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use cross_xdg::BaseDirs;
use nu_ansi_term::Color;
use tracing::debug;

use crate::machine::{DEFAULT_CELLS, EofPolicy};

/// Names the config file explicitly. Set but empty disables the config file.
pub const CONFIG_ENV: &str = "SCREW_CONFIG";

#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub error: Color,
    pub hint: Color,
    pub caret: Color,
}

impl Default for Colors {
    fn default() -> Self {
        // Red errors, yellow usage hints
        Self {
            error: Color::Red,
            hint: Color::Yellow,
            caret: Color::LightRed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Tape length.
    pub cells: usize,
    /// What `?` stores on end of input.
    pub eof: EofPolicy,
    /// Default step limit; `None` is unlimited.
    pub max_steps: Option<usize>,
    /// Default wall-clock limit in milliseconds; `None` is no limit.
    pub timeout_ms: Option<u64>,
    pub colors: Colors,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cells: DEFAULT_CELLS,
            eof: EofPolicy::default(),
            max_steps: None,
            timeout_ms: None,
            colors: Colors::default(),
        }
    }
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Process-wide settings, loaded from `screw.toml` on first use.
pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(|| load_from_toml().unwrap_or_default())
}

fn parse_color(value: &str) -> Option<Color> {
    let s = value.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.is_ascii() && hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
    } else {
        let name = s.to_ascii_lowercase();
        return Some(match name.as_str() {
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "purple" | "magenta" => Color::Purple,
            "cyan" => Color::Cyan,
            "white" => Color::White,
            "gray" | "grey" | "lightgray" | "light_gray" => Color::LightGray,
            "darkgray" | "dark_grey" | "darkgrey" | "dark_gray" => Color::DarkGray,
            "lightred" | "light_red" => Color::LightRed,
            "lightgreen" | "light_green" => Color::LightGreen,
            "lightyellow" | "light_yellow" => Color::LightYellow,
            "lightblue" | "light_blue" => Color::LightBlue,
            "lightpurple" | "light_purple" | "lightmagenta" | "light_magenta" => Color::LightPurple,
            "lightcyan" | "light_cyan" => Color::LightCyan,
            _ => return None,
        });
    }
    None
}

/// Parse `0` as "no limit" and anything else as the limit itself.
fn parse_limit<T: std::str::FromStr + PartialEq + Default>(value: &str) -> Option<Option<T>> {
    let n = value.trim().replace('_', "").parse::<T>().ok()?;
    Some((n != T::default()).then_some(n))
}

/// Split `content` into `(section, key) -> value` pairs.
fn parse_entries(content: &str) -> HashMap<(String, String), String> {
    // Very small hand-rolled parser: [section] headers and key = value pairs.
    // Values may be quoted; an unquoted value ends at a '#'.
    let mut section = String::new();
    let mut map = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].trim().to_string();
            continue;
        }
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim().to_string();
            let val_raw = line[eq + 1..].trim();
            let val = if let Some(quoted) = val_raw.strip_prefix('"') {
                quoted.split('"').next().unwrap_or_default().to_string()
            } else {
                val_raw.split('#').next().unwrap_or_default().trim().to_string()
            };
            map.insert((section.clone(), key), val);
        }
    }
    map
}

/// Build settings from the text of a `screw.toml`. Unknown keys and bad values fall back to defaults.
pub fn parse_settings(content: &str) -> Settings {
    let map = parse_entries(content);
    let get = |section: &str, key: &str| map.get(&(section.to_string(), key.to_string()));
    let mut cfg = Settings::default();

    if let Some(v) = get("interpreter", "cells") {
        match v.replace('_', "").parse::<usize>() {
            Ok(n) if n > 0 => cfg.cells = n,
            _ => debug!(value = %v, "ignoring invalid interpreter.cells"),
        }
    }
    if let Some(v) = get("interpreter", "eof") {
        match EofPolicy::parse(v) {
            Some(eof) => cfg.eof = eof,
            None => debug!(value = %v, "ignoring invalid interpreter.eof"),
        }
    }
    if let Some(v) = get("interpreter", "max_steps") {
        match parse_limit::<usize>(v) {
            Some(limit) => cfg.max_steps = limit,
            None => debug!(value = %v, "ignoring invalid interpreter.max_steps"),
        }
    }
    if let Some(v) = get("interpreter", "timeout_ms") {
        match parse_limit::<u64>(v) {
            Some(limit) => cfg.timeout_ms = limit,
            None => debug!(value = %v, "ignoring invalid interpreter.timeout_ms"),
        }
    }

    macro_rules! set_color {
        ($field:ident, $key:literal) => {
            if let Some(c) = get("colors", $key).and_then(|s| parse_color(s)) { cfg.colors.$field = c; }
        };
    }

    set_color!(error, "error");
    set_color!(hint, "hint");
    set_color!(caret, "caret");

    cfg
}

fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = env::var(CONFIG_ENV) {
        return (!explicit.is_empty()).then(|| PathBuf::from(explicit));
    }

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let config_home = base_dirs.config_home();

    let mut path = PathBuf::from(config_home);
    path.push("screw.toml");
    Some(path)
}

fn load_from_toml() -> Option<Settings> {
    let path = config_path()?;
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no config file loaded");
            return None;
        }
    };
    debug!(path = %path.display(), "config file loaded");
    Some(parse_settings(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(parse_settings(""), Settings::default());
    }

    #[test]
    fn reads_interpreter_section() {
        let cfg = parse_settings(
            r#"
            # tape and input
            [interpreter]
            cells = 30_000
            eof = "zero"
            max_steps = 1000   # per run
            timeout_ms = 0
            "#,
        );
        assert_eq!(cfg.cells, 30_000);
        assert_eq!(cfg.eof, EofPolicy::Zero);
        assert_eq!(cfg.max_steps, Some(1000));
        assert_eq!(cfg.timeout_ms, None);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let cfg = parse_settings("[interpreter]\ncells = 0\neof = sometimes\nmax_steps = lots\n");
        assert_eq!(cfg, Settings::default());
    }

    #[test]
    fn keys_outside_their_section_are_ignored() {
        let cfg = parse_settings("cells = 10\n[colors]\ncells = 12\n");
        assert_eq!(cfg.cells, DEFAULT_CELLS);
    }

    #[test]
    fn reads_colors() {
        let cfg = parse_settings("[colors]\nerror = \"#ff0000\"\nhint = light_blue\ncaret = nope\n");
        assert_eq!(cfg.colors.error, Color::Rgb(255, 0, 0));
        assert_eq!(cfg.colors.hint, Color::LightBlue);
        assert_eq!(cfg.colors.caret, Colors::default().caret);
    }

    #[test]
    fn non_ascii_hex_color_keeps_default() {
        let cfg = parse_settings("[colors]\nerror = \"#aébcd\"\nhint = \"#ééé\"\n");
        assert_eq!(cfg.colors, Colors::default());
    }
}
