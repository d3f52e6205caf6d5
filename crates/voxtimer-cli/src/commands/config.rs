use clap::Subcommand;
use serde_json::Value;
use voxtimer_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value
    Get {
        /// Dot-separated key (e.g. "timers.beep_repeat_secs")
        key: String,
    },
    /// Change one value and save
    Set {
        /// Dot-separated key
        key: String,
        value: String,
    },
    /// Print every key as `key = value`
    List,
    /// Overwrite the config file with defaults
    Reset,
}

/// Reject values the clock or resolver cannot work with.
fn check(config: &Config) -> Result<(), String> {
    let timers = &config.timers;
    if !(0.0..=1.0).contains(&timers.name_match_threshold) {
        return Err(format!(
            "timers.name_match_threshold must be between 0 and 1, got {}",
            timers.name_match_threshold
        ));
    }
    if timers.tick_interval_ms == 0 {
        return Err("timers.tick_interval_ms must be positive".into());
    }
    if timers.display_cycle_ticks == 0 {
        return Err("timers.display_cycle_ticks must be positive".into());
    }
    Ok(())
}

/// Flatten a JSON tree into `(dotted.key, value)` pairs, skipping unset options.
fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
        }
        Value::Null => {}
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            check(&config)?;
            config.save()?;
            tracing::debug!(key = %key, value = %value, "config updated");
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let mut entries = Vec::new();
            flatten("", &serde_json::to_value(&config)?, &mut entries);
            for (key, value) in entries {
                println!("{key} = {value}");
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
