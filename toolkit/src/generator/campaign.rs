use crate::capture::{Job, WorkerPool};
use crate::generator::write_json;
use crate::workflow::config::CampaignSettings;
use anyhow::Context;
use log::{info, warn};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const TO_GHZ: f64 = 1e-9;

/// `start, start + step, ...` strictly below `stop`.
pub fn frequencies(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || stop <= start {
        return Vec::new();
    }
    let count = ((stop - start) / step).ceil() as usize;
    (0..count).map(|i| start + i as f64 * step).collect()
}

pub fn scenario_name(prefix: &str, frequency: f64) -> String {
    format!("{}-{:.2}", prefix, frequency * TO_GHZ)
}

fn attributes_mut(value: &mut Value) -> impl Iterator<Item = &mut Value> + '_ {
    value
        .as_array_mut()
        .map(|a| a.iter_mut())
        .into_iter()
        .flatten()
}

fn set_first(attributes: Option<&mut Value>, name: &str, frequency: f64) -> bool {
    let Some(attributes) = attributes else {
        return false;
    };
    for attribute in attributes_mut(attributes) {
        if attribute.get("name").and_then(Value::as_str) == Some(name) {
            attribute["value"] = Value::from(frequency);
            return true;
        }
    }
    false
}

/// Renames the scenario and moves every channel and antenna element to
/// `frequency`. Returns how many attributes were updated.
pub fn tune(config: &mut Value, name: &str, frequency: f64) -> usize {
    config["name"] = Value::from(name);
    let mut updated = 0;

    if let Some(phy_layers) = config.get_mut("phyLayer") {
        for layer in attributes_mut(phy_layers) {
            let attrs = layer.pointer_mut("/channel/propagationLossModel/attributes");
            updated += set_first(attrs, "Frequency", frequency) as usize;
        }
    }

    if let Some(nodes) = config.get_mut("nodes") {
        for node in attributes_mut(nodes) {
            let Some(devices) = node.get_mut("netDevices") else {
                continue;
            };
            for device in attributes_mut(devices) {
                let Some(antenna) = device.pointer_mut("/antenna/attributes") else {
                    continue;
                };
                for attribute in attributes_mut(antenna) {
                    if attribute.get("name").and_then(Value::as_str) != Some("AntennaElement") {
                        continue;
                    }
                    let element = attribute.pointer_mut("/value/attributes");
                    updated += set_first(element, "OperatingFrequency", frequency) as usize;
                }
            }
        }
    }

    updated
}

fn clean_scratch(dir: &Path) -> anyhow::Result<()> {
    if !dir.exists() {
        return fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()));
    }
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        }
    }
    Ok(())
}

/// Writes one configuration per swept frequency into the scratch directory.
pub fn write_configs(template: &Value, settings: &CampaignSettings) -> anyhow::Result<Vec<PathBuf>> {
    clean_scratch(&settings.scratch_dir)?;

    let mut written = Vec::new();
    for frequency in frequencies(settings.start_hz, settings.stop_hz, settings.step_hz) {
        let name = scenario_name(&settings.prefix, frequency);
        let mut config = template.clone();
        if tune(&mut config, &name, frequency) == 0 {
            warn!("{}: no frequency attribute found in the template", name);
        }
        let path = settings.scratch_dir.join(format!("{}.json", name));
        write_json(&path, &config, b"  ")?;
        written.push(path);
    }
    info!("wrote {} configurations to {}", written.len(), settings.scratch_dir.display());
    Ok(written)
}

pub fn simulation_jobs(executable: &Path, configs: &[PathBuf]) -> Vec<Job> {
    configs
        .iter()
        .map(|config| {
            Job::new(
                config.display().to_string(),
                executable.as_os_str(),
                [format!("--config={}", config.display())],
            )
        })
        .collect()
}

/// Runs the simulator on every configuration, failing on the first
/// unsuccessful run once all have finished.
pub fn run_simulations(pool: &WorkerPool, executable: &Path, configs: &[PathBuf]) -> anyhow::Result<()> {
    let outputs = pool.run(simulation_jobs(executable, configs))?;
    for output in &outputs {
        info!("{} finished with {}", output.label, output.status);
    }
    outputs.iter().try_for_each(|output| output.ensure_success())
}
