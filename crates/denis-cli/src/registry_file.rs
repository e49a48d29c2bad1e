//! Loads an [`EngineRegistry`] from a static JSON descriptor file
//! (spec.md §6.7). Grounded on `gateway-cli`'s config-file commands,
//! generalized from a gateway config blob to the engine descriptor this
//! crate's narrower scope actually needs.

use denis_core::{Engine, EngineRegistry, ProviderFamily};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct EngineDescriptor {
    engine_id: String,
    provider_family: String,
    endpoint: String,
    model: String,
    #[serde(default)]
    priority: u32,
    #[serde(default)]
    tags: HashSet<String>,
    #[serde(default = "default_max_context")]
    max_context: u32,
    #[serde(default = "default_max_output")]
    max_output: u32,
    #[serde(default)]
    cost_factor: f64,
    #[serde(default)]
    default_params: HashMap<String, serde_json::Value>,
}

fn default_max_context() -> u32 {
    4096
}

fn default_max_output() -> u32 {
    512
}

/// Read, parse, and validate a registry descriptor file into an
/// [`EngineRegistry`]. An unknown `provider_family` string is dropped with
/// a warning unless `strict` is set, matching
/// `DENIS_STRICT_ENGINE_REGISTRY` (spec.md §4.1, §7).
pub fn load_registry(path: &Path, strict: bool) -> anyhow::Result<EngineRegistry> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("reading registry descriptor {}: {err}", path.display()))?;
    let descriptors: Vec<EngineDescriptor> = serde_json::from_str(&raw)
        .map_err(|err| anyhow::anyhow!("parsing registry descriptor {}: {err}", path.display()))?;

    let mut engines = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let Some(family) = ProviderFamily::parse(&descriptor.provider_family) else {
            if strict {
                anyhow::bail!(
                    "unknown provider_family '{}' for engine '{}'",
                    descriptor.provider_family,
                    descriptor.engine_id
                );
            }
            tracing::warn!(
                engine_id = %descriptor.engine_id,
                family = %descriptor.provider_family,
                "dropping engine with unknown provider family"
            );
            continue;
        };

        let mut builder = Engine::builder(descriptor.engine_id.clone(), family)
            .endpoint(descriptor.endpoint)
            .model(descriptor.model)
            .priority(descriptor.priority)
            .tags(descriptor.tags)
            .max_context(descriptor.max_context)
            .max_output(descriptor.max_output)
            .cost_factor(descriptor.cost_factor);
        for (key, value) in descriptor.default_params {
            builder = builder.default_param(key, value);
        }

        engines.push(builder.build()?);
    }

    EngineRegistry::load(engines).map_err(|err| anyhow::anyhow!("loading engine registry: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_descriptor(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("denis-cli-test-{}-{name}.json", std::process::id()));
        std::fs::write(&path, contents).expect("write descriptor");
        path
    }

    #[test]
    fn loads_a_minimal_descriptor() {
        let path = write_descriptor(
            "minimal",
            r#"[
                {"engine_id": "l1", "provider_family": "llamacpp", "endpoint": "http://node", "model": "m1", "tags": ["local"]}
            ]"#,
        );
        let registry = load_registry(&path, false).expect("should load");
        assert_eq!(registry.len(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unknown_family_is_dropped_unless_strict() {
        let path = write_descriptor(
            "unknown-family",
            r#"[{"engine_id": "x", "provider_family": "bogus", "endpoint": "http://x", "model": "m"}]"#,
        );
        let registry = load_registry(&path, false).expect("should load with drop");
        assert!(registry.is_empty());
        assert!(load_registry(&path, true).is_err());
        std::fs::remove_file(&path).ok();
    }
}
