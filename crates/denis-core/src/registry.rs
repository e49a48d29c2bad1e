//! The engine registry: single source of truth for engine identity
//! (spec.md §4.1).
//!
//! Loaded once at process start from a static descriptor. No other
//! component may resolve an `engine_id` outside of this registry.

use crate::engine::{Engine, ProviderFamily};
use crate::error::{DenisError, DenisResult};
use crate::types::EngineId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Filter applied by [`EngineRegistry::list`].
#[derive(Debug, Clone, Default)]
pub struct EngineFilter {
    /// Only engines carrying every one of these tags.
    pub tags: Vec<String>,
    /// Only engines of this provider family.
    pub provider_family: Option<ProviderFamily>,
    /// Only engines whose priority falls in `[min, max]`.
    pub priority_range: Option<(u32, u32)>,
}

impl EngineFilter {
    /// An unfiltered selector — every engine matches.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Require the given tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Require the given provider family.
    #[must_use]
    pub fn with_provider_family(mut self, family: ProviderFamily) -> Self {
        self.provider_family = Some(family);
        self
    }

    fn matches(&self, engine: &Engine) -> bool {
        if !self.tags.iter().all(|t| engine.tags.contains(t)) {
            return false;
        }
        if let Some(family) = self.provider_family {
            if engine.provider_family != family {
                return false;
            }
        }
        if let Some((min, max)) = self.priority_range {
            if engine.priority < min || engine.priority > max {
                return false;
            }
        }
        true
    }
}

#[derive(Default)]
struct RegistryState {
    engines: HashMap<EngineId, Engine>,
}

/// Catalog of backends, keyed by `engine_id` (spec.md §3.1, §4.1).
///
/// Read-only after `load`; guarded by a single `RwLock` so lookups never
/// block each other, matching the "read-only after init, guarded by a lazy
/// initializer and a mutex" resource model of spec.md §5.
#[derive(Clone)]
pub struct EngineRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl EngineRegistry {
    /// Build an empty registry. Use [`Self::load`] to populate it from a
    /// descriptor, or [`Self::insert`] to build one up programmatically
    /// (tests, CLI smoke runs).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState::default())),
        }
    }

    /// Load a registry from a static descriptor: a list of engines, already
    /// validated individually by [`crate::engine::EngineBuilder::build`].
    ///
    /// Enforces the cross-engine invariants of spec.md §3.1: unique
    /// `engine_id` (by construction, since the caller supplies a `Vec` and
    /// we reject duplicates explicitly) and no two engines sharing both
    /// `endpoint` and `model`.
    ///
    /// # Errors
    /// Returns [`DenisError::DuplicateEngine`] on a uniqueness violation.
    pub fn load(engines: Vec<Engine>) -> DenisResult<Self> {
        let registry = Self::empty();
        for engine in engines {
            registry.insert(engine)?;
        }
        Ok(registry)
    }

    /// Insert (or fail on conflict with) a single engine. Exposed so
    /// lenient-mode loaders can drop an offending engine and continue
    /// (spec.md §4.1, §7 Misconfiguration: "Lenient mode: drop offender,
    /// proceed").
    ///
    /// # Errors
    /// Returns [`DenisError::DuplicateEngine`] if the id is already present
    /// or another engine shares both endpoint and model.
    pub fn insert(&self, engine: Engine) -> DenisResult<()> {
        let mut state = self.state.write();
        if state.engines.contains_key(&engine.engine_id) {
            return Err(DenisError::DuplicateEngine {
                engine_id: engine.engine_id.to_string(),
            });
        }
        if state
            .engines
            .values()
            .any(|e| e.endpoint == engine.endpoint && e.model == engine.model)
        {
            return Err(DenisError::DuplicateEngine {
                engine_id: engine.engine_id.to_string(),
            });
        }
        state.engines.insert(engine.engine_id.clone(), engine);
        Ok(())
    }

    /// Resolve an engine id. The **only** legal way any component may turn
    /// an `engine_id` into an `Engine`.
    #[must_use]
    pub fn get(&self, engine_id: &EngineId) -> Option<Engine> {
        self.state.read().engines.get(engine_id).cloned()
    }

    /// List engines matching `filter`, ordered by priority ascending then
    /// `engine_id` lexicographic (spec.md §3.1 tie-break rule).
    #[must_use]
    pub fn list(&self, filter: &EngineFilter) -> Vec<Engine> {
        let state = self.state.read();
        let mut matched: Vec<Engine> = state
            .engines
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.engine_id.cmp(&b.engine_id)));
        matched
    }

    /// Total number of engines currently loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().engines.len()
    }

    /// True when no engines are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A stable content hash of the registry, exposed via `health()`
    /// (spec.md §6.1) so callers can detect a descriptor change without
    /// diffing the full catalog.
    #[must_use]
    pub fn content_hash(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let state = self.state.read();
        let mut ids: Vec<&str> = state.engines.keys().map(EngineId::as_str).collect();
        ids.sort_unstable();
        let mut hasher = DefaultHasher::new();
        for id in ids {
            id.hash(&mut hasher);
            if let Some(engine) = state.engines.get(&EngineId::new(id)) {
                engine.endpoint.hash(&mut hasher);
                engine.model.hash(&mut hasher);
            }
        }
        format!("{:016x}", hasher.finish())
    }

    /// Test-only: clear the registry. Mirrors `reset_registry()` in the
    /// original source's `kernel/engine_registry.py`.
    pub fn reset(&self) {
        self.state.write().engines.clear();
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::empty()
    }
}
