//! # Model Cache
//!
//! Memoizes loaded models for the lifetime of one worker.
//!
//! ## Ownership:
//! A cache is a plain owned value. Every worker builds its own when it starts
//! and drops it when it exits, so models never cross worker boundaries and no
//! locking is needed.
//!
//! ## Lifecycle of an entry:
//! Missing → Loaded (kept until the worker exits or the entry is removed).
//! Failed loads are not remembered; the next request for the same key tries again.

use crate::config::Configuration;
use crate::device::Device;
use crate::error::{BatchError, BatchResult};
use std::collections::HashMap;
use std::fmt;
use tracing::info;

/// Identity of a loaded model: which weights, where, at what precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub model_identifier: String,
    pub device: Device,
    pub compute_type: String,
}

impl ModelKey {
    pub fn new(model_identifier: impl Into<String>, device: Device, compute_type: impl Into<String>) -> Self {
        Self {
            model_identifier: model_identifier.into(),
            device,
            compute_type: compute_type.into(),
        }
    }

    /// The key a job needs under the given configuration.
    pub fn from_config(config: &Configuration) -> Self {
        Self::new(&config.model_identifier, config.device, &config.compute_type)
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {} ({})", self.model_identifier, self.device, self.compute_type)
    }
}

/// Per-worker model store. Never evicts.
pub struct ModelCache<M> {
    models: HashMap<ModelKey, M>,
}

impl<M> Default for ModelCache<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> ModelCache<M> {
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Return the model for `key`, calling `loader` only on the first request.
    ///
    /// Load failures are wrapped in [`BatchError::ModelLoad`] with the key's
    /// context and are not cached.
    pub fn get_or_load<F>(&mut self, key: &ModelKey, loader: F) -> BatchResult<&mut M>
    where
        F: FnOnce(&ModelKey) -> anyhow::Result<M>,
    {
        if !self.models.contains_key(key) {
            info!("Loading model: {}...", key);
            let started = std::time::Instant::now();
            let model = loader(key).map_err(|cause| BatchError::ModelLoad {
                model: key.model_identifier.clone(),
                device: key.device,
                compute_type: key.compute_type.clone(),
                cause,
            })?;
            info!("Model {} loaded in {:.2}s", key, started.elapsed().as_secs_f64());
            self.models.insert(key.clone(), model);
        }

        self.models
            .get_mut(key)
            .ok_or_else(|| BatchError::PoolFatal(format!("model {} vanished from cache", key)))
    }

    /// Drop the model for `key`; the next request loads a fresh one.
    pub fn remove(&mut self, key: &ModelKey) -> Option<M> {
        self.models.remove(key)
    }

    #[cfg(test)]
    pub fn contains(&self, key: &ModelKey) -> bool {
        self.models.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_identical_keys_load_once() {
        let loads = Cell::new(0);
        let loader = |key: &ModelKey| {
            loads.set(loads.get() + 1);
            Ok(key.model_identifier.clone())
        };
        let mut cache = ModelCache::new();
        let key = ModelKey::new("base", Device::Gpu, "float16");

        assert_eq!(cache.get_or_load(&key, loader).unwrap().as_str(), "base");
        assert_eq!(cache.get_or_load(&key.clone(), loader).unwrap().as_str(), "base");

        assert_eq!(loads.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_differing_compute_type_loads_again() {
        let loads = Cell::new(0);
        let loader = |_: &ModelKey| {
            loads.set(loads.get() + 1);
            Ok(loads.get())
        };
        let mut cache = ModelCache::new();

        cache.get_or_load(&ModelKey::new("base", Device::Gpu, "float16"), loader).unwrap();
        cache.get_or_load(&ModelKey::new("base", Device::Gpu, "float32"), loader).unwrap();
        cache.get_or_load(&ModelKey::new("base", Device::Cpu, "float32"), loader).unwrap();

        assert_eq!(loads.get(), 3);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_failures_are_wrapped_and_not_cached() {
        let attempts = Cell::new(0);
        let mut cache: ModelCache<u32> = ModelCache::new();
        let key = ModelKey::new("medium", Device::Cpu, "float32");

        let err = cache
            .get_or_load(&key, |_| {
                attempts.set(attempts.get() + 1);
                Err(anyhow::anyhow!("download interrupted"))
            })
            .unwrap_err();
        match err {
            BatchError::ModelLoad { model, device, compute_type, cause } => {
                assert_eq!(model, "medium");
                assert_eq!(device, Device::Cpu);
                assert_eq!(compute_type, "float32");
                assert_eq!(cause.to_string(), "download interrupted");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!cache.contains(&key));

        // A later request retries the load
        let model = cache
            .get_or_load(&key, |_| {
                attempts.set(attempts.get() + 1);
                Ok(7)
            })
            .unwrap();
        assert_eq!(*model, 7);
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_removed_model_is_reloaded() {
        let loads = Cell::new(0);
        let loader = |_: &ModelKey| {
            loads.set(loads.get() + 1);
            Ok(loads.get())
        };
        let mut cache = ModelCache::new();
        let key = ModelKey::new("small", Device::Cpu, "float32");

        cache.get_or_load(&key, loader).unwrap();
        assert_eq!(cache.remove(&key), Some(1));
        assert!(cache.is_empty());
        assert_eq!(*cache.get_or_load(&key, loader).unwrap(), 2);
        assert_eq!(cache.remove(&ModelKey::new("tiny", Device::Cpu, "float32")), None);
    }
}
