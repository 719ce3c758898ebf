// src/core/colibri.rs

//! # Discovery/Cache Engine
//!
//! [`Colibri`] keeps the authoritative set of known flowers: containers that
//! advertise a command manifest through the designated environment variable.
//! Each refresh rebuilds that set from the runtime's container list, carrying
//! already-known entries forward untouched so a container is inspected
//! exactly once for as long as it lives.

use crate::constants::FLOWER_PATH_ENV;
use crate::core::flower::{Flower, FlowerError};
use crate::core::transport::Container;
use crate::models::FlowerManifest;
use crate::runtime::{ContainerRuntime, RuntimeError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failures of the discovery engine's consumer-facing operations.
#[derive(Error, Debug)]
pub enum ColibriError {
    #[error("unknown container '{0}': is it a flower?")]
    UnknownFlower(String),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Flower(#[from] FlowerError),
}

/// Discovers and caches flowers, keyed by full container id.
///
/// `refresh` is the only mutating operation; it takes `&mut self` while the
/// read operations take `&self`, so sharing a `Colibri` across threads
/// forces a readers-writer lock around it — refreshes are then exclusive
/// writers against concurrent lookups, as the cache contract requires.
pub struct Colibri {
    runtime: Arc<dyn ContainerRuntime>,
    env_key: String,
    cache: HashMap<String, Flower>,
}

impl Colibri {
    /// Creates an engine probing for the default `FLOWER_PATH` key.
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self::with_env_key(runtime, FLOWER_PATH_ENV)
    }

    /// Creates an engine probing for a custom environment key.
    pub fn with_env_key(runtime: Arc<dyn ContainerRuntime>, env_key: impl Into<String>) -> Self {
        Self {
            runtime,
            env_key: env_key.into(),
            cache: HashMap::new(),
        }
    }

    /// Rebuilds the cache from the runtime's container list and returns the
    /// number of known flowers.
    ///
    /// Ids already cached are carried forward unchanged — no re-inspection.
    /// Unseen ids are inspected and become entries iff the designated key is
    /// present and non-empty; absence is never cached negatively, so such
    /// containers are re-probed on every refresh. Ids missing from the new
    /// listing are dropped silently.
    ///
    /// # Errors
    /// A failed list or inspect call aborts the whole refresh and leaves the
    /// previous cache in place; nothing is retried.
    pub fn refresh(&mut self) -> Result<usize, RuntimeError> {
        let ids = self.runtime.list_containers()?;
        log::debug!("Refreshing flower cache over {} containers", ids.len());

        // The new map is built without touching the current cache, so an
        // inspect failure part-way through aborts with the old cache intact.
        let mut next = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(known) = self.cache.get(&id) {
                next.insert(id, known.clone());
                continue;
            }

            let container = Container::inspect(Arc::clone(&self.runtime), id.clone())?;
            let path = container.env_value(&self.env_key).to_string();
            if path.is_empty() {
                continue;
            }

            log::debug!("Found flower '{}' with manifest '{}'", container.name(), path);
            next.insert(id, Flower::new(container, path));
        }

        self.cache = next;
        Ok(self.cache.len())
    }

    /// Finds a flower whose short id or display name equals `identifier`.
    ///
    /// First match wins; no uniqueness is enforced between short ids and
    /// names across entries.
    pub fn lookup(&self, identifier: &str) -> Option<&Flower> {
        self.cache.values().find(|flower| {
            flower.container().short_id() == identifier || flower.container().name() == identifier
        })
    }

    /// Mutable variant of [`Colibri::lookup`], needed to parse a resolved
    /// entry in place.
    pub fn lookup_mut(&mut self, identifier: &str) -> Option<&mut Flower> {
        self.cache.values_mut().find(|flower| {
            flower.container().short_id() == identifier || flower.container().name() == identifier
        })
    }

    /// All display names and short ids of the cached flowers, for discovery
    /// and completion consumers. The order is unspecified.
    pub fn list_identifiers(&self) -> Vec<String> {
        let mut identifiers = Vec::with_capacity(self.cache.len() * 2);
        for flower in self.cache.values() {
            identifiers.push(flower.container().name().to_string());
        }
        for flower in self.cache.values() {
            identifiers.push(flower.container().short_id().to_string());
        }
        identifiers
    }

    /// Looks an identifier up and parses its manifest in one step.
    ///
    /// # Errors
    /// `UnknownFlower` when the identifier matches no cache entry; parse
    /// failures surface as their underlying [`FlowerError`].
    pub fn fly_to(&mut self, identifier: &str) -> Result<&FlowerManifest, ColibriError> {
        let flower = self
            .lookup_mut(identifier)
            .ok_or_else(|| ColibriError::UnknownFlower(identifier.to_string()))?;
        Ok(flower.parse()?)
    }

    /// Number of known flowers.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether no flower is currently known.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl fmt::Debug for Colibri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Colibri")
            .field("env_key", &self.env_key)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::FakeRuntime;

    const FLOWER_ID: &str = "0123456789abcdef0123456789abcdef";
    const PLAIN_ID: &str = "fedcba9876543210fedcba9876543210";

    fn engine() -> (Arc<FakeRuntime>, Colibri) {
        let runtime = Arc::new(FakeRuntime::new());
        runtime.add_container(FLOWER_ID, "/web", &["FLOWER_PATH=/flowers.yml", "TERM=xterm"]);
        runtime.add_container(PLAIN_ID, "/db", &["TERM=xterm"]);
        let colibri = Colibri::new(Arc::clone(&runtime) as Arc<dyn ContainerRuntime>);
        (runtime, colibri)
    }

    #[test]
    fn refresh_caches_only_containers_with_the_designated_key() {
        let (_, mut colibri) = engine();
        assert_eq!(colibri.refresh().unwrap(), 1);
        assert!(colibri.lookup("web").is_some());
        assert!(colibri.lookup("db").is_none());
    }

    #[test]
    fn refresh_is_idempotent_and_never_reinspects_cached_entries() {
        let (runtime, mut colibri) = engine();
        colibri.refresh().unwrap();
        let mut first = colibri.list_identifiers();

        colibri.refresh().unwrap();
        let mut second = colibri.list_identifiers();

        first.sort();
        second.sort();
        assert_eq!(first, second);
        // One inspect per refresh for the non-flower, exactly one ever for
        // the cached flower: 2 on the first pass, 1 more on the second.
        assert_eq!(runtime.inspect_count(), 3);
    }

    #[test]
    fn containers_without_the_key_are_reprobed_every_refresh() {
        let (runtime, mut colibri) = engine();
        for _ in 0..3 {
            colibri.refresh().unwrap();
            assert!(colibri.lookup("db").is_none());
        }
        let probes = runtime
            .inspect_log()
            .into_iter()
            .filter(|id| id == PLAIN_ID)
            .count();
        assert_eq!(probes, 3);
    }

    #[test]
    fn vanished_containers_are_dropped() {
        let (runtime, mut colibri) = engine();
        colibri.refresh().unwrap();
        assert_eq!(colibri.len(), 1);

        runtime.remove_container(FLOWER_ID);
        assert_eq!(colibri.refresh().unwrap(), 0);
        assert!(colibri.lookup("web").is_none());
        assert!(colibri.is_empty());
    }

    #[test]
    fn lookup_matches_short_id_and_name_alike() {
        let (_, mut colibri) = engine();
        colibri.refresh().unwrap();

        let by_name = colibri.lookup("web").unwrap().container().id().to_string();
        let by_short_id = colibri
            .lookup("0123456789ab")
            .unwrap()
            .container()
            .id()
            .to_string();
        assert_eq!(by_name, by_short_id);
        assert!(colibri.lookup("nope").is_none());
    }

    #[test]
    fn list_identifiers_is_the_union_of_names_and_short_ids() {
        let (_, mut colibri) = engine();
        colibri.refresh().unwrap();

        let mut identifiers = colibri.list_identifiers();
        identifiers.sort();
        assert_eq!(identifiers, vec!["0123456789ab", "web"]);
    }

    #[test]
    fn fly_to_parses_a_known_flower() {
        let (runtime, mut colibri) = engine();
        runtime.script_exec("cat /flowers.yml", "commands:\n  - {name: ls, bin: /bin/ls}\n");
        colibri.refresh().unwrap();

        let manifest = colibri.fly_to("web").unwrap();
        assert_eq!(manifest.commands[0].name, "ls");
    }

    #[test]
    fn fly_to_an_unknown_identifier_fails() {
        let (_, mut colibri) = engine();
        colibri.refresh().unwrap();
        assert!(matches!(
            colibri.fly_to("ghost"),
            Err(ColibriError::UnknownFlower(_))
        ));
    }

    #[test]
    fn a_failed_listing_aborts_the_refresh_and_keeps_the_cache() {
        let (runtime, mut colibri) = engine();
        colibri.refresh().unwrap();

        runtime.fail_next_list("daemon unavailable");
        assert!(colibri.refresh().is_err());
        assert!(colibri.lookup("web").is_some());
    }

    #[test]
    fn a_failed_inspect_aborts_the_refresh_and_keeps_the_cache() {
        let (runtime, mut colibri) = engine();
        colibri.refresh().unwrap();
        assert!(colibri.lookup("web").is_some());

        // A new container shows up but its inspection fails part-way through
        // the refresh, after the cached flower was already carried forward.
        runtime.add_container("bbbb1111bbbb1111", "/new", &["FLOWER_PATH=/x.yml"]);
        runtime.fail_next_inspect("daemon hiccup");
        assert!(colibri.refresh().is_err());

        assert_eq!(colibri.len(), 1);
        assert!(colibri.lookup("web").is_some());

        // The next successful refresh still carries the entry forward
        // instead of re-inspecting it.
        colibri.refresh().unwrap();
        let flower_inspections = runtime
            .inspect_log()
            .into_iter()
            .filter(|id| id == FLOWER_ID)
            .count();
        assert_eq!(flower_inspections, 1);
        assert!(colibri.lookup("new").is_some());
    }

    #[test]
    fn a_custom_env_key_is_honored() {
        let runtime = Arc::new(FakeRuntime::new());
        runtime.add_container("aaaa0000aaaa0000", "/worker", &["CMDS_AT=/etc/cmds.yml"]);
        let mut colibri =
            Colibri::with_env_key(Arc::clone(&runtime) as Arc<dyn ContainerRuntime>, "CMDS_AT");

        assert_eq!(colibri.refresh().unwrap(), 1);
        assert_eq!(
            colibri.lookup("worker").unwrap().manifest_path(),
            "/etc/cmds.yml"
        );
    }
}
