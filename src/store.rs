//! Main Store struct tying models, snapshots and observers together.

use crate::error::{Result, ValuableError};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::models::{Collection, Model};
use crate::observers::{ObserverSet, SnapshotObserver};
use crate::schema::{Definition, Schema};
use crate::snapshot::{HasSource, Records, Snapshot, Source, StoreTag};
use crate::tree::{Struct, TreeOptions, DEFAULT_MAX_NOTIFY_DEPTH};
use crate::types::{is_plain_record, ModelId, ObserverId, Raw};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

static NEXT_STORE_TAG: AtomicU64 = AtomicU64::new(1);

/// Store configuration.
#[derive(Clone)]
pub struct StoreConfig {
    /// Validate the definition, model names and attributes up front.
    pub strict_validation: bool,

    /// Source of ids for newly committed models.
    pub id_generator: Arc<dyn IdGenerator>,

    /// Notification depth limit for trees built by this store and for
    /// commits or restores issued from inside store observers.
    pub max_notify_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            strict_validation: true,
            id_generator: Arc::new(UuidGenerator),
            max_notify_depth: DEFAULT_MAX_NOTIFY_DEPTH,
        }
    }
}

impl StoreConfig {
    /// Default config with the validation passes skipped.
    pub fn lenient() -> Self {
        Self {
            strict_validation: false,
            ..Default::default()
        }
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.id_generator = Arc::new(ids);
        self
    }

    /// Options handed to every model tree the store builds.
    pub fn tree_options(&self) -> TreeOptions {
        TreeOptions {
            strict: self.strict_validation,
            max_notify_depth: self.max_notify_depth,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("strict_validation", &self.strict_validation)
            .field("max_notify_depth", &self.max_notify_depth)
            .finish_non_exhaustive()
    }
}

/// The model store.
///
/// Holds the current snapshot of every committed model. Models are edited
/// in memory as value trees and folded in by `commit`, which publishes a
/// new snapshot and notifies store observers once. Snapshots already
/// handed out never change.
pub struct Store {
    /// Store configuration.
    config: StoreConfig,

    /// Declared models.
    definition: Arc<Definition>,

    /// Identity carried by every snapshot this store publishes.
    tag: StoreTag,

    /// Current published snapshot.
    current: RwLock<Snapshot>,

    /// Store-level observers.
    observers: RwLock<ObserverSet<SnapshotObserver>>,

    /// Highest version ever published.
    last_version: AtomicU64,

    /// Store observer calls currently in flight.
    notify_depth: AtomicUsize,

    /// Lock for write operations to ensure atomicity.
    write_lock: Mutex<()>,
}

impl Store {
    /// Create a store for `definition`.
    pub fn new(definition: Definition, config: StoreConfig) -> Result<Self> {
        if config.strict_validation {
            definition.validate()?;
        }

        let source: Source = definition
            .names()
            .map(|name| (name.to_string(), Records::new()))
            .collect();
        let definition = Arc::new(definition);
        let tag = StoreTag(NEXT_STORE_TAG.fetch_add(1, Ordering::Relaxed));
        let current = Snapshot::new(Arc::new(source), Arc::clone(&definition), 0, tag);

        debug!(models = definition.len(), tag = tag.0, "store created");

        Ok(Self {
            config,
            definition,
            tag,
            current: RwLock::new(current),
            observers: RwLock::new(ObserverSet::new()),
            last_version: AtomicU64::new(0),
            notify_depth: AtomicUsize::new(0),
            write_lock: Mutex::new(()),
        })
    }

    /// Create a store with the default configuration.
    pub fn with_definition(definition: Definition) -> Result<Self> {
        Self::new(definition, StoreConfig::default())
    }

    /// Whether `a` and `b` wrap the identical persistent source.
    pub fn is(a: &impl HasSource, b: &impl HasSource) -> bool {
        Arc::ptr_eq(&a.source(), &b.source())
    }

    // --- Models ---

    /// Build a new, uncommitted model.
    pub fn create(&self, model: &str, attributes: impl Into<Raw>) -> Result<Model> {
        let schema = self.schema(model)?;
        let attributes = attributes.into();
        if self.config.strict_validation && !(attributes.is_null() || is_plain_record(&attributes)) {
            return Err(ValuableError::InvalidArgument(format!(
                "Store.create(): attributes for {} must be a record, got {}",
                model, attributes
            )));
        }

        let record = Struct::with_options(schema, attributes, self.config.tree_options())?;
        debug!(model, "model created");
        Ok(Model::new(model, record))
    }

    /// Build a new model from any serializable value.
    pub fn create_from<T: Serialize>(&self, model: &str, attributes: &T) -> Result<Model> {
        self.create(model, serde_json::to_value(attributes)?)
    }

    /// Build an uncommitted collection of `model`, one member per entry.
    pub fn collection(&self, model: &str, members: Vec<Raw>) -> Result<Collection> {
        let schema = self.schema(model)?;
        let mut collection = Collection::new(model, schema, self.config.tree_options());
        for attributes in members {
            collection.create(attributes)?;
        }
        Ok(collection)
    }

    /// Committed attributes of `(model, id)` in the current snapshot.
    pub fn get(&self, model: &str, id: &ModelId) -> Option<Raw> {
        self.current.read().get(model, id)
    }

    /// Fold `models` into the store and publish a new snapshot.
    ///
    /// Every model is checked and read before anything is applied, so a
    /// failure leaves the store, and the models' ids, untouched.
    pub fn commit<'a, I>(&self, models: I) -> Result<Snapshot>
    where
        I: IntoIterator<Item = &'a mut Model>,
    {
        self.check_notify_depth()?;
        let mut models: Vec<&'a mut Model> = models.into_iter().collect();

        let mut raws = Vec::with_capacity(models.len());
        for model in models.iter() {
            if !self.definition.contains(model.path()) {
                return Err(ValuableError::UnknownModel(model.path().to_string()));
            }
            raws.push(if model.marked_for_destroy() {
                None
            } else {
                Some(model.raw()?)
            });
        }

        let _lock = self.write_lock.lock();

        let previous = self.current.read().clone();
        let mut working = (*previous.source()).clone();

        for (model, raw) in models.iter_mut().zip(raws) {
            let records = working.entry(model.path().to_string()).or_default();
            match raw {
                None => {
                    if let Some(id) = model.id() {
                        records.remove(id);
                    }
                }
                Some(raw) => {
                    let id = model.ensure_id(self.config.id_generator.as_ref());
                    records.insert(id, raw);
                }
            }
        }

        let snapshot = Snapshot::new(
            Arc::new(working),
            Arc::clone(&self.definition),
            self.next_version(),
            self.tag,
        );
        *self.current.write() = snapshot.clone();
        drop(_lock);

        debug!(models = models.len(), version = snapshot.version(), "commit");

        self.notify(&snapshot);
        Ok(snapshot)
    }

    // --- Snapshots ---

    /// The current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.current.read().clone()
    }

    /// Make `snapshot` current again.
    ///
    /// Accepts snapshots published by this store or by any store declaring
    /// the same model names. A snapshot of this store keeps its version; a
    /// foreign one is published under a fresh version.
    pub fn restore_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.check_notify_depth()?;

        let restored = if snapshot.store_tag() == self.tag {
            snapshot.clone()
        } else if snapshot.definition().same_models(&self.definition) {
            Snapshot::new(
                snapshot.source(),
                Arc::clone(&self.definition),
                self.next_version(),
                self.tag,
            )
        } else {
            return Err(ValuableError::InvalidSnapshot(format!(
                "snapshot from store {} does not match this store's models",
                snapshot.store_tag().0
            )));
        };

        {
            let _lock = self.write_lock.lock();
            *self.current.write() = restored.clone();
        }

        debug!(version = restored.version(), "snapshot restored");

        self.notify(&restored);
        Ok(())
    }

    // --- Observers ---

    /// Call `observer` with the new snapshot after every commit or restore.
    pub fn observe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.observers.write().register(Arc::new(observer))
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.observers.write().unregister(id)
    }

    fn notify(&self, snapshot: &Snapshot) {
        let listeners = self.observers.read().listeners();
        if listeners.is_empty() {
            return;
        }

        self.notify_depth.fetch_add(1, Ordering::SeqCst);
        let _guard = NotifyGuard {
            depth: &self.notify_depth,
        };
        for listener in listeners {
            listener(snapshot);
        }
    }

    fn check_notify_depth(&self) -> Result<()> {
        let depth = self.notify_depth.load(Ordering::SeqCst);
        if depth >= self.config.max_notify_depth {
            warn!(depth, "store notification depth limit reached, refusing write");
            return Err(ValuableError::ReentrancyLimit(self.config.max_notify_depth));
        }
        Ok(())
    }

    fn next_version(&self) -> u64 {
        self.last_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    // --- Introspection ---

    /// Declared model names.
    pub fn models(&self) -> Vec<String> {
        self.definition.names().map(str::to_string).collect()
    }

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Version of the current snapshot.
    pub fn version(&self) -> u64 {
        self.current.read().version()
    }

    fn schema(&self, model: &str) -> Result<Schema> {
        self.definition
            .get(model)
            .cloned()
            .ok_or_else(|| ValuableError::UnknownModel(model.to_string()))
    }
}

/// Leaves one level of store notification when dropped.
struct NotifyGuard<'a> {
    depth: &'a AtomicUsize,
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

impl HasSource for Store {
    fn source(&self) -> Arc<Source> {
        self.current.read().source()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("tag", &self.tag)
            .field("version", &self.version())
            .field("models", &self.models())
            .finish()
    }
}
