//! The session orchestrator.
//!
//! A [`Session`] ties one [`Engine`] to one [`SessionContext`] and a
//! checkpoint store, and relays notifications outward. It owns the
//! level lifecycle: starting a level resets the save to the level's
//! defaults, and an in-progress level is checkpointed before being left
//! so the previous level stays resumable.

use std::path::PathBuf;

use skein_core::{Event, PlayerState, StringHash};

use crate::bindings::BindingRegistry;
use crate::config::EngineConfig;
use crate::context::SessionContext;
use crate::error::{EngineError, EngineResult};
use crate::graph::{GraphAsset, ScriptGraph};
use crate::step::Step;
use crate::thread::{Engine, Signal, ThreadHandle, ThreadHooks};

/// Where checkpointed saves go.
pub trait CheckpointStore {
    /// Persist a save, replacing any previous checkpoint.
    fn save(&mut self, state: &PlayerState) -> EngineResult<()>;
    /// Load the most recent checkpoint, if one exists.
    fn load(&self) -> EngineResult<Option<PlayerState>>;
}

/// An in-process store holding the latest checkpoint.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    saved: Option<PlayerState>,
}

impl MemoryCheckpointStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn save(&mut self, state: &PlayerState) -> EngineResult<()> {
        self.saved = Some(state.clone());
        Ok(())
    }

    fn load(&self) -> EngineResult<Option<PlayerState>> {
        Ok(self.saved.clone())
    }
}

/// A store persisting the checkpoint as a JSON file.
#[derive(Debug)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    /// A store backed by the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn save(&mut self, state: &PlayerState) -> EngineResult<()> {
        let text = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    fn load(&self) -> EngineResult<Option<PlayerState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}

/// Where a script asset comes from.
pub trait ScriptSource {
    /// Load the serialized script.
    fn load(&self) -> EngineResult<GraphAsset>;
}

/// A script asset loaded from a JSON file on disk.
#[derive(Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// A source backed by the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScriptSource for JsonFileSource {
    fn load(&self) -> EngineResult<GraphAsset> {
        let text = std::fs::read_to_string(&self.path)?;
        GraphAsset::from_json(&text)
    }
}

/// One playthrough: engine, save, checkpoint store, and the relay that
/// carries notifications out to the host.
pub struct Session {
    engine: Engine,
    ctx: SessionContext,
    store: Box<dyn CheckpointStore>,
    outbox: Vec<Event>,
}

impl Session {
    /// A session over a loaded graph, with a fresh save and an in-memory
    /// checkpoint store.
    pub fn new(graph: ScriptGraph, config: EngineConfig) -> Self {
        let player = PlayerState::new(graph.stat_catalog().clone());
        Self {
            engine: Engine::new(graph, config),
            ctx: SessionContext::new(player),
            store: Box::new(MemoryCheckpointStore::new()),
            outbox: Vec::new(),
        }
    }

    /// A session whose script comes from a source.
    pub fn from_source(source: &dyn ScriptSource, config: EngineConfig) -> EngineResult<Self> {
        let graph = ScriptGraph::from_asset(source.load()?)?;
        Ok(Self::new(graph, config))
    }

    /// Replace the checkpoint store.
    pub fn with_store(mut self, store: Box<dyn CheckpointStore>) -> Self {
        self.store = store;
        self
    }

    /// Attach host bindings, validating every `call` step resolves.
    pub fn with_bindings(mut self, bindings: BindingRegistry) -> EngineResult<Self> {
        self.engine = self.engine.with_bindings(bindings)?;
        Ok(self)
    }

    /// Attach traversal hooks.
    pub fn with_hooks(mut self, hooks: Box<dyn ThreadHooks>) -> Self {
        self.engine = self.engine.with_hooks(hooks);
        self
    }

    /// The active save.
    pub fn player(&self) -> &PlayerState {
        &self.ctx.player
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Start a thread at the script's default entry node.
    pub fn start(&mut self) -> EngineResult<ThreadHandle> {
        let start = self.engine.graph().start_node();
        self.start_at(start)
    }

    /// Start a thread at an arbitrary node, superseding any live thread.
    pub fn start_at(&mut self, node: StringHash) -> EngineResult<ThreadHandle> {
        let handle = self.engine.run(&mut self.ctx, node)?;
        self.relay()?;
        Ok(handle)
    }

    /// Start (or restart) a declared level.
    ///
    /// If a different level was in progress, its state as of this call
    /// is checkpointed first, then the save resets to the new level's
    /// defaults and a thread starts at its entry node.
    pub fn start_level(&mut self, index: u32) -> EngineResult<ThreadHandle> {
        let level = self
            .engine
            .graph()
            .level(index)
            .cloned()
            .ok_or(EngineError::LevelNotFound(index))?;

        if let Some(prior) = self.ctx.player.setup_level(&level, &mut self.ctx.events) {
            self.store.save(&prior)?;
            self.ctx.events.push(Event::CheckpointSaved);
        }
        let start = if level.start_node.is_empty() {
            self.engine.graph().start_node()
        } else {
            level.start_node
        };
        let handle = self.engine.run(&mut self.ctx, start)?;
        self.relay()?;
        Ok(handle)
    }

    /// Load the stored checkpoint and resume a thread at its node.
    pub fn resume_from_checkpoint(&mut self) -> EngineResult<ThreadHandle> {
        let state = self.store.load()?.ok_or(EngineError::NoCheckpoint)?;
        let node = state.checkpoint_node();
        if node.is_empty() {
            return Err(EngineError::NoCheckpoint);
        }
        self.ctx.player = state;
        let handle = self.engine.run(&mut self.ctx, node)?;
        self.relay()?;
        Ok(handle)
    }

    /// Run to the next suspension point.
    pub fn advance(&mut self) -> EngineResult<Signal> {
        let signal = self.engine.advance(&mut self.ctx)?;
        self.relay()?;
        Ok(signal)
    }

    /// Resolve the pending decision point.
    pub fn choose(&mut self, index: usize) -> EngineResult<()> {
        self.engine.choose(&mut self.ctx, index)?;
        self.relay()
    }

    /// Debug jump to an arbitrary node, superseding the live thread.
    pub fn skip_to(&mut self, node: StringHash) -> EngineResult<ThreadHandle> {
        let handle = self.engine.skip_to(&mut self.ctx, node)?;
        self.relay()?;
        Ok(handle)
    }

    /// Inject a unit of work on top of the live thread.
    pub fn interrupt(&mut self, steps: Vec<Step>) -> EngineResult<()> {
        self.engine.interrupt(steps)
    }

    /// Drain the relayed notifications accumulated so far.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    /// Move queued notifications to the outbox, servicing checkpoint
    /// requests along the way: each request saves the current state and
    /// is followed by a saved confirmation.
    fn relay(&mut self) -> EngineResult<()> {
        for event in self.ctx.events.drain() {
            let is_request = matches!(event, Event::CheckpointRequested { .. });
            self.outbox.push(event);
            if is_request {
                self.store.save(&self.ctx.player)?;
                self.outbox.push(Event::CheckpointSaved);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("engine", &self.engine)
            .field("outbox", &self.outbox.len())
            .finish()
    }
}
