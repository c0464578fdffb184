//! The immutable script node graph and its asset loader.
//!
//! The engine does not parse script source text; it consumes a
//! pre-compiled asset ([`GraphAsset`], JSON via serde) in which every id
//! is still a readable name. Loading hashes the names, checks for hash
//! collisions and dangling references, and produces the [`ScriptGraph`]
//! the engine executes. Nodes are never mutated after load.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use skein_core::{LevelDef, StatCatalog, StringHash, TableKey, Variant};

use crate::bindings::BindingRegistry;
use crate::error::{EngineError, EngineResult};
use crate::step::{ChoiceDef, KEY_LOCATION, KEY_ONCE, KEY_TIME_COST, Step};

/// Per-node behavior flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// Entering this node for the first time writes a checkpoint.
    pub checkpoint: bool,
    /// The display should clear when this node is entered.
    pub clears_display: bool,
}

/// One immutable script node.
#[derive(Debug, Clone)]
pub struct ScriptNode {
    /// The node's hashed id.
    pub id: StringHash,
    /// The authored node name the id was hashed from.
    pub name: String,
    /// Behavior flags.
    pub flags: NodeFlags,
    /// The node a checkpoint taken here resumes at; the empty hash
    /// means "this node".
    pub checkpoint_id: StringHash,
    /// The executable body.
    pub body: Vec<Step>,
}

/// The pre-loaded, immutable node graph plus the script's level and
/// stat declarations.
#[derive(Debug, Clone)]
pub struct ScriptGraph {
    title: String,
    nodes: HashMap<StringHash, ScriptNode>,
    start_node: StringHash,
    levels: Vec<LevelDef>,
    stat_catalog: StatCatalog,
    binding_names: HashMap<StringHash, String>,
}

impl ScriptGraph {
    /// Build a graph from a deserialized asset, hashing every name and
    /// validating collisions and references.
    pub fn from_asset(asset: GraphAsset) -> EngineResult<Self> {
        let mut interner = NameInterner::default();
        let mut nodes = HashMap::new();
        let mut binding_names = HashMap::new();

        for node_asset in &asset.nodes {
            let id = interner.intern(&node_asset.name)?;
            if nodes.contains_key(&id) {
                return Err(EngineError::DuplicateNode(node_asset.name.clone()));
            }
            let node = build_node(node_asset, id, &mut interner, &mut binding_names)?;
            nodes.insert(id, node);
        }

        let start_node = interner.intern(&asset.start_node)?;
        let levels = asset
            .levels
            .iter()
            .map(|l| build_level(l, &mut interner))
            .collect::<EngineResult<Vec<_>>>()?;

        let graph = Self {
            title: asset.title,
            nodes,
            start_node,
            levels,
            stat_catalog: StatCatalog::new(asset.stats, asset.max_stat_value),
            binding_names,
        };
        graph.validate_references()?;
        Ok(graph)
    }

    fn validate_references(&self) -> EngineResult<()> {
        let check = |node: &str, target: StringHash, name: &str| {
            if target.is_empty() || self.nodes.contains_key(&target) {
                Ok(())
            } else {
                Err(EngineError::DanglingTarget {
                    node: node.to_string(),
                    target: name.to_string(),
                })
            }
        };

        if !self.nodes.contains_key(&self.start_node) {
            return Err(EngineError::NodeNotFound(self.start_node));
        }
        for level in &self.levels {
            if !level.start_node.is_empty() && !self.nodes.contains_key(&level.start_node) {
                return Err(EngineError::NodeNotFound(level.start_node));
            }
        }
        for node in self.nodes.values() {
            check(&node.name, node.checkpoint_id, "checkpoint target")?;
            for step in &node.body {
                match step {
                    Step::Goto(target) => check(&node.name, *target, "goto target")?,
                    Step::Choices(options) => {
                        for option in options {
                            check(&node.name, option.target, &option.text)?;
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Check that every `call` step in the graph has a registered host
    /// function. Resolution happens once here, not per call.
    pub fn validate_bindings(&self, registry: &BindingRegistry) -> EngineResult<()> {
        for (hash, name) in &self.binding_names {
            if !registry.contains(*hash) {
                return Err(EngineError::UnknownBinding(name.clone()));
            }
        }
        Ok(())
    }

    /// Look up a node by hashed id.
    pub fn get(&self, id: StringHash) -> Option<&ScriptNode> {
        self.nodes.get(&id)
    }

    /// Whether the graph contains a node.
    pub fn contains(&self, id: StringHash) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The node's authored name, if present.
    pub fn node_name(&self, id: StringHash) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.name.as_str())
    }

    /// Iterate all nodes in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = &ScriptNode> {
        self.nodes.values()
    }

    /// The number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The script's default entry node.
    pub fn start_node(&self) -> StringHash {
        self.start_node
    }

    /// The level declared at an index.
    pub fn level(&self, index: u32) -> Option<&LevelDef> {
        self.levels.iter().find(|l| l.level_index == index)
    }

    /// All declared levels.
    pub fn levels(&self) -> &[LevelDef] {
        &self.levels
    }

    /// The stat catalog player states run against.
    pub fn stat_catalog(&self) -> &StatCatalog {
        &self.stat_catalog
    }

    /// The script title.
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Tracks which name claimed each hash, so two distinct names colliding
/// on one hash fail the load instead of silently aliasing.
#[derive(Debug, Default)]
struct NameInterner {
    seen: HashMap<StringHash, String>,
}

impl NameInterner {
    fn intern(&mut self, name: &str) -> EngineResult<StringHash> {
        let hash = StringHash::hash(name);
        match self.seen.get(&hash) {
            Some(existing) if existing != name => Err(EngineError::HashCollision {
                existing: existing.clone(),
                incoming: name.to_string(),
            }),
            Some(_) => Ok(hash),
            None => {
                self.seen.insert(hash, name.to_string());
                Ok(hash)
            }
        }
    }
}

fn build_node(
    asset: &NodeAsset,
    id: StringHash,
    interner: &mut NameInterner,
    binding_names: &mut HashMap<StringHash, String>,
) -> EngineResult<ScriptNode> {
    let checkpoint_id = match &asset.checkpoint_target {
        Some(name) => interner.intern(name)?,
        None => StringHash::EMPTY,
    };
    let mut body = Vec::with_capacity(asset.steps.len());
    for step in &asset.steps {
        body.push(build_step(step, interner, binding_names)?);
    }
    Ok(ScriptNode {
        id,
        name: asset.name.clone(),
        flags: NodeFlags {
            checkpoint: asset.checkpoint,
            clears_display: asset.clears_display,
        },
        checkpoint_id,
        body,
    })
}

fn build_level(asset: &LevelAsset, interner: &mut NameInterner) -> EngineResult<LevelDef> {
    Ok(LevelDef {
        level_index: asset.level_index,
        story_group: interner.intern(&asset.story_group)?,
        slot_count: asset.slot_count,
        start_time_hours: asset.start_time_hours,
        start_node: interner.intern(&asset.start_node)?,
        start_location: interner.intern(&asset.start_location)?,
    })
}

fn build_step(
    asset: &StepAsset,
    interner: &mut NameInterner,
    binding_names: &mut HashMap<StringHash, String>,
) -> EngineResult<Step> {
    Ok(match asset {
        StepAsset::Line { text, tags } => Step::Line {
            text: text.clone(),
            tags: tags.clone(),
        },
        StepAsset::Choices { options } => {
            let mut defs = Vec::with_capacity(options.len());
            for option in options {
                defs.push(build_choice(option, interner)?);
            }
            Step::Choices(defs)
        }
        StepAsset::AdjustStats { spec } => Step::AdjustStats(spec.clone()),
        StepAsset::SetVar { key, value } => Step::SetVar {
            key: TableKey::parse(key).map_err(EngineError::Core)?,
            value: value.to_variant(),
        },
        StepAsset::AddFragment { fragment } => Step::AddFragment(interner.intern(fragment)?),
        StepAsset::AllocateFragment { slot, fragment } => Step::AllocateFragment {
            slot: *slot,
            fragment: interner.intern(fragment)?,
        },
        StepAsset::SetLocation { location } => Step::SetLocation(interner.intern(location)?),
        StepAsset::GrantTime { hours } => Step::GrantTime(*hours),
        StepAsset::SpendTime { hours } => Step::SpendTime(*hours),
        StepAsset::Call { binding, args } => {
            let hash = interner.intern(binding)?;
            binding_names.insert(hash, binding.clone());
            Step::Call {
                binding: hash,
                args: args.iter().map(ValueAsset::to_variant).collect(),
            }
        }
        StepAsset::Goto { target } => Step::Goto(interner.intern(target)?),
        StepAsset::End => Step::End,
    })
}

fn build_choice(asset: &ChoiceAsset, interner: &mut NameInterner) -> EngineResult<ChoiceDef> {
    let mut def = ChoiceDef::new(asset.text.clone(), interner.intern(&asset.target)?);
    if let Some(cost) = asset.time_cost {
        def.custom
            .insert(KEY_TIME_COST, Variant::Float(f64::from(cost)));
    }
    if asset.once {
        def.custom.insert(KEY_ONCE, Variant::Bool(true));
    }
    if let Some(location) = &asset.location {
        def.custom
            .insert(KEY_LOCATION, Variant::Str(interner.intern(location)?));
    }
    Ok(def)
}

fn default_max_stat() -> u16 {
    10
}

/// The serialized form of a script: names instead of hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphAsset {
    /// The script title.
    pub title: String,
    /// Ordered stat names.
    #[serde(default)]
    pub stats: Vec<String>,
    /// The shared stat ceiling.
    #[serde(default = "default_max_stat")]
    pub max_stat_value: u16,
    /// The default entry node.
    pub start_node: String,
    /// Declared levels.
    #[serde(default)]
    pub levels: Vec<LevelAsset>,
    /// All script nodes.
    pub nodes: Vec<NodeAsset>,
}

impl GraphAsset {
    /// Parse an asset from JSON text.
    pub fn from_json(text: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Serialized level declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelAsset {
    /// Position of the level in the script.
    pub level_index: u32,
    /// The story group fragments are scoped to.
    pub story_group: String,
    /// Number of fragment slots.
    #[serde(default)]
    pub slot_count: usize,
    /// Starting time budget in hours.
    #[serde(default)]
    pub start_time_hours: f32,
    /// The node a fresh run begins at.
    pub start_node: String,
    /// The player's starting location.
    #[serde(default)]
    pub start_location: String,
}

/// Serialized node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAsset {
    /// The node name (hashed into its id).
    pub name: String,
    /// Whether first entry writes a checkpoint.
    #[serde(default)]
    pub checkpoint: bool,
    /// Whether the display clears on entry.
    #[serde(default)]
    pub clears_display: bool,
    /// Where a checkpoint taken here resumes (defaults to this node).
    #[serde(default)]
    pub checkpoint_target: Option<String>,
    /// The body instructions.
    #[serde(default)]
    pub steps: Vec<StepAsset>,
}

/// Serialized body instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepAsset {
    /// Display a line.
    Line {
        /// The line text.
        text: String,
        /// Presentation tags.
        #[serde(default)]
        tags: Vec<String>,
    },
    /// Present a decision point.
    Choices {
        /// The candidate options.
        options: Vec<ChoiceAsset>,
    },
    /// Apply a batch stat adjustment.
    AdjustStats {
        /// The adjustment spec.
        spec: String,
    },
    /// Write a variable.
    SetVar {
        /// The `table:key` string.
        key: String,
        /// The value to store.
        value: ValueAsset,
    },
    /// Collect a story fragment.
    AddFragment {
        /// The fragment name.
        fragment: String,
    },
    /// Place a fragment into a story slot.
    AllocateFragment {
        /// The slot index.
        slot: usize,
        /// The fragment name.
        fragment: String,
    },
    /// Move the player.
    SetLocation {
        /// The location name.
        location: String,
    },
    /// Grant time in hours.
    GrantTime {
        /// Hours granted.
        hours: f32,
    },
    /// Spend time in hours.
    SpendTime {
        /// Hours spent.
        hours: f32,
    },
    /// Invoke a host binding.
    Call {
        /// The binding name.
        binding: String,
        /// Pass-through arguments.
        #[serde(default)]
        args: Vec<ValueAsset>,
    },
    /// Jump to another node.
    Goto {
        /// The target node name.
        target: String,
    },
    /// End the thread.
    End,
}

/// Serialized choice option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceAsset {
    /// The option text.
    pub text: String,
    /// The target node name.
    pub target: String,
    /// Time cost in hours.
    #[serde(default)]
    pub time_cost: Option<f32>,
    /// Once-only flag.
    #[serde(default)]
    pub once: bool,
    /// Location the option moves the player to.
    #[serde(default)]
    pub location: Option<String>,
}

/// Serialized variant value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueAsset {
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string, hashed on load.
    Str(String),
}

impl ValueAsset {
    fn to_variant(&self) -> Variant {
        match self {
            ValueAsset::Bool(b) => Variant::Bool(*b),
            ValueAsset::Int(n) => Variant::Int(*n),
            ValueAsset::Float(x) => Variant::Float(*x),
            ValueAsset::Str(s) => Variant::Str(StringHash::hash(s)),
        }
    }
}
