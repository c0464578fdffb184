//! The cooperative thread execution engine.
//!
//! Exactly one logical thread is ever active. The caller drives it one
//! [`Signal`] at a time: `advance` runs to the next suspension point
//! (a line awaiting acknowledgement, a decision point awaiting a
//! choice, or the end of the thread), and `choose` resolves a pending
//! decision. Calling [`Engine::run`] again at any point is a hard
//! cut-over: the previous thread and any pending interruption are
//! discarded with no drain.
//!
//! Interrupts — entry/exit hook work and step lists injected by host
//! bindings or external code — do not create concurrency. They are
//! extra frames on the same cursor and always run to completion before
//! the interrupted continuation resumes.

use skein_core::{Event, StringHash};

use crate::bindings::BindingRegistry;
use crate::choice;
use crate::config::EngineConfig;
use crate::context::SessionContext;
use crate::error::{EngineError, EngineResult};
use crate::graph::ScriptGraph;
use crate::step::{ChoiceDef, Step};

/// Identifies one thread across supersessions. An interruption resolved
/// against a stale handle can detect that its thread is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadHandle(u64);

/// What the engine yielded control for.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A line to display. The next `advance` acknowledges it.
    Line {
        /// The line text.
        text: String,
        /// Presentation tags.
        tags: Vec<String>,
    },
    /// A decision point. The available options, in authoring order;
    /// resolve with [`Engine::choose`]. Advancing again instead
    /// re-filters and re-presents.
    Choices(Vec<ChoiceDef>),
    /// The thread ran out of nodes.
    Ended {
        /// The node the thread ended on.
        node: StringHash,
    },
}

/// External hook points around node traversal.
///
/// A hook may return steps, which the engine runs as an interrupt: node
/// entry work always completes before the node's own body, and exit
/// work before the next node's entry.
pub trait ThreadHooks {
    /// Called after a node is entered and marked visited, before its
    /// body runs.
    fn on_node_enter(
        &mut self,
        _ctx: &mut SessionContext,
        _node: StringHash,
        _first_visit: bool,
    ) -> Option<Vec<Step>> {
        None
    }

    /// Called when the cursor leaves a node, before the next entry.
    fn on_node_exit(&mut self, _ctx: &mut SessionContext, _node: StringHash) -> Option<Vec<Step>> {
        None
    }

    /// Called when the thread ends.
    fn on_thread_stopped(&mut self, _ctx: &mut SessionContext, _node: StringHash) {}
}

/// The no-op hook set.
#[derive(Debug, Default)]
pub struct NoHooks;

impl ThreadHooks for NoHooks {}

#[derive(Debug)]
struct Frame {
    steps: Vec<Step>,
    pc: usize,
}

impl Frame {
    fn new(steps: Vec<Step>) -> Self {
        Self { steps, pc: 0 }
    }

    fn next(&mut self) -> Option<Step> {
        let step = self.steps.get(self.pc).cloned();
        if step.is_some() {
            self.pc += 1;
        }
        step
    }

    fn peek(&self) -> Option<&Step> {
        self.steps.get(self.pc)
    }
}

#[derive(Debug)]
enum Wait {
    /// A line awaits acknowledgement.
    Line,
    /// A decision point awaits a choice.
    Choice {
        /// The full candidate list, re-filtered on every presentation.
        options: Vec<ChoiceDef>,
        /// The list as last presented; `choose` indexes into this.
        presented: Vec<ChoiceDef>,
        /// Frame depth at suspension; interrupt frames above it run
        /// before the choice is re-presented.
        depth: usize,
    },
}

#[derive(Debug)]
struct Thread {
    handle: ThreadHandle,
    node: StringHash,
    frames: Vec<Frame>,
    wait: Option<Wait>,
    pending_entry: Option<StringHash>,
}

/// Drives one cooperative cursor through a [`ScriptGraph`].
pub struct Engine {
    graph: ScriptGraph,
    config: EngineConfig,
    bindings: BindingRegistry,
    hooks: Box<dyn ThreadHooks>,
    thread: Option<Thread>,
    next_handle: u64,
    last_node: StringHash,
}

impl Engine {
    /// An engine over a loaded graph with no bindings and no hooks.
    pub fn new(graph: ScriptGraph, config: EngineConfig) -> Self {
        Self {
            graph,
            config,
            bindings: BindingRegistry::new(),
            hooks: Box::new(NoHooks),
            thread: None,
            next_handle: 0,
            last_node: StringHash::EMPTY,
        }
    }

    /// Attach a binding registry, validating that every `call` step in
    /// the graph resolves.
    pub fn with_bindings(mut self, bindings: BindingRegistry) -> EngineResult<Self> {
        self.graph.validate_bindings(&bindings)?;
        self.bindings = bindings;
        Ok(self)
    }

    /// Attach traversal hooks.
    pub fn with_hooks(mut self, hooks: Box<dyn ThreadHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// The graph being executed.
    pub fn graph(&self) -> &ScriptGraph {
        &self.graph
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The handle of the live thread, if any.
    pub fn active_handle(&self) -> Option<ThreadHandle> {
        self.thread.as_ref().map(|t| t.handle)
    }

    /// The last node any thread entered.
    pub fn last_node(&self) -> StringHash {
        self.last_node
    }

    /// Start a new thread at a node, unconditionally superseding any
    /// live thread. There is no drain: the old thread's suspended
    /// continuation and pending interrupts are simply discarded.
    pub fn run(&mut self, ctx: &mut SessionContext, start: StringHash) -> EngineResult<ThreadHandle> {
        if let Some(old) = self.thread.take() {
            tracing::debug!(superseded = ?old.handle, "thread superseded by new run");
        }
        self.next_handle += 1;
        let handle = ThreadHandle(self.next_handle);
        self.thread = Some(Thread {
            handle,
            node: StringHash::EMPTY,
            frames: Vec::new(),
            wait: None,
            pending_entry: None,
        });
        if let Err(err) = self.enter_node(ctx, start) {
            self.thread = None;
            return Err(err);
        }
        Ok(handle)
    }

    /// Kill the live thread without starting another. Returns whether
    /// one was running.
    pub fn kill(&mut self) -> bool {
        self.thread.take().is_some()
    }

    /// Debug jump: supersede the live thread with one rooted at an
    /// arbitrary node. Only the destination's normal entry logic runs —
    /// nothing between here and there happens retroactively.
    pub fn skip_to(
        &mut self,
        ctx: &mut SessionContext,
        node: StringHash,
    ) -> EngineResult<ThreadHandle> {
        tracing::debug!(%node, "skip to node");
        self.run(ctx, node)
    }

    /// Inject a unit of work on top of the live thread. It runs to
    /// completion (or is superseded) before the thread's own
    /// continuation resumes.
    pub fn interrupt(&mut self, steps: Vec<Step>) -> EngineResult<()> {
        let thread = self.thread.as_mut().ok_or(EngineError::NoActiveThread)?;
        thread.frames.push(Frame::new(steps));
        Ok(())
    }

    /// Whether the next suspension will be a decision point.
    pub fn next_is_choice(&self) -> bool {
        let Some(thread) = self.thread.as_ref() else {
            return false;
        };
        if let Some(Wait::Choice { depth, .. }) = &thread.wait {
            if thread.frames.len() <= *depth {
                return true;
            }
        }
        matches!(self.peek_step(), Some(Step::Choices(_)))
    }

    /// Non-destructive look-ahead at the next line, if the immediate
    /// next step is one.
    pub fn peek_line(&self) -> Option<&str> {
        match self.peek_step() {
            Some(Step::Line { text, .. }) => Some(text),
            _ => None,
        }
    }

    fn peek_step(&self) -> Option<&Step> {
        let thread = self.thread.as_ref()?;
        thread.frames.iter().rev().find_map(Frame::peek)
    }

    /// Run to the next suspension point.
    ///
    /// If a line was pending, advancing acknowledges it. If a choice
    /// was pending, advancing runs any injected interrupt work and then
    /// re-presents the (re-filtered) options.
    pub fn advance(&mut self, ctx: &mut SessionContext) -> EngineResult<Signal> {
        {
            let thread = self.thread.as_mut().ok_or(EngineError::NoActiveThread)?;
            if matches!(thread.wait, Some(Wait::Line)) {
                thread.wait = None;
            }
        }
        let mut steps_taken = 0usize;
        loop {
            // A goto cycle with no line or choice would otherwise never
            // return control.
            steps_taken += 1;
            if steps_taken > self.config.step_budget {
                self.thread = None;
                return Err(EngineError::RunawayScript {
                    limit: self.config.step_budget,
                });
            }
            // A waiting decision point resumes presentation once no
            // interrupt frames remain above it.
            let represent = {
                let thread = self.thread.as_ref().ok_or(EngineError::NoActiveThread)?;
                matches!(&thread.wait, Some(Wait::Choice { depth, .. }) if thread.frames.len() <= *depth)
            };
            if represent {
                return self.present_choices(ctx);
            }

            let step = {
                let thread = self.thread.as_mut().ok_or(EngineError::NoActiveThread)?;
                match thread.frames.last_mut() {
                    Some(frame) => {
                        let step = frame.next();
                        if step.is_none() {
                            thread.frames.pop();
                            continue;
                        }
                        step
                    }
                    None => None,
                }
            };

            match step {
                Some(step) => {
                    if let Some(signal) = self.execute(ctx, step)? {
                        return Ok(signal);
                    }
                }
                None => {
                    let pending = self
                        .thread
                        .as_mut()
                        .ok_or(EngineError::NoActiveThread)?
                        .pending_entry
                        .take();
                    match pending {
                        Some(target) => self.enter_node(ctx, target)?,
                        None => return self.end_thread(ctx),
                    }
                }
            }
        }
    }

    /// Resolve a pending decision point by index into the presented
    /// list. A positive time cost is deducted through the standard
    /// time path, so expiry notifications apply uniformly.
    pub fn choose(&mut self, ctx: &mut SessionContext, index: usize) -> EngineResult<()> {
        let def = {
            let thread = self.thread.as_mut().ok_or(EngineError::NoActiveThread)?;
            match &thread.wait {
                Some(Wait::Choice { presented, .. }) => presented
                    .get(index)
                    .cloned()
                    .ok_or(EngineError::InvalidChoice(index))?,
                _ => return Err(EngineError::NotAwaitingChoice),
            }
        };
        let cost = def.time_cost();
        if cost > 0.0 {
            ctx.player.decrease_time(cost, &mut ctx.events);
        }
        if let Some(location) = def.location() {
            ctx.player.set_location(location, &mut ctx.events);
        }
        ctx.events.push(Event::ChoiceCompleted { target: def.target });
        self.begin_transition(ctx, def.target)
    }

    fn execute(&mut self, ctx: &mut SessionContext, step: Step) -> EngineResult<Option<Signal>> {
        match step {
            Step::Line { text, tags } => {
                let thread = self.thread.as_mut().ok_or(EngineError::NoActiveThread)?;
                thread.wait = Some(Wait::Line);
                Ok(Some(Signal::Line { text, tags }))
            }
            Step::Choices(options) => {
                {
                    let thread = self.thread.as_mut().ok_or(EngineError::NoActiveThread)?;
                    let depth = thread.frames.len();
                    thread.wait = Some(Wait::Choice {
                        options,
                        presented: Vec::new(),
                        depth,
                    });
                }
                self.present_choices(ctx).map(Some)
            }
            Step::AdjustStats(spec) => {
                ctx.player.adjust_stats(&spec, true, &mut ctx.events)?;
                Ok(None)
            }
            Step::SetVar { key, value } => {
                ctx.player.vars_mut().write(key, value, &mut ctx.events);
                Ok(None)
            }
            Step::AddFragment(id) => {
                ctx.player.add_story_fragment(id, &mut ctx.events);
                Ok(None)
            }
            Step::AllocateFragment { slot, fragment } => {
                // Misallocation is an authoring slip, not worth halting
                // the thread over.
                if let Err(err) = ctx.player.allocate_fragment(slot, fragment) {
                    tracing::warn!(%err, "fragment allocation skipped");
                }
                Ok(None)
            }
            Step::SetLocation(location) => {
                ctx.player.set_location(location, &mut ctx.events);
                Ok(None)
            }
            Step::GrantTime(hours) => {
                ctx.player.increase_time(hours, &mut ctx.events);
                Ok(None)
            }
            Step::SpendTime(hours) => {
                ctx.player.decrease_time(hours, &mut ctx.events);
                Ok(None)
            }
            Step::Call { binding, args } => {
                if let Some(steps) = self.bindings.call(binding, ctx, &args)? {
                    let thread = self.thread.as_mut().ok_or(EngineError::NoActiveThread)?;
                    thread.frames.push(Frame::new(steps));
                }
                Ok(None)
            }
            Step::Goto(target) => {
                self.begin_transition(ctx, target)?;
                Ok(None)
            }
            Step::End => {
                let thread = self.thread.as_mut().ok_or(EngineError::NoActiveThread)?;
                thread.frames.clear();
                thread.wait = None;
                thread.pending_entry = None;
                Ok(None)
            }
        }
    }

    fn present_choices(&mut self, ctx: &mut SessionContext) -> EngineResult<Signal> {
        let (options, depth) = {
            let thread = self.thread.as_ref().ok_or(EngineError::NoActiveThread)?;
            match &thread.wait {
                Some(Wait::Choice { options, depth, .. }) => (options.clone(), *depth),
                _ => return Err(EngineError::NotAwaitingChoice),
            }
        };
        let presented = choice::presentable(&options, &ctx.player, self.config.max_choices);
        if presented.is_empty() && self.config.headless {
            tracing::error!(node = %self.last_node, "no available choices in headless run");
            return Err(EngineError::NoAvailableChoices {
                node: self.last_node,
            });
        }
        let thread = self.thread.as_mut().ok_or(EngineError::NoActiveThread)?;
        thread.wait = Some(Wait::Choice {
            options,
            presented: presented.clone(),
            depth,
        });
        Ok(Signal::Choices(presented))
    }

    /// Leave the current node: emit the exit notification, run the exit
    /// hook's work (if any) as an interrupt, and queue entry into the
    /// target once that work completes.
    fn begin_transition(&mut self, ctx: &mut SessionContext, target: StringHash) -> EngineResult<()> {
        let node = self.thread.as_ref().ok_or(EngineError::NoActiveThread)?.node;
        ctx.events.push(Event::NodeExited { node });
        let exit_steps = self.hooks.on_node_exit(ctx, node);
        let thread = self.thread.as_mut().ok_or(EngineError::NoActiveThread)?;
        thread.wait = None;
        thread.frames.clear();
        thread.pending_entry = Some(target);
        if let Some(steps) = exit_steps {
            thread.frames.push(Frame::new(steps));
        }
        Ok(())
    }

    fn enter_node(&mut self, ctx: &mut SessionContext, id: StringHash) -> EngineResult<()> {
        let (body, flags, checkpoint_target) = {
            let node = self.graph.get(id).ok_or(EngineError::NodeNotFound(id))?;
            let checkpoint_target = if node.checkpoint_id.is_empty() {
                id
            } else {
                node.checkpoint_id
            };
            (node.body.clone(), node.flags, checkpoint_target)
        };

        self.last_node = id;
        let first_visit = !ctx.player.visited(id);
        if flags.checkpoint && first_visit {
            ctx.player.set_checkpoint(checkpoint_target);
            ctx.events.push(Event::CheckpointRequested {
                node: checkpoint_target,
            });
        }
        ctx.player.mark_visited(id);
        ctx.events.push(Event::NodeEntered {
            node: id,
            first_visit,
            clears_display: flags.clears_display,
        });

        {
            let thread = self.thread.as_mut().ok_or(EngineError::NoActiveThread)?;
            thread.node = id;
            thread.frames.push(Frame::new(body));
        }
        let entry_steps = self.hooks.on_node_enter(ctx, id, first_visit);
        if let Some(steps) = entry_steps {
            let thread = self.thread.as_mut().ok_or(EngineError::NoActiveThread)?;
            thread.frames.push(Frame::new(steps));
        }
        Ok(())
    }

    fn end_thread(&mut self, ctx: &mut SessionContext) -> EngineResult<Signal> {
        let thread = self.thread.take().ok_or(EngineError::NoActiveThread)?;
        let node = thread.node;
        ctx.events.push(Event::ThreadStopped { node });
        self.hooks.on_thread_stopped(ctx, node);

        let name = self.graph.node_name(node).unwrap_or("");
        if !name
            .to_lowercase()
            .ends_with(&self.config.terminal_suffix.to_lowercase())
        {
            tracing::warn!(
                %node,
                name,
                suffix = self.config.terminal_suffix,
                "thread ended outside a terminal node"
            );
        }
        Ok(Signal::Ended { node })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("graph", &self.graph.title())
            .field("active", &self.active_handle())
            .field("last_node", &self.last_node)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ChoiceAsset, GraphAsset, NodeAsset, StepAsset};
    use skein_core::PlayerState;

    fn node(name: &str, steps: Vec<StepAsset>) -> NodeAsset {
        NodeAsset {
            name: name.to_string(),
            checkpoint: false,
            clears_display: false,
            checkpoint_target: None,
            steps,
        }
    }

    fn line(text: &str) -> StepAsset {
        StepAsset::Line {
            text: text.to_string(),
            tags: vec![],
        }
    }

    fn goto(target: &str) -> StepAsset {
        StepAsset::Goto {
            target: target.to_string(),
        }
    }

    fn option(text: &str, target: &str) -> ChoiceAsset {
        ChoiceAsset {
            text: text.to_string(),
            target: target.to_string(),
            time_cost: None,
            once: false,
            location: None,
        }
    }

    fn graph_of(nodes: Vec<NodeAsset>) -> ScriptGraph {
        let start_node = nodes[0].name.clone();
        ScriptGraph::from_asset(GraphAsset {
            title: "test".to_string(),
            stats: vec!["Nerve".to_string()],
            max_stat_value: 10,
            start_node,
            levels: vec![],
            nodes,
        })
        .unwrap()
    }

    fn engine_of(nodes: Vec<NodeAsset>) -> (Engine, SessionContext) {
        let graph = graph_of(nodes);
        let catalog = graph.stat_catalog().clone();
        (
            Engine::new(graph, EngineConfig::default()),
            SessionContext::new(PlayerState::new(catalog)),
        )
    }

    #[test]
    fn lines_suspend_until_acknowledged() {
        let (mut engine, mut ctx) = engine_of(vec![node(
            "intro_feedback",
            vec![line("one"), line("two"), StepAsset::End],
        )]);
        engine.run(&mut ctx, StringHash::hash("intro_feedback")).unwrap();

        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Line { text, .. } if text == "one"
        ));
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Line { text, .. } if text == "two"
        ));
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Ended { .. }
        ));
    }

    #[test]
    fn goto_transitions_between_nodes() {
        let (mut engine, mut ctx) = engine_of(vec![
            node("a", vec![line("in a"), goto("b_feedback")]),
            node("b_feedback", vec![line("in b"), StepAsset::End]),
        ]);
        engine.run(&mut ctx, StringHash::hash("a")).unwrap();

        engine.advance(&mut ctx).unwrap();
        let signal = engine.advance(&mut ctx).unwrap();
        assert!(matches!(signal, Signal::Line { text, .. } if text == "in b"));
        assert!(ctx.player.visited(StringHash::hash("b_feedback")));
    }

    #[test]
    fn choices_suspend_and_resolve() {
        let (mut engine, mut ctx) = engine_of(vec![
            node(
                "fork",
                vec![StepAsset::Choices {
                    options: vec![option("left", "left_feedback"), option("right", "right_feedback")],
                }],
            ),
            node("left_feedback", vec![StepAsset::End]),
            node("right_feedback", vec![StepAsset::End]),
        ]);
        engine.run(&mut ctx, StringHash::hash("fork")).unwrap();

        let Signal::Choices(options) = engine.advance(&mut ctx).unwrap() else {
            panic!("expected choices");
        };
        assert_eq!(options.len(), 2);

        engine.choose(&mut ctx, 1).unwrap();
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Ended { node } if node == StringHash::hash("right_feedback")
        ));
        assert!(
            ctx.events
                .events()
                .iter()
                .any(|e| matches!(e, Event::ChoiceCompleted { target } if *target == StringHash::hash("right_feedback")))
        );
    }

    #[test]
    fn run_supersedes_suspended_thread() {
        let (mut engine, mut ctx) = engine_of(vec![
            node(
                "fork",
                vec![
                    StepAsset::Choices {
                        options: vec![option("stay", "stay_feedback")],
                    },
                ],
            ),
            node("stay_feedback", vec![StepAsset::End]),
            node("other_feedback", vec![line("other"), StepAsset::End]),
        ]);
        let first = engine.run(&mut ctx, StringHash::hash("fork")).unwrap();
        let Signal::Choices(_) = engine.advance(&mut ctx).unwrap() else {
            panic!("expected choices");
        };

        // Supersede while suspended awaiting the choice.
        let second = engine.run(&mut ctx, StringHash::hash("other_feedback")).unwrap();
        assert_ne!(first, second);
        assert_eq!(engine.active_handle(), Some(second));

        // The old continuation is gone: choosing now is an error, and
        // advancing runs the new thread.
        assert!(matches!(
            engine.choose(&mut ctx, 0),
            Err(EngineError::NotAwaitingChoice)
        ));
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Line { text, .. } if text == "other"
        ));
    }

    #[test]
    fn checkpoint_written_on_first_entry_only() {
        let mut nodes = vec![
            node("cp", vec![line("here"), StepAsset::End]),
        ];
        nodes[0].checkpoint = true;
        let (mut engine, mut ctx) = engine_of(nodes);

        let cp = StringHash::hash("cp");
        engine.run(&mut ctx, cp).unwrap();
        assert_eq!(ctx.player.checkpoint_node(), cp);
        let requests = ctx
            .events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, Event::CheckpointRequested { .. }))
            .count();
        assert_eq!(requests, 1);

        // Re-entering a visited checkpoint node requests nothing.
        engine.run(&mut ctx, cp).unwrap();
        assert!(
            !ctx.events
                .events()
                .iter()
                .any(|e| matches!(e, Event::CheckpointRequested { .. }))
        );
    }

    #[test]
    fn checkpoint_target_overrides_node_id() {
        let mut nodes = vec![
            node("scene", vec![StepAsset::End]),
            node("resume_point", vec![StepAsset::End]),
        ];
        nodes[0].checkpoint = true;
        nodes[0].checkpoint_target = Some("resume_point".to_string());
        let (mut engine, mut ctx) = engine_of(nodes);

        engine.run(&mut ctx, StringHash::hash("scene")).unwrap();
        assert_eq!(ctx.player.checkpoint_node(), StringHash::hash("resume_point"));
    }

    #[test]
    fn entry_hook_work_runs_before_body() {
        struct EnterHook;
        impl ThreadHooks for EnterHook {
            fn on_node_enter(
                &mut self,
                _ctx: &mut SessionContext,
                _node: StringHash,
                _first_visit: bool,
            ) -> Option<Vec<Step>> {
                Some(vec![Step::Line {
                    text: "hook first".to_string(),
                    tags: vec![],
                }])
            }
        }

        let graph = graph_of(vec![node("n_feedback", vec![line("body"), StepAsset::End])]);
        let catalog = graph.stat_catalog().clone();
        let mut engine =
            Engine::new(graph, EngineConfig::default()).with_hooks(Box::new(EnterHook));
        let mut ctx = SessionContext::new(PlayerState::new(catalog));

        engine.run(&mut ctx, StringHash::hash("n_feedback")).unwrap();
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Line { text, .. } if text == "hook first"
        ));
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Line { text, .. } if text == "body"
        ));
    }

    #[test]
    fn interrupt_runs_before_continuation() {
        let (mut engine, mut ctx) = engine_of(vec![node(
            "n_feedback",
            vec![line("one"), line("two"), StepAsset::End],
        )]);
        engine.run(&mut ctx, StringHash::hash("n_feedback")).unwrap();
        engine.advance(&mut ctx).unwrap(); // "one" pending ack

        engine
            .interrupt(vec![Step::Line {
                text: "injected".to_string(),
                tags: vec![],
            }])
            .unwrap();

        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Line { text, .. } if text == "injected"
        ));
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Line { text, .. } if text == "two"
        ));
    }

    #[test]
    fn choice_wait_represents_after_interrupt() {
        let (mut engine, mut ctx) = engine_of(vec![
            node(
                "fork",
                vec![StepAsset::Choices {
                    options: vec![option("go", "go_feedback")],
                }],
            ),
            node("go_feedback", vec![StepAsset::End]),
        ]);
        engine.run(&mut ctx, StringHash::hash("fork")).unwrap();
        let Signal::Choices(_) = engine.advance(&mut ctx).unwrap() else {
            panic!("expected choices");
        };

        engine
            .interrupt(vec![Step::Line {
                text: "meanwhile".to_string(),
                tags: vec![],
            }])
            .unwrap();
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Line { text, .. } if text == "meanwhile"
        ));
        // Interrupt done: the decision point comes back.
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Choices(options) if options.len() == 1
        ));
        engine.choose(&mut ctx, 0).unwrap();
    }

    #[test]
    fn repolling_choices_refilters_against_state() {
        let (mut engine, mut ctx) = engine_of(vec![
            node(
                "fork",
                vec![StepAsset::Choices {
                    options: vec![
                        ChoiceAsset {
                            text: "visit once".to_string(),
                            target: "shrine".to_string(),
                            time_cost: None,
                            once: true,
                            location: None,
                        },
                        option("wait", "wait_feedback"),
                    ],
                }],
            ),
            node("shrine", vec![StepAsset::End]),
            node("wait_feedback", vec![StepAsset::End]),
        ]);
        engine.run(&mut ctx, StringHash::hash("fork")).unwrap();

        let Signal::Choices(options) = engine.advance(&mut ctx).unwrap() else {
            panic!("expected choices");
        };
        assert_eq!(options.len(), 2);

        // Something external marks the once-target visited; re-polling
        // must drop the option, never re-add one.
        ctx.player.mark_visited(StringHash::hash("shrine"));
        let Signal::Choices(options) = engine.advance(&mut ctx).unwrap() else {
            panic!("expected choices");
        };
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].text, "wait");
    }

    #[test]
    fn choice_cost_flows_through_time_budget() {
        let (mut engine, mut ctx) = engine_of(vec![
            node(
                "fork",
                vec![StepAsset::Choices {
                    options: vec![ChoiceAsset {
                        text: "last errand".to_string(),
                        target: "done_feedback".to_string(),
                        time_cost: Some(2.0),
                        once: false,
                        location: None,
                    }],
                }],
            ),
            node("done_feedback", vec![StepAsset::End]),
        ]);
        ctx.player.set_time_remaining(2.0, &mut ctx.events);
        ctx.events.drain();

        engine.run(&mut ctx, StringHash::hash("fork")).unwrap();
        engine.advance(&mut ctx).unwrap();
        engine.choose(&mut ctx, 0).unwrap();

        assert_eq!(ctx.player.time_remaining_hours(), 0.0);
        let events = ctx.events.drain();
        let changed = events
            .iter()
            .position(|e| matches!(e, Event::TimeChanged { .. }))
            .unwrap();
        let expired = events
            .iter()
            .position(|e| matches!(e, Event::TimeExpired))
            .unwrap();
        assert!(changed < expired);
    }

    #[test]
    fn headless_empty_choices_is_hard_error() {
        let graph = graph_of(vec![
            node(
                "fork",
                vec![StepAsset::Choices {
                    options: vec![ChoiceAsset {
                        text: "too rich for you".to_string(),
                        target: "end_feedback".to_string(),
                        time_cost: Some(5.0),
                        once: false,
                        location: None,
                    }],
                }],
            ),
            node("end_feedback", vec![StepAsset::End]),
        ]);
        let catalog = graph.stat_catalog().clone();
        let mut engine = Engine::new(graph, EngineConfig::default().with_headless(true));
        let mut ctx = SessionContext::new(PlayerState::new(catalog));

        engine.run(&mut ctx, StringHash::hash("fork")).unwrap();
        assert!(matches!(
            engine.advance(&mut ctx),
            Err(EngineError::NoAvailableChoices { .. })
        ));
    }

    #[test]
    fn interactive_empty_choices_is_surfaced() {
        let (mut engine, mut ctx) = engine_of(vec![
            node(
                "fork",
                vec![StepAsset::Choices {
                    options: vec![ChoiceAsset {
                        text: "too rich for you".to_string(),
                        target: "end_feedback".to_string(),
                        time_cost: Some(5.0),
                        once: false,
                        location: None,
                    }],
                }],
            ),
            node("end_feedback", vec![StepAsset::End]),
        ]);
        engine.run(&mut ctx, StringHash::hash("fork")).unwrap();
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Choices(options) if options.is_empty()
        ));
    }

    #[test]
    fn body_steps_mutate_player_state() {
        let (mut engine, mut ctx) = engine_of(vec![node(
            "setup_feedback",
            vec![
                StepAsset::AdjustStats {
                    spec: "Nerve+3".to_string(),
                },
                StepAsset::SetVar {
                    key: "met_dockmaster".to_string(),
                    value: crate::graph::ValueAsset::Bool(true),
                },
                StepAsset::AddFragment {
                    fragment: "scrap_tide".to_string(),
                },
                StepAsset::SetLocation {
                    location: "docks".to_string(),
                },
                StepAsset::GrantTime { hours: 1.0 },
                StepAsset::End,
            ],
        )]);
        engine.run(&mut ctx, StringHash::hash("setup_feedback")).unwrap();
        engine.advance(&mut ctx).unwrap();

        assert_eq!(ctx.player.stat(StringHash::hash("Nerve")).unwrap(), 3);
        assert!(ctx.player.vars().resolve_str("met_dockmaster").truthy());
        assert!(ctx.player.has_story_fragment(StringHash::hash("scrap_tide")));
        assert_eq!(ctx.player.location(), StringHash::hash("docks"));
        assert!((ctx.player.time_remaining_hours() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn binding_steps_linearize_as_interrupt() {
        let graph = graph_of(vec![node(
            "n_feedback",
            vec![
                StepAsset::Call {
                    binding: "narrate_arrival".to_string(),
                    args: vec![],
                },
                line("after call"),
                StepAsset::End,
            ],
        )]);
        let catalog = graph.stat_catalog().clone();
        let mut registry = BindingRegistry::new();
        registry.register("narrate_arrival", |_, _| {
            Some(vec![Step::Line {
                text: "from host".to_string(),
                tags: vec![],
            }])
        });
        let mut engine = Engine::new(graph, EngineConfig::default())
            .with_bindings(registry)
            .unwrap();
        let mut ctx = SessionContext::new(PlayerState::new(catalog));

        engine.run(&mut ctx, StringHash::hash("n_feedback")).unwrap();
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Line { text, .. } if text == "from host"
        ));
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Line { text, .. } if text == "after call"
        ));
    }

    #[test]
    fn peek_is_non_destructive() {
        let (mut engine, mut ctx) = engine_of(vec![
            node(
                "fork",
                vec![
                    line("prompt"),
                    StepAsset::Choices {
                        options: vec![option("go", "go_feedback")],
                    },
                ],
            ),
            node("go_feedback", vec![StepAsset::End]),
        ]);
        engine.run(&mut ctx, StringHash::hash("fork")).unwrap();

        assert_eq!(engine.peek_line(), Some("prompt"));
        assert!(!engine.next_is_choice());

        engine.advance(&mut ctx).unwrap(); // line now pending ack
        assert!(engine.next_is_choice());
        assert_eq!(engine.peek_line(), None);

        // Peeking committed nothing: the line is still awaiting ack and
        // the choice arrives on the next advance.
        assert!(matches!(
            engine.advance(&mut ctx).unwrap(),
            Signal::Choices(_)
        ));
    }

    #[test]
    fn advance_without_thread_is_error() {
        let (mut engine, mut ctx) = engine_of(vec![node("n_feedback", vec![StepAsset::End])]);
        assert!(matches!(
            engine.advance(&mut ctx),
            Err(EngineError::NoActiveThread)
        ));
        engine.run(&mut ctx, StringHash::hash("n_feedback")).unwrap();
        engine.advance(&mut ctx).unwrap();
        // Thread ended; the cursor is gone.
        assert!(matches!(
            engine.advance(&mut ctx),
            Err(EngineError::NoActiveThread)
        ));
    }

    #[test]
    fn silent_goto_cycle_trips_step_budget() {
        let graph = graph_of(vec![
            node("a", vec![goto("b")]),
            node("b", vec![goto("a")]),
        ]);
        let catalog = graph.stat_catalog().clone();
        let mut engine = Engine::new(graph, EngineConfig::default().with_step_budget(100));
        let mut ctx = SessionContext::new(PlayerState::new(catalog));

        engine.run(&mut ctx, StringHash::hash("a")).unwrap();
        assert!(matches!(
            engine.advance(&mut ctx),
            Err(EngineError::RunawayScript { limit: 100 })
        ));
        assert!(engine.active_handle().is_none());
    }

    #[test]
    fn kill_discards_thread() {
        let (mut engine, mut ctx) = engine_of(vec![node(
            "n_feedback",
            vec![line("one"), StepAsset::End],
        )]);
        engine.run(&mut ctx, StringHash::hash("n_feedback")).unwrap();
        assert!(engine.kill());
        assert!(!engine.kill());
        assert!(engine.active_handle().is_none());
    }
}
