use anyhow::{Context, Result, anyhow, ensure};
use std::collections::BTreeSet;
use warpmap_core::{
    CountingRng, GraphSnapshot, MapConfig, MoveError, NodeAvailability, NodeId, RouteGraph,
    RouteGraphGenerator, WarpSession,
};

use super::policy::WalkPolicy;

/// Inputs shared by every scenario check.
#[derive(Debug, Clone)]
pub struct ScenarioCtx<'a> {
    pub config: &'a MapConfig,
    pub seed: u64,
    pub policy: WalkPolicy,
}

/// Summary of a single successful check, used for verbose output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub nodes: usize,
    pub edges: usize,
    pub jumps: usize,
    pub draws: u64,
}

type ScenarioCheck = fn(&ScenarioCtx<'_>) -> Result<CheckSummary>;

#[derive(Clone)]
pub struct TestScenario {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    check: ScenarioCheck,
}

impl TestScenario {
    const fn new(
        key: &'static str,
        name: &'static str,
        description: &'static str,
        check: ScenarioCheck,
    ) -> Self {
        Self {
            key,
            name,
            description,
            check,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Run the check for one seed.
    ///
    /// # Errors
    ///
    /// Returns the first expectation the generated map failed.
    pub fn run(&self, ctx: &ScenarioCtx<'_>) -> Result<CheckSummary> {
        (self.check)(ctx)
    }
}

pub fn catalog() -> Vec<TestScenario> {
    vec![
        TestScenario::new(
            "invariants",
            "Structural Invariants",
            "Generated maps satisfy every structural invariant",
            invariants_check,
        ),
        TestScenario::new(
            "determinism",
            "Deterministic Generation",
            "Same config and seed always yield the same map",
            determinism_check,
        ),
        TestScenario::new(
            "snapshot-roundtrip",
            "Snapshot Round-Trip",
            "Maps survive JSON snapshots with identical adjacency",
            snapshot_roundtrip_check,
        ),
        TestScenario::new(
            "traversal",
            "Start-to-End Traversal",
            "A walk policy reaches the end in one jump per layer",
            traversal_check,
        ),
        TestScenario::new(
            "illegal-move",
            "Illegal Move Rejection",
            "Non-adjacent and foreign targets are refused without moving",
            illegal_move_check,
        ),
    ]
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

pub fn find_scenario(key: &str) -> Option<TestScenario> {
    catalog()
        .into_iter()
        .find(|scenario| scenario.key.eq_ignore_ascii_case(key))
}

fn generate(ctx: &ScenarioCtx<'_>) -> Result<(RouteGraph, u64)> {
    let generator = RouteGraphGenerator::new(ctx.config.clone()).context("invalid map config")?;
    let mut rng = CountingRng::from_seed(ctx.seed);
    let graph = generator.generate(&mut rng);
    Ok((graph, rng.draws()))
}

fn summarize(graph: &RouteGraph, draws: u64) -> CheckSummary {
    CheckSummary {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        jumps: 0,
        draws,
    }
}

fn invariants_check(ctx: &ScenarioCtx<'_>) -> Result<CheckSummary> {
    let (graph, draws) = generate(ctx)?;
    graph
        .check_invariants()
        .map_err(|violation| anyhow!("invariant violated: {violation}"))?;

    let reached = graph.reachable_from(graph.start());
    ensure!(
        reached.len() == graph.node_count(),
        "only {} of {} nodes reachable from start",
        reached.len(),
        graph.node_count()
    );
    ensure!(
        graph.layer_count() == ctx.config.total_layers() as usize,
        "expected {} layers, found {}",
        ctx.config.total_layers(),
        graph.layer_count()
    );
    for node in graph.nodes() {
        ensure!(
            node.position().is_normalized(),
            "node {} has position {:?} outside the unit square",
            node.id(),
            node.position()
        );
    }
    Ok(summarize(&graph, draws))
}

fn determinism_check(ctx: &ScenarioCtx<'_>) -> Result<CheckSummary> {
    let (first, draws) = generate(ctx)?;
    let (second, replay_draws) = generate(ctx)?;
    ensure!(first == second, "seed {} produced two different maps", ctx.seed);
    ensure!(
        draws == replay_draws,
        "seed {} consumed {draws} then {replay_draws} draws",
        ctx.seed
    );
    Ok(summarize(&first, draws))
}

fn snapshot_roundtrip_check(ctx: &ScenarioCtx<'_>) -> Result<CheckSummary> {
    let (graph, draws) = generate(ctx)?;
    let json = graph.to_snapshot().to_json()?;
    let restored = GraphSnapshot::from_json(&json)?
        .restore()
        .context("snapshot failed to restore")?;
    for node in graph.nodes() {
        let before: BTreeSet<NodeId> = node.outgoing().iter().copied().collect();
        let after: BTreeSet<NodeId> = restored
            .successors(node.id())
            .iter()
            .copied()
            .collect();
        ensure!(before == after, "adjacency of {} changed", node.id());
    }
    ensure!(restored == graph, "restored map differs from original");
    Ok(summarize(&graph, draws))
}

fn traversal_check(ctx: &ScenarioCtx<'_>) -> Result<CheckSummary> {
    let mut session = WarpSession::new(ctx.config.clone(), ctx.seed)?;
    let mut walker = ctx.policy.walker(ctx.seed);
    let expected_jumps = ctx.config.layer_count as usize + 1;

    let mut jumps = 0;
    loop {
        let reachability = session.reachability();
        let options = reachability.adjacent().to_vec();
        let next = walker
            .choose(session.graph(), &options)
            .ok_or_else(|| anyhow!("stranded at {} after {jumps} jumps", reachability.current()))?;
        ensure!(
            reachability.availability(next) == NodeAvailability::Adjacent,
            "policy {} chose non-adjacent node {next}",
            ctx.policy
        );
        let outcome = session.advance_to(next)?;
        jumps += 1;
        if outcome.is_arrival() {
            break;
        }
        ensure!(jumps < expected_jumps, "no arrival after {jumps} jumps");
    }

    ensure!(
        jumps == expected_jumps,
        "arrived after {jumps} jumps, expected {expected_jumps}"
    );
    ensure!(session.reachability().is_complete(), "arrival without completion");
    let graph = session.graph();
    Ok(CheckSummary {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        jumps,
        draws: 0,
    })
}

fn illegal_move_check(ctx: &ScenarioCtx<'_>) -> Result<CheckSummary> {
    let mut session = WarpSession::new(ctx.config.clone(), ctx.seed)?;
    let start = session.graph().start();
    let far_targets: Vec<NodeId> = session
        .graph()
        .nodes()
        .filter(|node| node.layer() >= 2)
        .map(|node| node.id())
        .collect();

    for target in far_targets {
        ensure!(
            session.reachability().is_reachable(target),
            "node {target} should be reachable from start"
        );
        match session.advance_to(target) {
            Err(MoveError::IllegalMove { from, to }) if from == start && to == target => {}
            other => return Err(anyhow!("jump to {target} was not rejected: {other:?}")),
        }
        ensure!(
            session.reachability().current() == start,
            "rejected jump moved the player"
        );
    }

    let foreign = NodeId(u32::try_from(session.graph().node_count())?);
    ensure!(
        session.advance_to(foreign) == Err(MoveError::UnknownNode(foreign)),
        "foreign node {foreign} was not rejected"
    );
    ensure!(session.reachability().path() == [start], "path changed after rejections");

    let graph = session.graph();
    Ok(CheckSummary {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        jumps: 0,
        draws: 0,
    })
}
