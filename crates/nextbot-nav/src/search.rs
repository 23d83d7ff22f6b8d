//! Best-first search over the area graph.
//!
//! Search-transient state lives in [`SearchScratch`], a side table indexed by area id. Every slot
//! carries the generation of the search that last wrote it, so starting a new search is O(1) and
//! stale slots from earlier searches read as unvisited.

use core::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::mesh::FLOOR_TOLERANCE;
use crate::{Adjacent, Area, AreaId, CostEdge, CostEvaluator, NavMesh, Team, TraverseKind, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenNode {
    total: f32,
    tie: u64,
    area: AreaId,
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other
            .total
            .total_cmp(&self.total)
            .then_with(|| other.tie.cmp(&self.tie))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Membership {
    #[default]
    Unvisited,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, Default)]
struct NodeState {
    generation: u32,
    membership: Membership,
    cost_so_far: f32,
    total: f32,
    parent: Option<AreaId>,
    parent_how: Option<TraverseKind>,
    path_length: f32,
}

/// Reusable per-search state. One scratch serves one search at a time; concurrent searches over
/// the same mesh each need their own.
#[derive(Debug, Default)]
pub struct SearchScratch {
    generation: u32,
    nodes: Vec<NodeState>,
    open: BinaryHeap<OpenNode>,
    adjacent: Vec<Adjacent>,
    tie: u64,
}

/// Parameters of one search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRequest {
    pub start: AreaId,
    /// Goal area. Without one, the search ends in whichever area contains `goal_pos`.
    pub goal: Option<AreaId>,
    /// Heuristic target. Defaults to the goal area's center.
    pub goal_pos: Option<Vec3>,
    pub max_path_length: Option<f32>,
    pub team: Team,
    pub ignore_blockers: bool,
}

impl SearchRequest {
    pub fn new(start: AreaId) -> Self {
        Self {
            start,
            goal: None,
            goal_pos: None,
            max_path_length: None,
            team: Team::Any,
            ignore_blockers: false,
        }
    }

    pub fn to_area(mut self, goal: AreaId) -> Self {
        self.goal = Some(goal);
        self
    }

    pub fn toward(mut self, pos: Vec3) -> Self {
        self.goal_pos = Some(pos);
        self
    }

    pub fn with_team(mut self, team: Team) -> Self {
        self.team = team;
        self
    }

    pub fn with_max_path_length(mut self, max: f32) -> Self {
        self.max_path_length = Some(max);
        self
    }

    pub fn ignoring_blockers(mut self, ignore: bool) -> Self {
        self.ignore_blockers = ignore;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// The goal was reached.
    pub reached: bool,
    /// The goal when reached; otherwise the visited area heuristically closest to it.
    /// `None` only when the search could not start at all.
    pub closest: Option<AreaId>,
}

impl SearchResult {
    const FAILED: Self = Self {
        reached: false,
        closest: None,
    };
}

/// Chooses the goal of an open-goal search among the areas it reaches.
pub trait GoalSelector {
    /// Return the preferred goal given the current choice and a newly reached area.
    fn select(&mut self, current: Option<AreaId>, candidate: &Area) -> Option<AreaId>;
}

impl<F> GoalSelector for F
where
    F: FnMut(Option<AreaId>, &Area) -> Option<AreaId>,
{
    fn select(&mut self, current: Option<AreaId>, candidate: &Area) -> Option<AreaId> {
        self(current, candidate)
    }
}

fn sanitize(cost: f32) -> f32 {
    if cost.is_nan() {
        1e30
    } else {
        cost
    }
}

fn is_elevator(how: TraverseKind) -> bool {
    matches!(how, TraverseKind::ElevatorUp | TraverseKind::ElevatorDown)
}

impl SearchScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the most recent search.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Parent link written for `area` by the most recent search.
    pub fn parent(&self, area: AreaId) -> Option<(AreaId, TraverseKind)> {
        let node = self.node(area)?;
        node.parent.zip(node.parent_how)
    }

    pub fn cost_so_far(&self, area: AreaId) -> Option<f32> {
        self.node(area).map(|n| n.cost_so_far)
    }

    pub fn path_length_so_far(&self, area: AreaId) -> Option<f32> {
        self.node(area).map(|n| n.path_length)
    }

    pub fn is_open(&self, area: AreaId) -> bool {
        self.node(area)
            .is_some_and(|n| n.membership == Membership::Open)
    }

    pub fn is_closed(&self, area: AreaId) -> bool {
        self.node(area)
            .is_some_and(|n| n.membership == Membership::Closed)
    }

    /// Whether the most recent search touched `area` at all.
    pub fn was_visited(&self, area: AreaId) -> bool {
        self.node(area)
            .is_some_and(|n| n.membership != Membership::Unvisited)
    }

    fn begin(&mut self, area_count: usize) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            // Wrapped: no slot may keep a stamp that could match a future generation.
            self.nodes.fill(NodeState::default());
            self.generation = 1;
        }
        if self.nodes.len() < area_count {
            self.nodes.resize(area_count, NodeState::default());
        }
        self.open.clear();
        self.tie = 0;
    }

    fn node(&self, area: AreaId) -> Option<&NodeState> {
        self.nodes
            .get(area.index())
            .filter(|n| n.generation == self.generation && self.generation != 0)
    }

    fn node_mut(&mut self, area: AreaId) -> &mut NodeState {
        let generation = self.generation;
        let node = &mut self.nodes[area.index()];
        if node.generation != generation {
            *node = NodeState {
                generation,
                ..NodeState::default()
            };
        }
        node
    }

    fn push_open(&mut self, area: AreaId, cost_so_far: f32, total: f32) {
        let node = self.node_mut(area);
        node.cost_so_far = cost_so_far;
        node.total = total;
        node.membership = Membership::Open;
        let tie = self.tie;
        self.tie += 1;
        self.open.push(OpenNode { total, tie, area });
    }

    // Pops the best live open entry, skipping ones superseded by a later push.
    fn pop_open(&mut self) -> Option<AreaId> {
        while let Some(entry) = self.open.pop() {
            let live = self.node(entry.area).is_some_and(|n| {
                n.membership == Membership::Open && n.total.to_bits() == entry.total.to_bits()
            });
            if live {
                return Some(entry.area);
            }
        }
        None
    }

    fn close(&mut self, area: AreaId) {
        self.node_mut(area).membership = Membership::Closed;
    }

    /// A* from `request.start` toward the goal.
    ///
    /// When the goal cannot be reached the result still names the closest area found, which the
    /// caller may use to build a partial route.
    pub fn search(
        &mut self,
        mesh: &NavMesh,
        request: &SearchRequest,
        cost: &dyn CostEvaluator,
    ) -> SearchResult {
        let Some(start) = mesh.area(request.start) else {
            return SearchResult::FAILED;
        };
        self.begin(mesh.area_count());

        if request.goal == Some(request.start) {
            return SearchResult {
                reached: true,
                closest: Some(request.start),
            };
        }

        let goal_pos = request
            .goal_pos
            .or_else(|| request.goal.and_then(|g| mesh.area(g)).map(Area::center));
        let Some(goal_pos) = goal_pos else {
            return SearchResult {
                reached: false,
                closest: Some(request.start),
            };
        };

        let init = sanitize(cost.cost(&CostEdge {
            area: start,
            from: None,
            ladder: None,
            elevator: false,
            length: None,
        }));
        if init < 0.0 {
            tracing::debug!(start = request.start.0, "start area forbidden by cost evaluator");
            return SearchResult::FAILED;
        }

        let mut closest = request.start;
        let mut closest_dist = start.center().distance(goal_pos);
        self.push_open(request.start, init, init + closest_dist);

        let (team, ignore) = (request.team, request.ignore_blockers);
        let max_len = request.max_path_length.filter(|m| *m > 0.0);
        let mut adjacent = core::mem::take(&mut self.adjacent);

        while let Some(id) = self.pop_open() {
            let area = &mesh.areas()[id.index()];
            if area.is_blocked(team, ignore) {
                self.close(id);
                continue;
            }

            let at_goal = match request.goal {
                Some(goal) => id == goal,
                None => area.contains(goal_pos, FLOOR_TOLERANCE),
            };
            if at_goal {
                self.adjacent = adjacent;
                return SearchResult {
                    reached: true,
                    closest: Some(id),
                };
            }

            let (parent, area_cost, area_len) = {
                let n = self.node_mut(id);
                (n.parent, n.cost_so_far, n.path_length)
            };

            mesh.collect_adjacent(id, &mut adjacent);
            for adj in adjacent.iter() {
                if Some(adj.area) == parent || adj.area == id {
                    continue;
                }
                let Some(next) = mesh.area(adj.area) else {
                    continue;
                };
                if next.is_blocked(team, ignore) {
                    continue;
                }

                let step = sanitize(cost.cost(&CostEdge {
                    area: next,
                    from: Some(area),
                    ladder: adj.ladder.and_then(|l| mesh.ladder(l)),
                    elevator: is_elevator(adj.how),
                    length: adj.length,
                }));
                if step < 0.0 {
                    tracing::trace!(from = id.0, to = adj.area.0, "edge forbidden");
                    continue;
                }
                // Every step costs something, so zero-cost loops cannot spin.
                let new_cost = (area_cost + step).max(area_cost * 1.00001 + 0.00001);

                let new_len = area_len + next.center().distance(area.center());
                if max_len.is_some_and(|max| new_len > max) {
                    continue;
                }

                if let Some(n) = self.node(adj.area) {
                    if n.membership != Membership::Unvisited && n.cost_so_far <= new_cost {
                        continue;
                    }
                }

                let remaining = next.center().distance(goal_pos);
                if remaining < closest_dist {
                    closest = adj.area;
                    closest_dist = remaining;
                }

                let n = self.node_mut(adj.area);
                n.parent = Some(id);
                n.parent_how = Some(adj.how);
                n.path_length = new_len;
                self.push_open(adj.area, new_cost, new_cost + remaining);
                tracing::trace!(from = id.0, to = adj.area.0, cost = new_cost, "opened area");
            }

            self.close(id);
        }

        self.adjacent = adjacent;
        SearchResult {
            reached: false,
            closest: Some(closest),
        }
    }

    /// Dijkstra expansion from `start` that lets `selector` pick the goal among reached areas.
    ///
    /// Areas whose center lies farther than `max_radius` from `origin` are not explored.
    pub fn search_open_goal(
        &mut self,
        mesh: &NavMesh,
        start: AreaId,
        origin: Vec3,
        max_radius: Option<f32>,
        team: Team,
        cost: &dyn CostEvaluator,
        selector: &mut dyn GoalSelector,
    ) -> Option<AreaId> {
        let start_area = mesh.area(start)?;
        self.begin(mesh.area_count());

        let init = sanitize(cost.cost(&CostEdge {
            area: start_area,
            from: None,
            ladder: None,
            elevator: false,
            length: None,
        }));
        if init < 0.0 {
            return None;
        }
        self.push_open(start, init, init);

        let radius = max_radius.filter(|r| *r > 0.0);
        let mut goal = None;
        let mut adjacent = core::mem::take(&mut self.adjacent);

        while let Some(id) = self.pop_open() {
            self.close(id);
            let area = &mesh.areas()[id.index()];
            if area.is_blocked(team, false) {
                continue;
            }
            let area_cost = self.node_mut(id).cost_so_far;

            mesh.collect_adjacent(id, &mut adjacent);
            for adj in adjacent.iter() {
                if self.is_closed(adj.area) {
                    continue;
                }
                let Some(next) = mesh.area(adj.area) else {
                    continue;
                };
                if next.is_blocked(team, false) {
                    continue;
                }
                if radius.is_some_and(|r| next.center().distance(origin) > r) {
                    continue;
                }

                let step = sanitize(cost.cost(&CostEdge {
                    area: next,
                    from: Some(area),
                    ladder: adj.ladder.and_then(|l| mesh.ladder(l)),
                    elevator: is_elevator(adj.how),
                    length: adj.length,
                }));
                if step < 0.0 {
                    continue;
                }
                let new_cost = (area_cost + step).max(area_cost * 1.00001 + 0.00001);

                if self.is_open(adj.area) && self.cost_so_far(adj.area).is_some_and(|c| c <= new_cost) {
                    continue;
                }

                let n = self.node_mut(adj.area);
                n.parent = Some(id);
                n.parent_how = Some(adj.how);
                goal = selector.select(goal, next);
                self.push_open(adj.area, new_cost, new_cost);
            }
        }

        self.adjacent = adjacent;
        tracing::debug!(goal = ?goal.map(|g| g.0), "open-goal search finished");
        goal
    }
}
