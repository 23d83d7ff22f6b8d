use crate::{
    Area, AreaFlags, AreaId, Ladder, LadderId, LadderTop, MeshError, NavConnect, NavDir, Team,
    TraverseKind, Vec3,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How far below a floor a position may sit and still count as standing on it.
pub const FLOOR_TOLERANCE: f32 = 18.0;

/// One way to leave an area, as enumerated by the search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjacent {
    pub area: AreaId,
    pub how: TraverseKind,
    pub ladder: Option<LadderId>,
    /// Cached travel length; `None` for ladders and elevators.
    pub length: Option<f32>,
}

/// The area graph: areas, their one-way connections, and ladders.
///
/// Connections are not symmetric. A drop from `A` to `B` does not imply a way back up.
#[derive(Debug, Clone, Default)]
pub struct NavMesh {
    areas: Vec<Area>,
    ladders: Vec<Ladder>,
}

impl NavMesh {
    pub fn builder() -> NavMeshBuilder {
        NavMeshBuilder::default()
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(id.index())
    }

    pub fn ladders(&self) -> &[Ladder] {
        &self.ladders
    }

    pub fn ladder(&self, id: LadderId) -> Option<&Ladder> {
        self.ladders.get(id.index())
    }

    /// Append every way out of `id` to `out`: floor connections in compass order, then ladders
    /// up, ladders down, and elevator stops.
    pub fn collect_adjacent(&self, id: AreaId, out: &mut Vec<Adjacent>) {
        out.clear();
        let Some(area) = self.area(id) else {
            return;
        };

        for dir in NavDir::ALL {
            out.extend(area.adjacent(dir).iter().map(|c| Adjacent {
                area: c.area,
                how: dir.into(),
                ladder: None,
                length: Some(c.length),
            }));
        }

        for ladder in area.ladders_up.iter().filter_map(|l| self.ladder(*l)) {
            out.extend(ladder.top_areas.ascend_targets().map(|top| Adjacent {
                area: top,
                how: TraverseKind::LadderUp,
                ladder: Some(ladder.id),
                length: None,
            }));
        }

        for ladder in area.ladders_down.iter().filter_map(|l| self.ladder(*l)) {
            if let Some(bottom) = ladder.bottom_area {
                out.push(Adjacent {
                    area: bottom,
                    how: TraverseKind::LadderDown,
                    ladder: Some(ladder.id),
                    length: None,
                });
            }
        }

        for stop in area.elevator.iter() {
            let Some(other) = self.area(stop.area) else {
                continue;
            };
            let how = if other.center.z > area.center.z {
                TraverseKind::ElevatorUp
            } else {
                TraverseKind::ElevatorDown
            };
            out.push(Adjacent {
                area: stop.area,
                how,
                ladder: None,
                length: None,
            });
        }
    }

    /// Whether `to` can be entered directly from `from`.
    ///
    /// With a direction only that floor edge is checked; without one, ladders and elevators count.
    pub fn is_connected(&self, from: AreaId, to: AreaId, dir: Option<NavDir>) -> bool {
        let Some(area) = self.area(from) else {
            return false;
        };
        match dir {
            Some(dir) => area.is_connected(to, dir),
            None => {
                let mut adjacent = Vec::new();
                self.collect_adjacent(from, &mut adjacent);
                adjacent.iter().any(|a| a.area == to)
            }
        }
    }

    /// Area directly under `pos` whose floor is closest below it.
    pub fn area_at(&self, pos: Vec3) -> Option<AreaId> {
        self.areas
            .iter()
            .filter(|a| a.contains(pos, FLOOR_TOLERANCE))
            .min_by(|a, b| {
                let da = pos.z - a.z_at_pos(pos);
                let db = pos.z - b.z_at_pos(pos);
                da.abs().total_cmp(&db.abs())
            })
            .map(|a| a.id)
    }

    /// Area containing `pos`, or else the area whose closest point is nearest, within
    /// `max_distance`.
    pub fn nearest_area(&self, pos: Vec3, max_distance: f32) -> Option<AreaId> {
        if let Some(id) = self.area_at(pos) {
            return Some(id);
        }

        let mut best: Option<(f32, AreaId)> = None;
        for area in self.areas.iter() {
            let d = area.closest_point(pos).distance(pos);
            if d > max_distance {
                continue;
            }
            match best {
                Some((best_d, _)) if d >= best_d => {}
                _ => best = Some((d, area.id)),
            }
        }
        best.map(|(_, id)| id)
    }

    /// Height of the highest floor under `pos` that is not above it.
    pub fn ground_height(&self, pos: Vec3) -> Option<f32> {
        self.areas
            .iter()
            .filter(|a| a.contains(pos, FLOOR_TOLERANCE))
            .map(|a| a.z_at_pos(pos))
            .max_by(f32::total_cmp)
    }

    pub fn set_blocked(&mut self, id: AreaId, team: Team, blocked: bool) -> Result<(), MeshError> {
        let area = self
            .areas
            .get_mut(id.index())
            .ok_or(MeshError::UnknownArea(id))?;
        match team.slot() {
            Some(slot) => area.blocked[slot] = blocked,
            None => area.blocked = [blocked; crate::area::BLOCK_TEAMS],
        }
        tracing::debug!(area = id.0, ?team, blocked, "area blocked state changed");
        Ok(())
    }

    /// Block (or unblock) an area on behalf of a blocker entity.
    ///
    /// Searches that ignore nav blockers still pass through it.
    pub fn set_nav_blocker(&mut self, id: AreaId, team: Team, blocked: bool) -> Result<(), MeshError> {
        self.set_blocked(id, team, blocked)?;
        if let Some(area) = self.areas.get_mut(id.index()) {
            if area.blocked.iter().any(|b| *b) {
                area.flags.insert(AreaFlags::NAV_BLOCKER);
            } else {
                area.flags.remove(AreaFlags::NAV_BLOCKER);
            }
        }
        Ok(())
    }

    pub fn to_desc(&self) -> NavMeshDesc {
        let areas = self
            .areas
            .iter()
            .map(|a| AreaDesc {
                nw: a.nw,
                se: a.se,
                ne_z: Some(a.ne_z),
                sw_z: Some(a.sw_z),
                flags: a.flags,
                connections: NavDir::ALL
                    .into_iter()
                    .flat_map(|dir| {
                        a.adjacent(dir)
                            .iter()
                            .map(move |c| ConnectDesc { to: c.area, dir })
                    })
                    .collect(),
            })
            .collect();

        let ladders = self
            .ladders
            .iter()
            .map(|l| LadderDesc {
                top: l.top,
                bottom: l.bottom,
                width: l.width,
                dir: l.dir,
                top_areas: l.top_areas,
                bottom_area: l.bottom_area,
            })
            .collect();

        let mut grouped = vec![false; self.areas.len()];
        let mut elevators = Vec::new();
        for area in self.areas.iter() {
            if area.elevator.is_empty() || grouped[area.id.index()] {
                continue;
            }
            let mut group = vec![area.id];
            group.extend(area.elevator.iter().map(|c| c.area));
            for id in group.iter() {
                if let Some(slot) = grouped.get_mut(id.index()) {
                    *slot = true;
                }
            }
            elevators.push(group);
        }

        NavMeshDesc {
            areas,
            ladders,
            elevators,
            auto_connect: None,
        }
    }
}

/// Plain-data ladder description.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LadderDesc {
    pub top: Vec3,
    pub bottom: Vec3,
    pub width: f32,
    pub dir: NavDir,
    #[cfg_attr(feature = "serde", serde(default))]
    pub top_areas: LadderTop,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bottom_area: Option<AreaId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectDesc {
    pub to: AreaId,
    pub dir: NavDir,
}

/// Plain-data area description. Areas are identified by their position in the list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AreaDesc {
    pub nw: Vec3,
    pub se: Vec3,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ne_z: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sw_z: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: AreaFlags,
    #[cfg_attr(feature = "serde", serde(default))]
    pub connections: Vec<ConnectDesc>,
}

/// Serializable mesh description, turned into a [`NavMesh`] by [`NavMeshDesc::build`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct NavMeshDesc {
    pub areas: Vec<AreaDesc>,
    pub ladders: Vec<LadderDesc>,
    pub elevators: Vec<Vec<AreaId>>,
    /// Infer floor connections between touching areas, allowing this much rise.
    pub auto_connect: Option<f32>,
}

impl NavMeshDesc {
    pub fn build(&self) -> Result<NavMesh, MeshError> {
        let mut builder = NavMeshBuilder::default();
        for desc in self.areas.iter() {
            let id = builder.add_sloped_area(
                desc.nw,
                desc.se,
                desc.ne_z.unwrap_or(desc.nw.z),
                desc.sw_z.unwrap_or(desc.se.z),
            );
            builder.set_flags(id, desc.flags);
            for c in desc.connections.iter() {
                builder.connect(id, c.to, c.dir);
            }
        }
        for ladder in self.ladders.iter() {
            builder.add_ladder(ladder.clone());
        }
        for group in self.elevators.iter() {
            builder.add_elevator(group);
        }
        if let Some(max_rise) = self.auto_connect {
            builder.auto_connect(max_rise);
        }
        builder.build()
    }
}

#[cfg(feature = "serde")]
impl Serialize for NavMesh {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_desc().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for NavMesh {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let desc = NavMeshDesc::deserialize(deserializer)?;
        desc.build().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingConnect {
    from: AreaId,
    to: AreaId,
    dir: NavDir,
}

/// Incremental mesh construction. Connections and ladders are validated by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct NavMeshBuilder {
    areas: Vec<Area>,
    connects: Vec<PendingConnect>,
    ladders: Vec<LadderDesc>,
    elevators: Vec<Vec<AreaId>>,
    auto_connect: Option<f32>,
}

impl NavMeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flat rectangle from `(x0, y0)` to `(x1, y1)` at height `z`.
    pub fn add_flat_area(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, z: f32) -> AreaId {
        self.add_sloped_area(Vec3::new(x0, y0, z), Vec3::new(x1, y1, z), z, z)
    }

    /// Area from its north-west and south-east corners; the other two corners take the given
    /// heights.
    pub fn add_sloped_area(&mut self, nw: Vec3, se: Vec3, ne_z: f32, sw_z: f32) -> AreaId {
        let id = AreaId(self.areas.len() as u32);
        self.areas.push(Area::new(id, nw, se, ne_z, sw_z));
        id
    }

    pub fn set_flags(&mut self, id: AreaId, flags: AreaFlags) -> &mut Self {
        if let Some(area) = self.areas.get_mut(id.index()) {
            area.flags = flags;
        }
        self
    }

    /// One-way floor connection leaving `from` through its `dir` edge.
    pub fn connect(&mut self, from: AreaId, to: AreaId, dir: NavDir) -> &mut Self {
        self.connects.push(PendingConnect { from, to, dir });
        self
    }

    /// Two-way floor connection: `a` reaches `b` through `dir`, `b` reaches `a` the opposite way.
    pub fn connect_both(&mut self, a: AreaId, b: AreaId, dir: NavDir) -> &mut Self {
        self.connect(a, b, dir);
        self.connect(b, a, dir.opposite())
    }

    pub fn add_ladder(&mut self, ladder: LadderDesc) -> LadderId {
        let id = LadderId(self.ladders.len() as u32);
        self.ladders.push(ladder);
        id
    }

    /// Areas served by one elevator; each stop reaches every other stop.
    pub fn add_elevator(&mut self, stops: &[AreaId]) -> &mut Self {
        self.elevators.push(stops.to_vec());
        self
    }

    /// Connect touching areas at build time. Stepping up more than `max_rise` is not connected;
    /// stepping down always is.
    pub fn auto_connect(&mut self, max_rise: f32) -> &mut Self {
        self.auto_connect = Some(max_rise);
        self
    }

    pub fn build(self) -> Result<NavMesh, MeshError> {
        let NavMeshBuilder {
            mut areas,
            mut connects,
            ladders: ladder_descs,
            elevators,
            auto_connect,
        } = self;

        for area in areas.iter() {
            if !(area.nw.x < area.se.x && area.nw.y < area.se.y) {
                return Err(MeshError::DegenerateArea(area.id));
            }
        }

        if let Some(max_rise) = auto_connect {
            infer_connections(&areas, max_rise, &mut connects);
        }

        let exists = |id: AreaId| id.index() < areas.len();
        for c in connects.iter() {
            if !exists(c.from) {
                return Err(MeshError::UnknownArea(c.from));
            }
            if !exists(c.to) {
                return Err(MeshError::UnknownArea(c.to));
            }
            if c.from == c.to {
                return Err(MeshError::SelfConnection(c.from));
            }
        }

        for c in connects {
            let length = areas[c.from.index()]
                .center
                .distance(areas[c.to.index()].center);
            let list = &mut areas[c.from.index()].connect[c.dir.index()];
            if !list.iter().any(|existing| existing.area == c.to) {
                list.push(NavConnect { area: c.to, length });
            }
        }

        let mut ladders = Vec::with_capacity(ladder_descs.len());
        for (i, desc) in ladder_descs.into_iter().enumerate() {
            let id = LadderId(i as u32);
            let referenced = desc.top_areas.all().chain(desc.bottom_area);
            let mut any = false;
            for area in referenced {
                if area.index() >= areas.len() {
                    return Err(MeshError::UnknownArea(area));
                }
                any = true;
            }
            if !any {
                return Err(MeshError::DanglingLadder);
            }

            if let Some(bottom) = desc.bottom_area {
                areas[bottom.index()].ladders_up.push(id);
            }
            for top in desc.top_areas.all() {
                let list = &mut areas[top.index()].ladders_down;
                if !list.contains(&id) {
                    list.push(id);
                }
            }

            ladders.push(Ladder {
                id,
                top: desc.top,
                bottom: desc.bottom,
                width: desc.width,
                dir: desc.dir,
                top_areas: desc.top_areas,
                bottom_area: desc.bottom_area,
            });
        }

        for stops in elevators.iter() {
            for id in stops.iter() {
                if id.index() >= areas.len() {
                    return Err(MeshError::UnknownArea(*id));
                }
            }
            for from in stops.iter() {
                for to in stops.iter().filter(|to| *to != from) {
                    let length = areas[from.index()]
                        .center
                        .distance(areas[to.index()].center);
                    let area = &mut areas[from.index()];
                    area.flags.insert(AreaFlags::HAS_ELEVATOR);
                    if !area.elevator.iter().any(|c| c.area == *to) {
                        area.elevator.push(NavConnect { area: *to, length });
                    }
                }
            }
        }

        tracing::debug!(
            areas = areas.len(),
            ladders = ladders.len(),
            "navigation mesh built"
        );
        Ok(NavMesh { areas, ladders })
    }
}

fn infer_connections(areas: &[Area], max_rise: f32, out: &mut Vec<PendingConnect>) {
    const EPS: f32 = 0.01;

    // `b` touches the `dir` edge of `a` when this returns the midpoint of the shared span.
    let touching = |a: &Area, b: &Area, dir: NavDir| -> Option<Vec3> {
        let (edge_a, edge_b) = match dir {
            NavDir::North => (a.nw.y, b.se.y),
            NavDir::South => (a.se.y, b.nw.y),
            NavDir::West => (a.nw.x, b.se.x),
            NavDir::East => (a.se.x, b.nw.x),
        };
        if (edge_a - edge_b).abs() > EPS {
            return None;
        }
        match dir {
            NavDir::North | NavDir::South => {
                let lo = a.nw.x.max(b.nw.x);
                let hi = a.se.x.min(b.se.x);
                (hi - lo > EPS).then(|| Vec3::new((lo + hi) * 0.5, edge_a, 0.0))
            }
            NavDir::East | NavDir::West => {
                let lo = a.nw.y.max(b.nw.y);
                let hi = a.se.y.min(b.se.y);
                (hi - lo > EPS).then(|| Vec3::new(edge_a, (lo + hi) * 0.5, 0.0))
            }
        }
    };

    for a in areas.iter() {
        for b in areas.iter().filter(|b| b.id != a.id) {
            for dir in NavDir::ALL {
                let Some(edge) = touching(a, b, dir) else {
                    continue;
                };
                let rise = b.z_at_pos(edge) - a.z_at_pos(edge);
                if rise <= max_rise {
                    out.push(PendingConnect {
                        from: a.id,
                        to: b.id,
                        dir,
                    });
                }
            }
        }
    }
}
