use nextbot_core::EntityHandle;
use nextbot_nav::{
    ActorState, AreaFlags, AreaId, ComputeOptions, CostEdge, GeometryError, LadderDesc, LadderTop,
    MeshTraversal, MoverProfile, NavDir, NavMesh, Path, PathConfig, PathContext, PathError,
    PathOutcome, SearchScratch, SegmentKind, ShortestPathCost, Team, TraverseKind, Vec3,
};

/// Three areas east along y in [0, 100], then two more south of the last one.
fn corridor() -> NavMesh {
    let mut b = NavMesh::builder();
    let a0 = b.add_flat_area(0.0, 0.0, 100.0, 100.0, 0.0);
    let a1 = b.add_flat_area(100.0, 0.0, 200.0, 100.0, 0.0);
    let a2 = b.add_flat_area(200.0, 0.0, 300.0, 100.0, 0.0);
    let a3 = b.add_flat_area(200.0, 100.0, 300.0, 200.0, 0.0);
    let a4 = b.add_flat_area(200.0, 200.0, 300.0, 300.0, 0.0);
    b.connect_both(a0, a1, NavDir::East)
        .connect_both(a1, a2, NavDir::East)
        .connect_both(a2, a3, NavDir::South)
        .connect_both(a3, a4, NavDir::South);
    b.build().expect("valid mesh")
}

fn agent(mesh: &NavMesh, pos: Vec3) -> ActorState {
    ActorState::new(EntityHandle::new(1, 0), pos).located(mesh)
}

fn unoptimized() -> PathConfig {
    PathConfig {
        optimize: false,
        ..PathConfig::default()
    }
}

fn shortest() -> ShortestPathCost {
    ShortestPathCost::new(&MoverProfile::default(), Team::Any)
}

fn compute(mesh: &NavMesh, config: &PathConfig, path: &mut Path, from: Vec3, to: Vec3) -> Result<PathOutcome, PathError> {
    compute_with(mesh, config, path, from, to, &ComputeOptions::default())
}

fn compute_with(
    mesh: &NavMesh,
    config: &PathConfig,
    path: &mut Path,
    from: Vec3,
    to: Vec3,
    options: &ComputeOptions,
) -> Result<PathOutcome, PathError> {
    let mover = MoverProfile::default();
    let world = MeshTraversal::new(mesh, mover.step_height);
    let cx = PathContext {
        now: 0.0,
        mesh,
        world: &world,
        mover: &mover,
        config,
    };
    let mut scratch = SearchScratch::new();
    path.compute_to_position(&cx, &mut scratch, &agent(mesh, from), to, &shortest(), options)
}

#[test]
fn path_within_one_area_is_trivial() {
    let mesh = corridor();
    let mut path = Path::new();
    let start = Vec3::new(10.0, 10.0, 0.0);
    let goal = Vec3::new(80.0, 70.0, 0.0);

    let outcome = compute(&mesh, &PathConfig::default(), &mut path, start, goal).expect("path");
    assert_eq!(outcome, PathOutcome::Complete);
    assert!(path.is_valid());
    assert!(path.segment_count() <= 2);
    assert_eq!(path.start_position(), Some(start));
    assert_eq!(path.end_position(), Some(goal));
    assert!((path.length() - start.distance(goal)).abs() < 1e-3);
}

#[test]
fn segment_distances_accumulate_to_path_length() {
    let mesh = corridor();
    let mut path = Path::new();
    let start = Vec3::new(50.0, 90.0, 0.0);
    let goal = Vec3::new(250.0, 250.0, 0.0);

    compute(&mesh, &unoptimized(), &mut path, start, goal).expect("path");
    assert_eq!(path.segment_count(), 6);
    assert_eq!(path.start_position(), Some(start));
    assert_eq!(path.end_position(), Some(goal));

    let segments = path.segments();
    let mut sum = 0.0;
    for pair in segments.windows(2) {
        assert!(pair[1].distance_from_start >= pair[0].distance_from_start);
        sum += pair[0].length;
    }
    let last = path.last_segment().expect("valid path");
    assert_eq!(last.distance_from_start, path.length());
    assert_eq!(last.length, 0.0);
    assert!((sum - path.length()).abs() < 1e-3);

    let areas: Vec<AreaId> = segments.iter().map(|s| s.area).collect();
    assert_eq!(
        areas,
        vec![AreaId(0), AreaId(1), AreaId(2), AreaId(3), AreaId(4), AreaId(4)]
    );
    assert!(segments.iter().all(|s| s.kind == SegmentKind::OnGround));
}

#[test]
fn crossings_stay_inside_portals() {
    let mesh = corridor();
    let mut path = Path::new();
    compute(
        &mesh,
        &unoptimized(),
        &mut path,
        Vec3::new(50.0, 99.0, 0.0),
        Vec3::new(250.0, 250.0, 0.0),
    )
    .expect("path");

    // Entering the middle area: its north and south edges are walls, so the crossing keeps a
    // margin from them, then steps in.
    let crossing = path.segment(1).expect("segment");
    assert_eq!(crossing.pos, Vec3::new(105.0, 87.5, 0.0));
    assert_eq!(crossing.portal_center, Vec3::new(100.0, 50.0, 0.0));
    assert_eq!(crossing.portal_half_width, 50.0);
}

#[test]
fn disconnected_goal_is_an_error_and_invalidates() {
    let mut b = NavMesh::builder();
    b.add_flat_area(0.0, 0.0, 100.0, 100.0, 0.0);
    b.add_flat_area(300.0, 0.0, 400.0, 100.0, 0.0);
    let mesh = b.build().expect("valid mesh");

    let mut path = Path::new();
    compute(
        &mesh,
        &PathConfig::default(),
        &mut path,
        Vec3::new(10.0, 10.0, 0.0),
        Vec3::new(20.0, 20.0, 0.0),
    )
    .expect("trivial path");
    assert!(path.is_valid());

    let err = compute(
        &mesh,
        &PathConfig::default(),
        &mut path,
        Vec3::new(50.0, 50.0, 0.0),
        Vec3::new(350.0, 50.0, 0.0),
    )
    .unwrap_err();
    assert_eq!(err, PathError::Unreachable);
    assert!(!path.is_valid());
    assert_eq!(path.segment_count(), 0);
}

#[test]
fn unreachable_goal_yields_partial_route() {
    let mut b = NavMesh::builder();
    let a0 = b.add_flat_area(0.0, 0.0, 100.0, 100.0, 0.0);
    let a1 = b.add_flat_area(100.0, 0.0, 200.0, 100.0, 0.0);
    b.add_flat_area(500.0, 0.0, 600.0, 100.0, 0.0);
    b.connect_both(a0, a1, NavDir::East);
    let mesh = b.build().expect("valid mesh");

    let start = Vec3::new(50.0, 50.0, 0.0);
    let goal = Vec3::new(550.0, 50.0, 0.0);

    let mut path = Path::new();
    let outcome = compute(&mesh, &PathConfig::default(), &mut path, start, goal).expect("partial");
    assert_eq!(outcome, PathOutcome::Partial);
    assert!(path.is_valid());
    assert!(path.segments().iter().any(|s| s.area == a1));
    assert_eq!(path.end_position(), Some(goal));

    let strict = ComputeOptions {
        allow_partial: false,
        ..ComputeOptions::default()
    };
    let err = compute_with(&mesh, &PathConfig::default(), &mut path, start, goal, &strict).unwrap_err();
    assert_eq!(err, PathError::Unreachable);
    assert!(!path.is_valid());

    let without_goal = ComputeOptions {
        include_goal_if_path_fails: false,
        ..ComputeOptions::default()
    };
    compute_with(&mesh, &PathConfig::default(), &mut path, start, goal, &without_goal).expect("partial");
    let end = path.end_position().expect("valid path");
    assert!(end.x <= 200.0);
}

#[test]
fn blocked_goal_area_is_approached_but_not_entered() {
    let mut mesh = corridor();
    mesh.set_blocked(AreaId(4), Team::Any, true).expect("known area");

    let mut path = Path::new();
    let outcome = compute(
        &mesh,
        &unoptimized(),
        &mut path,
        Vec3::new(50.0, 50.0, 0.0),
        Vec3::new(250.0, 250.0, 0.0),
    )
    .expect("partial");
    assert_eq!(outcome, PathOutcome::Partial);
    assert!(path.segments().iter().all(|s| s.area != AreaId(4)));
    assert!(path.segments().iter().any(|s| s.area == AreaId(3)));
}

#[test]
fn missing_start_area_is_reported() {
    let mesh = corridor();
    let mover = MoverProfile::default();
    let config = PathConfig::default();
    let world = MeshTraversal::new(&mesh, mover.step_height);
    let cx = PathContext {
        now: 0.0,
        mesh: &mesh,
        world: &world,
        mover: &mover,
        config: &config,
    };
    let nowhere = ActorState::new(EntityHandle::new(2, 0), Vec3::new(-500.0, -500.0, 0.0)).located(&mesh);
    assert_eq!(nowhere.last_known_area, None);

    let mut path = Path::new();
    let mut scratch = SearchScratch::new();
    let err = path
        .compute_to_position(
            &cx,
            &mut scratch,
            &nowhere,
            Vec3::new(50.0, 50.0, 0.0),
            &shortest(),
            &ComputeOptions::default(),
        )
        .unwrap_err();
    assert_eq!(err, PathError::NoStartArea);

    let here = agent(&mesh, Vec3::new(50.0, 50.0, 0.0));
    let err = path
        .compute_to_subject(&cx, &mut scratch, &here, &nowhere, &shortest(), &ComputeOptions::default())
        .unwrap_err();
    assert_eq!(err, PathError::NoGoalArea);
    assert!(!path.is_valid());
}

#[test]
fn forbidden_start_area_is_reported() {
    let mesh = corridor();
    let mover = MoverProfile::default();
    let config = PathConfig::default();
    let world = MeshTraversal::new(&mesh, mover.step_height);
    let cx = PathContext {
        now: 0.0,
        mesh: &mesh,
        world: &world,
        mover: &mover,
        config: &config,
    };
    let cost = |edge: &CostEdge<'_>| if edge.from.is_none() { -1.0 } else { 1.0 };

    let mut path = Path::new();
    let mut scratch = SearchScratch::new();
    let err = path
        .compute_to_position(
            &cx,
            &mut scratch,
            &agent(&mesh, Vec3::new(50.0, 50.0, 0.0)),
            Vec3::new(250.0, 250.0, 0.0),
            &cost,
            &ComputeOptions::default(),
        )
        .unwrap_err();
    assert_eq!(err, PathError::StartForbidden);
}

#[test]
fn path_to_subject_ends_at_subject() {
    let mesh = corridor();
    let mover = MoverProfile::default();
    let config = PathConfig::default();
    let world = MeshTraversal::new(&mesh, mover.step_height);
    let cx = PathContext {
        now: 3.0,
        mesh: &mesh,
        world: &world,
        mover: &mover,
        config: &config,
    };
    let target = ActorState::new(EntityHandle::new(7, 2), Vec3::new(260.0, 240.0, 0.0)).located(&mesh);

    let mut path = Path::new();
    let mut scratch = SearchScratch::new();
    let outcome = path
        .compute_to_subject(
            &cx,
            &mut scratch,
            &agent(&mesh, Vec3::new(50.0, 50.0, 0.0)),
            &target,
            &shortest(),
            &ComputeOptions::default(),
        )
        .expect("path");
    assert_eq!(outcome, PathOutcome::Complete);
    assert_eq!(path.subject(), Some(target.handle));
    assert_eq!(path.end_position(), Some(target.position));
    assert_eq!(path.age(4.5), 1.5);
}

#[test]
fn open_goal_path_leads_to_selected_area() {
    let mesh = corridor();
    let mover = MoverProfile::default();
    let config = PathConfig::default();
    let world = MeshTraversal::new(&mesh, mover.step_height);
    let cx = PathContext {
        now: 0.0,
        mesh: &mesh,
        world: &world,
        mover: &mover,
        config: &config,
    };
    let mut southmost = |current: Option<AreaId>, candidate: &nextbot_nav::Area| {
        match current.and_then(|c| mesh.area(c)) {
            Some(best) if best.center().y >= candidate.center().y => current,
            _ => Some(candidate.id()),
        }
    };

    let mut path = Path::new();
    let mut scratch = SearchScratch::new();
    path.compute_with_open_goal(
        &cx,
        &mut scratch,
        &agent(&mesh, Vec3::new(50.0, 50.0, 0.0)),
        &shortest(),
        &mut southmost,
        None,
    )
    .expect("path");
    assert_eq!(path.last_segment().map(|s| s.area), Some(AreaId(4)));
    assert_eq!(path.end_position(), Some(Vec3::new(250.0, 250.0, 0.0)));
}

#[test]
fn ledge_drop_is_marked_with_landing() {
    let mut b = NavMesh::builder();
    let high = b.add_flat_area(0.0, 0.0, 100.0, 100.0, 100.0);
    let low = b.add_flat_area(100.0, 0.0, 200.0, 100.0, 0.0);
    b.connect(high, low, NavDir::East);
    let mesh = b.build().expect("valid mesh");

    let mut path = Path::new();
    compute(
        &mesh,
        &PathConfig::default(),
        &mut path,
        Vec3::new(50.0, 50.0, 100.0),
        Vec3::new(150.0, 50.0, 0.0),
    )
    .expect("path");

    let segments = path.segments();
    let drop = segments
        .iter()
        .position(|s| s.kind == SegmentKind::DropDown)
        .expect("drop segment");
    let (edge, landing) = (&segments[drop], &segments[drop + 1]);
    assert_eq!(edge.pos.z, 100.0);
    assert_eq!(landing.pos.z, 0.0);
    assert_eq!(landing.pos.x, edge.pos.x);
    assert_eq!(landing.kind, SegmentKind::OnGround);
    assert_eq!(landing.area, low);
}

#[test]
fn drop_lands_on_the_highest_floor_below_the_ledge() {
    let mut b = NavMesh::builder();
    let high = b.add_flat_area(0.0, 0.0, 100.0, 100.0, 150.0);
    let low = b.add_flat_area(100.0, 0.0, 300.0, 100.0, 0.0);
    b.add_flat_area(100.0, 0.0, 250.0, 100.0, 40.0);
    b.connect(high, low, NavDir::East);
    let mesh = b.build().expect("valid mesh");

    let mut path = Path::new();
    compute(
        &mesh,
        &PathConfig::default(),
        &mut path,
        Vec3::new(50.0, 50.0, 150.0),
        Vec3::new(280.0, 50.0, 0.0),
    )
    .expect("path");

    let segments = path.segments();
    let drop = segments
        .iter()
        .position(|s| s.kind == SegmentKind::DropDown)
        .expect("drop segment");
    let landing = &segments[drop + 1];
    assert_eq!(landing.area, low);
    assert_eq!(landing.pos.z, 40.0);
}

#[test]
fn drops_nobody_survives_are_not_taken() {
    let mut b = NavMesh::builder();
    let high = b.add_flat_area(0.0, 0.0, 100.0, 100.0, 500.0);
    let low = b.add_flat_area(100.0, 0.0, 200.0, 100.0, 0.0);
    b.connect(high, low, NavDir::East);
    let mesh = b.build().expect("valid mesh");

    let mut path = Path::new();
    let strict = ComputeOptions {
        allow_partial: false,
        ..ComputeOptions::default()
    };
    let err = compute_with(
        &mesh,
        &PathConfig::default(),
        &mut path,
        Vec3::new(50.0, 50.0, 500.0),
        Vec3::new(150.0, 50.0, 0.0),
        &strict,
    )
    .unwrap_err();
    assert_eq!(err, PathError::Unreachable);
}

#[test]
fn ledge_rise_inserts_climb_point() {
    let mut b = NavMesh::builder();
    let low = b.add_flat_area(0.0, 0.0, 100.0, 100.0, 0.0);
    let high = b.add_flat_area(100.0, 0.0, 200.0, 100.0, 40.0);
    b.connect_both(low, high, NavDir::East);
    let mesh = b.build().expect("valid mesh");

    let mut path = Path::new();
    compute(
        &mesh,
        &PathConfig::default(),
        &mut path,
        Vec3::new(50.0, 50.0, 0.0),
        Vec3::new(150.0, 50.0, 40.0),
    )
    .expect("path");

    let segments = path.segments();
    let climb = segments
        .iter()
        .position(|s| s.kind == SegmentKind::ClimbUp)
        .expect("climb segment");
    assert_eq!(segments[climb].area, low);
    assert_eq!(segments[climb].pos, Vec3::new(100.0, 50.0, 0.0));
    assert_eq!(segments[climb + 1].pos, Vec3::new(150.0, 50.0, 40.0));
}

#[test]
fn wide_gap_inserts_jump_point() {
    let mut b = NavMesh::builder();
    let near = b.add_flat_area(0.0, 0.0, 100.0, 100.0, 0.0);
    let far = b.add_flat_area(200.0, 0.0, 300.0, 100.0, 0.0);
    b.connect_both(near, far, NavDir::East);
    let mesh = b.build().expect("valid mesh");

    let mut path = Path::new();
    compute(
        &mesh,
        &PathConfig::default(),
        &mut path,
        Vec3::new(50.0, 50.0, 0.0),
        Vec3::new(250.0, 50.0, 0.0),
    )
    .expect("path");

    let segments = path.segments();
    let jump = segments
        .iter()
        .position(|s| s.kind == SegmentKind::JumpOverGap)
        .expect("gap segment");
    assert_eq!(segments[jump].area, near);
    assert!(segments[jump].pos.x < 100.0);
    assert!(segments[jump + 1].pos.x > 200.0);
}

fn ladder_mesh() -> (NavMesh, AreaId, AreaId) {
    let mut b = NavMesh::builder();
    let ground = b.add_flat_area(0.0, 0.0, 100.0, 100.0, 0.0);
    let roof = b.add_flat_area(100.0, 0.0, 200.0, 100.0, 200.0);
    b.add_ladder(LadderDesc {
        top: Vec3::new(90.0, 50.0, 200.0),
        bottom: Vec3::new(90.0, 50.0, 0.0),
        width: 20.0,
        dir: NavDir::West,
        top_areas: LadderTop {
            forward: Some(roof),
            ..LadderTop::default()
        },
        bottom_area: Some(ground),
    });
    (b.build().expect("valid mesh"), ground, roof)
}

#[test]
fn ladder_segments_are_placed_off_the_rungs() {
    let (mesh, ground, roof) = ladder_mesh();

    let mut path = Path::new();
    compute(
        &mesh,
        &PathConfig::default(),
        &mut path,
        Vec3::new(20.0, 50.0, 0.0),
        Vec3::new(150.0, 50.0, 200.0),
    )
    .expect("path up");
    let up = path
        .segments()
        .iter()
        .find(|s| s.kind == SegmentKind::LadderUp)
        .expect("ladder up");
    assert_eq!(up.area, roof);
    assert!(up.ladder.is_some());
    assert_eq!(up.pos, Vec3::new(58.0, 50.0, 0.0));

    compute(
        &mesh,
        &PathConfig::default(),
        &mut path,
        Vec3::new(150.0, 50.0, 200.0),
        Vec3::new(20.0, 50.0, 0.0),
    )
    .expect("path down");
    let down = path
        .segments()
        .iter()
        .find(|s| s.kind == SegmentKind::LadderDown)
        .expect("ladder down");
    assert_eq!(down.area, ground);
    assert_eq!(down.pos, Vec3::new(122.0, 50.0, 200.0));
}

#[test]
fn elevator_ride_ends_at_the_center_of_the_next_stop() {
    let mut b = NavMesh::builder();
    let a = b.add_flat_area(0.0, 0.0, 100.0, 100.0, 0.0);
    let lower = b.add_flat_area(100.0, 0.0, 200.0, 100.0, 0.0);
    let upper = b.add_flat_area(100.0, 0.0, 200.0, 100.0, 200.0);
    let d = b.add_flat_area(200.0, 0.0, 300.0, 100.0, 200.0);
    b.connect_both(a, lower, NavDir::East)
        .connect_both(upper, d, NavDir::East)
        .add_elevator(&[lower, upper]);
    let mesh = b.build().expect("valid mesh");

    let mut path = Path::new();
    let start = Vec3::new(50.0, 50.0, 0.0);
    let goal = Vec3::new(250.0, 50.0, 200.0);
    let outcome = compute(&mesh, &unoptimized(), &mut path, start, goal).expect("path");
    assert_eq!(outcome, PathOutcome::Complete);
    assert_eq!(path.segment_count(), 5);

    let boarding = path.segment(1).expect("boarding");
    assert_eq!(boarding.area, lower);
    assert_eq!(boarding.how, Some(TraverseKind::East));
    assert_eq!(boarding.pos.z, 0.0);

    let ride = path.segment(2).expect("ride");
    assert_eq!(ride.area, upper);
    assert_eq!(ride.how, Some(TraverseKind::ElevatorUp));
    assert_eq!(ride.kind, SegmentKind::OnGround);
    assert_eq!(ride.ladder, None);
    assert_eq!(ride.pos, Vec3::new(150.0, 50.0, 200.0));

    let exit = path.segment(3).expect("exit");
    assert_eq!(exit.area, d);
    assert_eq!(exit.how, Some(TraverseKind::East));
    assert_eq!(path.end_position(), Some(goal));
}

#[test]
fn insertion_past_capacity_fails_and_invalidates() {
    let mut b = NavMesh::builder();
    let low = b.add_flat_area(0.0, 0.0, 100.0, 100.0, 0.0);
    let high = b.add_flat_area(100.0, 0.0, 200.0, 100.0, 40.0);
    b.connect_both(low, high, NavDir::East);
    let mesh = b.build().expect("valid mesh");

    let mut path = Path::with_capacity(3);
    let err = compute(
        &mesh,
        &PathConfig::default(),
        &mut path,
        Vec3::new(50.0, 50.0, 0.0),
        Vec3::new(150.0, 50.0, 40.0),
    )
    .unwrap_err();
    assert_eq!(err, PathError::Geometry(GeometryError::CapacityExceeded));
    assert!(!path.is_valid());
}

#[test]
fn long_routes_keep_the_goal_end() {
    let mesh = corridor();
    let mut path = Path::with_capacity(4);
    let goal = Vec3::new(250.0, 250.0, 0.0);
    compute(&mesh, &unoptimized(), &mut path, Vec3::new(50.0, 50.0, 0.0), goal).expect("path");
    assert!(path.segment_count() <= 4);
    assert_eq!(path.first_segment().map(|s| s.area), Some(AreaId(2)));
    assert_eq!(path.end_position(), Some(goal));
}

#[test]
fn avoid_flag_steers_search_around_area() {
    let mut b = NavMesh::builder();
    b.add_flat_area(0.0, 0.0, 100.0, 100.0, 0.0);
    b.add_flat_area(100.0, 0.0, 200.0, 100.0, 0.0);
    b.add_flat_area(0.0, 100.0, 100.0, 200.0, 0.0);
    b.add_flat_area(100.0, 100.0, 200.0, 200.0, 0.0);
    b.set_flags(AreaId(1), AreaFlags::AVOID);
    b.auto_connect(18.0);
    let mesh = b.build().expect("valid mesh");

    let mut path = Path::new();
    compute(
        &mesh,
        &unoptimized(),
        &mut path,
        Vec3::new(50.0, 50.0, 0.0),
        Vec3::new(150.0, 150.0, 0.0),
    )
    .expect("path");
    assert!(path.segments().iter().all(|s| s.area != AreaId(1)));
    assert!(path.segments().iter().any(|s| s.area == AreaId(2)));
}
