#![cfg(feature = "serde")]

use nextbot_core::EntityHandle;
use nextbot_nav::{
    ActorState, AreaFlags, AreaId, ComputeOptions, LadderDesc, LadderTop, MeshTraversal, MoverProfile,
    NavDir, NavMesh, NavSettings, Path, PathConfig, PathContext, SearchScratch, ShortestPathCost, Team,
    Vec3,
};

fn mesh() -> NavMesh {
    let mut b = NavMesh::builder();
    let a0 = b.add_flat_area(0.0, 0.0, 100.0, 100.0, 0.0);
    let a1 = b.add_flat_area(100.0, 0.0, 200.0, 100.0, 0.0);
    let a2 = b.add_flat_area(100.0, 100.0, 200.0, 200.0, 0.0);
    let roof = b.add_flat_area(0.0, 100.0, 100.0, 200.0, 200.0);
    b.set_flags(a2, AreaFlags::CROUCH | AreaFlags::STAIRS);
    b.connect_both(a0, a1, NavDir::East)
        .connect_both(a1, a2, NavDir::South);
    b.add_ladder(LadderDesc {
        top: Vec3::new(50.0, 90.0, 200.0),
        bottom: Vec3::new(50.0, 90.0, 0.0),
        width: 20.0,
        dir: NavDir::North,
        top_areas: LadderTop {
            forward: Some(roof),
            ..LadderTop::default()
        },
        bottom_area: Some(a0),
    });
    b.build().expect("valid mesh")
}

fn compute(mesh: &NavMesh, to: Vec3) -> Path {
    let mover = MoverProfile::default();
    let config = PathConfig::default();
    let world = MeshTraversal::new(mesh, mover.step_height);
    let cx = PathContext {
        now: 0.0,
        mesh,
        world: &world,
        mover: &mover,
        config: &config,
    };
    let agent = ActorState::new(EntityHandle::new(1, 0), Vec3::new(20.0, 20.0, 0.0)).located(mesh);
    let mut path = Path::new();
    let mut scratch = SearchScratch::new();
    path.compute_to_position(
        &cx,
        &mut scratch,
        &agent,
        to,
        &ShortestPathCost::new(&mover, Team::Any),
        &ComputeOptions::default(),
    )
    .expect("path");
    path
}

#[test]
fn nav_mesh_roundtrip_preserves_paths() {
    let original = mesh();
    let json = serde_json::to_string(&original).expect("serialize");
    let restored: NavMesh = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(restored.area_count(), original.area_count());
    assert_eq!(restored.ladders().len(), 1);
    assert_eq!(
        restored.area(AreaId(2)).map(|a| a.flags()),
        Some(AreaFlags::CROUCH | AreaFlags::STAIRS)
    );

    for goal in [Vec3::new(150.0, 150.0, 0.0), Vec3::new(50.0, 150.0, 200.0)] {
        let a = compute(&original, goal);
        let b = compute(&restored, goal);
        assert_eq!(a.segments(), b.segments());
    }
}

#[test]
fn mesh_description_builds_with_inferred_connections() {
    let json = r#"{
        "areas": [
            { "nw": { "x": 0.0, "y": 0.0, "z": 0.0 }, "se": { "x": 100.0, "y": 100.0, "z": 0.0 } },
            { "nw": { "x": 100.0, "y": 0.0, "z": 10.0 }, "se": { "x": 200.0, "y": 100.0, "z": 10.0 } },
            { "nw": { "x": 200.0, "y": 0.0, "z": 90.0 }, "se": { "x": 300.0, "y": 100.0, "z": 90.0 } }
        ],
        "auto_connect": 18.0
    }"#;
    let mesh: NavMesh = serde_json::from_str(json).expect("deserialize");
    assert!(mesh.is_connected(AreaId(0), AreaId(1), Some(NavDir::East)));
    assert!(mesh.is_connected(AreaId(1), AreaId(0), Some(NavDir::West)));
    // Too high to step up, but dropping down is always connected.
    assert!(!mesh.is_connected(AreaId(1), AreaId(2), None));
    assert!(mesh.is_connected(AreaId(2), AreaId(1), Some(NavDir::West)));
}

#[test]
fn invalid_mesh_description_is_rejected() {
    let json = r#"{
        "areas": [
            { "nw": { "x": 0.0, "y": 0.0, "z": 0.0 }, "se": { "x": 100.0, "y": 100.0, "z": 0.0 },
              "connections": [ { "to": 5, "dir": "east" } ] }
        ]
    }"#;
    let err = serde_json::from_str::<NavMesh>(json).unwrap_err();
    assert!(err.to_string().contains("area #5"));
}

#[test]
fn partial_settings_fill_in_defaults() {
    let json = r#"{ "path": { "optimize": false }, "follower": { "goal_tolerance": 40.0 } }"#;
    let settings: NavSettings = serde_json::from_str(json).expect("deserialize");
    assert!(!settings.path.optimize);
    assert_eq!(settings.path.max_segments, PathConfig::default().max_segments);
    assert_eq!(settings.follower.goal_tolerance, 40.0);
    assert_eq!(settings.mover, MoverProfile::default());
}
