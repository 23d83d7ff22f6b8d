use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nextbot_core::EntityHandle;
use nextbot_nav::{
    ActorState, AreaId, ComputeOptions, MeshTraversal, MoverProfile, NavMesh, Path, PathConfig,
    PathContext, SearchRequest, SearchScratch, ShortestPathCost, Team, Vec3,
};

fn grid_mesh(width: usize, height: usize, cell: f32) -> NavMesh {
    let mut b = NavMesh::builder();
    for y in 0..height {
        for x in 0..width {
            let x0 = x as f32 * cell;
            let y0 = y as f32 * cell;
            b.add_flat_area(x0, y0, x0 + cell, y0 + cell, 0.0);
        }
    }
    b.auto_connect(18.0);
    b.build().expect("grid mesh")
}

fn bench_path(c: &mut Criterion) {
    let cell = 100.0;
    let side = 32;
    let mesh = grid_mesh(side, side, cell);
    let far = side as f32 * cell - 10.0;
    let start = Vec3::new(10.0, 10.0, 0.0);
    let goal = Vec3::new(far, far, 0.0);
    let goal_area = AreaId((side * side - 1) as u32);

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
    let cost = ShortestPathCost::new(&mover, Team::Any);
    let agent = ActorState::new(EntityHandle::new(1, 0), start).located(&mesh);
    let options = ComputeOptions::default();
    let request = SearchRequest::new(AreaId(0)).to_area(goal_area);

    let mut group = c.benchmark_group("nextbot-nav/path");

    group.bench_function("search_alloc", |b| {
        b.iter(|| {
            let mut scratch = SearchScratch::new();
            let result = scratch.search(&mesh, &request, &cost);
            black_box(result.reached);
        })
    });

    let mut scratch = SearchScratch::new();
    group.bench_function("search_reuse", |b| {
        b.iter(|| {
            let result = scratch.search(&mesh, &request, &cost);
            black_box(result.reached);
        })
    });

    group.bench_function("compute_alloc", |b| {
        b.iter(|| {
            let mut scratch = SearchScratch::new();
            let mut path = Path::new();
            path.compute_to_position(&cx, &mut scratch, &agent, goal, &cost, &options)
                .expect("path");
            black_box(path.segment_count());
        })
    });

    let mut path = Path::new();
    group.bench_function("compute_reuse", |b| {
        b.iter(|| {
            path.compute_to_position(&cx, &mut scratch, &agent, goal, &cost, &options)
                .expect("path");
            black_box(path.segment_count());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_path);
criterion_main!(benches);
