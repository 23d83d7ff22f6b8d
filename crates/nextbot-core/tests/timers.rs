use nextbot_core::{AgentId, CountdownTimer, EntityHandle, IntervalTimer, TickContext};

#[test]
fn countdown_timer_elapses_at_duration() {
    let mut timer = CountdownTimer::default();
    assert!(!timer.has_started());
    assert!(timer.is_elapsed(0.0), "unstarted timers count as elapsed");

    timer.start(10.0, 2.0);
    assert!(timer.has_started());
    assert!(!timer.is_elapsed(11.0));
    assert_eq!(timer.remaining(11.0), 1.0);
    assert_eq!(timer.elapsed_time(11.5), 1.5);
    assert!(timer.is_elapsed(12.0));
    assert_eq!(timer.remaining(13.0), 0.0);

    timer.invalidate();
    assert!(!timer.has_started());
    assert!(timer.is_elapsed(10.0));
}

#[test]
fn countdown_timer_clamps_negative_duration() {
    let mut timer = CountdownTimer::default();
    timer.start(1.0, -5.0);
    assert_eq!(timer.duration(), 0.0);
    assert!(timer.is_elapsed(1.0));
}

#[test]
fn interval_timer_measures_since_start() {
    let mut timer = IntervalTimer::default();
    assert_eq!(timer.elapsed(5.0), 0.0);
    timer.start(2.0);
    assert_eq!(timer.elapsed(5.0), 3.0);
    assert_eq!(timer.elapsed(1.0), 0.0);
    timer.invalidate();
    assert!(!timer.has_started());
}

#[test]
fn tick_context_advances_clock() {
    let ctx = TickContext::new(0.25, 9);
    let next = ctx.next().next();
    assert_eq!(next.tick, 2);
    assert_eq!(next.time_seconds, 0.5);
    assert_eq!(next.seed, 9);
}

#[test]
fn agent_rng_depends_on_tick_and_agent() {
    let ctx = TickContext::new(0.1, 3);
    let a = EntityHandle::new(4, 0);
    let b = a.recycled();
    assert_ne!(a.stable_id(), b.stable_id());

    let mut same1 = ctx.rng_for_agent(a, 1);
    let mut same2 = ctx.rng_for_agent(a, 1);
    assert_eq!(same1.next_u64(), same2.next_u64());

    let mut other_agent = ctx.rng_for_agent(b, 1);
    let mut other_tick = ctx.next().rng_for_agent(a, 1);
    let first = ctx.rng_for_agent(a, 1).next_u64();
    assert_ne!(first, other_agent.next_u64());
    assert_ne!(first, other_tick.next_u64());
}
