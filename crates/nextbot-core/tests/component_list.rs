use std::cell::RefCell;
use std::rc::Rc;

use nextbot_core::{Component, ComponentList, TickContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ping {
    A,
    B,
}

type Log = Rc<RefCell<Vec<String>>>;

struct Recorder {
    name: &'static str,
    log: Log,
}

impl Component<Ping> for Recorder {
    fn reset(&mut self) {
        self.log.borrow_mut().push(format!("{}:reset", self.name));
    }

    fn update(&mut self, ctx: &TickContext) {
        self.log
            .borrow_mut()
            .push(format!("{}:update@{}", self.name, ctx.tick));
    }

    fn on_event(&mut self, event: &Ping) {
        self.log
            .borrow_mut()
            .push(format!("{}:{:?}", self.name, event));
    }
}

fn recorder(name: &'static str, log: &Log) -> Box<dyn Component<Ping>> {
    Box::new(Recorder {
        name,
        log: Rc::clone(log),
    })
}

#[test]
fn updates_and_events_follow_registration_order() {
    let log: Log = Rc::default();
    let mut list = ComponentList::new();
    list.register(recorder("first", &log));
    list.register(recorder("second", &log));

    let ctx = TickContext::new(0.1, 1).next();
    list.update_all(&ctx);
    list.dispatch(&Ping::A);
    list.reset_all();

    assert_eq!(
        *log.borrow(),
        vec![
            "first:update@1",
            "second:update@1",
            "first:A",
            "second:A",
            "first:reset",
            "second:reset",
        ]
    );
}

#[test]
fn unregister_hands_component_back_and_stops_delivery() {
    let log: Log = Rc::default();
    let mut list = ComponentList::new();
    let first = list.register(recorder("first", &log));
    let second = list.register(recorder("second", &log));
    assert_ne!(first, second);
    assert_eq!(list.len(), 2);

    let mut removed = list.unregister(first).expect("registered");
    assert!(!list.contains(first));
    assert!(list.contains(second));
    assert!(list.unregister(first).is_none());

    list.dispatch(&Ping::B);
    removed.on_event(&Ping::A);
    assert_eq!(*log.borrow(), vec!["second:B", "first:A"]);
    assert_eq!(list.ids().collect::<Vec<_>>(), vec![second]);
}

#[test]
fn ids_are_not_reused_after_unregister() {
    let log: Log = Rc::default();
    let mut list = ComponentList::new();
    let a = list.register(recorder("a", &log));
    list.unregister(a);
    assert!(list.is_empty());
    let b = list.register(recorder("b", &log));
    assert_ne!(a, b);
}
