//! Ordered component collection owned by a bot.
//!
//! Components are registered explicitly and receive updates and events in registration order.
//! Unregistering hands the component back to the caller.

use crate::TickContext;

/// A unit of bot behavior driven by the owner's update loop.
///
/// Every method has a no-op default so implementors only override what they react to.
pub trait Component<E> {
    fn reset(&mut self) {}

    fn update(&mut self, _ctx: &TickContext) {}

    fn on_event(&mut self, _event: &E) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(pub u32);

pub struct ComponentList<E> {
    next_id: u32,
    entries: Vec<(ComponentId, Box<dyn Component<E>>)>,
}

impl<E> Default for ComponentList<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> ComponentList<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, component: Box<dyn Component<E>>) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, component));
        tracing::trace!(component = id.0, "registered component");
        id
    }

    pub fn unregister(&mut self, id: ComponentId) -> Option<Box<dyn Component<E>>> {
        let pos = self.entries.iter().position(|(cid, _)| *cid == id)?;
        tracing::trace!(component = id.0, "unregistered component");
        Some(self.entries.remove(pos).1)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.entries.iter().any(|(cid, _)| *cid == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn reset_all(&mut self) {
        for (_, component) in self.entries.iter_mut() {
            component.reset();
        }
    }

    pub fn update_all(&mut self, ctx: &TickContext) {
        for (_, component) in self.entries.iter_mut() {
            component.update(ctx);
        }
    }

    pub fn dispatch(&mut self, event: &E) {
        for (_, component) in self.entries.iter_mut() {
            component.on_event(event);
        }
    }
}
