//! Named-topic publish/subscribe decoupling input capture from the builders.
//!
//! Host adapters translate their native pointer and keyboard events into
//! [`SketchEvent`]s and publish them on an [`EventBus`]. The engine side subscribes a
//! [`SketchEventHandler`] (normally the [`SketchController`](crate::SketchController))
//! on activation and unsubscribes it on teardown. [`InProcessBus`] is the default
//! single-threaded implementation; hosts with their own message plumbing can implement
//! the trait over it instead.

use async_trait::async_trait;
use geosketch_types::GeodeticPoint;

use crate::record::ShapeKind;

/// Topics the engine subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// A point was captured (click).
    NewPoint,
    /// The pointer moved without capturing a point.
    PointerMove,
    /// A double click, ending open-ended capture.
    DoubleClick,
    /// Escape was pressed; cancels the active capture.
    KeyEscape,
    /// A shape tab was selected or deselected.
    TabSelected,
}

impl Topic {
    /// All topics, for subscribing a handler to everything.
    pub const ALL: [Topic; 5] = [
        Topic::NewPoint,
        Topic::PointerMove,
        Topic::DoubleClick,
        Topic::KeyEscape,
        Topic::TabSelected,
    ];
}

/// An event published on the bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SketchEvent {
    /// Topic the event belongs to.
    pub topic: Topic,
    /// The point payload, if the event carries one.
    pub point: Option<GeodeticPoint>,
    /// For [`Topic::TabSelected`]: the newly selected shape tab, or `None` when all
    /// tabs were deselected.
    pub tab: Option<ShapeKind>,
}

impl SketchEvent {
    /// A captured point.
    pub fn new_point(point: GeodeticPoint) -> Self {
        Self {
            topic: Topic::NewPoint,
            point: Some(point),
            tab: None,
        }
    }

    /// A pointer move.
    pub fn pointer_move(point: GeodeticPoint) -> Self {
        Self {
            topic: Topic::PointerMove,
            point: Some(point),
            tab: None,
        }
    }

    /// A double click at an optional position.
    pub fn double_click(point: Option<GeodeticPoint>) -> Self {
        Self {
            topic: Topic::DoubleClick,
            point,
            tab: None,
        }
    }

    /// An Escape key press.
    pub fn key_escape() -> Self {
        Self {
            topic: Topic::KeyEscape,
            point: None,
            tab: None,
        }
    }

    /// A tab selection change.
    pub fn tab_selected(tab: Option<ShapeKind>) -> Self {
        Self {
            topic: Topic::TabSelected,
            point: None,
            tab,
        }
    }
}

/// Value returned by a [`SketchEventHandler`] to indicate the status of the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPropagation {
    /// Event should be propagated to the next handler.
    Propagate,
    /// Event should not be propagated to the next handler.
    Stop,
}

/// Subscriber side of the bus.
#[async_trait(?Send)]
pub trait SketchEventHandler {
    /// Handle the event.
    async fn handle(&mut self, event: &SketchEvent) -> EventPropagation;
}

/// Id of a subscription, used to unsubscribe.
pub type HandlerId = usize;

/// The event bus interface the engine requires from its host.
#[async_trait(?Send)]
pub trait EventBus {
    /// Registers a handler for the given topics.
    fn subscribe(&mut self, topics: &[Topic], handler: Box<dyn SketchEventHandler>) -> HandlerId;

    /// Removes a previously registered handler. Unknown ids are ignored.
    fn unsubscribe(&mut self, id: HandlerId);

    /// Delivers an event to all handlers subscribed to its topic, in subscription
    /// order, until one of them stops propagation.
    async fn publish(&mut self, event: SketchEvent);
}

struct Subscription {
    id: HandlerId,
    topics: Vec<Topic>,
    handler: Box<dyn SketchEventHandler>,
}

/// Single-threaded in-process implementation of [`EventBus`].
///
/// Events are dispatched synchronously during `publish`; each handler runs to
/// completion before the next one sees the event.
#[derive(Default)]
pub struct InProcessBus {
    subscriptions: Vec<Subscription>,
    next_id: HandlerId,
}

impl InProcessBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

#[async_trait(?Send)]
impl EventBus for InProcessBus {
    fn subscribe(&mut self, topics: &[Topic], handler: Box<dyn SketchEventHandler>) -> HandlerId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            topics: topics.to_vec(),
            handler,
        });
        id
    }

    fn unsubscribe(&mut self, id: HandlerId) {
        self.subscriptions.retain(|s| s.id != id);
    }

    async fn publish(&mut self, event: SketchEvent) {
        for subscription in &mut self.subscriptions {
            if !subscription.topics.contains(&event.topic) {
                continue;
            }

            match subscription.handler.handle(&event).await {
                EventPropagation::Propagate => {}
                EventPropagation::Stop => break,
            }
        }
    }
}
