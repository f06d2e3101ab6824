use crate::core::BodyHandle;
use crate::collision::BodyPair;
use std::collections::VecDeque;

/// Kinds of contact events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEventType {
    /// The manifold of a pair received its first contact point
    Begin,

    /// The manifold of a pair lost its last contact point, or the pair was destroyed
    End,
}

/// A contact event between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    pub event_type: ContactEventType,
    pub pair: BodyPair,
}

/// Kinds of body events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEventType {
    Added,
    Removed,
    /// Put to sleep by the deactivation pass
    Sleep,
    /// Woken up by a contact or a joint with an awake body
    Awake,
}

/// An event related to a single body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyEvent {
    pub event_type: BodyEventType,
    pub body: BodyHandle,
}

/// Events produced by the world, drained by the user.
///
/// Events stay readable until the next call to `DynamicsWorld::step` or
/// `DynamicsWorld::update` begins: that call drops whatever the previous one
/// delivered and was not read. Events pushed between two calls (body creation
/// and removal) survive the following call. The queue therefore never holds
/// more than two calls' worth of events.
#[derive(Debug, Default)]
pub struct EventQueue {
    contact_events: VecDeque<ContactEvent>,
    body_events: VecDeque<BodyEvent>,
    /// Leading events already delivered by the last step
    delivered_contacts: usize,
    delivered_bodies: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_contact_event(&mut self, event_type: ContactEventType, pair: BodyPair) {
        self.contact_events.push_back(ContactEvent { event_type, pair });
    }

    pub(crate) fn push_body_event(&mut self, event_type: BodyEventType, body: BodyHandle) {
        self.body_events.push_back(BodyEvent { event_type, body });
    }

    /// Pops the oldest contact event
    pub fn next_contact_event(&mut self) -> Option<ContactEvent> {
        self.delivered_contacts = self.delivered_contacts.saturating_sub(1);
        self.contact_events.pop_front()
    }

    /// Pops the oldest body event
    pub fn next_body_event(&mut self) -> Option<BodyEvent> {
        self.delivered_bodies = self.delivered_bodies.saturating_sub(1);
        self.body_events.pop_front()
    }

    /// Takes every pending contact event, oldest first
    pub fn drain_contact_events(&mut self) -> impl Iterator<Item = ContactEvent> + '_ {
        self.delivered_contacts = 0;
        self.contact_events.drain(..)
    }

    /// Takes every pending body event, oldest first
    pub fn drain_body_events(&mut self) -> impl Iterator<Item = BodyEvent> + '_ {
        self.delivered_bodies = 0;
        self.body_events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.contact_events.is_empty() && self.body_events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contact_events.len() + self.body_events.len()
    }

    pub fn clear(&mut self) {
        self.contact_events.clear();
        self.body_events.clear();
        self.delivered_contacts = 0;
        self.delivered_bodies = 0;
    }

    /// Drops the events delivered by the previous step that were not read
    pub(crate) fn begin_step(&mut self) {
        self.contact_events.drain(..self.delivered_contacts);
        self.body_events.drain(..self.delivered_bodies);
        self.delivered_contacts = 0;
        self.delivered_bodies = 0;
    }

    /// Marks every pending event as delivered
    pub(crate) fn end_step(&mut self) {
        self.delivered_contacts = self.contact_events.len();
        self.delivered_bodies = self.body_events.len();
    }
}
