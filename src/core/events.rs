//! Combat event queue for host observers
//!
//! Damage itself resolves synchronously inside entity updates; the queue is
//! the observational record of what happened, consumed by whatever the host
//! wires up (console output, UI, sound) without coupling entities to it.
//!
//! # Design Principles
//!
//! - **Type Safety**: Every event is a strongly typed `CombatEvent` variant
//! - **Double Buffering**: Events pushed during one world update become
//!   visible on the next, so observers never see a half-written tick
//! - **Simplicity**: No subscriptions, just push and iterate
//!
//! # Example
//!
//! ```ignore
//! // After a world update
//! for event in world.events().iter() {
//!     if let CombatEvent::EntityDestroyed { entity, .. } = event {
//!         println!("{entity} is down");
//!     }
//! }
//! ```

use std::collections::VecDeque;

use crate::combat::Camp;
use crate::entity::EntityId;

// ============================================================================
// Event Types
// ============================================================================

/// Things that happened to entities during a world update.
///
/// # Extensibility
///
/// The `#[non_exhaustive]` attribute allows adding new variants without
/// breaking hosts that use wildcard patterns.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum CombatEvent {
    /// An entity entered the world.
    EntitySpawned {
        /// The new entity
        entity: EntityId,
        /// Camp it fights for
        camp: Camp,
    },

    /// An entity took damage.
    EntityDamaged {
        /// The entity that was hit
        entity: EntityId,
        /// Health actually removed, after policy and clamping
        amount: f32,
        /// Health remaining after the hit
        remaining: f32,
        /// Entity that caused the damage, if any
        source: Option<EntityId>,
    },

    /// An entity's health reached zero.
    EntityDestroyed {
        /// The destroyed entity
        entity: EntityId,
        /// Entity that landed the killing hit
        destroyer: Option<EntityId>,
    },

    /// An entity left the world.
    EntityHidden {
        /// The removed entity
        entity: EntityId,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Double-buffered event queue.
///
/// Events pushed during update N are available for reading during update
/// N+1, so readers always see a finished tick, never one that is still
/// being written.
///
/// # Performance
///
/// - Push: O(1) amortized
/// - Iteration: O(n)
/// - Swap: O(1)
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this update
    pending: VecDeque<CombatEvent>,
    /// Events from the previous update, ready for reading
    processing: VecDeque<CombatEvent>,
}

impl EventQueue {
    /// Default initial capacity for event queues.
    const DEFAULT_CAPACITY: usize = 64;

    /// Create a new event queue with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a new event queue with the given initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event to be read next update.
    #[inline]
    pub fn push(&mut self, event: CombatEvent) {
        self.pending.push_back(event);
    }

    /// Swap the pending and processing queues.
    ///
    /// Called once per update, at the start. After swapping, `iter()`
    /// returns the previous update's events and `push()` writes to a
    /// fresh pending queue.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over the previous update's events.
    ///
    /// The events stay in the queue until the next `swap()`.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &CombatEvent> {
        self.processing.iter()
    }

    /// Drain the previous update's events, taking ownership.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = CombatEvent> + '_ {
        self.processing.drain(..)
    }

    /// Whether there are any events ready for reading.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    /// Number of events ready for reading.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Number of events pending for the next update.
    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop all events, pending and processing.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_queue_push_and_swap() {
        let mut queue = EventQueue::new();

        queue.push(CombatEvent::EntityHidden {
            entity: EntityId(3),
        });
        assert!(queue.is_empty(), "events must not be visible before swap");

        queue.swap();
        assert_eq!(queue.len(), 1);

        let events: Vec<_> = queue.iter().collect();
        assert!(matches!(
            events[0],
            CombatEvent::EntityHidden {
                entity: EntityId(3)
            }
        ));
    }

    #[test]
    fn test_event_queue_double_buffer_isolation() {
        let mut queue = EventQueue::new();

        // Update 1: entity 1 spawns
        queue.push(CombatEvent::EntitySpawned {
            entity: EntityId(1),
            camp: Camp::Player,
        });
        queue.swap();

        // Update 2: entity 2 spawns while update 1's events are being read
        queue.push(CombatEvent::EntitySpawned {
            entity: EntityId(2),
            camp: Camp::Enemy,
        });

        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            CombatEvent::EntitySpawned {
                entity: EntityId(1),
                ..
            }
        ));

        // Update 3: now entity 2's spawn is visible
        queue.swap();
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            CombatEvent::EntitySpawned {
                entity: EntityId(2),
                ..
            }
        ));
    }

    #[test]
    fn test_event_queue_drain() {
        let mut queue = EventQueue::new();

        queue.push(CombatEvent::EntityHidden {
            entity: EntityId(1),
        });
        queue.push(CombatEvent::EntityHidden {
            entity: EntityId(2),
        });
        queue.swap();

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(events.len(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_queue_clear() {
        let mut queue = EventQueue::new();

        queue.push(CombatEvent::EntityHidden {
            entity: EntityId(1),
        });
        queue.swap();
        queue.push(CombatEvent::EntityHidden {
            entity: EntityId(2),
        });

        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_damaged_event_fields() {
        let event = CombatEvent::EntityDamaged {
            entity: EntityId(7),
            amount: 30.0,
            remaining: 70.0,
            source: Some(EntityId(2)),
        };

        if let CombatEvent::EntityDamaged {
            amount,
            remaining,
            source,
            ..
        } = event
        {
            assert!((amount - 30.0).abs() < f32::EPSILON);
            assert!((remaining - 70.0).abs() < f32::EPSILON);
            assert_eq!(source, Some(EntityId(2)));
        } else {
            panic!("wrong event type");
        }
    }

    #[test]
    fn test_event_order_preserved_within_update() {
        let mut queue = EventQueue::new();

        for index in 0..4 {
            queue.push(CombatEvent::EntityHidden {
                entity: EntityId(index),
            });
        }
        queue.swap();

        let ids: Vec<u32> = queue
            .iter()
            .map(|event| match event {
                CombatEvent::EntityHidden { entity } => entity.0,
                _ => panic!("wrong event type"),
            })
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }
}
