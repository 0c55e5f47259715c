//! The simulator module provides the mechanics of discrete event
//! simulation: a simulation clock and a time-ordered queue of pending
//! events.  The queue has no knowledge of queueing resources or any other
//! domain; models define their own event kinds and supply a dispatch
//! handler.
//!
//! Events are dispatched in non-decreasing time order.  Events scheduled
//! for the same time are dispatched in the order they were scheduled, so
//! replaying identical inputs yields identical dispatch sequences.
//!
//! The `step`, `step_n`, and `run` methods drive the dispatch loop.  `run`
//! stops at the horizon without advancing the clock past it, and dispatches
//! events scheduled exactly at the horizon.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::{debug, trace};

use crate::utils::errors::SimulationError;

/// A scheduled occurrence.  The kind is a caller-defined type, whose
/// variants carry any payload the handler needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<K> {
    time: f64,
    sequence: u64,
    kind: K,
}

impl<K> Event<K> {
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The insertion order of the event, which breaks ties in time.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn into_kind(self) -> K {
        self.kind
    }
}

/// Min-heap ordering on (time, sequence) for the max-heap `BinaryHeap`.
#[derive(Debug)]
struct QueueEntry<K>(Event<K>);

impl<K> PartialEq for QueueEntry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K> Eq for QueueEntry<K> {}

impl<K> PartialOrd for QueueEntry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for QueueEntry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .time
            .total_cmp(&self.0.time)
            .then_with(|| other.0.sequence.cmp(&self.0.sequence))
    }
}

/// The pending events of a simulation run, together with the simulation
/// clock.  The clock only moves forward, to the time of each dispatched
/// event.
#[derive(Debug)]
pub struct EventQueue<K> {
    now: f64,
    next_sequence: u64,
    pending: BinaryHeap<QueueEntry<K>>,
}

impl<K> Default for EventQueue<K> {
    fn default() -> Self {
        Self {
            now: 0.0,
            next_sequence: 0,
            pending: BinaryHeap::new(),
        }
    }
}

impl<K: std::fmt::Debug> EventQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current simulation time.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The time of the next pending event, without removing it.
    pub fn peek_time(&self) -> Option<f64> {
        self.pending.peek().map(|entry| entry.0.time)
    }

    /// Schedule an event, returning its sequence number.  Scheduling into
    /// the past, or at a non-finite time, fails.
    pub fn schedule(&mut self, time: f64, kind: K) -> Result<u64, SimulationError> {
        if !time.is_finite() || time < self.now {
            return Err(SimulationError::InvalidTime {
                time,
                now: self.now,
            });
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.push(QueueEntry(Event {
            time,
            sequence,
            kind,
        }));
        Ok(sequence)
    }

    /// Remove the earliest event and advance the clock to its time.
    pub fn pop_next(&mut self) -> Result<Event<K>, SimulationError> {
        let QueueEntry(event) = self.pending.pop().ok_or(SimulationError::EmptyQueue)?;
        self.now = event.time;
        Ok(event)
    }

    /// Dispatch exactly one event.
    pub fn step<F>(&mut self, dispatch: &mut F) -> Result<(), SimulationError>
    where
        F: FnMut(&mut EventQueue<K>, Event<K>) -> Result<(), SimulationError>,
    {
        let event = self.pop_next()?;
        trace!(time = event.time, sequence = event.sequence, kind = ?event.kind, "dispatch");
        dispatch(self, event)
    }

    /// Dispatch up to `n` events, stopping early if the queue empties.
    /// Returns the number of dispatched events.
    pub fn step_n<F>(&mut self, n: usize, mut dispatch: F) -> Result<usize, SimulationError>
    where
        F: FnMut(&mut EventQueue<K>, Event<K>) -> Result<(), SimulationError>,
    {
        let mut dispatched = 0;
        while dispatched < n && !self.is_empty() {
            self.step(&mut dispatch)?;
            dispatched += 1;
        }
        Ok(dispatched)
    }

    /// Dispatch events in time order until the queue empties or the next
    /// event lies beyond `until`.  The clock is never advanced past `until`.
    /// Returns the number of dispatched events.
    pub fn run<F>(&mut self, until: f64, mut dispatch: F) -> Result<usize, SimulationError>
    where
        F: FnMut(&mut EventQueue<K>, Event<K>) -> Result<(), SimulationError>,
    {
        debug!(now = self.now, until, pending = self.len(), "run started");
        let mut dispatched = 0;
        while let Some(next_time) = self.peek_time() {
            if next_time > until {
                break;
            }
            self.step(&mut dispatch)?;
            dispatched += 1;
        }
        debug!(now = self.now, dispatched, pending = self.len(), "run finished");
        Ok(dispatched)
    }
}
