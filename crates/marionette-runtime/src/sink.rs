//! Parameter sinks - where finished parameter maps go
//!
//! The renderer is an external collaborator. It receives exactly one
//! [`ParameterMap`] per tick through [`ParameterSink::deliver`], called
//! synchronously inside the tick, so implementations must return quickly.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use marionette_core::ParameterMap;

/// Consumer of per-tick parameter maps
pub trait ParameterSink: Send {
    fn deliver(&mut self, map: &ParameterMap);
}

impl<F> ParameterSink for F
where
    F: FnMut(&ParameterMap) + Send,
{
    fn deliver(&mut self, map: &ParameterMap) {
        self(map)
    }
}

/// Discards every map
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ParameterSink for NullSink {
    fn deliver(&mut self, _map: &ParameterMap) {}
}

/// Keeps every delivered map. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    maps: Arc<Mutex<Vec<ParameterMap>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn maps(&self) -> Vec<ParameterMap> {
        self.maps.lock().clone()
    }

    pub fn last(&self) -> Option<ParameterMap> {
        self.maps.lock().last().copied()
    }

    pub fn len(&self) -> usize {
        self.maps.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.lock().is_empty()
    }

    pub fn clear(&self) {
        self.maps.lock().clear();
    }
}

impl ParameterSink for RecordingSink {
    fn deliver(&mut self, map: &ParameterMap) {
        self.maps.lock().push(*map);
    }
}

/// Publishes the latest map on a tokio watch channel, for a renderer
/// running on its own thread or task
#[derive(Debug)]
pub struct WatchSink {
    tx: watch::Sender<ParameterMap>,
}

impl WatchSink {
    /// Sink plus a receiver starting at the neutral map
    pub fn channel() -> (Self, watch::Receiver<ParameterMap>) {
        let (tx, rx) = watch::channel(ParameterMap::neutral());
        (WatchSink { tx }, rx)
    }
}

impl ParameterSink for WatchSink {
    fn deliver(&mut self, map: &ParameterMap) {
        // never blocks; receivers only ever see the newest map
        self.tx.send_replace(*map);
    }
}
