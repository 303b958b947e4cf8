//! Test helpers for writing sequence files and recording store writes.

use super::*;
use crate::args::StoreConfig;
use crate::edit::RouteStoreBuilder;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::rc::Rc;
use stopline_core::test_support::{RecordingRouteStore, delivery, pickup, stop};
use stopline_core::{
    LegPlacement, LegType, OrderId, PositionChange, RouteStore, RouteStoreError, Stop,
};
use tempfile::TempDir;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test file");
}

/// Stops A, B and C where C delivers the order picked up at A.
pub(super) fn sample_stops() -> Vec<Stop> {
    vec![
        stop("A", &[pickup("O1")], &[]),
        stop("B", &[pickup("O2")], &[]),
        stop("C", &[], &[delivery("O1")]),
    ]
}

/// A sequence file inside its own temporary directory.
#[derive(Debug)]
pub(super) struct SequenceFile {
    _dir: TempDir,
    path: Utf8PathBuf,
}

impl SequenceFile {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self {
            _dir: dir,
            path: root.join("sequence.json"),
        }
    }

    pub(super) fn with_stops(stops: &[Stop]) -> Self {
        let file = Self::new();
        file.write_stops(stops);
        file
    }

    pub(super) fn write_stops(&self, stops: &[Stop]) {
        let payload = serde_json::to_vec_pretty(stops).expect("serialise stops");
        write_utf8(&self.path, &payload);
    }

    pub(super) fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// `RouteStore` handle sharing a [`RecordingRouteStore`] with the test.
struct SharedStore(Rc<RecordingRouteStore>);

impl RouteStore for SharedStore {
    fn reposition_stops(&self, changes: &[PositionChange]) -> Result<(), RouteStoreError> {
        self.0.reposition_stops(changes)
    }

    fn reposition_legs(&self, placements: &[LegPlacement]) -> Result<(), RouteStoreError> {
        self.0.reposition_legs(placements)
    }

    fn detach_leg(&self, order_id: &OrderId, leg_type: LegType) -> Result<(), RouteStoreError> {
        self.0.detach_leg(order_id, leg_type)
    }
}

/// Builder handing out a shared recording store and remembering the configs
/// it was asked for.
#[derive(Debug, Default)]
pub(super) struct RecordingStoreBuilder {
    pub(super) store: Rc<RecordingRouteStore>,
    pub(super) configs: RefCell<Vec<StoreConfig>>,
}

impl RecordingStoreBuilder {
    pub(super) fn failing(error: RouteStoreError) -> Self {
        Self {
            store: Rc::new(RecordingRouteStore::failing(error)),
            configs: RefCell::default(),
        }
    }
}

impl RouteStoreBuilder for RecordingStoreBuilder {
    fn build(&self, config: &StoreConfig) -> Result<Box<dyn RouteStore>, CliError> {
        self.configs.borrow_mut().push(config.clone());
        Ok(Box::new(SharedStore(Rc::clone(&self.store))))
    }
}
