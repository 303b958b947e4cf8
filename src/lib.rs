//! Facade crate for the Stopline sequence engine.
//!
//! This crate re-exports the core domain types and exposes the optional HTTP
//! route store behind a feature flag.

#![forbid(unsafe_code)]

pub use stopline_core::{
    Bucket, Contact, CustomerId, DragError, DragEvent, DragSession, Dragged, DropPreview,
    EditError, EditOutcome, EditorResponse, Leg, LegDrag, LegKey, LegMoveOutcome, LegPlacement,
    LegRemoval, LegType, MergeDecision, MutationReport, OrderId, OrderSummary, PositionChange,
    PositionMapping, RouteEditor, RouteStore, RouteStoreError, Sequence, SequenceError, Stop,
};

#[cfg(feature = "store-http")]
pub use stopline_data::remote::{HttpRouteStore, HttpRouteStoreConfig, StoreBuildError};
