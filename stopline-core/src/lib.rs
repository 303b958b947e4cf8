//! Precedence-constrained stop sequencing for delivery routes.
//!
//! A [`Sequence`] is an ordered list of [`Stop`]s, each bundling the pickup
//! and delivery [`Leg`]s served at one place. Every order's pickup must come
//! strictly before its delivery. The engine offers four edits, each gated by
//! the validators in [`precedence`]:
//!
//! - move a stop ([`reorder::move_stop`]);
//! - merge a leg into an existing stop ([`mutate::apply_merge`]);
//! - give a leg a stop of its own ([`mutate::apply_create_stop`]);
//! - remove a leg ([`mutate::remove_leg`]).
//!
//! After any successful edit the sequence is renumbered `1..=N` and holds no
//! empty stops. [`RouteEditor`] ties the pieces to a drag-and-drop event
//! stream and a [`RouteStore`].
//!
//! # Examples
//!
//! ```
//! use stopline_core::mutate::remove_leg;
//! use stopline_core::{Leg, LegType, OrderId, Sequence, Stop};
//!
//! let mut sequence = Sequence::from_stops(vec![
//!     Stop::from_leg(Leg::new("O1", LegType::Pickup)),
//!     Stop::from_leg(Leg::new("O2", LegType::Pickup)),
//! ]);
//! let removal = remove_leg(&mut sequence, &OrderId::new("O2"), LegType::Pickup);
//! assert!(removal.is_some());
//! assert_eq!(sequence.len(), 1);
//! assert_eq!(sequence.check_invariants(), Ok(()));
//! ```

#![forbid(unsafe_code)]

pub mod editor;
pub mod leg;
pub mod merge;
pub mod mutate;
pub mod precedence;
pub mod reorder;
pub mod sequence;
pub mod session;
pub mod stop;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use editor::{EditError, EditOutcome, EditorResponse, RouteEditor};
pub use leg::{
    Contact, CustomerId, Leg, LegKey, LegType, OrderId, OrderSummary, ParseLegTypeError,
};
pub use merge::{LegDrag, MergeDecision};
pub use mutate::{LegMoveOutcome, LegPlacement, LegRemoval, MutationReport};
pub use reorder::{PositionChange, PositionMapping};
pub use sequence::{Sequence, SequenceError};
pub use session::{DragError, DragEvent, DragSession, DropPreview, Dragged};
pub use stop::{Bucket, Stop};
pub use store::{RouteStore, RouteStoreError};
