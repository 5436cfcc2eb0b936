// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parcelview Stage: single-selection query stage for parcel maps.
//!
//! ## Overview
//!
//! An operator selects a parcel by clicking it or searching an address. The
//! stage pins that one selection, pulses its highlight, frames the viewport on
//! it, and lets overlays work against it:
//!
//! - the satellite overlay reveals imagery only inside the parcel's buffer zone,
//!   using an even-odd mask over the rest of the world;
//! - the size overlay outlines the parcel and labels its area;
//! - draw mode locks navigation over the satellite view for sketching.
//!
//! ## Modules
//!
//! - [`stage`]: [`QueryStage`], the Idle ⇄ Active(roll) state machine.
//! - [`overlay`]: overlay lifecycle with fail-soft, race-gated rebuilds.
//! - [`draw`]: draw mode and its satellite precondition.
//! - [`registry`]: parcels and zones by roll, with an R-tree hit test.
//! - [`gate`]: the rebuild race gate.
//! - [`blink`]: a repeating task holding at most one live timer.
//! - [`style`]: parcel and overlay styles.
//! - [`host`]: the capabilities the stage consumes ([`MapEngine`], [`Scheduler`],
//!   [`Shell`], [`RecordLookup`]).
//! - [`headless`]: in-memory implementations of every host capability.
//!
//! ## Errors
//!
//! User-initiated actions return typed errors ([`OverlayError`], [`DrawError`])
//! and also write them to the status line. Automatic rebuilds after viewport
//! changes swallow failures and log them at debug level. Every teardown and
//! stop is idempotent; nothing here panics on a missing handle.
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`]. Stage transitions and overlay changes
//! log at debug level; zone join mismatches log at warn level. The crate never
//! installs a subscriber.
//!
//! ## Example
//!
//! ```
//! use parcelview_geom::{Geometry, LatLng};
//! use parcelview_stage::headless::{HeadlessMap, ManualScheduler, RecordingShell};
//! use parcelview_stage::{ParcelRegistry, QueryStage, Roll, StageConfig};
//!
//! let lot = vec![[0.0, 0.0], [0.001, 0.0], [0.001, 0.001], [0.0, 0.001], [0.0, 0.0]];
//! let registry = ParcelRegistry::new([(Roll::from("7"), Geometry::Polygon(vec![lot]))], []);
//! let mut stage = QueryStage::new(
//!     HeadlessMap::default(),
//!     ManualScheduler::new(),
//!     RecordingShell::new(),
//!     registry,
//!     StageConfig::default(),
//! );
//!
//! stage.enter(Roll::from("7"), Default::default());
//!
//! // No zone was loaded for roll 7, so the satellite overlay refuses.
//! assert!(stage.toggle_satellite(Some(true)).is_err());
//! assert!(!stage.satellite().is_on());
//! assert_eq!(
//!     stage.shell().last(),
//!     Some("Zone not found for roll 7 (join mismatch).")
//! );
//! ```

pub mod blink;
pub mod draw;
pub mod gate;
pub mod headless;
pub mod host;
pub mod overlay;
pub mod registry;
pub mod stage;
pub mod style;
pub mod types;

pub use draw::{DrawError, DrawMode};
pub use host::{MapEngine, NoRecords, RecordLookup, RenderError, Scheduler, Shell};
pub use overlay::{OverlayError, OverlayKind, RebuildReport, SatelliteOverlay, SizeOverlay};
pub use registry::ParcelRegistry;
pub use stage::{QueryStage, ViewportReport};
pub use style::{ParcelStyle, Rgba, Severity, ShapeStyle, parcel_style};
pub use types::{ClickOutcome, EnterOptions, Roll, Selection, StageConfig};
