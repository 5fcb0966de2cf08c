//! Geosketch is a host-independent engine for constructing geodetic shapes from pointer
//! input: lines, circles, ellipses and range rings, all computed on the ellipsoid rather
//! than on screen coordinates.
//!
//! # Quick start
//!
//! A host wires the engine up by creating a [`SketchController`] over a geodesy backend
//! and a renderer, subscribing it to an event bus, and translating its native pointer
//! events into [`SketchEvent`]s:
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use geosketch::geodesy::SphericalGeodesy;
//! use geosketch::{
//!     EventBus, InProcessBus, ShapeKind, SketchConfiguration, SketchController, SketchEvent,
//! };
//! use geosketch::renderer::DummyRenderer;
//! use geosketch_types::latlon;
//!
//! # tokio_test::block_on(async {
//! let controller = Rc::new(RefCell::new(SketchController::new(
//!     Rc::new(SphericalGeodesy::default()),
//!     Rc::new(DummyRenderer),
//!     SketchConfiguration::default(),
//! )));
//!
//! let mut bus = InProcessBus::new();
//! SketchController::subscribe(controller.clone(), &mut bus);
//!
//! bus.publish(SketchEvent::tab_selected(Some(ShapeKind::Line))).await;
//! bus.publish(SketchEvent::new_point(latlon!(55.0, 37.0))).await;
//! bus.publish(SketchEvent::new_point(latlon!(55.5, 37.5))).await;
//!
//! let records = controller.borrow_mut().take_committed();
//! assert_eq!(records.len(), 1);
//! # });
//! ```
//!
//! Two clicks on the line tab produce one committed [`ShapeRecord`] carrying the line
//! geometry and its measured length and azimuth.
//!
//! # Main components
//!
//! * [`SketchController`] routes bus events to the active shape session and collects
//!   committed records. Each shape family keeps its own independent session, so
//!   switching tabs never mixes their captured points or unit selections.
//! * [`ShapeBuilder`](builder::ShapeBuilder) implementations hold the per-family
//!   capture protocol and numeric parameters. They are also usable directly, without a
//!   bus, when a host wants to drive construction from its own forms.
//! * [`GeodesyService`](geodesy::GeodesyService) is the measurement seam. All
//!   distances, bearings and outlines come from it; [`SphericalGeodesy`](geodesy::SphericalGeodesy)
//!   is the built-in spherical backend, and hosts with a higher-fidelity library plug it
//!   in here.
//! * [`SketchRenderer`](renderer::SketchRenderer) receives interim previews and
//!   committed shapes for display.
//!
//! All values cross the geodesy seam in meters and decimal degrees. Unit selections
//! affect only display, parsing and record labelling; see [`units`].

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod builder;
pub mod capture;
mod config;
mod controller;
pub mod error;
mod event;
mod feedback;
pub mod geodesy;
pub mod record;
pub mod renderer;
pub mod units;

pub use config::SketchConfiguration;
pub use controller::SketchController;
pub use error::SketchError;
pub use event::{
    EventBus, EventPropagation, HandlerId, InProcessBus, SketchEvent, SketchEventHandler, Topic,
};
pub use feedback::{FeedbackController, Preview, PreviewToken, Readout};
pub use record::{AttributeValue, RowIdSource, ShapeKind, ShapeRecord};

pub use geosketch_types;
