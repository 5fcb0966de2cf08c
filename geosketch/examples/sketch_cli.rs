//! Drives the engine without a GUI: constructs one shape of each family through the
//! event bus and prints the committed records as JSON.
//!
//! Run with `RUST_LOG=debug` to see the engine's event handling.

use std::cell::RefCell;
use std::rc::Rc;

use geosketch::geodesy::SphericalGeodesy;
use geosketch::renderer::DummyRenderer;
use geosketch::units::{DistanceUnit, RateUnit, TimeUnit};
use geosketch::{
    EventBus, InProcessBus, ShapeKind, SketchConfiguration, SketchController, SketchEvent,
};
use geosketch_types::latlon;

fn main() {
    env_logger::init();

    let controller = Rc::new(RefCell::new(SketchController::new(
        Rc::new(SphericalGeodesy::default()),
        Rc::new(DummyRenderer),
        SketchConfiguration::default().with_distance_unit(DistanceUnit::Kilometers),
    )));

    let mut bus = InProcessBus::new();
    SketchController::subscribe(controller.clone(), &mut bus);

    tokio_test::block_on(async {
        // A line from two clicks.
        bus.publish(SketchEvent::tab_selected(Some(ShapeKind::Line)))
            .await;
        bus.publish(SketchEvent::new_point(latlon!(55.75, 37.61)))
            .await;
        bus.publish(SketchEvent::new_point(latlon!(59.93, 30.33)))
            .await;

        // A circle from a center click and a travel-time radius.
        bus.publish(SketchEvent::tab_selected(Some(ShapeKind::Circle)))
            .await;
        bus.publish(SketchEvent::new_point(latlon!(34.4, -119.8)))
            .await;
        {
            let mut controller = controller.borrow_mut();
            let circle = controller.circle_mut();
            circle
                .set_rate_unit(RateUnit::new(DistanceUnit::Kilometers, TimeUnit::Hours))
                .and_then(|_| circle.set_travel_rate(50.0))
                .and_then(|_| circle.set_travel_time(2.0))
                .expect("valid travel parameters");
        }
        controller
            .borrow_mut()
            .commit_active()
            .await
            .expect("circle commits");

        // Interactive range rings ended by a double click.
        bus.publish(SketchEvent::tab_selected(Some(ShapeKind::RangeRing)))
            .await;
        controller
            .borrow_mut()
            .range_ring_mut()
            .set_mode(geosketch::builder::RingMode::Interactive);
        bus.publish(SketchEvent::new_point(latlon!(45.0, 10.0)))
            .await;
        bus.publish(SketchEvent::new_point(latlon!(45.0, 10.05)))
            .await;
        bus.publish(SketchEvent::new_point(latlon!(45.0, 10.1)))
            .await;
        bus.publish(SketchEvent::double_click(None)).await;
    });

    for record in controller.borrow_mut().take_committed() {
        println!(
            "{}",
            serde_json::to_string_pretty(&record).expect("record serializes")
        );
    }
}
