use std::time::{Duration, Instant};

use storage::{LayoutStore, MemoryLayoutStore};

use super::*;
use crate::{
    plugin::{property_channel, PropertyWrites},
    test_support::{app_kind, widget_kind, Calls},
};

const SURFACE: Size = Size::new(1400.0, 700.0);
const WIDGET: Size = Size::new(100.0, 50.0);
const CLOCK_AT: Point = Point::new(100.0, 100.0);
const DATE_AT: Point = Point::new(400.0, 100.0);
const EMPTY_SPOT: Point = Point::new(1000.0, 600.0);

struct Fixture {
    controller: GestureController,
    store: Arc<MemoryLayoutStore>,
    clock: Arc<Calls>,
    music: Arc<Calls>,
    _writes: PropertyWrites,
    t0: Instant,
}

impl Fixture {
    fn at(&self, millis: u64) -> Instant {
        self.t0 + Duration::from_millis(millis)
    }

    async fn press(&mut self, point: Point, millis: u64) -> Vec<GestureOutcome> {
        let at = self.at(millis);
        self.controller.handle(TouchEvent::press(point, at)).await
    }

    async fn move_to(&mut self, point: Point, millis: u64) -> Vec<GestureOutcome> {
        let at = self.at(millis);
        self.controller.handle(TouchEvent::moved(point, at)).await
    }

    async fn release(&mut self, point: Point, millis: u64) -> Vec<GestureOutcome> {
        let at = self.at(millis);
        self.controller.handle(TouchEvent::release(point, at)).await
    }

    /// Press and hold on `point` until the hold fires, returning what it produced.
    async fn hold(&mut self, point: Point) -> Vec<GestureOutcome> {
        assert!(self.press(point, 0).await.is_empty());
        let deadline = self.controller.hold_deadline().unwrap();
        self.controller.tick(deadline)
    }

    fn control_center(&self, control: Control) -> Point {
        let rect = self.controller.overlay().unwrap().rect_of(control).unwrap();
        Point::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)
    }

    async fn tap_control(&mut self, control: Control) -> Vec<GestureOutcome> {
        let point = self.control_center(control);
        assert!(self.press(point, 5_000).await.is_empty());
        self.release(point, 5_100).await
    }

    fn clock_position(&self) -> Point {
        self.controller.registry().widget("clock").unwrap().position()
    }
}

async fn fixture() -> Fixture {
    let clock = Arc::new(Calls::default());
    let date = Arc::new(Calls::default());
    let music = Arc::new(Calls::default());
    let catalog = Arc::new(
        PluginCatalog::new([
            widget_kind("clock", WIDGET, &clock),
            widget_kind("date", WIDGET, &date),
            app_kind("music", Size::new(200.0, 100.0), &music),
        ])
        .unwrap(),
    );

    let store = Arc::new(MemoryLayoutStore::new());
    store.upsert_widget_state("clock", true, CLOCK_AT).await.unwrap();
    store.upsert_widget_state("date", true, DATE_AT).await.unwrap();

    let (sink, writes) = property_channel();
    let registry = PluginRegistry::bootstrap(&catalog, store.clone(), sink)
        .await
        .unwrap();
    let controller =
        GestureController::new(&InteractionConfig::default(), catalog, registry, SURFACE);

    Fixture {
        controller,
        store,
        clock,
        music,
        _writes: writes,
        t0: Instant::now(),
    }
}

fn clock_center() -> Point {
    CLOCK_AT.offset(50.0, 25.0)
}

#[tokio::test]
async fn short_press_is_a_tap() {
    let mut f = fixture().await;
    assert!(f.press(clock_center(), 0).await.is_empty());
    assert_eq!(f.controller.hold_deadline(), Some(f.at(1250)));

    let outcomes = f.release(clock_center(), 200).await;
    assert_eq!(
        outcomes,
        [GestureOutcome::Tapped {
            plugin: PluginId::new("clock")
        }]
    );
    assert_eq!(Calls::count(&f.clock.taps), 1);
    assert_eq!(f.clock_position(), CLOCK_AT);
    assert_eq!(f.controller.mode(), Mode::Idle);
    assert_eq!(f.controller.hold_deadline(), None);
}

#[tokio::test]
async fn release_away_from_the_press_point_is_not_a_tap() {
    let mut f = fixture().await;
    f.press(clock_center(), 0).await;
    assert!(f.release(clock_center().offset(3.0, 0.0), 200).await.is_empty());
    assert_eq!(Calls::count(&f.clock.taps), 0);
    assert_eq!(f.controller.mode(), Mode::Idle);
}

#[tokio::test]
async fn tick_before_the_deadline_does_nothing() {
    let mut f = fixture().await;
    f.press(clock_center(), 0).await;
    assert!(f.controller.tick(f.at(1249)).is_empty());
    assert_eq!(f.controller.mode(), Mode::Idle);
}

#[tokio::test]
async fn hold_on_a_widget_opens_the_editor() {
    let mut f = fixture().await;
    let outcomes = f.hold(clock_center()).await;

    assert!(matches!(
        &outcomes[..],
        [GestureOutcome::EditOpened { plugin, .. }] if plugin.as_str() == "clock"
    ));
    assert_eq!(f.controller.mode(), Mode::WidgetEdit);
    let session = f.controller.session().unwrap();
    assert_eq!(session.target.as_ref().unwrap().as_str(), "clock");
    assert_eq!(session.original_position, CLOCK_AT);
    assert_eq!(session.start_point, clock_center());
    assert_eq!(Calls::count(&f.clock.taps), 0);
}

#[tokio::test]
async fn late_event_fires_the_hold_first() {
    let mut f = fixture().await;
    f.press(clock_center(), 0).await;
    let outcomes = f.move_to(clock_center().offset(40.0, 0.0), 1300).await;

    assert!(matches!(outcomes[0], GestureOutcome::EditOpened { .. }));
    assert!(matches!(outcomes[1], GestureOutcome::WidgetMoved { .. }));
    assert_eq!(f.clock_position(), CLOCK_AT.offset(40.0, 0.0));
}

#[tokio::test]
async fn drag_then_confirm_persists_the_new_position() {
    let mut f = fixture().await;
    f.hold(clock_center()).await;
    f.move_to(clock_center().offset(40.0, 0.0), 1400).await;
    assert!(f.release(clock_center().offset(40.0, 0.0), 1500).await.is_empty());
    assert_eq!(f.controller.mode(), Mode::WidgetEdit);

    let outcomes = f.tap_control(Control::Confirm).await;
    let moved = CLOCK_AT.offset(40.0, 0.0);
    assert_eq!(
        outcomes,
        [GestureOutcome::EditConfirmed {
            plugin: PluginId::new("clock"),
            position: moved
        }]
    );
    assert_eq!(Calls::count(&f.clock.confirms), 1);
    assert_eq!(f.controller.mode(), Mode::Idle);

    let saved = f.store.widget_state("clock").await.unwrap();
    assert!(saved.enabled);
    assert_eq!(saved.position, moved);
}

#[tokio::test]
async fn releasing_the_opening_drag_on_a_control_fires_it() {
    let mut f = fixture().await;
    f.hold(clock_center()).await;
    let confirm = f.control_center(Control::Confirm);

    let outcomes = f.release(confirm, 1500).await;
    assert!(matches!(outcomes[..], [GestureOutcome::EditConfirmed { .. }]));
    assert_eq!(f.controller.mode(), Mode::Idle);
}

#[tokio::test]
async fn releasing_the_opening_drag_on_a_corner_control_keeps_editing() {
    let mut f = fixture().await;
    // 5 px inside the top-right corner, so the remove control rides under the finger.
    let grab = CLOCK_AT.offset(95.0, 5.0);
    f.hold(grab).await;
    f.move_to(grab.offset(40.0, 0.0), 1400).await;
    assert_eq!(f.clock_position(), Point::new(140.0, 100.0));
    assert_eq!(
        f.controller.overlay().unwrap().control_at(grab.offset(40.0, 0.0)),
        Some(Control::Remove)
    );

    let outcomes = f.release(grab.offset(40.0, 0.0), 1500).await;
    assert!(outcomes.is_empty());
    assert_eq!(f.controller.mode(), Mode::WidgetEdit);
    assert!(f.controller.registry().widget("clock").is_some());
    let saved = f.store.widget_state("clock").await.unwrap();
    assert!(saved.enabled);
    assert_eq!(saved.position, CLOCK_AT);

    // A deliberate press on the control still removes it.
    assert!(matches!(
        f.tap_control(Control::Remove).await[..],
        [GestureOutcome::WidgetRemoved { .. }]
    ));
}

#[tokio::test]
async fn drag_snaps_to_a_neighbour() {
    let mut f = fixture().await;
    f.hold(clock_center()).await;
    // 195 puts the right edge 5 px short of the date widget at 400.
    let outcomes = f.move_to(clock_center().offset(195.0, 0.0), 1400).await;

    match &outcomes[..] {
        [GestureOutcome::WidgetMoved { placement, .. }] => {
            assert!(matches!(placement, crate::snap::Placement::Neighbour { obstacle, .. } if obstacle.as_str() == "date"));
        }
        other => panic!("unexpected outcomes {other:?}"),
    }
    assert_eq!(f.clock_position(), Point::new(300.0, 100.0));
}

#[tokio::test]
async fn cancel_restores_the_original_position() {
    let mut f = fixture().await;
    f.hold(clock_center()).await;
    f.move_to(clock_center().offset(300.0, 200.0), 1400).await;
    f.release(clock_center().offset(300.0, 200.0), 1500).await;
    assert_ne!(f.clock_position(), CLOCK_AT);

    let outcomes = f.tap_control(Control::Cancel).await;
    assert_eq!(
        outcomes,
        [GestureOutcome::EditCancelled {
            plugin: PluginId::new("clock"),
            position: CLOCK_AT
        }]
    );
    assert_eq!(f.clock_position(), CLOCK_AT);
    assert_eq!(Calls::count(&f.clock.cancels), 1);
    assert_eq!(f.controller.mode(), Mode::Idle);
    assert_eq!(f.store.widget_state("clock").await.unwrap().position, CLOCK_AT);
}

#[tokio::test]
async fn remove_disables_the_widget() {
    let mut f = fixture().await;
    f.hold(clock_center()).await;
    f.release(clock_center(), 1500).await;

    let outcomes = f.tap_control(Control::Remove).await;
    assert_eq!(
        outcomes,
        [GestureOutcome::WidgetRemoved {
            plugin: PluginId::new("clock"),
            position: CLOCK_AT
        }]
    );
    assert!(f.controller.registry().widget("clock").is_none());
    assert_eq!(Calls::count(&f.clock.confirms), 0);
    let saved = f.store.widget_state("clock").await.unwrap();
    assert!(!saved.enabled);
    assert_eq!(saved.position, CLOCK_AT);
}

#[tokio::test]
async fn grow_and_shrink_reach_the_plugin() {
    let mut f = fixture().await;
    f.hold(clock_center()).await;
    f.release(clock_center(), 1500).await;

    assert!(matches!(
        f.tap_control(Control::Grow).await[..],
        [GestureOutcome::Resized { .. }]
    ));
    assert!(matches!(
        f.tap_control(Control::Shrink).await[..],
        [GestureOutcome::Resized { .. }]
    ));
    assert_eq!(Calls::count(&f.clock.grows), 1);
    assert_eq!(Calls::count(&f.clock.shrinks), 1);
    assert_eq!(f.controller.mode(), Mode::WidgetEdit);
}

#[tokio::test]
async fn presses_off_the_controls_are_ignored_while_editing() {
    let mut f = fixture().await;
    f.hold(clock_center()).await;
    f.release(clock_center(), 1500).await;

    assert!(f.press(EMPTY_SPOT, 2_000).await.is_empty());
    assert!(f.release(EMPTY_SPOT, 2_100).await.is_empty());
    assert!(f.press(EMPTY_SPOT, 2_200).await.is_empty());
    assert!(f.move_to(EMPTY_SPOT.offset(-400.0, 0.0), 2_300).await.is_empty());
    assert_eq!(f.controller.hold_deadline(), None);
    assert_eq!(f.clock_position(), CLOCK_AT);
    assert_eq!(f.controller.mode(), Mode::WidgetEdit);
}

#[tokio::test]
async fn control_needs_press_and_release_on_the_same_control() {
    let mut f = fixture().await;
    f.hold(clock_center()).await;
    f.release(clock_center(), 1500).await;

    let cancel = f.control_center(Control::Cancel);
    let confirm = f.control_center(Control::Confirm);
    f.press(cancel, 2_000).await;
    assert!(f.release(confirm, 2_100).await.is_empty());
    assert_eq!(f.controller.mode(), Mode::WidgetEdit);
}

#[tokio::test]
async fn overlay_actions_outside_edit_are_ignored() {
    let mut f = fixture().await;
    assert!(f.controller.confirm().await.is_empty());
    assert!(f.controller.cancel().is_empty());
    assert!(f.controller.remove().await.is_empty());
    assert!(f.controller.resize(true).is_empty());
    assert_eq!(f.controller.mode(), Mode::Idle);
}

#[tokio::test]
async fn hold_on_empty_space_opens_the_picker() {
    let mut f = fixture().await;
    let outcomes = f.hold(EMPTY_SPOT).await;
    match &outcomes[..] {
        [GestureOutcome::PickerOpened { entries }] => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].id.as_str(), "music");
            assert!(!entries[0].already_running);
        }
        other => panic!("unexpected outcomes {other:?}"),
    }
    assert_eq!(f.controller.mode(), Mode::AppPicker);
}

#[tokio::test]
async fn picking_a_thumbnail_launches_the_app() {
    let mut f = fixture().await;
    f.hold(EMPTY_SPOT).await;
    assert!(f.release(EMPTY_SPOT, 1500).await.is_empty());
    assert_eq!(f.controller.mode(), Mode::AppPicker);

    let thumb = f.controller.picker_entries().unwrap()[0].thumbnail;
    let center = Point::new(thumb.x + thumb.width / 2.0, thumb.y + thumb.height / 2.0);
    f.press(center, 2_000).await;
    let outcomes = f.release(center, 2_100).await;

    assert!(matches!(
        &outcomes[..],
        [GestureOutcome::AppLaunched { plugin, .. }] if plugin.as_str() == "music"
    ));
    assert_eq!(f.controller.mode(), Mode::Idle);
    assert_eq!(f.controller.registry().apps().len(), 1);
    assert_eq!(Calls::count(&f.music.instances), 1);
    assert!(f.music.accepted().is_some());
}

#[tokio::test]
async fn picking_a_running_app_raises_a_notice() {
    let mut f = fixture().await;
    f.controller.launch_app("music").await;

    f.hold(EMPTY_SPOT).await;
    f.release(EMPTY_SPOT, 1500).await;
    let entry = f.controller.picker_entries().unwrap()[0].clone();
    assert_eq!(entry.id.as_str(), "music");
    assert!(entry.already_running);

    let thumb = entry.thumbnail;
    let center = Point::new(thumb.x + thumb.width / 2.0, thumb.y + thumb.height / 2.0);
    assert!(f.press(center, 2_000).await.is_empty());
    let outcomes = f.release(center, 2_100).await;

    assert_eq!(outcomes, [GestureOutcome::Notice(Notice::already_open())]);
    assert_eq!(f.controller.mode(), Mode::Idle);
    assert_eq!(f.controller.registry().apps().len(), 1);
    assert_eq!(Calls::count(&f.music.instances), 1);
}

#[tokio::test]
async fn second_launch_raises_a_notice() {
    let mut f = fixture().await;
    assert!(matches!(
        f.controller.launch_app("music").await[..],
        [GestureOutcome::AppLaunched { .. }]
    ));

    let outcomes = f.controller.launch_app("music").await;
    assert_eq!(outcomes, [GestureOutcome::Notice(Notice::already_open())]);
    assert_eq!(f.controller.registry().apps().len(), 1);
    assert_eq!(Calls::count(&f.music.instances), 1);
}

#[tokio::test]
async fn unknown_or_widget_kinds_cannot_be_launched() {
    let mut f = fixture().await;
    for id in ["nope", "clock"] {
        match &f.controller.launch_app(id).await[..] {
            [GestureOutcome::Notice(notice)] => assert_eq!(notice.code, ErrorCode::NotFound),
            other => panic!("unexpected outcomes {other:?}"),
        }
    }
    assert!(f.controller.registry().apps().is_empty());
}

#[tokio::test]
async fn press_outside_thumbnails_dismisses_the_picker() {
    let mut f = fixture().await;
    f.hold(EMPTY_SPOT).await;
    f.release(EMPTY_SPOT, 1500).await;

    let outcomes = f.press(Point::new(5.0, 5.0), 2_000).await;
    assert_eq!(outcomes, [GestureOutcome::PickerDismissed]);
    assert_eq!(f.controller.mode(), Mode::Idle);
    assert!(f.release(Point::new(5.0, 5.0), 2_100).await.is_empty());
    assert!(f.controller.registry().apps().is_empty());
}

#[tokio::test]
async fn hold_on_an_app_drags_it_within_the_surface() {
    let mut f = fixture().await;
    f.controller.launch_app("music").await;
    let grab = Point::new(20.0, 90.0);

    assert_eq!(
        f.hold(grab).await,
        [GestureOutcome::AppDragStarted {
            plugin: PluginId::new("music")
        }]
    );
    let outcomes = f.move_to(grab.offset(-50.0, 300.0), 1400).await;
    assert_eq!(
        outcomes,
        [GestureOutcome::AppMoved {
            plugin: PluginId::new("music"),
            position: Point::new(0.0, 300.0)
        }]
    );
    let outcomes = f.release(grab.offset(-50.0, 300.0), 1500).await;
    assert_eq!(
        outcomes,
        [GestureOutcome::AppDragEnded {
            plugin: PluginId::new("music")
        }]
    );
    assert_eq!(f.controller.mode(), Mode::Idle);
}

#[tokio::test]
async fn press_on_app_over_widget_only_taps() {
    let mut f = fixture().await;
    f.controller.launch_app("music").await;
    // The app sits at the origin and covers the clock's top-left corner.
    let overlap = Point::new(150.0, 90.0);
    f.controller
        .registry()
        .widget("clock")
        .unwrap()
        .set_position(Point::new(100.0, 80.0));

    f.press(overlap, 0).await;
    assert!(f.controller.tick(f.at(5_000)).is_empty());
    assert_eq!(f.controller.mode(), Mode::Idle);

    let outcomes = f.release(overlap, 5_100).await;
    assert_eq!(
        outcomes,
        [GestureOutcome::Tapped {
            plugin: PluginId::new("music")
        }]
    );
    assert_eq!(Calls::count(&f.music.taps), 1);
    assert_eq!(Calls::count(&f.clock.taps), 0);
}

#[tokio::test]
async fn new_press_replaces_a_pending_hold() {
    let mut f = fixture().await;
    f.press(clock_center(), 0).await;
    f.press(EMPTY_SPOT, 1_000).await;
    assert_eq!(f.controller.hold_deadline(), Some(f.at(2_250)));
    let outcomes = f.controller.tick(f.at(2_250));
    assert!(matches!(outcomes[..], [GestureOutcome::PickerOpened { .. }]));
}

#[tokio::test]
async fn surface_resize_moves_the_footer_controls() {
    let mut f = fixture().await;
    f.controller.set_surface(Size::new(800.0, 400.0));
    f.hold(clock_center()).await;
    let confirm = f.controller.overlay().unwrap().rect_of(Control::Confirm).unwrap();
    assert_eq!(confirm.width, 50.0);
    assert_eq!(confirm.y + confirm.height / 2.0, 300.0);
}
