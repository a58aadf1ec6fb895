use scrollwork_animation::{
    AnimationPreset, AnimationScheduler, CursorFollower, Easing, HoverBinder, ParallaxBinder,
    ParallaxTarget, PlayState, Position, Scrub, Sensitivity, StyleProps, Timeline,
    TimelineOptions, ToggleActions, TriggerDescriptor,
};
use scrollwork_core::{NodeId, Rect};

const VIEWPORT_HEIGHT: f32 = 1000.0;

/// A 500px section whose top sits at y = 2000; "top 80%" starts at scroll 1200
fn about_page() -> (AnimationScheduler, NodeId, NodeId) {
    let mut scheduler = AnimationScheduler::new(1280.0, VIEWPORT_HEIGHT);
    let region = scheduler
        .nodes_mut()
        .insert(Rect::new(0.0, 2000.0, 1280.0, 500.0));
    let title = scheduler
        .nodes_mut()
        .insert_child(region, Rect::new(80.0, 2040.0, 600.0, 80.0))
        .unwrap();
    (scheduler, region, title)
}

fn scroll_for_top_at(fraction: f32) -> f32 {
    2000.0 - fraction * VIEWPORT_HEIGHT
}

#[test]
fn teardown_leaves_no_tweens_or_listeners() {
    let (mut scheduler, region, title) = about_page();
    let about = scheduler.mount_section("about");
    let (from, to) = AnimationPreset::fade_up(30.0);

    scheduler
        .register_timeline(
            about,
            &[title],
            from,
            to,
            TimelineOptions::new(800).trigger(TriggerDescriptor::new(region)),
        )
        .unwrap();
    scheduler
        .register_pointer_binder(about, region, [title], Sensitivity::tilt(20.0))
        .unwrap();
    scheduler
        .register_hover(
            about,
            HoverBinder::new(region, StyleProps::scale(1.0), StyleProps::scale(1.02)),
        )
        .unwrap();
    scheduler.watch_scroll_threshold(about, 20.0).unwrap();

    scheduler.scroll_to(scroll_for_top_at(0.5));
    scheduler.pointer_at(300.0, 2100.0);
    assert!(scheduler.active_tween_count(about) > 0);
    assert_eq!(scheduler.listener_count(about), 5);

    assert!(scheduler.teardown(about));
    assert_eq!(scheduler.active_tween_count(about), 0);
    assert_eq!(scheduler.listener_count(about), 0);
    assert_eq!(scheduler.total_listener_count(), 0);
    assert!(!scheduler.has_active_animations());

    assert!(!scheduler.teardown(about));
    assert!(scheduler
        .register_timeline(about, &[title], from, to, TimelineOptions::default())
        .is_none());
}

#[test]
fn remounting_a_section_does_not_leak_listeners() {
    let (mut scheduler, region, title) = about_page();
    for _ in 0..3 {
        let about = scheduler.mount_section("about");
        let (from, to) = AnimationPreset::fade_up(30.0);
        scheduler.register_timeline(
            about,
            &[title],
            from,
            to,
            TimelineOptions::new(800).trigger(TriggerDescriptor::new(region)),
        );
        scheduler.register_pointer_binder(about, region, [title], Sensitivity::tilt(20.0));
    }
    assert_eq!(scheduler.total_listener_count(), 2);
}

#[test]
fn reversible_timeline_ends_at_from_regardless_of_toggles() {
    let (mut scheduler, region, title) = about_page();
    let about = scheduler.mount_section("about");
    let (from, to) = AnimationPreset::fade_up(30.0);
    let id = scheduler
        .register_timeline(
            about,
            &[title],
            from,
            to,
            TimelineOptions::new(800)
                .easing(Easing::EaseOutQuart)
                .trigger(TriggerDescriptor::new(region)),
        )
        .unwrap();

    let inside = scroll_for_top_at(0.5);
    let above = scroll_for_top_at(0.9);
    for played_ms in [0.0, 120.0, 400.0, 800.0, 1600.0, 16.0] {
        scheduler.scroll_to(inside);
        scheduler.advance(played_ms);
        scheduler.scroll_to(above);
        scheduler.advance(37.0);
    }
    scheduler.advance(2000.0);

    let timeline = scheduler.timeline(id).unwrap();
    assert_eq!(timeline.state(), PlayState::Finished);
    assert!(timeline.is_reversed());

    let style = scheduler.nodes().style(title).unwrap();
    assert_eq!(style.opacity, 0.0);
    assert_eq!(style.translate_y, 30.0);
}

#[test]
fn stagger_schedules_item_k_at_k_times_delay() {
    let mut scheduler = AnimationScheduler::new(1280.0, 800.0);
    let skills = scheduler.mount_section("skills");
    let bars: Vec<NodeId> = (0..5)
        .map(|k| {
            scheduler
                .nodes_mut()
                .insert(Rect::new(0.0, 100.0 * k as f32, 400.0, 12.0))
        })
        .collect();
    let (from, to) = AnimationPreset::grow_width(80.0);

    let id = scheduler
        .register_timeline(
            skills,
            &bars,
            from,
            to,
            TimelineOptions::new(200).easing(Easing::Linear).stagger(100),
        )
        .unwrap();

    let timeline = scheduler.timeline(id).unwrap();
    assert_eq!(timeline.offsets_ms(), vec![0.0, 100.0, 200.0, 300.0, 400.0]);
    assert_eq!(timeline.duration_ms(), 600);

    scheduler.advance(250.0);
    let width = |k: usize| scheduler.nodes().style(bars[k]).unwrap().width_pct;
    assert!((width(0) - 80.0).abs() < 1e-4);
    assert!((width(1) - 60.0).abs() < 1e-4);
    assert!((width(2) - 20.0).abs() < 1e-4);
    assert_eq!(width(3), 0.0);
    assert_eq!(width(4), 0.0);
}

#[test]
fn threshold_crossing_fires_exactly_once_each_way() {
    let (mut scheduler, region, title) = about_page();
    let about = scheduler.mount_section("about");
    // Restart and reset both write immediately, so writes reveal every fire
    let actions: ToggleActions = "restart none none reset".parse().unwrap();
    let id = scheduler
        .register_timeline(
            about,
            &[title],
            StyleProps::opacity(0.0),
            StyleProps::opacity(1.0),
            TimelineOptions::new(800)
                .immediate_render(false)
                .trigger(TriggerDescriptor::new(region).actions(actions)),
        )
        .unwrap();
    assert_eq!(scheduler.trigger(id).unwrap().start_px(), 1200.0);

    assert_eq!(scheduler.scroll_to(scroll_for_top_at(0.81)), 0);

    assert_eq!(scheduler.scroll_to(scroll_for_top_at(0.79)), 1);
    for _ in 0..10 {
        assert_eq!(scheduler.scroll_to(scroll_for_top_at(0.79)), 0);
    }
    assert_eq!(scheduler.timeline(id).unwrap().state(), PlayState::Playing);

    assert_eq!(scheduler.scroll_to(scroll_for_top_at(0.81)), 1);
    for _ in 0..10 {
        assert_eq!(scheduler.scroll_to(scroll_for_top_at(0.81)), 0);
    }
    assert_eq!(scheduler.timeline(id).unwrap().state(), PlayState::Idle);
}

#[test]
fn default_actions_play_forward_then_reverse() {
    let (mut scheduler, region, title) = about_page();
    let about = scheduler.mount_section("about");
    let id = scheduler
        .register_timeline(
            about,
            &[title],
            StyleProps::opacity(0.0),
            StyleProps::opacity(1.0),
            TimelineOptions::new(800).trigger(TriggerDescriptor::new(region)),
        )
        .unwrap();

    scheduler.scroll_to(scroll_for_top_at(0.79));
    let timeline = scheduler.timeline(id).unwrap();
    assert!(timeline.is_playing() && !timeline.is_reversed());

    scheduler.scroll_to(scroll_for_top_at(0.81));
    let timeline = scheduler.timeline(id).unwrap();
    assert!(timeline.is_reversed());
}

#[test]
fn teardown_mid_tween_stops_style_writes() {
    let (mut scheduler, region, title) = about_page();
    let about = scheduler.mount_section("about");
    let (from, to) = AnimationPreset::fade_up(30.0);
    scheduler.register_timeline(
        about,
        &[title],
        from,
        to,
        TimelineOptions::new(800).trigger(TriggerDescriptor::new(region)),
    );
    scheduler
        .register_parallax(
            about,
            ParallaxBinder::new(region, [ParallaxTarget::new(title, 0.5)], Sensitivity::tilt(20.0)),
        )
        .unwrap();

    scheduler.scroll_to(scroll_for_top_at(0.5));
    scheduler.pointer_at(1000.0, 2400.0);
    scheduler.advance(200.0);
    assert!(scheduler.active_tween_count(about) > 0);

    let writes = scheduler.nodes().write_count(title);
    let total = scheduler.nodes().total_writes();
    assert!(scheduler.teardown(about));

    assert_eq!(scheduler.advance(1000.0), 0);
    assert_eq!(scheduler.scroll_to(0.0), 0);
    assert_eq!(scheduler.pointer_at(640.0, 2250.0), 0);
    assert_eq!(scheduler.nodes().write_count(title), writes);
    assert_eq!(scheduler.nodes().total_writes(), total);
}

#[test]
fn parallax_center_maps_to_zero_and_edges_to_half_sensitivity() {
    let mut scheduler = AnimationScheduler::new(1280.0, 800.0);
    let hero = scheduler.mount_section("hero");
    let region = scheduler
        .nodes_mut()
        .insert(Rect::new(0.0, 0.0, 1280.0, 800.0));
    let image = scheduler
        .nodes_mut()
        .insert_child(region, Rect::new(400.0, 200.0, 480.0, 400.0))
        .unwrap();
    scheduler
        .register_parallax(
            hero,
            ParallaxBinder::new(region, [image], Sensitivity::tilt(20.0)).smoothing(0),
        )
        .unwrap();

    scheduler.pointer_at(1280.0, 400.0);
    let style = *scheduler.nodes().style(image).unwrap();
    assert!((style.rotate_y - 10.0).abs() < 1e-4);
    assert!(style.rotate_x.abs() < 1e-4);

    scheduler.pointer_at(640.0, 400.0);
    let style = *scheduler.nodes().style(image).unwrap();
    assert!(style.rotate_y.abs() < 1e-6);
    assert!(style.rotate_x.abs() < 1e-6);
}

#[test]
fn parallax_smoothing_eases_toward_the_last_sample_only() {
    let mut scheduler = AnimationScheduler::new(1000.0, 1000.0);
    let about = scheduler.mount_section("about");
    let region = scheduler
        .nodes_mut()
        .insert(Rect::new(0.0, 0.0, 1000.0, 1000.0));
    scheduler
        .register_parallax(
            about,
            ParallaxBinder::new(region, [region], Sensitivity::tilt(20.0))
                .smoothing(500)
                .easing(Easing::Linear),
        )
        .unwrap();

    scheduler.pointer_at(1000.0, 500.0);
    scheduler.advance(250.0);
    let halfway = scheduler.nodes().style(region).unwrap().rotate_y;
    assert!((halfway - 5.0).abs() < 1e-3);

    // A new sample replaces the in-flight tween rather than stacking on it
    scheduler.pointer_at(500.0, 500.0);
    assert_eq!(scheduler.active_tween_count(about), 1);
    scheduler.advance(500.0);
    assert!(scheduler.nodes().style(region).unwrap().rotate_y.abs() < 1e-4);
    assert_eq!(scheduler.active_tween_count(about), 0);
}

#[test]
fn scrubbed_background_follows_scroll() {
    let mut scheduler = AnimationScheduler::new(1280.0, 800.0);
    let hero = scheduler.mount_section("hero");
    let section = scheduler
        .nodes_mut()
        .insert(Rect::new(0.0, 0.0, 1280.0, 800.0));
    let (from, to) = AnimationPreset::background_drift(30.0);
    let trigger = TriggerDescriptor::new(section)
        .start("top top".parse().unwrap())
        .end("bottom top".parse().unwrap())
        .scrub(Scrub::Immediate);
    scheduler
        .register_timeline(
            hero,
            &[section],
            from,
            to,
            TimelineOptions::new(1000)
                .easing(Easing::Linear)
                .trigger(trigger),
        )
        .unwrap();

    scheduler.scroll_to(400.0);
    let pct = scheduler.nodes().style(section).unwrap().background_y_pct;
    assert!((pct - 15.0).abs() < 1e-4);

    scheduler.scroll_to(2000.0);
    assert_eq!(scheduler.nodes().style(section).unwrap().background_y_pct, 30.0);
    assert_eq!(scheduler.active_tween_count(hero), 0);
}

#[test]
fn sequence_positions_overlap_previous_steps() {
    let mut scheduler = AnimationScheduler::new(1280.0, 800.0);
    let hero = scheduler.mount_section("hero");
    let heading = scheduler.nodes_mut().insert(Rect::new(0.0, 200.0, 800.0, 80.0));
    let subtitle = scheduler.nodes_mut().insert(Rect::new(0.0, 300.0, 800.0, 40.0));
    let cta = scheduler.nodes_mut().insert(Rect::new(0.0, 360.0, 200.0, 40.0));

    let ease: Easing = "power3.out".parse().unwrap();
    let overlap: Position = "-=0.4".parse().unwrap();
    let timeline = Timeline::new()
        .from_to(
            heading,
            StyleProps::translate(0.0, 50.0).with_opacity(0.0),
            StyleProps::translate(0.0, 0.0).with_opacity(1.0),
            1000,
            ease,
            Position::End,
        )
        .from_to(
            subtitle,
            StyleProps::translate(0.0, 20.0).with_opacity(0.0),
            StyleProps::translate(0.0, 0.0).with_opacity(1.0),
            800,
            ease,
            overlap,
        )
        .from_to(
            cta,
            StyleProps::translate(0.0, 20.0).with_opacity(0.0),
            StyleProps::translate(0.0, 0.0).with_opacity(1.0),
            800,
            ease,
            overlap,
        );

    let id = scheduler.register_sequence(hero, timeline, None).unwrap();
    assert_eq!(
        scheduler.timeline(id).unwrap().offsets_ms(),
        vec![0.0, 600.0, 1000.0]
    );
    assert_eq!(scheduler.nodes().style(cta).unwrap().opacity, 0.0);

    scheduler.advance(1800.0);
    for node in [heading, subtitle, cta] {
        assert_eq!(scheduler.nodes().style(node).unwrap().opacity, 1.0);
    }
}

#[test]
fn infinite_rotation_pauses_off_screen_and_resumes_on_return() {
    let (mut scheduler, region, _) = about_page();
    let skills = scheduler.mount_section("skills");
    let cube = scheduler
        .nodes_mut()
        .insert_child(region, Rect::new(800.0, 2000.0, 400.0, 400.0))
        .unwrap();
    let trigger = TriggerDescriptor::new(cube)
        .start("top bottom".parse().unwrap())
        .end("bottom top".parse().unwrap())
        .actions("play pause play pause".parse().unwrap());
    let id = scheduler
        .register_timeline(
            skills,
            &[cube],
            StyleProps::default().with_rotate_y(0.0),
            StyleProps::default().with_rotate_y(360.0),
            TimelineOptions::new(20_000)
                .easing(Easing::Linear)
                .repeat(-1)
                .trigger(trigger),
        )
        .unwrap();
    let angle = |s: &AnimationScheduler| s.nodes().style(cube).unwrap().rotate_y;
    let state = |s: &AnimationScheduler| s.timeline(id).unwrap().state();

    // Starts when the cube's top reaches the bottom of the viewport (1000)
    scheduler.advance(5000.0);
    assert_eq!(state(&scheduler), PlayState::Idle);
    scheduler.scroll_to(1500.0);
    scheduler.advance(5000.0);
    assert!((angle(&scheduler) - 90.0).abs() < 1e-3);

    // Past the bottom edge (2400): paused, nothing left to animate
    scheduler.scroll_to(3000.0);
    assert_eq!(state(&scheduler), PlayState::Paused);
    assert_eq!(scheduler.active_tween_count(skills), 0);
    scheduler.advance(5000.0);
    assert!((angle(&scheduler) - 90.0).abs() < 1e-3);

    scheduler.scroll_to(2000.0);
    scheduler.advance(5000.0);
    assert!((angle(&scheduler) - 180.0).abs() < 1e-3);

    scheduler.scroll_to(500.0);
    assert_eq!(state(&scheduler), PlayState::Paused);
    scheduler.advance(5000.0);
    assert!((angle(&scheduler) - 180.0).abs() < 1e-3);

    // Wraps into the next turn instead of finishing
    scheduler.scroll_to(1500.0);
    scheduler.advance(15_000.0);
    assert!((angle(&scheduler) - 90.0).abs() < 1e-3);
    assert_eq!(state(&scheduler), PlayState::Playing);
}

#[test]
fn cursor_tracks_pointer_and_detaches_on_teardown() {
    let mut scheduler = AnimationScheduler::new(1280.0, 800.0);
    let chrome = scheduler.mount_section("cursor");
    let cursor = scheduler.nodes_mut().insert(Rect::new(0.0, 0.0, 20.0, 20.0));
    let button = scheduler
        .nodes_mut()
        .insert(Rect::new(100.0, 1100.0, 200.0, 60.0));
    let id = scheduler
        .register_cursor(chrome, CursorFollower::new(cursor, [button]).transition(0))
        .unwrap();
    assert_eq!(scheduler.listener_count(chrome), 7);
    let style = |s: &AnimationScheduler| *s.nodes().style(cursor).unwrap();
    assert_eq!(style(&scheduler).opacity, 0.0);

    // Document y 1400 at scroll 1000 is viewport y 400
    scheduler.scroll_to(1000.0);
    scheduler.pointer_at(640.0, 1400.0);
    let s = style(&scheduler);
    assert_eq!((s.translate_x, s.translate_y), (630.0, 390.0));
    assert_eq!(s.opacity, 1.0);
    assert_eq!(s.scale, 1.0);

    scheduler.pointer_at(150.0, 1120.0);
    assert_eq!(style(&scheduler).scale, 1.5);
    scheduler.pointer_down();
    assert!((style(&scheduler).scale - 1.35).abs() < 1e-5);
    scheduler.pointer_up();
    assert_eq!(style(&scheduler).scale, 1.5);

    scheduler.pointer_exit();
    let s = style(&scheduler);
    assert_eq!(s.opacity, 0.0);
    assert_eq!(s.scale, 1.0);

    assert!(scheduler.teardown(chrome));
    assert_eq!(scheduler.total_listener_count(), 0);
    assert!(!scheduler.unbind(id));
    let writes = scheduler.nodes().write_count(cursor);
    scheduler.pointer_at(150.0, 1120.0);
    scheduler.pointer_down();
    scheduler.advance(500.0);
    assert_eq!(scheduler.nodes().write_count(cursor), writes);
}
