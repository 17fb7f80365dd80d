use maplet_sync::{input::bind, prelude::*};
use std::cell::Cell;

/// Instance construction, reuse, teardown and registry behavior
#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn provider_with(engine: &Rc<HeadlessEngine>) -> MapProvider {
        init_logging();
        MapProvider::new(engine.clone())
    }

    fn mark_loaded(provider: &MapProvider) {
        let token = provider
            .gate()
            .begin_attempt(&LoaderParams::new("test-key"))
            .unwrap();
        provider.gate().finish(token, Ok(())).unwrap();
    }

    fn loaded_provider() -> (Rc<HeadlessEngine>, MapProvider) {
        let engine = Rc::new(HeadlessEngine::new());
        let provider = provider_with(&engine);
        mark_loaded(&provider);
        (engine, provider)
    }

    fn root() -> MountPoint {
        MountPoint::new("root")
    }

    fn position(journal: &[EngineCall], predicate: impl Fn(&EngineCall) -> bool) -> usize {
        journal.iter().position(predicate).unwrap()
    }

    fn last_position(journal: &[EngineCall], predicate: impl Fn(&EngineCall) -> bool) -> usize {
        journal.iter().rposition(predicate).unwrap()
    }

    /// Nothing is constructed before the engine reports `Loaded`
    #[test]
    fn test_waits_for_engine() {
        let engine = Rc::new(HeadlessEngine::new());
        let provider = provider_with(&engine);
        let mut controller = MapController::new(&provider);
        let props = MapProps::default();

        assert_eq!(controller.render(&props, Some(&root())).unwrap(), None);
        assert_eq!(engine.created_count(), 0);

        mark_loaded(&provider);
        assert!(controller.render(&props, Some(&root())).unwrap().is_some());
        assert_eq!(engine.created_count(), 1);
    }

    /// A mount point that is not realized yet is not an error
    #[test]
    fn test_missing_mount_point_is_a_no_op() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);

        for _ in 0..3 {
            assert_eq!(controller.render(&MapProps::default(), None).unwrap(), None);
        }
        assert!(engine.journal().is_empty());
    }

    /// Mutable options never recreate the instance
    #[test]
    fn test_identity_preserving_update() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);

        let before = controller
            .render(&MapProps::default(), Some(&root()))
            .unwrap()
            .unwrap();
        let greedy = MapPropsBuilder::new()
            .with_options(MapOptions {
                gesture_handling: Some(GestureHandling::Greedy),
                ..Default::default()
            })
            .build();
        let after = controller.render(&greedy, Some(&root())).unwrap().unwrap();

        assert!(before.same_instance(&after));
        assert_eq!(engine.created_count(), 1);
        assert_eq!(
            engine.last_instance().unwrap().options().gesture_handling,
            Some(GestureHandling::Greedy)
        );
    }

    /// Identity changes recreate, and old listeners are gone before anything new is bound
    #[test]
    fn test_recreation_and_teardown_ordering() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);

        let light = MapPropsBuilder::new()
            .with_color_scheme(ColorScheme::Light)
            .on(EventKind::Click, |_| {})
            .controlled(true)
            .build();
        let old = controller.render(&light, Some(&root())).unwrap().unwrap();
        let old_instance = engine.last_instance().unwrap();
        let old_serial = old_instance.serial();

        let dark = MapPropsBuilder::new()
            .with_color_scheme(ColorScheme::Dark)
            .on(EventKind::Click, |_| {})
            .build();
        let new = controller.render(&dark, Some(&root())).unwrap().unwrap();
        let new_serial = engine.last_instance().unwrap().serial();

        assert!(!old.same_instance(&new));
        assert!(old_instance.is_destroyed());
        assert_eq!(old_instance.listener_count(), 0);

        let journal = engine.journal();
        let last_unbind = last_position(&journal, |call| {
            matches!(call, EngineCall::RemoveListener { serial, .. } if *serial == old_serial)
        });
        let destroy = position(&journal, |call| {
            matches!(call, EngineCall::Destroy { serial } if *serial == old_serial)
        });
        let create = position(&journal, |call| {
            matches!(call, EngineCall::Create { serial, .. } if *serial == new_serial)
        });
        let first_bind = position(&journal, |call| {
            matches!(call, EngineCall::AddListener { serial, .. } if *serial == new_serial)
        });

        assert!(last_unbind < destroy);
        assert!(destroy < create);
        assert!(create < first_bind);
    }

    /// Subscriptions on a torn-down instance unbind without error and never fire
    #[test]
    fn test_old_subscriptions_are_inert() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);
        let old = controller
            .render(&MapProps::default(), Some(&root()))
            .unwrap()
            .unwrap();
        let old_instance = engine.last_instance().unwrap();

        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let mut subscription = bind(
            &old,
            EventKind::Idle,
            None,
            provider.diagnostics(),
            Rc::new(move |_: &EventEnvelope| counter.set(counter.get() + 1)),
        );

        controller
            .render(
                &MapPropsBuilder::new().with_map_id("style-b").build(),
                Some(&root()),
            )
            .unwrap();

        old_instance.emit(NativeEvent::new("idle"));
        assert_eq!(fired.get(), 0);
        assert_eq!(subscription.unbind(), 1);
        assert!(!subscription.is_active());
    }

    /// A new mount point is an identity change
    #[test]
    fn test_mount_point_change_recreates() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);
        let props = MapProps::default();

        controller.render(&props, Some(&MountPoint::new("a"))).unwrap();
        controller.render(&props, Some(&MountPoint::new("b"))).unwrap();

        assert_eq!(engine.created_count(), 2);
        assert_eq!(engine.last_instance().unwrap().mount(), MountPoint::new("b"));
        assert!(engine.instances()[0].is_destroyed());
    }

    /// The mount point disappearing tears the instance down
    #[test]
    fn test_mount_point_loss_tears_down() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);
        let props = MapPropsBuilder::new().with_id("main").build();

        controller.render(&props, Some(&root())).unwrap();
        assert!(provider.map("main").is_some());

        assert_eq!(controller.render(&props, None).unwrap(), None);
        assert!(provider.map("main").is_none());
        assert!(engine.last_instance().unwrap().is_destroyed());
    }

    /// Two maps under one id: one deduplicated warning, last write wins
    #[test]
    fn test_registry_uniqueness() {
        let (_engine, provider) = loaded_provider();
        let props = MapPropsBuilder::new().with_id("main").build();

        let mut first = MapController::new(&provider);
        let mut second = MapController::new(&provider);
        first.render(&props, Some(&MountPoint::new("a"))).unwrap();
        let winner = second
            .render(&props, Some(&MountPoint::new("b")))
            .unwrap()
            .unwrap();

        for _ in 0..3 {
            first.render(&props, Some(&MountPoint::new("a"))).unwrap();
            second.render(&props, Some(&MountPoint::new("b"))).unwrap();
        }

        assert_eq!(provider.diagnostics().count(), 1);
        assert_eq!(provider.map("main"), Some(winner));

        first.unmount();
        assert!(provider.map("main").is_some());
        second.unmount();
        assert!(provider.map("main").is_none());
    }

    /// Readers see maps by id; outside a provider they get `None`
    #[test]
    fn test_lookup() {
        let (_engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);
        let handle = controller
            .render(&MapPropsBuilder::new().with_id("overview").build(), Some(&root()))
            .unwrap()
            .unwrap();

        assert_eq!(lookup_map(Some(&provider), "overview"), Some(handle));
        assert_eq!(lookup_map(Some(&provider), "missing"), None);
        assert_eq!(lookup_map(None, "overview"), None);
        assert_eq!(provider.map_ids(), vec!["overview".to_string()]);
    }

    /// Renaming the registry id re-registers without recreating
    #[test]
    fn test_id_change_reregisters() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);

        controller
            .render(&MapPropsBuilder::new().with_id("a").build(), Some(&root()))
            .unwrap();
        controller
            .render(&MapPropsBuilder::new().with_id("b").build(), Some(&root()))
            .unwrap();

        assert_eq!(engine.created_count(), 1);
        assert_eq!(provider.map_ids(), vec!["b".to_string()]);
    }

    /// Recreation seeds uncontrolled axes from the last tracked camera
    #[test]
    fn test_camera_carries_over_recreation() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);

        let light = MapPropsBuilder::new()
            .with_default_center(10.0, 20.0)
            .with_default_zoom(5.0)
            .build();
        controller.render(&light, Some(&root())).unwrap();
        engine.last_instance().unwrap().simulate_camera(&CameraPatch {
            zoom: Some(8.0),
            ..Default::default()
        });

        let dark = MapPropsBuilder::new()
            .with_default_center(10.0, 20.0)
            .with_default_zoom(5.0)
            .with_color_scheme(ColorScheme::Dark)
            .build();
        controller.render(&dark, Some(&root())).unwrap();

        let recreated = engine.last_instance().unwrap().camera();
        assert_eq!(recreated.zoom, 8.0);
        assert_eq!(recreated.center, LatLngAltitude::new(10.0, 20.0, 0.0));
        assert!(engine.camera_commands().is_empty());
    }

    /// A caller unmount forgets the camera; the next mount seeds from props
    #[test]
    fn test_remount_after_unmount_uses_defaults() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);
        let props = MapPropsBuilder::new()
            .with_default_center(10.0, 20.0)
            .with_default_zoom(5.0)
            .build();

        controller.render(&props, Some(&root())).unwrap();
        engine.last_instance().unwrap().simulate_camera(&CameraPatch {
            zoom: Some(8.0),
            ..Default::default()
        });
        controller.unmount();

        controller.render(&props, Some(&root())).unwrap();
        assert_eq!(engine.created_count(), 2);
        assert_eq!(engine.last_instance().unwrap().camera().zoom, 5.0);
    }

    /// Losing the mount point also ends carry-over
    #[test]
    fn test_mount_loss_forgets_camera() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);
        let props = MapPropsBuilder::new().with_default_zoom(5.0).build();

        controller.render(&props, Some(&root())).unwrap();
        engine.last_instance().unwrap().simulate_camera(&CameraPatch {
            zoom: Some(8.0),
            ..Default::default()
        });
        controller.render(&props, None).unwrap();
        controller.render(&props, Some(&root())).unwrap();

        assert_eq!(engine.last_instance().unwrap().camera().zoom, 5.0);
    }

    /// Switching variants carries only the axes both variants share
    #[test]
    fn test_variant_switch_seeds_missing_axes_from_defaults() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);
        let flat = MapPropsBuilder::new()
            .with_default_center(10.0, 20.0)
            .with_default_zoom(5.0)
            .with_default_range(5000.0)
            .build();

        controller.render(&flat, Some(&root())).unwrap();
        engine.last_instance().unwrap().simulate_camera(&CameraPatch {
            heading: Some(45.0),
            ..Default::default()
        });

        let globe = MapPropsBuilder::globe()
            .with_default_center(10.0, 20.0)
            .with_default_zoom(5.0)
            .with_default_range(5000.0)
            .build();
        let handle = controller.render(&globe, Some(&root())).unwrap().unwrap();

        assert_eq!(handle.kind(), MapKind::Globe);
        let camera = engine.last_instance().unwrap().camera();
        assert_eq!(camera.range, 5000.0);
        assert_eq!(camera.heading, 45.0);
        assert_eq!(camera.center, LatLngAltitude::new(10.0, 20.0, 0.0));
    }

    /// Pooled instances are remounted instead of constructed
    #[test]
    fn test_instance_pool() {
        let (engine, provider) = loaded_provider();
        let props = MapPropsBuilder::new()
            .with_map_id("style-a")
            .with_default_zoom(4.0)
            .reuse_instances(true)
            .build();

        let mut first = MapController::new(&provider);
        let original = first.render(&props, Some(&MountPoint::new("a"))).unwrap().unwrap();
        first.unmount();
        assert_eq!(provider.pooled_count(), 1);
        assert!(!engine.last_instance().unwrap().is_destroyed());

        let mut second = MapController::new(&provider);
        let restored = second
            .render(&props, Some(&MountPoint::new("b")))
            .unwrap()
            .unwrap();

        assert!(original.same_instance(&restored));
        assert_eq!(engine.created_count(), 1);
        assert_eq!(provider.pooled_count(), 0);
        assert_eq!(engine.last_instance().unwrap().mount(), MountPoint::new("b"));
        assert!(engine
            .journal()
            .iter()
            .any(|call| matches!(call, EngineCall::Remount { .. })));

        drop(second);
        assert_eq!(provider.clear_pool(), 1);
        assert!(engine.last_instance().unwrap().is_destroyed());
    }

    /// Engine construction errors surface unchanged; the next pass retries
    #[test]
    fn test_engine_errors_propagate() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);
        engine.fail_next_create("invalid map id");

        let result = controller.render(&MapProps::default(), Some(&root()));
        assert!(matches!(result, Err(Error::Engine(message)) if message == "invalid map id"));
        assert!(controller.map().is_none());

        assert!(controller
            .render(&MapProps::default(), Some(&root()))
            .unwrap()
            .is_some());
    }

    /// Credentials rejected after loading remove the instance
    #[test]
    fn test_auth_failure_after_load() {
        let (engine, provider) = loaded_provider();
        let mut controller = MapController::new(&provider);
        controller.render(&MapProps::default(), Some(&root())).unwrap();

        provider.gate().report_auth_failure().unwrap();

        assert_eq!(provider.status(), LoadStatus::AuthFailure);
        assert_eq!(
            controller.render(&MapProps::default(), Some(&root())).unwrap(),
            None
        );
        assert!(engine.last_instance().unwrap().is_destroyed());
    }

    /// Dropping the controller releases the instance and its registration
    #[test]
    fn test_drop_tears_down() {
        let (engine, provider) = loaded_provider();
        {
            let mut controller = MapController::new(&provider);
            controller
                .render(&MapPropsBuilder::new().with_id("scoped").build(), Some(&root()))
                .unwrap();
        }
        assert!(provider.map("scoped").is_none());
        assert!(engine.last_instance().unwrap().is_destroyed());
    }
}
