use super::*;
use crate::encode::stream::OutputState;
use crate::source::capture::feed;
use crate::render::buffer::PixelBuffer;

fn studio() -> Studio {
    Studio::with_ids(IdGen::with_epoch(7))
}

fn add_color(s: &mut Studio) -> SourceId {
    s.add_source(SourceKind::Color, NewSource::default()).unwrap()
}

#[test]
fn starts_with_one_program_scene() {
    let s = studio();
    assert_eq!(s.scenes().len(), 1);
    assert_eq!(s.current_scene().unwrap().name, "Scene 1");
    assert!(!s.studio_mode());
    assert!(s.preview_scene_id().is_none());
}

#[test]
fn removing_the_last_scene_is_rejected_without_mutation() {
    let mut s = studio();
    let only = s.current_scene_id().clone();
    assert!(s.remove_scene(&only).is_err());
    assert_eq!(s.scenes().len(), 1);
    assert_eq!(s.current_scene_id(), &only);
}

#[test]
fn removing_the_program_scene_falls_back_to_first() {
    let mut s = studio();
    let first = s.current_scene_id().clone();
    let second = s.create_scene(Some("B"));
    s.switch_scene(&second, false, 0.0).unwrap();
    s.take_events();
    s.remove_scene(&second).unwrap();
    assert_eq!(s.current_scene_id(), &first);
    let events = s.take_events();
    assert!(matches!(
        events.as_slice(),
        [StudioEvent::CurrentProgramSceneChanged { scene_id, .. }] if scene_id == &first
    ));
}

#[test]
fn cut_switch_commits_immediately() {
    let mut s = studio();
    s.set_transition(TransitionConfig {
        kind: TransitionKind::Cut,
        duration_ms: 300,
    })
    .unwrap();
    let b = s.create_scene(None);
    s.switch_scene(&b, true, 0.0).unwrap();
    assert_eq!(s.current_scene_id(), &b);
    assert!(!s.is_transitioning());
}

#[test]
fn fade_switch_commits_when_progress_reaches_one() {
    let mut s = studio();
    let a = s.current_scene_id().clone();
    let b = s.create_scene(None);
    s.switch_scene(&b, true, 0.0).unwrap();
    assert!(s.is_transitioning());
    assert_eq!(s.current_scene_id(), &a);

    let mid = s.advance_transition(150.0).unwrap();
    assert!((mid.progress - 0.5).abs() < 1e-9);
    let end = s.advance_transition(300.0).unwrap();
    assert!(end.is_finished());
    s.commit_transition();
    assert_eq!(s.current_scene_id(), &b);
    assert!(!s.is_transitioning());
}

#[test]
fn switching_during_a_transition_commits_the_running_target() {
    let mut s = studio();
    let b = s.create_scene(None);
    let c = s.create_scene(None);
    s.switch_scene(&b, true, 0.0).unwrap();
    s.switch_scene(&c, true, 100.0).unwrap();
    assert_eq!(s.current_scene_id(), &b);
    let active = s.transition().active().unwrap();
    assert_eq!(active.from, b);
    assert_eq!(active.to, c);
}

#[test]
fn switching_to_the_current_scene_is_a_noop() {
    let mut s = studio();
    let a = s.current_scene_id().clone();
    s.switch_scene(&a, true, 0.0).unwrap();
    assert!(!s.is_transitioning());
    assert!(s.take_events().is_empty());
}

#[test]
fn removing_a_scene_cancels_its_transition() {
    let mut s = studio();
    let b = s.create_scene(None);
    s.switch_scene(&b, true, 0.0).unwrap();
    s.remove_scene(&b).unwrap();
    assert!(!s.is_transitioning());
}

#[test]
fn studio_mode_sends_preview_to_program() {
    let mut s = studio();
    assert!(s.transition_to_program(0.0).is_err());
    assert!(s.toggle_studio_mode());
    let b = s.create_scene(None);
    s.set_preview_scene(&b).unwrap();
    s.transition_to_program(0.0).unwrap();
    s.advance_transition(1000.0);
    s.commit_transition();
    assert_eq!(s.current_scene_id(), &b);
}

#[test]
fn duplicate_scene_keeps_sources_with_fresh_ids() {
    let mut s = studio();
    let a = s.current_scene_id().clone();
    let src = add_color(&mut s);
    s.set_opacity(&src, 0.5).unwrap();
    let copy = s.duplicate_scene(&a).unwrap();
    let original = s.scene(&a).unwrap();
    let dup = s.scene(&copy).unwrap();
    assert_eq!(dup.sources.len(), original.sources.len());
    assert_ne!(dup.sources[0].id, original.sources[0].id);
    assert_eq!(dup.sources[0].geometry, original.sources[0].geometry);
    assert_eq!(dup.sources[0].opacity, 0.5);
}

#[test]
fn locked_sources_reject_explicit_edits_and_ignore_drags() {
    let mut s = studio();
    let id = add_color(&mut s);
    s.set_locked(&id, true).unwrap();
    assert!(s.resize_source(&id, Handle::E, 10.0, 0.0).is_err());
    assert!(s.fit_to_screen(&id).is_err());

    s.select(Some(&id)).unwrap();
    s.move_selection(Vec2::new(50.0, 50.0));
    assert_eq!(s.source(&id).unwrap().geometry.x, 100.0);
}

#[test]
fn drag_snaps_to_grid_when_enabled() {
    let mut s = studio();
    let id = add_color(&mut s);
    let mut settings = s.settings().clone();
    settings.snap_to_grid = true;
    settings.grid_size = 20;
    s.update_settings(settings).unwrap();
    s.select(Some(&id)).unwrap();
    s.move_selection(Vec2::new(13.0, 4.0));
    let g = s.source(&id).unwrap().geometry;
    assert_eq!((g.x, g.y), (120.0, 100.0));
}

#[test]
fn nudge_moves_by_step_without_snapping() {
    let mut s = studio();
    let id = add_color(&mut s);
    let mut settings = s.settings().clone();
    settings.snap_to_grid = true;
    settings.nudge_step = 10.0;
    s.update_settings(settings).unwrap();
    s.select(Some(&id)).unwrap();
    s.nudge(1.0, -1.0);
    let g = s.source(&id).unwrap().geometry;
    assert_eq!((g.x, g.y), (110.0, 90.0));
    assert!(s.settings().snap_to_grid);
}

#[test]
fn fit_to_screen_covers_canvas_and_reset_clears_crop() {
    let mut s = studio();
    let id = add_color(&mut s);
    s.fit_to_screen(&id).unwrap();
    let g = s.source(&id).unwrap().geometry;
    assert_eq!((g.x, g.y, g.width, g.height), (0.0, 0.0, 1920.0, 1080.0));

    s.set_crop(
        &id,
        Crop {
            top: 5.0,
            ..Crop::default()
        },
    )
    .unwrap();
    s.rotate_source_toward(&id, Point::new(2000.0, 540.0)).unwrap();
    s.reset_transform(&id).unwrap();
    let src = s.source(&id).unwrap();
    assert_eq!(src.geometry.rotation, 0.0);
    assert!(src.crop.is_empty());
}

#[test]
fn camera_removed_before_permission_is_torn_down() {
    let mut s = studio();
    let cam = s
        .add_source(SourceKind::Camera, NewSource::default())
        .unwrap();
    let requests = s.take_acquisition_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].kind, SourceKind::Camera);

    s.remove_source(&cam).unwrap();
    let (stream, writer) = feed(true);
    let outcome = s
        .resolve_acquisition(AcquisitionOutcome {
            ticket: requests[0].ticket.clone(),
            result: Ok(AcquiredContent::Capture(Box::new(stream))),
        })
        .unwrap();
    assert_eq!(outcome, AttachOutcome::Discarded);
    assert!(!writer.is_live());
    assert!(s.audio().is_empty());
}

#[test]
fn acquired_capture_attaches_and_joins_the_audio_bus() {
    let mut s = studio();
    let cam = s
        .add_source(SourceKind::Camera, NewSource::default())
        .unwrap();
    let request = s.take_acquisition_requests().remove(0);
    let (stream, writer) = feed(true);
    let outcome = s
        .resolve_acquisition(AcquisitionOutcome {
            ticket: request.ticket,
            result: Ok(AcquiredContent::Capture(Box::new(stream))),
        })
        .unwrap();
    assert_eq!(outcome, AttachOutcome::Attached);
    assert!(s.audio().is_attached(&cam));

    s.set_volume(&cam, 0.25).unwrap();
    assert_eq!(s.audio().channel(&cam).unwrap().volume, 0.25);
    s.remove_source(&cam).unwrap();
    assert!(!writer.is_live());
    assert!(!s.audio().is_attached(&cam));
}

#[test]
fn acquired_image_takes_its_natural_size() {
    let mut s = studio();
    let img = s
        .add_source(
            SourceKind::Image,
            NewSource {
                url: Some("logo.png".to_owned()),
                ..NewSource::default()
            },
        )
        .unwrap();
    let request = s.take_acquisition_requests().remove(0);
    assert_eq!(request.url.as_deref(), Some("logo.png"));
    s.resolve_acquisition(AcquisitionOutcome {
        ticket: request.ticket,
        result: Ok(AcquiredContent::Image(PixelBuffer::new(32, 4))),
    })
    .unwrap();
    let g = s.source(&img).unwrap().geometry;
    assert_eq!((g.width, g.height), (32.0, MIN_SIZE));
    assert!(s.source(&img).unwrap().content.is_ready());
}

#[test]
fn acquisition_failure_is_returned_and_source_stays_empty() {
    let mut s = studio();
    let cam = s
        .add_source(SourceKind::Camera, NewSource::default())
        .unwrap();
    let request = s.take_acquisition_requests().remove(0);
    let err = s
        .resolve_acquisition(AcquisitionOutcome {
            ticket: request.ticket,
            result: Err(OnAirError::acquisition("permission denied")),
        })
        .unwrap_err();
    assert!(matches!(err, OnAirError::Acquisition(_)));
    assert!(!s.source(&cam).unwrap().content.is_ready());
}

#[test]
fn mismatched_content_is_discarded_with_an_error() {
    let mut s = studio();
    s.add_source(SourceKind::Screen, NewSource::default())
        .unwrap();
    let request = s.take_acquisition_requests().remove(0);
    let result = s.resolve_acquisition(AcquisitionOutcome {
        ticket: request.ticket,
        result: Ok(AcquiredContent::Image(PixelBuffer::new(2, 2))),
    });
    assert!(result.is_err());
}

#[test]
fn filters_are_managed_through_the_studio() {
    let mut s = studio();
    let id = add_color(&mut s);
    let f = s.add_filter(&id, FilterType::Opacity).unwrap();
    assert!(!s.toggle_filter(&id, &f).unwrap());
    s.update_filter(&id, &f, FilterKind::Opacity { opacity: 0.3 })
        .unwrap();
    s.remove_filter(&id, &f).unwrap();
    assert!(s.source(&id).unwrap().filters.is_empty());
}

#[test]
fn commands_apply_in_order_and_rejections_are_collected() {
    let mut s = studio();
    let tx = s.commands();
    tx.send(StudioCommand::CreateScene {
        name: Some("Two".to_owned()),
    })
    .unwrap();
    tx.send(StudioCommand::RemoveScene(SceneId::from("missing")))
        .unwrap();
    s.enqueue(StudioCommand::SwitchSceneByIndex(1));
    let rejected = s.drain_commands(0.0);
    assert_eq!(rejected.len(), 1);
    assert_eq!(s.scenes().len(), 2);
    assert!(s.is_transitioning());
}

#[test]
fn recording_uses_settings_and_emits_state_events() {
    let mut s = studio();
    s.start_recording(0.0).unwrap();
    let frame = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![0, 0, 0, 255],
        premultiplied: true,
    };
    s.deliver_frame(&frame, 10.0);
    let file = s.stop_recording().unwrap();
    assert!(file.file_name.starts_with("recording-"));
    assert_eq!(file.bytes.len(), 16);

    let events = s.take_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[1],
        StudioEvent::RecordStateChanged(status)
            if status.output_state == OutputState::Stopped && !status.output_active
    ));
}

#[test]
fn stop_recording_command_leaves_file_in_outbox() {
    let mut s = studio();
    s.enqueue(StudioCommand::StartRecording);
    s.enqueue(StudioCommand::StopRecording);
    assert!(s.drain_commands(0.0).is_empty());
    assert_eq!(s.take_recordings().len(), 1);
}

#[test]
fn streaming_twice_is_rejected() {
    let mut s = studio();
    s.start_streaming(0.0).unwrap();
    assert!(s.start_streaming(1.0).is_err());
    s.stop_streaming().unwrap();
    assert!(s.stop_streaming().is_err());
}

#[test]
fn overlay_options_follow_selection_and_grid() {
    let mut s = studio();
    let id = add_color(&mut s);
    assert!(s.overlay_options().is_empty());
    s.select(Some(&id)).unwrap();
    let mut settings = s.settings().clone();
    settings.show_grid = true;
    s.update_settings(settings).unwrap();
    let opts = s.overlay_options();
    assert_eq!(opts.selection.len(), 1);
    assert_eq!(opts.grid, Some(20.0));
}

#[test]
fn invalid_settings_are_rejected() {
    let mut s = studio();
    let mut settings = s.settings().clone();
    settings.frame_rate = 0;
    assert!(s.update_settings(settings).is_err());
    assert_eq!(s.settings().frame_rate, 30);
}

#[test]
fn reset_returns_to_a_single_default_scene() {
    let mut s = studio();
    s.create_scene(None);
    add_color(&mut s);
    s.toggle_studio_mode();
    s.reset();
    assert_eq!(s.scenes().len(), 1);
    assert!(s.current_scene().unwrap().sources.is_empty());
    assert!(!s.studio_mode());
}

#[test]
fn content_edits_keep_the_kind() {
    let mut s = studio();
    let id = add_color(&mut s);
    let blue = SourceContent::Color(crate::source::content::ColorContent {
        color: crate::assets::color::Color::rgb(0, 0, 255),
    });
    s.set_source_content(&id, blue).unwrap();
    assert!(
        s.set_source_content(&id, SourceContent::defaults(SourceKind::Text))
            .is_err()
    );
    s.rename_source(&id, " Backdrop ").unwrap();
    assert_eq!(s.source(&id).unwrap().name, "Backdrop");
}

#[test]
fn new_image_url_queues_reacquisition() {
    let mut s = studio();
    let id = s
        .add_source(SourceKind::Image, NewSource::default())
        .unwrap();
    assert!(s.take_acquisition_requests().is_empty());
    s.set_source_content(
        &id,
        SourceContent::Image(ImageContent::from_url("file:///tmp/a.png")),
    )
    .unwrap();
    let requests = s.take_acquisition_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.as_deref(), Some("file:///tmp/a.png"));
}

#[test]
fn loaded_and_inserted_filters_are_brought_into_range() {
    let mut s = studio();
    let id = add_color(&mut s);
    s.add_filter(&id, FilterType::ChromaKey).unwrap();
    let mut doc: serde_json::Value = serde_json::from_str(&s.profile().to_json().unwrap()).unwrap();
    let key = &mut doc["scenes"][0]["sources"][0]["filters"][0];
    key["similarity"] = 0.0.into();
    key["smoothness"] = 0.9.into();

    let mut restored = studio();
    restored
        .load_profile(Profile::from_json(&doc.to_string()).unwrap())
        .unwrap();
    let source = &restored.current_scene().unwrap().sources[0];
    let FilterKind::ChromaKey {
        similarity,
        smoothness,
        ..
    } = source.filters[0].kind
    else {
        panic!("chroma key expected");
    };
    assert_eq!((similarity, smoothness), (0.4, 0.4));

    let mut keyed = Source::new(
        SourceId::from("inserted"),
        "Keyed",
        SourceContent::defaults(SourceKind::Color),
    );
    keyed.add_filter(FilterId::from("key"), FilterType::ChromaKey);
    keyed.filters[0].kind = FilterKind::ChromaKey {
        key_color: crate::assets::color::Color::rgb(0, 255, 0),
        similarity: 0.1,
        smoothness: 0.5,
    };
    let scene = restored.current_scene_id().clone();
    let inserted = restored.insert_source(&scene, keyed).unwrap();
    let FilterKind::ChromaKey { smoothness, .. } = restored.source(&inserted).unwrap().filters[0].kind
    else {
        panic!("chroma key expected");
    };
    assert_eq!(smoothness, 0.1);
}
