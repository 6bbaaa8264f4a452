use super::*;

fn cfg() -> EncoderConfig {
    EncoderConfig {
        width: 2,
        height: 2,
        fps: 30,
        video_bitrate: 2500,
        audio_sample_rate: None,
        mime_type: "video/webm;codecs=vp9".to_owned(),
    }
}

fn frame(v: u8) -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 2,
        data: vec![v; 16],
        premultiplied: true,
    }
}

#[test]
fn stop_yields_named_webm() {
    let mut r = Recorder::default();
    r.start(&cfg(), 0.0).unwrap();
    r.push_frame(&frame(1), 0.0).unwrap();
    r.push_frame(&frame(2), 33.0).unwrap();
    let file = r.stop(1_700_000_000_000).unwrap();
    assert_eq!(file.file_name, "recording-1700000000000.webm");
    assert_eq!(file.mime, "video/webm");
    assert_eq!(file.bytes.len(), 32);
    assert!(!r.is_active());
}

#[test]
fn chunks_are_buffered_per_interval() {
    let mut r = Recorder::new(Box::new(InMemoryEncoder::new(100.0)));
    r.start(&cfg(), 0.0).unwrap();
    for i in 0..5 {
        r.push_frame(&frame(i), f64::from(i) * 50.0).unwrap();
    }
    assert_eq!(r.buffered_chunks(), 2);
    let file = r.stop(1).unwrap();
    assert_eq!(file.bytes.len(), 5 * 16);
}

#[test]
fn paused_frames_are_not_encoded() {
    let mut r = Recorder::default();
    r.start(&cfg(), 0.0).unwrap();
    r.push_frame(&frame(1), 10.0).unwrap();
    r.pause(20.0).unwrap();
    assert!(r.is_paused());
    r.push_frame(&frame(2), 30.0).unwrap();
    r.resume(120.0).unwrap();
    assert!((r.duration_ms(150.0) - 50.0).abs() < 1e-9);
    r.push_frame(&frame(3), 150.0).unwrap();
    assert_eq!(r.stop(0).unwrap().bytes.len(), 32);
}

#[test]
fn double_start_and_idle_stop_are_rejected() {
    let mut r = Recorder::default();
    assert!(r.stop(0).is_err());
    assert!(r.pause(0.0).is_err());
    r.start(&cfg(), 0.0).unwrap();
    assert!(r.start(&cfg(), 1.0).is_err());
    assert!(r.set_encoder(Box::new(InMemoryEncoder::default())).is_err());
    assert_eq!(r.started_ms(), Some(0.0));
}

#[test]
fn audio_is_encoded_only_with_an_audio_track() {
    let mut r = Recorder::default();
    r.start(&cfg(), 0.0).unwrap();
    r.push_audio(&[0.5, 0.5], 0.0).unwrap();
    assert!(r.stop(0).unwrap().bytes.is_empty());

    let with_audio = EncoderConfig {
        audio_sample_rate: Some(48_000),
        ..cfg()
    };
    r.start(&with_audio, 0.0).unwrap();
    r.push_audio(&[0.5, -0.25], 0.0).unwrap();
    r.pause(10.0).unwrap();
    r.push_audio(&[1.0], 20.0).unwrap();
    let bytes = r.stop(0).unwrap().bytes;
    let expected: Vec<u8> = [0.5f32, -0.25]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    assert_eq!(bytes, expected);
}

#[test]
fn in_memory_encoder_counts_audio_samples() {
    let mut enc = InMemoryEncoder::default();
    enc.start(&cfg()).unwrap();
    enc.encode_audio(&[0.0; 5], 0.0).unwrap();
    assert_eq!(enc.audio_samples(), 5);
    assert_eq!(enc.finish().unwrap().len(), 20);
}
