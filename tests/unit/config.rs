use super::*;

#[test]
fn defaults_are_valid() {
    RunConfig::default().validate().unwrap();
}

#[test]
fn validation_catches_bad_values() {
    let odd = RunConfig {
        resolution: Resolution::new(1921, 1080),
        ..RunConfig::default()
    };
    assert!(odd.validate().is_err());

    let no_canvas = RunConfig {
        resolution: Resolution::new(200, 200),
        margin: 100,
        ..RunConfig::default()
    };
    assert!(no_canvas.validate().is_err());

    let zero_cap = RunConfig {
        max_font_size: 0,
        ..RunConfig::default()
    };
    assert!(zero_cap.validate().is_err());

    let silent = RunConfig {
        silent_duration: 0.0,
        ..RunConfig::default()
    };
    assert!(silent.validate().is_err());

    let delay = RunConfig {
        narration_delay: -0.5,
        ..RunConfig::default()
    };
    assert!(delay.validate().is_err());

    let workers = RunConfig {
        concurrency: 0,
        ..RunConfig::default()
    };
    assert!(workers.validate().is_err());
}

#[test]
fn channel_counts_without_a_layout_are_rejected() {
    let mut cfg = RunConfig::default();
    cfg.audio.channels = 4;
    cfg.validate().unwrap();
    assert_eq!(cfg.audio.channel_layout(), "quad");

    cfg.audio.channels = 9;
    let err = cfg.validate().unwrap_err();
    assert!(matches!(err, SlideReelError::Validation(_)));
    assert!(err.to_string().contains("9 channels"));
}

#[test]
fn json_fields_override_defaults() {
    let cfg: RunConfig = serde_json::from_value(serde_json::json!({
        "resolution": "1280x720",
        "background": { "color": "#102030" },
        "speech_engine": "espeak-ng",
        "voice": "en",
        "silent_duration": 2.5,
        "languages": { "preferred": ["en"] }
    }))
    .unwrap();

    assert_eq!(cfg.resolution, Resolution::new(1280, 720));
    assert_eq!(cfg.background, Background::Color(Rgba8::opaque(0x10, 0x20, 0x30)));
    assert_eq!(cfg.speech_engine, SpeechEngine::EspeakNg);
    assert_eq!(cfg.silent_duration, 2.5);
    assert_eq!(cfg.margin, 100);
    assert_eq!(cfg.languages.preferred, vec!["en".to_owned()]);
    cfg.validate().unwrap();
}

#[test]
fn unknown_fields_are_rejected() {
    let err = serde_json::from_value::<RunConfig>(serde_json::json!({ "font_size": 10 }));
    assert!(err.is_err());
}
