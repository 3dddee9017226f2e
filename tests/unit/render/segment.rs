use super::*;

fn renderer(config: &RunConfig) -> FfmpegSegmentRenderer {
    FfmpegSegmentRenderer::new(config, FontDescriptor::from_bytes("f.ttf", Vec::new())).unwrap()
}

fn args(cmd: &Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

fn value_after(args: &[String], flag: &str) -> String {
    let i = args.iter().position(|a| a == flag).unwrap();
    args[i + 1].clone()
}

#[test]
fn narration_filter_delays_then_pads() {
    let audio = AudioDescriptor::canonical_default();
    assert_eq!(
        narration_filter(0.5, &audio),
        "aresample=48000,aformat=channel_layouts=stereo,adelay=500:all=1,apad"
    );
    assert_eq!(
        narration_filter(0.0, &audio),
        "aresample=48000,aformat=channel_layouts=stereo,apad"
    );
}

#[test]
fn silent_segment_uses_generated_silence_for_its_whole_length() {
    let config = RunConfig::default();
    let plan = SegmentPlan {
        slide_index: 2,
        duration_seconds: 3.0,
        frame_count: 90,
        audio: PlannedAudio::Silence,
    };
    let cmd = renderer(&config).encode(Path::new("s.png"), &plan, Path::new("out.mp4"));
    let a = args(&cmd);

    assert!(a.contains(&"anullsrc=channel_layout=stereo:sample_rate=48000".to_owned()));
    assert_eq!(value_after(&a, "-frames:v"), "90");
    assert_eq!(value_after(&a, "-t"), "3.000000");
    assert_eq!(value_after(&a, "-c:a"), "aac");
    assert_eq!(value_after(&a, "-ar"), "48000");
    assert_eq!(a.last().map(String::as_str), Some("out.mp4"));
}

#[test]
fn narrated_segment_is_rounded_up_to_whole_frames() {
    let config = RunConfig {
        fps: Fps { num: 25, den: 1 },
        ..RunConfig::default()
    };
    let plan = SegmentPlan {
        slide_index: 1,
        duration_seconds: 1.01,
        frame_count: 26,
        audio: PlannedAudio::Narration {
            path: PathBuf::from("narration.aiff"),
            delay_seconds: 0.0,
            audio_seconds: 1.01,
        },
    };
    let cmd = renderer(&config).encode(Path::new("s.png"), &plan, Path::new("out.mp4"));
    let a = args(&cmd);
    assert_eq!(value_after(&a, "-framerate"), "25/1");
    assert!(a.contains(&"narration.aiff".to_owned()));
    assert_eq!(value_after(&a, "-t"), "1.040000");
}
