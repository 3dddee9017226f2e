use super::*;

const SAY_LISTING: &str = "\
Alex                en_US    # Most people recognize me by my voice.
Bad News            en_US    # The light you see at the end of the tunnel is the headlamp.
Ting-Ting           zh_CN    # 你好，我叫婷婷。
Eddy (English (US)) en_US    # Hello! My name is Eddy.
";

const ESPEAK_LISTING: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
 5  cmn             --/M      Chinese_(Mandarin) sit/cmn              (zh-cmn 5)(zh 5)
";

#[test]
fn say_voice_names_keep_spaces_and_drop_locale() {
    let voices = parse_say_voices(SAY_LISTING);
    assert_eq!(
        voices,
        vec!["Alex", "Bad News", "Ting-Ting", "Eddy (English (US))"]
    );
}

#[test]
fn espeak_voices_include_language_name_and_file() {
    let voices = parse_espeak_voices(ESPEAK_LISTING);
    assert!(voices.contains(&"en-us".to_owned()));
    assert!(voices.contains(&"English_(America)".to_owned()));
    assert!(voices.contains(&"gmw/af".to_owned()));
    assert!(!voices.contains(&"Pty".to_owned()));
}

#[test]
fn engines_write_distinct_formats() {
    assert_eq!(CommandSynthesizer::new(SpeechEngine::Say).audio_extension(), "aiff");
    assert_eq!(
        CommandSynthesizer::new(SpeechEngine::EspeakNg).required_tools(),
        vec!["espeak-ng"]
    );
}

#[test]
fn unavailable_engine_is_a_synthesis_error() {
    if which::which("espeak-ng").is_ok() {
        return;
    }
    let err = CommandSynthesizer::new(SpeechEngine::EspeakNg)
        .validate_voice("en", &CancelHandle::new())
        .unwrap_err();
    assert!(matches!(err, SlideReelError::Synthesis { .. }));
}
