// Tests for transcoder argument construction and output naming

use crate::common::helpers::{flag_index, flag_value, job};
use ffspeed::engine::{
    EncoderProfile, Error, FrameRate, QualityTier, ThreadCount, build_command_plan,
    output_path_for,
};
use std::fs;
use std::num::NonZeroU32;
use std::path::Path;

fn args_for(speed: f64, encoder: EncoderProfile) -> Vec<String> {
    build_command_plan(
        &job("/in/clip.mp4", speed),
        encoder,
        ThreadCount::Auto,
        Path::new("/out/clip.mp4"),
        None,
    )
    .unwrap()
    .args_lossy()
}

#[test]
fn test_every_encoder_keeps_argument_order() {
    let order = [
        "-i", "-filter:v", "-filter:a", "-r", "-c:v", "-c:a", "-b:a", "-movflags", "-y",
    ];

    for encoder in std::iter::once(EncoderProfile::Software).chain(EncoderProfile::HARDWARE) {
        let args = args_for(2.0, encoder);
        let positions: Vec<usize> = order
            .iter()
            .map(|flag| {
                flag_index(&args, flag)
                    .unwrap_or_else(|| panic!("{} missing for {}", flag, encoder))
            })
            .collect();

        assert!(
            positions.windows(2).all(|w| w[0] < w[1]),
            "out of order for {}: {:?}",
            encoder,
            args
        );
        assert_eq!(args[0], "-i");
        assert_eq!(args.last().map(String::as_str), Some("/out/clip.mp4"));
    }
}

#[test]
fn test_decode_flags_follow_input() {
    let nvenc = args_for(2.0, EncoderProfile::Nvenc);
    assert_eq!(&nvenc[2..4], &["-hwaccel", "cuda"]);

    let vaapi = args_for(2.0, EncoderProfile::Vaapi);
    assert_eq!(flag_value(&vaapi, "-vaapi_device"), Some("/dev/dri/renderD128"));

    let software = args_for(2.0, EncoderProfile::Software);
    assert!(flag_index(&software, "-hwaccel").is_none());
}

#[test]
fn test_quality_tiers_per_encoder() {
    let cases = [
        (EncoderProfile::Software, QualityTier::Low, "-crf", "28"),
        (EncoderProfile::Software, QualityTier::VeryHigh, "-crf", "15"),
        (EncoderProfile::Nvenc, QualityTier::Medium, "-cq", "25"),
        (EncoderProfile::Amf, QualityTier::High, "-qp_i", "20"),
        (EncoderProfile::Qsv, QualityTier::Low, "-global_quality", "30"),
        (EncoderProfile::VideoToolbox, QualityTier::High, "-q:v", "40"),
        (EncoderProfile::Vaapi, QualityTier::VeryHigh, "-qp", "18"),
    ];

    for (encoder, quality, flag, value) in cases {
        let mut spec = job("/in/clip.mp4", 2.0);
        spec.quality = quality;
        let args = build_command_plan(
            &spec,
            encoder,
            ThreadCount::Auto,
            Path::new("o.mp4"),
            None,
        )
        .unwrap()
        .args_lossy();

        assert_eq!(
            flag_value(&args, flag),
            Some(value),
            "{} at {} -> {:?}",
            encoder,
            quality,
            args
        );
    }
}

#[test]
fn test_tempo_chain_in_audio_filter() {
    let cases = [
        (1.5, "atempo=1.5"),
        (3.0, "atempo=2.0,atempo=1.5"),
        (8.0, "atempo=2.0,atempo=2.0,atempo=2.0"),
        (0.75, "atempo=0.75"),
        (0.25, "atempo=0.5,atempo=0.5"),
    ];

    for (speed, expected) in cases {
        let args = args_for(speed, EncoderProfile::Software);
        assert_eq!(flag_value(&args, "-filter:a"), Some(expected), "speed {}", speed);
    }

    let args = args_for(4.0, EncoderProfile::Software);
    assert_eq!(flag_value(&args, "-filter:v"), Some("setpts=0.25*PTS"));
}

#[test]
fn test_threads_and_frame_rate_are_optional() {
    let mut spec = job("/in/clip.mp4", 2.0);
    spec.frame_rate = FrameRate::KeepOriginal;

    let auto = build_command_plan(
        &spec,
        EncoderProfile::Software,
        ThreadCount::Auto,
        Path::new("o.mp4"),
        None,
    )
    .unwrap()
    .args_lossy();
    assert!(flag_index(&auto, "-threads").is_none());
    assert!(flag_index(&auto, "-r").is_none());

    let fixed = build_command_plan(
        &spec,
        EncoderProfile::Software,
        ThreadCount::Fixed(NonZeroU32::new(6).unwrap()),
        Path::new("o.mp4"),
        None,
    )
    .unwrap()
    .args_lossy();
    assert_eq!(flag_value(&fixed, "-threads"), Some("6"));
    assert!(flag_index(&fixed, "-threads") < flag_index(&fixed, "-filter:v"));
}

#[test]
fn test_invalid_specs_are_rejected() {
    for speed in [0.0, -1.0, f64::NAN] {
        let result = build_command_plan(
            &job("/in/clip.mp4", speed),
            EncoderProfile::Software,
            ThreadCount::Auto,
            Path::new("o.mp4"),
            None,
        );
        assert!(matches!(result, Err(Error::InvalidSpec(_))), "speed {}", speed);
    }

    assert!(matches!(
        "Ultra High".parse::<QualityTier>(),
        Err(Error::InvalidSpec(_))
    ));
    assert!(matches!(
        "turbo".parse::<EncoderProfile>(),
        Err(Error::InvalidSpec(_))
    ));
}

#[test]
fn test_output_names_avoid_collisions() {
    let temp = tempfile::tempdir().unwrap();
    let input = Path::new("/videos/lecture.mkv");

    let first = output_path_for(input, 1.5, temp.path());
    assert_eq!(first, temp.path().join("lecture_1.5x.mkv"));
    fs::write(&first, b"").unwrap();

    let second = output_path_for(input, 1.5, temp.path());
    assert_eq!(second, temp.path().join("lecture_1.5x_1.mkv"));
    fs::write(&second, b"").unwrap();

    let third = output_path_for(input, 1.5, temp.path());
    assert_eq!(third, temp.path().join("lecture_1.5x_2.mkv"));

    // Other speeds are independent
    assert_eq!(
        output_path_for(input, 2.0, temp.path()),
        temp.path().join("lecture_2.0x.mkv")
    );
}
