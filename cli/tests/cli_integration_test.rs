use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn tmp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("packetwave-cli-tests");
    fs::create_dir_all(&dir).ok();
    dir.join(name)
}

fn run_packetwave(args: &[&str]) -> (bool, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_packetwave"))
        .args(args)
        .output()
        .expect("Failed to execute packetwave");
    let text =
        String::from_utf8_lossy(&output.stderr).to_string() + &String::from_utf8_lossy(&output.stdout);
    (output.status.success(), text)
}

#[test]
fn test_encode_produces_wav() {
    let input = tmp_path("encode_input.bin");
    let output = tmp_path("encode_output.wav");
    fs::write(&input, [0x82u8, 0xA0, 0x40, 0x62]).unwrap();

    let (ok, text) = run_packetwave(&[
        "encode",
        input.to_str().unwrap(),
        output.to_str().unwrap(),
    ]);
    assert!(ok, "encode failed: {}", text);
    assert!(text.contains("Encoded 1 frames"), "unexpected output: {}", text);

    let size = fs::metadata(&output).expect("Output file not created").len();
    // a few hundred bit cells at 64 samples each, 16-bit mono
    assert!(size > 1_000, "File too small: {} bytes", size);
    assert!(size < 500_000, "File too large: {} bytes", size);
}

#[test]
fn test_encode_decode_roundtrip() {
    let payload = b"The quick brown fox";
    let input = tmp_path("roundtrip_input.bin");
    let wav = tmp_path("roundtrip.wav");
    let decoded = tmp_path("roundtrip_output.bin");
    fs::write(&input, payload).unwrap();

    let (ok, text) = run_packetwave(&["encode", input.to_str().unwrap(), wav.to_str().unwrap()]);
    assert!(ok, "encode failed: {}", text);

    let (ok, text) = run_packetwave(&["decode", wav.to_str().unwrap(), decoded.to_str().unwrap()]);
    assert!(ok, "decode failed: {}", text);
    assert!(text.contains("Decoded 1 frames"), "unexpected output: {}", text);

    assert_eq!(fs::read(&decoded).unwrap(), payload);
}

#[test]
fn test_kiss_stream_roundtrip() {
    // two frames on one serial stream, reserved bytes included
    let stream = [
        0xC0, 0x00, 0x11, 0xDB, 0xDC, 0x22, 0xC0, // payload 11 C0 22
        0xC0, 0x00, 0x33, 0x44, 0x55, 0xC0,
    ];
    let input = tmp_path("kiss_input.bin");
    let wav = tmp_path("kiss.wav");
    let decoded = tmp_path("kiss_output.bin");
    fs::write(&input, stream).unwrap();

    let (ok, text) = run_packetwave(&[
        "encode",
        "--kiss",
        input.to_str().unwrap(),
        wav.to_str().unwrap(),
    ]);
    assert!(ok, "encode failed: {}", text);
    assert!(text.contains("Encoded 2 frames"), "unexpected output: {}", text);

    let (ok, text) = run_packetwave(&[
        "decode",
        "--kiss",
        wav.to_str().unwrap(),
        decoded.to_str().unwrap(),
    ]);
    assert!(ok, "decode failed: {}", text);

    // the decoded stream carries the same two frames, re-escaped
    assert_eq!(fs::read(&decoded).unwrap(), stream);
}

#[test]
fn test_decode_rejects_silence() {
    let wav = tmp_path("silence.wav");
    let decoded = tmp_path("silence_output.bin");

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 9600,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&wav, spec).unwrap();
    for _ in 0..9600 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    let (ok, text) = run_packetwave(&["decode", wav.to_str().unwrap(), decoded.to_str().unwrap()]);
    assert!(!ok, "decode of silence should fail, got: {}", text);
}
