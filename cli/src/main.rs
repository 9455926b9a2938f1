use clap::{Parser, Subcommand};
use hound::WavSpec;
use log::info;
use std::fs::File;
use std::path::PathBuf;
use packetwave_core::{
    kiss, AfskTransmitter, Demodulator, KissDeframer, ModemConfig, WaveformRenderer,
    GOERTZEL_BLOCK, KISS_DATA_FRAME, SAMPLE_RATE,
};

#[derive(Parser)]
#[command(name = "packetwave")]
#[command(about = "AFSK packet modem bridging KISS frames to audio")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode packet data to WAV audio file
    Encode {
        /// Input binary file
        #[arg(value_name = "INPUT.BIN")]
        input: PathBuf,

        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Treat the input as a KISS serial stream (may hold several frames)
        #[arg(short, long)]
        kiss: bool,
    },

    /// Decode WAV audio file to packet data
    Decode {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Output binary file
        #[arg(value_name = "OUTPUT.BIN")]
        output: PathBuf,

        /// Write recovered frames as a KISS serial stream
        #[arg(short, long)]
        kiss: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { input, output, kiss } => encode_command(&input, &output, kiss)?,
        Commands::Decode { input, output, kiss } => decode_command(&input, &output, kiss)?,
    }

    Ok(())
}

fn encode_command(
    input_path: &PathBuf,
    output_path: &PathBuf,
    kiss_input: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input_path)?;
    println!("Read {} bytes from {}", data.len(), input_path.display());

    // One KISS frame per transmission; raw input becomes a single frame
    let frames = if kiss_input {
        let mut deframer = KissDeframer::new();
        let frames = deframer.push_bytes(&data);
        if frames.is_empty() {
            return Err("no complete KISS frame in input".into());
        }
        frames
    } else {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(KISS_DATA_FRAME);
        frame.extend_from_slice(&data);
        vec![frame]
    };

    let config = ModemConfig::default();
    let mut transmitter = AfskTransmitter::new(&config)?;
    let mut renderer = WaveformRenderer::new(&config)?;

    let mut samples: Vec<f32> = Vec::new();
    for frame in &frames {
        let levels = transmitter.encode_levels(frame)?;
        samples.extend(renderer.render(&levels));
        // inter-frame gap of silence, whole detection blocks
        samples.extend(std::iter::repeat(0.0f32).take(GOERTZEL_BLOCK * 8));
    }
    info!("{} frames, {} samples", frames.len(), samples.len());
    println!("Encoded {} frames to {} audio samples", frames.len(), samples.len());

    // Write WAV file (16-bit PCM)
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let file = File::create(output_path)?;
    let mut writer = hound::WavWriter::new(file, spec)?;
    for sample in samples {
        let clamped = sample.max(-1.0).min(1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;

    println!("Wrote WAV to {}", output_path.display());
    Ok(())
}

fn decode_command(
    input_path: &PathBuf,
    output_path: &PathBuf,
    kiss_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(input_path)?;
    let mut reader = hound::WavReader::new(file)?;

    let spec = reader.spec();
    println!(
        "Read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );
    if spec.channels != 1 {
        return Err(format!("expected mono audio, got {} channels", spec.channels).into());
    }

    let samples: Vec<f32> = match spec.bits_per_sample {
        16 => {
            let int_samples: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
            int_samples?
                .into_iter()
                .map(|s| s as f32 / 32768.0)
                .collect()
        }
        32 => {
            let float_samples: Result<Vec<f32>, _> = reader.samples::<f32>().collect();
            float_samples?
        }
        _ => {
            return Err(format!("Unsupported bit depth: {}", spec.bits_per_sample).into());
        }
    };
    println!("Extracted {} samples", samples.len());

    let mut demodulator = Demodulator::new(&ModemConfig::default())?;
    let frames = demodulator.push_samples(&samples);
    println!(
        "Decoded {} frames ({} candidates dropped)",
        demodulator.frames_ok(),
        demodulator.frames_dropped()
    );
    if frames.is_empty() {
        return Err("no valid frame in recording".into());
    }

    let mut data = Vec::new();
    for frame in &frames {
        if kiss_output {
            data.extend(kiss::frame(frame));
        } else {
            data.extend_from_slice(frame);
        }
    }
    std::fs::write(output_path, &data)?;
    println!("Wrote {} bytes to {}", data.len(), output_path.display());

    Ok(())
}
