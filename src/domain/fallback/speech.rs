use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::Cursor;

const SAMPLE_RATE: u32 = 16_000;
const SILENCE_MS: u32 = 500;

/// Half a second of 16-bit mono silence as a WAV file.
pub fn silent_wav() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let samples = SAMPLE_RATE * SILENCE_MS / 1000;

    let mut buffer = Cursor::new(Vec::new());
    let written = hound::WavWriter::new(&mut buffer, spec).and_then(|mut writer| {
        for _ in 0..samples {
            writer.write_sample(0i16)?;
        }
        writer.finalize()
    });

    match written {
        Ok(()) => buffer.into_inner(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render silent clip");
            Vec::new()
        }
    }
}

pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}
