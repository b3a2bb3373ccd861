//! Synthesize a sentence, then dictate an AMR recording.
//!
//! ```bash
//! NUANCE_APP_ID=... NUANCE_APP_KEY=... cargo run --example speech -- audio.amr
//! ```

use nuance_ox::{DictationRequest, Nuance, TtsRequest};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let nuance = Nuance::load_from_env()?;

    let speech = TtsRequest::builder()
        .identifier("example-user")
        .text("hello world")
        .output("testFile.wav")
        .output_format("wav")
        .language("en_US")
        .voice("Tom")
        .build();

    match nuance.send_tts_request(&speech).await {
        Ok(output) => println!("The file was saved: {}", output.path.display()),
        Err(e) => eprintln!("TTS request failed: {e}"),
    }

    let audio = std::env::args().nth(1).unwrap_or_else(|| "audio.amr".to_string());
    let dictation = DictationRequest::builder()
        .identifier("example-user")
        .language("en-US")
        .path(audio)
        .build();

    for line in nuance.send_dictation_request(&dictation).await? {
        println!("{line}");
    }

    Ok(())
}
