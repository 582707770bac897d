//! Basic image generation example.
//!
//! Run with: `cargo run --example generate_image`
//!
//! Requires `GEMINI_API_KEY` environment variable.

use retouch::{GeminiService, GenerateSession};

#[tokio::main]
async fn main() -> retouch::Result<()> {
    let service = GeminiService::builder().build()?;

    let mut session = GenerateSession::new();
    session.set_prompt("A photo of an astronaut riding a horse on Mars, cinematic lighting");

    match session.run(&service).await {
        retouch::Phase::Success(image) => {
            image.save("generated.png")?;
            println!(
                "Generated image: {} bytes, format: {:?}",
                image.size(),
                image.format
            );
        }
        retouch::Phase::Failure(message) => eprintln!("Generation failed: {message}"),
        _ => {}
    }

    Ok(())
}
