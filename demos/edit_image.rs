//! Image editing example - modifies an existing image with a text prompt.
//!
//! Run with: `cargo run --example edit_image -- <input_image.png>`
//!
//! Requires `GEMINI_API_KEY` environment variable.

use retouch::{EditSession, GeminiService, SelectedFile};

#[tokio::main]
async fn main() -> retouch::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .expect("Usage: edit_image <input_image.png>");

    let service = GeminiService::builder().build()?;

    let mut session = EditSession::new();
    session.select_file(SelectedFile::from_path(&input_path)?);
    session.set_prompt("Make the colors more vibrant and add a warm sunset glow");

    match session.run(&service).await {
        retouch::Phase::Success(image) => {
            image.save("edited.png")?;
            println!("Edited image saved to edited.png ({} bytes)", image.size());
        }
        retouch::Phase::Failure(message) => eprintln!("Edit failed: {message}"),
        _ => {}
    }

    Ok(())
}
