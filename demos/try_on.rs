//! Outfit edit example - restyles a portrait, optionally from a reference garment.
//!
//! Run with: `cargo run --example try_on -- <portrait.png> [garment.png]`
//!
//! Requires `GOOGLE_API_KEY` environment variable.

use tryon::{DataUri, GeminiEditorBuilder, TryOnSession};

#[tokio::main]
async fn main() -> tryon::Result<()> {
    let mut args = std::env::args().skip(1);
    let portrait = args
        .next()
        .expect("Usage: try_on <portrait.png> [garment.png]");

    let editor = GeminiEditorBuilder::from_env().build()?;

    let mut session = TryOnSession::new(editor);
    session.set_source_image(DataUri::from_path(&portrait)?);
    if let Some(garment) = args.next() {
        session.set_reference_image(DataUri::from_path(garment)?);
    }
    session.set_prompt("A tailored charcoal suit with a white shirt and no tie");

    let result = session.generate().await?;
    if let tryon::ImageLocator::DataUri(uri) = &result {
        let bytes = uri.decode()?;
        std::fs::write("tryon.png", &bytes)?;
        println!("Edited image saved to tryon.png ({} bytes)", bytes.len());
    } else {
        println!("Edited image: {result}");
    }

    Ok(())
}
