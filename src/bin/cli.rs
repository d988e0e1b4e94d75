#![cfg(not(tarpaulin_include))]

use proto_news::client::HttpClient;
use proto_news::controller::{Action, AppContext, Notice};
use proto_news::feed_store::FeedStore;
use proto_news::image_adjust::{ImageAdjuster, SelectedFile};
use proto_news::render::{FeedRenderer, RenderOp};
use proto_news::runtime::{RenderSurface, Session};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Prints a one-line summary of every render instruction
struct TerminalSurface;

impl RenderSurface for TerminalSurface {
    fn apply(&mut self, op: RenderOp) {
        match op {
            RenderOp::ReplaceGrid { layout, html } => println!(
                "[grid] {:?} layout, {} cards",
                layout,
                html.matches("class=\"news-card\"").count()
            ),
            RenderOp::AppendToGrid(html) => println!(
                "[grid] appended {} cards",
                html.matches("class=\"news-card\"").count()
            ),
            RenderOp::ShowEmpty(_) => println!("[feed] no articles found"),
            RenderOp::ShowError(_) => println!("[feed] error loading articles"),
            RenderOp::LoadingIndicator { visible, .. } => {
                if visible {
                    println!("[feed] loading more articles...");
                }
            }
            other => println!("[ui] {:?}", other),
        }
    }

    fn notify(&mut self, notice: Notice) {
        println!("[notice] {}", notice.message);
    }

    fn redirect(&mut self, path: &str) {
        println!("[redirect] {}", path);
    }
}

fn usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {} feed <base_url> [viewport_width] [scrolls]", program);
    eprintln!("  {} crop <input> <output.jpg> [zoom_percent] [dx] [dy]", program);
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

fn crop(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let input = Path::new(&args[0]);
    let output = Path::new(&args[1]);
    let bytes = fs::read(input)?;
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();

    let mut adjuster = ImageAdjuster::default();
    adjuster.select(SelectedFile::new(&name, mime_for(input), bytes))?;

    if let Some(zoom) = args.get(2).and_then(|z| z.parse::<f64>().ok()) {
        adjuster.set_zoom_percent(zoom);
    }
    let dx = args.get(3).and_then(|v| v.parse().ok()).unwrap_or(0.0);
    let dy = args.get(4).and_then(|v| v.parse().ok()).unwrap_or(0.0);
    adjuster.pan(dx, dy);

    let t = adjuster.transform();
    println!(
        "scale {:.3} (min {:.3}, max {:.3}), offset ({:.1}, {:.1})",
        t.scale,
        adjuster.min_scale(),
        adjuster.max_scale(),
        t.translate_x,
        t.translate_y
    );

    let jpeg = adjuster.export().ok_or("Error creating adjusted image")?;
    fs::write(output, &jpeg)?;
    println!("Wrote {} bytes to {}", jpeg.len(), output.display());
    Ok(())
}

async fn feed(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let base_url = &args[0];
    let width: u32 = args.get(1).and_then(|w| w.parse().ok()).unwrap_or(375);
    let scrolls: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(3);

    let api = Arc::new(HttpClient::new(base_url)?);
    let ctx = AppContext::new(
        FeedStore::default(),
        FeedRenderer::new()?,
        ImageAdjuster::default(),
    );
    let mut session = Session::new(ctx, api, TerminalSurface);

    session.dispatch(Action::Start {
        viewport_width: width,
    });
    // auth check, then article fetch
    session.steps(2).await;

    for _ in 0..scrolls {
        if session.context().store().is_empty() {
            break;
        }
        session.dispatch(Action::SentinelVisibility(true));
        session.step().await;
        println!(
            "cursor {}/{}{}",
            session.context().store().cursor(),
            session.context().store().len(),
            if session.context().store().has_looped() {
                " (reshuffled)"
            } else {
                ""
            }
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("feed") if args.len() >= 3 => feed(&args[2..]).await,
        Some("crop") if args.len() >= 4 => crop(&args[2..]),
        _ => {
            usage(&args[0]);
            Ok(())
        }
    }
}
