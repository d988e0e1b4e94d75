mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::{article, articles};
use proto_news::article::{EntityId, UserProfile};
use proto_news::controller::Notice;
use proto_news::image_adjust::ImageAdjuster;
use proto_news::render::{FeedRenderer, ImageView, Layout, RenderOp};

fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap()
}

fn renderer() -> FeedRenderer {
    FeedRenderer::with_clock(fixed_clock).expect("Templates failed to register")
}

#[test]
fn test_card_contains_article_fields() {
    let html = renderer().card(&article(3));

    assert!(html.contains("data-article-id=\"3\""));
    assert!(html.contains("Article 3"));
    assert!(html.contains("Body of article 3"));
    assert!(html.contains("Campus"));
    assert!(html.contains("src=\"/uploads/3.jpg\""));
    assert!(html.contains("Test Author"));
    assert!(html.contains("3 hours ago"), "Relative time missing from {}", html);
}

#[test]
fn test_user_text_is_escaped() {
    let mut hostile = article(1);
    hostile.title = "<script>alert(1)</script>".to_string();
    hostile.body = "<img src=x onerror=alert(1)>".to_string();
    hostile.author_name = "\"><b>bold</b>".to_string();
    hostile.tag = "<i>tag</i>".to_string();

    let html = renderer().card(&hostile);

    assert!(!html.contains("<script>"), "Title rendered as markup: {}", html);
    assert!(html.contains("&lt;script&gt;"));
    assert!(!html.contains("<img src=x"));
    assert!(!html.contains("<b>bold</b>"));
    assert!(!html.contains("<i>tag</i>"));
}

#[test]
fn test_unsafe_image_sources_are_dropped() {
    let r = renderer();
    let mut a = article(1);

    a.image_path = "javascript:alert(1)".to_string();
    assert!(r.card(&a).contains("src=\"\""));

    a.image_path = "//evil.example/x.jpg".to_string();
    assert!(r.card(&a).contains("src=\"\""));

    a.image_path = "https://cdn.example/x.jpg".to_string();
    assert!(r.card(&a).contains("https://cdn.example/x.jpg"));
}

#[test]
fn test_unparseable_timestamp_renders_blank_time() {
    let mut a = article(1);
    a.created_at = "garbage".to_string();
    assert!(renderer().card(&a).contains("<span class=\"time\"></span>"));
}

#[test]
fn test_empty_and_error_states_differ() {
    let r = renderer();

    match r.initial_layout(&[], Layout::Mobile) {
        RenderOp::ShowEmpty(html) => assert!(html.contains("No articles found")),
        other => panic!("Expected empty state, got {:?}", other),
    }
    match r.error_state() {
        RenderOp::ShowError(html) => {
            assert!(html.contains("Error loading articles"));
            assert!(!html.contains("No articles found"));
        }
        other => panic!("Expected error state, got {:?}", other),
    }
}

#[test]
fn test_initial_layout_and_append() {
    let r = renderer();
    let batch = articles(5);

    match r.initial_layout(&batch, Layout::Desktop) {
        RenderOp::ReplaceGrid { layout, html } => {
            assert_eq!(layout, Layout::Desktop);
            assert_eq!(html.matches("class=\"news-card\"").count(), 5);
        }
        other => panic!("Expected grid, got {:?}", other),
    }

    assert!(r.append_batch(&[]).is_none());
    match r.append_batch(&batch[..2]) {
        Some(RenderOp::AppendToGrid(html)) => {
            assert_eq!(html.matches("class=\"news-card\"").count(), 2)
        }
        other => panic!("Expected append, got {:?}", other),
    }
}

#[test]
fn test_layout_breakpoint() {
    assert_eq!(Layout::from_width(375), Layout::Mobile);
    assert_eq!(Layout::from_width(768), Layout::Mobile);
    assert_eq!(Layout::from_width(769), Layout::Desktop);
    assert!(Layout::Mobile.is_scrolling());
    assert!(!Layout::Desktop.is_scrolling());
}

#[test]
fn test_profile_modal() {
    let r = renderer();
    let profile = UserProfile {
        id: EntityId::Number(1),
        name: "<Ada>".to_string(),
        email: "ada@example.edu".to_string(),
        created_at: Some("2023-09-01 08:30:00".to_string()),
    };

    match r.profile_modal(&profile, false) {
        RenderOp::ProfileModal(html) => {
            assert!(html.contains("&lt;Ada&gt;"));
            assert!(html.contains("ada@example.edu"));
            assert!(html.contains("2023-09-01"));
            assert!(html.contains("class=\"profile-edit\" hidden"));
        }
        other => panic!("Expected profile modal, got {:?}", other),
    }

    match r.profile_button("Ada") {
        RenderOp::ProfileButton(html) => assert!(html.contains("<span>Ada</span>")),
        other => panic!("Expected profile button, got {:?}", other),
    }
}

#[test]
fn test_image_view_snapshot() {
    let mut adjuster = ImageAdjuster::default();
    assert!(ImageView::of(&adjuster).is_none());

    adjuster.select_dimensions(1200, 440).unwrap();
    let view = ImageView::of(&adjuster).unwrap();
    assert_eq!(view.zoom_percent, 50);
    assert_eq!(view.min_zoom_percent, 50);
    assert_eq!(view.max_zoom_percent, 200);
    assert_eq!(
        view.css_transform(),
        "translate(-50%, -50%) scale(0.5) translate(0px, 0px)"
    );
}

#[test]
fn test_notice_is_escaped_and_typed() {
    let r = renderer();

    let html = r.notice(&Notice::error("<b>Upload failed</b>"));
    assert!(html.contains("notification-error"));
    assert!(html.contains("&lt;b&gt;Upload failed&lt;/b&gt;"));

    let html = r.notice(&Notice::success("Profile updated successfully!"));
    assert!(html.contains("notification-success"));
    assert!(html.contains("Profile updated successfully!"));
}
