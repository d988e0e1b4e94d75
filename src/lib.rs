/*!
# Proto Campus News

The feed and image pipeline of a campus news-sharing application, built in Rust.

## Overview

Students browse a shared feed of approved articles and submit their own
articles with a photo. This crate holds the parts of the front end with real
behaviour, written so they run headlessly:

- the infinite-scroll feed (fetch once, page through, reshuffle when the pool
  runs out so the feed never ends),
- the crop/zoom/pan step of article submission, exported as a fixed-size JPEG,
- the HTML rendering of article cards with all user text escaped,
- an HTTP client for the backend contract and a small development backend.

Authentication, password storage, uploads and moderation belong to the main
backend and are only reached through its HTTP API.

## Architecture

### Feed
- **Feed Store** (`feed_store`) - Fetched articles, read cursor, Fisher-Yates reshuffle
- **Feed Renderer** (`render`) - Handlebars templates producing `RenderOp`s
- **Feed Controller** (`controller`) - `AppContext::dispatch(Action) -> Vec<Effect>`

### Submission
- **Image Adjustment Engine** (`image_adjust`) - Cover-clamped scale and pan, JPEG export
- **Article model** (`article`) - Wire types and draft validation

### Networking (`web` feature)
- **Client** (`client`) - `ArticleApi` over reqwest with a cookie store
- **Runtime** (`runtime`) - Runs effects on tokio and feeds results back as actions
- **Backend** (`app`, `store`, `config`) - axum server for `/api/articles` and static files

## Layouts

Viewports up to 768px wide use the mobile layout: the first five articles are
shown and every time the scroll sentinel becomes visible the next five follow
after a short pause. Wider viewports show a fixed page of nine articles.

## REST API Endpoints

- `GET /api/articles` - Approved articles, newest first
- `GET /api/auth/status` - Session check (main backend)
- `GET /api/profile`, `PUT /api/profile` - Profile read/update (main backend)
- `POST /api/articles` - Multipart submission with the exported image (main backend)
- `POST /api/logout` - End the session (main backend)
*/

pub mod article;
pub mod controller;
pub mod error;
pub mod feed_store;
pub mod image_adjust;
pub mod render;
pub mod store;
pub mod time_ago;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod client;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod runtime;

pub use article::*;
pub use controller::{Action, AppContext, Effect, Notice, NoticeKind};
pub use error::*;
pub use feed_store::FeedStore;
pub use image_adjust::{AdjustConfig, AdjustState, ImageAdjuster, SelectedFile, Transform};
pub use render::{FeedRenderer, ImageView, Layout, RenderOp};
