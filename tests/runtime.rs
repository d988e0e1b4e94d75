#![cfg(feature = "web")]

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::articles;
use proto_news::article::{Article, ArticleDraft, AuthStatus, EntityId, UserProfile};
use proto_news::client::ArticleApi;
use proto_news::controller::{Action, AppContext, LOAD_DELAY, LOGIN_PATH, NoticeKind};
use proto_news::error::ClientError;
use proto_news::feed_store::FeedStore;
use proto_news::image_adjust::ImageAdjuster;
use proto_news::render::{FeedRenderer, Layout};
use proto_news::runtime::{HtmlSurface, Session};
use tokio::time::Instant;

struct FakeApi {
    authenticated: bool,
    articles: Vec<Article>,
    fetches: AtomicUsize,
}

impl FakeApi {
    fn new(authenticated: bool, count: i64) -> Self {
        FakeApi {
            authenticated,
            articles: articles(count),
            fetches: AtomicUsize::new(0),
        }
    }
}

fn user() -> UserProfile {
    UserProfile {
        id: EntityId::Number(9),
        name: "Grace".to_string(),
        email: "grace@example.edu".to_string(),
        created_at: None,
    }
}

#[async_trait]
impl ArticleApi for FakeApi {
    async fn fetch_articles(&self) -> Result<Vec<Article>, ClientError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.articles.clone())
    }

    async fn auth_status(&self) -> Result<AuthStatus, ClientError> {
        Ok(AuthStatus {
            authenticated: self.authenticated,
            user: self.authenticated.then(user),
        })
    }

    async fn fetch_profile(&self) -> Result<Option<UserProfile>, ClientError> {
        Ok(self.authenticated.then(user))
    }

    async fn update_profile(&self, name: &str, email: &str) -> Result<UserProfile, ClientError> {
        Ok(UserProfile {
            name: name.to_string(),
            email: email.to_string(),
            ..user()
        })
    }

    async fn submit_article(
        &self,
        draft: &ArticleDraft,
        _image: Vec<u8>,
    ) -> Result<Article, ClientError> {
        let mut article = self.articles[0].clone();
        article.title = draft.title.clone();
        Ok(article)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

fn session(api: FakeApi) -> Session<FakeApi, HtmlSurface> {
    shared_session(Arc::new(api))
}

fn shared_session(api: Arc<FakeApi>) -> Session<FakeApi, HtmlSurface> {
    let ctx = AppContext::new(
        FeedStore::default(),
        FeedRenderer::new().unwrap(),
        ImageAdjuster::default(),
    )
    .with_seed(1);
    Session::new(ctx, api, HtmlSurface::default())
}

#[tokio::test(start_paused = true)]
async fn test_session_renders_first_batch() {
    let mut session = session(FakeApi::new(true, 12));
    session.dispatch(Action::Start {
        viewport_width: 375,
    });
    session.steps(2).await;

    let surface = session.surface();
    assert_eq!(surface.grid_layout, Some(Layout::Mobile));
    assert_eq!(surface.card_count, 5);
    assert!(surface.observing_sentinel);
    assert!(!surface.loading_visible);
    assert!(surface.profile_button.as_deref().unwrap_or("").contains("Grace"));
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_sentinel_events_appends_one_batch_after_delay() {
    let mut session = session(FakeApi::new(true, 12));
    session.dispatch(Action::Start {
        viewport_width: 375,
    });
    session.steps(2).await;

    let started = Instant::now();
    for _ in 0..3 {
        session.dispatch(Action::SentinelVisibility(true));
    }
    assert!(session.surface().loading_visible);

    session.step().await;
    assert!(started.elapsed() >= LOAD_DELAY, "Batch appeared before the delay");
    assert_eq!(session.surface().appends, 1);
    assert_eq!(session.surface().card_count, 10);
    assert!(!session.surface().loading_visible);
}

#[tokio::test(start_paused = true)]
async fn test_scrolling_never_runs_out() {
    let mut session = session(FakeApi::new(true, 7));
    session.dispatch(Action::Start {
        viewport_width: 375,
    });
    session.steps(2).await;

    for _ in 0..6 {
        session.dispatch(Action::SentinelVisibility(true));
        session.step().await;
    }

    // 5 on first render, then the 2 left over, then 5 from each reshuffled pass
    // followed by its own 2-article tail
    assert_eq!(session.surface().appends, 6);
    assert_eq!(session.surface().card_count, 5 + 2 + 5 + 2 + 5 + 2 + 5);
    assert!(session.context().store().has_looped());
}

#[tokio::test(start_paused = true)]
async fn test_unauthenticated_session_redirects() {
    let api = FakeApi::new(false, 12);
    let mut session = session(api);
    session.dispatch(Action::Start {
        viewport_width: 375,
    });
    session.step().await;

    assert_eq!(session.surface().redirected_to.as_deref(), Some(LOGIN_PATH));
    assert_eq!(session.surface().card_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_drains_until_idle() {
    let api = Arc::new(FakeApi::new(true, 3));
    let mut session = shared_session(api.clone());
    session.dispatch(Action::Start {
        viewport_width: 1280,
    });

    let surface = session.run().await;
    assert_eq!(api.fetches.load(Ordering::SeqCst), 1, "Feed must be fetched once");
    assert_eq!(surface.grid_layout, Some(Layout::Desktop));
    assert_eq!(surface.card_count, 3);
    assert!(!surface.observing_sentinel);
}

#[tokio::test(start_paused = true)]
async fn test_run_handles_scroll_timers_and_outside_events() {
    let api = Arc::new(FakeApi::new(true, 12));
    let mut session = shared_session(api.clone());
    session.dispatch(Action::Start {
        viewport_width: 375,
    });

    // The user scrolls to the bottom a second after the page loads
    let tx = session.sender();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        tx.send(Action::SentinelVisibility(true)).unwrap();
    });

    let surface = session.run().await;
    assert_eq!(api.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(surface.grid_layout, Some(Layout::Mobile));
    assert_eq!(surface.appends, 1, "The delayed batch must be delivered inside run");
    assert_eq!(surface.card_count, 10);
    assert!(!surface.loading_visible);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_counts_pending_work() {
    let mut session = session(FakeApi::new(true, 12));
    assert_eq!(session.in_flight(), 0);

    session.dispatch(Action::Start {
        viewport_width: 375,
    });
    assert_eq!(session.in_flight(), 1);

    session.steps(2).await;
    assert_eq!(session.in_flight(), 0);

    session.dispatch(Action::SentinelVisibility(true));
    assert_eq!(session.in_flight(), 1);
    session.step().await;
    assert_eq!(session.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_profile_update_round_trip() {
    let mut session = session(FakeApi::new(true, 3));
    session.dispatch(Action::OpenProfile);
    session.step().await;
    assert!(session.surface().profile_modal.as_deref().unwrap_or("").contains("Grace"));

    session.dispatch(Action::SaveProfile {
        name: "Grace H".to_string(),
        email: "gh@example.edu".to_string(),
    });
    session.step().await;

    let surface = session.surface();
    assert!(surface.profile_button.as_deref().unwrap_or("").contains("Grace H"));
    assert_eq!(surface.notices.last().map(|n| n.kind), Some(NoticeKind::Success));
}

#[tokio::test(start_paused = true)]
async fn test_resize_switches_layout_once_settled() {
    let api = FakeApi::new(true, 12);
    let mut session = session(api);
    session.dispatch(Action::Start {
        viewport_width: 375,
    });
    session.steps(2).await;

    let tx = session.sender();
    for width in [800, 1000, 1400] {
        tx.send(Action::Resized {
            viewport_width: width,
        })
        .unwrap();
    }
    // three resizes, then three settle timers of which only the last applies
    session.steps(6).await;

    assert_eq!(session.surface().grid_layout, Some(Layout::Desktop));
    assert_eq!(session.surface().card_count, 9);
    assert!(!session.surface().observing_sentinel);
}
