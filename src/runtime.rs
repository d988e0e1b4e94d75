use std::sync::Arc;

use log::{debug, info};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::client::ArticleApi;
use crate::controller::{Action, AppContext, Effect, Notice};
use crate::render::{ImageView, Layout, RenderOp};

/// Whatever displays the feed: a browser bridge, a terminal, or a test double
pub trait RenderSurface {
    fn apply(&mut self, op: RenderOp);

    fn notify(&mut self, notice: Notice) {
        info!("{:?}: {}", notice.kind, notice.message);
    }

    fn redirect(&mut self, path: &str) {
        info!("Redirect to {}", path);
    }
}

/// Headless surface that keeps the resulting markup in memory
#[derive(Debug, Default)]
pub struct HtmlSurface {
    /// Grid markup, cards in display order
    pub grid: String,
    pub grid_layout: Option<Layout>,
    /// Number of cards currently in the grid
    pub card_count: usize,
    /// Empty or error panel, when shown instead of the grid
    pub status_panel: Option<String>,
    pub loading_visible: bool,
    pub observing_sentinel: bool,
    pub profile_button: Option<String>,
    pub profile_modal: Option<String>,
    pub profile_editing: bool,
    pub form_open: bool,
    pub submitting: bool,
    pub image: Option<ImageView>,
    pub notices: Vec<Notice>,
    pub redirected_to: Option<String>,
    /// Number of `AppendToGrid` ops applied
    pub appends: usize,
}

fn count_cards(html: &str) -> usize {
    html.matches("class=\"news-card\"").count()
}

impl RenderSurface for HtmlSurface {
    fn apply(&mut self, op: RenderOp) {
        match op {
            RenderOp::ShowEmpty(html) | RenderOp::ShowError(html) => {
                self.grid.clear();
                self.card_count = 0;
                self.status_panel = Some(html);
            }
            RenderOp::ReplaceGrid { layout, html } => {
                self.card_count = count_cards(&html);
                self.grid = html;
                self.grid_layout = Some(layout);
                self.status_panel = None;
            }
            RenderOp::AppendToGrid(html) => {
                self.card_count += count_cards(&html);
                self.grid.push_str(&html);
                self.appends += 1;
            }
            RenderOp::LoadingIndicator { visible, .. } => self.loading_visible = visible,
            RenderOp::ObserveSentinel(on) => self.observing_sentinel = on,
            RenderOp::ProfileButton(html) => self.profile_button = Some(html),
            RenderOp::ProfileModal(html) => {
                self.profile_modal = Some(html);
                self.profile_editing = false;
            }
            RenderOp::ProfileEditMode(editing) => self.profile_editing = editing,
            RenderOp::CloseProfileModal => self.profile_modal = None,
            RenderOp::ArticleForm { open } => self.form_open = open,
            RenderOp::Submitting(on) => self.submitting = on,
            RenderOp::ImageAdjust(view) => self.image = view,
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn redirect(&mut self, path: &str) {
        self.redirected_to = Some(path.to_string());
    }
}

/// Single-threaded driver for an [`AppContext`]
///
/// Actions are processed one at a time. Network calls and timers run as
/// tokio tasks and post their results back through an internal channel,
/// so the context itself is never touched concurrently. Outside events
/// (scroll, resize, clicks) arrive on a second channel fed by [`Session::sender`].
pub struct Session<A, S> {
    ctx: AppContext,
    api: Arc<A>,
    surface: S,
    /// Released by `run` so the event channel closes with the last outside handle
    events_tx: Option<UnboundedSender<Action>>,
    events_rx: UnboundedReceiver<Action>,
    events_open: bool,
    results_tx: UnboundedSender<Action>,
    results_rx: UnboundedReceiver<Action>,
    /// Spawned calls and timers whose result has not been handled yet
    in_flight: usize,
}

impl<A, S> Session<A, S>
where
    A: ArticleApi + 'static,
    S: RenderSurface,
{
    pub fn new(ctx: AppContext, api: Arc<A>, surface: S) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        let (results_tx, results_rx) = unbounded_channel();
        Session {
            ctx,
            api,
            surface,
            events_tx: Some(events_tx),
            events_rx,
            events_open: true,
            results_tx,
            results_rx,
            in_flight: 0,
        }
    }

    /// Handle for posting external events (scroll, resize, clicks)
    pub fn sender(&self) -> UnboundedSender<Action> {
        match &self.events_tx {
            Some(tx) => tx.clone(),
            None => unbounded_channel().0,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Number of network calls and timers still running
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Process one action immediately
    pub fn dispatch(&mut self, action: Action) {
        for effect in self.ctx.dispatch(action) {
            self.execute(effect);
        }
    }

    /// Wait for the next result or outside event and process it
    ///
    /// # Returns
    /// * `bool` - False once nothing is running and every outside sender is gone
    pub async fn step(&mut self) -> bool {
        match self.next_action().await {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    /// Process queued actions until `n` have been handled
    pub async fn steps(&mut self, n: usize) {
        for _ in 0..n {
            if !self.step().await {
                break;
            }
        }
    }

    /// Run until no work is pending and no outside sender is left
    pub async fn run(mut self) -> S {
        self.events_tx = None;
        while self.step().await {}
        self.surface
    }

    async fn next_action(&mut self) -> Option<Action> {
        loop {
            if self.in_flight == 0 && !self.events_open {
                return None;
            }

            tokio::select! {
                Some(action) = self.results_rx.recv(), if self.in_flight > 0 => {
                    self.in_flight -= 1;
                    return Some(action);
                }
                event = self.events_rx.recv(), if self.events_open => match event {
                    Some(action) => return Some(action),
                    None => {
                        debug!("All event senders gone");
                        self.events_open = false;
                    }
                },
                else => return None,
            }
        }
    }

    fn spawn_call<F>(&mut self, call: F)
    where
        F: std::future::Future<Output = Action> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let action = call.await;
            if tx.send(action).is_err() {
                debug!("Session closed before a result arrived");
            }
        });
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Render(op) => self.surface.apply(op),
            Effect::Notify(notice) => self.surface.notify(notice),
            Effect::Redirect(path) => self.surface.redirect(&path),
            Effect::Schedule { after, action } => self.spawn_call(async move {
                tokio::time::sleep(after).await;
                action
            }),
            Effect::CheckAuth => {
                let api = self.api.clone();
                self.spawn_call(async move { Action::AuthChecked(api.auth_status().await) });
            }
            Effect::FetchArticles => {
                let api = self.api.clone();
                self.spawn_call(async move { Action::ArticlesFetched(api.fetch_articles().await) });
            }
            Effect::RefreshArticles => {
                let api = self.api.clone();
                self.spawn_call(async move { Action::ArticlesRefreshed(api.fetch_articles().await) });
            }
            Effect::SubmitArticle { draft, image } => {
                let api = self.api.clone();
                self.spawn_call(async move {
                    Action::ArticleSubmitted(api.submit_article(&draft, image).await)
                });
            }
            Effect::FetchProfile => {
                let api = self.api.clone();
                self.spawn_call(async move { Action::ProfileLoaded(api.fetch_profile().await) });
            }
            Effect::UpdateProfile { name, email } => {
                let api = self.api.clone();
                self.spawn_call(async move {
                    Action::ProfileSaved(api.update_profile(&name, &email).await)
                });
            }
            Effect::Logout => {
                let api = self.api.clone();
                self.spawn_call(async move { Action::LoggedOut(api.logout().await) });
            }
        }
    }
}
