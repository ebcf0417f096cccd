/// Storefront screen
///
/// Search box, filter row, the carousel deck and the detail modal. All
/// timing (debounce, filter fade, card moves) goes through tickets handed
/// out by the deck types; this module only turns them into timer tasks and
/// feeds them back when the timers fire.

use std::time::Duration;

use iced::widget::{button, column, container, mouse_area, row, text, text_input, Column, Row, Space};
use iced::{Alignment, Border, Color, Element, Length, Task, Theme};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{modal, AppContext};
use crate::deck::debounce::{DebounceTicket, Debouncer};
use crate::deck::filter::{category_options, visible_templates};
use crate::deck::keys::SwipeTracker;
use crate::deck::navigator::{FilterTicket, SettleTicket};
use crate::deck::slot::index_in_slot;
use crate::deck::{CardSlot, CategoryFilter, Deck, DeckCommand, DeckOutcome};
use crate::state::data::{Template, TemplateId, UserProfile};
use crate::state::session::SessionState;
use crate::state::tasks::{self, Generation, TaskResult};

#[derive(Debug, Clone)]
pub enum StoreMessage {
    CatalogLoaded(u64, TaskResult<Vec<Template>>),
    Retry,
    FavoritesLoaded(u64, TaskResult<Vec<Template>>),
    FilterSelected(CategoryFilter),
    SearchInput(String),
    /// Enter in the search box: skip the rest of the quiet period
    SearchSubmitted,
    SearchCleared,
    SearchSettled(DebounceTicket),
    FilterApplied(FilterTicket),
    Deck(DeckCommand),
    NavigationSettled(SettleTicket),
    SwipeStarted(f32),
    SwipeEnded(f32),
    SwipeCancelled,
    CloseModal,
    ToggleFavorite(TemplateId),
    /// Carries the profile-write stamp of the request
    FavoriteToggled(TemplateId, u64, TaskResult<(bool, UserProfile)>),
    PurchaseStatus(TemplateId, TaskResult<bool>),
    Purchase(TemplateId),
    Purchased(TemplateId, u64, TaskResult<UserProfile>),
    /// Copy a preview or download link
    CopyLink(String, &'static str),
    /// An action needs an account; handled by the application shell
    SignInRequested,
}

/// Detail modal for one template
#[derive(Debug, Clone)]
struct Detail {
    template: Template,
    /// None while the store is being asked
    purchased: Option<bool>,
    busy: bool,
}

impl Detail {
    fn can_download(&self) -> bool {
        self.template.is_free() || self.purchased == Some(true)
    }
}

pub struct Storefront {
    catalog: Vec<Template>,
    favorites: Vec<Template>,
    filter: CategoryFilter,
    search: Debouncer,
    deck: Deck,
    fade: Duration,
    loading: bool,
    error: Option<String>,
    notice: Option<String>,
    catalog_generation: Generation,
    favorites_generation: Generation,
    /// Stamps favorite and purchase writes; only the newest profile snapshot is mirrored
    profile_generation: Generation,
    detail: Option<Detail>,
    swipe: SwipeTracker,
    session: watch::Receiver<SessionState>,
    viewer: SessionState,
}

impl Storefront {
    pub fn new(context: &AppContext) -> Self {
        Self {
            catalog: Vec::new(),
            favorites: Vec::new(),
            filter: CategoryFilter::default(),
            search: Debouncer::new(context.config.search_debounce()),
            deck: Deck::new(context.config.navigation()),
            fade: context.config.filter_settle(),
            loading: false,
            error: None,
            notice: None,
            catalog_generation: Generation::default(),
            favorites_generation: Generation::default(),
            profile_generation: Generation::default(),
            detail: None,
            swipe: SwipeTracker::default(),
            session: context.session.subscribe(),
            viewer: context.session.current(),
        }
    }

    pub fn has_modal(&self) -> bool {
        self.detail.is_some()
    }

    /// Id of the centered card, if any
    pub fn current_id(&self) -> Option<&str> {
        self.deck.active_template().map(|t| t.id.as_str())
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// (Re)load the catalog from the store
    pub fn load(&mut self, context: &AppContext) -> Task<StoreMessage> {
        self.loading = true;
        self.error = None;
        let stamp = self.catalog_generation.advance();
        Task::perform(tasks::load_catalog(context.db_path.clone()), move |result| {
            StoreMessage::CatalogLoaded(stamp, result)
        })
    }

    /// Pick up sign-in / sign-out / profile changes from the session
    pub fn sync_session(&mut self, context: &AppContext) -> Task<StoreMessage> {
        if !self.session.has_changed().unwrap_or(false) {
            return Task::none();
        }

        let state = self.session.borrow_and_update().clone();
        let switched_user = state.identity.as_ref().map(|i| &i.uid) != self.viewer.identity.as_ref().map(|i| &i.uid);
        self.viewer = state;

        match self.viewer.identity.clone() {
            Some(identity) => {
                let stamp = self.favorites_generation.advance();
                Task::perform(tasks::load_favorites(context.db_path.clone(), identity), move |result| {
                    StoreMessage::FavoritesLoaded(stamp, result)
                })
            }
            None => {
                self.favorites_generation.advance();
                self.favorites.clear();
                if switched_user && self.filter == CategoryFilter::Favorites {
                    self.filter = CategoryFilter::All;
                }
                self.refilter()
            }
        }
    }

    /// Start a filter transition; the new list is computed when it ends
    fn start_filter(&mut self) -> FilterTicket {
        self.deck.begin_filter(self.fade)
    }

    fn refilter(&mut self) -> Task<StoreMessage> {
        let ticket = self.start_filter();
        Task::perform(tasks::sleep(ticket.after), move |_| StoreMessage::FilterApplied(ticket))
    }

    fn handle_outcome(&mut self, outcome: DeckOutcome, context: &AppContext) -> Task<StoreMessage> {
        match outcome {
            DeckOutcome::Moved { active, settle } => {
                debug!(active, "card moved");
                Task::perform(tasks::sleep(settle.after), move |_| StoreMessage::NavigationSettled(settle))
            }
            DeckOutcome::OpenDetail(template) => self.open_detail(template, context),
            DeckOutcome::Deferred | DeckOutcome::Ignored => Task::none(),
        }
    }

    fn open_detail(&mut self, template: Template, context: &AppContext) -> Task<StoreMessage> {
        info!(id = %template.id, title = %template.title, "opening template detail");
        let lookup = match (&self.viewer.identity, template.is_free()) {
            (Some(identity), false) => Some((identity.clone(), template.id.clone())),
            _ => None,
        };

        self.detail = Some(Detail {
            purchased: if lookup.is_some() { None } else { Some(false) },
            template,
            busy: false,
        });

        match lookup {
            Some((identity, id)) => {
                let reply_id = id.clone();
                Task::perform(tasks::purchase_status(context.db_path.clone(), identity, id), move |result| {
                    StoreMessage::PurchaseStatus(reply_id.clone(), result)
                })
            }
            None => Task::none(),
        }
    }

    /// Push a profile snapshot from a write reply into the session, unless
    /// a later write was issued since; its reply carries the newer snapshot.
    fn mirror_profile(&self, stamp: u64, profile: UserProfile, context: &AppContext) {
        if self.profile_generation.is_current(stamp) {
            context.session.refresh_profile(profile);
        } else {
            debug!(stamp, "skipping superseded profile snapshot");
        }
    }

    fn detail_for(&mut self, id: &str) -> Option<&mut Detail> {
        self.detail.as_mut().filter(|detail| detail.template.id == id)
    }

    pub fn update(&mut self, message: StoreMessage, context: &AppContext) -> Task<StoreMessage> {
        match message {
            StoreMessage::CatalogLoaded(stamp, result) => {
                if !self.catalog_generation.is_current(stamp) {
                    debug!(stamp, "ignoring superseded catalog load");
                    return Task::none();
                }
                self.loading = false;
                match result {
                    Ok(catalog) => {
                        info!(count = catalog.len(), "catalog loaded");
                        self.catalog = catalog;
                        self.error = None;
                        self.refilter()
                    }
                    Err(e) => {
                        self.error = Some(e);
                        Task::none()
                    }
                }
            }
            StoreMessage::Retry => self.load(context),
            StoreMessage::FavoritesLoaded(stamp, result) => {
                if !self.favorites_generation.is_current(stamp) {
                    return Task::none();
                }
                match result {
                    Ok(favorites) => {
                        self.favorites = favorites;
                        if self.filter == CategoryFilter::Favorites {
                            self.refilter()
                        } else {
                            Task::none()
                        }
                    }
                    Err(e) => {
                        self.notice = Some(format!("Could not load favorites: {}", e));
                        Task::none()
                    }
                }
            }
            StoreMessage::FilterSelected(filter) => {
                if filter == self.filter {
                    return Task::none();
                }
                info!(filter = %filter, "filter changed");
                self.filter = filter;
                self.refilter()
            }
            StoreMessage::SearchInput(value) => {
                let ticket = self.search.input(value);
                Task::perform(tasks::sleep(ticket.after), move |_| StoreMessage::SearchSettled(ticket))
            }
            StoreMessage::SearchSubmitted => {
                let ticket = self.search.input(self.search.typed().to_string());
                match self.search.fire(ticket) {
                    Some(_) => self.refilter(),
                    None => Task::none(),
                }
            }
            StoreMessage::SearchCleared => {
                let had_search = !self.search.settled().is_empty();
                self.search.clear();
                if had_search {
                    self.refilter()
                } else {
                    Task::none()
                }
            }
            StoreMessage::SearchSettled(ticket) => match self.search.fire(ticket) {
                Some(term) => {
                    debug!(term, "search settled");
                    self.refilter()
                }
                None => Task::none(),
            },
            StoreMessage::FilterApplied(ticket) => {
                if !self.deck.is_current_filter(ticket) {
                    return Task::none();
                }
                let visible = visible_templates(&self.catalog, &self.favorites, &self.filter, self.search.settled());
                debug!(visible = visible.len(), filter = %self.filter, "applying visible list");
                let outcome = self.deck.replace_templates(ticket, visible);
                self.handle_outcome(outcome, context)
            }
            StoreMessage::Deck(command) => {
                let outcome = self.deck.dispatch(command);
                self.handle_outcome(outcome, context)
            }
            StoreMessage::NavigationSettled(ticket) => {
                let outcome = self.deck.settle(ticket);
                self.handle_outcome(outcome, context)
            }
            StoreMessage::SwipeStarted(x) => {
                if self.detail.is_none() {
                    self.swipe.press(x);
                }
                Task::none()
            }
            StoreMessage::SwipeEnded(x) => match self.swipe.release(x) {
                Some(command) => self.update(StoreMessage::Deck(command), context),
                None => Task::none(),
            },
            StoreMessage::SwipeCancelled => {
                self.swipe.cancel();
                Task::none()
            }
            StoreMessage::CloseModal => {
                self.detail = None;
                Task::none()
            }
            StoreMessage::ToggleFavorite(id) => {
                let Some(identity) = self.viewer.identity.clone() else {
                    return Task::done(StoreMessage::SignInRequested);
                };
                if let Some(detail) = self.detail_for(&id) {
                    detail.busy = true;
                }
                let stamp = self.profile_generation.advance();
                let reply_id = id.clone();
                Task::perform(tasks::toggle_favorite(context.db_path.clone(), identity, id), move |result| {
                    StoreMessage::FavoriteToggled(reply_id.clone(), stamp, result)
                })
            }
            StoreMessage::FavoriteToggled(id, stamp, result) => {
                if let Some(detail) = self.detail_for(&id) {
                    detail.busy = false;
                }
                match result {
                    Ok((now_favorite, profile)) => {
                        self.notice = Some(if now_favorite {
                            "Added to favorites".to_string()
                        } else {
                            "Removed from favorites".to_string()
                        });
                        // the session change reloads favorites
                        self.mirror_profile(stamp, profile, context);
                    }
                    Err(e) => self.notice = Some(e),
                }
                Task::none()
            }
            StoreMessage::PurchaseStatus(id, result) => {
                if let Some(detail) = self.detail_for(&id) {
                    match result {
                        Ok(purchased) => detail.purchased = Some(purchased),
                        Err(e) => {
                            warn!(%id, error = %e, "could not check purchase status");
                            detail.purchased = Some(false);
                        }
                    }
                }
                Task::none()
            }
            StoreMessage::Purchase(id) => {
                let Some(identity) = self.viewer.identity.clone() else {
                    return Task::done(StoreMessage::SignInRequested);
                };
                if let Some(detail) = self.detail_for(&id) {
                    detail.busy = true;
                }
                let stamp = self.profile_generation.advance();
                let reply_id = id.clone();
                Task::perform(tasks::record_purchase(context.db_path.clone(), identity, id), move |result| {
                    StoreMessage::Purchased(reply_id.clone(), stamp, result)
                })
            }
            StoreMessage::Purchased(id, stamp, result) => {
                match result {
                    Ok(profile) => {
                        info!(%id, "purchase recorded");
                        if let Some(detail) = self.detail_for(&id) {
                            detail.busy = false;
                            detail.purchased = Some(true);
                        }
                        self.notice = Some("Purchase complete. The download is now available.".to_string());
                        self.mirror_profile(stamp, profile, context);
                    }
                    Err(e) => {
                        if let Some(detail) = self.detail_for(&id) {
                            detail.busy = false;
                        }
                        self.notice = Some(format!("Purchase failed: {}", e));
                    }
                }
                Task::none()
            }
            StoreMessage::CopyLink(url, what) => {
                self.notice = Some(format!("{} link copied: {}", what, url));
                iced::clipboard::write(url)
            }
            StoreMessage::SignInRequested => Task::none(),
        }
    }

    pub fn view(&self) -> Element<'_, StoreMessage> {
        let search_row = row![
            text_input("Search templates...", self.search.typed())
                .on_input(StoreMessage::SearchInput)
                .on_submit(StoreMessage::SearchSubmitted)
                .padding(10)
                .width(Length::Fill),
            button(text("Clear"))
                .on_press_maybe((!self.search.typed().is_empty()).then_some(StoreMessage::SearchCleared))
                .style(button::secondary)
                .padding(10),
        ]
        .spacing(8);
        let search = container(search_row).max_width(640);

        let filters = category_options(&self.catalog, self.viewer.is_signed_in())
            .into_iter()
            .fold(Row::new().spacing(8), |filters, option| {
                let style = if option == self.filter {
                    button::primary
                } else {
                    button::secondary
                };
                filters.push(
                    button(text(option.label().to_string()).size(14))
                        .on_press(StoreMessage::FilterSelected(option))
                        .style(style)
                        .padding([6, 14]),
                )
            });

        let body: Element<'_, StoreMessage> = if self.loading && self.catalog.is_empty() {
            centered(text("Loading templates...").size(18))
        } else if let Some(error) = &self.error {
            centered(
                column![
                    text(format!("Something went wrong: {}", error)).style(text::danger),
                    button(text("Try Again")).on_press(StoreMessage::Retry).padding(10),
                ]
                .spacing(12)
                .align_x(Alignment::Center),
            )
        } else {
            self.deck_view()
        };

        let mut content = column![search, filters, body]
            .spacing(18)
            .padding(24)
            .align_x(Alignment::Center);

        if let Some(notice) = &self.notice {
            content = content.push(text(notice).size(14).style(text::secondary));
        }

        let page = container(content).width(Length::Fill).height(Length::Fill);

        match &self.detail {
            Some(detail) => modal(page, self.detail_view(detail), StoreMessage::CloseModal),
            None => page.into(),
        }
    }

    fn deck_view(&self) -> Element<'_, StoreMessage> {
        let status = self.deck.status();

        if status.len == 0 {
            if status.filtering {
                return centered(Space::with_height(Length::Fixed(360.0)));
            }
            let message = if self.filter == CategoryFilter::Favorites {
                "You have no favorites yet"
            } else {
                "No templates found"
            };
            return centered(text(message).size(18));
        }

        let fade = if status.filtering { 0.3 } else { 1.0 };

        let cards = CardSlot::WINDOW.iter().fold(
            Row::new().spacing(16).align_y(Alignment::Center),
            |cards, &slot| match index_in_slot(slot, status.active, status.len) {
                Some(index) => cards.push(self.card(&self.deck.templates()[index], slot, fade)),
                None => cards.push(Space::with_width(Length::Fixed(slot_width(slot)))),
            },
        );

        let arrows = row![
            button(text("<").size(22))
                .on_press(StoreMessage::Deck(DeckCommand::Prev))
                .style(button::secondary)
                .padding([8, 16]),
            text(format!("{} / {}", status.active + 1, status.len)).size(14),
            button(text(">").size(22))
                .on_press(StoreMessage::Deck(DeckCommand::Next))
                .style(button::secondary)
                .padding([8, 16]),
        ]
        .spacing(16)
        .align_y(Alignment::Center);

        column![cards, arrows]
            .spacing(20)
            .align_x(Alignment::Center)
            .width(Length::Fill)
            .into()
    }

    fn card<'a>(&self, template: &'a Template, slot: CardSlot, fade: f32) -> Element<'a, StoreMessage> {
        let alpha = if slot.is_staged() { fade * 0.45 } else { fade };
        let highlighted = slot == CardSlot::Active;
        let favorite = self
            .viewer
            .profile
            .as_ref()
            .is_some_and(|profile| profile.has_favorite(&template.id));

        let tags = template
            .card_tags()
            .iter()
            .fold(Row::new().spacing(6), |tags, tag| tags.push(text(format!("#{}", tag)).size(12)));

        let mut face: Column<'a, StoreMessage> = column![
            row![
                text(&template.category).size(12),
                Space::with_width(Length::Fill),
                text(if favorite { "♥" } else { "" }).size(14),
            ],
            text(&template.title).size(if highlighted { 24 } else { 18 }),
        ]
        .spacing(8);

        if slot.is_staged() {
            face = face.push(text(price_label(template)).size(13));
        } else {
            face = face
                .push(text(&template.description).size(14))
                .push(tags)
                .push(text(price_label(template)).size(15));
        }

        let width = slot_width(slot);
        let card = container(face)
            .padding(18)
            .width(Length::Fixed(width))
            .height(Length::Fixed(width * 1.1))
            .style(move |theme: &Theme| card_style(theme, alpha, highlighted));

        mouse_area(card)
            .on_press(StoreMessage::Deck(DeckCommand::Activate(template.id.clone())))
            .into()
    }

    fn detail_view<'a>(&'a self, detail: &'a Detail) -> Element<'a, StoreMessage> {
        let template = &detail.template;
        let id = template.id.clone();

        let mut header = row![text(&template.title).size(30)].spacing(12).align_y(Alignment::Center);
        if template.is_premium {
            header = header.push(text("PREMIUM").size(12).style(text::success));
        }

        let tags = template
            .tags
            .iter()
            .fold(Row::new().spacing(8), |tags, tag| tags.push(text(format!("#{}", tag)).size(13)));

        let mut actions = Row::new().spacing(10);

        if self.viewer.is_signed_in() {
            let favorite = self
                .viewer
                .profile
                .as_ref()
                .is_some_and(|profile| profile.has_favorite(&id));
            actions = actions.push(
                button(text(if favorite { "♥ Favorited" } else { "♡ Add to Favorites" }))
                    .on_press_maybe((!detail.busy).then(|| StoreMessage::ToggleFavorite(id.clone())))
                    .style(button::secondary)
                    .padding(10),
            );
        }

        if detail.can_download() {
            let download = template
                .download_url
                .clone()
                .map(|url| StoreMessage::CopyLink(url, "Download"));
            actions = actions.push(button(text("Download")).on_press_maybe(download).padding(10));
        } else {
            let purchase = match (detail.purchased, detail.busy) {
                (Some(false), false) => Some(StoreMessage::Purchase(id.clone())),
                _ => None,
            };
            let label = if detail.purchased.is_none() {
                "Checking...".to_string()
            } else {
                format!("Purchase {}", price_label(template))
            };
            actions = actions.push(
                button(text(label))
                    .on_press_maybe(if self.viewer.is_signed_in() {
                        purchase
                    } else {
                        Some(StoreMessage::SignInRequested)
                    })
                    .padding(10),
            );
        }

        if let Some(url) = &template.demo_url {
            actions = actions.push(
                button(text("Live Preview"))
                    .on_press(StoreMessage::CopyLink(url.clone(), "Preview"))
                    .style(button::secondary)
                    .padding(10),
            );
        }

        actions = actions.push(
            button(text("Close"))
                .on_press(StoreMessage::CloseModal)
                .style(button::text)
                .padding(10),
        );

        let content = column![
            header,
            text(&template.category).size(14).style(text::secondary),
            text(template.detail_text()).size(16),
            tags,
            text(price_label(template)).size(20),
            actions,
        ]
        .spacing(16);

        container(content)
            .padding(28)
            .max_width(720)
            .style(container::rounded_box)
            .into()
    }
}

fn centered<'a>(content: impl Into<Element<'a, StoreMessage>>) -> Element<'a, StoreMessage> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fixed(420.0))
        .center_x(Length::Fill)
        .center_y(Length::Fixed(420.0))
        .into()
}

fn slot_width(slot: CardSlot) -> f32 {
    match slot {
        CardSlot::Active => 320.0,
        CardSlot::Next | CardSlot::Prev => 240.0,
        CardSlot::NextStaged | CardSlot::PrevStaged => 170.0,
        CardSlot::Hidden => 0.0,
    }
}

fn price_label(template: &Template) -> String {
    if template.is_free() {
        "Free".to_string()
    } else {
        format!("${:.2}", template.price)
    }
}

fn card_style(theme: &Theme, alpha: f32, highlighted: bool) -> container::Style {
    let palette = theme.extended_palette();
    let fade = |color: Color| Color {
        a: color.a * alpha,
        ..color
    };

    let border_color = if highlighted {
        palette.primary.strong.color
    } else {
        palette.background.strong.color
    };

    container::Style {
        background: Some(fade(palette.background.weak.color).into()),
        text_color: Some(fade(palette.background.weak.text)),
        border: Border {
            color: fade(border_color),
            width: if highlighted { 2.0 } else { 1.0 },
            radius: 14.0.into(),
        },
        ..container::Style::default()
    }
}
