use iced::event::{self, Event};
use iced::keyboard::{self, key::Named};
use iced::touch;
use iced::widget::{button, column, container, row, text, Row, Space};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};
use tracing::{debug, error, info, warn};

mod config;
mod deck;
mod error;
mod logging;
mod state;
mod ui;

use config::Config;
use deck::keys::{route_key, DeckKey, KeyAction, KeyContext};
use error::StoreResult;
use state::draft::TemplateDraft;
use state::library::Library;
use ui::admin::{AdminConsole, AdminMessage};
use ui::auth::{AuthAction, AuthMessage, AuthMode, AuthPanel};
use ui::pages::InfoPage;
use ui::storefront::{StoreMessage, Storefront};
use ui::AppContext;

/// Seed inserted into an empty catalog
const DEMO_CATALOG: &str = include_str!("../assets/demo_catalog.json");

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Storefront,
    /// Only reachable while the signed-in profile has the admin flag
    Admin,
    Page(InfoPage),
}

/// Main application state
struct TemplateDeck {
    context: AppContext,
    route: Route,
    storefront: Storefront,
    admin: AdminConsole,
    /// Sign-in panel, shown over the current screen
    auth: Option<AuthPanel>,
    /// Catalog preparation problem from startup
    startup_error: Option<String>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    Store(StoreMessage),
    Admin(AdminMessage),
    Auth(AuthMessage),
    Navigate(Route),
    OpenAuth(AuthMode),
    CloseAuth,
    SignOut,
    /// A deck key was pressed; the flag is true when a focused widget consumed it
    Key(DeckKey, bool),
    TouchPressed(f32),
    TouchLifted(f32),
    TouchLost,
}

impl TemplateDeck {
    fn new(config: Config) -> (Self, Task<Message>) {
        let context = AppContext::new(config.database_path(), config);

        let startup_error = match prepare_catalog(&context) {
            Ok(count) => {
                info!(templates = count, path = %context.db_path.display(), "catalog ready");
                None
            }
            Err(e) => {
                error!(error = %e, path = %context.db_path.display(), "catalog could not be prepared");
                Some(e.to_string())
            }
        };

        let mut storefront = Storefront::new(&context);
        let load = storefront.load(&context).map(Message::Store);

        (
            TemplateDeck {
                context,
                route: Route::Storefront,
                storefront,
                admin: AdminConsole::new(),
                auth: None,
                startup_error,
            },
            load,
        )
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        let task = match message {
            Message::Store(StoreMessage::SignInRequested) => {
                self.auth = Some(AuthPanel::new(AuthMode::SignIn));
                Task::none()
            }
            Message::Store(message) => self.storefront.update(message, &self.context).map(Message::Store),
            Message::Admin(message) => self.admin.update(message, &self.context).map(Message::Admin),
            Message::Auth(message) => match self.auth.as_mut() {
                Some(panel) => match panel.update(message, &self.context) {
                    AuthAction::None => Task::none(),
                    AuthAction::Run(task) => task.map(Message::Auth),
                    AuthAction::Close => {
                        self.auth = None;
                        Task::none()
                    }
                },
                None => Task::none(),
            },
            Message::Navigate(route) => self.navigate(route),
            Message::OpenAuth(mode) => {
                self.auth = Some(AuthPanel::new(mode));
                Task::none()
            }
            Message::CloseAuth => {
                if !self.auth.as_ref().is_some_and(AuthPanel::is_busy) {
                    self.auth = None;
                }
                Task::none()
            }
            Message::SignOut => {
                self.context.session.sign_out();
                Task::none()
            }
            Message::Key(key, captured) => self.handle_key(key, captured),
            Message::TouchPressed(x) => self.swipe(StoreMessage::SwipeStarted(x)),
            Message::TouchLifted(x) => self.swipe(StoreMessage::SwipeEnded(x)),
            Message::TouchLost => self.swipe(StoreMessage::SwipeCancelled),
        };

        Task::batch([task, self.after_update()])
    }

    /// Follow-up work after any message: session changes and admin writes
    fn after_update(&mut self) -> Task<Message> {
        let mut tasks = vec![self.storefront.sync_session(&self.context).map(Message::Store)];

        if self.route == Route::Admin && !self.context.session.current().is_admin() {
            info!("admin access lost, returning to storefront");
            self.route = Route::Storefront;
        }

        if self.admin.take_catalog_dirty() {
            tasks.push(self.storefront.load(&self.context).map(Message::Store));
        }

        Task::batch(tasks)
    }

    fn navigate(&mut self, route: Route) -> Task<Message> {
        if route == Route::Admin {
            if !self.context.session.current().is_admin() {
                warn!("admin console requested without admin rights");
                return Task::none();
            }
            self.route = Route::Admin;
            return self.admin.load(&self.context).map(Message::Admin);
        }

        self.route = route;
        Task::none()
    }

    fn handle_key(&mut self, key: DeckKey, captured: bool) -> Task<Message> {
        if self.route != Route::Storefront {
            if key == DeckKey::Escape && self.auth.is_some() {
                return self.update(Message::CloseAuth);
            }
            return Task::none();
        }

        let context = KeyContext {
            modal_open: self.auth.is_some() || self.storefront.has_modal(),
            search_focused: captured,
        };

        match route_key(key, context, self.storefront.current_id()) {
            Some(KeyAction::CloseModal) if self.auth.is_some() => self.update(Message::CloseAuth),
            Some(KeyAction::CloseModal) => self.update(Message::Store(StoreMessage::CloseModal)),
            Some(KeyAction::Deck(command)) => self.update(Message::Store(StoreMessage::Deck(command))),
            None => Task::none(),
        }
    }

    fn swipe(&mut self, message: StoreMessage) -> Task<Message> {
        if self.route != Route::Storefront || self.auth.is_some() {
            return Task::none();
        }
        self.storefront.update(message, &self.context).map(Message::Store)
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let body: Element<'_, Message> = match self.route {
            Route::Storefront => self.storefront.view().map(Message::Store),
            Route::Admin => self.admin.view().map(Message::Admin),
            Route::Page(page) => page.view(),
        };

        let mut content = column![self.header()];
        if let Some(problem) = &self.startup_error {
            content = content.push(
                container(text(format!("Catalog unavailable: {}", problem)).style(text::danger)).padding([6, 24]),
            );
        }
        content = content
            .push(container(body).width(Length::Fill).height(Length::Fill))
            .push(self.footer());

        let page = container(content).width(Length::Fill).height(Length::Fill);

        match &self.auth {
            Some(panel) => ui::modal(page, panel.view().map(Message::Auth), Message::CloseAuth),
            None => page.into(),
        }
    }

    fn header(&self) -> Element<'_, Message> {
        let state = self.context.session.current();

        let account: Element<'_, Message> = match &state.identity {
            Some(identity) => {
                let name = identity
                    .display_name
                    .clone()
                    .or_else(|| identity.email.clone())
                    .unwrap_or_else(|| "Signed in".to_string());

                let mut account = Row::new()
                    .spacing(10)
                    .align_y(Alignment::Center)
                    .push(text(format!("({}) {}", identity.initial(), name)).size(14));
                if state.is_admin() {
                    account = account.push(
                        button(text("Admin"))
                            .on_press(Message::Navigate(Route::Admin))
                            .style(button::secondary),
                    );
                }
                account
                    .push(button(text("Sign Out")).on_press(Message::SignOut).style(button::text))
                    .into()
            }
            None => row![
                button(text("Sign In")).on_press(Message::OpenAuth(AuthMode::SignIn)),
                button(text("Sign Up"))
                    .on_press(Message::OpenAuth(AuthMode::SignUp))
                    .style(button::secondary),
            ]
            .spacing(10)
            .into(),
        };

        row![
            button(text("Template Deck").size(24))
                .on_press(Message::Navigate(Route::Storefront))
                .style(button::text),
            Space::with_width(Length::Fill),
            account,
        ]
        .padding([12, 24])
        .align_y(Alignment::Center)
        .into()
    }

    fn footer(&self) -> Element<'_, Message> {
        InfoPage::ALL
            .into_iter()
            .fold(Row::new().spacing(4).padding([8, 24]), |footer, page| {
                footer.push(
                    button(text(page.link_label()).size(13))
                        .on_press(Message::Navigate(Route::Page(page)))
                        .style(button::text),
                )
            })
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(handle_event)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Open the catalog once at startup: create the schema, seed the demo
/// templates into an empty database and apply the admin bootstrap.
fn prepare_catalog(context: &AppContext) -> StoreResult<i64> {
    let library = Library::open(&context.db_path)?;

    if context.config.seed_demo_catalog {
        let drafts = TemplateDraft::list_from_json(DEMO_CATALOG)?;
        library.seed_if_empty(&drafts)?;
    }

    debug!(path = %library.path().display(), "preparing catalog");

    if let Some(email) = &context.config.bootstrap_admin {
        if let Err(e) = library.promote_admin(email) {
            warn!(%email, error = %e, "could not grant admin flag");
        }
    }

    library.template_count()
}

fn deck_key(named: &Named) -> Option<DeckKey> {
    match named {
        Named::ArrowLeft => Some(DeckKey::ArrowLeft),
        Named::ArrowRight => Some(DeckKey::ArrowRight),
        Named::Enter => Some(DeckKey::Enter),
        Named::Escape => Some(DeckKey::Escape),
        _ => None,
    }
}

fn handle_event(event: Event, status: event::Status, _window: iced::window::Id) -> Option<Message> {
    match event {
        Event::Keyboard(keyboard::Event::KeyPressed {
            key: keyboard::Key::Named(named),
            ..
        }) => deck_key(&named).map(|key| Message::Key(key, matches!(status, event::Status::Captured))),
        Event::Touch(touch::Event::FingerPressed { position, .. }) => Some(Message::TouchPressed(position.x)),
        Event::Touch(touch::Event::FingerLifted { position, .. }) => Some(Message::TouchLifted(position.x)),
        Event::Touch(touch::Event::FingerLost { .. }) => Some(Message::TouchLost),
        _ => None,
    }
}

fn main() -> iced::Result {
    let (config, issue) = Config::load();
    logging::init(&config.log_level);
    if let Some(issue) = issue {
        warn!(%issue, "using default configuration");
    }

    info!(database = %config.database_path().display(), "starting template deck");

    iced::application("Template Deck", TemplateDeck::update, TemplateDeck::view)
        .theme(TemplateDeck::theme)
        .subscription(TemplateDeck::subscription)
        .centered()
        .run_with(move || TemplateDeck::new(config))
}
