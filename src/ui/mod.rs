/// UI module
///
/// Screens and panels of the storefront application:
/// - Carousel storefront with search, filters and the detail modal (storefront.rs)
/// - Admin console for the catalog (admin.rs)
/// - Sign-in / sign-up panel (auth.rs)
/// - Static informational pages (pages.rs)

use std::path::PathBuf;

use iced::widget::{center, container, mouse_area, opaque, stack};
use iced::{Color, Element};

use crate::config::Config;
use crate::state::session::Session;

pub mod admin;
pub mod auth;
pub mod pages;
pub mod storefront;

/// Things every screen needs: where the catalog lives, the loaded
/// configuration and the signed-in identity.
#[derive(Debug)]
pub struct AppContext {
    pub db_path: PathBuf,
    pub config: Config,
    pub session: Session,
}

impl AppContext {
    pub fn new(db_path: PathBuf, config: Config) -> Self {
        Self {
            db_path,
            config,
            session: Session::new(),
        }
    }
}

/// Lay `content` over a dimmed `base`. Clicking the backdrop emits `on_blur`.
pub fn modal<'a, Message>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
    on_blur: Message,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    stack![
        base.into(),
        opaque(
            mouse_area(center(opaque(content)).style(|_theme| {
                container::Style {
                    background: Some(
                        Color {
                            a: 0.8,
                            ..Color::BLACK
                        }
                        .into(),
                    ),
                    ..container::Style::default()
                }
            }))
            .on_press(on_blur)
        )
    ]
    .into()
}
