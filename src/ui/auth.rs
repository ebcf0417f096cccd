/// Sign-in / sign-up panel
///
/// Shown as a modal over the storefront. On success the identity is pushed
/// into the session and the panel asks to be closed.

use iced::widget::{button, column, container, row, text, text_input};
use iced::{Alignment, Element, Length, Task};
use tracing::info;

use super::AppContext;
use crate::state::data::{Identity, UserProfile};
use crate::state::tasks::{self, TaskResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

#[derive(Debug, Clone)]
pub enum AuthMessage {
    EmailChanged(String),
    PasswordChanged(String),
    NameChanged(String),
    ToggleMode,
    Submit,
    ContinueAsGuest,
    Finished(TaskResult<(Identity, UserProfile)>),
    Cancel,
}

/// What the owner of the panel should do next
pub enum AuthAction {
    None,
    Run(Task<AuthMessage>),
    Close,
}

#[derive(Debug, Default)]
pub struct AuthPanel {
    mode: AuthMode,
    email: String,
    password: String,
    display_name: String,
    error: Option<String>,
    busy: bool,
}

impl AuthPanel {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Local checks before anything is sent to the store
    fn check_inputs(&self) -> Result<(), String> {
        if self.email.trim().is_empty() {
            return Err("Please enter your email".to_string());
        }
        if self.password.is_empty() {
            return Err("Please enter your password".to_string());
        }
        if self.mode == AuthMode::SignUp && self.display_name.trim().is_empty() {
            return Err("Please enter your name".to_string());
        }
        Ok(())
    }

    pub fn update(&mut self, message: AuthMessage, context: &AppContext) -> AuthAction {
        match message {
            AuthMessage::EmailChanged(value) => {
                self.email = value;
                AuthAction::None
            }
            AuthMessage::PasswordChanged(value) => {
                self.password = value;
                AuthAction::None
            }
            AuthMessage::NameChanged(value) => {
                self.display_name = value;
                AuthAction::None
            }
            AuthMessage::ToggleMode => {
                self.mode = match self.mode {
                    AuthMode::SignIn => AuthMode::SignUp,
                    AuthMode::SignUp => AuthMode::SignIn,
                };
                self.error = None;
                AuthAction::None
            }
            AuthMessage::Submit => {
                if self.busy {
                    return AuthAction::None;
                }
                if let Err(problem) = self.check_inputs() {
                    self.error = Some(problem);
                    return AuthAction::None;
                }

                self.busy = true;
                self.error = None;
                let db_path = context.db_path.clone();
                let email = self.email.trim().to_string();
                let password = self.password.clone();

                let task = match self.mode {
                    AuthMode::SignIn => {
                        Task::perform(tasks::sign_in(db_path, email, password), AuthMessage::Finished)
                    }
                    AuthMode::SignUp => Task::perform(
                        tasks::sign_up(db_path, email, password, self.display_name.trim().to_string()),
                        AuthMessage::Finished,
                    ),
                };
                AuthAction::Run(task)
            }
            AuthMessage::ContinueAsGuest => {
                if self.busy {
                    return AuthAction::None;
                }
                self.busy = true;
                self.error = None;
                AuthAction::Run(Task::perform(
                    tasks::sign_in_anonymously(context.db_path.clone()),
                    AuthMessage::Finished,
                ))
            }
            AuthMessage::Finished(Ok((identity, profile))) => {
                self.busy = false;
                self.password.clear();
                info!(anonymous = identity.anonymous, "authentication finished");
                context.session.signed_in(identity, profile);
                AuthAction::Close
            }
            AuthMessage::Finished(Err(e)) => {
                self.busy = false;
                self.error = Some(e);
                AuthAction::None
            }
            AuthMessage::Cancel => {
                if self.busy {
                    AuthAction::None
                } else {
                    AuthAction::Close
                }
            }
        }
    }

    pub fn view(&self) -> Element<'_, AuthMessage> {
        let (heading, submit_label, toggle_label) = match self.mode {
            AuthMode::SignIn => ("Welcome Back", "Sign In", "Don't have an account? Sign up"),
            AuthMode::SignUp => ("Create Account", "Sign Up", "Already have an account? Sign in"),
        };

        let mut form = column![text(heading).size(28)].spacing(14).align_x(Alignment::Center);

        if self.mode == AuthMode::SignUp {
            form = form.push(
                text_input("Name", &self.display_name)
                    .on_input(AuthMessage::NameChanged)
                    .padding(10),
            );
        }

        form = form
            .push(
                text_input("Email", &self.email)
                    .on_input(AuthMessage::EmailChanged)
                    .on_submit(AuthMessage::Submit)
                    .padding(10),
            )
            .push(
                text_input("Password", &self.password)
                    .on_input(AuthMessage::PasswordChanged)
                    .on_submit(AuthMessage::Submit)
                    .secure(true)
                    .padding(10),
            );

        if let Some(error) = &self.error {
            form = form.push(text(error).size(14).style(text::danger));
        }

        let submit = button(text(if self.busy { "Please wait..." } else { submit_label }))
            .on_press_maybe((!self.busy).then_some(AuthMessage::Submit))
            .width(Length::Fill)
            .padding(10);

        let guest = button(text("Continue as Guest"))
            .on_press_maybe((!self.busy).then_some(AuthMessage::ContinueAsGuest))
            .style(button::secondary)
            .width(Length::Fill)
            .padding(10);

        form = form.push(submit).push(guest).push(
            row![
                button(text(toggle_label).size(14))
                    .on_press(AuthMessage::ToggleMode)
                    .style(button::text),
                button(text("Close").size(14))
                    .on_press(AuthMessage::Cancel)
                    .style(button::text),
            ]
            .spacing(8),
        );

        container(form)
            .padding(28)
            .max_width(420)
            .style(container::rounded_box)
            .into()
    }
}
