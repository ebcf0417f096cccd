/// Admin console
///
/// List, create, edit, view and delete catalog templates. The store checks
/// the admin flag itself; the console only renders what it is told.

use iced::widget::{button, checkbox, column, container, row, scrollable, text, text_input, Column, Row, Space};
use iced::{Alignment, Element, Length, Task};
use tracing::{info, warn};

use super::AppContext;
use crate::state::data::{Template, TemplateId};
use crate::state::draft::{DraftField, TemplateDraft};
use crate::state::tasks::{self, Generation, TaskResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Screen {
    List,
    Create,
    Edit(TemplateId),
    Show(TemplateId),
}

#[derive(Debug, Clone)]
pub enum AdminMessage {
    Loaded(u64, TaskResult<Vec<Template>>),
    Retry,
    CategorySelected(Option<String>),
    ShowList,
    New,
    Edit(TemplateId),
    Show(TemplateId),
    DetailLoaded(u64, TaskResult<Option<Template>>),
    FieldChanged(DraftField, String),
    PremiumToggled(bool),
    Save,
    Saved(TaskResult<Template>),
    DeleteRequested(TemplateId),
    DeleteCancelled,
    DeleteConfirmed(TemplateId),
    Deleted(TaskResult<TemplateId>),
}

/// Form fields in display order
const FORM_FIELDS: [(DraftField, &str, &str); 10] = [
    (DraftField::Title, "Title", "Template title"),
    (DraftField::Category, "Category", "e.g. Landing Page"),
    (DraftField::Description, "Short description", "Shown on the card"),
    (DraftField::LongDescription, "Long description", "Shown in the detail view"),
    (DraftField::Price, "Price", "0 for free"),
    (DraftField::Image, "Image URL", "Card image"),
    (DraftField::FullImage, "Full image URL", "Detail image"),
    (DraftField::Tags, "Tags", "Comma separated"),
    (DraftField::DemoUrl, "Demo URL", "Live preview link"),
    (DraftField::DownloadUrl, "Download URL", "Delivered after purchase"),
];

pub struct AdminConsole {
    templates: Vec<Template>,
    /// Categories seen in the last unfiltered load
    categories: Vec<String>,
    category: Option<String>,
    loading: bool,
    error: Option<String>,
    list_generation: Generation,
    detail_generation: Generation,
    screen: Screen,
    detail: Option<Template>,
    draft: TemplateDraft,
    form_error: Option<String>,
    saving: bool,
    confirm_delete: Option<TemplateId>,
    catalog_dirty: bool,
}

impl Default for AdminConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminConsole {
    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
            categories: Vec::new(),
            category: None,
            loading: false,
            error: None,
            list_generation: Generation::default(),
            detail_generation: Generation::default(),
            screen: Screen::List,
            detail: None,
            draft: TemplateDraft::new(),
            form_error: None,
            saving: false,
            confirm_delete: None,
            catalog_dirty: false,
        }
    }

    /// Whether a write happened since the last call; the storefront
    /// reloads its catalog when this returns true.
    pub fn take_catalog_dirty(&mut self) -> bool {
        std::mem::take(&mut self.catalog_dirty)
    }

    pub fn load(&mut self, context: &AppContext) -> Task<AdminMessage> {
        self.loading = true;
        self.error = None;
        let stamp = self.list_generation.advance();
        let db_path = context.db_path.clone();

        match self.category.clone() {
            Some(category) => Task::perform(tasks::load_category(db_path, category), move |result| {
                AdminMessage::Loaded(stamp, result)
            }),
            None => Task::perform(tasks::load_catalog(db_path), move |result| {
                AdminMessage::Loaded(stamp, result)
            }),
        }
    }

    fn find(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn update(&mut self, message: AdminMessage, context: &AppContext) -> Task<AdminMessage> {
        match message {
            AdminMessage::Loaded(stamp, result) => {
                if !self.list_generation.is_current(stamp) {
                    return Task::none();
                }
                self.loading = false;
                match result {
                    Ok(templates) => {
                        if self.category.is_none() {
                            self.categories.clear();
                            for template in &templates {
                                if !self.categories.contains(&template.category) {
                                    self.categories.push(template.category.clone());
                                }
                            }
                        }
                        self.templates = templates;
                    }
                    Err(e) => self.error = Some(e),
                }
                Task::none()
            }
            AdminMessage::Retry => self.load(context),
            AdminMessage::CategorySelected(category) => {
                if category == self.category {
                    return Task::none();
                }
                self.category = category;
                self.load(context)
            }
            AdminMessage::ShowList => {
                self.screen = Screen::List;
                self.form_error = None;
                Task::none()
            }
            AdminMessage::New => {
                self.draft = TemplateDraft::new();
                self.form_error = None;
                self.screen = Screen::Create;
                Task::none()
            }
            AdminMessage::Edit(id) => {
                let draft = self
                    .find(&id)
                    .or(self.detail.as_ref().filter(|t| t.id == id))
                    .map(TemplateDraft::from_template);
                let Some(draft) = draft else {
                    self.error = Some(format!("template '{}' not found", id));
                    return Task::none();
                };
                self.draft = draft;
                self.form_error = None;
                self.screen = Screen::Edit(id);
                Task::none()
            }
            AdminMessage::Show(id) => {
                self.detail = self.find(&id).cloned();
                self.screen = Screen::Show(id.clone());
                let stamp = self.detail_generation.advance();
                Task::perform(tasks::load_template(context.db_path.clone(), id), move |result| {
                    AdminMessage::DetailLoaded(stamp, result)
                })
            }
            AdminMessage::DetailLoaded(stamp, result) => {
                if !self.detail_generation.is_current(stamp) {
                    return Task::none();
                }
                match result {
                    Ok(Some(template)) => self.detail = Some(template),
                    Ok(None) => {
                        self.detail = None;
                        self.error = Some("This template no longer exists".to_string());
                    }
                    Err(e) => self.error = Some(e),
                }
                Task::none()
            }
            AdminMessage::FieldChanged(field, value) => {
                self.draft.set_field(field, value);
                Task::none()
            }
            AdminMessage::PremiumToggled(value) => {
                self.draft.is_premium = value;
                Task::none()
            }
            AdminMessage::Save => {
                if self.saving {
                    return Task::none();
                }
                if let Err(e) = self.draft.validate() {
                    self.form_error = Some(e.to_string());
                    return Task::none();
                }
                let Some(identity) = context.session.identity() else {
                    self.form_error = Some("You must be signed in to do that".to_string());
                    return Task::none();
                };

                let id = match &self.screen {
                    Screen::Edit(id) => Some(id.clone()),
                    _ => None,
                };
                self.saving = true;
                self.form_error = None;
                Task::perform(
                    tasks::save_template(context.db_path.clone(), identity, id, self.draft.clone()),
                    AdminMessage::Saved,
                )
            }
            AdminMessage::Saved(result) => {
                self.saving = false;
                match result {
                    Ok(template) => {
                        info!(id = %template.id, title = %template.title, "template saved");
                        self.catalog_dirty = true;
                        self.screen = Screen::Show(template.id.clone());
                        self.detail = Some(template);
                        self.load(context)
                    }
                    Err(e) => {
                        warn!(error = %e, "template save failed");
                        self.form_error = Some(e);
                        Task::none()
                    }
                }
            }
            AdminMessage::DeleteRequested(id) => {
                self.confirm_delete = Some(id);
                Task::none()
            }
            AdminMessage::DeleteCancelled => {
                self.confirm_delete = None;
                Task::none()
            }
            AdminMessage::DeleteConfirmed(id) => {
                self.confirm_delete = None;
                let Some(identity) = context.session.identity() else {
                    self.error = Some("You must be signed in to do that".to_string());
                    return Task::none();
                };
                Task::perform(
                    tasks::delete_template(context.db_path.clone(), identity, id),
                    AdminMessage::Deleted,
                )
            }
            AdminMessage::Deleted(result) => {
                match result {
                    Ok(id) => {
                        info!(%id, "template deleted");
                        self.templates.retain(|t| t.id != id);
                        if self.detail.as_ref().is_some_and(|t| t.id == id) {
                            self.detail = None;
                        }
                        self.screen = Screen::List;
                        self.catalog_dirty = true;
                    }
                    Err(e) => self.error = Some(e),
                }
                Task::none()
            }
        }
    }

    pub fn view(&self) -> Element<'_, AdminMessage> {
        let body = match &self.screen {
            Screen::List => self.list_view(),
            Screen::Create => self.form_view("Create Template"),
            Screen::Edit(_) => self.form_view("Edit Template"),
            Screen::Show(id) => self.detail_view(id),
        };

        container(column![text("Admin Console").size(30), body].spacing(18))
            .padding(24)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn list_view(&self) -> Element<'_, AdminMessage> {
        let mut filters = Row::new().spacing(8).push(
            button(text("All").size(13))
                .on_press(AdminMessage::CategorySelected(None))
                .style(if self.category.is_none() {
                    button::primary
                } else {
                    button::secondary
                }),
        );
        for category in &self.categories {
            let selected = self.category.as_ref() == Some(category);
            filters = filters.push(
                button(text(category).size(13))
                    .on_press(AdminMessage::CategorySelected(Some(category.clone())))
                    .style(if selected { button::primary } else { button::secondary }),
            );
        }

        let toolbar = row![
            filters,
            Space::with_width(Length::Fill),
            button(text("+ New Template")).on_press(AdminMessage::New).padding(10),
        ]
        .align_y(Alignment::Center);

        if self.loading {
            return column![toolbar, text("Loading...")].spacing(16).into();
        }

        if let Some(error) = &self.error {
            return column![
                toolbar,
                text(error).style(text::danger),
                button(text("Try Again")).on_press(AdminMessage::Retry).padding(10),
            ]
            .spacing(16)
            .into();
        }

        if self.templates.is_empty() {
            return column![toolbar, text("No templates yet")].spacing(16).into();
        }

        let rows = self.templates.iter().fold(Column::new().spacing(8), |rows, template| {
            let confirming = self.confirm_delete.as_deref() == Some(template.id.as_str());
            let actions: Element<'_, AdminMessage> = if confirming {
                row![
                    text("Delete?").size(13),
                    button(text("Yes").size(13))
                        .on_press(AdminMessage::DeleteConfirmed(template.id.clone()))
                        .style(button::danger),
                    button(text("No").size(13))
                        .on_press(AdminMessage::DeleteCancelled)
                        .style(button::secondary),
                ]
                .spacing(6)
                .align_y(Alignment::Center)
                .into()
            } else {
                row![
                    button(text("View").size(13))
                        .on_press(AdminMessage::Show(template.id.clone()))
                        .style(button::secondary),
                    button(text("Edit").size(13))
                        .on_press(AdminMessage::Edit(template.id.clone()))
                        .style(button::secondary),
                    button(text("Delete").size(13))
                        .on_press(AdminMessage::DeleteRequested(template.id.clone()))
                        .style(button::danger),
                ]
                .spacing(6)
                .into()
            };

            rows.push(
                container(
                    row![
                        text(format!("#{}", template.index)).size(13).width(Length::Fixed(48.0)),
                        text(&template.title).width(Length::FillPortion(3)),
                        text(&template.category).size(13).width(Length::FillPortion(2)),
                        text(price_text(template)).size(13).width(Length::FillPortion(1)),
                        actions,
                    ]
                    .spacing(12)
                    .align_y(Alignment::Center),
                )
                .padding(10)
                .style(container::rounded_box),
            )
        });

        column![toolbar, scrollable(rows).height(Length::Fill)].spacing(16).into()
    }

    fn form_view(&self, heading: &'static str) -> Element<'_, AdminMessage> {
        let fields = FORM_FIELDS
            .iter()
            .fold(Column::new().spacing(10), |fields, &(field, label, placeholder)| {
                fields.push(
                    column![
                        text(label).size(13),
                        text_input(placeholder, self.draft.field(field))
                            .on_input(move |value| AdminMessage::FieldChanged(field, value))
                            .padding(8),
                    ]
                    .spacing(4),
                )
            })
            .push(checkbox("Premium template", self.draft.is_premium).on_toggle(AdminMessage::PremiumToggled));

        let mut form = column![text(heading).size(22), fields].spacing(14).max_width(640);

        if let Some(error) = &self.form_error {
            form = form.push(text(error).style(text::danger));
        }

        form = form.push(
            row![
                button(text(if self.saving { "Saving..." } else { "Save" }))
                    .on_press_maybe((!self.saving).then_some(AdminMessage::Save))
                    .padding(10),
                button(text("Cancel"))
                    .on_press(AdminMessage::ShowList)
                    .style(button::secondary)
                    .padding(10),
            ]
            .spacing(10),
        );

        scrollable(form).height(Length::Fill).into()
    }

    fn detail_view<'a>(&'a self, id: &'a TemplateId) -> Element<'a, AdminMessage> {
        let back = button(text("Back to list"))
            .on_press(AdminMessage::ShowList)
            .style(button::secondary);

        let Some(template) = self.detail.as_ref().filter(|t| &t.id == id) else {
            let status = match &self.error {
                Some(error) => text(error).style(text::danger),
                None => text("Loading..."),
            };
            return column![back, status].spacing(16).into();
        };

        let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
        let created = template
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let updated = template
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        let facts = [
            ("Id", template.id.clone()),
            ("Sort index", template.index.to_string()),
            ("Category", template.category.clone()),
            ("Price", price_text(template)),
            ("Premium", if template.is_premium { "yes" } else { "no" }.to_string()),
            ("Tags", template.tags.join(", ")),
            ("Image", template.image.clone()),
            ("Full image", optional(&template.full_image)),
            ("Demo URL", optional(&template.demo_url)),
            ("Download URL", optional(&template.download_url)),
            ("Created", created),
            ("Updated", updated),
        ];

        let table = facts.into_iter().fold(Column::new().spacing(6), |table, (label, value)| {
            table.push(
                row![text(label).size(13).width(Length::Fixed(120.0)), text(value).size(13)].spacing(12),
            )
        });

        column![
            row![
                back,
                button(text("Edit")).on_press(AdminMessage::Edit(template.id.clone())),
                button(text("Delete"))
                    .on_press(AdminMessage::DeleteRequested(template.id.clone()))
                    .style(button::danger),
            ]
            .spacing(10),
            text(&template.title).size(26),
            text(&template.description),
            text(template.detail_text()).size(14),
            table,
        ]
        .spacing(14)
        .into()
    }
}

fn price_text(template: &Template) -> String {
    if template.is_free() {
        "Free".to_string()
    } else {
        format!("{:.2}", template.price)
    }
}
