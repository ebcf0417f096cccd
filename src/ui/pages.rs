use iced::widget::{column, scrollable, text, Column};
use iced::{Element, Length};

/// Static informational pages linked from the footer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoPage {
    Terms,
    Privacy,
    Shipping,
    Cancellation,
    Contact,
}

/// A block of page content
enum Block {
    Heading(&'static str),
    Paragraph(&'static str),
    Bullet(&'static str),
}

const LAST_UPDATED: &str = "Last updated on Apr 6 2025";

impl InfoPage {
    pub const ALL: [InfoPage; 5] = [
        InfoPage::Shipping,
        InfoPage::Cancellation,
        InfoPage::Privacy,
        InfoPage::Contact,
        InfoPage::Terms,
    ];

    pub fn title(self) -> &'static str {
        match self {
            InfoPage::Terms => "Terms and Conditions",
            InfoPage::Privacy => "Privacy Policy",
            InfoPage::Shipping => "Shipping and Delivery",
            InfoPage::Cancellation => "Cancellation and Refund",
            InfoPage::Contact => "Contact Us",
        }
    }

    /// Short label for the footer
    pub fn link_label(self) -> &'static str {
        match self {
            InfoPage::Terms => "Terms",
            InfoPage::Privacy => "Privacy",
            InfoPage::Shipping => "Shipping",
            InfoPage::Cancellation => "Cancel",
            InfoPage::Contact => "Contact",
        }
    }

    fn blocks(self) -> &'static [Block] {
        match self {
            InfoPage::Terms => &[
                Block::Paragraph(
                    "\"We\", \"us\" and \"our\" refer to the operator of this storefront. \
                     \"You\" refers to anyone browsing the catalog or purchasing from it.",
                ),
                Block::Paragraph("Your use of the storefront and any purchase are governed by these terms:"),
                Block::Bullet("Catalog content may change without notice."),
                Block::Bullet(
                    "Templates are provided as described. We give no warranty that they suit \
                     any particular purpose.",
                ),
                Block::Bullet(
                    "The designs, layouts and graphics of purchased templates are licensed to you, \
                     not sold. Redistribution of the template files is prohibited.",
                ),
                Block::Bullet("Links to external demos are provided for convenience only."),
                Block::Bullet(
                    "We are not liable for declined payment authorizations caused by limits set \
                     by your card issuer.",
                ),
            ],
            InfoPage::Privacy => &[
                Block::Paragraph(
                    "This policy describes how we use the information you give us when you create \
                     an account or purchase a template.",
                ),
                Block::Heading("What we collect"),
                Block::Bullet("Your name and email address"),
                Block::Bullet("The templates you favorite and purchase"),
                Block::Heading("What we do with it"),
                Block::Bullet("Keep your favorites and purchases available across sessions."),
                Block::Bullet("Improve the catalog."),
                Block::Paragraph(
                    "We will not sell, distribute or lease your personal information to third \
                     parties unless required by law.",
                ),
                Block::Paragraph(
                    "If any information we hold about you is incorrect, contact us and we will \
                     correct it promptly.",
                ),
            ],
            InfoPage::Shipping => &[Block::Paragraph(
                "Templates are delivered as digital downloads. Shipping does not apply.",
            )],
            InfoPage::Cancellation => &[Block::Paragraph(
                "Purchases of digital templates cannot be cancelled or refunded.",
            )],
            InfoPage::Contact => &[
                Block::Paragraph("You may contact us using the information below:"),
                Block::Bullet("Email: support@template-deck.example"),
                Block::Bullet("Hours: Monday to Friday, 9:00 to 17:00"),
            ],
        }
    }

    /// Build the page view
    pub fn view<'a, Message: 'a>(self) -> Element<'a, Message> {
        let mut content: Column<'a, Message> = column![
            text(self.title()).size(32),
            text(LAST_UPDATED).size(13),
        ]
        .spacing(12);

        for block in self.blocks() {
            content = content.push(match block {
                Block::Heading(heading) => text(*heading).size(20),
                Block::Paragraph(paragraph) => text(*paragraph).size(15),
                Block::Bullet(item) => text(format!("•  {}", item)).size(15),
            });
        }

        scrollable(content.padding(32).max_width(820))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}
