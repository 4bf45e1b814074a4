//! Custom ids, embeds and message components.
//!
//! Moderation buttons carry the registration id in their custom id
//! (`kog-register-{approve|reject|delete}-{id}`) so a click can be routed long after the
//! posting command returned. The player selection of `/kog unfinished_maps` tags its
//! components with the invocation id so parallel queries never see each other's clicks.

use crate::{
    core::{query::MAX_QUERY_PLAYERS, report},
    entities::registration,
    provider::PlayerSnapshot,
};
use poise::serenity_prelude as serenity;
use reqwest::Url;

const REGISTER_PREFIX: &str = "kog-register-";
const SELECTION_PREFIX: &str = "kog-unfinished-";

/// Options per select menu (Discord limit).
pub const OPTIONS_PER_MENU: usize = 25;
/// Select menus per message; the fifth action row holds the submit buttons.
pub const MAX_SELECT_MENUS: usize = 4;

/// Blue - waiting for review
pub const COLOR_PENDING: u32 = 0x0034_98DB;
/// Green - approved
pub const COLOR_APPROVED: u32 = 0x002E_CC71;
/// Red - rejected
pub const COLOR_REJECTED: u32 = 0x00E7_4C3C;
/// Dark red - unconfirmed or deleted
pub const COLOR_DELETED: u32 = 0x0099_2D22;
/// Orange - the action failed
pub const COLOR_FAILED: u32 = 0x00E6_7E22;

/// Moderation action encoded in a registration button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationAction {
    /// Approve the registration
    Approve,
    /// Reject the registration
    Reject,
    /// Delete the pending registration
    Delete,
}

impl RegistrationAction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Delete => "delete",
        }
    }
}

/// Custom id of a registration button.
#[must_use]
pub fn registration_custom_id(action: RegistrationAction, registration_id: &str) -> String {
    format!("{REGISTER_PREFIX}{}-{registration_id}", action.as_str())
}

/// Splits a registration button id into its action and registration id.
#[must_use]
pub fn parse_registration_custom_id(custom_id: &str) -> Option<(RegistrationAction, &str)> {
    let rest = custom_id.strip_prefix(REGISTER_PREFIX)?;
    let (action, registration_id) = rest.split_once('-')?;
    let action = match action {
        "approve" => RegistrationAction::Approve,
        "reject" => RegistrationAction::Reject,
        "delete" => RegistrationAction::Delete,
        _ => return None,
    };
    if registration_id.is_empty() {
        return None;
    }
    Some((action, registration_id))
}

/// Link to a player's page on the KoG website.
#[must_use]
pub fn profile_url(base_url: &str, username: &str) -> Option<Url> {
    let mut url = Url::parse(base_url).ok()?;
    url.set_fragment(Some(&format!("p=players&player={username}")));
    Some(url)
}

/// Description shared by every state of a moderation embed.
#[must_use]
pub fn registration_description(
    registration: &registration::Model,
    snapshot: Option<&PlayerSnapshot>,
) -> String {
    let mut description = format!(
        "RegistrationId: {}\nUser: <@{}>\nName: {}",
        registration.id, registration.discord_user_id, registration.claimed_username
    );
    if let Some(s) = snapshot {
        description.push_str(&format!(
            "\nRank: {}\nPoints: {} ({} + {})",
            s.rank, s.total_points, s.base_points, s.season_points
        ));
    }
    description
}

fn review_buttons(registration_id: &str) -> Vec<serenity::CreateButton> {
    vec![
        serenity::CreateButton::new(registration_custom_id(
            RegistrationAction::Approve,
            registration_id,
        ))
        .label("Approve")
        .style(serenity::ButtonStyle::Success),
        serenity::CreateButton::new(registration_custom_id(
            RegistrationAction::Reject,
            registration_id,
        ))
        .label("Reject")
        .style(serenity::ButtonStyle::Danger),
    ]
}

fn delete_button(registration_id: &str) -> serenity::CreateButton {
    serenity::CreateButton::new(registration_custom_id(
        RegistrationAction::Delete,
        registration_id,
    ))
    .label("Delete registration")
    .style(serenity::ButtonStyle::Danger)
}

/// Buttons that let the same action be tried again after a transient failure.
///
/// Approve and reject bring back both review buttons; delete brings back only itself.
#[must_use]
pub fn retry_row(
    action: RegistrationAction,
    registration_id: &str,
) -> serenity::CreateActionRow {
    let buttons = match action {
        RegistrationAction::Approve | RegistrationAction::Reject => {
            review_buttons(registration_id)
        }
        RegistrationAction::Delete => vec![delete_button(registration_id)],
    };
    serenity::CreateActionRow::Buttons(buttons)
}

/// Embed and buttons posted to the log channel for a new registration.
///
/// A confirmed name gets Approve / Reject and a link to the website; an unconfirmed one
/// only a Delete button.
#[must_use]
pub fn registration_log_message(
    registration: &registration::Model,
    snapshot: Option<&PlayerSnapshot>,
    base_url: &str,
) -> serenity::CreateMessage {
    let description = registration_description(registration, snapshot);

    let (embed, buttons) = if snapshot.is_some() {
        let mut buttons = review_buttons(&registration.id);
        if let Some(url) = profile_url(base_url, &registration.claimed_username) {
            buttons.push(serenity::CreateButton::new_link(url.as_str()).label("View on KoG"));
        }
        let embed = serenity::CreateEmbed::new()
            .title("Pending review")
            .description(description)
            .color(COLOR_PENDING);
        (embed, buttons)
    } else {
        let buttons = vec![delete_button(&registration.id)];
        let embed = serenity::CreateEmbed::new()
            .title("Unconfirmed registration")
            .description(description)
            .color(COLOR_DELETED);
        (embed, buttons)
    };

    serenity::CreateMessage::new()
        .embed(embed)
        .components(vec![serenity::CreateActionRow::Buttons(buttons)])
}

/// Reply to the registrant after `/kog register`.
///
/// `confirmed` tells whether the name was found on KoG, `posted` whether moderators
/// were notified.
#[must_use]
pub fn registration_reply(username: &str, confirmed: bool, posted: bool) -> String {
    let mut reply = if confirmed {
        format!("✅ Registration submitted! Please wait for a moderator.\nName: {username}")
    } else {
        format!(
            "⚠️ Could not find **{username}** on KoG. Check the name: a moderator will still \
             review the request, or you can withdraw it and register again."
        )
    };
    if !posted {
        reply.push_str(
            "\n⚠️ The request could not be sent to the moderators. \
             Contact a moderator, or use `/kog withdraw` and register again later.",
        );
    } else if confirmed {
        reply.push_str("\nChanged your mind? Use `/kog withdraw`.");
    }
    reply
}

/// Withdraw button offered to the registrant when the name could not be confirmed.
#[must_use]
pub fn withdraw_row(registration_id: &str) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(registration_custom_id(
            RegistrationAction::Delete,
            registration_id,
        ))
        .label("Withdraw registration")
        .style(serenity::ButtonStyle::Danger),
    ])
}

/// Click on the player selection message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// A player was picked in one of the menus
    Pick,
    /// Submit, posting results to the channel
    SubmitPublic,
    /// Submit, showing results only to the caller
    SubmitPrivate,
    /// Show the previous page of menus
    PreviousPage,
    /// Show the next page of menus
    NextPage,
}

fn selection_id(nonce: u64, suffix: &str) -> String {
    format!("{SELECTION_PREFIX}{nonce}-{suffix}")
}

/// Prefix shared by every component of one selection message.
#[must_use]
pub fn selection_prefix(nonce: u64) -> String {
    format!("{SELECTION_PREFIX}{nonce}-")
}

/// Classifies a component id of the selection message tagged with `nonce`.
#[must_use]
pub fn parse_selection_custom_id(nonce: u64, custom_id: &str) -> Option<SelectionEvent> {
    let suffix = custom_id.strip_prefix(&selection_prefix(nonce))?;
    match suffix {
        "public" => Some(SelectionEvent::SubmitPublic),
        "private" => Some(SelectionEvent::SubmitPrivate),
        "prev" => Some(SelectionEvent::PreviousPage),
        "next" => Some(SelectionEvent::NextPage),
        s if s.starts_with("menu") => Some(SelectionEvent::Pick),
        _ => None,
    }
}

/// Splits the not-yet-selected players into select menus of at most
/// [`OPTIONS_PER_MENU`] options each.
#[must_use]
pub fn selection_menus(registered: &[String], selected: &[String]) -> Vec<Vec<String>> {
    let remaining: Vec<String> = registered
        .iter()
        .filter(|p| !selected.contains(p))
        .cloned()
        .collect();
    remaining
        .chunks(OPTIONS_PER_MENU)
        .map(<[String]>::to_vec)
        .collect()
}

/// Number of pages needed to show every menu, at least one.
#[must_use]
pub fn selection_page_count(registered: &[String], selected: &[String]) -> usize {
    selection_menus(registered, selected)
        .len()
        .div_ceil(MAX_SELECT_MENUS)
        .max(1)
}

/// Select menus plus the button row for one page of the current selection.
///
/// Menus disappear once the player limit is reached; submit stays disabled until at
/// least one player is selected. Page buttons only appear when the registered players
/// do not fit on one page. `page` is clamped to the last page.
#[must_use]
pub fn selection_components(
    nonce: u64,
    registered: &[String],
    selected: &[String],
    page: usize,
) -> Vec<serenity::CreateActionRow> {
    let mut rows = Vec::new();
    let page_count = selection_page_count(registered, selected);
    let page = page.min(page_count - 1);
    let limit_reached = selected.len() >= MAX_QUERY_PLAYERS;

    if !limit_reached {
        let menus = selection_menus(registered, selected);
        let first = page * MAX_SELECT_MENUS;
        for (index, players) in menus.iter().enumerate().skip(first).take(MAX_SELECT_MENUS) {
            let options = players
                .iter()
                .map(|p| serenity::CreateSelectMenuOption::new(p, p))
                .collect();
            let menu = serenity::CreateSelectMenu::new(
                selection_id(nonce, &format!("menu{index}")),
                serenity::CreateSelectMenuKind::String { options },
            )
            .placeholder(format!(
                "Select a player ({} - {})",
                players.first().map_or("", String::as_str),
                players.last().map_or("", String::as_str)
            ))
            .min_values(1)
            .max_values(1);
            rows.push(serenity::CreateActionRow::SelectMenu(menu));
        }
    }

    let nothing_selected = selected.is_empty();
    let mut buttons = vec![
        serenity::CreateButton::new(selection_id(nonce, "public"))
            .label("Submit (public)")
            .style(serenity::ButtonStyle::Success)
            .disabled(nothing_selected),
        serenity::CreateButton::new(selection_id(nonce, "private"))
            .label("Submit (only me)")
            .style(serenity::ButtonStyle::Secondary)
            .disabled(nothing_selected),
    ];
    if page_count > 1 && !limit_reached {
        buttons.push(
            serenity::CreateButton::new(selection_id(nonce, "prev"))
                .label("◀")
                .style(serenity::ButtonStyle::Secondary)
                .disabled(page == 0),
        );
        buttons.push(
            serenity::CreateButton::new(selection_id(nonce, "next"))
                .label(format!("▶ {}/{page_count}", page + 1))
                .style(serenity::ButtonStyle::Secondary)
                .disabled(page + 1 >= page_count),
        );
    }
    rows.push(serenity::CreateActionRow::Buttons(buttons));
    rows
}

/// Text of the selection message.
#[must_use]
pub fn selection_content(
    difficulty: &str,
    filter: report::StarFilter,
    selected: &[String],
) -> String {
    format!(
        "Difficulty: {difficulty}\nStars: {}\nSelected players:\n{}",
        filter.label(),
        report::format_player_list(selected)
    )
}
