use crate::domain::{ScoreLabel, ScoredListing};
use crate::notifier::{NotificationError, Notifier};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use std::fmt::Write;
use tracing::info;

/// Discord rejects messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Listings shown per notification; the rest are summarised.
pub const MAX_LISTINGS_SHOWN: usize = 10;

const HEADER: &str = "🏠 **新着物件のお知らせ**\n";
const CONTINUED_HEADER: &str = "🏠 **新着物件のお知らせ（続き）**\n";

pub struct DiscordNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self::with_client(webhook_url, reqwest::Client::new())
    }

    pub fn with_client(webhook_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client,
        }
    }

    async fn send(&self, message: &str) -> Result<(), NotificationError> {
        let body = json!({ "content": message });

        let response = self.client.post(&self.webhook_url).json(&body).send().await?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "(no body)".to_string());
            Err(NotificationError::Status {
                status: status.as_u16(),
                body: text,
            })
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, listings: &[ScoredListing]) -> Result<(), NotificationError> {
        if listings.is_empty() {
            return Ok(());
        }

        let messages = format_messages(listings);
        for message in &messages {
            self.send(message).await?;
        }

        info!(
            listings = listings.len(),
            messages = messages.len(),
            "sent discord notification"
        );
        Ok(())
    }
}

/// Splits the announcement into messages of at most [`MAX_MESSAGE_CHARS`].
pub fn format_messages(listings: &[ScoredListing]) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::from(HEADER);
    let mut header_only = true;

    // Any entry must fit under either header on its own.
    let entry_budget = MAX_MESSAGE_CHARS - char_len(HEADER).max(char_len(CONTINUED_HEADER));

    let shown = listings.len().min(MAX_LISTINGS_SHOWN);
    for listing in &listings[..shown] {
        let entry = format_entry_within(listing, entry_budget);
        if !header_only && char_len(&current) + char_len(&entry) > MAX_MESSAGE_CHARS {
            messages.push(std::mem::replace(&mut current, CONTINUED_HEADER.to_string()));
        }
        current.push_str(&entry);
        header_only = false;
    }

    let remaining = listings.len() - shown;
    if remaining > 0 {
        let summary = format!("\n📋 他{remaining}件の新着あり\n");
        if char_len(&current) + char_len(&summary) > MAX_MESSAGE_CHARS {
            messages.push(std::mem::take(&mut current));
        }
        current.push_str(&summary);
    }

    messages.push(current);
    messages
}

/// [`format_entry`], shortening the name (and as a last resort the whole
/// entry) until it is at most `budget` characters.
fn format_entry_within(scored: &ScoredListing, budget: usize) -> String {
    let entry = format_entry(scored);
    let excess = char_len(&entry).saturating_sub(budget);
    if excess == 0 {
        return entry;
    }

    let name_len = char_len(&scored.listing.name);
    if excess < name_len {
        let mut shortened = scored.clone();
        let keep = name_len - excess - 1;
        shortened.listing.name = scored.listing.name.chars().take(keep).collect();
        shortened.listing.name.push('…');
        return format_entry(&shortened);
    }

    let mut cut: String = entry.chars().take(budget.saturating_sub(2)).collect();
    cut.push_str("…\n");
    cut
}

pub fn format_entry(scored: &ScoredListing) -> String {
    let l = &scored.listing;
    let mut entry = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(entry, "\n**■ {}**", l.name);
    let _ = writeln!(entry, "📍 {}", l.address);
    let _ = writeln!(entry, "💰 {:.1}万円（管理費込）", l.total_cost_man());
    let _ = writeln!(entry, "📐 {} / {}㎡", l.layout, l.area);

    if scored.label != ScoreLabel::InsufficientData {
        if scored.score >= 0.0 {
            let _ = writeln!(entry, "💴 相場より {:.0}円/月 お得", scored.score);
        } else {
            let _ = writeln!(entry, "💴 相場より {:.0}円/月 高い", -scored.score);
        }
    }

    let _ = writeln!(entry, "🏷️ {}", scored.label);
    let _ = writeln!(entry, "🔗 {}", l.url);
    entry
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
