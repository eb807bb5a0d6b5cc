use rss::{Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};

use crate::changelog::{Entry, SECURITY_FIX_MARKER};
use crate::fetch::CHANGELOG_FILE;
use crate::util::{escape_html, strip_control_chars};

const GENERATOR: &str = concat!("sl-feeds ", env!("CARGO_PKG_VERSION"));

/// Builds an RSS channel with one item per entry, in the order given.
///
/// The channel's `pubDate` and `lastBuildDate` are the newest entry date
/// (omitted for an empty log), so regenerating an unchanged log yields an
/// identical document.
pub fn render(title: &str, link: &str, entries: &[Entry]) -> Channel {
    let newest = entries.iter().map(|e| e.date).max().map(|d| d.to_rfc2822());
    let items: Vec<Item> = entries.iter().map(|entry| entry_to_item(link, entry)).collect();

    ChannelBuilder::default()
        .title(strip_control_chars(title).into_owned())
        .link(link.to_string())
        .description(format!("Changes to {link}/{CHANGELOG_FILE}"))
        .generator(GENERATOR.to_string())
        .pub_date(newest.clone())
        .last_build_date(newest)
        .items(items)
        .build()
}

fn entry_to_item(link: &str, entry: &Entry) -> Item {
    let item_link = format!("{link}/{CHANGELOG_FILE}#{}", entry.date.timestamp());
    let text = entry.to_string();
    let description = format!("<pre>{}</pre>", escape_html(&strip_control_chars(&text)));

    ItemBuilder::default()
        .title(item_title(entry))
        .link(Some(item_link.clone()))
        .guid(GuidBuilder::default().permalink(false).value(item_link).build())
        .pub_date(entry.date.to_rfc2822())
        .description(description)
        .build()
}

/// `"3 updates"`, `"1 update"`, with a security note appended when any
/// change line carries the security fix marker.
fn item_title(entry: &Entry) -> String {
    let count = entry.changes.len();
    let noun = if count == 1 { "update" } else { "updates" };
    if entry.security_fix() {
        format!("{count} {noun}. Including a {SECURITY_FIX_MARKER}!")
    } else {
        format!("{count} {noun}")
    }
}
