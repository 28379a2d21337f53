use structopt::StructOpt;
use uuid::Uuid;

use crate::{
    Config,
    Result,
    db,
    models::{ContentItem, EditSuggestion},
    permissions::{Actor, PermissionBits},
};

#[derive(StructOpt)]
pub struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Show a content item, including its payload
    #[structopt(name = "show")]
    Show {
        /// ID of the item
        id: Uuid,
    },
    /// List edit suggestions made for an item
    #[structopt(name = "suggestions")]
    Suggestions {
        /// ID of the item
        id: Uuid,
    },
    /// Delete drafts which have not been touched for a while
    #[structopt(name = "purge-drafts")]
    PurgeDrafts {
        /// User ID of the administrator to act as
        #[structopt(long = "admin")]
        admin: i32,
        /// Override the configured age cutoff, in days
        #[structopt(long = "days")]
        days: Option<u32>,
    },
}

pub fn main(cfg: &Config, opts: Opts) -> Result<()> {
    let db = db::connect(cfg)?;

    match opts.command {
        Command::Show { id } => show(&db, id),
        Command::Suggestions { id } => suggestions(&db, id),
        Command::PurgeDrafts { admin, days } => purge_drafts(
            &db, admin, days.unwrap_or(cfg.moderation.stale_draft_days)),
    }
}

fn show(db: &db::Connection, id: Uuid) -> Result<()> {
    let item = ContentItem::by_id(db, id)?;

    println!("id:        {}", item.id);
    println!("kind:      {}", item.kind);
    println!("state:     {}", item.state);
    println!("author:    {}", item.author);
    println!("created:   {}", item.created_at);
    println!("updated:   {}", item.updated_at);

    if let Some(submitted) = item.submitted_at {
        println!("submitted: {}", submitted);
    }
    if let Some(published) = item.published_at {
        println!("published: {}", published);
    }
    if let Some(ref reason) = item.rejection_reason {
        println!("rejected:  {}", reason);
    }

    println!("{}", serde_json::to_string_pretty(&item.payload)?);

    Ok(())
}

fn suggestions(db: &db::Connection, id: Uuid) -> Result<()> {
    let item = ContentItem::by_id(db, id)?;

    for suggestion in EditSuggestion::all_of(db, &item)? {
        let suggester = suggestion.suggested_by
            .map(|user| user.to_string())
            .unwrap_or_else(|| "guest".to_string());

        println!(
            "#{:<6} {:<9} by {:<8} {}",
            suggestion.id, suggestion.decision.to_string(), suggester,
            suggestion.suggestion_text);
    }

    Ok(())
}

fn purge_drafts(db: &db::Connection, admin: i32, days: u32) -> Result<()> {
    let actor = Actor::new(admin, PermissionBits::elevated());
    let count = ContentItem::purge_stale_drafts(db, &actor, days)?;

    println!("Deleted {} stale draft(s)", count);
    Ok(())
}
