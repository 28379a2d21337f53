use structopt::StructOpt;
use uuid::Uuid;

use crate::{
    Config,
    Result,
    db,
    db::types::ContentKind,
    events::{Dispatcher, Logger},
    models::ContentItem,
    permissions::{Actor, PermissionBits},
};

#[derive(StructOpt)]
pub struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// List items awaiting moderation, oldest submission first
    #[structopt(name = "list")]
    List {
        /// Only show items of this kind
        #[structopt(long = "kind")]
        kind: Option<ContentKind>,
    },
    /// Approve a submitted item
    #[structopt(name = "approve")]
    Approve {
        /// ID of the item
        id: Uuid,
        /// User ID of the moderator to act as
        #[structopt(long = "moderator")]
        moderator: i32,
    },
    /// Reject a submitted item
    #[structopt(name = "reject")]
    Reject {
        /// ID of the item
        id: Uuid,
        /// User ID of the moderator to act as
        #[structopt(long = "moderator")]
        moderator: i32,
        /// Reason shown to the author
        #[structopt(long = "reason")]
        reason: String,
    },
}

pub fn main(cfg: &Config, opts: Opts) -> Result<()> {
    let db = db::connect(cfg)?;

    match opts.command {
        Command::List { kind } => list(&db, kind),
        Command::Approve { id, moderator } => approve(&db, id, moderator),
        Command::Reject { id, moderator, reason } =>
            reject(&db, id, moderator, &reason),
    }
}

fn list(db: &db::Connection, kind: Option<ContentKind>) -> Result<()> {
    for item in ContentItem::pending(db, kind)? {
        let submitted = item.submitted_at
            .map(|date| date.to_string())
            .unwrap_or_default();

        println!(
            "{}  {:<12}  author {:>6}  submitted {}",
            item.id, item.kind.to_string(), item.author, submitted);
    }

    Ok(())
}

fn approve(db: &db::Connection, id: Uuid, moderator: i32) -> Result<()> {
    let actor = Actor::new(moderator, PermissionBits::elevated());
    let mut item = ContentItem::by_id(db, id)?;

    let notification = item.approve(db, &actor)?;
    dispatcher().dispatch(&notification);

    println!("Approved and published {}", item.id);
    Ok(())
}

fn reject(db: &db::Connection, id: Uuid, moderator: i32, reason: &str)
-> Result<()> {
    let actor = Actor::new(moderator, PermissionBits::elevated());
    let mut item = ContentItem::by_id(db, id)?;

    let notification = item.reject(db, &actor, reason)?;
    dispatcher().dispatch(&notification);

    println!("Rejected {}", item.id);
    Ok(())
}

fn dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Logger);
    dispatcher
}
