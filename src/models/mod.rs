//! Data and behaviours modelled as objects.

pub mod grant;
pub mod item;
pub mod payload;
pub mod suggestion;

pub use self::{
    grant::EditGrant,
    item::ContentItem,
    payload::Payload,
    suggestion::EditSuggestion,
};
