mod event;
mod item;

pub use event::*;
pub use item::{Account, ChainRef, CollectionRef, Item, ItemMetadata, PaymentToken};
