//! UI Components
//!
//! Leptos components for the board. Cards are plain DOM nodes kept in
//! order by the keyed reconciler; everything else is regular Leptos views.

mod card_list;
mod delete_confirm_button;
mod header;
mod item_card;
mod sidebar;
mod tier_list;
mod tier_row;
mod tooltip;

pub use card_list::CardList;
pub use delete_confirm_button::DeleteConfirmButton;
pub use header::Header;
pub use sidebar::Sidebar;
pub use tier_list::TierList;
pub use tier_row::TierRow;
pub use tooltip::{Tooltip, TooltipSignal};
