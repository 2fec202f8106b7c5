//! Stream identifier codec: `[horizon::]base[~modifier]*`.

mod delays;
mod id;
pub mod nav;

pub use delays::{Delays, DEFAULT_DELAYS};
pub use id::{chooser_streams, compose_selection, CodecError, Family, StreamId, HORIZON_SEP, SEGMENT_SEP};
pub use nav::{horizon_buttons, links, HorizonButton, NavKind, NavTarget};
