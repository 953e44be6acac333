pub mod document;
pub mod form;
pub mod github;
pub mod session;
pub mod table;

pub use document::{Document, ItemId, Record};
pub use form::EditForm;
pub use github::{ContentHost, Credentials, VersionMarker};
pub use session::{AdminSession, Phase};
