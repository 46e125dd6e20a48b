//! Session cookies, the authenticated-principal extractor and the
//! authentication endpoints.

mod cookies;
mod extractor;
mod login;
mod me;

pub(crate) use cookies::append_header;
pub use cookies::{clear_session_cookie_header, session_token};
pub use extractor::AuthenticatedPrincipal;
pub use login::{login_handler, logout_handler, logout_page_handler, register_handler};
pub use me::{me_handler, my_permission_handler};
