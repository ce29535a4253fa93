mod forest;
pub use forest::{build_forest, CommentNode};

mod http;
pub use http::HttpApi;

mod inbox;
pub use inbox::NotificationInbox;

mod session;
pub use session::ThreadSession;

mod thread;
pub use thread::{Composer, TicketThread};

mod util;
pub use util::time_ago;

pub mod api {
    pub use helpdesk_api::*;
}
