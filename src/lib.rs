pub mod dispatcher;
pub mod driver;
pub mod errors;
pub mod executor;
pub mod locator;
pub mod response;
pub mod session;
pub mod types;

pub use dispatcher::Dispatcher;
pub use driver::{ChromeDriver, Driver};
pub use errors::{AutomationError, Result};
pub use response::{Response, Status};
pub use session::{SessionManager, SessionState};
pub use types::*;
