pub mod mailer;
pub mod payments;
pub mod storage;
pub mod traits;
pub mod types;

pub use mailer::{LogMailer, ResendMailer};
pub use payments::MockPaymentGateway;
pub use storage::LocalFileStore;
pub use traits::{FileStore, Mailer, PaymentGateway};
pub use types::{PaymentRequest, StoredFile};
