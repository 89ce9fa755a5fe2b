pub mod broker;
pub mod reconciliation;

pub use broker::UploadUrlBroker;
pub use reconciliation::reconcile_application;
