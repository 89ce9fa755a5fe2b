use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Value of the `applications-open` setting
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, Default)]
pub struct ApplicationsOpen {
    pub is_open: bool,
}
