use std::time::Duration;

use crate::types::PredictorKind;

pub const MODEL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const PREFERENCES_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

pub fn model_key(kind: PredictorKind) -> String {
    format!("online_model:{}", kind.as_str())
}

pub fn preferences_key() -> &'static str {
    "user_preferences"
}

pub fn recent_categories_key(user_id: &str) -> String {
    format!("recent_categories:{}", user_id)
}
