use crate::types::ToolResultEvent;

pub const SUCCESS_REWARD: f64 = 1.0;
pub const ERROR_REWARD: f64 = -1.0;

/// Proxy reward for a resolved tool call: the result's error flag and
/// nothing else. Richer scoring is layered on downstream.
pub fn reward(result: &ToolResultEvent) -> f64 {
    if result.is_error {
        ERROR_REWARD
    } else {
        SUCCESS_REWARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(is_error: bool) -> ToolResultEvent {
        ToolResultEvent {
            session_id: Some("s1".to_string()),
            uuid: Some("u1".to_string()),
            parent_uuid: None,
            timestamp: None,
            role: "user".to_string(),
            tool_use_id: Some("t1".to_string()),
            is_error,
            content_text: "output".to_string(),
        }
    }

    #[test]
    fn test_error_result_is_penalized() {
        assert_eq!(reward(&result(true)), -1.0);
    }

    #[test]
    fn test_success_result_is_rewarded() {
        assert_eq!(reward(&result(false)), 1.0);
    }
}
