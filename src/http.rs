use log::warn;
use serde_json::Value;

#[cfg(test)]
pub(crate) mod test_server;

/// Sends one POST with an empty body. No retries; callers report failures themselves.
///
/// Any HTTP response counts as delivered, whatever its status. Only transport
/// failures are errors.
pub(crate) fn post_empty(url: &str, headers: &[(&str, &str)]) -> Result<u16, String> {
    let agent = ureq::AgentBuilder::new().build();
    let mut request = agent.post(url);
    for (name, value) in headers {
        request = request.set(name, value);
    }

    match request.send_string("") {
        Ok(response) => Ok(response.status()),
        Err(ureq::Error::Status(status, response)) => {
            let response_body = response.into_string().ok().unwrap_or_default();
            let detail = error_detail(&response_body);
            if detail.is_empty() {
                warn!("Bazarr answered HTTP status {status}");
            } else {
                warn!("Bazarr answered HTTP status {status} ({detail})");
            }
            Ok(status)
        }
        Err(ureq::Error::Transport(err)) => Err(format!("request failed: transport error: {err}")),
    }
}

/// Bazarr answers errors with `{"message": ...}`; anything else is shown truncated.
fn error_detail(body: &str) -> String {
    let body = body.trim();
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.trim().to_string();
        }
    }
    body.chars().take(240).collect()
}
