// Outbound gesture envelope: exactly one `gesture` key per detected hand.

use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct GestureMessage<'a> {
    pub gesture: &'a str,
}

impl<'a> GestureMessage<'a> {
    pub fn new(code: &'a str) -> Self {
        Self { gesture: code }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
