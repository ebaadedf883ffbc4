use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}
